//! rxhub - research operations hub.
//!
//! Tracks survey projects through their phases, converts questionnaires to
//! Qualtrics TXT and plans delivery dates.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rxhub::core::Config;
use rxhub::schedule;
use rxhub::survey;
use rxhub::tracker::{
    ActionTrigger, DocumentRecord, JsonFileStore, NewProject, PhaseId, Project, ProjectFilter,
    ProjectService, ProjectStatus, ProjectUpdate, UserInputData, PHASES,
};

/// Research operations hub for survey projects
#[derive(Parser)]
#[command(name = "rxhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project store file
    #[arg(long, global = true, env = "RXHUB_STORE")]
    store: Option<PathBuf>,

    /// Config file to use instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        operation: ProjectOperation,
    },

    /// Inspect and move project phases
    Phase {
        #[command(subcommand)]
        operation: PhaseOperation,
    },

    /// Complete or undo phase actions
    Action {
        #[command(subcommand)]
        operation: ActionOperation,
    },

    /// Cached deliverables per action trigger
    Output {
        #[command(subcommand)]
        operation: OutputOperation,
    },

    /// User-provided inputs for AI tasks
    Input {
        #[command(subcommand)]
        operation: InputOperation,
    },

    /// Convert a plain-text survey to Qualtrics TXT
    Convert {
        /// Survey file, or `-` for stdin
        input: String,

        /// Output file or directory (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the result as this project's TXT deliverable
        #[arg(long)]
        project: Option<String>,

        /// Client name used in the export file name
        #[arg(long)]
        client: Option<String>,
    },

    /// Estimate delivery dates from a kickoff date
    Timeline {
        /// Kickoff date (YYYY-MM-DD)
        date: String,

        /// Output format (text, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// AI-powered deliverable generation
    #[cfg(feature = "ai")]
    Ai {
        #[command(subcommand)]
        operation: AiOperation,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ProjectOperation {
    /// Create a project
    New {
        /// Client company
        #[arg(long)]
        client: String,

        /// Project name
        #[arg(long)]
        name: String,

        /// Opportunity name
        #[arg(long)]
        opp: Option<String>,

        /// Research manager
        #[arg(long)]
        manager: Option<String>,

        /// Contracted service ("Full Service", "Sample Only", ...)
        #[arg(long)]
        service_type: Option<String>,

        /// Included phases (comma separated)
        #[arg(long, value_delimiter = ',')]
        phases: Vec<String>,

        #[arg(long)]
        sample_size: Option<String>,

        /// Length of interview
        #[arg(long)]
        loi: Option<String>,

        #[arg(long)]
        incidence_rate: Option<String>,

        #[arg(long)]
        target_audience: Option<String>,

        #[arg(long)]
        objectives: Option<String>,

        #[arg(long)]
        methodology: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// List projects
    List {
        /// Only projects in this phase
        #[arg(long)]
        phase: Option<String>,

        /// Only projects of this research manager
        #[arg(long)]
        manager: Option<String>,

        /// Only active projects
        #[arg(long)]
        active: bool,

        /// Output format (text, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Show a project
    Show {
        id: String,

        /// Output format (text, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Edit descriptive fields of a project
    Update {
        id: String,

        #[arg(long)]
        client: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        opp: Option<String>,

        #[arg(long)]
        manager: Option<String>,

        #[arg(long)]
        sample_size: Option<String>,

        #[arg(long)]
        loi: Option<String>,

        #[arg(long)]
        incidence_rate: Option<String>,

        #[arg(long)]
        target_audience: Option<String>,

        #[arg(long)]
        objectives: Option<String>,

        #[arg(long)]
        methodology: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change a project's status
    Status {
        id: String,

        /// active, completed, on-hold or cancelled
        status: String,
    },

    /// Delete a project
    Delete { id: String },

    /// Print the document data record as JSON
    Record { id: String },
}

#[derive(Subcommand)]
enum PhaseOperation {
    /// List phases and their action triggers
    List,

    /// Move a project to a phase
    Set { id: String, phase: String },

    /// Move a project to the next phase
    Advance { id: String },
}

#[derive(Subcommand)]
enum ActionOperation {
    /// Mark an action as completed
    Complete {
        id: String,
        trigger: String,

        /// Log description (defaults to the trigger's description)
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove an action from the completed log
    Undo { id: String, trigger: String },
}

#[derive(Subcommand)]
enum OutputOperation {
    /// Save a deliverable for a trigger
    Save {
        id: String,
        trigger: String,

        /// Read the deliverable from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Deliverable text
        #[arg(long)]
        text: Option<String>,
    },

    /// Print a saved deliverable
    Show { id: String, trigger: String },
}

#[derive(Subcommand)]
enum InputOperation {
    /// Save a user input under a key
    Save {
        id: String,
        key: String,

        #[arg(long)]
        text: Option<String>,

        /// Attach a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print a saved user input
    Show { id: String, key: String },
}

#[cfg(feature = "ai")]
#[derive(Subcommand)]
enum AiOperation {
    /// List generation tasks
    Tasks,

    /// Generate a deliverable for a project
    Generate {
        id: String,

        /// Task identifier (see `rxhub ai tasks`)
        task: String,

        /// Additional instructions
        #[arg(short, long)]
        prompt: Option<String>,

        /// Save the result as the task's deliverable
        #[arg(long)]
        save: bool,

        /// Also complete the task's action
        #[arg(long, requires = "save")]
        complete: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("RXHUB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let store = cli.store.clone();
    let ctx = Ctx { config, store };

    match cli.command {
        Commands::Project { operation } => cmd_project(&ctx, operation)?,
        Commands::Phase { operation } => cmd_phase(&ctx, operation)?,
        Commands::Action { operation } => cmd_action(&ctx, operation)?,
        Commands::Output { operation } => cmd_output(&ctx, operation)?,
        Commands::Input { operation } => cmd_input(&ctx, operation)?,
        Commands::Convert { input, output, project, client } => {
            cmd_convert(&ctx, &input, output.as_deref(), project.as_deref(), client.as_deref())?;
        }
        Commands::Timeline { date, format } => {
            cmd_timeline(&date, &ctx.format(format.as_deref()))?;
        }
        #[cfg(feature = "ai")]
        Commands::Ai { operation } => cmd_ai(&ctx, operation)?,
        Commands::Config { path } => cmd_config(&ctx, path)?,
        Commands::Completions { shell } => cmd_completions(shell),
    }

    Ok(())
}

/// Settings shared by every command.
struct Ctx {
    config: Config,
    store: Option<PathBuf>,
}

impl Ctx {
    /// Open the project store: `--store`, then `[store] path`, then the data directory.
    fn service(&self) -> Result<ProjectService<JsonFileStore>> {
        let path = match &self.store {
            Some(path) => path.clone(),
            None => self.config.store_path()?,
        };
        let service = ProjectService::open(JsonFileStore::new(&path))
            .with_context(|| format!("Failed to open project store {}", path.display()))?;
        Ok(service)
    }

    fn user(&self) -> Option<&str> {
        self.config.general.user_name.as_deref()
    }

    fn format(&self, explicit: Option<&str>) -> String {
        explicit.unwrap_or(&self.config.general.default_format).to_lowercase()
    }
}

// ============================================================================
// Projects
// ============================================================================

fn cmd_project(ctx: &Ctx, operation: ProjectOperation) -> Result<()> {
    let mut service = ctx.service()?;

    match operation {
        ProjectOperation::New {
            client,
            name,
            opp,
            manager,
            service_type,
            phases,
            sample_size,
            loi,
            incidence_rate,
            target_audience,
            objectives,
            methodology,
            description,
        } => {
            let included_phases = phases
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| p.parse::<PhaseId>())
                .collect::<Result<Vec<_>, _>>()?;

            let data = NewProject {
                opp_name: opp.unwrap_or_default(),
                research_manager: manager.unwrap_or_default(),
                service_type,
                included_phases,
                sample_size,
                loi,
                incidence_rate,
                target_audience,
                objectives,
                methodology,
                description,
                ..NewProject::new(client, name)
            };

            let project = service.add_project(data)?;
            println!("Created project {}", project.id);
            print_summary(&project);
        }

        ProjectOperation::List { phase, manager, active, format } => {
            let mut filter = ProjectFilter::default();
            if let Some(phase) = phase {
                filter = filter.phase(phase.parse::<PhaseId>()?);
            }
            if let Some(manager) = &manager {
                filter = filter.manager(manager);
            }
            if active {
                filter = filter.active_only();
            }

            let projects = service.find_projects(&filter);

            if ctx.format(format.as_deref()) == "json" {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else {
                for project in &projects {
                    print_summary(project);
                }
                println!("\nTotal: {} projects", projects.len());
            }
        }

        ProjectOperation::Show { id, format } => {
            let project = service.require_project(&id)?;
            if ctx.format(format.as_deref()) == "json" {
                println!("{}", serde_json::to_string_pretty(project)?);
            } else {
                print_details(project);
            }
        }

        ProjectOperation::Update {
            id,
            client,
            name,
            opp,
            manager,
            sample_size,
            loi,
            incidence_rate,
            target_audience,
            objectives,
            methodology,
            description,
            notes,
        } => {
            let update = ProjectUpdate {
                client_name: client,
                project_name: name,
                opp_name: opp,
                research_manager: manager,
                sample_size,
                loi,
                incidence_rate,
                target_audience,
                objectives,
                methodology,
                description,
                notes,
                ..ProjectUpdate::default()
            };
            let project = service.update_project(&id, update)?;
            print_summary(&project);
        }

        ProjectOperation::Status { id, status } => {
            let status: ProjectStatus = status.parse()?;
            let project = service.set_status(&id, status)?;
            println!("{} is now {}", project.id, project.status);
        }

        ProjectOperation::Delete { id } => {
            let project = service.delete_project(&id)?;
            println!("Deleted {} ({} / {})", project.id, project.client_name, project.project_name);
        }

        ProjectOperation::Record { id } => {
            let record = DocumentRecord::from_project(service.require_project(&id)?);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

fn print_summary(project: &Project) {
    println!(
        "{}  {} / {}  [{}/{} {}] {}",
        project.id,
        project.client_name,
        project.project_name,
        project.phase_number(),
        PHASES.len(),
        project.current_phase().name(),
        project.status
    );
}

fn print_details(project: &Project) {
    println!("{} / {}", project.client_name, project.project_name);
    println!("  Id:       {}", project.id);
    if !project.opp_name.is_empty() {
        println!("  Opp:      {}", project.opp_name);
    }
    if !project.research_manager.is_empty() {
        println!("  Manager:  {}", project.research_manager);
    }
    println!("  Status:   {}", project.status);
    println!(
        "  Phase:    {}/{} {} ({}%)",
        project.phase_number(),
        PHASES.len(),
        project.current_phase().name(),
        project.progress_percent()
    );

    let included: Vec<&str> = project.included_phases().iter().map(PhaseId::as_str).collect();
    println!("  Includes: {}", included.join(", "));

    if !project.completed_actions.is_empty() {
        println!("\n  Completed actions:");
        for action in &project.completed_actions {
            println!(
                "    {} {}  {}{}",
                action.completed_at.format("%Y-%m-%d %H:%M"),
                action.trigger,
                action.description,
                action.completed_by.as_deref().map(|by| format!(" ({by})")).unwrap_or_default()
            );
        }
    }

    if !project.gem_outputs.is_empty() {
        println!("\n  Saved outputs:");
        for (trigger, output) in &project.gem_outputs {
            println!("    {}  {} chars", trigger, output.output.chars().count());
        }
    }
}

// ============================================================================
// Phases and actions
// ============================================================================

fn cmd_phase(ctx: &Ctx, operation: PhaseOperation) -> Result<()> {
    match operation {
        PhaseOperation::List => {
            for phase in &PHASES {
                println!("{}. {} ({}) - {}", phase.number, phase.name, phase.id, phase.description);
                for trigger in phase.triggers {
                    println!("     {:<26} {}", trigger.as_str(), trigger.description());
                }
            }
        }
        PhaseOperation::Set { id, phase } => {
            let phase: PhaseId = phase.parse()?;
            let project = ctx.service()?.set_phase(&id, phase)?;
            print_summary(&project);
        }
        PhaseOperation::Advance { id } => {
            let mut service = ctx.service()?;
            let before = service.require_project(&id)?.current_phase();
            let project = service.advance_phase(&id)?;
            if project.current_phase() == before {
                println!("Already at the last phase");
            }
            print_summary(&project);
        }
    }

    Ok(())
}

fn cmd_action(ctx: &Ctx, operation: ActionOperation) -> Result<()> {
    let mut service = ctx.service()?;

    match operation {
        ActionOperation::Complete { id, trigger, description } => {
            let trigger: ActionTrigger = trigger.parse()?;
            let before = service.require_project(&id)?.current_phase();
            let description = description.unwrap_or_else(|| trigger.description().to_string());

            let project = service.complete_action(&id, trigger, &description, ctx.user())?;
            if project.current_phase() != before {
                println!("Advanced to {}", project.current_phase().name());
            }
            print_summary(&project);
        }
        ActionOperation::Undo { id, trigger } => {
            let trigger: ActionTrigger = trigger.parse()?;
            let project = service.uncomplete_action(&id, trigger)?;
            print_summary(&project);
        }
    }

    Ok(())
}

// ============================================================================
// Outputs and inputs
// ============================================================================

fn cmd_output(ctx: &Ctx, operation: OutputOperation) -> Result<()> {
    let mut service = ctx.service()?;

    match operation {
        OutputOperation::Save { id, trigger, file, text } => {
            let trigger: ActionTrigger = trigger.parse()?;
            let output = match (file, text) {
                (Some(path), _) => read_file(&path)?,
                (None, Some(text)) => text,
                (None, None) => anyhow::bail!("Provide the deliverable with --file or --text"),
            };
            service.save_gem_output(&id, trigger, &output, ctx.user())?;
            println!("Saved {trigger} output for {id}");
        }
        OutputOperation::Show { id, trigger } => {
            let trigger: ActionTrigger = trigger.parse()?;
            service.require_project(&id)?;
            match service.get_gem_output(&id, trigger) {
                Some(output) => println!("{}", output.output),
                None => anyhow::bail!("No {trigger} output saved for {id}"),
            }
        }
    }

    Ok(())
}

fn cmd_input(ctx: &Ctx, operation: InputOperation) -> Result<()> {
    let mut service = ctx.service()?;

    match operation {
        InputOperation::Save { id, key, text, file } => {
            if text.is_none() && file.is_none() {
                anyhow::bail!("Provide the input with --text and/or --file");
            }

            let mut input = UserInputData { text, ..UserInputData::default() };
            if let Some(path) = file {
                input.file_data = Some(read_file(&path)?);
                input.file_name =
                    path.file_name().map(|n| n.to_string_lossy().into_owned());
            }

            service.save_user_input(&id, &key, input)?;
            println!("Saved input {key} for {id}");
        }
        InputOperation::Show { id, key } => {
            service.require_project(&id)?;
            let Some(input) = service.get_user_input(&id, &key) else {
                anyhow::bail!("No input {key} saved for {id}");
            };
            if let Some(name) = &input.file_name {
                println!("File: {name}");
            }
            if let Some(text) = &input.text {
                println!("{text}");
            }
            if let Some(data) = &input.file_data {
                println!("{data}");
            }
        }
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

// ============================================================================
// Survey conversion
// ============================================================================

fn cmd_convert(
    ctx: &Ctx,
    input: &str,
    output: Option<&Path>,
    project_id: Option<&str>,
    client: Option<&str>,
) -> Result<()> {
    let raw = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        read_file(Path::new(input))?
    };

    if raw.trim().is_empty() {
        anyhow::bail!("Survey content is empty");
    }

    let (txt, summary) = survey::convert_with_summary(&raw);

    let mut client = client.map(str::to_string);
    if let Some(id) = project_id {
        let mut service = ctx.service()?;
        let project = service.save_gem_output(id, ActionTrigger::TxtGenerated, &txt, ctx.user())?;
        client.get_or_insert(project.client_name);
        let project = service.complete_action(
            id,
            ActionTrigger::TxtGenerated,
            ActionTrigger::TxtGenerated.description(),
            ctx.user(),
        )?;
        eprintln!("Saved TXT to {} ({})", project.id, project.current_phase().name());
    }

    match output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(survey::export_file_name(client.as_deref(), Utc::now().date_naive()))
            } else {
                path.to_path_buf()
            };
            std::fs::write(&path, &txt)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{txt}"),
    }

    let types: Vec<String> =
        summary.question_types.iter().map(|(t, n)| format!("{t}={n}")).collect();
    eprintln!(
        "{} blocks, {} questions ({}), {} choices, {} page breaks",
        summary.blocks,
        summary.questions,
        types.join(" "),
        summary.choices,
        summary.page_breaks
    );

    Ok(())
}

// ============================================================================
// Timeline
// ============================================================================

fn cmd_timeline(date: &str, format: &str) -> Result<()> {
    let kickoff = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{date}', expected YYYY-MM-DD"))?;

    let deliveries = schedule::calculate_delivery_dates(kickoff);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&deliveries)?);
        return Ok(());
    }

    println!("Kickoff: {}\n", schedule::format_date_long(kickoff));
    for delivery in &deliveries {
        println!(
            "  {:<14} {}  {:<7} {}",
            delivery.phase.name,
            delivery.date,
            schedule::format_date_short(delivery.date),
            delivery.phase.label
        );
    }

    Ok(())
}

// ============================================================================
// AI
// ============================================================================

/// Handle AI commands.
#[cfg(feature = "ai")]
fn cmd_ai(ctx: &Ctx, operation: AiOperation) -> Result<()> {
    use rxhub::ai::{AIManager, GenerationRequest, GenerationTask, ProjectContext};

    match operation {
        AiOperation::Tasks => {
            for task in GenerationTask::ALL {
                let trigger = task.trigger().map(|t| t.to_string()).unwrap_or_default();
                println!(
                    "{:<26} {:<8} {:<28} {}",
                    task.as_str(),
                    task.tier().as_str(),
                    task.tier().model(&ctx.config.ai.models),
                    trigger
                );
            }
            Ok(())
        }

        AiOperation::Generate { id, task, prompt, save, complete } => {
            let task: GenerationTask = task.parse()?;
            let mut service = ctx.service()?;
            let context = ProjectContext::from_project(service.require_project(&id)?);
            let request =
                GenerationRequest::new(task, Some(&context), prompt.as_deref(), &ctx.config.ai);

            // Create tokio runtime for async operations
            let rt = tokio::runtime::Runtime::new()?;

            let generation = rt.block_on(async {
                let ai = AIManager::from_config(&ctx.config.ai).await;

                if !ai.is_available() {
                    anyhow::bail!("No AI provider available.\nSet ANTHROPIC_API_KEY for Claude.");
                }

                eprintln!("Generating {task} with {}...", request.model);
                ai.generate(&request).await
            })?;

            println!("{}", generation.content);

            if save {
                let Some(trigger) = task.trigger() else {
                    anyhow::bail!("Task {task} has no deliverable to save");
                };
                service.save_gem_output(&id, trigger, &generation.content, ctx.user())?;
                if complete {
                    service.complete_action(&id, trigger, trigger.description(), ctx.user())?;
                }
                eprintln!("Saved {trigger} output for {id}");
            }

            Ok(())
        }
    }
}

// ============================================================================
// Misc
// ============================================================================

/// Show configuration.
fn cmd_config(ctx: &Ctx, show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::global_path() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    println!("{}", ctx.config.to_toml()?);
    Ok(())
}

fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "rxhub", &mut io::stdout());
}
