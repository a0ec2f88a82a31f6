//! Project entity.
//!
//! A [`Project`] carries descriptive metadata from the signed quote plus the
//! lifecycle state the tracker mutates: current phase, completed-action log,
//! cached AI outputs and user inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::TrackerError;
use super::phase::{self, ActionTrigger, Phase, PhaseId};

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    /// Slug used in persisted data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::OnHold => "on-hold",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "active" => Ok(Self::Active),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            "on-hold" | "onhold" | "hold" => Ok(Self::OnHold),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(TrackerError::UnknownStatus(s.to_string())),
        }
    }
}

/// An entry in the completed-action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAction {
    /// Unique entry id
    pub id: String,
    /// The completed trigger
    pub trigger: ActionTrigger,
    /// Free-text description
    pub description: String,
    /// When it was completed
    pub completed_at: DateTime<Utc>,
    /// Who completed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
}

/// Cached AI output attached to a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemOutput {
    /// Generated text
    pub output: String,
    /// When it was saved
    pub saved_at: DateTime<Utc>,
    /// Who saved it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_by: Option<String>,
}

/// User-provided input for an AI task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Payload for saving a user input; the timestamp is stamped on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInputData {
    pub text: Option<String>,
    pub file_name: Option<String>,
    pub file_data: Option<String>,
}

/// A client-side contact for the research.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContact {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A tracked research project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: String,

    /// Salesforce opportunity name
    #[serde(default)]
    pub opp_name: String,

    /// Client company
    pub client_name: String,

    /// Project name
    pub project_name: String,

    /// Responsible research manager
    #[serde(default)]
    pub research_manager: String,

    /// Current phase; only changed through [`Project::move_to`]
    current_phase: PhaseId,

    /// Mirror of `current_phase.number()`
    phase_number: u32,

    /// Lifecycle status
    #[serde(default)]
    pub status: ProjectStatus,

    // Quote details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incidence_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectives: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,

    /// Completed-action log, at most one entry per trigger
    #[serde(default)]
    pub completed_actions: Vec<ProjectAction>,

    /// Cached AI outputs, one per trigger
    #[serde(default)]
    pub gem_outputs: BTreeMap<ActionTrigger, GemOutput>,

    /// User inputs keyed by task
    #[serde(default)]
    pub user_inputs: BTreeMap<String, UserInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dossier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Explicit phase selection made at creation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_phases: Vec<PhaseId>,

    /// Legacy contracted service ("Full Service", "Sample Only", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services_included: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotas: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screeners: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_contacts: Vec<ClientContact>,
}

/// Fields supplied when creating a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub opp_name: String,
    pub client_name: String,
    pub project_name: String,
    pub research_manager: String,
    /// Starting phase; defaults to the first included phase
    pub current_phase: Option<PhaseId>,
    pub status: ProjectStatus,
    pub total_cost: Option<String>,
    pub sample_size: Option<String>,
    pub incidence_rate: Option<String>,
    pub loi: Option<String>,
    pub target_audience: Option<String>,
    pub methodology: Option<String>,
    pub objectives: Option<String>,
    pub description: Option<String>,
    pub dossier: Option<String>,
    pub notes: Option<String>,
    pub included_phases: Vec<PhaseId>,
    pub service_type: Option<String>,
    pub services_included: Vec<String>,
    pub quotas: Vec<String>,
    pub screeners: Vec<String>,
    pub sample_type: Option<String>,
    pub assumptions: Option<String>,
    pub client_contacts: Vec<ClientContact>,
}

impl NewProject {
    /// Create with the two required names.
    pub fn new(client_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            project_name: project_name.into(),
            ..Self::default()
        }
    }
}

/// Partial update of descriptive fields.
///
/// Phase state is not part of an update; use the phase operations on
/// [`ProjectService`](super::ProjectService).
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub opp_name: Option<String>,
    pub client_name: Option<String>,
    pub project_name: Option<String>,
    pub research_manager: Option<String>,
    pub status: Option<ProjectStatus>,
    pub total_cost: Option<String>,
    pub sample_size: Option<String>,
    pub incidence_rate: Option<String>,
    pub loi: Option<String>,
    pub target_audience: Option<String>,
    pub methodology: Option<String>,
    pub objectives: Option<String>,
    pub description: Option<String>,
    pub dossier: Option<String>,
    pub notes: Option<String>,
    pub sample_type: Option<String>,
    pub assumptions: Option<String>,
    pub quotas: Option<Vec<String>>,
    pub screeners: Option<Vec<String>>,
    pub client_contacts: Option<Vec<ClientContact>>,
}

impl Project {
    /// Build a project from creation fields.
    pub fn new(id: String, data: NewProject, now: DateTime<Utc>) -> Self {
        let start = data.current_phase.unwrap_or_else(|| {
            phase::included_phases(&data.included_phases, data.service_type.as_deref())
                .first()
                .copied()
                .unwrap_or(PhaseId::PreKickoff)
        });

        Self {
            id,
            opp_name: data.opp_name,
            client_name: data.client_name,
            project_name: data.project_name,
            research_manager: data.research_manager,
            current_phase: start,
            phase_number: start.number(),
            status: data.status,
            total_cost: data.total_cost,
            sample_size: data.sample_size,
            incidence_rate: data.incidence_rate,
            loi: data.loi,
            target_audience: data.target_audience,
            methodology: data.methodology,
            objectives: data.objectives,
            description: data.description,
            created_at: now,
            updated_at: now,
            completed_actions: Vec::new(),
            gem_outputs: BTreeMap::new(),
            user_inputs: BTreeMap::new(),
            dossier: data.dossier,
            notes: data.notes,
            included_phases: data.included_phases,
            service_type: data.service_type,
            services_included: data.services_included,
            quotas: data.quotas,
            screeners: data.screeners,
            sample_type: data.sample_type,
            assumptions: data.assumptions,
            client_contacts: data.client_contacts,
        }
    }

    /// Current phase.
    pub fn current_phase(&self) -> PhaseId {
        self.current_phase
    }

    /// 1-based number of the current phase.
    pub fn phase_number(&self) -> u32 {
        self.phase_number
    }

    /// Static configuration of the current phase.
    pub fn current_phase_config(&self) -> &'static Phase {
        self.current_phase.config()
    }

    /// Move to `phase`, keeping `phase_number` in step.
    pub(crate) fn move_to(&mut self, phase: PhaseId) {
        self.current_phase = phase;
        self.phase_number = phase.number();
    }

    /// Recompute the derived phase number (used after loading stored data).
    pub(crate) fn sync_phase_number(&mut self) {
        self.phase_number = self.current_phase.number();
    }

    /// Phases this project includes.
    pub fn included_phases(&self) -> Vec<PhaseId> {
        phase::included_phases(&self.included_phases, self.service_type.as_deref())
    }

    /// Whether `trigger` is in the completed-action log.
    pub fn has_completed(&self, trigger: ActionTrigger) -> bool {
        self.completed_actions.iter().any(|a| a.trigger == trigger)
    }

    /// Whether any trigger of the current phase has been completed.
    pub fn current_phase_satisfied(&self) -> bool {
        self.current_phase.config().triggers.iter().any(|t| self.has_completed(*t))
    }

    /// Cached output for `trigger`.
    pub fn gem_output(&self, trigger: ActionTrigger) -> Option<&GemOutput> {
        self.gem_outputs.get(&trigger)
    }

    /// Saved user input for `key`.
    pub fn user_input(&self, key: &str) -> Option<&UserInput> {
        self.user_inputs.get(key)
    }

    /// Share of the lifecycle reached, as a rounded percentage.
    pub fn progress_percent(&self) -> u32 {
        let total = PhaseId::ALL.len() as f64;
        ((f64::from(self.phase_number) / total) * 100.0).round() as u32
    }

    /// Apply a partial update.
    pub(crate) fn apply(&mut self, update: ProjectUpdate) {
        if let Some(v) = update.opp_name {
            self.opp_name = v;
        }
        if let Some(v) = update.client_name {
            self.client_name = v;
        }
        if let Some(v) = update.project_name {
            self.project_name = v;
        }
        if let Some(v) = update.research_manager {
            self.research_manager = v;
        }
        if let Some(v) = update.status {
            self.status = v;
        }
        if let Some(v) = update.quotas {
            self.quotas = v;
        }
        if let Some(v) = update.screeners {
            self.screeners = v;
        }
        if let Some(v) = update.client_contacts {
            self.client_contacts = v;
        }

        let optional = [
            (&mut self.total_cost, update.total_cost),
            (&mut self.sample_size, update.sample_size),
            (&mut self.incidence_rate, update.incidence_rate),
            (&mut self.loi, update.loi),
            (&mut self.target_audience, update.target_audience),
            (&mut self.methodology, update.methodology),
            (&mut self.objectives, update.objectives),
            (&mut self.description, update.description),
            (&mut self.dossier, update.dossier),
            (&mut self.notes, update.notes),
            (&mut self.sample_type, update.sample_type),
            (&mut self.assumptions, update.assumptions),
        ];
        for (field, value) in optional {
            if value.is_some() {
                *field = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(data: NewProject) -> Project {
        Project::new("proj_test".to_string(), data, Utc::now())
    }

    #[test]
    fn test_new_project_defaults() {
        let p = project(NewProject::new("Acme", "Brand Health"));
        assert_eq!(p.current_phase(), PhaseId::PreKickoff);
        assert_eq!(p.phase_number(), 1);
        assert_eq!(p.status, ProjectStatus::Active);
        assert!(p.completed_actions.is_empty());
        assert!(p.gem_outputs.is_empty());
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn test_new_project_starts_at_first_included_phase() {
        let mut data = NewProject::new("Acme", "Reporting Only");
        data.service_type = Some("Reporting".to_string());
        let p = project(data);
        assert_eq!(p.current_phase(), PhaseId::AnalysisPlan);
        assert_eq!(p.phase_number(), 6);
    }

    #[test]
    fn test_new_project_explicit_start() {
        let mut data = NewProject::new("Acme", "Tracker W2");
        data.current_phase = Some(PhaseId::ProgrammingQc);
        let p = project(data);
        assert_eq!(p.current_phase(), PhaseId::ProgrammingQc);
        assert_eq!(p.phase_number(), 4);
    }

    #[test]
    fn test_move_to_keeps_number_in_step() {
        let mut p = project(NewProject::new("Acme", "X"));
        for phase in PhaseId::ALL {
            p.move_to(phase);
            assert_eq!(p.phase_number(), phase.number());
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("on_hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert_eq!("Canceled".parse::<ProjectStatus>().unwrap(), ProjectStatus::Cancelled);
        assert!("paused".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_progress_percent() {
        let mut p = project(NewProject::new("Acme", "X"));
        assert_eq!(p.progress_percent(), 13);
        p.move_to(PhaseId::ReportQc);
        assert_eq!(p.progress_percent(), 100);
    }

    #[test]
    fn test_apply_update_leaves_phase_alone() {
        let mut p = project(NewProject::new("Acme", "X"));
        p.apply(ProjectUpdate {
            status: Some(ProjectStatus::OnHold),
            sample_size: Some("400".to_string()),
            screeners: Some(vec!["Adults 18+".to_string()]),
            ..ProjectUpdate::default()
        });
        assert_eq!(p.status, ProjectStatus::OnHold);
        assert_eq!(p.sample_size.as_deref(), Some("400"));
        assert_eq!(p.screeners, vec!["Adults 18+".to_string()]);
        assert_eq!(p.current_phase(), PhaseId::PreKickoff);
        assert_eq!(p.client_name, "Acme");
    }

    #[test]
    fn test_serialized_layout_is_camel_case() {
        let p = project(NewProject::new("Acme", "X"));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["currentPhase"], "pre-kickoff");
        assert_eq!(json["phaseNumber"], 1);
        assert_eq!(json["clientName"], "Acme");
        assert!(json.get("completedActions").is_some());
        assert!(json.get("serviceType").is_none());
    }

    #[test]
    fn test_round_trip_with_outputs() {
        let mut p = project(NewProject::new("Acme", "X"));
        p.gem_outputs.insert(
            ActionTrigger::TxtGenerated,
            GemOutput { output: "[[AdvancedFormat]]".to_string(), saved_at: Utc::now(), saved_by: None },
        );
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"txt_generated\""));
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
