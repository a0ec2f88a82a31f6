//! Project context for AI requests.
//!
//! Builds the user message sent alongside a task's system prompt.

use std::fmt::Write as _;

use crate::tracker::{ClientContact, Project};

/// Project fields included in a generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    /// Name of the project
    pub name: String,

    /// Client company
    pub client: String,

    /// Client industry, when known
    pub industry: Option<String>,

    pub methodology: Option<String>,

    /// Research objectives as entered
    pub objectives: Option<String>,

    pub description: Option<String>,

    /// Display name of the current phase
    pub phase: Option<String>,

    pub notes: Option<String>,

    /// Contacts the provider should research
    pub client_contacts: Vec<ClientContact>,
}

impl ProjectContext {
    /// Create a context with just the names.
    pub fn new(name: impl Into<String>, client: impl Into<String>) -> Self {
        Self { name: name.into(), client: client.into(), ..Self::default() }
    }

    /// Build context from a tracked project.
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.project_name.clone(),
            client: project.client_name.clone(),
            industry: None,
            methodology: project.methodology.clone(),
            objectives: project.objectives.clone(),
            description: project.description.clone(),
            phase: Some(project.current_phase().name().to_string()),
            notes: project.notes.clone(),
            client_contacts: project.client_contacts.clone(),
        }
    }

    /// Render the "Contexto del Proyecto" section.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(
            "**NOTA IMPORTANTE:** Si los objetivos del proyecto se ven informales o mal redactados, \
             mejora el wording para que suenen profesionales y estructurados cuando los incluyas \
             en tu respuesta.\n\n",
        );
        out.push_str("## Contexto del Proyecto\n\n");

        let field = |out: &mut String, label: &str, value: Option<&str>| {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                let _ = writeln!(out, "**{label}:** {v}");
            }
        };

        field(&mut out, "Nombre del Proyecto", Some(self.name.as_str()));
        field(&mut out, "Cliente", Some(self.client.as_str()));
        field(&mut out, "Industria", self.industry.as_deref());
        field(&mut out, "Metodología", self.methodology.as_deref());
        if let Some(objectives) = self.objectives.as_deref().filter(|o| !o.trim().is_empty()) {
            let _ = writeln!(
                out,
                "**Objetivos (mejorar wording si es necesario):** {}",
                refine_objectives(objectives)
            );
        }
        field(&mut out, "Descripción", self.description.as_deref());
        field(&mut out, "Fase Actual", self.phase.as_deref());
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.is_empty()) {
            let _ = write!(out, "\n**Notas Adicionales:**\n{notes}\n");
        }

        let contacts: Vec<_> = self
            .client_contacts
            .iter()
            .filter(|c| !c.name.is_empty() || !c.email.is_empty())
            .collect();
        if !contacts.is_empty() {
            out.push_str("\n## Contactos del Cliente (para investigar)\n\n");
            for (i, contact) in contacts.iter().enumerate() {
                let _ = writeln!(out, "### Contacto {}", i + 1);
                if !contact.name.is_empty() {
                    let _ = writeln!(out, "- **Nombre:** {}", contact.name);
                }
                if !contact.email.is_empty() {
                    let _ = writeln!(out, "- **Email:** {}", contact.email);
                }
                if let Some(role) = contact.role.as_deref().filter(|r| !r.is_empty()) {
                    let _ = writeln!(out, "- **Cargo:** {role}");
                }
                out.push('\n');
            }
            out.push_str(
                "Por favor, investiga sobre estos contactos usando la información disponible \
                 (nombre, email, empresa) para encontrar sus perfiles profesionales, experiencia, \
                 y cualquier información relevante para el proyecto.\n\n",
            );
        }

        out
    }
}

/// Normalise free-text objectives: trimmed, first letter capitalised, ending in punctuation.
pub fn refine_objectives(objectives: &str) -> String {
    let trimmed = objectives.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut refined: String = first.to_uppercase().chain(chars).collect();
    if !refined.ends_with(['.', '!', '?']) {
        refined.push('.');
    }
    refined
}

/// Full user message for a task.
///
/// The optional project context is followed by a separator and either the
/// caller's prompt or a default request naming the task.
pub fn build_user_message(
    context: Option<&ProjectContext>,
    task: &str,
    additional_prompt: Option<&str>,
) -> String {
    let mut message = String::new();

    if let Some(context) = context {
        message.push_str(&context.render());
        message.push_str("\n---\n\n");
    }

    match additional_prompt.filter(|p| !p.trim().is_empty()) {
        Some(prompt) => message.push_str(prompt),
        None => {
            let _ = write!(message, "Por favor, genera el contenido para la tarea: {task}");
        }
    }

    message
}
