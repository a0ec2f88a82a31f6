//! Flat data record handed to document builders.

use serde::Serialize;

use super::phase::ActionTrigger;
use super::project::{ClientContact, Project};

/// Project fields consumed by the Word/PowerPoint builders.
///
/// Every field is optional on the builder side; absent values serialize as
/// empty strings or empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub client_name: String,
    pub project_name: String,
    pub opp_name: String,
    pub research_manager: String,
    pub sample_size: String,
    pub loi: String,
    pub incidence_rate: String,
    pub target_audience: String,
    pub methodology: String,
    pub objectives: String,
    pub sample_type: String,
    pub service_type: String,
    pub current_phase: String,
    pub screeners: Vec<String>,
    pub quotas: Vec<String>,
    pub contacts: Vec<ClientContact>,
    pub dossier: String,
}

impl DocumentRecord {
    /// Build the record for `project`.
    ///
    /// The dossier prefers the cached `dossier_generated` output over the
    /// free-text `dossier` field.
    pub fn from_project(project: &Project) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        let dossier = project
            .gem_output(ActionTrigger::DossierGenerated)
            .map(|g| g.output.clone())
            .or_else(|| project.dossier.clone())
            .unwrap_or_default();

        Self {
            client_name: project.client_name.clone(),
            project_name: project.project_name.clone(),
            opp_name: project.opp_name.clone(),
            research_manager: project.research_manager.clone(),
            sample_size: text(&project.sample_size),
            loi: text(&project.loi),
            incidence_rate: text(&project.incidence_rate),
            target_audience: text(&project.target_audience),
            methodology: text(&project.methodology),
            objectives: text(&project.objectives),
            sample_type: text(&project.sample_type),
            service_type: text(&project.service_type),
            current_phase: project.current_phase().name().to_string(),
            screeners: project.screeners.clone(),
            quotas: project.quotas.clone(),
            contacts: project.client_contacts.clone(),
            dossier,
        }
    }
}
