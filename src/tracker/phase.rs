//! Phase configuration.
//!
//! The project lifecycle is a fixed, ordered list of phases. Every action
//! trigger belongs to exactly one phase; the membership lives in
//! [`ActionTrigger::phase`] so adding a trigger without placing it in a phase
//! is a compile error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TrackerError;

/// Identifier of a lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseId {
    PreKickoff,
    KickoffMeeting,
    BriefingDesign,
    ProgrammingQc,
    LaunchMonitoring,
    AnalysisPlan,
    AnalysisInsights,
    ReportQc,
}

impl PhaseId {
    /// All phases in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::PreKickoff,
        Self::KickoffMeeting,
        Self::BriefingDesign,
        Self::ProgrammingQc,
        Self::LaunchMonitoring,
        Self::AnalysisPlan,
        Self::AnalysisInsights,
        Self::ReportQc,
    ];

    /// Slug used in persisted data and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreKickoff => "pre-kickoff",
            Self::KickoffMeeting => "kickoff-meeting",
            Self::BriefingDesign => "briefing-design",
            Self::ProgrammingQc => "programming-qc",
            Self::LaunchMonitoring => "launch-monitoring",
            Self::AnalysisPlan => "analysis-plan",
            Self::AnalysisInsights => "analysis-insights",
            Self::ReportQc => "report-qc",
        }
    }

    /// Position of this phase in [`PHASES`].
    pub fn index(&self) -> usize {
        match self {
            Self::PreKickoff => 0,
            Self::KickoffMeeting => 1,
            Self::BriefingDesign => 2,
            Self::ProgrammingQc => 3,
            Self::LaunchMonitoring => 4,
            Self::AnalysisPlan => 5,
            Self::AnalysisInsights => 6,
            Self::ReportQc => 7,
        }
    }

    /// Static configuration for this phase.
    pub fn config(&self) -> &'static Phase {
        &PHASES[self.index()]
    }

    /// 1-based phase number.
    pub fn number(&self) -> u32 {
        self.config().number
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// The phase after this one in the global order, if any.
    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Whether this is the first phase.
    pub fn is_first(&self) -> bool {
        self.index() == 0
    }

    /// Whether this is the last phase.
    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseId {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| TrackerError::UnknownPhase(s.to_string()))
    }
}

/// A named unit of work whose completion is logged on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTrigger {
    // Pre-Kickoff
    DossierGenerated,
    ContextResearchDone,
    // Kickoff Meeting
    KoDeckGenerated,
    TranscriptionProcessed,
    KoMeetingDone,
    // Briefing & Design
    ResearchBriefCreated,
    BriefCreated,
    SurveyDesigned,
    QuestionnaireApproved,
    // Programming & QC
    TxtGenerated,
    ProgrammingQcDone,
    SurveyProgrammed,
    QcPassed,
    // Launch & Monitoring
    SoftLaunchDone,
    SoftLaunchAnalyzed,
    FullLaunchDone,
    FieldworkComplete,
    OeCoded,
    // Analysis Plan
    AnalysisPlanCreated,
    DataCutsDefined,
    // Analysis & Insights
    InsightsGenerated,
    ReportDrafted,
    // Report QC
    ReportQcValidated,
    ReportQcPassed,
    ReportDelivered,
}

impl ActionTrigger {
    /// Every trigger, grouped by phase in lifecycle order.
    pub const ALL: [Self; 25] = [
        Self::DossierGenerated,
        Self::ContextResearchDone,
        Self::KoDeckGenerated,
        Self::TranscriptionProcessed,
        Self::KoMeetingDone,
        Self::ResearchBriefCreated,
        Self::BriefCreated,
        Self::SurveyDesigned,
        Self::QuestionnaireApproved,
        Self::TxtGenerated,
        Self::ProgrammingQcDone,
        Self::SurveyProgrammed,
        Self::QcPassed,
        Self::SoftLaunchDone,
        Self::SoftLaunchAnalyzed,
        Self::FullLaunchDone,
        Self::FieldworkComplete,
        Self::OeCoded,
        Self::AnalysisPlanCreated,
        Self::DataCutsDefined,
        Self::InsightsGenerated,
        Self::ReportDrafted,
        Self::ReportQcValidated,
        Self::ReportQcPassed,
        Self::ReportDelivered,
    ];

    /// The phase this trigger belongs to.
    pub fn phase(&self) -> PhaseId {
        match self {
            Self::DossierGenerated | Self::ContextResearchDone => PhaseId::PreKickoff,
            Self::KoDeckGenerated | Self::TranscriptionProcessed | Self::KoMeetingDone => {
                PhaseId::KickoffMeeting
            }
            Self::ResearchBriefCreated
            | Self::BriefCreated
            | Self::SurveyDesigned
            | Self::QuestionnaireApproved => PhaseId::BriefingDesign,
            Self::TxtGenerated
            | Self::ProgrammingQcDone
            | Self::SurveyProgrammed
            | Self::QcPassed => PhaseId::ProgrammingQc,
            Self::SoftLaunchDone
            | Self::SoftLaunchAnalyzed
            | Self::FullLaunchDone
            | Self::FieldworkComplete
            | Self::OeCoded => PhaseId::LaunchMonitoring,
            Self::AnalysisPlanCreated | Self::DataCutsDefined => PhaseId::AnalysisPlan,
            Self::InsightsGenerated | Self::ReportDrafted => PhaseId::AnalysisInsights,
            Self::ReportQcValidated | Self::ReportQcPassed | Self::ReportDelivered => {
                PhaseId::ReportQc
            }
        }
    }

    /// Identifier used in persisted data and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DossierGenerated => "dossier_generated",
            Self::ContextResearchDone => "context_research_done",
            Self::KoDeckGenerated => "ko_deck_generated",
            Self::TranscriptionProcessed => "transcription_processed",
            Self::KoMeetingDone => "ko_meeting_done",
            Self::ResearchBriefCreated => "research_brief_created",
            Self::BriefCreated => "brief_created",
            Self::SurveyDesigned => "survey_designed",
            Self::QuestionnaireApproved => "questionnaire_approved",
            Self::TxtGenerated => "txt_generated",
            Self::ProgrammingQcDone => "programming_qc_done",
            Self::SurveyProgrammed => "survey_programmed",
            Self::QcPassed => "qc_passed",
            Self::SoftLaunchDone => "soft_launch_done",
            Self::SoftLaunchAnalyzed => "soft_launch_analyzed",
            Self::FullLaunchDone => "full_launch_done",
            Self::FieldworkComplete => "fieldwork_complete",
            Self::OeCoded => "oe_coded",
            Self::AnalysisPlanCreated => "analysis_plan_created",
            Self::DataCutsDefined => "data_cuts_defined",
            Self::InsightsGenerated => "insights_generated",
            Self::ReportDrafted => "report_drafted",
            Self::ReportQcValidated => "report_qc_validated",
            Self::ReportQcPassed => "report_qc_passed",
            Self::ReportDelivered => "report_delivered",
        }
    }

    /// Default log description for this action.
    pub fn description(&self) -> &'static str {
        match self {
            Self::DossierGenerated => "Dossier completo generado (contexto + cliente + industria)",
            Self::ContextResearchDone => "Investigacion de contexto completada",
            Self::KoDeckGenerated => "Presentacion de KO generada",
            Self::TranscriptionProcessed => "Transcripcion del meeting procesada",
            Self::KoMeetingDone => "Meeting de KO completado",
            Self::ResearchBriefCreated => "Research Brief generado con IA",
            Self::BriefCreated => "Research Brief creado",
            Self::SurveyDesigned => "Encuesta disenada",
            Self::QuestionnaireApproved => "Cuestionario aprobado",
            Self::TxtGenerated => "Archivo TXT generado",
            Self::ProgrammingQcDone => "QC de programacion con IA completado",
            Self::SurveyProgrammed => "Survey programado en Qualtrics",
            Self::QcPassed => "QC de programacion aprobado",
            Self::SoftLaunchDone => "Soft launch completado",
            Self::SoftLaunchAnalyzed => "Analisis de soft launch completado",
            Self::FullLaunchDone => "Full launch completado",
            Self::FieldworkComplete => "Fieldwork completado",
            Self::OeCoded => "Respuestas abiertas codificadas",
            Self::AnalysisPlanCreated => "Plan de analisis creado",
            Self::DataCutsDefined => "Data cuts definidos",
            Self::InsightsGenerated => "Insights generados",
            Self::ReportDrafted => "Reporte borrador completado",
            Self::ReportQcValidated => "Reporte validado vs crosstabs",
            Self::ReportQcPassed => "QC de reporte aprobado",
            Self::ReportDelivered => "Reporte entregado al cliente",
        }
    }
}

impl fmt::Display for ActionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionTrigger {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| TrackerError::UnknownTrigger(s.to_string()))
    }
}

/// Static configuration of a lifecycle phase.
#[derive(Debug)]
pub struct Phase {
    /// Phase identifier
    pub id: PhaseId,

    /// 1-based position in the lifecycle
    pub number: u32,

    /// Display name
    pub name: &'static str,

    /// Short description
    pub description: &'static str,

    /// Triggers that belong to this phase, in display order
    pub triggers: &'static [ActionTrigger],
}

/// The lifecycle, in order.
pub static PHASES: [Phase; 8] = [
    Phase {
        id: PhaseId::PreKickoff,
        number: 1,
        name: "Pre-Kick Off",
        description: "Dossier de contexto",
        triggers: &[ActionTrigger::DossierGenerated, ActionTrigger::ContextResearchDone],
    },
    Phase {
        id: PhaseId::KickoffMeeting,
        number: 2,
        name: "Kick Off Meeting",
        description: "Presentacion y transcripcion",
        triggers: &[
            ActionTrigger::KoDeckGenerated,
            ActionTrigger::TranscriptionProcessed,
            ActionTrigger::KoMeetingDone,
        ],
    },
    Phase {
        id: PhaseId::BriefingDesign,
        number: 3,
        name: "Briefing & Design",
        description: "Brief y encuesta",
        triggers: &[
            ActionTrigger::ResearchBriefCreated,
            ActionTrigger::BriefCreated,
            ActionTrigger::SurveyDesigned,
            ActionTrigger::QuestionnaireApproved,
        ],
    },
    Phase {
        id: PhaseId::ProgrammingQc,
        number: 4,
        name: "Programming & QC",
        description: "Codigo TXT y QC",
        triggers: &[
            ActionTrigger::TxtGenerated,
            ActionTrigger::ProgrammingQcDone,
            ActionTrigger::SurveyProgrammed,
            ActionTrigger::QcPassed,
        ],
    },
    Phase {
        id: PhaseId::LaunchMonitoring,
        number: 5,
        name: "Launch & Monitor",
        description: "Soft launch y fieldwork",
        triggers: &[
            ActionTrigger::SoftLaunchDone,
            ActionTrigger::SoftLaunchAnalyzed,
            ActionTrigger::FullLaunchDone,
            ActionTrigger::FieldworkComplete,
            ActionTrigger::OeCoded,
        ],
    },
    Phase {
        id: PhaseId::AnalysisPlan,
        number: 6,
        name: "Analysis Plan",
        description: "Plan de analisis",
        triggers: &[ActionTrigger::AnalysisPlanCreated, ActionTrigger::DataCutsDefined],
    },
    Phase {
        id: PhaseId::AnalysisInsights,
        number: 7,
        name: "Analysis & Insights",
        description: "Key findings",
        triggers: &[ActionTrigger::InsightsGenerated, ActionTrigger::ReportDrafted],
    },
    Phase {
        id: PhaseId::ReportQc,
        number: 8,
        name: "Report QC",
        description: "Validacion final",
        triggers: &[
            ActionTrigger::ReportQcValidated,
            ActionTrigger::ReportQcPassed,
            ActionTrigger::ReportDelivered,
        ],
    },
];

/// Contracted service types and the phases they include.
///
/// Order matters: partial matches in [`included_phases`] take the first entry
/// whose key overlaps the service string.
pub static SERVICE_PHASES: [(&str, &[PhaseId]); 4] = [
    ("full service", &PhaseId::ALL),
    (
        "sample only",
        &[
            PhaseId::PreKickoff,
            PhaseId::KickoffMeeting,
            PhaseId::BriefingDesign,
            PhaseId::ProgrammingQc,
            PhaseId::LaunchMonitoring,
        ],
    ),
    ("reporting", &[PhaseId::AnalysisPlan, PhaseId::AnalysisInsights, PhaseId::ReportQc]),
    (
        "data processing",
        &[
            PhaseId::PreKickoff,
            PhaseId::KickoffMeeting,
            PhaseId::BriefingDesign,
            PhaseId::ProgrammingQc,
            PhaseId::LaunchMonitoring,
            PhaseId::AnalysisPlan,
        ],
    ),
];

/// Resolve the phases a project includes.
///
/// An explicit selection wins. Otherwise the legacy service type is matched
/// against [`SERVICE_PHASES`]: exact key first, then the first key that is a
/// substring of the service type or contains it. No service type, or no
/// match, means every phase.
pub fn included_phases(explicit: &[PhaseId], service_type: Option<&str>) -> Vec<PhaseId> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    let Some(service_type) = service_type else {
        return PhaseId::ALL.to_vec();
    };

    let key = service_type.to_lowercase();

    if let Some((_, phases)) = SERVICE_PHASES.iter().find(|(k, _)| *k == key) {
        return phases.to_vec();
    }

    for (k, phases) in &SERVICE_PHASES {
        if key.contains(k) || k.contains(key.as_str()) {
            return phases.to_vec();
        }
    }

    PhaseId::ALL.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_phase_numbers_match_positions() {
        for (i, phase) in PHASES.iter().enumerate() {
            assert_eq!(phase.number as usize, i + 1);
            assert_eq!(phase.id.index(), i);
            assert_eq!(PhaseId::ALL[i], phase.id);
        }
    }

    #[test]
    fn test_triggers_unique_across_phases() {
        let mut seen = HashSet::new();
        for phase in &PHASES {
            for trigger in phase.triggers {
                assert!(seen.insert(*trigger), "{trigger} listed twice");
            }
        }
        assert_eq!(seen.len(), ActionTrigger::ALL.len());
    }

    #[test]
    fn test_trigger_membership_agrees_with_table() {
        for phase in &PHASES {
            for trigger in phase.triggers {
                assert_eq!(trigger.phase(), phase.id);
            }
        }
    }

    #[test]
    fn test_next_phase() {
        assert_eq!(PhaseId::PreKickoff.next(), Some(PhaseId::KickoffMeeting));
        assert_eq!(PhaseId::AnalysisInsights.next(), Some(PhaseId::ReportQc));
        assert_eq!(PhaseId::ReportQc.next(), None);
        assert!(PhaseId::ReportQc.is_last());
        assert!(PhaseId::PreKickoff.is_first());
    }

    #[test]
    fn test_phase_id_parsing() {
        assert_eq!("pre-kickoff".parse::<PhaseId>().unwrap(), PhaseId::PreKickoff);
        assert_eq!(" Report-QC ".parse::<PhaseId>().unwrap(), PhaseId::ReportQc);
        assert!(matches!("post-kickoff".parse::<PhaseId>(), Err(TrackerError::UnknownPhase(_))));
    }

    #[test]
    fn test_trigger_parsing() {
        assert_eq!(
            "dossier_generated".parse::<ActionTrigger>().unwrap(),
            ActionTrigger::DossierGenerated
        );
        assert_eq!("txt-generated".parse::<ActionTrigger>().unwrap(), ActionTrigger::TxtGenerated);
        assert!("launch_party".parse::<ActionTrigger>().is_err());
    }

    #[test]
    fn test_serde_names_match_slugs() {
        let json = serde_json::to_string(&PhaseId::LaunchMonitoring).unwrap();
        assert_eq!(json, "\"launch-monitoring\"");
        let json = serde_json::to_string(&ActionTrigger::OeCoded).unwrap();
        assert_eq!(json, "\"oe_coded\"");
    }

    #[test]
    fn test_included_phases_explicit_wins() {
        let explicit = [PhaseId::AnalysisPlan, PhaseId::ReportQc];
        assert_eq!(included_phases(&explicit, Some("Full Service")), explicit.to_vec());
    }

    #[test]
    fn test_included_phases_defaults_to_all() {
        assert_eq!(included_phases(&[], None), PhaseId::ALL.to_vec());
        assert_eq!(included_phases(&[], Some("Bespoke Consulting")), PhaseId::ALL.to_vec());
    }

    #[test]
    fn test_included_phases_exact_match_is_case_insensitive() {
        let phases = included_phases(&[], Some("Sample Only"));
        assert_eq!(phases.len(), 5);
        assert_eq!(phases.last(), Some(&PhaseId::LaunchMonitoring));
    }

    #[test]
    fn test_included_phases_partial_match() {
        let phases = included_phases(&[], Some("Reporting de 30 slides"));
        assert_eq!(phases, vec![PhaseId::AnalysisPlan, PhaseId::AnalysisInsights, PhaseId::ReportQc]);

        // Key contains the service string
        let phases = included_phases(&[], Some("data"));
        assert_eq!(phases.last(), Some(&PhaseId::AnalysisPlan));
    }

    #[test]
    fn test_included_phases_overlap_uses_declaration_order() {
        // Both "sample only" and "reporting" appear; "sample only" is declared first.
        let phases = included_phases(&[], Some("Reporting + Sample Only"));
        assert_eq!(phases.last(), Some(&PhaseId::LaunchMonitoring));
    }

    #[test]
    fn test_included_phases_is_deterministic() {
        let a = included_phases(&[], Some("Data Processing Plus"));
        let b = included_phases(&[], Some("Data Processing Plus"));
        assert_eq!(a, b);
    }
}
