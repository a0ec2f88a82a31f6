//! Generation tasks and their model tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AIError;
use crate::core::ModelConfig;
use crate::tracker::ActionTrigger;

/// Model size class used for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Simple,
    Medium,
    Complex,
}

impl ModelTier {
    /// Configured model id for this tier.
    pub fn model<'a>(&self, models: &'a ModelConfig) -> &'a str {
        match self {
            Self::Simple => &models.simple,
            Self::Medium => &models.medium,
            Self::Complex => &models.complex,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

/// Content an AI provider can be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationTask {
    ClientInfo,
    IndustryResearch,
    CompetitorAnalysis,
    Dossier,
    KoDeck,
    SurveyDesign,
    SurveyOutline,
    AnalysisPlan,
    TranscriptionProcessing,
    ResearchBrief,
    ProgrammingQc,
    OeCoding,
    TxtGeneration,
    InsightsReport,
    FinalPresentation,
    SoftLaunchAnalysis,
    ReportQc,
}

impl GenerationTask {
    pub const ALL: [Self; 17] = [
        Self::ClientInfo,
        Self::IndustryResearch,
        Self::CompetitorAnalysis,
        Self::Dossier,
        Self::KoDeck,
        Self::SurveyDesign,
        Self::SurveyOutline,
        Self::AnalysisPlan,
        Self::TranscriptionProcessing,
        Self::ResearchBrief,
        Self::ProgrammingQc,
        Self::OeCoding,
        Self::TxtGeneration,
        Self::InsightsReport,
        Self::FinalPresentation,
        Self::SoftLaunchAnalysis,
        Self::ReportQc,
    ];

    /// Task identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientInfo => "client-info",
            Self::IndustryResearch => "industry-research",
            Self::CompetitorAnalysis => "competitor-analysis",
            Self::Dossier => "dossier",
            Self::KoDeck => "ko-deck",
            Self::SurveyDesign => "survey-design",
            Self::SurveyOutline => "survey-outline",
            Self::AnalysisPlan => "analysis-plan",
            Self::TranscriptionProcessing => "transcription-processing",
            Self::ResearchBrief => "research-brief",
            Self::ProgrammingQc => "programming-qc",
            Self::OeCoding => "oe-coding",
            Self::TxtGeneration => "txt-generation",
            Self::InsightsReport => "insights-report",
            Self::FinalPresentation => "final-presentation",
            Self::SoftLaunchAnalysis => "soft-launch-analysis",
            Self::ReportQc => "report-qc",
        }
    }

    /// Model tier the task runs on.
    pub fn tier(&self) -> ModelTier {
        match self {
            Self::ClientInfo | Self::IndustryResearch | Self::CompetitorAnalysis => {
                ModelTier::Simple
            }
            Self::Dossier
            | Self::KoDeck
            | Self::SurveyDesign
            | Self::SurveyOutline
            | Self::AnalysisPlan
            | Self::TranscriptionProcessing
            | Self::ResearchBrief
            | Self::ProgrammingQc
            | Self::OeCoding => ModelTier::Medium,
            Self::TxtGeneration
            | Self::InsightsReport
            | Self::FinalPresentation
            | Self::SoftLaunchAnalysis
            | Self::ReportQc => ModelTier::Complex,
        }
    }

    /// Trigger whose cached output this task produces, if any.
    pub fn trigger(&self) -> Option<ActionTrigger> {
        match self {
            Self::Dossier => Some(ActionTrigger::DossierGenerated),
            Self::KoDeck => Some(ActionTrigger::KoDeckGenerated),
            Self::TranscriptionProcessing => Some(ActionTrigger::TranscriptionProcessed),
            Self::ResearchBrief => Some(ActionTrigger::ResearchBriefCreated),
            Self::SurveyDesign => Some(ActionTrigger::SurveyDesigned),
            Self::TxtGeneration => Some(ActionTrigger::TxtGenerated),
            Self::ProgrammingQc => Some(ActionTrigger::ProgrammingQcDone),
            Self::SoftLaunchAnalysis => Some(ActionTrigger::SoftLaunchAnalyzed),
            Self::OeCoding => Some(ActionTrigger::OeCoded),
            Self::AnalysisPlan => Some(ActionTrigger::AnalysisPlanCreated),
            Self::InsightsReport => Some(ActionTrigger::InsightsGenerated),
            Self::ReportQc => Some(ActionTrigger::ReportQcValidated),
            Self::ClientInfo
            | Self::IndustryResearch
            | Self::CompetitorAnalysis
            | Self::SurveyOutline
            | Self::FinalPresentation => None,
        }
    }

    /// System prompt sent with the request.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::ClientInfo => {
                "Eres un asistente de investigación de mercados. Extrae y organiza la información clave del cliente en formato estructurado y conciso, en español."
            }
            Self::IndustryResearch => {
                "Eres un analista senior de investigación de mercados. Resume el panorama, las tendencias y los retos de la industria del cliente, en español."
            }
            Self::CompetitorAnalysis => {
                "Eres un analista competitivo. Describe hasta cinco competidores principales del cliente con su posicionamiento, fortalezas y debilidades, en español."
            }
            Self::Dossier => {
                "Eres un estratega senior de investigación de mercados. Crea un dossier completo del proyecto con perfil del cliente, contactos, industria, competencia, objetivos y metodología sugerida, en Markdown y en español."
            }
            Self::KoDeck => {
                "Eres un consultor senior especializado en presentaciones de kick-off. Redacta el contenido de cada slide del deck inicial con títulos y puntos clave, en Markdown y en español."
            }
            Self::SurveyDesign => {
                "Eres un consultor senior de diseño de encuestas. Diseña un cuestionario completo alineado con los objetivos de investigación, con bloques, preguntas numeradas y opciones de respuesta."
            }
            Self::SurveyOutline => {
                "Eres un consultor senior de diseño de encuestas. Propón el flujo de la encuesta como bloques temáticos con los temas a medir, sin redactar todavía las preguntas."
            }
            Self::AnalysisPlan => {
                "Eres un analista de datos de investigación. Define el plan de análisis con cortes, cruces y pruebas estadísticas que respondan a los objetivos del estudio."
            }
            Self::TranscriptionProcessing => {
                "Eres un consultor de investigación. Procesa la transcripción de la reunión y extrae acuerdos, objetivos, requerimientos y próximos pasos."
            }
            Self::ResearchBrief => {
                "Eres un consultor senior de investigación. Redacta el brief de investigación con contexto, objetivos, audiencia, metodología y entregables."
            }
            Self::ProgrammingQc => {
                "Eres un especialista en control de calidad de programación de encuestas. Revisa la encuesta programada contra el cuestionario y lista las discrepancias."
            }
            Self::OeCoding => {
                "Eres un analista de respuestas abiertas. Codifica las respuestas en un libro de códigos con temas, definiciones y frecuencias."
            }
            Self::TxtGeneration => {
                "Eres un programador de encuestas experto en el formato TXT avanzado de Qualtrics. Convierte el cuestionario al formato de importación sin lógica condicional."
            }
            Self::InsightsReport => {
                "Eres un estratega senior de insights. Redacta los hallazgos clave, implicaciones y recomendaciones a partir de los resultados del estudio."
            }
            Self::FinalPresentation => {
                "Eres un consultor senior de investigación. Estructura la presentación final de resultados con narrativa, hallazgos y recomendaciones por slide."
            }
            Self::SoftLaunchAnalysis => {
                "Eres un analista de campo. Evalúa los datos del soft launch: tiempos, calidad de respuesta, incidencia y problemas de programación."
            }
            Self::ReportQc => {
                "Eres un revisor de calidad de reportes. Valida el reporte final contra los datos y los objetivos y lista correcciones necesarias."
            }
        }
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationTask {
    type Err = AIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| AIError::UnknownTask(s.to_string()))
    }
}
