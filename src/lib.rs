//! # rxhub
//!
//! Research operations hub for survey projects.
//!
//! rxhub tracks market-research projects through an eight-phase lifecycle,
//! converts plain-text questionnaires into Qualtrics Advanced Format TXT, and
//! estimates delivery dates on a Mexican/US business-day calendar.
//!
//! ## Features
//!
//! - **Phase Tracker**: Completing an action of the current phase advances the project
//! - **Survey Converter**: Questions, choices, blocks and skip markers become Qualtrics tags
//! - **Delivery Calendar**: Business days that skip weekends and federal holidays
//! - **AI Integration**: Dossiers, decks and briefs generated with Claude (optional)
//!
//! ## Quick Start
//!
//! ```bash
//! rxhub project new --client "Acme" --name "Brand Health"
//! rxhub action complete <id> dossier_generated
//! rxhub convert survey.md -o survey.txt
//! rxhub timeline 2024-06-03
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::needless_pass_by_value)]

pub mod core;
pub mod schedule;
pub mod survey;
pub mod tracker;

#[cfg(feature = "ai")]
pub mod ai;

#[cfg(feature = "ai")]
pub use ai::{AIManager, AIProvider, ClaudeProvider, GenerationRequest, GenerationTask, ProjectContext};

// Re-export commonly used types
pub use core::Config;
pub use tracker::{
    ActionTrigger, DocumentRecord, JsonFileStore, MemoryStore, NewProject, PhaseId, Project,
    ProjectFilter, ProjectService, ProjectStatus, ProjectStore, TrackerError, TrackerResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "rxhub";
