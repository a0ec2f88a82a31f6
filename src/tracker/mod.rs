//! Research project tracking.
//!
//! Projects move through a fixed eight-phase lifecycle. Completing an
//! action trigger of the current phase advances the project one step.

mod error;
mod phase;
mod project;
mod record;
mod service;
mod store;

pub use error::{TrackerError, TrackerResult};
pub use phase::{included_phases, ActionTrigger, Phase, PhaseId, PHASES, SERVICE_PHASES};
pub use project::{
    ClientContact, GemOutput, NewProject, Project, ProjectAction, ProjectStatus, ProjectUpdate,
    UserInput, UserInputData,
};
pub use record::DocumentRecord;
pub use service::{ProjectFilter, ProjectService};
pub use store::{JsonFileStore, MemoryStore, ProjectCollection, ProjectStore, COLLECTION_VERSION};
