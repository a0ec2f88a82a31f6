//! Core application infrastructure.

mod config;

#[cfg(feature = "ai")]
pub use config::{AiConfig, ModelConfig};
pub use config::{Config, GeneralConfig, StoreConfig, LOCAL_CONFIG_FILE};
