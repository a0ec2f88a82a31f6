//! AI integration module.
//!
//! Generates project deliverables (dossiers, decks, briefs, survey drafts,
//! reports) with Claude. Each [`GenerationTask`] runs on a model tier and,
//! where the deliverable belongs to a phase, produces the cached output of
//! one [`ActionTrigger`](crate::tracker::ActionTrigger).

mod claude;
mod context;
mod task;

pub use claude::ClaudeProvider;
pub use context::{build_user_message, refine_objectives, ProjectContext};
pub use task::{GenerationTask, ModelTier};

use async_trait::async_trait;

use crate::core::AiConfig;

/// A fully prepared generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub task: GenerationTask,
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub user_message: String,
}

impl GenerationRequest {
    /// Prepare a request for `task`, picking the model from the task's tier.
    pub fn new(
        task: GenerationTask,
        context: Option<&ProjectContext>,
        additional_prompt: Option<&str>,
        config: &AiConfig,
    ) -> Self {
        Self {
            task,
            model: task.tier().model(&config.models).to_string(),
            max_tokens: config.max_tokens,
            system: task.system_prompt().to_string(),
            user_message: build_user_message(context, task.as_str(), additional_prompt),
        }
    }
}

/// Generated content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub content: String,
    /// Model that produced the content
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Trait for AI providers.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Run a generation request.
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Generation>;

    /// Get the provider name.
    fn name(&self) -> &str;

    /// Check if the provider is available.
    async fn is_available(&self) -> bool;
}

/// AI error types.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    #[error("Provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("No response from AI")]
    NoResponse,

    #[error("Unknown generation task: {0}")]
    UnknownTask(String),
}

/// AI provider manager with fallback support.
///
/// Providers are tried in order; the first success wins.
pub struct AIManager {
    providers: Vec<Box<dyn AIProvider>>,
}

impl AIManager {
    /// Create with an explicit provider chain.
    pub fn new(providers: Vec<Box<dyn AIProvider>>) -> Self {
        Self { providers }
    }

    /// Build the provider chain from configuration and environment.
    pub async fn from_config(config: &AiConfig) -> Self {
        let mut providers: Vec<Box<dyn AIProvider>> = Vec::new();

        if !config.enabled {
            return Self { providers };
        }

        match config.provider.as_str() {
            "claude" => match ClaudeProvider::new() {
                Ok(claude) => {
                    if claude.is_available().await {
                        providers.push(Box::new(claude));
                    }
                }
                Err(e) => tracing::warn!(provider = "claude", error = %e, "Provider unavailable"),
            },
            other => tracing::warn!(provider = other, "Unknown AI provider"),
        }

        Self { providers }
    }

    /// Append a provider to the chain.
    pub fn with_provider(mut self, provider: Box<dyn AIProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Check if any AI provider is available.
    pub fn is_available(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Get the active provider name.
    pub fn active_provider(&self) -> Option<&str> {
        self.providers.first().map(|p| p.name())
    }

    /// Run a request, falling back through the chain on failure.
    pub async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Generation> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.generate(request).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AIError::ProviderNotAvailable("No AI provider available".to_string()).into()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockProvider {
        name: &'static str,
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn boxed(name: &'static str, reply: Option<&'static str>, calls: &Arc<AtomicUsize>) -> Box<dyn AIProvider> {
            Box::new(Self { name, reply, calls: Arc::clone(calls) })
        }
    }

    #[async_trait]
    impl AIProvider for MockProvider {
        async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Generation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(Generation {
                    content: format!("{text}:{}", request.task),
                    model: request.model.clone(),
                    input_tokens: 1,
                    output_tokens: 1,
                }),
                None => Err(AIError::ApiError("boom".to_string()).into()),
            }
        }

        fn name(&self) -> &str {
            self.name
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn request(task: GenerationTask) -> GenerationRequest {
        GenerationRequest::new(task, None, None, &AiConfig::default())
    }

    #[test]
    fn test_request_uses_task_tier() {
        let req = request(GenerationTask::InsightsReport);
        assert_eq!(req.model, "claude-opus-4-20250514");
        assert_eq!(req.max_tokens, 8192);
        assert_eq!(req.user_message, "Por favor, genera el contenido para la tarea: insights-report");
    }

    #[tokio::test]
    async fn test_manager_falls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = AIManager::new(vec![
            MockProvider::boxed("broken", None, &calls),
            MockProvider::boxed("working", Some("ok"), &calls),
        ]);

        assert_eq!(manager.active_provider(), Some("broken"));
        let generation = manager.generate(&request(GenerationTask::Dossier)).await.unwrap();
        assert_eq!(generation.content, "ok:dossier");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_manager_reports_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = AIManager::new(vec![MockProvider::boxed("broken", None, &calls)]);
        let err = manager.generate(&request(GenerationTask::KoDeck)).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AIError>(), Some(AIError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_empty_manager_is_unavailable() {
        let manager = AIManager::new(Vec::new());
        assert!(!manager.is_available());
        let err = manager.generate(&request(GenerationTask::ClientInfo)).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AIError>(), Some(AIError::ProviderNotAvailable(_))));
    }

    #[tokio::test]
    async fn test_disabled_config_has_no_providers() {
        let config = AiConfig { enabled: false, ..AiConfig::default() };
        assert!(!AIManager::from_config(&config).await.is_available());
    }
}
