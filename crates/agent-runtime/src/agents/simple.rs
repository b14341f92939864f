//! Simple agent implementation (LLM only, no tools)

use agent_core::{Agent, Context, Error, Result};
use agent_llm::{CompletionRequest, LLMProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::executor::DEFAULT_MODEL;

/// Configuration for a simple agent
#[derive(Debug, Clone)]
pub struct SimpleConfig {
    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature; provider default when unset
    pub temperature: Option<f32>,
}

impl Default for SimpleConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_tokens: 4000,
            temperature: None,
        }
    }
}

/// A one-shot agent: one prompt in, one generated text out
///
/// # Example
///
/// ```no_run
/// use agent_runtime::{SimpleAgent, SimpleConfig};
/// use agent_core::{Agent, Context};
/// use agent_llm::providers::AnthropicProvider;
/// use std::sync::Arc;
///
/// # async fn example() -> agent_core::Result<()> {
/// let provider = Arc::new(AnthropicProvider::from_env().unwrap());
/// let agent = SimpleAgent::new(provider, SimpleConfig::default(), "topic");
/// let mut context = Context::new();
/// let questions = agent.process("Ask about RPO".to_string(), &mut context).await?;
/// # Ok(())
/// # }
/// ```
pub struct SimpleAgent {
    provider: Arc<dyn LLMProvider>,
    config: SimpleConfig,
    name: String,
}

impl SimpleAgent {
    /// Create a new simple agent
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        config: SimpleConfig,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            config,
            name: name.into(),
        }
    }

    /// Get the agent's configuration
    pub fn config(&self) -> &SimpleConfig {
        &self.config
    }
}

#[async_trait]
impl Agent for SimpleAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(vec![Message::user(input)])
            .max_tokens(self.config.max_tokens);
        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }

        let response = self.provider.complete(builder.build()).await.map_err(|e| {
            warn!(agent = %self.name, error = %e, "Generation failed");
            Error::Generation(e.to_string())
        })?;

        context.add_tokens(response.usage.total());
        info!(
            agent = %self.name,
            tokens = response.usage.total(),
            "Generation complete"
        );
        Ok(response.message.text())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
