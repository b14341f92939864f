//! Runtime holding the shared provider and tool registry
//!
//! The AgentRuntime owns the resources every war room agent needs and hands
//! out executors restricted to the tools each agent is allowed to call.

use agent_core::Result;
use agent_llm::LLMProvider;
use agent_tools::ToolRegistry;
use std::sync::Arc;
use tracing::debug;

use crate::agents::{SimpleAgent, SimpleConfig};
use crate::executor::{AgentExecutor, DEFAULT_MODEL, ExecutorConfig};

/// Configuration for the agent runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Default maximum turns for tool-using agents
    pub default_max_iterations: usize,

    /// Default model to use
    pub default_model: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_max_iterations: 5,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Runtime for executing agents with dependency injection
///
/// # Example
///
/// ```no_run
/// use agent_runtime::{AgentRuntime, ExecutorConfig};
/// use agent_llm::providers::AnthropicProvider;
/// use agent_tools::ToolRegistry;
/// use std::sync::Arc;
///
/// # fn example() -> agent_core::Result<()> {
/// let runtime = AgentRuntime::builder()
///     .provider(Arc::new(AnthropicProvider::from_env().unwrap()))
///     .tool_registry(Arc::new(ToolRegistry::new()))
///     .build()?;
///
/// let executor = runtime.executor(ExecutorConfig::default(), &["check_anomalies"]);
/// # Ok(())
/// # }
/// ```
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: RuntimeConfig,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Executor config seeded with the runtime defaults
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_iterations: self.config.default_max_iterations,
            model: self.config.default_model.clone(),
            ..ExecutorConfig::default()
        }
    }

    /// Create a one-shot agent (LLM only, no tools)
    pub fn simple_agent(&self, config: SimpleConfig, name: impl Into<String>) -> SimpleAgent {
        SimpleAgent::new(self.provider.clone(), config, name)
    }

    /// Create an executor that may call every registered tool
    pub fn executor_with_all_tools(&self, config: ExecutorConfig) -> AgentExecutor {
        AgentExecutor::new(self.provider.clone(), self.tool_registry.clone(), config)
    }

    /// Create an executor restricted to the named tools
    ///
    /// Names that are not registered are skipped.
    pub fn executor(&self, config: ExecutorConfig, tool_names: &[&str]) -> AgentExecutor {
        let subset = self.tool_registry.subset(tool_names);
        debug!(
            requested = tool_names.len(),
            available = subset.len(),
            "Building restricted tool set"
        );
        AgentExecutor::new(self.provider.clone(), Arc::new(subset), config)
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Option<Arc<ToolRegistry>>,
    config: RuntimeConfig,
}

impl AgentRuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = Some(registry);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default max iterations
    pub fn default_max_iterations(mut self, max: usize) -> Self {
        self.config.default_max_iterations = max;
        self
    }

    /// Set the default model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    /// Build the runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not set
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self.provider.ok_or_else(|| {
            agent_core::Error::InitializationFailed("Provider not set".to_string())
        })?;

        let tool_registry = self
            .tool_registry
            .unwrap_or_else(|| Arc::new(ToolRegistry::new()));

        Ok(AgentRuntime::new(provider, tool_registry, self.config))
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
