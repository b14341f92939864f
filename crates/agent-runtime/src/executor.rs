//! Agent executor for running tool-calling loops
//!
//! The AgentExecutor implements the research loop the war room agents use:
//! 1. Call the LLM with the conversation and the available tools
//! 2. If the model asked for tools, run them in order and feed every result
//!    back in a single message
//! 3. Stop when the model calls the configured finish tool, or answers with
//!    plain text
//! 4. Fail with [`agent_core::Error::TurnLimitExceeded`] if neither happens
//!    within `max_iterations` turns

use agent_core::{Error, Result};
use agent_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, TokenUsage, ToolDefinition,
};
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default model for every executor
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Event handler for agent execution events
///
/// Implement this trait to follow tool calls as they happen, for example to
/// print progress in a terminal.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called when a tool execution starts
    async fn on_tool_start(&self, _id: &str, _name: &str, _input: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _id: &str,
        _name: &str,
        _result: std::result::Result<&Value, &str>,
        _duration_ms: u64,
    ) {
    }

    /// Called when the agent completes
    async fn on_complete(&self, _outcome: &Outcome) {}

    /// Called when an error occurs
    async fn on_error(&self, _error: &str) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of model turns
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature; provider default when unset
    pub temperature: Option<f32>,

    /// Terminal tool: when the model calls it, its input is the result and
    /// the loop ends without executing anything
    pub finish_tool: Option<ToolDefinition>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_tokens: 4000,
            temperature: None,
            finish_tool: None,
        }
    }
}

/// One executed tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub input: Value,
    /// Serialized result, or the error message when `is_error` is set
    pub output: String,
    pub is_error: bool,
}

/// How an execution ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The model called the finish tool with this input
    Finished { input: Value },
    /// The model answered in text without calling any tool
    Answered { text: String },
}

/// Result of a full executor run
#[derive(Debug, Clone)]
pub struct Execution {
    pub outcome: Outcome,
    /// Every tool call made before the loop ended, in order
    pub tool_calls: Vec<ToolCallRecord>,
    pub usage: TokenUsage,
    /// Model turns consumed
    pub iterations: usize,
}

impl Execution {
    /// Successful tool outputs as `[name]:\n<output>` blocks separated by a
    /// blank line, in call order
    pub fn collected_output(&self) -> String {
        self.tool_calls
            .iter()
            .filter(|call| !call.is_error)
            .map(|call| format!("[{}]:\n{}", call.name, call.output))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Names of the tools called, in order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_calls.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Execute the loop for a single user message
    pub async fn run(&self, user_message: impl Into<String>) -> Result<Execution> {
        self.run_conversation(vec![Message::user(user_message)], None)
            .await
    }

    /// Execute the loop with a per-request event handler
    pub async fn run_with_handler(
        &self,
        user_message: impl Into<String>,
        handler: Arc<dyn ExecutorEventHandler>,
    ) -> Result<Execution> {
        self.run_conversation(vec![Message::user(user_message)], Some(handler))
            .await
    }

    async fn run_conversation(
        &self,
        initial_conversation: Vec<Message>,
        event_handler: Option<Arc<dyn ExecutorEventHandler>>,
    ) -> Result<Execution> {
        let mut conversation = initial_conversation;
        let mut tool_calls = Vec::new();
        let mut usage = TokenUsage::default();
        let tools = self.build_tool_definitions();
        let finish_name = self.config.finish_tool.as_ref().map(|t| t.name.as_str());

        for iteration in 1..=self.config.max_iterations {
            info!(
                iteration,
                max_iterations = self.config.max_iterations,
                tool_count = tools.len(),
                model = %self.config.model,
                "Agent iteration started"
            );

            let mut builder = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone());
            if let Some(system) = &self.config.system_prompt {
                builder = builder.system(system.clone());
            }
            if let Some(temperature) = self.config.temperature {
                builder = builder.temperature(temperature);
            }

            let response = match self.provider.complete(builder.build()).await {
                Ok(response) => response,
                Err(e) => {
                    let message = e.to_string();
                    warn!(iteration, error = %message, "LLM request failed");
                    if let Some(handler) = &event_handler {
                        handler.on_error(&message).await;
                    }
                    return Err(Error::Generation(message));
                }
            };
            usage.add(response.usage);

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            let message = response.message;
            if !message.has_tool_uses() {
                if response.stop_reason == StopReason::MaxTokens {
                    warn!("Response truncated at max tokens");
                }
                let outcome = Outcome::Answered {
                    text: message.text(),
                };
                info!(iteration, "Agent answered without tools");
                if let Some(handler) = &event_handler {
                    handler.on_complete(&outcome).await;
                }
                return Ok(Execution {
                    outcome,
                    tool_calls,
                    usage,
                    iterations: iteration,
                });
            }

            let mut results = Vec::new();
            for tool_use in message.tool_uses() {
                if Some(tool_use.name) == finish_name {
                    info!(
                        iteration,
                        tool = tool_use.name,
                        calls = tool_calls.len(),
                        "Finish tool called"
                    );
                    let outcome = Outcome::Finished {
                        input: tool_use.input.clone(),
                    };
                    if let Some(handler) = &event_handler {
                        handler.on_complete(&outcome).await;
                    }
                    return Ok(Execution {
                        outcome,
                        tool_calls,
                        usage,
                        iterations: iteration,
                    });
                }

                let record = self
                    .execute_tool(tool_use.id, tool_use.name, tool_use.input, event_handler.as_ref())
                    .await;
                results.push(if record.is_error {
                    ContentBlock::tool_error(&record.id, &record.output)
                } else {
                    ContentBlock::tool_result(&record.id, &record.output)
                });
                tool_calls.push(record);
            }

            debug!(result_count = results.len(), "Continuing agent loop");
            conversation.push(message);
            conversation.push(Message::tool_results(results));
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Turn limit reached without a final answer"
        );
        let error = Error::TurnLimitExceeded(self.config.max_iterations);
        if let Some(handler) = &event_handler {
            handler.on_error(&error.to_string()).await;
        }
        Err(error)
    }

    async fn execute_tool(
        &self,
        id: &str,
        name: &str,
        input: &Value,
        event_handler: Option<&Arc<dyn ExecutorEventHandler>>,
    ) -> ToolCallRecord {
        info!(tool = name, input = %input, "Executing tool");
        if let Some(handler) = event_handler {
            handler.on_tool_start(id, name, input).await;
        }

        let start = Instant::now();
        let result = match self.tool_registry.get(name) {
            Some(tool) => tool.execute(input.clone()).await.map_err(|e| e.to_string()),
            None => Err(format!("Unknown tool: {name}")),
        };
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if let Some(handler) = event_handler {
            handler
                .on_tool_done(id, name, result.as_ref().map_err(String::as_str), duration_ms)
                .await;
        }

        let (output, is_error) = match result {
            Ok(value) => {
                debug!(tool = name, duration_ms, "Tool succeeded");
                (value.to_string(), false)
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                (format!("Error: {e}"), true)
            }
        };

        ToolCallRecord {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
            output,
            is_error,
        }
    }

    /// Registry tools followed by the finish tool
    fn build_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.tool_registry.definitions();
        if let Some(finish) = &self.config.finish_tool {
            definitions.push(finish.clone());
        }
        definitions
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Option<Arc<ToolRegistry>>,
    config: ExecutorConfig,
}

impl AgentExecutorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: None,
            config: ExecutorConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = Some(registry);
        self
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn finish_tool(mut self, tool: ToolDefinition) -> Self {
        self.config.finish_tool = Some(tool);
        self
    }

    /// Build the executor
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not set
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;
        let tool_registry = self
            .tool_registry
            .unwrap_or_else(|| Arc::new(ToolRegistry::new()));

        Ok(AgentExecutor {
            provider,
            tool_registry,
            config: self.config,
        })
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
