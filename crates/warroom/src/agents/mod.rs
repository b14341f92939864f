//! Question, defense and topic agents
//!
//! Every agent renders its prompts from the shared [`PromptRegistry`], runs
//! against the [`AgentRuntime`] provider, and records the tools it called and
//! the tokens it spent in the caller's [`agent_core::Context`].

pub mod defense;
pub mod question;
pub mod topic;

pub use defense::{DefenseAgent, DefenseBrief};
pub use question::{QuestionAgent, QuestionBriefing};
pub use topic::{TopicQuestionGenerator, TopicQuestions};

use agent_core::Context;
use agent_prompt::PromptRegistry;
use agent_runtime::{AgentRuntime, Execution, SimpleConfig};
use serde_json::Value;
use std::sync::Arc;

use crate::Result;
use crate::anomaly::{AnomalyDetector, AnomalyReport};
use crate::config::WarRoomConfig;
use crate::kpis::LatestKpis;
use crate::tools::ToolEnv;

/// Everything an agent needs: runtime, data and prompts
#[derive(Clone)]
pub struct AgentDeps {
    pub runtime: Arc<AgentRuntime>,
    pub env: ToolEnv,
    pub prompts: Arc<PromptRegistry>,
}

impl AgentDeps {
    pub fn new(runtime: Arc<AgentRuntime>, env: ToolEnv, prompts: Arc<PromptRegistry>) -> Self {
        Self {
            runtime,
            env,
            prompts,
        }
    }

    pub fn config(&self) -> &WarRoomConfig {
        &self.env.config
    }

    pub(crate) fn render(&self, name: &str, vars: &Value) -> Result<String> {
        Ok(self.prompts.render(name, vars)?)
    }

    /// Headline KPIs of the primary ticker
    pub(crate) fn kpis(&self) -> LatestKpis {
        LatestKpis::from_store(&self.env.store, &self.config().primary_ticker)
    }

    /// Current flags and competitive gaps of the primary ticker
    pub(crate) fn anomalies(&self) -> AnomalyReport {
        AnomalyDetector::new(&self.env.store, &self.config().thresholds).analyze(self.config())
    }

    /// Context seeded with the primary company and its latest quarter
    pub fn context(&self) -> Context {
        seeded_context(&self.env)
    }

    /// Names used in prompts, preferring what the caller seeded into `context`
    pub(crate) fn subject(&self, context: &Context) -> Subject {
        let config = self.config();
        Subject {
            company: context.company().unwrap_or(&config.company_name).to_string(),
            ticker: context.ticker().unwrap_or(&config.primary_ticker).to_string(),
            quarter: context
                .quarter()
                .map(str::to_string)
                .or_else(|| self.kpis().quarter)
                .unwrap_or_default(),
        }
    }

    /// One-shot settings for a final generation call
    pub(crate) fn one_shot(&self, max_tokens: usize) -> SimpleConfig {
        SimpleConfig {
            model: self.config().model.clone(),
            system_prompt: None,
            max_tokens,
            temperature: self.config().temperature,
        }
    }
}

/// Company, ticker and quarter label named in prompts
pub(crate) struct Subject {
    pub company: String,
    pub ticker: String,
    pub quarter: String,
}

pub(crate) fn seeded_context(env: &ToolEnv) -> Context {
    let config = &env.config;
    let context = Context::new()
        .with_ticker(config.primary_ticker.clone())
        .with_company(config.company_name.clone());
    match LatestKpis::from_store(&env.store, &config.primary_ticker).quarter {
        Some(quarter) => context.with_quarter(quarter),
        None => context,
    }
}

/// Copy an execution's tool calls and token usage into the context
pub(crate) fn record_execution(context: &mut Context, execution: &Execution) {
    for name in execution.tool_names() {
        context.record_tool_call(name);
    }
    context.add_tokens(execution.usage.total());
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use agent_llm::{
        CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
        StopReason, TokenUsage,
    };
    use agent_tools::ToolRegistry;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::prompts::prompt_registry;
    use crate::tools::{register_data_tools, test_support::env};

    /// Provider replaying canned responses and keeping every request
    pub struct ScriptedProvider {
        replies: Mutex<VecDeque<agent_llm::Result<CompletionResponse>>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: Vec<agent_llm::Result<CompletionResponse>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn request(&self, index: usize) -> CompletionRequest {
            self.requests.lock().unwrap()[index].clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> agent_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LLMError::RequestFailed("script exhausted".to_string())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn usage() -> TokenUsage {
        TokenUsage {
            input_tokens: 100,
            output_tokens: 20,
        }
    }

    pub fn text(reply: &str) -> agent_llm::Result<CompletionResponse> {
        Ok(CompletionResponse {
            message: Message::assistant(reply),
            stop_reason: StopReason::EndTurn,
            usage: usage(),
        })
    }

    pub fn tool_calls(calls: &[(&str, &str, Value)]) -> agent_llm::Result<CompletionResponse> {
        let blocks = calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: (*id).to_string(),
                name: (*name).to_string(),
                input: input.clone(),
            })
            .collect();
        Ok(CompletionResponse {
            message: Message::assistant_blocks(blocks),
            stop_reason: StopReason::ToolUse,
            usage: usage(),
        })
    }

    pub fn deps(provider: Arc<dyn LLMProvider>) -> AgentDeps {
        let env = env();
        let registry = ToolRegistry::new();
        register_data_tools(&registry, &env);
        let runtime = AgentRuntime::builder()
            .provider(provider)
            .tool_registry(Arc::new(registry))
            .build()
            .unwrap();
        AgentDeps::new(Arc::new(runtime), env, Arc::new(prompt_registry().unwrap()))
    }

    /// Last user message of a request, as text
    pub fn last_user_text(request: &CompletionRequest) -> String {
        request
            .messages
            .last()
            .map(Message::text)
            .unwrap_or_default()
    }
}
