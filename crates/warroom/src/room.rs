//! Entry point wiring the store, tools, prompts and agents together

use agent_core::Context;
use agent_llm::providers::{AnthropicConfig, AnthropicProvider};
use agent_llm::{LLMProvider, ToolDefinition};
use agent_prompt::PromptRegistry;
use agent_runtime::AgentRuntime;
use agent_tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agents::{AgentDeps, seeded_context, DefenseAgent, QuestionAgent, TopicQuestionGenerator};
use crate::anomaly::{AnomalyDetector, AnomalyReport, Scope};
use crate::config::WarRoomConfig;
use crate::kpis::LatestKpis;
use crate::prompts::register_prompts;
use crate::store::{DataStore, missing_sources};
use crate::tools::{ToolEnv, data_tool_registry};
use crate::{Result, WarRoomError};

/// The loaded war room: data, tools and, once a provider is attached, agents
///
/// ```no_run
/// use warroom::{WarRoom, WarRoomConfig};
///
/// # async fn example() -> warroom::Result<()> {
/// let room = WarRoom::load(WarRoomConfig::default())?.with_env_provider()?;
/// let briefing = room.question_agent()?.brief(None).await?;
/// for question in &briefing.questions {
///     println!("{}", question.question);
/// }
/// # Ok(())
/// # }
/// ```
pub struct WarRoom {
    env: ToolEnv,
    tools: Arc<ToolRegistry>,
    prompts: Arc<PromptRegistry>,
    runtime: Option<Arc<AgentRuntime>>,
}

impl WarRoom {
    /// Load every CSV source named by the configuration
    pub fn load(config: WarRoomConfig) -> Result<Self> {
        for path in missing_sources(&config.data) {
            warn!(path = %path.display(), "Required data file not found");
        }
        let store = DataStore::load(&config.data)?;
        Self::from_store(config, store)
    }

    /// Build around an already loaded store
    pub fn from_store(config: WarRoomConfig, store: DataStore) -> Result<Self> {
        config.validate()?;
        if !store.has_ticker(&config.primary_ticker) {
            warn!(
                ticker = %config.primary_ticker,
                "Primary ticker has no rows in any table"
            );
        }

        let env = ToolEnv::new(Arc::new(store), Arc::new(config));
        let tools = data_tool_registry(&env);

        let prompts = PromptRegistry::new();
        register_prompts(&prompts)?;

        info!(
            ticker = %env.config.primary_ticker,
            tools = tools.len(),
            "War room ready"
        );
        Ok(Self {
            env,
            tools: Arc::new(tools),
            prompts: Arc::new(prompts),
            runtime: None,
        })
    }

    /// Attach the text-generation provider the agents use
    pub fn with_provider(mut self, provider: Arc<dyn LLMProvider>) -> Result<Self> {
        let config = &self.env.config;
        let runtime = AgentRuntime::builder()
            .provider(provider)
            .tool_registry(self.tools.clone())
            .default_model(config.model.clone())
            .default_max_iterations(config.question_turns)
            .build()?;
        self.runtime = Some(Arc::new(runtime));
        Ok(self)
    }

    /// Attach an Anthropic provider configured from `ANTHROPIC_API_KEY`
    ///
    /// The configured API base and request timeout override the defaults.
    pub fn with_env_provider(self) -> Result<Self> {
        let provider = self.provider_from_env()?;
        self.with_provider(Arc::new(provider))
    }

    fn provider_from_env(&self) -> Result<AnthropicProvider> {
        let config = &self.env.config;
        let mut anthropic = AnthropicConfig::from_env()?
            .with_timeout(config.request_timeout.as_secs().max(1));
        if let Some(base) = &config.api_base {
            anthropic = anthropic.with_api_base(base.clone());
        }
        debug!(api_base = %anthropic.api_base, "Using Anthropic provider");
        Ok(AnthropicProvider::with_config(anthropic)?)
    }

    pub fn config(&self) -> &WarRoomConfig {
        &self.env.config
    }

    pub fn store(&self) -> &DataStore {
        &self.env.store
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Schemas of every data tool, in registration order
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    /// Headline KPIs of the primary ticker
    pub fn kpis(&self) -> LatestKpis {
        LatestKpis::from_store(&self.env.store, &self.env.config.primary_ticker)
    }

    /// Anomaly flags for one ticker, or for every ticker when `None`
    ///
    /// Competitive gaps are included whenever the primary ticker is covered.
    pub fn anomalies(&self, ticker: Option<&str>) -> AnomalyReport {
        let config = &self.env.config;
        let detector = AnomalyDetector::new(&self.env.store, &config.thresholds);
        let (scope, covers_primary) = match ticker.map(str::trim).filter(|t| !t.is_empty()) {
            None => (Scope::All, true),
            Some(t) => (
                Scope::Ticker(t.to_ascii_uppercase()),
                t.eq_ignore_ascii_case(&config.primary_ticker),
            ),
        };

        let report = AnomalyReport {
            flags: detector.detect(&scope),
            gaps: if covers_primary {
                detector.competitive_gaps(
                    &config.primary_ticker,
                    &config.revenue_metric,
                    &config.benchmarks,
                )
            } else {
                Vec::new()
            },
        };
        debug!(
            flags = report.flags.len(),
            high = report.high_count(),
            gaps = report.gaps.len(),
            "Anomaly scan"
        );
        report
    }

    /// Run one data tool by name
    pub async fn run_tool(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| WarRoomError::InvalidInput(format!("Unknown tool: {name}")))?;
        Ok(tool.execute(input).await?)
    }

    /// Execution context seeded with the primary company
    pub fn context(&self) -> Context {
        seeded_context(&self.env)
    }

    fn deps(&self) -> Result<AgentDeps> {
        let runtime = self.runtime.clone().ok_or_else(|| {
            WarRoomError::Config(
                "no text-generation provider configured (set ANTHROPIC_API_KEY)".to_string(),
            )
        })?;
        Ok(AgentDeps::new(runtime, self.env.clone(), self.prompts.clone()))
    }

    pub fn question_agent(&self) -> Result<QuestionAgent> {
        Ok(QuestionAgent::new(self.deps()?))
    }

    pub fn defense_agent(&self) -> Result<DefenseAgent> {
        Ok(DefenseAgent::new(self.deps()?))
    }

    pub fn topic_generator(&self) -> Result<TopicQuestionGenerator> {
        Ok(TopicQuestionGenerator::new(self.deps()?))
    }
}
