//! Agent drafting executive talking points for a tough question

use agent_core::{Agent, Context};
use agent_runtime::{ExecutorConfig, ExecutorEventHandler, Outcome};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{AgentDeps, record_execution};
use crate::prompts::{DEFENSE_FINAL, DEFENSE_REQUEST, DEFENSE_SYSTEM};
use crate::tools::{DEFENSE_TOOLS, generate_defense_tool};
use crate::{Result, WarRoomError};

/// Output of a Defense Agent run
#[derive(Debug, Clone, Serialize)]
pub struct DefenseBrief {
    pub question: String,
    /// Talking points and suggested response
    pub text: String,
    pub tool_calls: Vec<String>,
    pub tokens: usize,
}

/// Researches supporting evidence and writes the executive response
///
/// Only the tools in [`DEFENSE_TOOLS`] are offered, plus
/// `generate_defense`.
pub struct DefenseAgent {
    deps: AgentDeps,
}

impl DefenseAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }

    pub async fn defend(
        &self,
        question: &str,
        handler: Option<Arc<dyn ExecutorEventHandler>>,
    ) -> Result<DefenseBrief> {
        let mut context = self.deps.context();
        let text = self.run(question, &mut context, handler).await?;
        Ok(DefenseBrief {
            question: question.trim().to_string(),
            text,
            tool_calls: context.tool_calls(),
            tokens: context.tokens_used(),
        })
    }

    #[instrument(skip_all, fields(ticker = %self.deps.config().primary_ticker))]
    async fn run(
        &self,
        question: &str,
        context: &mut Context,
        handler: Option<Arc<dyn ExecutorEventHandler>>,
    ) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(WarRoomError::InvalidInput(
                "question to defend against is empty".to_string(),
            ));
        }

        let config = self.deps.config();
        let kpis = self.deps.kpis().to_prompt_text();
        let company = self.deps.subject(context).company;

        let system_prompt = self.deps.render(
            DEFENSE_SYSTEM,
            &json!({
                "company": company,
                "question": question,
                "kpis": kpis,
            }),
        )?;
        let request = self.deps.render(DEFENSE_REQUEST, &json!({ "question": question }))?;

        let executor = self.deps.runtime.executor(
            ExecutorConfig {
                max_iterations: config.defense_turns,
                model: config.model.clone(),
                system_prompt: Some(system_prompt),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
                finish_tool: Some(generate_defense_tool()),
            },
            &DEFENSE_TOOLS,
        );

        let execution = match handler {
            Some(handler) => executor.run_with_handler(request, handler).await?,
            None => executor.run(request).await?,
        };
        record_execution(context, &execution);
        info!(
            tools = execution.tool_calls.len(),
            iterations = execution.iterations,
            "Defense research finished"
        );

        match &execution.outcome {
            Outcome::Answered { text } => Ok(text.clone()),
            Outcome::Finished { input } => {
                let talking_points = input
                    .get("talking_points")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let prompt = self.deps.render(
                    DEFENSE_FINAL,
                    &json!({
                        "company": company,
                        "question": question,
                        "talking_points": talking_points,
                        "actual_data": execution.collected_output(),
                        "kpis": kpis,
                        "anomalies": self.deps.anomalies().to_prompt_text(),
                    }),
                )?;

                let writer = self
                    .deps
                    .runtime
                    .simple_agent(self.deps.one_shot(config.answer_max_tokens), "defense-writer");
                Ok(writer.process(prompt, context).await?)
            }
        }
    }
}

#[async_trait]
impl Agent for DefenseAgent {
    /// `input` is the analyst question
    async fn process(&self, input: String, context: &mut Context) -> agent_core::Result<String> {
        Ok(self.run(&input, context, None).await?)
    }

    fn name(&self) -> &str {
        "DefenseAgent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{ScriptedProvider, deps, last_user_text, text, tool_calls};
    use crate::tools::GENERATE_DEFENSE;
    use agent_llm::{CompletionRequest, CompletionResponse, LLMError, LLMProvider};
    use mockall::mock;

    mock! {
        pub Provider {}

        #[async_trait]
        impl LLMProvider for Provider {
            async fn complete(
                &self,
                request: CompletionRequest,
            ) -> agent_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    const QUESTION: &str = "Why did NRR fall to 108%?";

    #[tokio::test]
    async fn test_defense_offers_only_defense_tools() {
        let provider = ScriptedProvider::new(vec![
            tool_calls(&[("t1", "get_metric_trend", json!({"metric": "PRODUCT_REVENUE_M"}))]),
            tool_calls(&[(
                "t2",
                GENERATE_DEFENSE,
                json!({"talking_points": "Revenue up to $1090M"}),
            )]),
            text("**Key Talking Points:**\n- $1090M - product revenue"),
        ]);
        let agent = DefenseAgent::new(deps(provider.clone()));

        let brief = agent.defend(QUESTION, None).await.unwrap();
        assert_eq!(brief.tool_calls, vec!["get_metric_trend"]);
        assert!(brief.text.starts_with("**Key Talking Points:**"));
        assert_eq!(brief.tokens, 360);

        let research = provider.request(0);
        let offered: Vec<String> = research
            .tools
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.name)
            .collect();
        let mut expected: Vec<String> = DEFENSE_TOOLS.iter().map(|s| (*s).to_string()).collect();
        expected.push(GENERATE_DEFENSE.to_string());
        assert_eq!(offered, expected);

        let system = research.system.unwrap();
        assert!(system.contains(QUESTION));
        assert!(system.contains("- NRR: 108%"));
        assert!(!system.contains("Q2 FY2026"));

        let final_request = provider.request(2);
        assert_eq!(final_request.max_tokens, 1000);
        let prompt = last_user_text(&final_request);
        assert!(prompt.contains("ANALYST QUESTION: Why did NRR fall to 108%?"));
        assert!(prompt.contains("TALKING POINTS:\nRevenue up to $1090M"));
        assert!(prompt.contains("[get_metric_trend]:"));
        assert!(prompt.contains("CURRENT FLAGS:\nANOMALIES:"));
    }

    #[tokio::test]
    async fn test_turn_limit_is_four() {
        let replies = (0..4)
            .map(|_| tool_calls(&[("t", "check_anomalies", json!({}))]))
            .collect();
        let agent = DefenseAgent::new(deps(ScriptedProvider::new(replies)));

        let err = agent.defend(QUESTION, None).await.unwrap_err();
        assert!(matches!(err, WarRoomError::TurnLimit(4)));
    }

    #[tokio::test]
    async fn test_empty_question_never_reaches_the_model() {
        let mut provider = MockProvider::new();
        provider.expect_complete().never();
        let agent = DefenseAgent::new(deps(Arc::new(provider)));

        let err = agent.defend("   ", None).await.unwrap_err();
        assert!(matches!(err, WarRoomError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_generation_error() {
        let mut provider = MockProvider::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|_| Err(LLMError::RequestFailed("connection refused".to_string())));
        let agent = DefenseAgent::new(deps(Arc::new(provider)));

        let mut context = Context::new();
        let err = agent.process(QUESTION.to_string(), &mut context).await.unwrap_err();
        assert!(err.is_generation());
        assert!(context.tool_calls().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_company_names_the_response() {
        let provider = ScriptedProvider::new(vec![text("Hold the line.")]);
        let agent = DefenseAgent::new(deps(provider.clone()));
        let mut context = Context::new().with_company("Acme Data");

        let out = agent.process(QUESTION.to_string(), &mut context).await.unwrap();
        assert_eq!(out, "Hold the line.");
        let system = provider.request(0).system.unwrap();
        assert!(system.contains("ACME DATA'S CURRENT METRICS:"));
        assert_eq!(context.company(), Some("Acme Data"));
    }
}
