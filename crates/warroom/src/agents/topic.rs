//! One-shot questions about a user-supplied topic

use agent_core::{Agent, Context};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::AgentDeps;
use crate::briefing::{DraftQuestion, parse_questions};
use crate::prompts::TOPIC_QUESTIONS;
use crate::{Result, WarRoomError};

/// Questions generated per topic
pub const TOPIC_QUESTION_COUNT: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct TopicQuestions {
    pub topic: String,
    pub text: String,
    pub questions: Vec<DraftQuestion>,
    pub tokens: usize,
}

/// Drafts questions on a topic from the latest KPIs, without tools
pub struct TopicQuestionGenerator {
    deps: AgentDeps,
}

impl TopicQuestionGenerator {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }

    pub async fn generate(&self, topic: &str) -> Result<TopicQuestions> {
        let mut context = self.deps.context();
        let text = self.run(topic, &mut context).await?;
        Ok(TopicQuestions {
            topic: topic.trim().to_string(),
            questions: parse_questions(&text),
            text,
            tokens: context.tokens_used(),
        })
    }

    async fn run(&self, topic: &str, context: &mut Context) -> Result<String> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(WarRoomError::InvalidInput("topic is empty".to_string()));
        }

        let config = self.deps.config();
        let prompt = self.deps.render(
            TOPIC_QUESTIONS,
            &json!({
                "company": self.deps.subject(context).company,
                "topic": topic,
                "count": TOPIC_QUESTION_COUNT,
                "kpis": self.deps.kpis().to_prompt_text(),
                "anomalies": self.deps.anomalies().to_prompt_text(),
            }),
        )?;

        info!(topic, "Generating topic questions");
        let writer = self
            .deps
            .runtime
            .simple_agent(self.deps.one_shot(config.answer_max_tokens), "topic-questions");
        Ok(writer.process(prompt, context).await?)
    }
}

#[async_trait]
impl Agent for TopicQuestionGenerator {
    async fn process(&self, input: String, context: &mut Context) -> agent_core::Result<String> {
        Ok(self.run(&input, context).await?)
    }

    fn name(&self) -> &str {
        "TopicQuestionGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{ScriptedProvider, deps, last_user_text, text};
    use crate::briefing::SourceBucket;
    use agent_llm::LLMError;

    #[tokio::test]
    async fn test_topic_prompt_uses_latest_kpis() {
        let provider = ScriptedProvider::new(vec![text(
            "QUESTION: How much of RPO is AI-driven? (Research)
THREAT_LEVEL: MEDIUM
SOURCE_BUCKET: 3
DATA_POINT: RPO $6900M",
        )]);
        let generator = TopicQuestionGenerator::new(deps(provider.clone()));

        let result = generator.generate("  AI monetization ").await.unwrap();
        assert_eq!(result.topic, "AI monetization");
        assert_eq!(result.questions.len(), 1);
        assert_eq!(result.questions[0].source, Some(SourceBucket::AnalystResearch));
        assert_eq!(result.tokens, 120);

        let request = provider.request(0);
        assert!(request.tools.as_ref().is_none_or(|t| t.is_empty()));
        assert_eq!(request.max_tokens, 1000);
        let prompt = last_user_text(&request);
        assert!(prompt.starts_with("Generate 2 specific, tough analyst questions about this topic: \"AI monetization\""));
        assert!(prompt.contains("- RPO: $6900M"));
    }

    #[tokio::test]
    async fn test_empty_topic_and_generation_failure() {
        let provider = ScriptedProvider::new(vec![Err(LLMError::RequestFailed("503".to_string()))]);
        let generator = TopicQuestionGenerator::new(deps(provider.clone()));

        let err = generator.generate(" ").await.unwrap_err();
        assert!(matches!(err, WarRoomError::InvalidInput(_)));
        assert_eq!(provider.request_count(), 0);

        let err = generator.generate("pricing").await.unwrap_err();
        assert!(err.is_generation());
    }
}
