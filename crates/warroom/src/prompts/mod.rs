//! War room prompt templates
//!
//! Templates are organized into:
//! - `system`: system prompts for the tool-using research loops
//! - `user`: opening requests and the final one-shot generation prompts
//!
//! Every template is rendered with strict undefined handling, so callers must
//! pass every variable a template names (use an empty string for "unknown").

mod system;
mod user;

pub use system::*;
pub use user::*;

use agent_prompt::{PromptRegistry, Result};

/// Register all war room prompts with the given registry
pub fn register_prompts(registry: &PromptRegistry) -> Result<()> {
    // System prompts
    registry.register(question_system()?);
    registry.register(defense_system()?);

    // User messages
    registry.register(question_request()?);
    registry.register(question_final()?);
    registry.register(defense_request()?);
    registry.register(defense_final()?);
    registry.register(topic_questions()?);

    Ok(())
}

/// Registry pre-loaded with every war room prompt
pub fn prompt_registry() -> Result<PromptRegistry> {
    let registry = PromptRegistry::new();
    register_prompts(&registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_all_prompts() {
        let registry = prompt_registry().unwrap();
        assert_eq!(registry.len(), 7);

        for name in [
            QUESTION_SYSTEM,
            DEFENSE_SYSTEM,
            QUESTION_REQUEST,
            QUESTION_FINAL,
            DEFENSE_REQUEST,
            DEFENSE_FINAL,
            TOPIC_QUESTIONS,
        ] {
            assert!(registry.contains(name), "{name} not registered");
        }
    }

    #[test]
    fn test_question_system_prompt_names_company_and_quarter() {
        let registry = prompt_registry().unwrap();
        let prompt = registry
            .render(
                QUESTION_SYSTEM,
                &json!({ "company": "Snowflake", "ticker": "SNOW", "quarter": "Q2 FY2026" }),
            )
            .unwrap();
        assert!(prompt.contains("Snowflake's Investor Relations team"));
        assert!(prompt.contains("LATEST QUARTER (Q2 FY2026)"));
        assert!(prompt.contains("generate_questions"));

        let prompt = registry
            .render(
                QUESTION_SYSTEM,
                &json!({ "company": "Snowflake", "ticker": "SNOW", "quarter": "" }),
            )
            .unwrap();
        assert!(prompt.contains("LATEST QUARTER."));
    }

    #[test]
    fn test_question_final_prompt_carries_data_and_format() {
        let registry = prompt_registry().unwrap();
        let prompt = registry
            .render(
                QUESTION_FINAL,
                &json!({
                    "company": "Snowflake",
                    "quarter": "Q2 FY2026",
                    "count": 5,
                    "findings": "FCF collapsed",
                    "actual_data": "[check_anomalies]:\n{\"count\":4}",
                    "kpis": "- FCF: $40.0M",
                    "anomalies": "ANOMALIES:\n- [HIGH] SNOW Q2 FY2026: FCF fell",
                }),
            )
            .unwrap();
        assert!(prompt.starts_with("Generate 5 tough questions"));
        assert!(prompt.contains("AGENT SUMMARY:\nFCF collapsed"));
        assert!(prompt.contains("[check_anomalies]:"));
        assert!(prompt.contains("- FCF: $40.0M"));
        assert!(prompt.contains("[HIGH] SNOW"));
        for field in ["QUESTION:", "SOURCE_BUCKET:", "THREAT_LEVEL:", "DATA_POINT:"] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_missing_variable_fails() {
        let registry = prompt_registry().unwrap();
        assert!(registry.render(DEFENSE_FINAL, &json!({ "question": "Why?" })).is_err());
    }

    #[test]
    fn test_defense_prompts() {
        let registry = prompt_registry().unwrap();
        let system = registry
            .render(
                DEFENSE_SYSTEM,
                &json!({ "company": "Snowflake", "question": "Why did NRR fall?", "kpis": "- NRR: 108%" }),
            )
            .unwrap();
        assert!(system.contains("Why did NRR fall?"));
        assert!(system.contains("SNOWFLAKE'S CURRENT METRICS:\n- NRR: 108%"));

        let request = registry
            .render(DEFENSE_REQUEST, &json!({ "question": "Why did NRR fall?" }))
            .unwrap();
        assert_eq!(request, "Research and defend against this question: Why did NRR fall?");
    }
}
