//! Prompt template management
//!
//! Prompts are MiniJinja templates registered by name in a
//! [`PromptRegistry`]. Sources are syntax-checked on creation and rendered
//! with strict undefined-variable handling, so a typo in a variable name
//! fails loudly instead of producing an empty prompt section.
//!
//! ```
//! use agent_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry
//!     .register(JinjaTemplate::new("system", "You prepare {{ company }} for earnings.").unwrap());
//!
//! let prompt = registry.render("system", &json!({ "company": "Snowflake" })).unwrap();
//! assert_eq!(prompt, "You prepare Snowflake for earnings.");
//! ```

mod error;
mod jinja;
mod registry;
mod template;

pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
