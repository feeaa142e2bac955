//! Prompt templates for Grounded.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use super::GroundingMode;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Answer templates, one per grounding mode.
///
/// Both take `{{context}}` and `{{question}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub strict: String,
    pub permissive: String,
    /// Answer returned when retrieval finds nothing relevant.
    pub no_context: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            strict: r#"You are answering questions about a private document collection.

Use ONLY the context below to answer. The context is authoritative: if it
conflicts with anything you already know, the context is correct and your
prior knowledge must be ignored. Do not add facts that are not stated in the
context. If the context does not contain the answer, reply that you don't know.

Context:
{{context}}

Question: {{question}}

Answer:"#
                .to_string(),

            permissive: r#"Use the following context to answer the question at the end.
If the context is incomplete you may draw on general knowledge, but prefer
the context where the two disagree.

Context:
{{context}}

Question: {{question}}

Answer:"#
                .to_string(),

            no_context: "I couldn't find any relevant information in the document collection for this question."
                .to_string(),
        }
    }
}

impl RagPrompts {
    /// Template for the given grounding mode.
    pub fn template(&self, mode: GroundingMode) -> &str {
        match mode {
            GroundingMode::Strict => &self.strict,
            GroundingMode::Permissive => &self.permissive,
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in one pass over the template, so substituted
    /// values are copied verbatim even when they contain `{{name}}` text.
    /// Unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let placeholder = Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex");
        placeholder
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
