//! Prompt registry and shared rendering.
//!
//! Every prompt is a static [`PromptSpec`]: a name, the arguments it accepts
//! and a template compiled on first use. Handlers differ only in data.

pub mod cost;
pub mod deploy;
pub mod template;
pub mod upgrade_risk_report;
pub mod upgrades_best_practices_risk_report;

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HandlerError;
use crate::server::TextContent;
use crate::validation::{require_non_blank, Phrasing};

use template::{Template, TemplateError};

/// A template compiled lazily from static text.
pub type CompiledTemplate = LazyLock<Result<Template, TemplateError>>;

/// One named argument accepted by a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptArgumentSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// A registered prompt, serialized as a `prompts/list` entry.
#[derive(Debug, Serialize)]
pub struct PromptSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Description attached to every rendered result.
    #[serde(skip)]
    pub result_description: &'static str,
    pub arguments: &'static [PromptArgumentSpec],
    #[serde(skip)]
    pub template: &'static CompiledTemplate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: TextContent,
}

/// `prompts/get` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

impl GetPromptResult {
    /// The rendered text of the first message.
    pub fn text(&self) -> Option<&str> {
        self.messages.first().map(|m| m.content.text.as_str())
    }
}

impl PromptSpec {
    /// Validate `args` and render the template into the prompt text.
    ///
    /// Required arguments are checked in declaration order. Every declared
    /// argument is substituted; an omitted optional one renders as "".
    pub fn render_text(&self, args: &HashMap<String, String>) -> Result<String, HandlerError> {
        require_non_blank(
            self.arguments
                .iter()
                .filter(|a| a.required)
                .map(|a| (a.name, args.get(a.name).map(String::as_str).unwrap_or(""))),
            Phrasing::Quoted,
        )?;

        let values: HashMap<String, String> = self
            .arguments
            .iter()
            .map(|a| (a.name.to_string(), args.get(a.name).cloned().unwrap_or_default()))
            .collect();

        let compiled: &Result<Template, TemplateError> = self.template;
        let template = compiled.as_ref().map_err(|e| HandlerError::Template(e.clone()))?;
        Ok(template.render(&values)?)
    }

    /// Render and wrap the text as a single user message.
    pub fn get(&self, args: &HashMap<String, String>) -> Result<GetPromptResult, HandlerError> {
        let text = self.render_text(args)?;
        debug!(prompt = self.name, bytes = text.len(), "Rendered prompt");

        Ok(GetPromptResult {
            description: self.result_description.to_string(),
            messages: vec![PromptMessage {
                role: Role::User,
                content: TextContent::new(text),
            }],
        })
    }
}

/// All registered prompts.
pub struct PromptDefinitions;

impl PromptDefinitions {
    pub fn all() -> Vec<&'static PromptSpec> {
        vec![
            &cost::PROMPT,
            &deploy::PROMPT,
            &upgrade_risk_report::PROMPT,
            &upgrades_best_practices_risk_report::PROMPT,
        ]
    }

    pub fn find(name: &str) -> Option<&'static PromptSpec> {
        Self::all().into_iter().find(|p| p.name == name)
    }
}

/// Dispatch a `prompts/get` request by name.
pub fn get_prompt(
    name: &str,
    args: &HashMap<String, String>,
) -> Result<GetPromptResult, HandlerError> {
    PromptDefinitions::find(name)
        .ok_or_else(|| HandlerError::UnknownPrompt(name.to_string()))?
        .get(args)
}

#[cfg(test)]
pub(crate) fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
