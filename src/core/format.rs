use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::LazyLock;

use super::command::FormatTemplate;
use super::number::{self, display_value};
use super::status::ContextData;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%%?(\d+)").unwrap());

/// One deliverable message: a translation-style template plus its
/// positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub template: String,
    pub positional_args: Vec<String>,
}

impl RenderedMessage {
    pub fn new(template: impl Into<String>, positional_args: Vec<String>) -> Self {
        Self {
            template: template.into(),
            positional_args,
        }
    }

    /// A message with no substitutions.
    pub fn plain(template: impl Into<String>) -> Self {
        Self::new(template, Vec::new())
    }

    /// Substitute `%N` / `%%N` (1-based) for display as plain text.
    /// Placeholders without a matching argument are left as written.
    pub fn expand(&self) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| self.positional_args.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// `{"rawtext":[{"translate": template, "with": [...]}]}`
    pub fn to_rawtext(&self) -> Value {
        let mut translate = json!({ "translate": self.template });
        if !self.positional_args.is_empty() {
            translate["with"] = json!(self.positional_args);
        }
        json!({ "rawtext": [translate] })
    }
}

/// Absent, null, `""`, `[]`, `{}` and text that is not a number count as
/// empty. Numbers (0 included) and booleans never do.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty() || number::number_from_text(s).is_nan(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Number(_) | Value::Bool(_)) => false,
    }
}

pub fn is_visible(template: &FormatTemplate, data: &ContextData) -> bool {
    template
        .required_fields()
        .iter()
        .all(|field| !is_empty_value(data.get(field)))
}

/// Render every visible template, in declaration order, against the coerced
/// output values. Visibility is judged on the context data.
pub fn render(templates: &[FormatTemplate], outputs: &[Value], data: &ContextData) -> Vec<RenderedMessage> {
    let positional: Vec<String> = outputs.iter().map(display_value).collect();
    templates
        .iter()
        .filter(|template| is_visible(template, data))
        .map(|template| RenderedMessage::new(template.format.clone(), positional.clone()))
        .collect()
}
