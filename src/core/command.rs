//! Declarative command tables.
//!
//! The JSON shape is `{ "commands": { <identifier>: CommandDefinition } }`.
//! Callbacks are Rust closures attached after loading; they never appear in
//! the serialized form.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::registry::CommandRegistry;
use super::status::{Caller, CommandObjectData};

/// What a pre-callback wants done with the execution context.
#[derive(Debug, Clone, PartialEq)]
pub enum PreOutcome {
    /// Keep the context built from the input arguments.
    Keep,
    /// Use this object for the rest of the pipeline and for the result data.
    Replace(CommandObjectData),
}

pub type PreCallback =
    Arc<dyn Fn(&CommandObjectData, &CommandRegistry, &Caller) -> Result<PreOutcome> + Send + Sync>;

pub type PostCallback =
    Arc<dyn Fn(&CommandObjectData, &CommandRegistry, &Caller) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Callbacks {
    pub pre: Option<PreCallback>,
    pub post: Option<PostCallback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("pre", &self.pre.is_some())
            .field("post", &self.post.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            default: None,
            enum_values: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Also marks the argument optional; a default only exists on optional arguments.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(default.into());
        self
    }

    pub fn with_enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShouldShow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_empty: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatTemplate {
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_show: Option<ShouldShow>,
}

impl FormatTemplate {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            should_show: None,
        }
    }

    pub fn shown_when_not_empty<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.should_show = Some(ShouldShow {
            not_empty: Some(fields.into_iter().map(Into::into).collect()),
        });
        self
    }

    /// Fields that must be non-empty for this template to render.
    pub fn required_fields(&self) -> &[String] {
        self.should_show
            .as_ref()
            .and_then(|s| s.not_empty.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(skip)]
    pub callback: Callbacks,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
    #[serde(default)]
    pub format_strings: Vec<FormatTemplate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverloadDefinition {
    #[serde(default)]
    pub input: InputSpec,
    #[serde(default)]
    pub output: OutputSpec,
}

impl OverloadDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required_count(&self) -> usize {
        self.input.arguments.iter().filter(|a| !a.optional).count()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandDefinition {
    #[serde(skip)]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Keyed by overload name; iteration order is the resolution order.
    #[serde(default)]
    pub overloads: BTreeMap<String, OverloadDefinition>,
}

impl CommandDefinition {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Look a command up in a loaded table, stamping its identifier.
    pub fn from_command_list(list: &CommandList, identifier: &str) -> Option<Self> {
        list.commands.get(identifier).map(|def| {
            let mut def = def.clone();
            def.identifier = identifier.to_string();
            def
        })
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Ignored when `aliases` is empty.
    pub fn set_aliases<I, S>(&mut self, aliases: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        if !aliases.is_empty() {
            self.aliases = aliases;
        }
        self
    }

    pub fn set_overload(&mut self, name: impl Into<String>, overload: OverloadDefinition) -> &mut Self {
        self.overloads.insert(name.into(), overload);
        self
    }

    pub fn remove_overload(&mut self, name: &str) -> Option<OverloadDefinition> {
        self.overloads.remove(name)
    }

    pub fn has_overload(&self, name: &str) -> bool {
        self.overloads.contains_key(name)
    }

    pub fn overload(&self, name: &str) -> Option<&OverloadDefinition> {
        self.overloads.get(name)
    }

    pub fn overload_names(&self) -> Vec<&str> {
        self.overloads.keys().map(String::as_str).collect()
    }

    fn overload_entry(&mut self, name: &str) -> &mut OverloadDefinition {
        self.overloads.entry(name.to_string()).or_default()
    }

    /// Mutators below create the named overload when it does not exist yet.
    pub fn set_input_arguments(&mut self, overload: &str, arguments: Vec<ArgumentSpec>) -> &mut Self {
        self.overload_entry(overload).input.arguments = arguments;
        self
    }

    pub fn set_output_arguments(&mut self, overload: &str, arguments: Vec<ArgumentSpec>) -> &mut Self {
        self.overload_entry(overload).output.arguments = arguments;
        self
    }

    pub fn set_pre_callback<F>(&mut self, overload: &str, callback: F) -> &mut Self
    where
        F: Fn(&CommandObjectData, &CommandRegistry, &Caller) -> Result<PreOutcome> + Send + Sync + 'static,
    {
        self.overload_entry(overload).output.callback.pre = Some(Arc::new(callback));
        self
    }

    pub fn set_post_callback<F>(&mut self, overload: &str, callback: F) -> &mut Self
    where
        F: Fn(&CommandObjectData, &CommandRegistry, &Caller) -> Result<()> + Send + Sync + 'static,
    {
        self.overload_entry(overload).output.callback.post = Some(Arc::new(callback));
        self
    }

    pub fn set_output_format_strings(&mut self, overload: &str, formats: Vec<FormatTemplate>) -> &mut Self {
        self.overload_entry(overload).output.format_strings = formats;
        self
    }

    /// `{ <identifier>: { description?, aliases?, overloads } }`
    pub fn to_json(&self) -> Result<Value> {
        let body = serde_json::to_value(self)
            .with_context(|| format!("failed to serialize command '{}'", self.identifier))?;
        let mut wrapper = serde_json::Map::new();
        wrapper.insert(self.identifier.clone(), body);
        Ok(Value::Object(wrapper))
    }

    /// Shallow copy registered under an alias; aliases are not transitive.
    pub fn alias_copy(&self, alias: &str) -> Self {
        Self {
            identifier: alias.to_string(),
            description: self.description.clone(),
            aliases: Vec::new(),
            overloads: self.overloads.clone(),
        }
    }
}

/// A whole command table as loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandList {
    #[serde(default)]
    pub commands: BTreeMap<String, CommandDefinition>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut list: CommandList =
            serde_json::from_str(text).context("invalid command list JSON")?;
        list.stamp_identifiers();
        Ok(list)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read command list {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn insert(&mut self, definition: CommandDefinition) -> &mut Self {
        self.commands.insert(definition.identifier.clone(), definition);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn stamp_identifiers(&mut self) {
        for (identifier, def) in self.commands.iter_mut() {
            def.identifier = identifier.clone();
        }
    }
}
