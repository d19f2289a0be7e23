use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Values produced by coercion, keyed by argument name.
pub type ContextData = Map<String, Value>;

pub const COMMAND_DATA_TYPE: &str = "command_data";
pub const COMMAND_RESULT_TYPE: &str = "command_result";
pub const SUCCESS_MESSAGE: &str = "success";

/// Whoever issued the command. Only the name is interpreted, as the
/// delivery target for rendered output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Caller {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// The execution context handed to callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandObjectData {
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "statusMessage")]
    pub status_message: Option<String>,
    pub success: bool,
    pub data: ContextData,
}

impl CommandObjectData {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: COMMAND_DATA_TYPE.to_string(),
            status_message: None,
            success: true,
            data: ContextData::new(),
        }
    }

    pub fn with_data(identifier: impl Into<String>, data: ContextData) -> Self {
        let mut object = Self::new(identifier);
        object.data = data;
        object
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(name.into(), value.into());
    }
}

/// Uniform outcome of one dispatch, reported exactly once per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub success: bool,
    #[serde(rename = "statusMessage")]
    pub status_message: String,
    pub data: ContextData,
    pub entity: Caller,
}

impl CommandResult {
    pub fn success(identifier: impl Into<String>, data: ContextData, entity: Caller) -> Self {
        Self {
            identifier: identifier.into(),
            kind: COMMAND_RESULT_TYPE.to_string(),
            success: true,
            status_message: SUCCESS_MESSAGE.to_string(),
            data,
            entity,
        }
    }

    pub fn failure(identifier: impl Into<String>, error: &DispatchError, entity: Caller) -> Self {
        Self {
            identifier: identifier.into(),
            kind: COMMAND_RESULT_TYPE.to_string(),
            success: false,
            status_message: error.to_string(),
            data: ContextData::new(),
            entity,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Everything that can end a dispatch in failure.
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("No such command '{name}' exists.")]
    CommandNotFound { name: String },

    #[error("Command overloads do not exist for '{command}'. Make sure you have already defined it.")]
    NoOverloads { command: String },

    #[error("Required arguments for the '{command}' command are {required}, but only {present} present.")]
    ArgumentCount {
        command: String,
        required: usize,
        present: usize,
    },

    #[error("Undefined argument type '{type_name}' at index {index} of {direction} arguments.")]
    UnknownArgumentType {
        type_name: String,
        index: usize,
        direction: &'static str,
    },

    #[error("Failed to parse argument '{argument}' of the '{command}' command.")]
    ArgumentCoercion { command: String, argument: String },

    #[error("Invalid enum value '{value}' for the following command '{command}'.")]
    InvalidEnumValue { command: String, value: String },

    #[error("Invalid JSON for argument '{argument}': {source}")]
    InvalidJson {
        argument: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse command '{command}'. Invalid output argument '{argument}'.")]
    OutputCoercion { command: String, argument: String },

    #[error(transparent)]
    Callback(#[from] anyhow::Error),

    #[error("Failed to deliver output to '{target}': {message}")]
    Delivery { target: String, message: String },
}

impl DispatchError {
    /// Stable machine-readable kind, used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommandNotFound { .. } => "command_not_found",
            Self::NoOverloads { .. } => "no_overloads",
            Self::ArgumentCount { .. } => "argument_count",
            Self::UnknownArgumentType { .. } => "unknown_argument_type",
            Self::ArgumentCoercion { .. } => "argument_coercion",
            Self::InvalidEnumValue { .. } => "invalid_enum_value",
            Self::InvalidJson { .. } => "invalid_json",
            Self::OutputCoercion { .. } => "output_coercion",
            Self::Callback(_) => "callback",
            Self::Delivery { .. } => "delivery",
        }
    }

    /// Whether the resolver may fall through to the next overload.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ArgumentCount { .. }
                | Self::ArgumentCoercion { .. }
                | Self::InvalidEnumValue { .. }
                | Self::InvalidJson { .. }
        )
    }
}
