//! Type coercion table shared by input tokens and callback outputs.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::command::ArgumentSpec;
use super::number::{self, number_value};
use super::status::DispatchError;

/// Outcome of running one coercion handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    Matched(Value),
    NoMatch,
}

/// What a handler sees: the raw value (absent when no token was supplied),
/// the argument's declaration, and the command being run.
pub struct CoercionInput<'a> {
    pub value: Option<&'a Value>,
    pub spec: &'a ArgumentSpec,
    pub command: &'a str,
}

pub type CoercionFn =
    Arc<dyn Fn(&CoercionInput) -> Result<Coercion, DispatchError> + Send + Sync>;

pub struct TypeRegistry {
    handlers: HashMap<String, CoercionFn>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        reg.register("stringenum", coerce_stringenum);
        reg.register("string", coerce_string);
        reg.register("json", coerce_json);
        reg.register("boolean", coerce_boolean);
        reg.register("float", coerce_float);
        reg.register("integer", coerce_integer);
        reg
    }
}

impl TypeRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Add or replace the handler for `type_name`.
    pub fn register<F>(&mut self, type_name: &str, handler: F)
    where
        F: Fn(&CoercionInput) -> Result<Coercion, DispatchError> + Send + Sync + 'static,
    {
        self.handlers.insert(type_name.to_string(), Arc::new(handler));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.handlers.contains_key(type_name)
    }

    pub fn list_types(&self) -> Vec<String> {
        let mut v: Vec<String> = self.handlers.keys().cloned().collect();
        v.sort();
        v
    }

    /// `None` when the type is not registered.
    pub fn coerce(&self, input: &CoercionInput) -> Option<Result<Coercion, DispatchError>> {
        self.handlers
            .get(&input.spec.type_name)
            .map(|handler| handler(input))
    }
}

fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn coerce_stringenum(input: &CoercionInput) -> Result<Coercion, DispatchError> {
    let Some(allowed) = input.spec.enum_values.as_ref() else {
        return Ok(Coercion::NoMatch);
    };

    if is_falsy(input.value) {
        return Ok(match (&input.spec.default, input.spec.optional) {
            (Some(default), true) if allowed.contains(default) => Coercion::Matched(default.clone()),
            _ => Coercion::NoMatch,
        });
    }

    match input.value {
        Some(value) if allowed.contains(value) => Ok(Coercion::Matched(value.clone())),
        Some(value) => Err(DispatchError::InvalidEnumValue {
            command: input.command.to_string(),
            value: number::display_value(value),
        }),
        None => Ok(Coercion::NoMatch),
    }
}

fn coerce_string(input: &CoercionInput) -> Result<Coercion, DispatchError> {
    Ok(match input.value {
        None => Coercion::NoMatch,
        Some(value) => Coercion::Matched(Value::String(number::display_value(value))),
    })
}

fn coerce_json(input: &CoercionInput) -> Result<Coercion, DispatchError> {
    match input.value {
        Some(value @ (Value::Object(_) | Value::Array(_) | Value::Null)) => {
            Ok(Coercion::Matched(value.clone()))
        }
        Some(Value::String(text)) => serde_json::from_str(text)
            .map(Coercion::Matched)
            .map_err(|source| DispatchError::InvalidJson {
                argument: input.spec.name.clone(),
                source,
            }),
        _ => Ok(Coercion::NoMatch),
    }
}

fn coerce_boolean(input: &CoercionInput) -> Result<Coercion, DispatchError> {
    Ok(match input.value {
        Some(Value::Bool(b)) => Coercion::Matched(Value::Bool(*b)),
        Some(Value::String(s)) if s == "true" => Coercion::Matched(Value::Bool(true)),
        Some(Value::String(s)) if s == "false" => Coercion::Matched(Value::Bool(false)),
        _ => Coercion::NoMatch,
    })
}

/// Shared gate for the numeric types: the raw value must be numeric as a
/// whole, then `parse` reads the stored value from its text.
fn coerce_numeric(input: &CoercionInput, parse: fn(&str) -> f64) -> Coercion {
    match input.value {
        Some(Value::Number(n)) => {
            let text = number::display_value(&Value::Number(n.clone()));
            Coercion::Matched(number_value(parse(&text)))
        }
        Some(Value::String(s)) if !number::number_from_text(s).is_nan() => {
            Coercion::Matched(number_value(parse(s)))
        }
        // null/booleans are numeric to `Number()` but have no numeric text
        Some(Value::Null | Value::Bool(_)) => Coercion::Matched(Value::Null),
        _ => Coercion::NoMatch,
    }
}

fn coerce_float(input: &CoercionInput) -> Result<Coercion, DispatchError> {
    Ok(coerce_numeric(input, number::parse_float_prefix))
}

fn coerce_integer(input: &CoercionInput) -> Result<Coercion, DispatchError> {
    Ok(coerce_numeric(input, number::parse_int_prefix))
}
