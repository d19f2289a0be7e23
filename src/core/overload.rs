//! Overload selection.
//!
//! Overloads are tried in lexicographic name order. An attempt that is
//! rejected (too few arguments, a value that does not coerce) falls through
//! to the next name; when every attempt is rejected the last rejection is
//! reported. Unknown argument types are definition defects and stop the
//! search immediately.

use serde_json::Value;

use super::command::{CommandDefinition, OverloadDefinition};
use super::status::{ContextData, DispatchError};
use super::types::{Coercion, CoercionInput, TypeRegistry};

/// The overload that accepted the input, with its coerced arguments.
#[derive(Debug)]
pub struct SelectedOverload<'a> {
    pub name: &'a str,
    pub overload: &'a OverloadDefinition,
    pub data: ContextData,
}

/// Unknown argument types end the search instead of trying the next
/// overload, since a bad type name is a definition defect rather than an
/// input mismatch.
pub fn select_overload<'a>(
    command: &str,
    definition: &'a CommandDefinition,
    arguments: &[String],
    types: &TypeRegistry,
) -> Result<SelectedOverload<'a>, DispatchError> {
    if definition.overloads.is_empty() {
        return Err(DispatchError::NoOverloads {
            command: command.to_string(),
        });
    }

    let mut last_rejection = None;
    for (name, overload) in &definition.overloads {
        match coerce_inputs(command, overload, arguments, types) {
            Ok(data) => {
                log::debug!("command '{}' matched overload '{}'", command, name);
                return Ok(SelectedOverload {
                    name: name.as_str(),
                    overload,
                    data,
                });
            }
            Err(e) if e.is_rejection() => {
                log::debug!("command '{}' overload '{}' rejected: {}", command, name, e);
                last_rejection = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_rejection.unwrap_or_else(|| DispatchError::NoOverloads {
        command: command.to_string(),
    }))
}

/// Coerce positional tokens against one overload's input declaration.
pub fn coerce_inputs(
    command: &str,
    overload: &OverloadDefinition,
    arguments: &[String],
    types: &TypeRegistry,
) -> Result<ContextData, DispatchError> {
    let required = overload.required_count();
    if arguments.len() < required {
        return Err(DispatchError::ArgumentCount {
            command: command.to_string(),
            required,
            present: arguments.len(),
        });
    }

    let mut data = ContextData::new();
    for (index, spec) in overload.input.arguments.iter().enumerate() {
        let raw = arguments.get(index).map(|token| Value::String(token.clone()));
        let input = CoercionInput {
            value: raw.as_ref(),
            spec,
            command,
        };
        let coerced = types
            .coerce(&input)
            .ok_or_else(|| DispatchError::UnknownArgumentType {
                type_name: spec.type_name.clone(),
                index,
                direction: "input",
            })??;

        match coerced {
            Coercion::Matched(value) => {
                data.insert(spec.name.clone(), value);
            }
            Coercion::NoMatch if spec.optional => {}
            Coercion::NoMatch => {
                return Err(DispatchError::ArgumentCoercion {
                    command: command.to_string(),
                    argument: spec.name.clone(),
                });
            }
        }
    }

    Ok(data)
}
