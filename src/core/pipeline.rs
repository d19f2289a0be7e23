use serde_json::Value;

use super::command::{OverloadDefinition, PreOutcome};
use super::registry::CommandRegistry;
use super::status::{Caller, CommandObjectData, ContextData, DispatchError};
use super::types::{Coercion, CoercionInput, TypeRegistry};

/// Result of the pre-callback, output coercion and post-callback phases.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Context after the pre-callback; its data becomes the result data.
    pub context: CommandObjectData,
    /// Coerced output values, in declaration order, for format substitution.
    pub outputs: Vec<Value>,
}

/// Run one committed overload's callbacks.
///
/// Side effects of the pre-callback are not undone when a later step fails.
pub fn run_pipeline(
    command: &str,
    overload: &OverloadDefinition,
    input: ContextData,
    registry: &CommandRegistry,
    types: &TypeRegistry,
    caller: &Caller,
) -> Result<PipelineOutcome, DispatchError> {
    let callbacks = &overload.output.callback;
    let mut context = CommandObjectData::with_data(command, input);

    if let Some(pre) = &callbacks.pre {
        match pre(&context, registry, caller)? {
            PreOutcome::Replace(replacement) => {
                log::debug!("pre-callback of '{}' replaced the context", command);
                context = replacement;
            }
            PreOutcome::Keep => {}
        }
    }

    let outputs = coerce_outputs(command, overload, &context.data, types)?;

    if let Some(post) = &callbacks.post {
        post(&context, registry, caller)?;
    }

    Ok(PipelineOutcome { context, outputs })
}

/// Coerce each declared output field present in `data`; absent fields are skipped.
pub fn coerce_outputs(
    command: &str,
    overload: &OverloadDefinition,
    data: &ContextData,
    types: &TypeRegistry,
) -> Result<Vec<Value>, DispatchError> {
    let mut outputs = Vec::with_capacity(overload.output.arguments.len());

    for (index, spec) in overload.output.arguments.iter().enumerate() {
        let Some(value) = data.get(&spec.name) else {
            continue;
        };
        let input = CoercionInput {
            value: Some(value),
            spec,
            command,
        };
        let coerced = types
            .coerce(&input)
            .ok_or_else(|| DispatchError::UnknownArgumentType {
                type_name: spec.type_name.clone(),
                index,
                direction: "output",
            })??;

        match coerced {
            Coercion::Matched(value) => outputs.push(value),
            Coercion::NoMatch => {
                return Err(DispatchError::OutputCoercion {
                    command: command.to_string(),
                    argument: spec.name.clone(),
                });
            }
        }
    }

    Ok(outputs)
}
