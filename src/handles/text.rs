use serde_json::Value;

use crate::core::{ArgumentSpec, CommandDefinition, CommandRegistry, FormatTemplate, PreOutcome};

pub fn register(reg: &mut CommandRegistry) {
    reg.add(say());
    reg.add(inspect());
}

fn say() -> CommandDefinition {
    let mut def = CommandDefinition::new("say");
    def.set_description("Repeats a message back to the sender.")
        .set_aliases(["echo"])
        .set_input_arguments("default", vec![ArgumentSpec::new("message", "string")])
        .set_output_arguments("default", vec![ArgumentSpec::new("message", "string")])
        .set_output_format_strings("default", vec![FormatTemplate::new("%1")]);
    def
}

// `inspect <json> [compact|keys]`
fn inspect() -> CommandDefinition {
    let mut def = CommandDefinition::new("inspect");
    def.set_description("Shows a JSON payload, or lists its keys.")
        .set_input_arguments(
            "default",
            vec![
                ArgumentSpec::new("payload", "json"),
                ArgumentSpec::new("view", "stringenum")
                    .with_default("compact")
                    .with_enum_values(["compact", "keys"]),
            ],
        )
        .set_pre_callback("default", |ctx, _, _| {
            if ctx.get("view").and_then(Value::as_str) != Some("keys") {
                return Ok(PreOutcome::Keep);
            }
            let keys: Vec<Value> = match ctx.get("payload") {
                Some(Value::Object(map)) => map.keys().cloned().map(Value::String).collect(),
                _ => Vec::new(),
            };
            let mut replaced = ctx.clone();
            replaced.set("payload", keys);
            Ok(PreOutcome::Replace(replaced))
        })
        .set_output_arguments(
            "default",
            vec![ArgumentSpec::new("payload", "json"), ArgumentSpec::new("view", "string")],
        )
        .set_output_format_strings(
            "default",
            vec![FormatTemplate::new("Payload (%2): %1").shown_when_not_empty(["payload"])],
        );
    def
}
