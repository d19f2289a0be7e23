use serde_json::Value;

use crate::core::{ArgumentSpec, CommandDefinition, CommandRegistry, FormatTemplate, PreOutcome};

pub fn register(reg: &mut CommandRegistry) {
    reg.add(give());
}

/// `give <item> [count]`. Overloads are tried by name, so the counted form
/// is named to sort first.
fn give() -> CommandDefinition {
    let mut def = CommandDefinition::new("give");
    def.set_description("Gives the sender an item.")
        .set_input_arguments(
            "item_count",
            vec![ArgumentSpec::new("item", "string"), ArgumentSpec::new("count", "integer")],
        )
        .set_input_arguments("item_only", vec![ArgumentSpec::new("item", "string")]);

    for overload in ["item_count", "item_only"] {
        def.set_pre_callback(overload, |ctx, _, caller| {
            let count = ctx.get("count").and_then(Value::as_i64).unwrap_or(1);
            if count < 1 {
                anyhow::bail!("Cannot give {} items.", count);
            }
            let mut replaced = ctx.clone();
            replaced.set("count", count);
            replaced.set("target", caller.name.clone().unwrap_or_default());
            Ok(PreOutcome::Replace(replaced))
        })
        .set_output_arguments(
            overload,
            vec![
                ArgumentSpec::new("count", "integer"),
                ArgumentSpec::new("item", "string"),
                ArgumentSpec::new("target", "string"),
            ],
        )
        .set_output_format_strings(
            overload,
            vec![FormatTemplate::new("Gave %1 x %2 to %3.").shown_when_not_empty(["count"])],
        );
    }
    def
}
