use crate::core::{
    number::{as_number, number_value},
    ArgumentSpec, CommandDefinition, CommandObjectData, CommandRegistry,
    FormatTemplate, PreOutcome,
};

pub fn register(reg: &mut CommandRegistry) {
    reg.add(display_number());
    reg.add(summary_of_number());
}

/// Numeric context field; missing or NaN values read as zero.
fn number_or_zero(ctx: &CommandObjectData, name: &str) -> f64 {
    ctx.get(name)
        .and_then(as_number)
        .filter(|n| !n.is_nan())
        .unwrap_or(0.0)
}

fn display_number() -> CommandDefinition {
    let mut def = CommandDefinition::new("displaynumber");
    def.set_description("Displays the provided number.")
        .set_input_arguments("default", vec![ArgumentSpec::new("number", "float").optional()])
        .set_pre_callback("default", |ctx, registry, _| {
            let mut object = registry.create_command_object_data(&ctx.identifier);
            object.set("result", number_value(number_or_zero(ctx, "number")));
            Ok(PreOutcome::Replace(object))
        })
        .set_output_arguments("default", vec![ArgumentSpec::new("result", "float")])
        .set_output_format_strings("default", vec![FormatTemplate::new("Displayed number %1.")]);
    def
}

fn summary_of_number() -> CommandDefinition {
    let mut def = CommandDefinition::new("summaryofnumber");
    def.set_description("Gets the summary of 'a' and 'b'.")
        .set_aliases(["sum"])
        .set_input_arguments(
            "default",
            vec![ArgumentSpec::new("a", "float"), ArgumentSpec::new("b", "float")],
        )
        .set_pre_callback("default", |ctx, registry, _| {
            let sum = number_or_zero(ctx, "a") + number_or_zero(ctx, "b");
            let mut object = registry.create_command_object_data(&ctx.identifier);
            object.set("result", number_value(if sum.is_nan() { 0.0 } else { sum }));
            Ok(PreOutcome::Replace(object))
        })
        .set_output_arguments("default", vec![ArgumentSpec::new("result", "float")])
        .set_output_format_strings("default", vec![FormatTemplate::new("Result = %1.")]);
    def
}
