use super::command::CommandList;
use super::format::{self, RenderedMessage};
use super::options::Options;
use super::overload;
use super::parse::{self, Invocation};
use super::pipeline;
use super::registry::CommandRegistry;
use super::sink::OutputSink;
use super::status::{Caller, CommandResult, DispatchError};
use super::types::TypeRegistry;

/// Runs text lines against a command registry.
///
/// A dispatch runs to completion on the calling thread. The registry and
/// options are only read during a dispatch; mutate them between dispatches.
#[derive(Default)]
pub struct Dispatcher {
    registry: CommandRegistry,
    types: TypeRegistry,
    options: Options,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn set_command_list(&mut self, list: CommandList) {
        self.registry.set_command_list(list);
    }

    pub fn merge_command_list(&mut self, list: CommandList) {
        self.registry.merge(list);
    }

    /// Run one already-stripped command line as `caller`.
    ///
    /// `on_result` is invoked exactly once, for success and failure alike; the
    /// same result is returned. With `show_errors`, a failure is also
    /// delivered to the caller, prefixed with `pre_error_text`.
    pub fn execute_command_as(
        &self,
        caller: &Caller,
        raw: &str,
        sink: &mut dyn OutputSink,
        on_result: Option<&mut dyn FnMut(&CommandResult)>,
        show_errors: bool,
    ) -> CommandResult {
        let invocation = parse::tokenize(raw);
        let result = match self.run(&invocation, caller, sink) {
            Ok(result) => result,
            Err(e) => {
                log::debug!(
                    "command '{}' failed ({}): {}",
                    invocation.command_name,
                    e.kind(),
                    e
                );
                let failure = CommandResult::failure(&invocation.command_name, &e, caller.clone());
                if show_errors {
                    self.report_error(caller, &failure, sink);
                }
                failure
            }
        };

        if let Some(callback) = on_result {
            callback(&result);
        }
        result
    }

    /// Treat `message` as chat input: when it starts with the configured
    /// prefix, strip the prefix once and dispatch it. `None` means the
    /// message is not a command and should be passed through.
    pub fn handle_message(
        &self,
        caller: &Caller,
        message: &str,
        sink: &mut dyn OutputSink,
    ) -> Option<CommandResult> {
        let command = message.strip_prefix(self.options.prefix.as_str())?;
        Some(self.execute_command_as(caller, command, sink, None, self.options.show_errors))
    }

    fn run(
        &self,
        invocation: &Invocation,
        caller: &Caller,
        sink: &mut dyn OutputSink,
    ) -> Result<CommandResult, DispatchError> {
        let command = invocation.command_name.as_str();
        let definition = self.registry.resolve(command)?;
        let selected =
            overload::select_overload(command, &definition, &invocation.command_arguments, &self.types)?;

        let outcome = pipeline::run_pipeline(
            command,
            selected.overload,
            selected.data,
            &self.registry,
            &self.types,
            caller,
        )?;

        match caller.name.as_deref() {
            Some(target) => {
                let messages = format::render(
                    &selected.overload.output.format_strings,
                    &outcome.outputs,
                    &outcome.context.data,
                );
                for message in &messages {
                    sink.deliver(target, message)
                        .map_err(|e| DispatchError::Delivery {
                            target: target.to_string(),
                            message: format!("{:#}", e),
                        })?;
                }
            }
            None => log::debug!("caller of '{}' has no name; output not delivered", command),
        }

        Ok(CommandResult::success(command, outcome.context.data, caller.clone()))
    }

    fn report_error(&self, caller: &Caller, failure: &CommandResult, sink: &mut dyn OutputSink) {
        let Some(target) = caller.name.as_deref() else {
            return;
        };
        let message = RenderedMessage::plain(format!(
            "{}{}",
            self.options.pre_error_text, failure.status_message
        ));
        if let Err(e) = sink.deliver(target, &message) {
            log::warn!("failed to show error to '{}': {:#}", target, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{ArgumentSpec, CommandDefinition, FormatTemplate, PreOutcome};
    use crate::core::sink::MemorySink;
    use anyhow::bail;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn quiet() -> Dispatcher {
        Dispatcher::with_options(Options {
            show_errors: false,
            ..Options::default()
        })
    }

    fn echo_command() -> CommandDefinition {
        let mut def = CommandDefinition::new("echo");
        def.set_aliases(["say"])
            .set_input_arguments("default", vec![ArgumentSpec::new("text", "string")])
            .set_output_arguments("default", vec![ArgumentSpec::new("text", "string")])
            .set_output_format_strings("default", vec![FormatTemplate::new("%1")]);
        def
    }

    fn counter_command() -> CommandDefinition {
        let mut def = CommandDefinition::new("count");
        def.set_input_arguments("default", vec![ArgumentSpec::new("label", "string")])
            .set_output_arguments("default", vec![ArgumentSpec::new("label", "string")])
            .set_output_format_strings(
                "default",
                vec![FormatTemplate::new("Counted %1.").shown_when_not_empty(["label"])],
            );
        def
    }

    fn with_commands(defs: Vec<CommandDefinition>) -> Dispatcher {
        let mut dispatcher = quiet();
        for def in defs {
            dispatcher.registry_mut().add(def);
        }
        dispatcher
    }

    #[test]
    fn test_success_delivers_and_reports() {
        let dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();
        let mut seen = Vec::new();
        let mut on_result = |r: &CommandResult| seen.push(r.clone());

        let result = dispatcher.execute_command_as(
            &Caller::named("Steve"),
            r#"echo "hello there""#,
            &mut sink,
            Some(&mut on_result),
            false,
        );

        assert!(result.success);
        assert_eq!(result.status_message, "success");
        assert_eq!(result.data["text"], json!("hello there"));
        assert_eq!(sink.messages.len(), 1);
        assert_eq!(sink.messages[0].0, "Steve");
        assert_eq!(sink.texts(), vec!["hello there"]);
        assert_eq!(seen, vec![result]);
    }

    #[test]
    fn test_non_numeric_text_hides_guarded_template() {
        let dispatcher = with_commands(vec![counter_command()]);
        let mut sink = MemorySink::new();
        let caller = Caller::named("Steve");

        let result = dispatcher.execute_command_as(&caller, "count sheep", &mut sink, None, false);
        assert!(result.success);
        assert!(sink.messages.is_empty());

        dispatcher.execute_command_as(&caller, "count 12", &mut sink, None, false);
        dispatcher.execute_command_as(&caller, "count 0", &mut sink, None, false);
        assert_eq!(sink.texts(), vec!["Counted 12.", "Counted 0."]);
    }

    #[test]
    fn test_alias_dispatch_uses_alias_identifier() {
        let dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();
        let result =
            dispatcher.execute_command_as(&Caller::named("Steve"), "say hi", &mut sink, None, false);
        assert!(result.success);
        assert_eq!(result.identifier, "say");
        assert_eq!(sink.texts(), vec!["hi"]);
    }

    #[test]
    fn test_unknown_command_fails_once() {
        let dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();
        let mut calls = 0;
        let mut on_result = |_: &CommandResult| calls += 1;

        let result = dispatcher.execute_command_as(
            &Caller::named("Steve"),
            "nope 1 2",
            &mut sink,
            Some(&mut on_result),
            false,
        );
        assert_eq!(calls, 1);
        assert!(!result.success);
        assert_eq!(result.identifier, "nope");
        assert_eq!(result.status_message, "No such command 'nope' exists.");
        assert!(sink.messages.is_empty());
    }

    #[test]
    fn test_empty_line_is_not_found() {
        let dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();
        let result = dispatcher.execute_command_as(&Caller::named("Steve"), "   ", &mut sink, None, false);
        assert!(!result.success);
        assert_eq!(result.identifier, "");
    }

    #[test]
    fn test_show_errors_delivers_prefixed_status() {
        let dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();
        let result = dispatcher.execute_command_as(&Caller::named("Steve"), "echo", &mut sink, None, true);

        assert!(!result.success);
        assert_eq!(sink.messages.len(), 1);
        let (target, message) = &sink.messages[0];
        assert_eq!(target, "Steve");
        assert_eq!(
            message.template,
            "§cRequired arguments for the 'echo' command are 1, but only 0 present."
        );
        assert!(message.positional_args.is_empty());
    }

    #[test]
    fn test_anonymous_caller_gets_no_output() {
        let dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();
        let result = dispatcher.execute_command_as(&Caller::anonymous(), "echo hi", &mut sink, None, true);
        assert!(result.success);
        assert!(sink.messages.is_empty());

        let result = dispatcher.execute_command_as(&Caller::anonymous(), "missing", &mut sink, None, true);
        assert!(!result.success);
        assert!(sink.messages.is_empty());
    }

    #[test]
    fn test_callback_failure_commits_to_overload() {
        let tried = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&tried);

        let mut def = CommandDefinition::new("risky");
        def.set_input_arguments("a", vec![ArgumentSpec::new("x", "string")])
            .set_pre_callback("a", move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                bail!("callback exploded")
            })
            .set_input_arguments("b", vec![ArgumentSpec::new("x", "string")])
            .set_pre_callback("b", |_, _, _| Ok(PreOutcome::Keep));

        let dispatcher = with_commands(vec![def]);
        let mut sink = MemorySink::new();
        let result = dispatcher.execute_command_as(&Caller::named("Steve"), "risky go", &mut sink, None, false);

        assert!(!result.success);
        assert_eq!(result.status_message, "callback exploded");
        assert_eq!(tried.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_overloads_surfaces_at_dispatch() {
        let dispatcher = with_commands(vec![CommandDefinition::new("bare")]);
        let mut sink = MemorySink::new();
        let result = dispatcher.execute_command_as(&Caller::named("Steve"), "bare", &mut sink, None, false);
        assert!(!result.success);
        assert!(result.status_message.contains("overloads do not exist"));
    }

    #[test]
    fn test_enum_default_through_dispatch() {
        let mut def = CommandDefinition::new("mode");
        def.set_input_arguments(
            "default",
            vec![ArgumentSpec::new("m", "stringenum")
                .with_default("x")
                .with_enum_values(["x", "y"])],
        );
        let dispatcher = with_commands(vec![def]);
        let mut sink = MemorySink::new();

        let result = dispatcher.execute_command_as(&Caller::named("Steve"), "mode", &mut sink, None, false);
        assert_eq!(result.data["m"], json!("x"));

        let result = dispatcher.execute_command_as(&Caller::named("Steve"), "mode z", &mut sink, None, false);
        assert_eq!(
            result.status_message,
            "Invalid enum value 'z' for the following command 'mode'."
        );
    }

    #[test]
    fn test_handle_message_requires_prefix() {
        let dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();

        assert!(dispatcher
            .handle_message(&Caller::named("Steve"), "echo hi", &mut sink)
            .is_none());

        let result = dispatcher
            .handle_message(&Caller::named("Steve"), "$echo hi", &mut sink)
            .unwrap();
        assert!(result.success);
        assert_eq!(sink.texts(), vec!["hi"]);
    }

    #[test]
    fn test_handle_message_uses_show_errors_option() {
        let mut dispatcher = with_commands(vec![echo_command()]);
        dispatcher.set_options(Options {
            prefix: "!".to_string(),
            pre_error_text: "ERR: ".to_string(),
            show_errors: true,
        });
        let mut sink = MemorySink::new();

        let result = dispatcher
            .handle_message(&Caller::named("Steve"), "!unknown", &mut sink)
            .unwrap();
        assert!(!result.success);
        assert_eq!(sink.texts(), vec!["ERR: No such command 'unknown' exists."]);
    }

    #[test]
    fn test_registry_changes_visible_between_dispatches() {
        let mut dispatcher = with_commands(vec![echo_command()]);
        let mut sink = MemorySink::new();
        let caller = Caller::named("Steve");

        assert!(dispatcher.execute_command_as(&caller, "say a", &mut sink, None, false).success);
        dispatcher.registry_mut().get_mut("echo").unwrap().aliases.clear();
        assert!(!dispatcher.execute_command_as(&caller, "say a", &mut sink, None, false).success);
    }

    struct FailingSink;

    impl OutputSink for FailingSink {
        fn deliver(&mut self, _target: &str, _message: &RenderedMessage) -> anyhow::Result<()> {
            bail!("chat closed")
        }
    }

    #[test]
    fn test_delivery_failure_is_reported() {
        let dispatcher = with_commands(vec![echo_command()]);
        let result =
            dispatcher.execute_command_as(&Caller::named("Steve"), "echo hi", &mut FailingSink, None, true);
        assert!(!result.success);
        assert_eq!(result.status_message, "Failed to deliver output to 'Steve': chat closed");
    }

    #[test]
    fn test_json_argument_round_trips_into_data() {
        let mut def = CommandDefinition::new("store");
        def.set_input_arguments("default", vec![ArgumentSpec::new("payload", "json")]);
        let dispatcher = with_commands(vec![def]);
        let mut sink = MemorySink::new();

        let result = dispatcher.execute_command_as(
            &Caller::named("Steve"),
            r#"store '{"k": [1, 2]}'"#,
            &mut sink,
            None,
            false,
        );
        assert!(result.success);
        assert_eq!(result.data["payload"]["k"], Value::from(vec![1, 2]));
    }
}
