pub mod core;
pub mod handles;

// Re-export commonly used items
pub use self::core::{
    ArgumentSpec, Caller, CommandDefinition, CommandList, CommandRegistry, CommandResult,
    DispatchError, Dispatcher, FormatTemplate, Options, OutputSink, PreOutcome, RenderedMessage,
};
