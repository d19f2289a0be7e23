pub mod command;
pub mod dispatcher;
pub mod format;
pub mod number;
pub mod options;
pub mod overload;
pub mod parse;
pub mod pipeline;
pub mod registry;
pub mod sink;
pub mod status;
pub mod types;

pub use command::{
    ArgumentSpec, Callbacks, CommandDefinition, CommandList, FormatTemplate, OverloadDefinition,
    PreOutcome,
};
pub use dispatcher::Dispatcher;
pub use format::RenderedMessage;
pub use options::Options;
pub use parse::{tokenize, Invocation};
pub use registry::{CommandQuery, CommandRegistry};
pub use sink::{MemorySink, OutputSink, SinkMode, WriterSink};
pub use status::{Caller, CommandObjectData, CommandResult, ContextData, DispatchError};
pub use types::{Coercion, CoercionInput, TypeRegistry};
