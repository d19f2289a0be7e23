use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;

use chatcmd::core::{SinkMode, WriterSink};
use chatcmd::{handles, Caller, CommandList, CommandResult, Dispatcher, Options};

/// Chat-style command dispatcher
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON command list to load; may be repeated, later files win
    #[arg(long = "commands", value_name = "FILE")]
    commands: Vec<PathBuf>,

    /// Options file (defaults to <config dir>/chatcmd/options.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Name of the caller; output is only delivered to named callers
    #[arg(long = "as", value_name = "NAME", default_value = "console")]
    caller: String,

    /// Do not register the built-in commands
    #[arg(long)]
    no_builtin: bool,

    /// List registered command identifiers and exit
    #[arg(long)]
    list_commands: bool,

    /// Write tellraw lines instead of plain text
    #[arg(long)]
    rawtext: bool,

    /// Print each command result as JSON
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON results
    #[arg(long)]
    json_pretty: bool,

    /// A single command line, without prefix. Reads chat lines from stdin when absent.
    #[arg(value_name = "LINE")]
    line: Option<String>,
}

fn build_dispatcher(cli: &Cli) -> Result<Dispatcher> {
    let options = match &cli.config {
        Some(path) => Options::load(path)?,
        None => Options::load_default()?,
    };
    let mut dispatcher = Dispatcher::with_options(options);

    if !cli.no_builtin {
        handles::register_all(dispatcher.registry_mut());
    }
    for path in &cli.commands {
        let list = CommandList::load(path)?;
        log::debug!("loaded {} commands from {}", list.len(), path.display());
        dispatcher.merge_command_list(list);
    }
    Ok(dispatcher)
}

fn print_result(result: &CommandResult, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{}", text);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let dispatcher = build_dispatcher(&cli)?;

    if cli.list_commands {
        for id in dispatcher.registry().identifiers() {
            println!("{}", id);
        }
        return Ok(());
    }

    let caller = Caller::named(cli.caller.clone());
    let mode = if cli.rawtext { SinkMode::Tellraw } else { SinkMode::Plain };
    let mut sink = WriterSink::new(io::stdout().lock(), mode);
    let want_json = cli.json || cli.json_pretty;

    if let Some(line) = &cli.line {
        let show_errors = dispatcher.options().show_errors && !want_json;
        let result = dispatcher.execute_command_as(&caller, line, &mut sink, None, show_errors);
        drop(sink);
        if want_json {
            print_result(&result, cli.json_pretty)?;
        }
        if !result.success {
            if !show_errors && !want_json {
                eprintln!("{}", result.status_message);
            }
            std::process::exit(1);
        }
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match dispatcher.handle_message(&caller, &line, &mut sink) {
            Some(result) if want_json => print_result(&result, cli.json_pretty)?,
            Some(_) => {}
            None => log::debug!("not a command: {}", line),
        }
    }
    Ok(())
}
