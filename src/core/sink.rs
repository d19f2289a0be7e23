use anyhow::{Context, Result};
use std::io::Write;

use super::format::RenderedMessage;

/// Where rendered messages go. The dispatcher only knows target names.
pub trait OutputSink {
    fn deliver(&mut self, target: &str, message: &RenderedMessage) -> Result<()>;
}

/// Keeps every delivered message; handy for hosts that batch output.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub messages: Vec<(String, RenderedMessage)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expanded text of every message, in delivery order.
    pub fn texts(&self) -> Vec<String> {
        self.messages.iter().map(|(_, m)| m.expand()).collect()
    }
}

impl OutputSink for MemorySink {
    fn deliver(&mut self, target: &str, message: &RenderedMessage) -> Result<()> {
        self.messages.push((target.to_string(), message.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Placeholders expanded, one line per message.
    Plain,
    /// `tellraw <target> <rawtext-json>` lines.
    Tellraw,
}

pub struct WriterSink<W: Write> {
    out: W,
    mode: SinkMode,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W, mode: SinkMode) -> Self {
        Self { out, mode }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn deliver(&mut self, target: &str, message: &RenderedMessage) -> Result<()> {
        let line = match self.mode {
            SinkMode::Plain => message.expand(),
            SinkMode::Tellraw => tellraw_command(target, message),
        };
        writeln!(self.out, "{}", line).with_context(|| format!("failed to write message for {}", target))?;
        Ok(())
    }
}

/// Target names with spaces are quoted so the command stays one selector.
pub fn tellraw_command(target: &str, message: &RenderedMessage) -> String {
    let selector = if target.contains(' ') {
        format!("\"{}\"", target)
    } else {
        target.to_string()
    };
    format!("tellraw {} {}", selector, message.to_rawtext())
}
