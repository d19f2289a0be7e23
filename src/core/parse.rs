use regex::Regex;
use std::sync::LazyLock;

// One token: a run of double-quoted sections, single-quoted sections,
// backslash escapes, or plain non-space characters.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?s)\s*((?:"(?:\\.|[^"\\])*"|'[^']*'|\\.|\S)+)\s*"#).unwrap()
});

/// A tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub raw: String,
    pub command_name: String,
    pub command_arguments: Vec<String>,
}

/// Lazy, one-shot token stream over a raw line.
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self { rest: raw }
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let caps = TOKEN.captures(self.rest)?;
        let consumed = caps.get(0)?.end();
        let token = unquote(&caps[1]);
        self.rest = &self.rest[consumed..];
        Some(token)
    }
}

/// Split a line into its command name and positional arguments.
///
/// Empty input yields an empty command name; deciding that no such command
/// exists is left to the dispatcher.
pub fn tokenize(raw: &str) -> Invocation {
    let mut tokens = Tokens::new(raw);
    let command_name = tokens.next().unwrap_or_default();
    let command_arguments: Vec<String> = tokens.collect();
    log::debug!(
        "tokenized '{}' into command='{}' args={:?}",
        raw,
        command_name,
        command_arguments
    );
    Invocation {
        raw: raw.to_string(),
        command_name,
        command_arguments,
    }
}

/// Strip quoting and escapes from one matched token.
fn unquote(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' if has_closing_quote(chars.clone(), '"', true) => {
                while let Some(inner) = chars.next() {
                    match inner {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                        }
                        _ => out.push(inner),
                    }
                }
            }
            '\'' if has_closing_quote(chars.clone(), '\'', false) => {
                for inner in chars.by_ref() {
                    if inner == '\'' {
                        break;
                    }
                    out.push(inner);
                }
            }
            '\\' => match chars.next() {
                Some(escaped) => out.push(escaped),
                // trailing backslash with nothing to escape
                None => out.push('\\'),
            },
            // unterminated quotes are literal characters
            _ => out.push(c),
        }
    }

    out
}

fn has_closing_quote(mut rest: impl Iterator<Item = char>, quote: char, escapes: bool) -> bool {
    while let Some(c) = rest.next() {
        if c == quote {
            return true;
        }
        if escapes && c == '\\' {
            rest.next();
        }
    }
    false
}
