use crate::diagnostic::{Diagnostic, Parsed};
use std::borrow::Cow;

/// Separates the command from its wait time in a launch entry.
pub const WAIT_MARKER: &str = ",wait=";

/// One configured program to start, and how long to wait after starting it.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchEntry {
    pub executable: String,
    pub arguments: Vec<String>,
    pub wait_seconds: f64,
}

/// Parse a `COMMAND[,wait=SECONDS]` entry.
///
/// Never fails: a bad wait value becomes 0 and a command that cannot be
/// tokenized is launched as-is, each with a diagnostic.
pub fn parse_entry(raw: &str) -> Parsed<LaunchEntry> {
    let mut diagnostics = Vec::new();
    let (command, wait_text) = split_wait(raw);

    let wait_seconds = match wait_text {
        Some(text) => parse_wait(text).collect_into(&mut diagnostics),
        None => 0.0,
    };
    let (executable, arguments) = tokenize(command).collect_into(&mut diagnostics);

    Parsed {
        value: LaunchEntry { executable, arguments, wait_seconds },
        diagnostics,
    }
}

/// Split at the last `,wait=` so the suffix always wins.
pub fn split_wait(raw: &str) -> (&str, Option<&str>) {
    match raw.rfind(WAIT_MARKER) {
        Some(pos) => (&raw[..pos], Some(&raw[pos + WAIT_MARKER.len()..])),
        None => (raw, None),
    }
}

pub fn parse_wait(text: &str) -> Parsed<f64> {
    match text.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Parsed::clean(seconds),
        _ => Parsed::with(0.0, Diagnostic::InvalidWait { value: text.to_string() }),
    }
}

/// Shell-style split into executable and arguments.
pub fn tokenize(command: &str) -> Parsed<(String, Vec<String>)> {
    match shlex::split(&escape_comment_marks(command)) {
        Some(mut tokens) => {
            if tokens.is_empty() {
                return Parsed::clean((String::new(), Vec::new()));
            }
            let executable = tokens.remove(0);
            Parsed::clean((executable, tokens))
        }
        None => Parsed::with(
            (command.trim().to_string(), Vec::new()),
            Diagnostic::Tokenize { command: command.to_string() },
        ),
    }
}

/// `shlex` drops everything from a word-initial `#` onwards. Escape those
/// so `--color #fff` keeps its argument.
fn escape_comment_marks(command: &str) -> Cow<'_, str> {
    if !command.contains('#') {
        return Cow::Borrowed(command);
    }

    let mut out = String::with_capacity(command.len() + 4);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut word_start = true;
    for c in command.chars() {
        if escaped {
            escaped = false;
        } else {
            match quote {
                Some(q) if c == q => quote = None,
                Some('"') if c == '\\' => escaped = true,
                Some(_) => {}
                None => match c {
                    '\'' | '"' => quote = Some(c),
                    '\\' => escaped = true,
                    '#' if word_start => out.push('\\'),
                    _ => {}
                },
            }
        }
        word_start = quote.is_none() && !escaped && c.is_whitespace();
        out.push(c);
    }
    Cow::Owned(out)
}
