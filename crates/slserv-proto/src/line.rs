//! Wire-line tokenization.
//!
//! The daemon speaks the server protocol line by line. This module turns
//! one raw line into a decoded [`Event`] (source prefix, verb, argument
//! vector) and formats outbound lines. Nothing here interprets the verb;
//! that is the event router's job.

use thiserror::Error;

/// A decoded protocol event.
///
/// `source` is the entity the uplink attributed the line to (a nick or a
/// server name), without the leading `:`. Verbs are kept exactly as
/// received; the router upcases before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub source: Option<String>,
    pub verb: String,
    pub args: Vec<String>,
}

/// Errors produced while tokenizing a wire line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("line has a source prefix but no verb")]
    MissingVerb,
}

impl Event {
    /// Build an event directly (used by tests and by the tick injector).
    pub fn new(source: Option<&str>, verb: &str, args: &[&str]) -> Self {
        Self {
            source: source.map(str::to_owned),
            verb: verb.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        }
    }

    /// Tokenize one raw line.
    ///
    /// Handles the `:source` prefix and the `:trailing` final argument.
    /// Interior whitespace runs are treated as single separators, which
    /// is what every serious ircd emits anyway.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut rest = line.trim_start();
        if rest.is_empty() {
            return Err(ParseError::Empty);
        }

        let source = if let Some(prefixed) = rest.strip_prefix(':') {
            let (src, tail) = match prefixed.split_once(' ') {
                Some((src, tail)) => (src, tail.trim_start()),
                None => return Err(ParseError::MissingVerb),
            };
            rest = tail;
            Some(src.to_owned())
        } else {
            None
        };

        if rest.is_empty() {
            return Err(ParseError::MissingVerb);
        }

        let mut args = Vec::new();
        let verb;
        match rest.split_once(' ') {
            Some((v, tail)) => {
                verb = v.to_owned();
                let mut tail = tail.trim_start();
                while !tail.is_empty() {
                    if let Some(trailing) = tail.strip_prefix(':') {
                        args.push(trailing.to_owned());
                        break;
                    }
                    match tail.split_once(' ') {
                        Some((arg, next)) => {
                            args.push(arg.to_owned());
                            tail = next.trim_start();
                        }
                        None => {
                            args.push(tail.to_owned());
                            break;
                        }
                    }
                }
            }
            None => verb = rest.to_owned(),
        }

        Ok(Self { source, verb, args })
    }

    /// Argument accessor that never panics.
    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).map(String::as_str)
    }
}

/// Format an outbound line with a source prefix.
pub fn with_source(source: &str, rest: &str) -> String {
    format!(":{} {}", source, rest)
}
