use nom::error::Error as BriefError;
use tracing::{trace, warn};

use super::element::{any_end_tag, any_start_tag, raw_value};
use crate::error::{Error, Result};

/// A lexical unit of an OFX SGML body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token<'a> {
    /// `<NAME>` followed by another tag.
    Open(&'a str),
    /// `<NAME>value`; the value is trimmed and otherwise undecoded. `<NAME></NAME>` with nothing
    /// in between is an empty value.
    Value(&'a str, &'a str),
    /// `</NAME>`.
    Close(&'a str),
}

impl<'a> Token<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Token::Open(name) | Token::Value(name, _) | Token::Close(name) => name,
        }
    }
}

/// Single-pass scanner over an OFX SGML body.
///
/// Yields tokens until the input is exhausted or an error occurs; after an error it yields nothing
/// more.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer::starting_at(input, 0)
    }

    /// Scans `input` from byte `pos`, reporting error offsets relative to the whole of `input`.
    pub fn starting_at(input: &'a str, pos: usize) -> Self {
        Tokenizer {
            input,
            pos: pos.min(input.len()),
            done: false,
        }
    }

    /// The byte offset of the next unread character.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn fail(&mut self, message: String) -> Option<Result<Token<'a>>> {
        self.done = true;
        Some(Err(Error::Tokenize {
            offset: self.pos,
            message,
        }))
    }

    fn advance(&mut self, consumed: &str, remaining: &str) {
        self.pos += consumed.len() - remaining.len();
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let rest = &self.input[self.pos..];
            let trimmed = rest.trim_start();
            self.advance(rest, trimmed);
            if trimmed.is_empty() {
                self.done = true;
                return None;
            }

            if !trimmed.starts_with('<') {
                let end = trimmed.find('<').unwrap_or(trimmed.len());
                warn!(
                    offset = self.pos,
                    text = &trimmed[..end],
                    "skipping text outside of an element"
                );
                self.pos += end;
                continue;
            }

            if let Ok((after, name)) = any_end_tag::<BriefError<&str>>(trimmed) {
                self.advance(trimmed, after);
                trace!(tag = name, "close");
                return Some(Ok(Token::Close(name)));
            }

            if let Ok((after, name)) = any_start_tag::<BriefError<&str>>(trimmed) {
                if matches!(any_end_tag::<BriefError<&str>>(after), Ok((_, end)) if end == name) {
                    self.advance(trimmed, after);
                    trace!(tag = name, "empty value");
                    return Some(Ok(Token::Value(name, "")));
                }
                let (after_value, raw) = match raw_value::<BriefError<&str>>(after) {
                    Ok(parsed) => parsed,
                    Err(_) => (after, ""),
                };
                self.advance(trimmed, after_value);
                let text = raw.trim();
                return Some(Ok(if text.is_empty() {
                    trace!(tag = name, "open");
                    Token::Open(name)
                } else {
                    trace!(tag = name, text, "value");
                    Token::Value(name, text)
                }));
            }

            let tail = &trimmed[1..];
            return match tail.find(['<', '>']) {
                Some(i) if tail[i..].starts_with('>') => {
                    self.fail(format!("invalid tag `{}`", &trimmed[..i + 2]))
                }
                _ => self.fail(String::from("unterminated `<` with no matching `>`")),
            };
        }
    }
}
