//! Plugin file parsing for directory-based registration.
//!
//! A plugin file is named after the OID it serves and contains one value
//! literal:
//!
//! ```text
//! # fan speeds, cached for 30 seconds
//! {
//!   1: [1200, 1180, 0],
//!   2: "chassis",
//!   cache: 30,
//! }
//! ```
//!
//! The grammar mirrors the shapes producers return: integers, double-quoted
//! strings, `[...]` sequences, `{key: value}` maps with unsigned integer
//! keys, and `nil`. A top-level map may carry a `cache: N` entry giving the
//! TTL in seconds; it is consumed here and never reaches the tree. `#`
//! starts a comment running to end of line.

use std::collections::BTreeMap;
use std::time::Duration;

use super::shape::{PluginOutput, PluginValue};
use crate::error::{Error, Result};

/// Parse one plugin file body into a producer output.
pub fn parse_plugin_file(text: &str) -> Result<PluginOutput> {
    let mut parser = Parser {
        bytes: text.as_bytes(),
        pos: 0,
    };
    parser.skip_trivia();
    let output = parser.value(true)?;
    parser.skip_trivia();
    if !parser.at_end() {
        return Err(parser.err("trailing input after value"));
    }
    Ok(output)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn skip_trivia(&mut self) {
        while let Some(byte) = self.peek() {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.pos += 1;
                }
                b'#' => {
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn err(&self, msg: &str) -> Error {
        Error::bad_shape(format!("{} at byte {}", msg, self.pos))
    }

    /// Parse one value. Only the top level may carry a `cache` entry.
    fn value(&mut self, top: bool) -> Result<PluginOutput> {
        self.skip_trivia();
        match self.peek() {
            Some(b'[') => self.sequence(),
            Some(b'{') => self.map(top),
            Some(b'"') => {
                let s = self.string()?;
                Ok(PluginOutput::new(PluginValue::Str(s)))
            }
            Some(b'-') | Some(b'0'..=b'9') => {
                let n = self.integer()?;
                Ok(PluginOutput::new(PluginValue::Int(n)))
            }
            Some(b'n') => {
                self.keyword("nil")?;
                Ok(PluginOutput::new(PluginValue::Nil))
            }
            Some(_) => Err(self.err("expected a value")),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn keyword(&mut self, word: &str) -> Result<()> {
        if self.bytes[self.pos..].starts_with(word.as_bytes()) {
            self.pos += word.len();
            Ok(())
        } else {
            Err(self.err("expected a value"))
        }
    }

    fn integer(&mut self) -> Result<i32> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).expect("digits are ascii");
        text.parse()
            .map_err(|_| self.err("integer out of range"))
    }

    fn unsigned(&mut self) -> Result<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).expect("digits are ascii");
        text.parse()
            .map_err(|_| self.err("integer out of range"))
    }

    fn string(&mut self) -> Result<String> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(b'"') => return Ok(out),
                Some(b'\\') => match self.bump() {
                    Some(b'"') => out.push('"'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'n') => out.push('\n'),
                    Some(b't') => out.push('\t'),
                    _ => return Err(self.err("unknown escape in string")),
                },
                Some(byte) => out.push(byte as char),
                None => return Err(self.err("unterminated string")),
            }
        }
    }

    fn sequence(&mut self) -> Result<PluginOutput> {
        self.bump(); // '['
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(b']') {
                self.pos += 1;
                return Ok(PluginOutput::new(PluginValue::Seq(items)));
            }
            items.push(self.value(false)?.value);
            self.skip_trivia();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b']') => {}
                _ => return Err(self.err("expected ',' or ']' in sequence")),
            }
        }
    }

    fn map(&mut self, top: bool) -> Result<PluginOutput> {
        self.bump(); // '{'
        let mut entries = BTreeMap::new();
        let mut cache_for = None;
        loop {
            self.skip_trivia();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                let mut output = PluginOutput::new(PluginValue::Map(entries));
                output.cache_for = cache_for;
                return Ok(output);
            }

            match self.peek() {
                Some(b'0'..=b'9') => {
                    let key = self.unsigned()?;
                    self.expect_colon()?;
                    entries.insert(key, self.value(false)?.value);
                }
                Some(b'c') if self.bytes[self.pos..].starts_with(b"cache") => {
                    if !top {
                        return Err(self.err("cache hint only allowed at top level"));
                    }
                    self.pos += "cache".len();
                    self.expect_colon()?;
                    self.skip_trivia();
                    let secs = self.unsigned()?;
                    cache_for = Some(Duration::from_secs(secs as u64));
                }
                // Non-integer keys abort the whole file
                _ => return Err(self.err("map keys must be non-negative integers")),
            }

            self.skip_trivia();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b'}') => {}
                _ => return Err(self.err("expected ',' or '}' in map")),
            }
        }
    }

    fn expect_colon(&mut self) -> Result<()> {
        self.skip_trivia();
        if self.bump() == Some(b':') {
            Ok(())
        } else {
            Err(self.err("expected ':' after map key"))
        }
    }
}
