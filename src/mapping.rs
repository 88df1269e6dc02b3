//! The rename mapping artifact.
//!
//! Discovery writes the mapping as a Python file binding a list of
//! `(old, new)` tuples to `imports_to_move`, and the rewrite step reads it
//! back. Users hand-edit this file between the two steps, so the reader
//! accepts any reasonable Python literal spelling of the same list: either
//! quote style, triple quotes, `r`/`u` prefixes, lists instead of tuples,
//! trailing commas and comments.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::syntax::ParseError;
use crate::syntax::SyntaxKind::{self, *};
use crate::syntax::lexer::{Token, tokenize};

/// Name the list is bound to inside the artifact.
pub const BINDING: &str = "imports_to_move";

/// Column limit before the list is broken into one pair per line.
const MAX_WIDTH: usize = 120;

/// One `(old_qualified_name, new_qualified_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rename {
    pub old: String,
    pub new: String,
}

impl Rename {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Ordered pairs driving the rewrite.
pub type RenameMapping = Vec<Rename>;

/// Renders the artifact text for `mapping`.
pub fn render(mapping: &[Rename]) -> String {
    let items: Vec<String> = mapping
        .iter()
        .map(|Rename { old, new }| format!("({}, {})", python_repr(old), python_repr(new)))
        .collect();

    let single_line = format!("[{}]", items.join(", "));
    let list = if single_line.len() <= MAX_WIDTH {
        single_line
    } else {
        format!("[   {}]", items.join(",\n    "))
    };

    format!("{BINDING} = {list}\n")
}

pub fn write(path: &Path, mapping: &[Rename]) -> Result<(), Error> {
    fs::write(path, render(mapping)).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read(path: &Path) -> Result<RenameMapping, Error> {
    let source = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&source).map_err(|source| Error::Mapping {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses artifact text into a mapping, keeping the order of the pairs.
pub fn parse(source: &str) -> Result<RenameMapping, ParseError> {
    let tokens: Vec<Token<'_>> = tokenize(source)
        .into_iter()
        .filter(|token| !token.kind.is_trivia())
        .collect();

    if let Some(bad) = tokens.iter().find(|token| token.kind == ERROR) {
        return Err(ParseError::at(source, bad.offset, "unterminated string literal"));
    }

    let missing = format!("no '{BINDING} = [...]' assignment found");
    let start = tokens
        .windows(2)
        .position(|pair| {
            pair[0].kind == NAME && pair[0].text == BINDING && pair[1].kind == EQ
        })
        .ok_or_else(|| ParseError::at(source, 0, missing))?;

    let mut reader = LiteralReader {
        source,
        tokens: &tokens,
        pos: start + 2,
    };
    reader.mapping()
}

struct LiteralReader<'a> {
    source: &'a str,
    tokens: &'a [Token<'a>],
    pos: usize,
}

impl<'a> LiteralReader<'a> {
    fn mapping(&mut self) -> Result<RenameMapping, ParseError> {
        let close = self.open("a list of pairs")?;
        let mut mapping = Vec::new();

        while !self.at(close) {
            let pair_close = self.open("a pair of strings")?;
            let old = self.string()?;
            self.expect(COMMA, "','")?;
            let new = self.string()?;
            self.eat(COMMA);
            self.expect(pair_close, "the end of the pair")?;
            mapping.push(Rename { old, new });

            if !self.eat(COMMA) {
                break;
            }
        }

        self.expect(close, "the end of the list")?;
        Ok(mapping)
    }

    /// Consumes `[` or `(` and returns the matching closing kind.
    fn open(&mut self, what: &str) -> Result<SyntaxKind, ParseError> {
        let close = match self.peek().map(|token| token.kind) {
            Some(L_BRACKET) => R_BRACKET,
            Some(L_PAREN) => R_PAREN,
            _ => return Err(self.expected(what)),
        };
        self.pos += 1;
        Ok(close)
    }

    /// One or more adjacent string literals, concatenated like Python does.
    fn string(&mut self) -> Result<String, ParseError> {
        let mut value = String::new();
        let mut seen = false;

        while let Some(token) = self.peek().filter(|token| token.kind == STRING) {
            value.push_str(&decode_string(token.text).ok_or_else(|| {
                ParseError::at(
                    self.source,
                    token.offset,
                    "expected a plain string literal, not bytes or an f-string",
                )
            })?);
            self.pos += 1;
            seen = true;
        }

        if seen {
            Ok(value)
        } else {
            Err(self.expected("a string"))
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.peek().is_some_and(|token| token.kind == kind)
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        let found = self.at(kind);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.expected(what))
        }
    }

    fn expected(&self, what: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::at(
                self.source,
                token.offset,
                format!("expected {what}, found {:?}", token.text),
            ),
            None => ParseError::at(
                self.source,
                self.source.len(),
                format!("expected {what}, found end of file"),
            ),
        }
    }
}

/// Decodes a Python `str` literal. Returns `None` for bytes and f-strings.
fn decode_string(literal: &str) -> Option<String> {
    let quote_at = literal.find(['"', '\''])?;
    let prefix = literal[..quote_at].to_ascii_lowercase();
    if prefix.contains(['b', 'f', 't']) {
        return None;
    }
    let raw = prefix.contains('r');

    let quoted = &literal[quote_at..];
    let triple = quoted.starts_with("'''") || quoted.starts_with("\"\"\"");
    let quote_len = if quoted.len() >= 6 && triple {
        3
    } else {
        1
    };
    let body = &quoted[quote_len..quoted.len() - quote_len];

    if raw {
        return Some(body.to_string());
    }

    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some('\r') => {
                chars.next_if_eq(&'\n');
            }
            Some('\\') => value.push('\\'),
            Some('\'') => value.push('\''),
            Some('"') => value.push('"'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('t') => value.push('\t'),
            Some('0') => value.push('\0'),
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width).filter_map(|_| chars.next()).collect();
                let decoded = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)?;
                value.push(decoded);
            }
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    Some(value)
}

/// Formats `value` the way Python's `repr` formats a `str`.
fn python_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
