//! Lossless Python tokenizer.
//!
//! Splits source text into tokens without dropping anything: whitespace,
//! comments, line continuations and malformed input all become tokens, so the
//! token texts always concatenate back to the original source. The lexer only
//! knows as much Python as is needed to find statement boundaries reliably,
//! which means strings and comments must never be mistaken for code.

use super::kind::SyntaxKind::{self, *};

/// A single token with its byte offset in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Tokenizes `source` into a lossless token stream.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
    };
    let mut tokens = Vec::new();

    while lexer.pos < source.len() {
        let start = lexer.pos;
        let kind = lexer.next_kind();
        tokens.push(Token {
            kind,
            text: &source[start..lexer.pos],
            offset: start,
        });
    }

    tokens
}

const OPERATOR_CHARS: &str = "+-*/%&|^~<>!@=";

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn next_kind(&mut self) -> SyntaxKind {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return ERROR;
        };

        match c {
            ' ' | '\t' | '\x0c' => {
                self.eat_while(|c| matches!(c, ' ' | '\t' | '\x0c'));
                WHITESPACE
            }
            // Byte order mark.
            '\u{feff}' if start == 0 => WHITESPACE,
            '\n' => NEWLINE,
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
                NEWLINE
            }
            '#' => {
                self.eat_while(|c| c != '\n' && c != '\r');
                COMMENT
            }
            '\\' => match self.peek() {
                Some('\n') => {
                    self.bump();
                    CONTINUATION
                }
                Some('\r') => {
                    self.bump();
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    CONTINUATION
                }
                _ => ERROR,
            },
            '"' | '\'' => self.string(c),
            c if is_identifier_start(c) => {
                self.eat_while(is_identifier_continue);
                let word = &self.src[start..self.pos];
                match self.peek() {
                    Some(q @ ('"' | '\'')) if is_string_prefix(word) => {
                        self.bump();
                        self.string(q)
                    }
                    _ => keyword_or_name(word),
                }
            }
            '0'..='9' => {
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                NUMBER
            }
            '.' => DOT,
            ',' => COMMA,
            ';' => SEMICOLON,
            ':' => {
                if self.peek() == Some('=') {
                    self.bump();
                    OPERATOR
                } else {
                    COLON
                }
            }
            '(' => L_PAREN,
            ')' => R_PAREN,
            '[' => L_BRACKET,
            ']' => R_BRACKET,
            '{' => L_BRACE,
            '}' => R_BRACE,
            c if OPERATOR_CHARS.contains(c) => {
                self.eat_while(|c| OPERATOR_CHARS.contains(c));
                match &self.src[start..self.pos] {
                    "*" => STAR,
                    "=" => EQ,
                    _ => OPERATOR,
                }
            }
            _ => ERROR,
        }
    }

    /// Consumes the rest of a string literal whose opening quote was just bumped.
    fn string(&mut self, quote: char) -> SyntaxKind {
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        loop {
            let Some(c) = self.bump() else {
                return ERROR;
            };
            match c {
                '\\' => {
                    if self.bump().is_none() {
                        return ERROR;
                    }
                }
                c if c == quote => {
                    if !triple {
                        return STRING;
                    }
                    if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        return STRING;
                    }
                }
                '\n' | '\r' if !triple => return ERROR,
                _ => {}
            }
        }
    }
}

fn keyword_or_name(word: &str) -> SyntaxKind {
    match word {
        "import" => IMPORT_KW,
        "from" => FROM_KW,
        "as" => AS_KW,
        _ => NAME,
    }
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "t" | "br" | "rb" | "fr" | "rf" | "tr" | "rt"
    )
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

pub(crate) fn is_identifier_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

/// Returns true if `word` is a valid Python identifier.
pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(is_identifier_start)
        && chars.all(is_identifier_continue)
        && !matches!(keyword_or_name(word), IMPORT_KW | FROM_KW | AS_KW)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<SyntaxKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn token_texts_reproduce_source() {
        let source = "import os  # comment\r\nx = f'{a}' + \"\"\"doc\n\"\"\" \\\n  .5\n\u{e9}t\u{e9} = 1\n";
        let joined: String = tokenize(source).iter().map(|t| t.text).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn classifies_import_keywords() {
        assert_eq!(
            kinds("from a import b as c"),
            vec![
                FROM_KW, WHITESPACE, NAME, WHITESPACE, IMPORT_KW, WHITESPACE, NAME, WHITESPACE,
                AS_KW, WHITESPACE, NAME
            ]
        );
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        assert_eq!(kinds("'# not a comment'"), vec![STRING]);
    }

    #[test]
    fn triple_quoted_string_spans_lines() {
        let tokens = tokenize("x = '''\nimport os\n'''\n");
        assert!(tokens.iter().all(|t| t.kind != IMPORT_KW));
        assert_eq!(tokens[4].text, "'''\nimport os\n'''");
    }

    #[test]
    fn prefixed_strings_are_single_tokens() {
        assert_eq!(kinds(r#"rb"\d" F'x'"#), vec![STRING, WHITESPACE, STRING]);
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        assert_eq!(kinds(r"'it\'s'"), vec![STRING]);
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        assert_eq!(kinds("'abc\n")[0], ERROR);
        assert_eq!(kinds("\"\"\"abc"), vec![ERROR]);
    }

    #[test]
    fn backslash_newline_is_a_continuation() {
        assert_eq!(
            kinds("a \\\nb"),
            vec![NAME, WHITESPACE, CONTINUATION, NAME]
        );
    }

    #[test]
    fn leading_byte_order_mark_is_trivia() {
        let tokens = tokenize("\u{feff}import os\n");
        assert_eq!(tokens[0].kind, WHITESPACE);
        assert_eq!(tokens[0].text, "\u{feff}");
        assert_eq!(tokens[1].kind, IMPORT_KW);
        assert_eq!(kinds("x\u{feff}")[1], ERROR);
    }

    #[test]
    fn lone_star_and_assignment_are_distinguished() {
        assert_eq!(kinds("*"), vec![STAR]);
        assert_eq!(kinds("="), vec![EQ]);
        assert_eq!(kinds("**"), vec![OPERATOR]);
        assert_eq!(kinds("=="), vec![OPERATOR]);
        assert_eq!(kinds(":="), vec![OPERATOR]);
    }

    #[test]
    fn identifier_validation() {
        assert!(is_identifier("module_1"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("caf\u{e9}"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("import"));
    }
}
