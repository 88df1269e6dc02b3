//! Builds a rowan tree from the token stream.
//!
//! Import statements in statement position (start of a logical line, after
//! `;`, or after a block-opening `:` on the same line) become structured
//! nodes. Every other token is attached to the root unchanged. Bracket depth
//! is tracked so that line breaks inside parentheses never end a statement.

use rowan::{GreenNode, GreenNodeBuilder};

use super::ParseError;
use super::kind::SyntaxKind::{self, *};
use super::lexer::{Token, tokenize};

/// Parses Python source into a lossless green tree.
///
/// Fails on the first problem that would also make Python reject the file:
/// unterminated strings, unbalanced brackets, or a malformed import statement.
pub fn parse(source: &str) -> Result<GreenNode, ParseError> {
    Parser {
        source,
        tokens: tokenize(source),
        pos: 0,
        builder: GreenNodeBuilder::new(),
    }
    .root()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
}

impl<'a> Parser<'a> {
    fn root(mut self) -> Result<GreenNode, ParseError> {
        self.builder.start_node(ROOT.into());

        let mut depth = 0usize;
        let mut at_statement_start = true;

        while let Some(token) = self.current() {
            match token.kind {
                IMPORT_KW if at_statement_start && depth == 0 => {
                    self.import_stmt()?;
                    at_statement_start = false;
                    continue;
                }
                FROM_KW if at_statement_start && depth == 0 => {
                    self.from_import_stmt()?;
                    at_statement_start = false;
                    continue;
                }
                ERROR => return Err(self.error_for_token(token)),
                WHITESPACE | COMMENT | CONTINUATION => {}
                NEWLINE => {
                    if depth == 0 {
                        at_statement_start = true;
                    }
                }
                SEMICOLON | COLON if depth == 0 => at_statement_start = true,
                kind if kind.is_opening_bracket() => {
                    depth += 1;
                    at_statement_start = false;
                }
                kind if kind.is_closing_bracket() => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        ParseError::at(self.source, token.offset, "unmatched closing bracket")
                    })?;
                    at_statement_start = false;
                }
                _ => at_statement_start = false,
            }
            self.bump();
        }

        if depth > 0 {
            return Err(ParseError::at(
                self.source,
                self.source.len(),
                "unexpected end of file inside brackets",
            ));
        }

        self.builder.finish_node();
        Ok(self.builder.finish())
    }

    /// `import dotted [as name] (, dotted [as name])*`
    fn import_stmt(&mut self) -> Result<(), ParseError> {
        self.builder.start_node(IMPORT_STMT.into());
        self.bump();

        loop {
            self.alias(false, true)?;
            if !self.eat(COMMA, false) {
                break;
            }
        }
        self.end_of_statement()?;

        self.builder.finish_node();
        Ok(())
    }

    /// `from .*dotted import (* | name [as name], ... | '(' name [as name], ... ')')`
    fn from_import_stmt(&mut self) -> Result<(), ParseError> {
        self.builder.start_node(FROM_IMPORT_STMT.into());
        self.bump();

        self.eat_trivia(false);
        self.builder.start_node(MODULE_PATH.into());
        let mut has_dots = false;
        while self.eat(DOT, false) {
            has_dots = true;
        }
        if self.peek(false) == Some(NAME) {
            self.dotted_name(false)?;
        } else if !has_dots {
            return Err(self.expected("a module name after 'from'", false));
        }
        self.builder.finish_node();

        self.expect(IMPORT_KW, false, "'import'")?;

        match self.peek(false) {
            Some(STAR) => {
                self.eat_trivia(false);
                self.builder.start_node(ALIAS.into());
                self.bump();
                self.builder.finish_node();
            }
            Some(L_PAREN) => {
                self.eat_trivia(false);
                self.bump();
                loop {
                    self.alias(true, false)?;
                    if !self.eat(COMMA, true) || self.peek(true) == Some(R_PAREN) {
                        break;
                    }
                }
                self.expect(R_PAREN, true, "')'")?;
            }
            _ => loop {
                self.alias(false, false)?;
                if !self.eat(COMMA, false) {
                    break;
                }
            },
        }
        self.end_of_statement()?;

        self.builder.finish_node();
        Ok(())
    }

    /// An import ends at a line break, a `;`, a comment or the end of file.
    fn end_of_statement(&self) -> Result<(), ParseError> {
        match self.peek(false) {
            None | Some(NEWLINE | SEMICOLON | COMMENT) => Ok(()),
            Some(_) => Err(self.expected("',' or end of statement", false)),
        }
    }

    fn alias(&mut self, in_parens: bool, dotted: bool) -> Result<(), ParseError> {
        self.eat_trivia(in_parens);
        self.builder.start_node(ALIAS.into());

        if dotted {
            self.dotted_name(in_parens)?;
        } else {
            self.builder.start_node(DOTTED_NAME.into());
            self.expect(NAME, in_parens, "an imported name")?;
            self.builder.finish_node();
        }

        if self.eat(AS_KW, in_parens) {
            self.expect(NAME, in_parens, "a name after 'as'")?;
        }

        self.builder.finish_node();
        Ok(())
    }

    fn dotted_name(&mut self, in_parens: bool) -> Result<(), ParseError> {
        self.eat_trivia(in_parens);
        self.builder.start_node(DOTTED_NAME.into());
        self.expect(NAME, in_parens, "a module name")?;
        while self.eat(DOT, in_parens) {
            self.expect(NAME, in_parens, "a name after '.'")?;
        }
        self.builder.finish_node();
        Ok(())
    }

    fn current(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    /// Outside brackets only whitespace and continuations can sit inside a
    /// statement; inside brackets line breaks and comments can too.
    fn is_trivia(kind: SyntaxKind, in_parens: bool) -> bool {
        matches!(kind, WHITESPACE | CONTINUATION)
            || (in_parens && matches!(kind, NEWLINE | COMMENT))
    }

    fn next_significant(&self, in_parens: bool) -> Option<Token<'a>> {
        self.tokens[self.pos..]
            .iter()
            .find(|t| !Self::is_trivia(t.kind, in_parens))
            .copied()
    }

    fn peek(&self, in_parens: bool) -> Option<SyntaxKind> {
        self.next_significant(in_parens).map(|t| t.kind)
    }

    fn eat_trivia(&mut self, in_parens: bool) {
        while self
            .current()
            .is_some_and(|t| Self::is_trivia(t.kind, in_parens))
        {
            self.bump();
        }
    }

    /// Consumes the next significant token, with the trivia before it, if it
    /// has the given kind. Trivia is left alone otherwise so that trailing
    /// whitespace never ends up inside a statement node.
    fn eat(&mut self, kind: SyntaxKind, in_parens: bool) -> bool {
        if self.peek(in_parens) != Some(kind) {
            return false;
        }
        self.eat_trivia(in_parens);
        self.bump();
        true
    }

    fn expect(&mut self, kind: SyntaxKind, in_parens: bool, what: &str) -> Result<(), ParseError> {
        if self.eat(kind, in_parens) {
            Ok(())
        } else {
            Err(self.expected(what, in_parens))
        }
    }

    fn expected(&self, what: &str, in_parens: bool) -> ParseError {
        match self.next_significant(in_parens) {
            Some(token) if token.kind == ERROR => self.error_for_token(token),
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

    fn error_for_token(&self, token: Token<'a>) -> ParseError {
        let message = if token.text.contains(['"', '\'']) {
            "unterminated string literal".to_string()
        } else {
            format!("unexpected character {:?}", token.text)
        };
        ParseError::at(self.source, token.offset, message)
    }
}
