//! Token and node kinds for the Python syntax tree.

/// Every kind of token or node the Python tree can contain.
///
/// Tokens cover the whole source text, so concatenating them reproduces the
/// input byte for byte. Only import statements get structured nodes; the rest
/// of a file stays as a flat token stream under [`SyntaxKind::ROOT`].
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    WHITESPACE = 0,
    NEWLINE,
    COMMENT,
    /// Backslash followed by a line break.
    CONTINUATION,
    NAME,
    NUMBER,
    STRING,
    IMPORT_KW,
    FROM_KW,
    AS_KW,
    DOT,
    COMMA,
    SEMICOLON,
    COLON,
    STAR,
    EQ,
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,
    OPERATOR,
    /// Unterminated string literal or a character Python does not accept.
    ERROR,

    ROOT,
    IMPORT_STMT,
    FROM_IMPORT_STMT,
    /// The part between `from` and `import`, leading dots included.
    MODULE_PATH,
    DOTTED_NAME,
    ALIAS,
}

use SyntaxKind::*;

const ALL: [SyntaxKind; 30] = [
    WHITESPACE,
    NEWLINE,
    COMMENT,
    CONTINUATION,
    NAME,
    NUMBER,
    STRING,
    IMPORT_KW,
    FROM_KW,
    AS_KW,
    DOT,
    COMMA,
    SEMICOLON,
    COLON,
    STAR,
    EQ,
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,
    OPERATOR,
    ERROR,
    ROOT,
    IMPORT_STMT,
    FROM_IMPORT_STMT,
    MODULE_PATH,
    DOTTED_NAME,
    ALIAS,
];

impl SyntaxKind {
    /// Tokens that never change the meaning of a statement.
    pub fn is_trivia(self) -> bool {
        matches!(self, WHITESPACE | NEWLINE | COMMENT | CONTINUATION)
    }

    pub fn is_opening_bracket(self) -> bool {
        matches!(self, L_PAREN | L_BRACKET | L_BRACE)
    }

    pub fn is_closing_bracket(self) -> bool {
        matches!(self, R_PAREN | R_BRACKET | R_BRACE)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Marker type binding [`SyntaxKind`] to rowan's untyped trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PythonLanguage {}

impl rowan::Language for PythonLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        ALL.get(raw.0 as usize).copied().unwrap_or(ERROR)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<PythonLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<PythonLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<PythonLanguage>;
