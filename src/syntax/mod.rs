//! Editable Python source.
//!
//! [`SourceFile`] keeps the original text next to a lossless rowan tree built
//! from it. Renames are computed against the tree as byte-range replacements,
//! applied to the text, and the text is parsed again so that every later
//! rename sees the result of the earlier ones. Bytes outside the replaced
//! ranges are never touched.

pub mod ast;
pub mod kind;
pub mod lexer;
pub mod parser;
mod rename;

use std::fmt;

use thiserror::Error;

pub use ast::{Alias, DottedName, FromImportStmt, Import, ImportStmt, ModulePath};
pub use kind::{PythonLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

use crate::rewriter::apply_replacements;

/// A syntax error with a 1-indexed position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = offset_to_line_col(source, offset);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Why a rename request could not be applied to a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    /// The old name is not bound by any import statement in this file.
    #[error("'{0}' is not imported here")]
    NotFound(String),

    #[error("'{0}' is not a valid qualified name")]
    InvalidName(String),

    /// A relative target cannot replace the module of a plain `import`.
    #[error("cannot rewrite 'import {old}' to the relative name '{new}'")]
    RelativeTarget { old: String, new: String },

    /// The edited text no longer parses.
    #[error("renaming produced invalid source: {0}")]
    Malformed(#[from] ParseError),
}

impl RenameError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A Python file that can be edited without disturbing its formatting.
#[derive(Clone)]
pub struct SourceFile {
    text: String,
    root: SyntaxNode,
}

impl SourceFile {
    pub fn parse(text: impl Into<String>) -> Result<Self, ParseError> {
        let text = text.into();
        let root = SyntaxNode::new_root(parser::parse(&text)?);
        Ok(Self { text, root })
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.root
    }

    /// All import statements, in source order.
    pub fn imports(&self) -> impl Iterator<Item = Import> + '_ {
        self.root.children().filter_map(Import::cast)
    }

    /// Rewrites every import binding of `old` to refer to `new` instead.
    ///
    /// Both names are dotted paths (`pkg.module.Name`), optionally prefixed by
    /// dots for relative imports. Returns [`RenameError::NotFound`] when no
    /// import statement in the file binds `old`; the file is unchanged then.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), RenameError> {
        let old_path =
            rename::DottedPath::parse(old).ok_or_else(|| RenameError::InvalidName(old.into()))?;
        let new_path =
            rename::DottedPath::parse(new).ok_or_else(|| RenameError::InvalidName(new.into()))?;

        let replacements = rename::plan(self, &old_path, &new_path)?;
        if replacements.is_empty() {
            return Err(RenameError::NotFound(old.to_string()));
        }

        let text = apply_replacements(&self.text, replacements);
        *self = Self::parse(text)?;
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

/// Converts a byte offset into a 1-indexed (line, column) pair.
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
