//! Typed views over import statement nodes.

use rowan::TextRange;

use super::kind::SyntaxKind::{self, *};
use super::kind::SyntaxNode;

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then(|| Self(node))
            }

            pub fn syntax(&self) -> &SyntaxNode {
                &self.0
            }

            pub fn range(&self) -> TextRange {
                self.0.text_range()
            }
        }
    };
}

ast_node!(ImportStmt, IMPORT_STMT);
ast_node!(FromImportStmt, FROM_IMPORT_STMT);
ast_node!(ModulePath, MODULE_PATH);
ast_node!(DottedName, DOTTED_NAME);
ast_node!(Alias, ALIAS);

/// Either form of import statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Import {
    Plain(ImportStmt),
    From(FromImportStmt),
}

impl Import {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            IMPORT_STMT => Some(Self::Plain(ImportStmt(node))),
            FROM_IMPORT_STMT => Some(Self::From(FromImportStmt(node))),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Plain(stmt) => stmt.syntax(),
            Self::From(stmt) => stmt.syntax(),
        }
    }
}

impl ImportStmt {
    pub fn aliases(&self) -> impl Iterator<Item = Alias> + '_ {
        self.0.children().filter_map(Alias::cast)
    }
}

impl FromImportStmt {
    pub fn module_path(&self) -> Option<ModulePath> {
        self.0.children().find_map(ModulePath::cast)
    }

    pub fn aliases(&self) -> impl Iterator<Item = Alias> + '_ {
        self.0.children().filter_map(Alias::cast)
    }
}

impl ModulePath {
    /// Number of leading dots, zero for absolute imports.
    pub fn level(&self) -> usize {
        self.0
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() == DOT)
            .count()
    }

    pub fn dotted_name(&self) -> Option<DottedName> {
        self.0.children().find_map(DottedName::cast)
    }

    pub fn parts(&self) -> Vec<String> {
        self.dotted_name()
            .map(|name| name.parts())
            .unwrap_or_default()
    }

    /// The module as written, minus any whitespace: `..pkg.sub`.
    pub fn qualified(&self) -> String {
        let mut text = ".".repeat(self.level());
        text.push_str(&self.parts().join("."));
        text
    }
}

impl DottedName {
    pub fn parts(&self) -> Vec<String> {
        self.0
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() == NAME)
            .map(|token| token.text().to_string())
            .collect()
    }

    pub fn dotted(&self) -> String {
        self.parts().join(".")
    }
}

impl Alias {
    pub fn dotted_name(&self) -> Option<DottedName> {
        self.0.children().find_map(DottedName::cast)
    }

    pub fn is_wildcard(&self) -> bool {
        self.0
            .children_with_tokens()
            .any(|element| element.kind() == STAR)
    }

    /// The name after `as`, if any.
    pub fn asname(&self) -> Option<String> {
        self.0
            .children_with_tokens()
            .filter_map(|element| element.into_token())
            .find(|token| token.kind() == NAME)
            .map(|token| token.text().to_string())
    }
}
