//! Planning of import renames as text replacements.
//!
//! A rename of `old` to `new` touches three shapes of import:
//!
//! - `import old[.rest] [as x]`: the dotted prefix is swapped.
//! - `from old[.rest] import ...`: the module prefix is swapped.
//! - `from parent(old) import last(old) [as x]`: the name moves. When the
//!   target lives in a different module and the statement imports other
//!   names too, the moved names are cut out of the list and re-imported in a
//!   new statement placed right after the original one.
//!
//! Matching is done on whole dotted components, so renaming `a.b` never
//! touches `a.bc` or `ab.c`.

use std::fmt;

use rowan::TextRange;

use super::ast::{Alias, FromImportStmt, Import, ImportStmt};
use super::kind::{SyntaxElement, SyntaxKind};
use super::lexer::is_identifier;
use super::{RenameError, SourceFile};
use crate::rewriter::Replacement;

/// A qualified name split into its relative level and dotted components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct DottedPath {
    level: usize,
    parts: Vec<String>,
}

impl DottedPath {
    pub(super) fn parse(name: &str) -> Option<Self> {
        let absolute = name.trim_start_matches('.');
        let parts: Vec<String> = absolute.split('.').map(str::to_string).collect();
        parts.iter().all(|part| is_identifier(part)).then(|| Self {
            level: name.len() - absolute.len(),
            parts,
        })
    }

    fn starts_with(&self, prefix: &DottedPath) -> bool {
        self.level == prefix.level
            && !prefix.parts.is_empty()
            && self.parts.len() >= prefix.parts.len()
            && self.parts[..prefix.parts.len()] == prefix.parts[..]
    }

    fn parent(&self) -> DottedPath {
        DottedPath {
            level: self.level,
            parts: self.parts[..self.parts.len().saturating_sub(1)].to_vec(),
        }
    }

    fn last(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.level == 0 && self.parts.is_empty()
    }

    /// Renders this path followed by `suffix`, the components of a longer
    /// name that lay beyond the matched prefix.
    fn with_suffix(&self, suffix: &[String]) -> String {
        let mut text = ".".repeat(self.level);
        let parts: Vec<&str> = self
            .parts
            .iter()
            .chain(suffix)
            .map(String::as_str)
            .collect();
        text.push_str(&parts.join("."));
        text
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.with_suffix(&[]))
    }
}

/// Computes the replacements that rename `old` to `new` in `file`.
///
/// An empty result means nothing in the file imports `old`.
pub(super) fn plan(
    file: &SourceFile,
    old: &DottedPath,
    new: &DottedPath,
) -> Result<Vec<Replacement>, RenameError> {
    let mut replacements = Vec::new();

    for import in file.imports() {
        match import {
            Import::Plain(stmt) => plan_plain(&stmt, old, new, &mut replacements)?,
            Import::From(stmt) => plan_from(file.text(), &stmt, old, new, &mut replacements),
        }
    }

    Ok(replacements)
}

fn plan_plain(
    stmt: &ImportStmt,
    old: &DottedPath,
    new: &DottedPath,
    out: &mut Vec<Replacement>,
) -> Result<(), RenameError> {
    for alias in stmt.aliases() {
        let Some(name) = alias.dotted_name() else {
            continue;
        };
        let path = DottedPath {
            level: 0,
            parts: name.parts(),
        };
        if !path.starts_with(old) {
            continue;
        }
        if new.level > 0 {
            return Err(RenameError::RelativeTarget {
                old: path.to_string(),
                new: new.to_string(),
            });
        }
        out.push(replace(
            name.range(),
            new.with_suffix(&path.parts[old.parts.len()..]),
        ));
    }
    Ok(())
}

fn plan_from(
    text: &str,
    stmt: &FromImportStmt,
    old: &DottedPath,
    new: &DottedPath,
    out: &mut Vec<Replacement>,
) {
    let Some(module_path) = stmt.module_path() else {
        return;
    };
    let module = DottedPath {
        level: module_path.level(),
        parts: module_path.parts(),
    };

    if module.starts_with(old) {
        out.push(replace(
            module_path.range(),
            new.with_suffix(&module.parts[old.parts.len()..]),
        ));
        return;
    }

    if module != old.parent() {
        return;
    }

    let aliases: Vec<Alias> = stmt.aliases().collect();
    let moved: Vec<bool> = aliases
        .iter()
        .map(|alias| {
            alias
                .dotted_name()
                .is_some_and(|name| name.parts() == [old.last()])
        })
        .collect();
    if !moved.contains(&true) {
        return;
    }

    let target_module = new.parent();
    let target_name = new.last();
    let every_alias_moves = moved.iter().all(|m| *m);

    if target_module == module || (every_alias_moves && !target_module.is_empty()) {
        if target_module != module {
            out.push(replace(module_path.range(), target_module.to_string()));
        }
        if target_name != old.last() {
            for (alias, _) in aliases.iter().zip(&moved).filter(|(_, m)| **m) {
                if let Some(name) = alias.dotted_name() {
                    out.push(replace(name.range(), target_name.to_string()));
                }
            }
        }
        return;
    }

    let separator = statement_separator(text, usize::from(stmt.range().start()));
    let statements: Vec<String> = aliases
        .iter()
        .zip(&moved)
        .filter(|(_, m)| **m)
        .map(|(alias, _)| compose(&target_module, target_name, alias.asname()))
        .collect();

    if every_alias_moves {
        out.push(replace(stmt.range(), statements.join(&separator)));
        return;
    }

    out.extend(removals(text, stmt, &aliases, &moved));
    let end = after_trailing_comment(text, stmt.range().end().into(), &separator);
    out.push(Replacement::new(
        end,
        end,
        statements
            .iter()
            .map(|statement| format!("{separator}{statement}"))
            .collect(),
    ));
}

/// Replacements that cut the moved aliases out of an import list, together
/// with the commas that separated them from the aliases that stay.
fn removals(
    text: &str,
    stmt: &FromImportStmt,
    aliases: &[Alias],
    moved: &[bool],
) -> Vec<Replacement> {
    let elements: Vec<SyntaxElement> = stmt.syntax().children_with_tokens().collect();
    let positions: Vec<usize> = aliases
        .iter()
        .filter_map(|alias| {
            elements
                .iter()
                .position(|element| element.as_node() == Some(alias.syntax()))
        })
        .collect();
    let parenthesized = elements.iter().any(|e| e.kind() == SyntaxKind::L_PAREN);

    let mut out = Vec::new();
    let mut i = 0;
    while i < positions.len() {
        if !moved[i] {
            i += 1;
            continue;
        }
        let first = i;
        while i + 1 < positions.len() && moved[i + 1] {
            i += 1;
        }
        let last = i;
        i += 1;

        let run_start = usize::from(elements[positions[first]].text_range().start());
        let run_end = usize::from(elements[positions[last]].text_range().end());

        match next_significant(&elements, positions[last], SyntaxKind::COMMA) {
            Some(comma) => {
                let mut end_index = comma;
                while elements
                    .get(end_index + 1)
                    .is_some_and(|e| e.kind() == SyntaxKind::WHITESPACE)
                {
                    end_index += 1;
                }
                let mut start = run_start;
                let mut end = usize::from(elements[end_index].text_range().end());

                let line_start = start_of_line(text, start);
                let owns_line = text[line_start..start]
                    .chars()
                    .all(|c| matches!(c, ' ' | '\t'));
                if let Some(newline) = elements
                    .get(end_index + 1)
                    .filter(|e| e.kind() == SyntaxKind::NEWLINE && owns_line)
                {
                    start = line_start;
                    end = usize::from(newline.text_range().end());
                }
                out.push(Replacement::new(start, end, String::new()));
            }
            None => {
                // The run closes the list, so the comma after the previous
                // kept alias goes instead. Comments and line breaks between
                // that comma and the run stay where they are.
                let Some(prev) = first.checked_sub(1) else {
                    continue;
                };
                let comma = next_significant(&elements, positions[prev], SyntaxKind::COMMA);
                let Some(comma) = comma else {
                    continue;
                };
                let mut comma_start = comma;
                while comma_start > 0
                    && elements[comma_start - 1].kind() == SyntaxKind::WHITESPACE
                {
                    comma_start -= 1;
                }
                out.push(Replacement::new(
                    elements[comma_start].text_range().start().into(),
                    elements[comma].text_range().end().into(),
                    String::new(),
                ));

                let line_start = start_of_line(text, run_start);
                let owns_line = parenthesized
                    && line_start > usize::from(elements[comma].text_range().end())
                    && text[line_start..run_start]
                        .chars()
                        .all(|c| matches!(c, ' ' | '\t'));
                let (start, end) = if owns_line {
                    let mut after = positions[last] + 1;
                    while elements
                        .get(after)
                        .is_some_and(|e| e.kind() == SyntaxKind::WHITESPACE)
                    {
                        after += 1;
                    }
                    let end = elements
                        .get(after)
                        .filter(|e| e.kind() == SyntaxKind::NEWLINE)
                        .map_or(run_end, |newline| newline.text_range().end().into());
                    (line_start, end)
                } else {
                    let mut before = positions[first];
                    while before > comma + 1
                        && matches!(
                            elements[before - 1].kind(),
                            SyntaxKind::WHITESPACE | SyntaxKind::CONTINUATION
                        )
                    {
                        before -= 1;
                    }
                    (elements[before].text_range().start().into(), run_end)
                };
                out.push(Replacement::new(start, end, String::new()));
            }
        }
    }
    out
}

/// Index of the first non-trivia element after `index`, if it has `kind`.
fn next_significant(
    elements: &[SyntaxElement],
    index: usize,
    kind: SyntaxKind,
) -> Option<usize> {
    elements
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, element)| !element.kind().is_trivia())
        .filter(|(_, element)| element.kind() == kind)
        .map(|(i, _)| i)
}

fn start_of_line(text: &str, offset: usize) -> usize {
    text[..offset].rfind(['\n', '\r']).map_or(0, |i| i + 1)
}

/// What goes between the original statement and a split-off one: a line
/// break with the same indentation, or `; ` when the statement shares its
/// line with other code.
fn statement_separator(text: &str, start: usize) -> String {
    let line_start = start_of_line(text, start);
    let indent = text[line_start..start].trim_start_matches('\u{feff}');
    if indent.chars().all(|c| matches!(c, ' ' | '\t' | '\x0c')) {
        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        format!("{newline}{indent}")
    } else {
        "; ".to_string()
    }
}

/// Where split-off statements go: right after `end`, or after the comment
/// that ends the statement's line when they start on a line of their own.
fn after_trailing_comment(text: &str, end: usize, separator: &str) -> usize {
    if !separator.starts_with(['\n', '\r']) {
        return end;
    }
    let rest = &text[end..];
    let comment = rest.trim_start_matches([' ', '\t', '\x0c']);
    if !comment.starts_with('#') {
        return end;
    }
    end + (rest.len() - comment.len()) + comment.find(['\n', '\r']).unwrap_or(comment.len())
}

fn compose(module: &DottedPath, name: &str, asname: Option<String>) -> String {
    let alias = match asname {
        Some(asname) => format!("{name} as {asname}"),
        None => name.to_string(),
    };
    if module.is_empty() {
        format!("import {alias}")
    } else {
        format!("from {module} import {alias}")
    }
}

fn replace(range: TextRange, new_text: String) -> Replacement {
    Replacement::new(range.start().into(), range.end().into(), new_text)
}
