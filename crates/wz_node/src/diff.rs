//! Structural comparison of two subtrees

use derive_more::derive::Display;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::node::{Container, Node};
use crate::path::join_path;

/// Kind of a single difference
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum DifferenceKind {
    /// Both sides exist but hold different variants; nothing below is compared
    TypeMismatch,
    /// Both sides are leaves of the same variant with different values
    ValueDifference,
    OnlyInFirst,
    OnlyInSecond,
}

/// One difference between two trees
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Difference {
    /// Path relative to the compared roots
    pub path: String,
    pub kind: DifferenceKind,
    /// Description of the first side, absent if it has no node here
    pub first: Option<String>,
    /// Description of the second side, absent if it has no node here
    pub second: Option<String>,
}

impl Difference {
    /// The same difference seen from the other side
    pub fn swap(self) -> Self {
        let kind = match self.kind {
            DifferenceKind::OnlyInFirst => DifferenceKind::OnlyInSecond,
            DifferenceKind::OnlyInSecond => DifferenceKind::OnlyInFirst,
            other => other,
        };
        Self {
            path: self.path,
            kind,
            first: self.second,
            second: self.first,
        }
    }
}

/// Compare `first` against `second`
///
/// Child names are compared at every level reached; common children are only descended into
/// while `max_depth` levels remain. Canvases compare their dimensions and then their nested
/// children.
pub fn diff(first: &Node, second: &Node, max_depth: usize) -> Vec<Difference> {
    let mut differences = Vec::new();
    compare(first, second, "", max_depth, &mut differences);
    differences
}

fn describe(node: &Node) -> String {
    node.value_text().unwrap_or_else(|| node.kind().to_string())
}

fn compare(first: &Node, second: &Node, path: &str, remaining: usize, out: &mut Vec<Difference>) {
    if first.kind() != second.kind() {
        out.push(Difference {
            path: path.to_owned(),
            kind: DifferenceKind::TypeMismatch,
            first: Some(first.kind().to_string()),
            second: Some(second.kind().to_string()),
        });
        return;
    }

    let (first_text, second_text) = (first.value_text(), second.value_text());
    if first_text != second_text {
        out.push(Difference {
            path: path.to_owned(),
            kind: DifferenceKind::ValueDifference,
            first: first_text,
            second: second_text,
        });
    }

    if let (Some(a), Some(b)) = (first.children(), second.children()) {
        compare_children(a, b, path, remaining, out);
    }
}

fn compare_children(
    first: &Container,
    second: &Container,
    path: &str,
    remaining: usize,
    out: &mut Vec<Difference>,
) {
    for (name, a) in first.iter() {
        let child_path = join_path(path, name);
        match second.get(name) {
            Some(b) if remaining > 0 => compare(a, b, &child_path, remaining - 1, out),
            Some(_) => {}
            None => out.push(Difference {
                path: child_path,
                kind: DifferenceKind::OnlyInFirst,
                first: Some(describe(a)),
                second: None,
            }),
        }
    }

    for (name, b) in second.iter().filter(|(name, _)| !first.contains_key(*name)) {
        out.push(Difference {
            path: join_path(path, name),
            kind: DifferenceKind::OnlyInSecond,
            first: None,
            second: Some(describe(b)),
        });
    }
}
