//! Link resolution
//!
//! Three kinds of node point at other nodes:
//!
//! * a [`Node::Link`] holds a path relative to the link's parent, where `..` ascends one level
//! * a canvas `_inlink` child holds a path from the unit root
//! * a canvas `_outlink` child holds a path qualified with a unit, `Category/sub/Unit.img/path`
//!
//! Links that stay within their unit are resolved against the same tree. Links into another unit
//! are reported as a [`UnitPath`] without touching that unit; following them is left to the
//! caller, who can hand the target tree to [`resolve_target`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::node::Node;
use crate::path::{self, segments};

/// Longest chain of links followed before giving up
pub const MAX_HOPS: usize = 16;

/// A fully qualified node location: category, unit (including subdirectories) and path
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UnitPath {
    pub category: String,
    /// Unit name relative to the category, `.img` suffix included
    pub unit: String,
    /// Path inside the unit
    pub path: String,
}

impl UnitPath {
    pub fn new(
        category: impl Into<String>,
        unit: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            unit: unit.into(),
            path: path.into(),
        }
    }

    /// A location without unit context
    ///
    /// Links evaluated from here cannot leave the tree they live in.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Same unit, different path
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            category: self.category.clone(),
            unit: self.unit.clone(),
            path: path.into(),
        }
    }

    fn has_context(&self) -> bool {
        !self.category.is_empty() && !self.unit.is_empty()
    }

    /// Whether both locations name the same unit, ignoring ASCII case
    pub fn same_unit(&self, other: &UnitPath) -> bool {
        self.category.eq_ignore_ascii_case(&other.category)
            && self.unit.eq_ignore_ascii_case(&other.unit)
    }

    /// Parse `Category/sub/Unit.img/path`
    pub fn parse_qualified(text: &str) -> Option<Self> {
        let parts = segments(text).collect::<Vec<_>>();
        let unit_end = unit_segment(&parts)?;
        Some(Self {
            category: parts[0].to_owned(),
            unit: parts[1..=unit_end].join("/"),
            path: parts[unit_end + 1..].join("/"),
        })
    }
}

impl fmt::Display for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = [&self.category, &self.unit, &self.path]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/");
        f.write_str(&full)
    }
}

/// Which field a link was read from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum LinkKind {
    /// A [`Node::Link`] value
    Uol,
    /// A canvas `_inlink` child
    InLink,
    /// A canvas `_outlink` child
    OutLink,
}

/// Best effort result of following a link
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum LinkOutcome {
    /// The chain ends at an existing node of the same unit
    Resolved { path: String },
    /// The chain ends at a path of the same unit that does not exist
    Broken { path: String },
    /// The chain leaves the unit; the target has not been looked at
    CrossUnit(UnitPath),
    /// The link text cannot name any node
    Malformed(String),
}

impl LinkOutcome {
    pub fn is_broken(&self) -> bool {
        matches!(self, LinkOutcome::Broken { .. } | LinkOutcome::Malformed(_))
    }

    /// The node a resolved link points at
    pub fn target<'a>(&self, root: &'a Node) -> Option<&'a Node> {
        match self {
            LinkOutcome::Resolved { path } => path::resolve(root, path),
            _ => None,
        }
    }
}

impl fmt::Display for LinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkOutcome::Resolved { path } => write!(f, "-> {path}"),
            LinkOutcome::Broken { path } => write!(f, "broken: '{path}' does not exist"),
            LinkOutcome::CrossUnit(target) => write!(f, "-> {target} (other unit)"),
            LinkOutcome::Malformed(reason) => write!(f, "malformed: {reason}"),
        }
    }
}

/// A link together with its raw text and outcome
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LinkResolution {
    /// Link text as stored
    pub raw: String,
    pub kind: LinkKind,
    pub outcome: LinkOutcome,
}

/// The link carried by a node, if it carries one
pub fn link_of(node: &Node) -> Option<(LinkKind, &str)> {
    match node {
        Node::Link(raw) => Some((LinkKind::Uol, raw)),
        Node::Canvas(canvas) => match (canvas.inlink(), canvas.outlink()) {
            (Some(raw), _) => Some((LinkKind::InLink, raw)),
            (None, Some(raw)) => Some((LinkKind::OutLink, raw)),
            (None, None) => None,
        },
        _ => None,
    }
}

/// Resolve the link stored at `origin.path` in `root`
///
/// `origin` carries the unit the tree belongs to so that links leaving it can be reported as
/// [`LinkOutcome::CrossUnit`]. Returns `None` if there is no node at the path or the node is
/// not a link.
pub fn resolve_link(root: &Node, origin: &UnitPath) -> Option<LinkResolution> {
    let node = path::resolve(root, &origin.path)?;
    let (kind, raw) = link_of(node)?;
    let outcome = match step(kind, raw, origin) {
        Step::Local(target) => follow(root, origin, target, 1),
        Step::Cross(target) => LinkOutcome::CrossUnit(target),
        Step::Malformed(reason) => LinkOutcome::Malformed(reason),
    };
    Some(LinkResolution {
        raw: raw.to_owned(),
        kind,
        outcome,
    })
}

/// Resolve a cross unit reference once the caller has the target unit's tree
pub fn resolve_target(target_root: &Node, target: &UnitPath) -> LinkOutcome {
    follow(target_root, target, path::normalize(&target.path), 0)
}

enum Step {
    Local(String),
    Cross(UnitPath),
    Malformed(String),
}

fn follow(root: &Node, unit: &UnitPath, path: String, hops: usize) -> LinkOutcome {
    let Some(node) = path::resolve(root, &path) else {
        return LinkOutcome::Broken { path };
    };
    let Some((kind, raw)) = link_of(node) else {
        return LinkOutcome::Resolved { path };
    };
    if hops >= MAX_HOPS {
        tracing::debug!(%path, "link chain exceeds {MAX_HOPS} hops");
        return LinkOutcome::Broken { path };
    }
    match step(kind, raw, &unit.with_path(path)) {
        Step::Local(next) => follow(root, unit, next, hops + 1),
        Step::Cross(target) => LinkOutcome::CrossUnit(target),
        Step::Malformed(reason) => LinkOutcome::Malformed(reason),
    }
}

/// Evaluate one link without looking at its target
fn step(kind: LinkKind, raw: &str, origin: &UnitPath) -> Step {
    match kind {
        LinkKind::Uol => {
            let mut parent = segments(&origin.path).collect::<Vec<_>>();
            parent.pop();
            relative(origin, &parent, raw)
        }
        LinkKind::InLink => relative(origin, &[], raw),
        LinkKind::OutLink => match UnitPath::parse_qualified(raw) {
            Some(target) if target.same_unit(origin) => Step::Local(target.path),
            Some(target) => Step::Cross(target),
            None => Step::Malformed(format!("'{raw}' does not name a unit")),
        },
    }
}

/// Apply `raw` to the virtual path `category/unit/base` and work out where it lands
fn relative(origin: &UnitPath, base: &[&str], raw: &str) -> Step {
    let prefix = if origin.has_context() {
        segments(&origin.category)
            .chain(segments(&origin.unit))
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };
    let floor = usize::from(origin.has_context());

    let mut stack = prefix.clone();
    stack.extend_from_slice(base);
    for segment in segments(raw) {
        match segment {
            "." => {}
            ".." if stack.len() > floor => {
                stack.pop();
            }
            ".." => {
                return Step::Malformed(format!("'{raw}' climbs above the unit root"));
            }
            name => stack.push(name),
        }
    }

    let inside = stack.len() >= prefix.len()
        && stack
            .iter()
            .zip(&prefix)
            .all(|(a, b)| a.eq_ignore_ascii_case(b));
    if inside {
        return Step::Local(stack[prefix.len()..].join("/"));
    }

    match unit_segment(&stack) {
        Some(end) => Step::Cross(UnitPath {
            category: stack[0].to_owned(),
            unit: stack[1..=end].join("/"),
            path: stack[end + 1..].join("/"),
        }),
        None => Step::Malformed(format!("'{raw}' does not name a unit")),
    }
}

/// Index of the first segment after the category that names a unit
fn unit_segment(parts: &[&str]) -> Option<usize> {
    parts
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, s)| s.to_ascii_lowercase().ends_with(".img"))
        .map(|(i, _)| i)
}
