//! Read only navigation over the store

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::sync::Arc;
use wz_node::{
    link::{self, MAX_HOPS},
    path, walk, Canvas, Flow, LinkKind, LinkOutcome, Node, NodeKind, UnitPath, Vector2, Visit,
};

use crate::error::{Error, Result};
use crate::media::Bitmap;
use crate::store::Store;
use crate::unit::Unit;

/// Most children a single page of [`Store::list_children`] returns
pub const MAX_PAGE: usize = 500;
/// Deepest [`Store::tree`] view
pub const MAX_TREE_DEPTH: usize = 5;
/// Most children per node in a [`Store::tree`] view
pub const MAX_TREE_CHILDREN: usize = 200;
/// Most nodes in a single [`Store::tree`] view
pub const MAX_TREE_NODES: usize = 1000;
/// Depth used by [`Store::list_canvases`] and [`Store::list_sounds`] when none is given
pub const DEFAULT_LISTING_DEPTH: usize = 10;

/// Which units an archive wide operation looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Unit { category: String, unit: String },
    Category(String),
    Archive,
}

impl Scope {
    pub fn unit(category: impl Into<String>, unit: impl Into<String>) -> Self {
        Scope::Unit {
            category: category.into(),
            unit: unit.into(),
        }
    }
}

/// One child in a [`ChildPage`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
}

/// A window of the children of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildPage {
    pub location: UnitPath,
    pub total: usize,
    pub offset: usize,
    pub entries: Vec<ChildEntry>,
    pub has_more: bool,
}

/// A node of a [`Store::tree`] view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    /// Children that exist but are not part of the view
    #[serde(skip_serializing_if = "is_zero")]
    pub truncated: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// A depth limited view of a subtree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub location: UnitPath,
    pub root: TreeNode,
    pub node_count: usize,
    /// Whether the node cap cut the view short
    pub capped: bool,
}

/// Everything about a single node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub location: UnitPath,
    pub name: String,
    pub kind: NodeKind,
    pub value: Option<String>,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasInfo {
    pub width: u32,
    pub height: u32,
    pub origin: Option<Vector2>,
    /// Left top corner of the bounds
    pub lt: Option<Vector2>,
    /// Right bottom corner of the bounds
    pub rb: Option<Vector2>,
    /// Head position used when composing characters
    pub head: Option<Vector2>,
    pub delay: i32,
    pub inlink: Option<String>,
    pub outlink: Option<String>,
    pub payload_bytes: usize,
}

impl CanvasInfo {
    fn of(canvas: &Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            origin: canvas.origin(),
            lt: canvas.vector("lt"),
            rb: canvas.vector("rb"),
            head: canvas.vector("head"),
            delay: canvas.delay(),
            inlink: canvas.inlink().map(str::to_owned),
            outlink: canvas.outlink().map(str::to_owned),
            payload_bytes: canvas.payload.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundInfo {
    /// Playback length in milliseconds
    pub length: u32,
    pub frequency: u32,
    pub payload_bytes: usize,
    pub extension: &'static str,
}

/// One frame of an [`Animation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub origin: Option<Vector2>,
    pub delay: i32,
    /// The frame as a base64 encoded PNG, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
}

/// Canvases named `0`, `1`, ... below a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    pub location: UnitPath,
    pub frames: Vec<Frame>,
    /// Sum of the frame delays in milliseconds
    pub total_delay: i64,
}

/// A canvas found by [`Store::list_canvases`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEntry {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// A binary found by [`Store::list_sounds`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundEntry {
    pub path: String,
    pub length: u32,
    pub frequency: u32,
}

/// Outcome of one lookup of [`Store::node_info_batch`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub location: UnitPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<NodeInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A followed link
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub location: UnitPath,
    /// Link text as stored
    pub raw: String,
    pub kind: LinkKind,
    pub outcome: LinkOutcome,
    /// Where the link ends up, if it ends at an existing node
    pub target: Option<UnitPath>,
    pub target_kind: Option<NodeKind>,
    pub target_value: Option<String>,
}

fn mismatch(at: &UnitPath, expected: &'static str, node: &Node) -> Error {
    Error::TypeMismatch {
        path: at.to_string(),
        expected,
        found: node.kind(),
    }
}

impl Store {
    /// Units an operation over `scope` visits
    pub fn units_in_scope(&self, scope: &Scope) -> Result<Vec<Arc<Unit>>> {
        Ok(match scope {
            Scope::Unit { category, unit } => vec![self.get_unit(category, unit)?],
            Scope::Category(category) => self.category(category)?.units().cloned().collect(),
            Scope::Archive => self.units().cloned().collect(),
        })
    }

    /// A page of the children of the node at `at`
    ///
    /// `limit` is clamped to `1..=500`. Compact pages only carry names.
    pub fn list_children(
        &self,
        at: &UnitPath,
        compact: bool,
        offset: usize,
        limit: usize,
    ) -> Result<ChildPage> {
        let limit = limit.clamp(1, MAX_PAGE);
        self.read_node(at, |node| {
            let children = node
                .children()
                .ok_or_else(|| mismatch(at, "a node with children", node))?;
            let entries = children
                .iter()
                .skip(offset)
                .take(limit)
                .map(|(name, child)| ChildEntry {
                    name: name.clone(),
                    kind: (!compact).then(|| child.kind()),
                    value: if compact { None } else { child.value_text() },
                    child_count: if compact {
                        None
                    } else {
                        child.children().map(|c| c.len())
                    },
                })
                .collect::<Vec<_>>();
            Ok(ChildPage {
                location: at.clone(),
                total: children.len(),
                offset,
                has_more: offset.saturating_add(entries.len()) < children.len(),
                entries,
            })
        })
    }

    /// A view of the subtree at `at`
    ///
    /// `depth` is clamped to `1..=5` and `max_children` to `1..=200`. The view never holds more
    /// than 1000 nodes; children left out are counted in [`TreeNode::truncated`].
    pub fn tree(&self, at: &UnitPath, depth: usize, max_children: usize) -> Result<TreeView> {
        let depth = depth.clamp(1, MAX_TREE_DEPTH);
        let max_children = max_children.clamp(1, MAX_TREE_CHILDREN);
        self.read_node(at, |node| {
            let mut budget = Budget::new(MAX_TREE_NODES - 1);
            let name = path::file_name(&at.path).to_owned();
            let root = tree_node(name, node, depth, max_children, &mut budget);
            Ok(TreeView {
                location: at.clone(),
                node_count: MAX_TREE_NODES - budget.left,
                capped: budget.exhausted,
                root,
            })
        })
    }

    /// Information on each of `locations`, failing per entry instead of as a whole
    pub fn node_info_batch(&self, locations: &[UnitPath]) -> Vec<BatchEntry> {
        locations
            .iter()
            .map(|at| match self.node_info(at) {
                Ok(info) => BatchEntry {
                    location: at.clone(),
                    info: Some(info),
                    error: None,
                },
                Err(e) => BatchEntry {
                    location: at.clone(),
                    info: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }

    pub fn node_info(&self, at: &UnitPath) -> Result<NodeInfo> {
        self.read_node(at, |node| {
            Ok(NodeInfo {
                location: at.clone(),
                name: path::file_name(&at.path).to_owned(),
                kind: node.kind(),
                value: node.value_text(),
                children: node
                    .children()
                    .map(|c| c.keys().cloned().collect())
                    .unwrap_or_default(),
            })
        })
    }

    pub fn get_string(&self, at: &UnitPath) -> Result<String> {
        self.read_node(at, |node| {
            node.as_str()
                .map(str::to_owned)
                .ok_or_else(|| mismatch(at, "String", node))
        })
    }

    /// Value of any of the integer kinds
    pub fn get_int(&self, at: &UnitPath) -> Result<i64> {
        self.read_node(at, |node| {
            node.as_i64().ok_or_else(|| mismatch(at, "an integer", node))
        })
    }

    /// Value of a Float32 or Float64
    pub fn get_float(&self, at: &UnitPath) -> Result<f64> {
        self.read_node(at, |node| match node {
            Node::Float32(_) | Node::Float64(_) => {
                node.as_f64().ok_or_else(|| mismatch(at, "a float", node))
            }
            other => Err(mismatch(at, "a float", other)),
        })
    }

    pub fn get_vector(&self, at: &UnitPath) -> Result<Vector2> {
        self.read_node(at, |node| {
            node.as_vector().ok_or_else(|| mismatch(at, "Vector2", node))
        })
    }

    pub fn canvas_info(&self, at: &UnitPath) -> Result<CanvasInfo> {
        self.read_node(at, |node| match node {
            Node::Canvas(canvas) => Ok(CanvasInfo::of(canvas)),
            other => Err(mismatch(at, "Canvas", other)),
        })
    }

    /// Decoded pixels of the canvas at `at`, following canvas links
    pub fn canvas_bitmap(&self, at: &UnitPath) -> Result<Bitmap> {
        let target = self.link_destination(at)?;
        self.read_node(&target, |node| match node {
            Node::Canvas(canvas) => self.bitmaps.decode_bitmap(canvas),
            other => Err(mismatch(&target, "Canvas", other)),
        })
    }

    /// The canvas at `at` as a base64 encoded PNG
    pub fn canvas_png_base64(&self, at: &UnitPath) -> Result<String> {
        Ok(STANDARD.encode(self.canvas_bitmap(at)?.to_png()?))
    }

    /// The frames of the animation at `at`, optionally with their pixels
    ///
    /// Frames are the canvas children named `0`, `1`, ... up to the first number that is missing
    /// or not a canvas.
    pub fn animation_frames(&self, at: &UnitPath, with_png: bool) -> Result<Animation> {
        let frames = self.read_node(at, |node| {
            let children = node
                .children()
                .ok_or_else(|| mismatch(at, "a node with children", node))?;
            Ok((0..)
                .map_while(|index| match children.get(&index.to_string()) {
                    Some(Node::Canvas(canvas)) => Some(Frame {
                        index,
                        width: canvas.width,
                        height: canvas.height,
                        origin: canvas.origin(),
                        delay: canvas.delay(),
                        png: None,
                    }),
                    _ => None,
                })
                .collect::<Vec<_>>())
        })?;

        let frames = if with_png {
            frames
                .into_iter()
                .map(|frame| {
                    let location =
                        at.with_path(path::join_path(&at.path, &frame.index.to_string()));
                    Ok(Frame {
                        png: Some(self.canvas_png_base64(&location)?),
                        ..frame
                    })
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            frames
        };

        Ok(Animation {
            location: at.clone(),
            total_delay: frames.iter().map(|f| i64::from(f.delay)).sum(),
            frames,
        })
    }

    /// Every canvas at or below `at`, down to `max_depth`
    pub fn list_canvases(
        &self,
        at: &UnitPath,
        max_depth: Option<usize>,
    ) -> Result<Vec<CanvasEntry>> {
        let max_depth = max_depth.unwrap_or(DEFAULT_LISTING_DEPTH);
        self.read_node(at, |node| {
            let mut found = Vec::new();
            walk(node, &at.path, Some(max_depth), true, |visit: &Visit<'_>| {
                if let Node::Canvas(canvas) = visit.node {
                    found.push(CanvasEntry {
                        path: visit.path.to_owned(),
                        width: canvas.width,
                        height: canvas.height,
                    });
                }
                Flow::Continue
            });
            Ok(found)
        })
    }

    /// Every binary at or below `at`, down to `max_depth`
    pub fn list_sounds(
        &self,
        at: &UnitPath,
        max_depth: Option<usize>,
    ) -> Result<Vec<SoundEntry>> {
        let max_depth = max_depth.unwrap_or(DEFAULT_LISTING_DEPTH);
        self.read_node(at, |node| {
            let mut found = Vec::new();
            walk(node, &at.path, Some(max_depth), true, |visit: &Visit<'_>| {
                if let Node::Binary(binary) = visit.node {
                    found.push(SoundEntry {
                        path: visit.path.to_owned(),
                        length: binary.length,
                        frequency: binary.frequency,
                    });
                }
                Flow::Continue
            });
            Ok(found)
        })
    }

    pub fn sound_info(&self, at: &UnitPath) -> Result<SoundInfo> {
        self.read_node(at, |node| match node {
            Node::Binary(binary) => Ok(SoundInfo {
                length: binary.length,
                frequency: binary.frequency,
                payload_bytes: binary.payload.len(),
                extension: self.audio.extension(),
            }),
            other => Err(mismatch(at, "Binary", other)),
        })
    }

    /// Decoded audio file of the binary at `at`
    pub fn sound_bytes(&self, at: &UnitPath) -> Result<Vec<u8>> {
        self.read_node(at, |node| match node {
            Node::Binary(binary) => Ok(self.audio.decode_audio(binary)?.data),
            other => Err(mismatch(at, "Binary", other)),
        })
    }

    pub fn sound_base64(&self, at: &UnitPath) -> Result<String> {
        Ok(STANDARD.encode(self.sound_bytes(at)?))
    }

    /// Follow the link at `at`
    ///
    /// Links into other units are only followed when `fault_in` or
    /// [`crate::StoreOptions::follow_cross_unit_links`] is set, otherwise the report carries the
    /// [`LinkOutcome::CrossUnit`] reference untouched.
    pub fn follow_link(&self, at: &UnitPath, fault_in: bool) -> Result<LinkReport> {
        let (resolution, local) = self.read_root(at, |root| {
            let resolution = link::resolve_link(root, at).ok_or_else(|| {
                match path::resolve(root, &at.path) {
                    Some(node) => mismatch(at, "a link", node),
                    None => Error::NotFound(at.to_string()),
                }
            })?;
            let local = resolution.outcome.target(root).map(describe);
            Ok((resolution, local))
        })?;

        let (outcome, target, described) = match resolution.outcome {
            LinkOutcome::Resolved { path } => (
                LinkOutcome::Resolved { path: path.clone() },
                Some(at.with_path(path)),
                local,
            ),
            LinkOutcome::CrossUnit(reference)
                if fault_in || self.options.follow_cross_unit_links =>
            {
                let (outcome, target) = self.resolve_cross_unit(&reference)?;
                let described = match &target {
                    Some(target) => Some(self.read_node(target, |node| Ok(describe(node)))?),
                    None => None,
                };
                (outcome, target, described)
            }
            other => (other, None, None),
        };

        let (target_kind, target_value) = described.unzip();
        Ok(LinkReport {
            location: at.clone(),
            raw: resolution.raw,
            kind: resolution.kind,
            outcome,
            target,
            target_kind,
            target_value: target_value.flatten(),
        })
    }

    /// Chase a reference into another unit, parsing every unit the chain passes through
    ///
    /// Returns the final outcome and, when the chain ends at an existing node, its location.
    pub fn resolve_cross_unit(
        &self,
        reference: &UnitPath,
    ) -> Result<(LinkOutcome, Option<UnitPath>)> {
        let mut reference = reference.clone();
        for _ in 0..MAX_HOPS {
            let unit = match self.get_unit(&reference.category, &reference.unit) {
                Ok(unit) => unit,
                Err(Error::NotFound(_)) => {
                    let path = reference.to_string();
                    return Ok((LinkOutcome::Broken { path }, None));
                }
                Err(e) => return Err(e),
            };
            let parsed = self.ensure_parsed(&unit)?;
            let here = unit.location(&reference.path);
            let outcome = link::resolve_target(&parsed.read(), &here);
            match outcome {
                LinkOutcome::CrossUnit(next) => reference = next,
                LinkOutcome::Resolved { path } => {
                    let target = here.with_path(&path);
                    return Ok((LinkOutcome::Resolved { path }, Some(target)));
                }
                other => return Ok((other, None)),
            }
        }

        let path = reference.to_string();
        Ok((LinkOutcome::Broken { path }, None))
    }

    /// Where the node at `at` leads: itself, or the end of the link it carries
    pub(crate) fn link_destination(&self, at: &UnitPath) -> Result<UnitPath> {
        let resolution = self.read_root(at, |root| Ok(link::resolve_link(root, at)))?;
        let Some(resolution) = resolution else {
            return Ok(at.clone());
        };

        let broken = |reason: String| Error::BrokenLink {
            path: at.to_string(),
            reason,
        };
        match resolution.outcome {
            LinkOutcome::Resolved { path } => Ok(at.with_path(path)),
            LinkOutcome::CrossUnit(reference) if self.options.follow_cross_unit_links => {
                match self.resolve_cross_unit(&reference)? {
                    (_, Some(target)) => Ok(target),
                    (outcome, None) => Err(broken(outcome.to_string())),
                }
            }
            LinkOutcome::CrossUnit(reference) => Err(Error::InvalidArgument(format!(
                "'{at}' links into {reference}, following links into other units is disabled"
            ))),
            other => Err(broken(other.to_string())),
        }
    }
}

fn describe(node: &Node) -> (NodeKind, Option<String>) {
    (node.kind(), node.value_text())
}

/// Nodes a tree view may still add
#[derive(Debug)]
struct Budget {
    left: usize,
    /// Whether a node was left out because nothing was left
    exhausted: bool,
}

impl Budget {
    fn new(left: usize) -> Self {
        Self {
            left,
            exhausted: false,
        }
    }
}

fn tree_node(
    name: String,
    node: &Node,
    depth: usize,
    max_children: usize,
    budget: &mut Budget,
) -> TreeNode {
    let mut view = TreeNode {
        name,
        kind: node.kind(),
        value: node.value_text(),
        children: Vec::new(),
        truncated: 0,
    };
    let Some(children) = node.children() else {
        return view;
    };

    if depth > 0 {
        for (child_name, child) in children.iter().take(max_children) {
            if budget.left == 0 {
                budget.exhausted = true;
                break;
            }
            budget.left -= 1;
            view.children
                .push(tree_node(child_name.clone(), child, depth - 1, max_children, budget));
        }
    }
    view.truncated = children.len() - view.children.len();
    view
}
