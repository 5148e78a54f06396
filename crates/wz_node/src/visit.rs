//! Depth limited pre-order traversal with early exit

use crate::node::Node;
use crate::path;

/// A node reached during a [`walk`]
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    /// Full path of the node, starting with the walk's base path
    pub path: &'a str,
    /// Name of the node within its parent, or the last segment of the base path for the root
    pub name: &'a str,
    pub node: &'a Node,
    /// Distance from the walk's root, which is at depth 0
    pub depth: usize,
}

/// What the walk should do after a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Do not descend into the children of this node
    SkipChildren,
    /// Abandon the walk
    Stop,
}

/// How a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Completed,
    Stopped,
}

/// Visit `root` and its descendants depth first in insertion order
///
/// Nodes deeper than `max_depth` are not visited; `None` means unbounded. Canvas children are
/// visited like container children. The root itself is only passed to `visitor` when
/// `include_root` is set.
pub fn walk<F>(
    root: &Node,
    base_path: &str,
    max_depth: Option<usize>,
    include_root: bool,
    mut visitor: F,
) -> Walk
where
    F: FnMut(&Visit<'_>) -> Flow,
{
    let mut path = path::normalize(base_path);
    let name = path::file_name(&path).to_owned();
    visit_node(
        root,
        &mut path,
        &name,
        0,
        max_depth,
        include_root,
        &mut visitor,
    )
}

fn visit_node<F>(
    node: &Node,
    path: &mut String,
    name: &str,
    depth: usize,
    max_depth: Option<usize>,
    emit: bool,
    visitor: &mut F,
) -> Walk
where
    F: FnMut(&Visit<'_>) -> Flow,
{
    if emit {
        let visit = Visit {
            path: path.as_str(),
            name,
            node,
            depth,
        };
        match visitor(&visit) {
            Flow::Continue => {}
            Flow::SkipChildren => return Walk::Completed,
            Flow::Stop => return Walk::Stopped,
        }
    }

    if max_depth.is_some_and(|max| depth >= max) {
        return Walk::Completed;
    }
    let Some(children) = node.children() else {
        return Walk::Completed;
    };

    for (child_name, child) in children.iter() {
        let len = path.len();
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(child_name);
        let result = visit_node(child, path, child_name, depth + 1, max_depth, true, visitor);
        path.truncate(len);
        if result == Walk::Stopped {
            return Walk::Stopped;
        }
    }
    Walk::Completed
}
