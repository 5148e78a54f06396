//! Slash separated node paths
//!
//! A path is a list of child names separated by `/`, evaluated from some starting node. Leading
//! and trailing separators are ignored and the empty path addresses the starting node itself.
//! Names are matched exactly, and both containers and canvases can be descended into.

use crate::node::Node;

/// Iterate over the non empty segments of a path
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Normalize a path by dropping empty segments and surrounding separators
pub fn normalize(path: &str) -> String {
    segments(path).collect::<Vec<_>>().join("/")
}

/// Resolve `path` starting at `root`
///
/// Returns `None` if any segment is missing or an intermediate node cannot hold children.
pub fn resolve<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    segments(path).try_fold(root, |node, name| node.child(name))
}

/// Mutable twin of [`resolve`]
pub fn resolve_mut<'a>(root: &'a mut Node, path: &str) -> Option<&'a mut Node> {
    segments(path).try_fold(root, |node, name| node.children_mut()?.get_mut(name))
}

/// Join two paths, either of which may be empty
pub fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_matches('/');
    let name = name.trim_matches('/');
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_owned(),
        (_, true) => base.to_owned(),
        _ => format!("{base}/{name}"),
    }
}

/// Split a path into its parent path and final name
///
/// Returns `None` for the empty path, which has no parent.
pub fn parent_and_name(path: &str) -> Option<(String, String)> {
    let normalized = normalize(path);
    if normalized.is_empty() {
        return None;
    }
    match normalized.rsplit_once('/') {
        Some((parent, name)) => Some((parent.to_owned(), name.to_owned())),
        None => Some((String::new(), normalized)),
    }
}

/// Final name of a path, or the empty string for the root
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::node::{Canvas, Container, Node, Vector2};
    use crate::path::{file_name, join_path, parent_and_name, resolve, resolve_mut};

    fn sample() -> Node {
        let mut canvas = Canvas::new(1, 1, vec![]);
        canvas.children = Container::new().with("origin", Node::Vector2(Vector2::new(3, 4)));

        Container::new()
            .with(
                "info",
                Container::new()
                    .with("icon", Node::Canvas(canvas))
                    .with("price", Node::Int32(50))
                    .into(),
            )
            .with("name", Node::String("Red Potion".into()))
            .into()
    }

    #[test]
    fn resolves_through_containers_and_canvases() {
        let root = sample();

        assert_eq!(resolve(&root, ""), Some(&root));
        assert_eq!(resolve(&root, "/info/price/"), Some(&Node::Int32(50)));
        assert_eq!(
            resolve(&root, "info/icon/origin"),
            Some(&Node::Vector2(Vector2::new(3, 4)))
        );
        assert_eq!(resolve(&root, "info/missing"), None);
        assert_eq!(resolve(&root, "name/child"), None);
        assert_eq!(resolve(&root, "INFO/price"), None);
    }

    #[test]
    fn resolve_mut_edits_in_place() {
        let mut root = sample();
        if let Some(node) = resolve_mut(&mut root, "info/price") {
            *node = Node::Int32(75);
        }
        assert_eq!(resolve(&root, "info/price"), Some(&Node::Int32(75)));
    }

    #[test]
    fn path_helpers() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a/b", ""), "a/b");
        assert_eq!(join_path("/a/", "/b"), "a/b");

        assert_eq!(parent_and_name(""), None);
        assert_eq!(parent_and_name("a"), Some(("".into(), "a".into())));
        assert_eq!(parent_and_name("/a/b/c/"), Some(("a/b".into(), "c".into())));

        assert_eq!(file_name("a/b/c"), "c");
        assert_eq!(file_name(""), "");
    }
}
