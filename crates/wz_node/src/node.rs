//! Base types for the property tree

use derive_more::derive::{Deref, Display, IntoIterator};
use indexmap::IndexMap;
use std::{fmt, mem, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default frame delay of a canvas without a `delay` child, in milliseconds
pub const DEFAULT_CANVAS_DELAY: i32 = 100;

/// Name of the canvas child holding a link to another canvas in the same unit
pub const INLINK: &str = "_inlink";

/// Name of the canvas child holding a link to a canvas in another unit
pub const OUTLINK: &str = "_outlink";

/// A two component integer vector
#[derive(Debug, Display, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display("({x}, {y})")]
pub struct Vector2 {
    /// Horizontal component
    pub x: i32,
    /// Vertical component
    pub y: i32,
}

impl Vector2 {
    /// Create a vector from its components
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A bitmap and the properties nested below it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Canvas {
    /// Width of the bitmap in pixels
    pub width: u32,
    /// Height of the bitmap in pixels
    pub height: u32,
    /// The encoded bitmap, interpreted by a bitmap codec
    pub payload: Vec<u8>,
    /// Nested properties such as `origin`, `delay`, `_inlink`
    pub children: Container,
}

impl Canvas {
    /// Create a canvas without nested properties
    pub fn new(width: u32, height: u32, payload: Vec<u8>) -> Self {
        Self {
            width,
            height,
            payload,
            children: Container::default(),
        }
    }

    /// The vector stored in the child `name`, such as `lt`, `rb` or `head`
    pub fn vector(&self, name: &str) -> Option<Vector2> {
        self.children.get(name).and_then(Node::as_vector)
    }

    /// The draw offset stored in the `origin` child
    pub fn origin(&self) -> Option<Vector2> {
        self.vector("origin")
    }

    /// Frame delay in milliseconds, falling back to [`DEFAULT_CANVAS_DELAY`]
    pub fn delay(&self) -> i32 {
        self.children
            .get("delay")
            .and_then(Node::as_i64)
            .and_then(|d| i32::try_from(d).ok())
            .unwrap_or(DEFAULT_CANVAS_DELAY)
    }

    /// Target path of an `_inlink` child, if present
    pub fn inlink(&self) -> Option<&str> {
        self.children.get(INLINK).and_then(Node::as_str)
    }

    /// Qualified target of an `_outlink` child, if present
    pub fn outlink(&self) -> Option<&str> {
        self.children.get(OUTLINK).and_then(Node::as_str)
    }
}

/// An audio clip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binary {
    /// Declared playback length in milliseconds
    pub length: u32,
    /// Sample frequency in Hz
    pub frequency: u32,
    /// The encoded audio, interpreted by an audio codec
    pub payload: Vec<u8>,
}

/// Ordered, uniquely named children of a node
///
/// Lookup by name is a hash lookup and iteration follows insertion order. The only way to add
/// children is through [`Container::insert`], which refuses duplicate names.
#[derive(Debug, Clone, Default, PartialEq, Deref, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct Container(IndexMap<String, Node>);

impl Container {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child at the end, failing if the name is taken
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Result<()> {
        let name = name.into();
        if self.0.contains_key(&name) {
            return Err(Error::DuplicateName {
                parent: String::new(),
                name,
            });
        }
        self.0.insert(name, node);
        Ok(())
    }

    /// Builder style [`Container::insert`] that replaces an existing child of the same name
    pub fn with(mut self, name: impl Into<String>, node: Node) -> Self {
        self.0.insert(name.into(), node);
        self
    }

    /// Mutable access to a direct child
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.0.get_mut(name)
    }

    /// Remove a child, keeping the order of its siblings
    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.0.shift_remove(name)
    }

    /// Rename a child in place, keeping its position
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        let to = to.into();
        if from == to {
            return Ok(());
        }
        if self.0.contains_key(&to) {
            return Err(Error::DuplicateName {
                parent: String::new(),
                name: to,
            });
        }
        let Some((index, _, node)) = self.0.shift_remove_full(from) else {
            return Err(Error::NotFound(from.to_owned()));
        };
        self.0.shift_insert(index, to, node);
        Ok(())
    }

    /// Iterate mutably over the children in order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Node)> {
        self.0.iter_mut()
    }
}

impl FromIterator<(String, Node)> for Container {
    fn from_iter<T: IntoIterator<Item = (String, Node)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The discriminant of a [`Node`]
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    Null,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Vector2,
    Link,
    Canvas,
    Binary,
    Container,
}

impl NodeKind {
    /// Every kind, in tag order
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Null,
        NodeKind::Int16,
        NodeKind::Int32,
        NodeKind::Int64,
        NodeKind::Float32,
        NodeKind::Float64,
        NodeKind::String,
        NodeKind::Vector2,
        NodeKind::Link,
        NodeKind::Canvas,
        NodeKind::Binary,
        NodeKind::Container,
    ];
}

impl FromStr for NodeKind {
    type Err = Error;

    /// Parses kind names case-insensitively, including the legacy editor names
    /// (`Short`, `Int`, `Long`, `Float`, `Double`, `Vector`, `UOL`, `Sound`, `SubProperty`).
    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "null" => NodeKind::Null,
            "int16" | "short" => NodeKind::Int16,
            "int32" | "int" => NodeKind::Int32,
            "int64" | "long" => NodeKind::Int64,
            "float32" | "float" => NodeKind::Float32,
            "float64" | "double" => NodeKind::Float64,
            "string" => NodeKind::String,
            "vector2" | "vector" => NodeKind::Vector2,
            "link" | "uol" => NodeKind::Link,
            "canvas" => NodeKind::Canvas,
            "binary" | "sound" => NodeKind::Binary,
            "container" | "subproperty" | "sub" => NodeKind::Container,
            _ => return Err(Error::InvalidArgument(format!("unknown node type '{s}'"))),
        };
        Ok(kind)
    }
}

/// A single typed value in a property tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Vector2(Vector2),
    Link(String),
    Canvas(Canvas),
    Binary(Binary),
    Container(Container),
}

impl Default for Node {
    fn default() -> Self {
        Node::Container(Container::default())
    }
}

impl Node {
    /// The discriminant of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Null => NodeKind::Null,
            Node::Int16(_) => NodeKind::Int16,
            Node::Int32(_) => NodeKind::Int32,
            Node::Int64(_) => NodeKind::Int64,
            Node::Float32(_) => NodeKind::Float32,
            Node::Float64(_) => NodeKind::Float64,
            Node::String(_) => NodeKind::String,
            Node::Vector2(_) => NodeKind::Vector2,
            Node::Link(_) => NodeKind::Link,
            Node::Canvas(_) => NodeKind::Canvas,
            Node::Binary(_) => NodeKind::Binary,
            Node::Container(_) => NodeKind::Container,
        }
    }

    /// Children of containers and canvases
    pub fn children(&self) -> Option<&Container> {
        match self {
            Node::Container(c) => Some(c),
            Node::Canvas(c) => Some(&c.children),
            _ => None,
        }
    }

    /// Mutable children of containers and canvases
    pub fn children_mut(&mut self) -> Option<&mut Container> {
        match self {
            Node::Container(c) => Some(c),
            Node::Canvas(c) => Some(&mut c.children),
            _ => None,
        }
    }

    /// Direct child by name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().and_then(|c| c.get(name))
    }

    /// Whether this node has at least one child
    pub fn has_children(&self) -> bool {
        self.children().is_some_and(|c| !c.is_empty())
    }

    /// Integer value of any of the integer kinds
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int16(v) => Some(*v as i64),
            Node::Int32(v) => Some(*v as i64),
            Node::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point value of any numeric kind
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Float32(v) => Some(*v as f64),
            Node::Float64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Text of a string node
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Value of a vector node
    pub fn as_vector(&self) -> Option<Vector2> {
        match self {
            Node::Vector2(v) => Some(*v),
            _ => None,
        }
    }

    /// Textual form used when comparing values
    ///
    /// Containers have no value of their own. Canvases report their dimensions and binaries their
    /// declared length and frequency.
    pub fn value_text(&self) -> Option<String> {
        match self {
            Node::Null => Some("null".into()),
            Node::Int16(v) => Some(v.to_string()),
            Node::Int32(v) => Some(v.to_string()),
            Node::Int64(v) => Some(v.to_string()),
            Node::Float32(v) => Some(v.to_string()),
            Node::Float64(v) => Some(v.to_string()),
            Node::String(s) => Some(s.clone()),
            Node::Vector2(v) => Some(v.to_string()),
            Node::Link(path) => Some(path.clone()),
            Node::Canvas(c) => Some(format!("{}x{}", c.width, c.height)),
            Node::Binary(b) => Some(format!("{}ms@{}Hz", b.length, b.frequency)),
            Node::Container(_) => None,
        }
    }

    /// Textual form matched by value searches
    ///
    /// Only scalar leaves take part; canvases, binaries, nulls and containers do not.
    pub fn search_text(&self) -> Option<String> {
        match self {
            Node::Null | Node::Canvas(_) | Node::Binary(_) | Node::Container(_) => None,
            other => other.value_text(),
        }
    }

    /// Rough number of bytes this subtree occupies in memory
    pub fn estimated_size(&self) -> usize {
        let own = mem::size_of::<Node>();
        let heap = match self {
            Node::String(s) | Node::Link(s) => s.capacity(),
            Node::Canvas(c) => c.payload.capacity() + container_size(&c.children),
            Node::Binary(b) => b.payload.capacity(),
            Node::Container(c) => container_size(c),
            _ => 0,
        };
        own + heap
    }
}

fn container_size(container: &Container) -> usize {
    container
        .iter()
        .map(|(name, node)| mem::size_of::<String>() + name.capacity() + node.estimated_size())
        .sum()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_text() {
            Some(text) => write!(f, "{}({})", self.kind(), text),
            None => write!(
                f,
                "{}[{}]",
                self.kind(),
                self.children().map_or(0, |c| c.len())
            ),
        }
    }
}

impl From<Container> for Node {
    fn from(value: Container) -> Self {
        Node::Container(value)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::node::{Canvas, Container, Node, NodeKind, Vector2};

    #[test]
    fn container_keeps_insertion_order() -> Result<()> {
        let mut container = Container::new();
        container.insert("zeta", Node::Int32(1))?;
        container.insert("alpha", Node::Int32(2))?;
        container.insert("mid", Node::Int32(3))?;

        let names = container.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        Ok(())
    }

    #[test]
    fn container_rejects_duplicate_names() -> Result<()> {
        let mut container = Container::new();
        container.insert("hp", Node::Int32(1))?;

        assert!(matches!(
            container.insert("hp", Node::Int32(2)),
            Err(Error::DuplicateName { .. })
        ));
        assert_eq!(container.get("hp"), Some(&Node::Int32(1)));

        Ok(())
    }

    #[test]
    fn rename_keeps_position() -> Result<()> {
        let mut container = Container::new()
            .with("a", Node::Null)
            .with("b", Node::Null)
            .with("c", Node::Null);

        container.rename("b", "renamed")?;

        let names = container.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "renamed", "c"]);
        assert!(container.rename("missing", "x").is_err());
        assert!(container.rename("a", "c").is_err());

        Ok(())
    }

    #[test]
    fn remove_keeps_sibling_order() {
        let mut container = Container::new()
            .with("a", Node::Null)
            .with("b", Node::Null)
            .with("c", Node::Null);

        assert_eq!(container.remove("a"), Some(Node::Null));

        let names = container.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn canvas_metadata_defaults() {
        let mut canvas = Canvas::new(2, 2, vec![]);
        assert_eq!(canvas.origin(), None);
        assert_eq!(canvas.delay(), 100);

        canvas.children = Container::new()
            .with("origin", Node::Vector2(Vector2::new(4, -3)))
            .with("delay", Node::Int16(120));
        assert_eq!(canvas.origin(), Some(Vector2::new(4, -3)));
        assert_eq!(canvas.delay(), 120);
    }

    #[test]
    fn kind_names_parse_with_aliases() -> Result<()> {
        assert_eq!("uol".parse::<NodeKind>()?, NodeKind::Link);
        assert_eq!("Sound".parse::<NodeKind>()?, NodeKind::Binary);
        assert_eq!("SHORT".parse::<NodeKind>()?, NodeKind::Int16);
        assert_eq!("Container".parse::<NodeKind>()?, NodeKind::Container);
        assert!("bitmap".parse::<NodeKind>().is_err());

        for kind in NodeKind::ALL {
            assert_eq!(kind.to_string().parse::<NodeKind>()?, kind);
        }

        Ok(())
    }

    #[test]
    fn value_text_of_leaves() {
        assert_eq!(Node::Int32(100).value_text().as_deref(), Some("100"));
        assert_eq!(Node::Float32(1.5).value_text().as_deref(), Some("1.5"));
        assert_eq!(
            Node::Vector2(Vector2::new(1, 2)).value_text().as_deref(),
            Some("(1, 2)")
        );
        assert_eq!(Node::Container(Container::new()).value_text(), None);
        assert_eq!(Node::Canvas(Canvas::new(3, 4, vec![])).search_text(), None);
    }
}
