//! Edits to parsed units
//!
//! Every edit parses its unit if needed, marks it dirty, and is lost unless the unit is saved
//! with [`Store::save`] before it is unparsed.

use std::mem;
use tracing::{debug, instrument};
use wz_node::{
    node::{INLINK, OUTLINK},
    path::{self, join_path, parent_and_name},
    Binary, Canvas, Container, Node, NodeKind, UnitPath, Vector2,
};

use crate::error::{Error, Result};
use crate::media::{Audio, Bitmap};
use crate::store::Store;

/// Parse `text` as a value of `kind`
///
/// Vectors are written `x,y` or `(x, y)`. Canvases and binaries cannot be written as text, see
/// [`Store::import_canvas`] and [`Store::import_sound`].
pub fn parse_value(kind: NodeKind, text: &str) -> Result<Node> {
    let trimmed = text.trim();
    let invalid = || Error::InvalidArgument(format!("'{text}' is not a valid {kind}"));
    Ok(match kind {
        NodeKind::Null if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") => Node::Null,
        NodeKind::Null => return Err(invalid()),
        NodeKind::Int16 => Node::Int16(trimmed.parse().map_err(|_| invalid())?),
        NodeKind::Int32 => Node::Int32(trimmed.parse().map_err(|_| invalid())?),
        NodeKind::Int64 => Node::Int64(trimmed.parse().map_err(|_| invalid())?),
        NodeKind::Float32 => Node::Float32(trimmed.parse().map_err(|_| invalid())?),
        NodeKind::Float64 => Node::Float64(trimmed.parse().map_err(|_| invalid())?),
        NodeKind::String => Node::String(text.to_owned()),
        NodeKind::Vector2 => Node::Vector2(parse_vector(trimmed).ok_or_else(invalid)?),
        NodeKind::Link => Node::Link(trimmed.to_owned()),
        NodeKind::Container if trimmed.is_empty() => Node::Container(Container::new()),
        NodeKind::Container => return Err(invalid()),
        NodeKind::Canvas | NodeKind::Binary => {
            return Err(Error::InvalidArgument(format!(
                "a {kind} cannot be created from text, import it instead"
            )))
        }
    })
}

fn parse_vector(text: &str) -> Option<Vector2> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    let (x, y) = inner.split_once(',')?;
    Some(Vector2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(Error::InvalidArgument(format!(
            "'{name}' is not a valid node name"
        )));
    }
    Ok(())
}

fn children_of<'a>(root: &'a mut Node, at: &UnitPath, path: &str) -> Result<&'a mut Container> {
    let node = path::resolve_mut(root, path)
        .ok_or_else(|| Error::NotFound(at.with_path(path).to_string()))?;
    let kind = node.kind();
    node.children_mut().ok_or_else(|| Error::TypeMismatch {
        path: at.with_path(path).to_string(),
        expected: "a node with children",
        found: kind,
    })
}

/// Split `at` into its parent and name, refusing the unit root
fn split(at: &UnitPath) -> Result<(String, String)> {
    parent_and_name(&at.path)
        .ok_or_else(|| Error::InvalidArgument(format!("'{at}' is a unit root")))
}

impl Store {
    /// Replace the value of the node at `at`, keeping its kind, and return the old node
    #[instrument(skip(self, at), fields(at = %at), err)]
    pub fn set_value(&self, at: &UnitPath, text: &str) -> Result<Node> {
        let unit = self.get_unit(&at.category, &at.unit)?;
        self.modify_unit(&unit, |root| {
            let node = path::resolve_mut(root, &at.path)
                .ok_or_else(|| Error::NotFound(at.to_string()))?;
            let value = match node.kind() {
                kind @ (NodeKind::Canvas | NodeKind::Binary | NodeKind::Container) => {
                    return Err(Error::InvalidArgument(format!(
                        "the value of a {kind} cannot be set"
                    )))
                }
                kind => parse_value(kind, text)?,
            };
            Ok(mem::replace(node, value))
        })
    }

    /// Insert `node` as `name` below `parent`
    fn insert_child(&self, parent: &UnitPath, name: &str, node: Node) -> Result<UnitPath> {
        check_name(name)?;
        let unit = self.get_unit(&parent.category, &parent.unit)?;
        self.modify_unit(&unit, |root| {
            children_of(root, parent, &parent.path)?.insert(name, node)?;
            Ok(())
        })?;
        let added = parent.with_path(join_path(&parent.path, name));
        debug!(%added, "added node");
        Ok(added)
    }

    /// Add a new node of `kind` below `parent`, see [`parse_value`] for `value`
    #[instrument(skip(self, parent), fields(parent = %parent), err)]
    pub fn add(
        &self,
        parent: &UnitPath,
        name: &str,
        kind: NodeKind,
        value: Option<&str>,
    ) -> Result<UnitPath> {
        let node = parse_value(kind, value.unwrap_or_default())?;
        self.insert_child(parent, name, node)
    }

    /// Remove the node at `at` and return it
    #[instrument(skip(self, at), fields(at = %at), err)]
    pub fn delete(&self, at: &UnitPath) -> Result<Node> {
        let (parent, name) = split(at)?;
        let unit = self.get_unit(&at.category, &at.unit)?;
        self.modify_unit(&unit, |root| {
            children_of(root, at, &parent)?
                .remove(&name)
                .ok_or_else(|| Error::NotFound(at.to_string()))
        })
    }

    /// Rename the node at `at` in place, keeping its position among its siblings
    #[instrument(skip(self, at), fields(at = %at), err)]
    pub fn rename(&self, at: &UnitPath, new_name: &str) -> Result<UnitPath> {
        check_name(new_name)?;
        let (parent, name) = split(at)?;
        let unit = self.get_unit(&at.category, &at.unit)?;
        self.modify_unit(&unit, |root| {
            Ok(children_of(root, at, &parent)?.rename(&name, new_name)?)
        })?;
        Ok(at.with_path(join_path(&parent, new_name)))
    }

    /// Deep copy the subtree at `source` below `parent`, possibly in another unit
    ///
    /// The copy keeps the source name unless `new_name` is given, and shares nothing with the
    /// source.
    #[instrument(skip(self, source, parent), fields(source = %source, parent = %parent), err)]
    pub fn copy(
        &self,
        source: &UnitPath,
        parent: &UnitPath,
        new_name: Option<&str>,
    ) -> Result<UnitPath> {
        let subtree = self.read_node(source, |node| Ok(node.clone()))?;
        let name = match new_name {
            Some(name) => name,
            None => path::file_name(&source.path),
        };
        self.insert_child(parent, name, subtree)
    }

    /// Set or replace the `origin` of the canvas at `at`
    #[instrument(skip(self, at), fields(at = %at), err)]
    pub fn set_canvas_origin(&self, at: &UnitPath, origin: Vector2) -> Result<()> {
        let unit = self.get_unit(&at.category, &at.unit)?;
        self.modify_unit(&unit, |root| {
            match path::resolve_mut(root, &at.path) {
                Some(Node::Canvas(canvas)) => {
                    set_origin(canvas, origin);
                    Ok(())
                }
                Some(other) => Err(Error::TypeMismatch {
                    path: at.to_string(),
                    expected: "Canvas",
                    found: other.kind(),
                }),
                None => Err(Error::NotFound(at.to_string())),
            }
        })
    }

    /// Replace the pixels of the canvas at `at` with those of a PNG file
    ///
    /// Nested properties are kept, except `_inlink` and `_outlink` which would otherwise still
    /// redirect to another canvas. Returns the previous width and height.
    #[instrument(skip(self, at, png), fields(at = %at, bytes = png.len()), err)]
    pub fn set_canvas_bitmap(&self, at: &UnitPath, png: &[u8]) -> Result<(u32, u32)> {
        let bitmap = Bitmap::from_png(png)?;
        let payload = self.bitmaps.encode_bitmap(&bitmap)?;
        let unit = self.get_unit(&at.category, &at.unit)?;
        self.modify_unit(&unit, |root| match path::resolve_mut(root, &at.path) {
            Some(Node::Canvas(canvas)) => {
                let previous = (canvas.width, canvas.height);
                canvas.width = bitmap.width;
                canvas.height = bitmap.height;
                canvas.payload = payload;
                canvas.children.remove(INLINK);
                canvas.children.remove(OUTLINK);
                Ok(previous)
            }
            Some(other) => Err(Error::TypeMismatch {
                path: at.to_string(),
                expected: "Canvas",
                found: other.kind(),
            }),
            None => Err(Error::NotFound(at.to_string())),
        })
    }

    /// Add a canvas named `name` below `parent` holding the pixels of a PNG file
    #[instrument(skip(self, parent, png), fields(parent = %parent, bytes = png.len()), err)]
    pub fn import_canvas(
        &self,
        parent: &UnitPath,
        name: &str,
        png: &[u8],
        origin: Option<Vector2>,
    ) -> Result<UnitPath> {
        let bitmap = Bitmap::from_png(png)?;
        let payload = self.bitmaps.encode_bitmap(&bitmap)?;
        let mut canvas = Canvas::new(bitmap.width, bitmap.height, payload);
        if let Some(origin) = origin {
            set_origin(&mut canvas, origin);
        }
        self.insert_child(parent, name, Node::Canvas(canvas))
    }

    /// Add a binary named `name` below `parent` holding an audio file
    #[instrument(skip(self, parent, audio), fields(parent = %parent, bytes = audio.data.len()), err)]
    pub fn import_sound(&self, parent: &UnitPath, name: &str, audio: Audio) -> Result<UnitPath> {
        let binary: Binary = self.audio.encode_audio(audio)?;
        self.insert_child(parent, name, Node::Binary(binary))
    }
}

fn set_origin(canvas: &mut Canvas, origin: Vector2) {
    canvas.children = mem::take(&mut canvas.children).with("origin", Node::Vector2(origin));
}
