//! Writing canvases, sounds and trees out of the store

use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use serde::Serialize;
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, Event},
    Writer,
};
use serde_json::{json, Map, Value};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};
use wz_node::{
    link,
    path::{self, join_path},
    walk, Flow, Node, UnitPath, Visit,
};

use crate::error::{CodecSource, Error, Result};
use crate::media::Bitmap;
use crate::store::Store;

/// Files written by an export and the nodes that could not be exported
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    /// Node location to error message
    pub failures: IndexMap<String, String>,
    /// Whether an item limit stopped the export early
    pub truncated: bool,
}

impl ExportReport {
    fn record(&mut self, location: &UnitPath, file: PathBuf, contents: Result<Vec<u8>>) {
        let outcome = contents.and_then(|bytes| {
            fs::write(&file, &bytes)?;
            Ok(bytes.len())
        });
        match outcome {
            Ok(bytes) => {
                info!(file = %file.display(), bytes, "exported");
                self.written.push(file);
            }
            Err(e) => {
                warn!(%location, "unable to export: {e}");
                self.failures.insert(location.to_string(), e.to_string());
            }
        }
    }

    /// Items attempted so far
    pub fn items(&self) -> usize {
        self.written.len() + self.failures.len()
    }
}

/// Which payloads a media export writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediaKind {
    /// Canvases and binaries
    #[default]
    All,
    /// Canvases only
    Images,
    /// Binaries only
    Sounds,
}

impl MediaKind {
    fn wants(self, node: &Node) -> bool {
        match node {
            Node::Canvas(_) => self != MediaKind::Sounds,
            Node::Binary(_) => self != MediaKind::Images,
            _ => false,
        }
    }
}

/// File name for the node at `relative` within an export, `root` for the export root itself
pub fn media_file_name(relative: &str, extension: &str) -> String {
    let stem = relative.trim_matches('/').replace('/', "_");
    if stem.is_empty() {
        format!("root.{extension}")
    } else {
        format!("{stem}.{extension}")
    }
}

impl Store {
    /// Decode `node`, a canvas at `location` within `root`, following a link in the same unit
    fn decode_canvas(&self, root: &Node, location: &UnitPath, node: &Node) -> Result<Bitmap> {
        let target = match link::resolve_link(root, location) {
            None => node,
            Some(resolution) => {
                resolution
                    .outcome
                    .target(root)
                    .ok_or_else(|| Error::BrokenLink {
                        path: location.to_string(),
                        reason: resolution.outcome.to_string(),
                    })?
            }
        };
        match target {
            Node::Canvas(canvas) => self.bitmaps.decode_bitmap(canvas),
            other => Err(Error::TypeMismatch {
                path: location.to_string(),
                expected: "Canvas",
                found: other.kind(),
            }),
        }
    }

    /// Write every canvas as a PNG and every binary as an audio file, down to `max_depth`
    ///
    /// Files are named after their path below `at` with `/` replaced by `_`. Nodes that fail to
    /// decode or write are recorded in the report and the export carries on.
    pub fn export_media(
        &self,
        at: &UnitPath,
        out_dir: impl AsRef<Path>,
        max_depth: Option<usize>,
    ) -> Result<ExportReport> {
        self.export_media_of(at, out_dir, max_depth, MediaKind::All)
    }

    /// [`Store::export_media`] restricted to binaries
    pub fn export_sounds(
        &self,
        at: &UnitPath,
        out_dir: impl AsRef<Path>,
        max_depth: Option<usize>,
    ) -> Result<ExportReport> {
        self.export_media_of(at, out_dir, max_depth, MediaKind::Sounds)
    }

    /// [`Store::export_media`] restricted to canvases
    pub fn export_images(
        &self,
        at: &UnitPath,
        out_dir: impl AsRef<Path>,
        max_depth: Option<usize>,
    ) -> Result<ExportReport> {
        self.export_media_of(at, out_dir, max_depth, MediaKind::Images)
    }

    #[instrument(skip(self, at, out_dir), fields(at = %at, out_dir = %out_dir.as_ref().display()), err)]
    pub fn export_media_of(
        &self,
        at: &UnitPath,
        out_dir: impl AsRef<Path>,
        max_depth: Option<usize>,
        kind: MediaKind,
    ) -> Result<ExportReport> {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir)?;

        self.read_root(at, |root| {
            let node = wz_node::path::resolve(root, &at.path)
                .ok_or_else(|| Error::NotFound(at.to_string()))?;

            let mut report = ExportReport::default();
            walk(node, "", max_depth, true, |visit: &Visit<'_>| {
                if !kind.wants(visit.node) {
                    return Flow::Continue;
                }
                let location = at.with_path(join_path(&at.path, visit.path));
                match visit.node {
                    Node::Canvas(_) => {
                        let file = out_dir.join(media_file_name(visit.path, "png"));
                        let png = self
                            .decode_canvas(root, &location, visit.node)
                            .and_then(|bitmap| bitmap.to_png());
                        report.record(&location, file, png);
                    }
                    Node::Binary(binary) => {
                        let file =
                            out_dir.join(media_file_name(visit.path, self.audio.extension()));
                        let audio = self.audio.decode_audio(binary).map(|audio| audio.data);
                        report.record(&location, file, audio);
                    }
                    _ => {}
                }
                Flow::Continue
            });
            Ok(report)
        })
    }

    /// The subtree at `at` as JSON, down to `max_depth`
    ///
    /// Every node becomes an object with its `type` and, for leaves, its `value`. Payloads are
    /// base64 encoded. Nodes below the depth limit are replaced by their child count.
    pub fn export_json(&self, at: &UnitPath, max_depth: usize) -> Result<Value> {
        self.read_node(at, |node| Ok(node_json(node, max_depth)))
    }

    /// The subtree at `at` as an XML document, down to `max_depth`
    ///
    /// Every node becomes a `property` element carrying its `name`, `type` and, for scalar
    /// leaves, its `value`. Canvas and binary payloads are left out.
    pub fn export_xml(&self, at: &UnitPath, max_depth: usize) -> Result<String> {
        let name = match path::file_name(&at.path) {
            "" => at.unit.as_str(),
            name => name,
        };
        self.read_node(at, |node| {
            let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(xml_error)?;
            write_xml(&mut writer, name, node, max_depth)?;
            String::from_utf8(writer.into_inner()).map_err(xml_error)
        })
    }

    /// Export canvases of many categories as PNG files, stopping after `max_items`
    ///
    /// Files land in `<out_dir>/<category>/<unit>/<path>.png`. An empty `categories` exports
    /// every category. Units parsed only for the export are unparsed again afterwards. Unknown
    /// categories and units that fail to parse are recorded as failures and count as items.
    #[instrument(skip(self, out_dir), err)]
    pub fn export_images_batch(
        &self,
        categories: &[String],
        out_dir: impl AsRef<Path>,
        max_items: usize,
    ) -> Result<ExportReport> {
        let names = if categories.is_empty() {
            self.categories().map(|c| c.name().to_owned()).collect()
        } else {
            categories.to_vec()
        };

        let mut report = ExportReport::default();
        'categories: for name in names {
            let category = match self.category(&name) {
                Ok(category) => category,
                Err(e) => {
                    if report.items() == max_items {
                        report.truncated = true;
                        break;
                    }
                    warn!(category = %name, "unable to export: {e}");
                    report.failures.insert(name, e.to_string());
                    continue;
                }
            };
            for unit in category.units() {
                let was_parsed = unit.is_parsed();
                let parsed = match self.ensure_parsed(unit) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        if report.items() == max_items {
                            report.truncated = true;
                            break 'categories;
                        }
                        warn!(unit = %unit.id(), "unable to export: {e}");
                        report.failures.insert(unit.id().to_string(), e.to_string());
                        continue;
                    }
                };
                let dir = out_dir
                    .as_ref()
                    .join(category.name())
                    .join(unit.name().trim_end_matches(".img").replace('/', "_"));

                {
                    let root = parsed.read();
                    walk(&root, "", None, false, |visit: &Visit<'_>| {
                        if !matches!(visit.node, Node::Canvas(_)) {
                            return Flow::Continue;
                        }
                        if report.items() == max_items {
                            report.truncated = true;
                            return Flow::Stop;
                        }
                        let location = unit.location(visit.path);
                        let png = fs::create_dir_all(&dir)
                            .map_err(Error::from)
                            .and_then(|_| self.decode_canvas(&root, &location, visit.node))
                            .and_then(|bitmap| bitmap.to_png());
                        report.record(&location, dir.join(media_file_name(visit.path, "png")), png);
                        Flow::Continue
                    });
                }

                if !was_parsed && !unit.is_dirty() {
                    self.unparse(unit);
                }
                if report.truncated {
                    break 'categories;
                }
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failures.len(),
            "batch export finished"
        );
        Ok(report)
    }
}

fn xml_error(e: impl Into<CodecSource>) -> Error {
    Error::codec("xml export", e)
}

fn write_xml<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    node: &Node,
    depth: usize,
) -> Result<()> {
    let kind = node.kind().to_string();
    let mut element = BytesStart::new("property");
    element.push_attribute(("name", name));
    element.push_attribute(("type", kind.as_str()));
    let value = match node {
        Node::Container(_) | Node::Canvas(_) | Node::Binary(_) => None,
        other => other.value_text(),
    };
    if let Some(value) = &value {
        element.push_attribute(("value", value.as_str()));
    }

    let children = node.children().filter(|c| !c.is_empty());
    match children {
        Some(children) if depth > 0 => {
            writer.write_event(Event::Start(element)).map_err(xml_error)?;
            for (child_name, child) in children.iter() {
                write_xml(writer, child_name, child, depth - 1)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("property")))
                .map_err(xml_error)?;
        }
        Some(children) => {
            let count = children.len().to_string();
            element.push_attribute(("truncated", "true"));
            element.push_attribute(("childCount", count.as_str()));
            writer.write_event(Event::Empty(element)).map_err(xml_error)?;
        }
        None => writer.write_event(Event::Empty(element)).map_err(xml_error)?,
    }
    Ok(())
}

fn node_json(node: &Node, depth: usize) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), json!(node.kind()));
    let value = match node {
        Node::Null | Node::Container(_) => None,
        Node::Int16(v) => Some(json!(v)),
        Node::Int32(v) => Some(json!(v)),
        Node::Int64(v) => Some(json!(v)),
        Node::Float32(v) => Some(json!(v)),
        Node::Float64(v) => Some(json!(v)),
        Node::String(s) | Node::Link(s) => Some(json!(s)),
        Node::Vector2(v) => Some(json!({ "x": v.x, "y": v.y })),
        Node::Canvas(c) => Some(json!({
            "width": c.width,
            "height": c.height,
            "payload": STANDARD.encode(&c.payload),
        })),
        Node::Binary(b) => Some(json!({
            "length": b.length,
            "frequency": b.frequency,
            "payload": STANDARD.encode(&b.payload),
        })),
    };
    if let Some(value) = value {
        object.insert("value".into(), value);
    }

    if let Some(children) = node.children().filter(|c| !c.is_empty()) {
        if depth == 0 {
            object.insert("truncated".into(), json!(true));
            object.insert("childCount".into(), json!(children.len()));
        } else {
            let children = children
                .iter()
                .map(|(name, child)| (name.clone(), node_json(child, depth - 1)))
                .collect::<Map<_, _>>();
            object.insert("children".into(), Value::Object(children));
        }
    }
    Value::Object(object)
}
