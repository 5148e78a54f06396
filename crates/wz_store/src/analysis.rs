//! Validation, broken link scans, summaries and diffs

use derive_more::derive::Display;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use wz_node::{
    diff, link, walk, Difference, Flow, LinkKind, LinkOutcome, Node, NodeKind, UnitPath, Visit,
};

use crate::error::{Error, Result};
use crate::manifest::CategoryManifest;
use crate::media::BitmapCodec;
use crate::query::Scope;
use crate::stats::CacheSnapshot;
use crate::store::Store;

/// Depth used by [`Store::validate`] when none is given
pub const DEFAULT_VALIDATION_DEPTH: usize = 20;
/// Units a [`Store::category_summary`] looks into
pub const SUMMARY_SAMPLE: usize = 100;
const SUMMARY_PROPERTY_DEPTH: usize = 5;
const SUMMARY_MEDIA_DEPTH: usize = 10;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub path: String,
    pub severity: Severity,
    pub message: String,
}

/// Nodes seen by a validation, per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total: usize,
    pub containers: usize,
    pub canvases: usize,
    pub binaries: usize,
    pub links: usize,
    pub strings: usize,
    pub ints: usize,
    pub floats: usize,
    pub vectors: usize,
    pub nulls: usize,
}

impl ValidationStats {
    fn count(&mut self, node: &Node) {
        self.total += 1;
        let slot = match node.kind() {
            NodeKind::Container => &mut self.containers,
            NodeKind::Canvas => &mut self.canvases,
            NodeKind::Binary => &mut self.binaries,
            NodeKind::Link => &mut self.links,
            NodeKind::String => &mut self.strings,
            NodeKind::Int16 | NodeKind::Int32 | NodeKind::Int64 => &mut self.ints,
            NodeKind::Float32 | NodeKind::Float64 => &mut self.floats,
            NodeKind::Vector2 => &mut self.vectors,
            NodeKind::Null => &mut self.nulls,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub location: UnitPath,
    pub stats: ValidationStats,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.issues.len() - self.errors()
    }
}

/// Check the subtree `node`, which lives at `origin` within the unit tree `root`
///
/// Links are resolved against `root`. Links into other units are not followed and are not issues.
pub fn validate_tree(
    root: &Node,
    origin: &UnitPath,
    max_depth: usize,
    bitmaps: &dyn BitmapCodec,
) -> (ValidationStats, Vec<Issue>) {
    let mut stats = ValidationStats::default();
    let mut issues = Vec::new();
    let Some(node) = wz_node::path::resolve(root, &origin.path) else {
        return (stats, issues);
    };

    walk(node, &origin.path, Some(max_depth), true, |visit: &Visit<'_>| {
        stats.count(visit.node);
        let mut issue = |severity, message| {
            issues.push(Issue {
                path: visit.path.to_owned(),
                severity,
                message,
            })
        };

        if link::link_of(visit.node).is_some() {
            if let Some(resolution) = link::resolve_link(root, &origin.with_path(visit.path)) {
                if resolution.outcome.is_broken() {
                    issue(
                        Severity::Error,
                        format!("link '{}' {}", resolution.raw, resolution.outcome),
                    );
                }
            }
            return Flow::Continue;
        }

        match visit.node {
            Node::Canvas(canvas) => {
                if let Err(e) = bitmaps.decode_bitmap(canvas) {
                    issue(Severity::Error, format!("bitmap does not decode: {e}"));
                }
            }
            Node::Binary(binary) if binary.length == 0 => {
                issue(Severity::Warning, "sound has a length of zero".into());
            }
            _ => {}
        }
        Flow::Continue
    });

    (stats, issues)
}

/// A link that does not lead anywhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLink {
    pub location: UnitPath,
    pub raw: String,
    pub kind: LinkKind,
    pub outcome: LinkOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLinkReport {
    pub links: Vec<BrokenLink>,
    pub units_scanned: usize,
    pub links_checked: usize,
    /// Whether the scan stopped at its limit
    pub truncated: bool,
    /// Units that could not be parsed, with the reason
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub skipped: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub units: usize,
    pub subdirectories: Vec<String>,
    pub parsed_units: usize,
    /// Units the property counts below were taken from
    pub sampled_units: usize,
    pub properties: usize,
    pub canvases: usize,
    pub sounds: usize,
    pub manifest: Option<CategoryManifest>,
    /// Sampled units that could not be parsed, with the reason
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub skipped: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatistics {
    pub name: String,
    pub units: usize,
    pub parsed_units: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveStatistics {
    pub name: String,
    pub total_units: usize,
    pub categories: Vec<CategoryStatistics>,
    pub cache: CacheSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub display_name: Option<String>,
    pub source_region: Option<String>,
    #[serde(rename = "isPreBB")]
    pub is_pre_bb: bool,
    #[serde(rename = "is64Bit")]
    pub is_64_bit: bool,
}

impl Store {
    /// Validate the subtree at `at` down to `max_depth`
    #[instrument(skip(self, at), fields(at = %at), err)]
    pub fn validate(&self, at: &UnitPath, max_depth: Option<usize>) -> Result<ValidationReport> {
        let max_depth = max_depth.unwrap_or(DEFAULT_VALIDATION_DEPTH);
        let (stats, issues) = self.read_root(at, |root| {
            if wz_node::path::resolve(root, &at.path).is_none() {
                return Err(Error::NotFound(at.to_string()));
            }
            Ok(validate_tree(root, at, max_depth, self.bitmaps.as_ref()))
        })?;
        debug!(nodes = stats.total, issues = issues.len(), "validated");
        Ok(ValidationReport {
            location: at.clone(),
            stats,
            issues,
        })
    }

    /// Scan `scope` for links that do not resolve, stopping after `max` of them
    ///
    /// Links into other units are checked only with
    /// [`crate::StoreOptions::follow_cross_unit_links`]; a link into a unit that fails to parse
    /// counts as broken. Units of `scope` that fail to parse are listed in
    /// [`BrokenLinkReport::skipped`], and units parsed only for the scan are unparsed again.
    #[instrument(skip(self), err)]
    pub fn find_broken_links(&self, scope: &Scope, max: usize) -> Result<BrokenLinkReport> {
        let mut report = BrokenLinkReport {
            links: Vec::new(),
            units_scanned: 0,
            links_checked: 0,
            truncated: false,
            skipped: IndexMap::new(),
        };

        for unit in self.units_in_scope(scope)? {
            let was_parsed = unit.is_parsed();
            let parsed = match self.ensure_parsed(&unit) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(unit = %unit.id(), "skipping unit: {e}");
                    report.skipped.insert(unit.id().to_string(), e.to_string());
                    continue;
                }
            };
            report.units_scanned += 1;

            let mut found = Vec::new();
            {
                let root = parsed.read();
                walk(&root, "", None, false, |visit: &Visit<'_>| {
                    if link::link_of(visit.node).is_none() {
                        return Flow::Continue;
                    }
                    let location = unit.location(visit.path);
                    if let Some(resolution) = link::resolve_link(&root, &location) {
                        found.push((location, resolution));
                    }
                    Flow::Continue
                });
            }

            for (location, resolution) in found {
                report.links_checked += 1;
                let outcome = match resolution.outcome {
                    LinkOutcome::CrossUnit(reference) if self.options.follow_cross_unit_links => {
                        match self.resolve_cross_unit(&reference) {
                            Ok((outcome, _)) => outcome,
                            Err(e) => {
                                debug!(%location, "link target does not parse: {e}");
                                LinkOutcome::Broken {
                                    path: reference.to_string(),
                                }
                            }
                        }
                    }
                    other => other,
                };
                if !outcome.is_broken() {
                    continue;
                }
                if report.links.len() == max {
                    report.truncated = true;
                    break;
                }
                report.links.push(BrokenLink {
                    location,
                    raw: resolution.raw,
                    kind: resolution.kind,
                    outcome,
                });
            }

            if !was_parsed && !unit.is_dirty() {
                self.unparse(&unit);
            }
            if report.truncated {
                break;
            }
        }

        Ok(report)
    }

    /// Describe a category by sampling up to 100 of its units
    ///
    /// Units parsed only for the summary are unparsed again afterwards. Sampled units that fail
    /// to parse are listed in [`CategorySummary::skipped`].
    #[instrument(skip(self), err)]
    pub fn category_summary(&self, category: &str) -> Result<CategorySummary> {
        let entry = self.category(category)?;
        let mut summary = CategorySummary {
            name: entry.name().to_owned(),
            units: entry.len(),
            subdirectories: entry
                .subdirectories()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            parsed_units: entry.units().filter(|u| u.is_parsed()).count(),
            sampled_units: 0,
            properties: 0,
            canvases: 0,
            sounds: 0,
            manifest: self
                .manifest()
                .categories
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(entry.name()))
                .map(|(_, m)| m.clone()),
            skipped: IndexMap::new(),
        };

        for unit in entry.units().take(SUMMARY_SAMPLE) {
            let was_parsed = unit.is_parsed();
            let parsed = match self.ensure_parsed(unit) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(unit = %unit.id(), "skipping unit: {e}");
                    summary.skipped.insert(unit.id().to_string(), e.to_string());
                    continue;
                }
            };
            summary.sampled_units += 1;

            walk(
                &parsed.read(),
                "",
                Some(SUMMARY_MEDIA_DEPTH),
                false,
                |visit: &Visit<'_>| {
                    if visit.depth <= SUMMARY_PROPERTY_DEPTH {
                        summary.properties += 1;
                    }
                    match visit.node {
                        Node::Canvas(_) => summary.canvases += 1,
                        Node::Binary(_) => summary.sounds += 1,
                        _ => {}
                    }
                    Flow::Continue
                },
            );

            if !was_parsed && !unit.is_dirty() {
                self.unparse(unit);
            }
        }

        Ok(summary)
    }

    /// Unit counts per category and the cache counters
    pub fn statistics(&self) -> ArchiveStatistics {
        let categories = self
            .categories()
            .map(|c| CategoryStatistics {
                name: c.name().to_owned(),
                units: c.len(),
                parsed_units: c.units().filter(|u| u.is_parsed()).count(),
            })
            .collect::<Vec<_>>();
        ArchiveStatistics {
            name: self.name().to_owned(),
            total_units: categories.iter().map(|c| c.units).sum(),
            categories,
            cache: self.stats(),
        }
    }

    pub fn version_info(&self) -> VersionInfo {
        let manifest = self.manifest();
        VersionInfo {
            name: self.name().to_owned(),
            version: manifest.version.clone(),
            display_name: manifest.display_name.clone(),
            source_region: manifest.source_region.clone(),
            is_pre_bb: manifest.is_pre_bb,
            is_64_bit: manifest.is_64_bit,
        }
    }

    /// Structural differences between two nodes, possibly in different units
    pub fn diff_nodes(
        &self,
        first: &UnitPath,
        second: &UnitPath,
        max_depth: usize,
    ) -> Result<Vec<Difference>> {
        let left = self.read_node(first, |node| Ok(node.clone()))?;
        self.read_node(second, |right| Ok(diff(&left, right, max_depth)))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use wz_node::{Binary, Canvas, Container, Node, UnitPath};

    use crate::analysis::{validate_tree, Severity};
    use crate::media::RawBitmapCodec;

    #[test]
    fn canvas_links_are_checked_as_links() {
        let mut linked = Canvas::new(4, 4, vec![]);
        linked
            .children
            .insert("_inlink", Node::String("icon".into()))
            .ok();
        let mut dangling = Canvas::new(4, 4, vec![]);
        dangling
            .children
            .insert("_inlink", Node::String("missing".into()))
            .ok();
        let root = Node::Container(
            Container::new()
                .with("icon", Node::Canvas(Canvas::new(2, 2, vec![1, 2, 3])))
                .with("iconRaw", Node::Canvas(linked))
                .with("iconMouseOver", Node::Canvas(dangling)),
        );

        let (stats, issues) = validate_tree(&root, &UnitPath::local(""), 20, &RawBitmapCodec);

        assert_eq!(stats.canvases, 3);
        assert_eq!(stats.strings, 2);
        let paths = issues.iter().map(|i| i.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["icon", "iconMouseOver"]);
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn zero_length_sound_is_a_warning() {
        let root = Node::Container(Container::new().with(
            "bgm",
            Node::Binary(Binary {
                length: 0,
                frequency: 44100,
                payload: vec![1],
            }),
        ));

        let (stats, issues) = validate_tree(&root, &UnitPath::local(""), 20, &RawBitmapCodec);

        assert_eq!(stats.binaries, 1);
        assert_eq!(stats.total, 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }
}
