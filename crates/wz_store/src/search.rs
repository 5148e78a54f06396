//! Bounded search by name or value

use bon::Builder;
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, instrument, warn};
use wz_node::{walk, Flow, Node, NodeKind, Visit, Walk};

use crate::error::{Error, Result};
use crate::query::Scope;
use crate::store::Store;

/// Matches returned when a query does not say otherwise
pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Upper bound on [`SearchQuery::max_results`]
pub const MAX_RESULTS: usize = 200;

/// What a search compares its pattern against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SearchKind {
    /// Node names, with `*` and `?` wildcards
    #[default]
    Name,
    /// Case insensitive substring of scalar values
    Value,
    /// Either of the above
    Both,
}

impl FromStr for SearchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SearchKind::Name),
            "value" => Ok(SearchKind::Value),
            "both" | "any" => Ok(SearchKind::Both),
            _ => Err(Error::InvalidArgument(format!("unknown search kind '{s}'"))),
        }
    }
}

/// A search request
///
/// ```
/// use wz_store::{SearchKind, SearchQuery};
///
/// let query = SearchQuery::builder()
///     .pattern("icon*")
///     .kind(SearchKind::Name)
///     .max_results(10)
///     .build();
///
/// assert!(!query.compact);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct SearchQuery {
    #[builder(into)]
    pub pattern: String,
    #[builder(default)]
    pub kind: SearchKind,
    /// Only nodes of this kind can match; other nodes are still descended into
    pub type_filter: Option<NodeKind>,
    /// Report locations only
    #[builder(default)]
    pub compact: bool,
    #[builder(default = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,
}

/// A matching node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub category: String,
    pub unit: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub matches: Vec<SearchMatch>,
    /// Whether more matches existed beyond the ones returned
    pub truncated: bool,
    pub units_searched: usize,
    /// Units that could not be parsed, with the reason
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub skipped: IndexMap<String, String>,
}

/// Compile a `*` / `?` wildcard pattern into an anchored, case insensitive expression
pub fn wildcard(pattern: &str) -> Result<Regex> {
    let mut expression = String::with_capacity(pattern.len() + 2);
    expression.push('^');
    let mut literal = [0; 4];
    for c in pattern.chars() {
        match c {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            other => expression.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    expression.push('$');

    RegexBuilder::new(&expression)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidArgument(format!("invalid pattern '{pattern}': {e}")))
}

struct Matcher {
    name: Option<Regex>,
    value: Option<String>,
    type_filter: Option<NodeKind>,
}

impl Matcher {
    fn new(query: &SearchQuery) -> Result<Self> {
        let by_name = matches!(query.kind, SearchKind::Name | SearchKind::Both);
        let by_value = matches!(query.kind, SearchKind::Value | SearchKind::Both);
        Ok(Self {
            name: if by_name {
                Some(wildcard(&query.pattern)?)
            } else {
                None
            },
            value: by_value.then(|| query.pattern.to_lowercase()),
            type_filter: query.type_filter,
        })
    }

    fn matches(&self, name: &str, node: &Node) -> bool {
        if self.type_filter.is_some_and(|kind| kind != node.kind()) {
            return false;
        }
        self.name.as_ref().is_some_and(|re| re.is_match(name))
            || self.value.as_ref().is_some_and(|needle| {
                node.search_text()
                    .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            })
    }
}

impl Store {
    /// Search every unit of `scope`, parsing them as needed
    ///
    /// Stops at `max_results` matches. `truncated` is set only when a further match was found.
    /// Units that fail to parse are listed in [`SearchResults::skipped`], and units parsed only
    /// for the search are unparsed again afterwards.
    #[instrument(skip(self, query), fields(pattern = %query.pattern), err)]
    pub fn search(&self, scope: &Scope, query: &SearchQuery) -> Result<SearchResults> {
        if query.pattern.is_empty() {
            return Err(Error::InvalidArgument("search pattern is empty".into()));
        }
        if query.max_results == 0 {
            return Err(Error::InvalidArgument(
                "max_results must be at least 1".into(),
            ));
        }
        let limit = query.max_results.min(MAX_RESULTS);
        let matcher = Matcher::new(query)?;

        let mut results = SearchResults {
            matches: Vec::new(),
            truncated: false,
            units_searched: 0,
            skipped: IndexMap::new(),
        };
        for unit in self.units_in_scope(scope)? {
            let was_parsed = unit.is_parsed();
            let parsed = match self.ensure_parsed(&unit) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(unit = %unit.id(), "skipping unit: {e}");
                    results.skipped.insert(unit.id().to_string(), e.to_string());
                    continue;
                }
            };
            results.units_searched += 1;

            let root = parsed.read();
            let outcome = walk(&root, "", None, false, |visit: &Visit<'_>| {
                if !matcher.matches(visit.name, visit.node) {
                    return Flow::Continue;
                }
                if results.matches.len() == limit {
                    results.truncated = true;
                    return Flow::Stop;
                }
                results.matches.push(SearchMatch {
                    category: unit.category().to_owned(),
                    unit: unit.name().to_owned(),
                    path: visit.path.to_owned(),
                    name: (!query.compact).then(|| visit.name.to_owned()),
                    kind: (!query.compact).then(|| visit.node.kind()),
                    value: if query.compact {
                        None
                    } else {
                        visit.node.value_text()
                    },
                });
                Flow::Continue
            });
            drop(root);

            if !was_parsed && !unit.is_dirty() {
                self.unparse(&unit);
            }
            if outcome == Walk::Stopped {
                break;
            }
        }

        debug!(
            matches = results.matches.len(),
            truncated = results.truncated,
            "search finished"
        );
        Ok(results)
    }
}
