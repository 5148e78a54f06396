//! Category and unit index built without parsing anything

use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::source::UnitSource;
use crate::unit::{Unit, UnitId};

/// A named namespace of units
#[derive(Debug)]
pub struct Category {
    name: String,
    units: IndexMap<String, Arc<Unit>>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> impl Iterator<Item = &Arc<Unit>> {
        self.units.values()
    }

    /// Distinct subdirectories holding units, in index order
    pub fn subdirectories(&self) -> Vec<&str> {
        self.units
            .values()
            .map(|u| u.id().subdirectory())
            .filter(|d| !d.is_empty())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Locate a unit by name
    ///
    /// Names are matched ignoring case, the `.img` suffix is optional, and a unit in a
    /// subdirectory can be named without its directory as long as the name is unambiguous.
    pub fn find(&self, name: &str) -> Result<&Arc<Unit>> {
        let wanted = normalize_unit_name(name);
        if let Some(unit) = self.units.get(&wanted) {
            return Ok(unit);
        }

        if !wanted.contains('/') {
            let mut matches = self
                .units
                .iter()
                .filter(|(key, _)| key.rsplit('/').next() == Some(wanted.as_str()))
                .map(|(_, unit)| unit);
            match (matches.next(), matches.next()) {
                (Some(unit), None) => return Ok(unit),
                (Some(_), Some(_)) => {
                    return Err(Error::InvalidArgument(format!(
                        "unit name '{name}' is ambiguous in {}, include its directory",
                        self.name
                    )))
                }
                _ => {}
            }
        }

        Err(Error::NotFound(format!("unit '{name}' in {}", self.name)))
    }
}

/// Lowercase, `/` separated, with the `.img` suffix
fn normalize_unit_name(name: &str) -> String {
    let mut normalized = name.replace('\\', "/").trim_matches('/').to_ascii_lowercase();
    if !normalized.ends_with(".img") {
        normalized.push_str(".img");
    }
    normalized
}

/// Every category and unit of an archive
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    categories: IndexMap<String, Category>,
}

impl ArchiveIndex {
    /// List the categories and units of a source
    #[instrument(skip_all, err)]
    pub fn build(source: &dyn UnitSource) -> Result<Self> {
        let mut categories = IndexMap::new();
        for name in source.categories()? {
            let units = source
                .units(&name)?
                .into_iter()
                .map(|unit| {
                    let unit = Arc::new(Unit::new(UnitId::new(&name, unit)));
                    (normalize_unit_name(unit.name()), unit)
                })
                .collect();
            categories.insert(name.to_ascii_lowercase(), Category { name, units });
        }

        let index = Self { categories };
        info!(
            categories = index.categories.len(),
            units = index.len(),
            "indexed archive"
        );
        Ok(index)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Locate a category ignoring case
    pub fn category(&self, name: &str) -> Result<&Category> {
        self.categories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::NotFound(format!("category '{name}'")))
    }

    /// Locate a unit, see [`Category::find`]
    pub fn find(&self, category: &str, unit: &str) -> Result<&Arc<Unit>> {
        self.category(category)?.find(unit)
    }

    /// Every unit of every category
    pub fn units(&self) -> impl Iterator<Item = &Arc<Unit>> {
        self.categories.values().flat_map(Category::units)
    }

    /// Total number of units
    pub fn len(&self) -> usize {
        self.categories.values().map(Category::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::index::ArchiveIndex;
    use crate::source::MemorySource;

    fn index() -> Result<ArchiveIndex> {
        let source = MemorySource::new("test")
            .with_unit("Map", "Map0/100000000.img", vec![])
            .with_unit("Map", "Map1/100000000.img", vec![])
            .with_unit("Map", "Map1/101000000.img", vec![])
            .with_unit("String", "Mob.img", vec![])
            .with_category("Sound");
        ArchiveIndex::build(&source)
    }

    #[test]
    fn lookup_ignores_case_and_suffix() -> Result<()> {
        let index = index()?;

        assert_eq!(index.find("string", "mob")?.name(), "Mob.img");
        assert_eq!(index.find("STRING", "Mob.IMG")?.name(), "Mob.img");
        assert_eq!(
            index.find("Map", "map1/101000000")?.name(),
            "Map1/101000000.img"
        );
        assert_eq!(index.find("Map", "101000000.img")?.name(), "Map1/101000000.img");

        Ok(())
    }

    #[test]
    fn ambiguous_and_missing_names() -> Result<()> {
        let index = index()?;

        assert!(matches!(
            index.find("Map", "100000000.img"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(index.find("Map", "999.img"), Err(Error::NotFound(_))));
        assert!(matches!(index.find("Etc", "x.img"), Err(Error::NotFound(_))));

        Ok(())
    }

    #[test]
    fn categories_and_subdirectories() -> Result<()> {
        let index = index()?;

        let names = index.categories().map(|c| c.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Map", "String", "Sound"]);
        assert_eq!(index.len(), 4);

        let map = index.category("map")?;
        assert_eq!(map.subdirectories(), vec!["Map0", "Map1"]);
        assert!(index.category("Sound")?.is_empty());

        Ok(())
    }
}
