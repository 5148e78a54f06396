mod common;

use pretty_assertions::assert_eq;
use tracing_test::traced_test;
use wz_node::{DifferenceKind, LinkKind};
use wz_store::{
    error::{Error, Result},
    NodeKind, Scope, SearchKind, SearchQuery, Severity, StoreOptions, UnitPath,
};

#[traced_test]
#[test]
fn search_stops_at_max_results() -> Result<()> {
    let (_, store) = common::store()?;
    let scope = Scope::Category("String".into());

    for (max, expected, truncated) in [(1, 1, true), (2, 2, true), (3, 3, false), (50, 3, false)] {
        let query = SearchQuery::builder()
            .pattern("name")
            .max_results(max)
            .build();
        let results = store.search(&scope, &query)?;
        assert_eq!(results.matches.len(), expected, "max_results {max}");
        assert_eq!(results.truncated, truncated, "max_results {max}");
    }

    let query = SearchQuery::builder().pattern("name").max_results(0).build();
    assert!(matches!(
        store.search(&scope, &query),
        Err(Error::InvalidArgument(_))
    ));

    Ok(())
}

#[traced_test]
#[test]
fn search_by_wildcard_name() -> Result<()> {
    let (_, store) = common::store()?;
    let query = SearchQuery::builder().pattern("1001?0").build();

    let results = store.search(&Scope::unit("String", "Mob"), &query)?;
    let paths = results
        .matches
        .iter()
        .map(|m| m.path.as_str())
        .collect::<Vec<_>>();
    assert_eq!(paths, vec!["100100", "100120"]);
    assert_eq!(results.matches[0].kind, Some(NodeKind::Container));
    assert_eq!(results.units_searched, 1);

    Ok(())
}

#[traced_test]
#[test]
fn search_by_value_ignores_case_and_filters_kinds() -> Result<()> {
    let (_, store) = common::store()?;

    let query = SearchQuery::builder()
        .pattern("SNAIL")
        .kind(SearchKind::Value)
        .build();
    let results = store.search(&Scope::Archive, &query)?;
    let found = results
        .matches
        .iter()
        .map(|m| (m.unit.as_str(), m.path.as_str(), m.value.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(
        found,
        vec![
            ("Mob.img", "100100/name", Some("Snail")),
            ("Mob.img", "100101/name", Some("Blue Snail")),
        ]
    );
    assert_eq!(results.units_searched, 5);

    let filtered = SearchQuery::builder()
        .pattern("snail")
        .kind(SearchKind::Value)
        .type_filter(NodeKind::Int32)
        .build();
    assert!(store.search(&Scope::Archive, &filtered)?.matches.is_empty());

    let numbers = SearchQuery::builder()
        .pattern("999")
        .kind(SearchKind::Both)
        .type_filter(NodeKind::Int32)
        .compact(true)
        .build();
    let results = store.search(&Scope::Archive, &numbers)?;
    assert_eq!(results.matches.len(), 1);
    let hit = &results.matches[0];
    assert_eq!(
        (hit.category.as_str(), hit.path.as_str()),
        ("Map", "info/returnMap")
    );
    assert_eq!((&hit.name, &hit.kind, &hit.value), (&None, &None, &None));

    Ok(())
}

#[traced_test]
#[test]
fn search_restores_parse_state() -> Result<()> {
    let (_, store) = common::store()?;
    store.preload("String")?;
    let before = store.parsed_units();

    let query = SearchQuery::builder().pattern("level").build();
    let results = store.search(&Scope::Archive, &query)?;
    assert_eq!(results.matches.len(), 1);
    assert_eq!(results.units_searched, 5);
    assert!(results.skipped.is_empty());
    assert_eq!(store.parsed_units(), before);

    store.set_value(&UnitPath::new("Skill", "000.img", "hp"), "1")?;
    store.search(&Scope::Archive, &query)?;
    let parsed = store
        .parsed_units()
        .into_iter()
        .map(|u| (u.category, u.dirty))
        .collect::<Vec<_>>();
    assert_eq!(
        parsed,
        vec![("Skill".to_owned(), true), ("String".to_owned(), false)]
    );

    Ok(())
}

#[traced_test]
#[test]
fn zero_length_sound_is_one_warning() -> Result<()> {
    let (_, store) = common::store()?;
    let report = store.validate(&UnitPath::new("Sound", "Bgm00.img", "FloralLife"), None)?;

    assert_eq!(report.stats.binaries, 1);
    assert_eq!(report.stats.total, 1);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::Warning);
    assert_eq!(report.issues[0].path, "FloralLife");
    assert_eq!(report.warnings(), 1);
    assert!(!report.is_valid());

    Ok(())
}

#[traced_test]
#[test]
fn validation_counts_kinds_and_checks_links() -> Result<()> {
    let (_, store) = common::store()?;

    let map = store.validate(&UnitPath::new("Map", "Map0/100000000", ""), None)?;
    assert!(map.is_valid(), "{:?}", map.issues);
    assert_eq!(map.stats.canvases, 2);
    assert!(!store.get_unit("Mob", "0100100.img")?.is_parsed());

    let mob = store.validate(&UnitPath::new("Mob", "0100100.img", ""), None)?;
    assert!(mob.is_valid(), "{:?}", mob.issues);
    assert_eq!(mob.stats.containers, 4);
    assert_eq!(mob.stats.canvases, 2);
    assert_eq!(mob.stats.links, 1);
    assert_eq!(mob.stats.ints, 2);
    assert_eq!(mob.stats.floats, 1);
    assert_eq!(mob.stats.vectors, 1);
    assert_eq!(mob.stats.strings, 1);

    let shallow = store.validate(&UnitPath::new("Mob", "0100100.img", ""), Some(1))?;
    assert_eq!(shallow.stats.total, 4);

    Ok(())
}

#[traced_test]
#[test]
fn broken_links_across_the_archive() -> Result<()> {
    let (_, store) = common::store()?;
    let report = store.find_broken_links(&Scope::Archive, 10)?;
    assert!(report.links.is_empty());
    assert_eq!(report.units_scanned, 5);
    assert_eq!(report.links_checked, 6);

    let (_, store) = common::store_with(
        StoreOptions::builder()
            .follow_cross_unit_links(true)
            .build(),
    )?;
    let report = store.find_broken_links(&Scope::Category("Map".into()), 10)?;
    let broken = report
        .links
        .iter()
        .map(|l| (l.location.path.as_str(), l.kind))
        .collect::<Vec<_>>();
    assert_eq!(
        broken,
        vec![("back/1", LinkKind::OutLink), ("portal/0", LinkKind::Uol)]
    );
    assert!(!report.truncated);

    let capped = store.find_broken_links(&Scope::Category("Map".into()), 1)?;
    assert_eq!(capped.links.len(), 1);
    assert!(capped.truncated);

    Ok(())
}

#[traced_test]
#[test]
fn diff_across_units_is_symmetric() -> Result<()> {
    let (_, store) = common::store()?;
    let snail = UnitPath::new("String", "Mob.img", "100100");
    let tino = UnitPath::new("String", "Mob.img", "100120");

    let forward = store.diff_nodes(&snail, &tino, 5)?;
    let summary = forward
        .iter()
        .map(|d| (d.path.as_str(), d.kind))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("name", DifferenceKind::ValueDifference),
            ("origin", DifferenceKind::OnlyInSecond),
        ]
    );

    let mut backward = store
        .diff_nodes(&tino, &snail, 5)?
        .into_iter()
        .map(|d| d.swap())
        .collect::<Vec<_>>();
    backward.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(backward, forward);

    let across = store.diff_nodes(
        &UnitPath::new("Skill", "000.img", "hp"),
        &UnitPath::new("Mob", "0100100.img", "info/maxHP"),
        5,
    )?;
    assert_eq!(across.len(), 1);
    assert_eq!(across[0].first.as_deref(), Some("100"));
    assert_eq!(across[0].second.as_deref(), Some("8"));

    Ok(())
}

#[traced_test]
#[test]
fn category_summary_restores_parse_state() -> Result<()> {
    let (_, store) = common::store()?;
    let summary = store.category_summary("mob")?;

    assert_eq!(summary.name, "Mob");
    assert_eq!(summary.units, 1);
    assert_eq!(summary.sampled_units, 1);
    assert_eq!(summary.parsed_units, 0);
    assert_eq!(summary.canvases, 2);
    assert_eq!(summary.sounds, 0);
    assert_eq!(summary.properties, 11);
    assert!(!store.get_unit("Mob", "0100100.img")?.is_parsed());

    let map = store.category_summary("Map")?;
    assert_eq!(map.subdirectories, vec!["Map0"]);

    Ok(())
}

#[traced_test]
#[test]
fn statistics_and_version() -> Result<()> {
    let (_, store) = common::store()?;
    store.preload("String")?;

    let statistics = store.statistics();
    assert_eq!(statistics.total_units, 5);
    assert_eq!(statistics.categories.len(), 5);
    let strings = statistics
        .categories
        .iter()
        .find(|c| c.name == "String")
        .map(|c| c.parsed_units);
    assert_eq!(strings, Some(1));
    assert_eq!(statistics.cache.cached_units, 1);
    assert!(statistics.cache.memory_bytes > 0);

    let version = store.version_info();
    assert_eq!(version.name, "fixture");
    assert_eq!(version.version, "unknown");
    assert_eq!(version.display_name.as_deref(), Some("fixture"));

    Ok(())
}
