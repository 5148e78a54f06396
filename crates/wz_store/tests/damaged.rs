mod common;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tracing_test::traced_test;
use wz_store::{
    error::{Error, Result},
    Scope, SearchQuery, Severity, UnitPath,
};

#[traced_test]
#[test]
fn oversized_canvas_is_a_validation_issue() -> Result<()> {
    let store = common::damaged_store()?;
    let unit = UnitPath::new("Mob", "0100101.img", "");

    let report = store.validate(&unit, None)?;
    assert_eq!(report.stats.canvases, 1);
    assert_eq!(report.errors(), 1);
    assert_eq!(report.issues[0].path, "stand/0");
    assert_eq!(report.issues[0].severity, Severity::Error);

    assert!(matches!(
        store.canvas_bitmap(&unit.with_path("stand/0")),
        Err(Error::CodecError { .. })
    ));

    Ok(())
}

#[traced_test]
#[test]
fn search_skips_units_that_do_not_parse() -> Result<()> {
    let store = common::damaged_store()?;
    let query = SearchQuery::builder().pattern("origin").build();

    let results = store.search(&Scope::Archive, &query)?;
    let found = results
        .matches
        .iter()
        .map(|m| (m.unit.as_str(), m.path.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(found, vec![("0100100.img", "stand/0/origin")]);
    assert_eq!(results.units_searched, 2);
    assert_eq!(
        results.skipped.keys().collect::<Vec<_>>(),
        vec!["Mob/0bad.img"]
    );
    assert!(store.parsed_units().is_empty());

    Ok(())
}

#[traced_test]
#[test]
fn scans_and_summaries_skip_units_that_do_not_parse() -> Result<()> {
    let store = common::damaged_store()?;

    let links = store.find_broken_links(&Scope::Category("Mob".into()), 10)?;
    assert!(links.links.is_empty());
    assert_eq!(links.units_scanned, 2);
    assert_eq!(links.links_checked, 2);
    assert_eq!(links.skipped.keys().collect::<Vec<_>>(), vec!["Mob/0bad.img"]);

    let summary = store.category_summary("Mob")?;
    assert_eq!(summary.units, 3);
    assert_eq!(summary.sampled_units, 2);
    assert_eq!(summary.canvases, 3);
    assert_eq!(summary.skipped.keys().collect::<Vec<_>>(), vec!["Mob/0bad.img"]);
    assert!(store.parsed_units().is_empty());

    Ok(())
}

#[traced_test]
#[test]
fn batch_export_records_unreadable_units_and_carries_on() -> Result<()> {
    let store = common::damaged_store()?;
    let out = TempDir::new()?;
    let categories = vec!["Mob".to_owned(), "Etc".to_owned()];

    let report = store.export_images_batch(&categories, out.path(), 100)?;
    assert_eq!(report.written.len(), 2);
    assert!(out.path().join("Mob/0100100/stand_1.png").is_file());
    assert_eq!(
        report.failures.keys().collect::<Vec<_>>(),
        vec!["Mob/0bad.img", "Mob/0100101.img/stand/0", "Etc"]
    );
    assert!(!report.truncated);

    let capped = store.export_images_batch(&[], TempDir::new()?.path(), 1)?;
    assert!(capped.written.is_empty());
    assert_eq!(capped.items(), 1);
    assert!(capped.truncated);

    Ok(())
}
