mod common;

use pretty_assertions::assert_eq;
use std::{fs, path::Path};
use tempfile::TempDir;
use tracing_test::traced_test;
use walkdir::WalkDir;
use wz_store::{
    error::{Error, Result},
    manifest::CategoryManifest,
    media::Bitmap,
    NodeKind, Store, StoreOptions, UnitPath,
};

const MANIFEST: &str = r#"{
    "version": "v83",
    "displayName": "GMS v83",
    "sourceRegion": "GMS",
    "isPreBB": true,
    "categories": { "Mob": { "fileCount": 1 } }
}"#;

fn write_unit(root: &Path, category: &str, unit: &str, bytes: &[u8]) -> Result<()> {
    let path = root.join(category).join(unit);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// The fixture archive extracted to `<tmp>/v83`
fn extracted() -> Result<(TempDir, std::path::PathBuf)> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("v83");
    write_unit(&root, "Mob", "0100100.img", &common::encode(&common::mob_unit()?)?)?;
    write_unit(&root, "Skill", "000.img", &common::encode(&common::link_unit())?)?;
    write_unit(&root, "String", "Mob.img", &common::encode(&common::mob_strings())?)?;
    write_unit(&root, "Sound", "Bgm00.img", &common::encode(&common::bgm_unit())?)?;
    write_unit(
        &root,
        "Map",
        "Map0/100000000.img",
        &common::encode(&common::map_unit())?,
    )?;
    write_unit(&root, "Map", "Map0/notes.txt", b"not a unit")?;
    fs::write(root.join("manifest.json"), MANIFEST)?;
    Ok((tmp, root))
}

fn files_below(dir: &Path) -> Vec<String> {
    let mut files = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(dir)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect::<Vec<_>>();
    files.sort();
    files
}

#[traced_test]
#[test]
fn opens_an_extracted_archive() -> Result<()> {
    let (_tmp, root) = extracted()?;
    let store = Store::open(&root, StoreOptions::default())?;

    assert_eq!(store.name(), "v83");
    let categories = store.categories().map(|c| c.name()).collect::<Vec<_>>();
    assert_eq!(categories, vec!["Map", "Mob", "Skill", "Sound", "String"]);
    let maps = store
        .category("map")?
        .units()
        .map(|u| u.name())
        .collect::<Vec<_>>();
    assert_eq!(maps, vec!["Map0/100000000.img"]);

    let version = store.version_info();
    assert_eq!(version.version, "v83");
    assert_eq!(version.display_name.as_deref(), Some("GMS v83"));
    assert_eq!(version.source_region.as_deref(), Some("GMS"));
    assert!(version.is_pre_bb);
    assert!(!version.is_64_bit);
    assert_eq!(store.manifest().categories["Mob"].file_count, 1);
    assert_eq!(
        store.category_summary("Mob")?.manifest,
        Some(CategoryManifest {
            file_count: 1,
            last_modified: None,
        })
    );
    assert_eq!(store.category_summary("Skill")?.manifest, None);

    assert_eq!(
        store.get_int(&UnitPath::new("Map", "100000000", "info/returnMap"))?,
        999_999_999
    );

    Ok(())
}

#[traced_test]
#[test]
fn missing_archive_directory_is_not_found() {
    assert!(matches!(
        Store::open("/nonexistent/archive", StoreOptions::default()),
        Err(Error::NotFound(_))
    ));
}

#[traced_test]
#[test]
fn saved_edits_survive_reopening() -> Result<()> {
    let (_tmp, root) = extracted()?;
    let hp = UnitPath::new("Skill", "000.img", "hp");

    {
        let store = Store::open(&root, StoreOptions::default())?;
        store.set_value(&hp, "4321")?;
        store.rename(&hp.with_path("skills"), "skill")?;
        store.save(&*store.get_unit("Skill", "000.img")?)?;
    }

    let store = Store::open(&root, StoreOptions::default())?;
    assert_eq!(store.get_int(&hp)?, 4321);
    assert_eq!(
        store.follow_link(&hp.with_path("skill/0"), false)?.target,
        Some(hp.clone())
    );
    assert_eq!(
        files_below(&root.join("Skill")),
        vec!["000.img".to_owned()]
    );

    Ok(())
}

#[traced_test]
#[test]
fn unsaved_edits_are_lost_on_unparse() -> Result<()> {
    let (_tmp, root) = extracted()?;
    let store = Store::open(&root, StoreOptions::default())?;
    let level = UnitPath::new("Mob", "0100100.img", "info/level");
    let before = fs::read(root.join("Mob/0100100.img"))?;

    store.set_value(&level, "99")?;
    assert!(store.unparse(&*store.get_unit("Mob", "0100100.img")?));

    assert_eq!(store.get_int(&level)?, 2);
    assert_eq!(fs::read(root.join("Mob/0100100.img"))?, before);

    Ok(())
}

#[traced_test]
#[test]
fn export_media_records_failures_and_carries_on() -> Result<()> {
    let (_, store) = common::store()?;
    let out = TempDir::new()?;

    let sounds = store.export_media(
        &UnitPath::new("Sound", "Bgm00.img", ""),
        out.path().join("bgm"),
        None,
    )?;
    assert_eq!(
        files_below(&out.path().join("bgm")),
        vec!["FloralLife.mp3", "RestNPeace.mp3"]
    );
    assert_eq!(sounds.written.len(), 2);
    assert_eq!(
        sounds.failures.keys().collect::<Vec<_>>(),
        vec!["Sound/Bgm00.img/Silence"]
    );
    assert_eq!(fs::read(out.path().join("bgm/RestNPeace.mp3"))?, b"ID3\x03");

    let canvases = store.export_media(
        &UnitPath::new("Mob", "0100100.img", "stand"),
        out.path().join("stand"),
        Some(1),
    )?;
    assert!(canvases.failures.is_empty());
    assert_eq!(
        files_below(&out.path().join("stand")),
        vec!["0.png", "1.png"]
    );
    let linked = Bitmap::from_png(&fs::read(out.path().join("stand/1.png"))?)?;
    assert_eq!(linked, common::bitmap());

    Ok(())
}

#[traced_test]
#[test]
fn export_json_describes_the_tree() -> Result<()> {
    let (_, store) = common::store()?;
    let json = store.export_json(&UnitPath::new("String", "Mob.img", "100120"), 5)?;

    assert_eq!(
        json,
        serde_json::json!({
            "type": "Container",
            "children": {
                "name": { "type": "String", "value": "Tino" },
                "origin": { "type": "Vector2", "value": { "x": 0, "y": 0 } }
            }
        })
    );

    Ok(())
}

#[traced_test]
#[test]
fn batch_export_lays_files_out_per_unit() -> Result<()> {
    let (_, store) = common::store()?;
    let out = TempDir::new()?;
    let categories = vec!["Mob".to_owned(), "Map".to_owned()];

    let report = store.export_images_batch(&categories, out.path(), 10)?;
    assert!(!report.truncated);
    assert_eq!(
        files_below(out.path()),
        vec!["Mob/0100100/stand_0.png", "Mob/0100100/stand_1.png"]
    );
    assert_eq!(
        report.failures.keys().collect::<Vec<_>>(),
        vec![
            "Map/Map0/100000000.img/back/0",
            "Map/Map0/100000000.img/back/1"
        ]
    );
    assert!(!store.get_unit("Mob", "0100100.img")?.is_parsed());
    assert!(!store.get_unit("Map", "Map0/100000000.img")?.is_parsed());

    let capped = TempDir::new()?;
    let report = store.export_images_batch(&categories, capped.path(), 1)?;
    assert!(report.truncated);
    assert_eq!(report.items(), 1);
    assert_eq!(files_below(capped.path()), vec!["Mob/0100100/stand_0.png"]);

    Ok(())
}

#[traced_test]
#[test]
fn media_exports_filter_by_kind() -> Result<()> {
    let (_, store) = common::store()?;
    let out = TempDir::new()?;
    let mob = UnitPath::new("Mob", "0100100.img", "");
    let bgm = UnitPath::new("Sound", "Bgm00.img", "");

    let images = store.export_images(&mob, out.path().join("mob"), None)?;
    assert_eq!(images.written.len(), 2);
    assert_eq!(
        files_below(&out.path().join("mob")),
        vec!["stand_0.png", "stand_1.png"]
    );
    assert!(store.export_sounds(&mob, out.path().join("none"), None)?.written.is_empty());

    let sounds = store.export_sounds(&bgm, out.path().join("bgm"), None)?;
    assert_eq!(sounds.written.len(), 2);
    assert_eq!(sounds.failures.len(), 1);
    assert!(store.export_images(&bgm, out.path().join("none"), None)?.written.is_empty());
    assert!(files_below(&out.path().join("none")).is_empty());

    Ok(())
}

#[traced_test]
#[test]
fn export_xml_escapes_and_truncates() -> Result<()> {
    let (_, store) = common::store()?;
    let info = UnitPath::new("Mob", "0100100.img", "info");
    store.add(&info, "note", NodeKind::String, Some(r#"<a & "b">"#))?;

    let xml = store.export_xml(&info, 1)?;
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains(r#"<property name="info" type="Container">"#));
    assert!(xml.contains(r#"<property name="level" type="Int16" value="2"/>"#));
    assert!(xml.contains(r#"value="&lt;a &amp; &quot;b&quot;&gt;""#));
    assert!(xml.trim_end().ends_with("</property>"));

    let unit = store.export_xml(&UnitPath::new("Skill", "000.img", ""), 0)?;
    assert!(unit.contains(
        r#"<property name="000.img" type="Container" truncated="true" childCount="2"/>"#
    ));

    let stand = store.export_xml(&info.with_path("stand"), 1)?;
    assert!(stand.contains(r#"<property name="0" type="Canvas" truncated="true" childCount="1"/>"#));

    Ok(())
}
