#![allow(dead_code)]

use std::sync::Arc;
use wz_node::{Binary, Canvas, Container, Node, Vector2};
use wz_store::{
    error::Result,
    media::{Bitmap, BitmapCodec},
    ImgCodec, MemorySource, RawBitmapCodec, Store, StoreOptions, UnitCodec,
};

/// A 2x2 bitmap with four distinct pixels
pub fn bitmap() -> Bitmap {
    Bitmap {
        width: 2,
        height: 2,
        rgba: vec![
            0xFF, 0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, //
            0x00, 0x00, 0xFF, 0xFF, 0x10, 0x20, 0x30, 0x80,
        ],
    }
}

fn canvas(origin: Vector2) -> Result<Canvas> {
    let mut canvas = Canvas::new(2, 2, RawBitmapCodec.encode_bitmap(&bitmap())?);
    canvas.children = Container::new().with("origin", Node::Vector2(origin));
    Ok(canvas)
}

fn linked_canvas(field: &str, target: &str) -> Canvas {
    let mut canvas = Canvas::new(1, 1, vec![]);
    canvas.children = Container::new().with(field, Node::String(target.into()));
    canvas
}

fn sound(length: u32, payload: &[u8]) -> Node {
    Node::Binary(Binary {
        length,
        frequency: 44100,
        payload: payload.to_vec(),
    })
}

/// `{hp: 100, skills: {0: ../hp}}`
pub fn link_unit() -> Container {
    Container::new().with("hp", Node::Int32(100)).with(
        "skills",
        Container::new()
            .with("0", Node::Link("../hp".into()))
            .into(),
    )
}

pub fn mob_unit() -> Result<Container> {
    Ok(Container::new()
        .with(
            "info",
            Container::new()
                .with("level", Node::Int16(2))
                .with("maxHP", Node::Int32(8))
                .with("speed", Node::Float32(-0.5))
                .into(),
        )
        .with(
            "stand",
            Container::new()
                .with("0", Node::Canvas(canvas(Vector2::new(1, 2))?))
                .with("1", Node::Canvas(linked_canvas("_inlink", "stand/0")))
                .into(),
        )
        .with(
            "hit1",
            Container::new()
                .with("0", Node::Link("../stand/0".into()))
                .into(),
        ))
}

pub fn mob_strings() -> Container {
    Container::new()
        .with(
            "100100",
            Container::new()
                .with("name", Node::String("Snail".into()))
                .into(),
        )
        .with(
            "100101",
            Container::new()
                .with("name", Node::String("Blue Snail".into()))
                .into(),
        )
        .with(
            "100120",
            Container::new()
                .with("name", Node::String("Tino".into()))
                .with("origin", Node::Vector2(Vector2::new(0, 0)))
                .into(),
        )
}

pub fn bgm_unit() -> Container {
    Container::new()
        .with("FloralLife", sound(0, b"ID3\x04"))
        .with("RestNPeace", sound(95_000, b"ID3\x03"))
        .with("Silence", sound(1_000, b""))
}

pub fn map_unit() -> Container {
    Container::new()
        .with(
            "info",
            Container::new()
                .with("bgm", Node::String("Bgm00/FloralLife".into()))
                .with("returnMap", Node::Int32(999_999_999))
                .into(),
        )
        .with(
            "back",
            Container::new()
                .with(
                    "0",
                    Node::Canvas(linked_canvas("_outlink", "Mob/0100100.img/stand/0")),
                )
                .with(
                    "1",
                    Node::Canvas(linked_canvas("_outlink", "Mob/missing.img/stand/0")),
                )
                .into(),
        )
        .with(
            "portal",
            Container::new()
                .with("0", Node::Link("../../100000001.img/portal/0".into()))
                .into(),
        )
}

pub fn encode(root: &Container) -> Result<Vec<u8>> {
    ImgCodec::default().encode_unit(root)
}

/// A small archive of five units, one per category
pub fn archive() -> Result<Arc<MemorySource>> {
    Ok(Arc::new(
        MemorySource::new("fixture")
            .with_unit("Mob", "0100100.img", encode(&mob_unit()?)?)
            .with_unit("Skill", "000.img", encode(&link_unit())?)
            .with_unit("String", "Mob.img", encode(&mob_strings())?)
            .with_unit("Sound", "Bgm00.img", encode(&bgm_unit())?)
            .with_unit("Map", "Map0/100000000.img", encode(&map_unit())?),
    ))
}

pub fn store_with(options: StoreOptions) -> Result<(Arc<MemorySource>, Store)> {
    let source = archive()?;
    let store = Store::new(Arc::clone(&source), options)?;
    Ok((source, store))
}

pub fn store() -> Result<(Arc<MemorySource>, Store)> {
    store_with(StoreOptions::default())
}

/// The Mob category with an unreadable unit ahead of a good one, and a canvas whose declared
/// size does not fit its payload
pub fn damaged_store() -> Result<Store> {
    let oversized = Canvas::new(u32::MAX, 3, RawBitmapCodec.encode_bitmap(&bitmap())?);
    let unit = Container::new().with(
        "stand",
        Container::new().with("0", Node::Canvas(oversized)).into(),
    );
    let source = MemorySource::new("damaged")
        .with_unit("Mob", "0bad.img", b"garbage".to_vec())
        .with_unit("Mob", "0100100.img", encode(&mob_unit()?)?)
        .with_unit("Mob", "0100101.img", encode(&unit)?);
    Store::new(source, StoreOptions::default())
}
