//! This library models the property tree stored inside a single **WZ** unit (an `.img` entry).
//!
//! # Property Tree
//!
//! Every unit holds one root [`Container`]. Each position in the tree is a [`Node`], a closed
//! tagged union over the property kinds the game data uses:
//!
//! | Kind        | Payload                                                        |
//! |-------------|----------------------------------------------------------------|
//! | `Null`      | nothing                                                        |
//! | `Int16`     | `i16`                                                          |
//! | `Int32`     | `i32`                                                          |
//! | `Int64`     | `i64`                                                          |
//! | `Float32`   | `f32`                                                          |
//! | `Float64`   | `f64`                                                          |
//! | `String`    | owned UTF-8 text                                               |
//! | `Vector2`   | two `i32` components, `X` and `Y`                              |
//! | `Link`      | a relative path to another node (a "UOL")                      |
//! | `Canvas`    | bitmap payload, dimensions and nested children                 |
//! | `Binary`    | audio payload, declared length (ms) and sample frequency (Hz)  |
//! | `Container` | ordered, uniquely named children                               |
//!
//! ## Paths
//!
//! Nodes are addressed by `/` separated names starting at the unit root, for example
//! `info/icon/origin`. The empty path addresses the root. See [`path`].
//!
//! ## Links
//!
//! Links are never ownership edges. A `Link` node only stores text, and is resolved on demand
//! against the tree it lives in. Canvases can also carry `_inlink` (path from the unit root) and
//! `_outlink` (path qualified with another unit) children. See [`link`].
//!
//! ## Traversal
//!
//! Search, validation, export and summaries all run on top of the depth limited walker in
//! [`visit`], and [`diff`] compares two arbitrary subtrees.
//!

pub mod diff;
pub mod error;
pub mod link;
pub mod node;
pub mod path;
pub mod visit;

pub use diff::{diff, Difference, DifferenceKind};
pub use link::{LinkKind, LinkOutcome, LinkResolution, UnitPath};
pub use node::{Binary, Canvas, Container, Node, NodeKind, Vector2};
pub use visit::{walk, Flow, Visit, Walk};
