//! This library reads and writes **IMG** units, the reference on-disk form of a single WZ
//! property tree.
//!
//! # IMG Unit Format Documentation
//!
//! An IMG unit stores one root [`wz_node::Container`] and everything below it. Units are the
//! granularity at which a store loads and saves data, so a unit is always read or written as a
//! whole. Units are typically identified with the `.img` extension.
//!
//! ## File Structure
//!
//! A unit consists of a fixed header followed by the body.
//!
//! | Offset (bytes) | Field             | Description                                              |
//! |----------------|-------------------|----------------------------------------------------------|
//! | 0x0000         | Magic number      | 4 bytes: 0x4D495A57 ("WZIM")                             |
//! | 0x0004         | Version           | 4 bytes: Fixed value 0x00000001                          |
//! | 0x0008         | Compression       | 4 bytes: Compression method for the body                 |
//! | 0x000C         | Body Size         | 4 bytes: Size of the body as stored                      |
//! | 0x0010         | Uncompressed Size | 4 bytes: Size of the body after decompression            |
//! | 0x0014         | Checksum          | 4 bytes: CRC-32 (BZIP2) of the uncompressed body         |
//!
//! ### Body
//!
//! The body is a single container. A container is a 4 byte child count followed by that many
//! entries, and each entry is:
//!
//! | Field | Description                                                  |
//! |-------|--------------------------------------------------------------|
//! | Name  | 2 bytes: length, followed by that many bytes of UTF-8        |
//! | Tag   | 1 byte: the kind of node, see below                          |
//! | Value | depends on the tag                                           |
//!
//! | Tag | Kind        | Value                                                                 |
//! |-----|-------------|-----------------------------------------------------------------------|
//! | 0   | `Null`      | nothing                                                               |
//! | 1   | `Int16`     | 2 bytes                                                               |
//! | 2   | `Int32`     | 4 bytes                                                               |
//! | 3   | `Int64`     | 8 bytes                                                               |
//! | 4   | `Float32`   | 4 bytes IEEE 754                                                      |
//! | 5   | `Float64`   | 8 bytes IEEE 754                                                      |
//! | 6   | `String`    | 4 bytes length, then UTF-8                                            |
//! | 7   | `Vector2`   | 4 bytes X, 4 bytes Y                                                  |
//! | 8   | `Link`      | 4 bytes length, then UTF-8 path                                       |
//! | 9   | `Canvas`    | 4 bytes width, 4 bytes height, 4 bytes length, payload, container     |
//! | 10  | `Binary`    | 4 bytes length (ms), 4 bytes frequency, 4 bytes length, payload       |
//! | 11  | `Container` | container                                                             |
//!
//! ## Additional Information
//!
//! - **File Extension**: `.img`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Compression Methods**:
//!   - `0`: None (no compression)
//!   - `2`: Zlib (compressed with Zlib)
//! - Encoding is deterministic: writing a decoded unit with the same options reproduces it byte
//!   for byte.
//!

pub mod compression;
pub mod error;
pub mod read;
pub mod types;
pub mod write;

pub use compression::CompressionMethod;
pub use read::{decode, ImgReader};
pub use write::{encode, ImgWriter, ImgWriterOptions};
