//! Base types for structure of IMG units.

use binrw::{BinRead, BinWrite};
use wz_node::NodeKind;

use crate::compression::CompressionMethod;
use crate::error::Error;

/// Size of [`ImgHeader`] on disk, magic included
pub const HEADER_SIZE: u64 = 24;

/// The only version this crate reads and writes
pub const FORMAT_VERSION: u32 = 1;

/// IMG unit header
///
/// Every unit starts with "WZIM" followed by the version. All data is stored in little endian
/// format.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Eq)]
#[brw(magic = b"WZIM", little)]
pub struct ImgHeader {
    /// Format version, always [`FORMAT_VERSION`]
    pub version: u32,

    /// The compression type used for the body
    pub compression: CompressionMethod,

    /// The size of the body as stored after the header
    pub body_size: u32,

    /// The size of the body after decompression
    pub uncompressed_size: u32,

    /// A [`crc::CRC_32_BZIP2`] checksum of the uncompressed body
    pub checksum: u32,
}

impl Default for ImgHeader {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            compression: Default::default(),
            body_size: Default::default(),
            uncompressed_size: Default::default(),
            checksum: Default::default(),
        }
    }
}

/// Tag byte preceding every value in the body
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeTag {
    Null = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    Float32 = 4,
    Float64 = 5,
    String = 6,
    Vector2 = 7,
    Link = 8,
    Canvas = 9,
    Binary = 10,
    Container = 11,
}

impl TryFrom<u8> for NodeTag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => NodeTag::Null,
            1 => NodeTag::Int16,
            2 => NodeTag::Int32,
            3 => NodeTag::Int64,
            4 => NodeTag::Float32,
            5 => NodeTag::Float64,
            6 => NodeTag::String,
            7 => NodeTag::Vector2,
            8 => NodeTag::Link,
            9 => NodeTag::Canvas,
            10 => NodeTag::Binary,
            11 => NodeTag::Container,
            other => return Err(Error::InvalidUnit(format!("unknown node tag {other}"))),
        })
    }
}

impl From<NodeKind> for NodeTag {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Null => NodeTag::Null,
            NodeKind::Int16 => NodeTag::Int16,
            NodeKind::Int32 => NodeTag::Int32,
            NodeKind::Int64 => NodeTag::Int64,
            NodeKind::Float32 => NodeTag::Float32,
            NodeKind::Float64 => NodeTag::Float64,
            NodeKind::String => NodeTag::String,
            NodeKind::Vector2 => NodeTag::Vector2,
            NodeKind::Link => NodeTag::Link,
            NodeKind::Canvas => NodeTag::Canvas,
            NodeKind::Binary => NodeTag::Binary,
            NodeKind::Container => NodeTag::Container,
        }
    }
}
