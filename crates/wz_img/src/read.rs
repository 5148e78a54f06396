//! Types for reading IMG units
//!

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::instrument;
use wz_node::{Binary, Canvas, Container, Node, Vector2};

use crate::{
    compression::BodyReader,
    error::{Error, Result},
    types::{ImgHeader, NodeTag, FORMAT_VERSION, HEADER_SIZE},
};

/// Containers nested deeper than this are rejected instead of risking the stack
pub const MAX_NESTING: usize = 512;

/// IMG unit reader
///
/// ```no_run
/// fn count_children(path: &str) -> wz_img::error::Result<usize> {
///     let file = std::fs::File::open(path)?;
///     let mut unit = wz_img::ImgReader::new(file)?;
///
///     println!("{:?}", unit.header());
///     Ok(unit.read_root()?.len())
/// }
/// ```
pub struct ImgReader<R> {
    reader: R,
    header: ImgHeader,
}

impl<R: Read + Seek> ImgReader<R> {
    /// Read and validate the header of a unit
    pub fn new(mut reader: R) -> Result<ImgReader<R>> {
        let header = ImgHeader::read(&mut reader)
            .map_err(|e| Error::InvalidUnit(format!("unreadable header: {e}")))?;

        if header.version != FORMAT_VERSION {
            return Err(Error::InvalidUnit(format!(
                "unsupported version {}",
                header.version
            )));
        }

        Ok(ImgReader { reader, header })
    }

    /// The header read by [`ImgReader::new`]
    pub fn header(&self) -> &ImgHeader {
        &self.header
    }

    /// Decompress the body and verify its size and checksum
    #[instrument(skip(self), err)]
    pub fn body(&mut self) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(HEADER_SIZE))?;

        let mut body = Vec::new();
        BodyReader::new(
            &mut self.reader,
            self.header.body_size as u64,
            self.header.compression,
        )
        .read_to_end(&mut body)
        .map_err(|e| Error::InvalidUnit(format!("unreadable body: {e}")))?;

        if body.len() != self.header.uncompressed_size as usize {
            return Err(Error::InvalidUnit(format!(
                "body is {} bytes, header declares {}",
                body.len(),
                self.header.uncompressed_size
            )));
        }

        let actual = crc::Crc::<u32>::new(&crc::CRC_32_BZIP2).checksum(&body);
        if actual != self.header.checksum {
            return Err(Error::ChecksumMismatch {
                expected: self.header.checksum,
                actual,
            });
        }

        Ok(body)
    }

    /// Decode the whole tree
    #[instrument(skip(self), err)]
    pub fn read_root(&mut self) -> Result<Container> {
        let body = self.body()?;
        let mut cursor = Cursor::new(body.as_slice());
        let root = read_container(&mut cursor, 0)?;

        if cursor.position() != body.len() as u64 {
            return Err(Error::InvalidUnit(format!(
                "{} trailing bytes after the root container",
                body.len() as u64 - cursor.position()
            )));
        }

        Ok(root)
    }
}

/// Decode a unit held in memory
pub fn decode(bytes: &[u8]) -> Result<Container> {
    ImgReader::new(Cursor::new(bytes))?.read_root()
}

fn read_container<R: Read>(reader: &mut R, depth: usize) -> Result<Container> {
    if depth > MAX_NESTING {
        return Err(Error::InvalidUnit(format!(
            "containers nested deeper than {MAX_NESTING}"
        )));
    }

    let count = reader.read_u32::<LittleEndian>()?;
    let mut container = Container::new();
    for _ in 0..count {
        let name = read_name(reader)?;
        if container.contains_key(&name) {
            return Err(Error::InvalidUnit(format!("duplicate child name '{name}'")));
        }
        let node = read_node(reader, depth)?;
        container.insert(name, node)?;
    }
    Ok(container)
}

fn read_node<R: Read>(reader: &mut R, depth: usize) -> Result<Node> {
    let tag = NodeTag::try_from(reader.read_u8()?)?;
    let node = match tag {
        NodeTag::Null => Node::Null,
        NodeTag::Int16 => Node::Int16(reader.read_i16::<LittleEndian>()?),
        NodeTag::Int32 => Node::Int32(reader.read_i32::<LittleEndian>()?),
        NodeTag::Int64 => Node::Int64(reader.read_i64::<LittleEndian>()?),
        NodeTag::Float32 => Node::Float32(reader.read_f32::<LittleEndian>()?),
        NodeTag::Float64 => Node::Float64(reader.read_f64::<LittleEndian>()?),
        NodeTag::String => Node::String(read_text(reader)?),
        NodeTag::Vector2 => Node::Vector2(Vector2 {
            x: reader.read_i32::<LittleEndian>()?,
            y: reader.read_i32::<LittleEndian>()?,
        }),
        NodeTag::Link => Node::Link(read_text(reader)?),
        NodeTag::Canvas => {
            let width = reader.read_u32::<LittleEndian>()?;
            let height = reader.read_u32::<LittleEndian>()?;
            let payload = read_payload(reader)?;
            Node::Canvas(Canvas {
                width,
                height,
                payload,
                children: read_container(reader, depth + 1)?,
            })
        }
        NodeTag::Binary => Node::Binary(Binary {
            length: reader.read_u32::<LittleEndian>()?,
            frequency: reader.read_u32::<LittleEndian>()?,
            payload: read_payload(reader)?,
        }),
        NodeTag::Container => Node::Container(read_container(reader, depth + 1)?),
    };
    Ok(node)
}

fn read_exact_vec<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buffer)?;
    if buffer.len() as u64 != len {
        return Err(Error::InvalidUnit(format!(
            "expected {len} bytes, body ends after {}",
            buffer.len()
        )));
    }
    Ok(buffer)
}

fn read_name<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<LittleEndian>()?;
    let bytes = read_exact_vec(reader, len as u64)?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidUnit(format!("child name is not UTF-8: {e}")))
}

fn read_text<R: Read>(reader: &mut R) -> Result<String> {
    let bytes = read_payload(reader)?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidUnit(format!("text is not UTF-8: {e}")))
}

fn read_payload<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = reader.read_u32::<LittleEndian>()?;
    read_exact_vec(reader, len as u64)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;
    use wz_node::Node;

    use crate::error::{Error, Result};
    use crate::read::decode;

    #[rustfmt::skip]
    fn single_int_unit() -> Vec<u8> {
        vec![
            // Header
            0x57, 0x5A, 0x49, 0x4D,
            0x01, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x0D, 0x00, 0x00, 0x00,
            0x0D, 0x00, 0x00, 0x00,
            0x49, 0x44, 0x00, 0xBD,
            // Body
            0x01, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x68, 0x70,
            0x02,
            0x64, 0x00, 0x00, 0x00,
        ]
    }

    #[traced_test]
    #[test]
    fn decode_uncompressed_unit() -> Result<()> {
        let root = decode(&single_int_unit())?;

        assert_eq!(root.len(), 1);
        assert_eq!(root.get("hp"), Some(&Node::Int32(100)));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn decode_detects_corruption() {
        let mut data = single_int_unit();
        data[33] = 0x65;

        assert!(matches!(
            decode(&data),
            Err(Error::ChecksumMismatch {
                expected: 0xBD004449,
                ..
            })
        ));
    }

    #[traced_test]
    #[test]
    fn decode_detects_truncation() {
        let data = single_int_unit();

        assert!(matches!(
            decode(&data[..data.len() - 2]),
            Err(Error::InvalidUnit(_))
        ));
        assert!(matches!(decode(&data[..10]), Err(Error::InvalidUnit(_))));
    }

    #[traced_test]
    #[test]
    fn decode_rejects_unknown_version() {
        let mut data = single_int_unit();
        data[4] = 0x02;

        assert!(matches!(decode(&data), Err(Error::InvalidUnit(_))));
    }
}
