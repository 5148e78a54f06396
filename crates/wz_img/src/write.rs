//! Types for writing IMG units
//!

use binrw::BinWrite;
use bon::Builder;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Seek, Write};
use tracing::instrument;
use wz_node::{Container, Node};

use crate::compression::{BodyWriter, CompressionMethod};
use crate::error::{Error, Result};
use crate::types::{ImgHeader, NodeTag};

/// Options for how the unit should be written
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct ImgWriterOptions {
    /// The compression method to use for the body
    #[builder(default)]
    pub compression: CompressionMethod,
}

/// IMG unit generator
///
/// ```
/// # fn doit() -> wz_img::error::Result<()>
/// # {
/// use wz_img::{ImgWriter, ImgWriterOptions};
/// use wz_node::{Container, Node};
///
/// let root = Container::new().with("hp", Node::Int32(100));
///
/// // We use a buffer here, though you'd normally use a `File`
/// let unit = ImgWriter::new(std::io::Cursor::new(Vec::new()), ImgWriterOptions::builder()
///            .compression(wz_img::CompressionMethod::None)
///            .build());
/// let bytes = unit.write_root(&root)?.into_inner();
///
/// assert_eq!(wz_img::decode(&bytes)?, root);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct ImgWriter<W: Write + Seek> {
    inner: W,
    options: ImgWriterOptions,
}

impl<W: Write + Seek> ImgWriter<W> {
    pub fn new(inner: W, options: ImgWriterOptions) -> ImgWriter<W> {
        ImgWriter { inner, options }
    }

    /// Encode `root` and write the header and body
    ///
    /// This will return the writer, but one should normally not append any data to the end of the
    /// unit.
    #[instrument(skip_all, err, fields(children = root.len()))]
    pub fn write_root(mut self, root: &Container) -> Result<W> {
        let mut body = Vec::new();
        write_container(&mut body, root)?;

        let mut block = BodyWriter::new(Vec::new(), self.options.compression);
        block.write_all(&body)?;
        let uncompressed_size = block.total_in();
        let stored = block.finalize()?;

        let header = ImgHeader {
            compression: self.options.compression,
            body_size: fit_u32(stored.len() as u64, "body")?,
            uncompressed_size: fit_u32(uncompressed_size, "body")?,
            checksum: crc::Crc::<u32>::new(&crc::CRC_32_BZIP2).checksum(&body),
            ..Default::default()
        };

        header.write(&mut self.inner)?;
        self.inner.write_all(&stored)?;

        Ok(self.inner)
    }
}

/// Encode a unit into memory
pub fn encode(root: &Container, options: ImgWriterOptions) -> Result<Vec<u8>> {
    Ok(ImgWriter::new(Cursor::new(Vec::new()), options)
        .write_root(root)?
        .into_inner())
}

fn fit_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::TooLarge(format!("{what} of {value} bytes")))
}

fn write_container(out: &mut Vec<u8>, container: &Container) -> Result<()> {
    out.write_u32::<LittleEndian>(fit_u32(container.len() as u64, "container")?)?;
    for (name, node) in container.iter() {
        let len = u16::try_from(name.len())
            .map_err(|_| Error::TooLarge(format!("child name '{name}'")))?;
        out.write_u16::<LittleEndian>(len)?;
        out.write_all(name.as_bytes())?;
        write_node(out, node)?;
    }
    Ok(())
}

fn write_node(out: &mut Vec<u8>, node: &Node) -> Result<()> {
    out.write_u8(NodeTag::from(node.kind()) as u8)?;
    match node {
        Node::Null => {}
        Node::Int16(v) => out.write_i16::<LittleEndian>(*v)?,
        Node::Int32(v) => out.write_i32::<LittleEndian>(*v)?,
        Node::Int64(v) => out.write_i64::<LittleEndian>(*v)?,
        Node::Float32(v) => out.write_f32::<LittleEndian>(*v)?,
        Node::Float64(v) => out.write_f64::<LittleEndian>(*v)?,
        Node::String(text) | Node::Link(text) => write_payload(out, text.as_bytes())?,
        Node::Vector2(v) => {
            out.write_i32::<LittleEndian>(v.x)?;
            out.write_i32::<LittleEndian>(v.y)?;
        }
        Node::Canvas(canvas) => {
            out.write_u32::<LittleEndian>(canvas.width)?;
            out.write_u32::<LittleEndian>(canvas.height)?;
            write_payload(out, &canvas.payload)?;
            write_container(out, &canvas.children)?;
        }
        Node::Binary(binary) => {
            out.write_u32::<LittleEndian>(binary.length)?;
            out.write_u32::<LittleEndian>(binary.frequency)?;
            write_payload(out, &binary.payload)?;
        }
        Node::Container(container) => write_container(out, container)?,
    }
    Ok(())
}

fn write_payload(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    out.write_u32::<LittleEndian>(fit_u32(bytes.len() as u64, "payload")?)?;
    out.write_all(bytes)?;
    Ok(())
}
