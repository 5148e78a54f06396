//! Body compression and decompression handling.

use std::io::{self, Read, Write};

use binrw::{BinRead, BinWrite};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use tracing::instrument;

/// Identifies the storage format used to compress the body of a unit
///
/// When creating units, you may choose the method via [`crate::write::ImgWriterOptions`].
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[brw(repr=u32)]
pub enum CompressionMethod {
    /// Stores the body as it is
    None = 0,

    /// Compress the body using Zlib
    #[default]
    Zlib = 2,
}

pub(crate) enum BodyReader<'a, R: Read> {
    Raw(io::Take<&'a mut R>),
    Compressed(Box<ZlibDecoder<io::Take<&'a mut R>>>),
}

impl<'a, R: Read> BodyReader<'a, R> {
    #[instrument(skip(reader))]
    pub fn new(reader: &'a mut R, limit: u64, compression: CompressionMethod) -> Self {
        let limit_reader = reader.by_ref().take(limit);
        match compression {
            CompressionMethod::None => BodyReader::Raw(limit_reader),
            CompressionMethod::Zlib => {
                BodyReader::Compressed(Box::new(ZlibDecoder::new(limit_reader)))
            }
        }
    }
}

impl<R: Read> Read for BodyReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BodyReader::Raw(r) => r.read(buf),
            BodyReader::Compressed(r) => r.read(buf),
        }
    }

    #[instrument(skip_all, err)]
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        match self {
            BodyReader::Raw(r) => r.read_to_end(buf),
            BodyReader::Compressed(r) => r.read_to_end(buf),
        }
    }
}

pub(crate) enum BodyWriter<W: Write> {
    Raw(W, usize),
    Compressed(Box<ZlibEncoder<W>>),
}

impl<W: Write> BodyWriter<W> {
    #[instrument(skip(writer))]
    pub fn new(writer: W, compression: CompressionMethod) -> Self {
        match compression {
            CompressionMethod::None => BodyWriter::Raw(writer, 0),
            CompressionMethod::Zlib => BodyWriter::Compressed(Box::new(ZlibEncoder::new(
                writer,
                Compression::default(),
            ))),
        }
    }

    #[instrument(skip(self), err)]
    pub fn finalize(self) -> io::Result<W> {
        match self {
            BodyWriter::Raw(w, _) => Ok(w),
            BodyWriter::Compressed(w) => w.finish(),
        }
    }

    pub fn total_in(&self) -> u64 {
        match self {
            BodyWriter::Raw(_, c) => *c as u64,
            BodyWriter::Compressed(w) => w.total_in(),
        }
    }
}

impl<W: Write> Write for BodyWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BodyWriter::Raw(w, c) => {
                let written = w.write(buf)?;
                *c += written;
                Ok(written)
            }
            BodyWriter::Compressed(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BodyWriter::Raw(w, _) => w.flush(),
            BodyWriter::Compressed(w) => w.flush(),
        }
    }
}
