//! Minimal PNG support for exporting and importing canvases
//!
//! Writes 8 bit RGBA images without filtering. Reads non interlaced 8 bit greyscale, RGB and
//! RGBA images with any of the standard row filters.

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::io::{Read, Write};

use crate::error::{Error, Result};

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const CHUNK_CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

fn invalid(message: impl Into<String>) -> Error {
    Error::codec("png image", message.into())
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| invalid("chunk too large"))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut digest = CHUNK_CRC.digest();
    digest.update(kind);
    digest.update(data);
    out.extend_from_slice(&digest.finalize().to_be_bytes());
    Ok(())
}

/// Encode RGBA8 pixels as a PNG file
pub fn encode(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let stride = width as usize * 4;
    if rgba.len() != stride * height as usize {
        return Err(invalid(format!(
            "{} bytes of pixels for a {width}x{height} image",
            rgba.len()
        )));
    }

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    if stride > 0 {
        for row in rgba.chunks(stride) {
            encoder.write_all(&[0])?;
            encoder.write_all(row)?;
        }
    }
    let idat = encoder.finish()?;

    let mut out = SIGNATURE.to_vec();
    write_chunk(&mut out, b"IHDR", &ihdr)?;
    write_chunk(&mut out, b"IDAT", &idat)?;
    write_chunk(&mut out, b"IEND", &[])?;
    Ok(out)
}

/// Decode a PNG file into its dimensions and RGBA8 pixels
pub fn decode(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>)> {
    if bytes.len() < SIGNATURE.len() || bytes[..8] != SIGNATURE {
        return Err(invalid("missing PNG signature"));
    }

    let mut header = None;
    let mut idat = Vec::new();
    let mut rest = &bytes[8..];
    while !rest.is_empty() {
        if rest.len() < 12 {
            return Err(invalid("truncated chunk"));
        }
        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        if rest.len() < 12 + len {
            return Err(invalid("truncated chunk"));
        }
        let kind = &rest[4..8];
        let data = &rest[8..8 + len];
        let stored = u32::from_be_bytes([
            rest[8 + len],
            rest[9 + len],
            rest[10 + len],
            rest[11 + len],
        ]);
        if CHUNK_CRC.checksum(&rest[4..8 + len]) != stored {
            return Err(invalid(format!(
                "bad checksum on {} chunk",
                String::from_utf8_lossy(kind)
            )));
        }

        match kind {
            b"IHDR" => header = Some(Header::parse(data)?),
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => break,
            _ => {}
        }
        rest = &rest[12 + len..];
    }

    let header = header.ok_or_else(|| invalid("missing IHDR chunk"))?;
    let mut raw = Vec::new();
    ZlibDecoder::new(idat.as_slice()).read_to_end(&mut raw)?;
    let pixels = header.unfilter(&raw)?;
    Ok((header.width, header.height, header.to_rgba(&pixels)))
}

struct Header {
    width: u32,
    height: u32,
    channels: usize,
}

impl Header {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != 13 {
            return Err(invalid("IHDR chunk has the wrong size"));
        }
        let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let (depth, color, interlace) = (data[8], data[9], data[12]);
        if depth != 8 {
            return Err(invalid(format!("unsupported bit depth {depth}")));
        }
        if interlace != 0 {
            return Err(invalid("interlaced images are not supported"));
        }
        let channels = match color {
            0 => 1,
            2 => 3,
            4 => 2,
            6 => 4,
            other => return Err(invalid(format!("unsupported color type {other}"))),
        };
        Ok(Self {
            width,
            height,
            channels,
        })
    }

    fn unfilter(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let bpp = self.channels;
        let stride = self.width as usize * bpp;
        let rows = self.height as usize;
        if raw.len() != rows * (stride + 1) {
            return Err(invalid("image data does not match its dimensions"));
        }

        let mut out = vec![0u8; rows * stride];
        for y in 0..rows {
            let filter = raw[y * (stride + 1)];
            let line = &raw[y * (stride + 1) + 1..(y + 1) * (stride + 1)];
            let (done, current) = out.split_at_mut(y * stride);
            let current = &mut current[..stride];
            let previous = if y == 0 {
                None
            } else {
                Some(&done[(y - 1) * stride..])
            };

            for x in 0..stride {
                let a = if x >= bpp { current[x - bpp] } else { 0 };
                let b = previous.map_or(0, |p| p[x]);
                let c = match previous {
                    Some(p) if x >= bpp => p[x - bpp],
                    _ => 0,
                };
                let predictor = match filter {
                    0 => 0,
                    1 => a,
                    2 => b,
                    3 => ((a as u16 + b as u16) / 2) as u8,
                    4 => paeth(a, b, c),
                    other => return Err(invalid(format!("unknown row filter {other}"))),
                };
                current[x] = line[x].wrapping_add(predictor);
            }
        }
        Ok(out)
    }

    fn to_rgba(&self, pixels: &[u8]) -> Vec<u8> {
        match self.channels {
            4 => pixels.to_vec(),
            3 => pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 0xFF])
                .collect(),
            2 => pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            _ => pixels.iter().flat_map(|&g| [g, g, g, 0xFF]).collect(),
        }
    }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let (pa, pb, pc) = ((p - a as i16).abs(), (p - b as i16).abs(), (p - c as i16).abs());
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::png::{decode, encode, paeth};

    #[test]
    fn encoded_png_starts_with_signature_and_header() -> Result<()> {
        let png = encode(1, 1, &[0xFF, 0x00, 0x00, 0xFF])?;

        assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");

        Ok(())
    }

    #[test]
    fn decode_reads_back_pixels() -> Result<()> {
        let pixels = (0..2 * 3 * 4).map(|i| i as u8 * 9).collect::<Vec<_>>();
        let (width, height, rgba) = decode(&encode(2, 3, &pixels)?)?;

        assert_eq!((width, height), (2, 3));
        assert_eq!(rgba, pixels);

        Ok(())
    }

    #[test]
    fn decode_rejects_corrupted_chunks() -> Result<()> {
        let mut png = encode(1, 1, &[1, 2, 3, 4])?;
        png[20] ^= 0x01;

        assert!(decode(&png).is_err());
        assert!(decode(b"not a png").is_err());

        Ok(())
    }

    #[test]
    fn encode_checks_pixel_count() {
        assert!(encode(2, 2, &[0; 15]).is_err());
    }

    #[test]
    fn paeth_predictor() {
        assert_eq!(paeth(10, 20, 10), 20);
        assert_eq!(paeth(20, 10, 10), 20);
        assert_eq!(paeth(5, 5, 5), 5);
    }
}
