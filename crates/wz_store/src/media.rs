//! Bitmap and audio codecs for canvas and binary payloads

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::io::{Read, Write};
use wz_node::{Binary, Canvas};

use crate::error::{Error, Result};
use crate::png;

/// Decoded pixels of a canvas, 8 bit RGBA in row major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Bitmap {
    /// Encode as a PNG file
    pub fn to_png(&self) -> Result<Vec<u8>> {
        png::encode(self.width, self.height, &self.rgba)
    }

    /// Decode a PNG file
    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let (width, height, rgba) = png::decode(bytes)?;
        Ok(Self {
            width,
            height,
            rgba,
        })
    }
}

/// Interprets canvas payloads
pub trait BitmapCodec: Send + Sync {
    fn decode_bitmap(&self, canvas: &Canvas) -> Result<Bitmap>;

    /// Produce the payload for a canvas holding `bitmap`
    fn encode_bitmap(&self, bitmap: &Bitmap) -> Result<Vec<u8>>;
}

/// Zlib compressed BGRA8888 pixels
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBitmapCodec;

impl BitmapCodec for RawBitmapCodec {
    fn decode_bitmap(&self, canvas: &Canvas) -> Result<Bitmap> {
        let expected = pixel_bytes(canvas.width, canvas.height).ok_or_else(|| {
            Error::codec(
                "canvas payload",
                format!("{}x{} canvas is too large", canvas.width, canvas.height),
            )
        })?;
        // Dimensions are untrusted, read one byte past them to notice oversized payloads
        let mut bgra = Vec::new();
        ZlibDecoder::new(canvas.payload.as_slice())
            .take(expected as u64 + 1)
            .read_to_end(&mut bgra)
            .map_err(|e| Error::codec("canvas payload", e))?;

        if bgra.len() != expected {
            return Err(Error::codec(
                "canvas payload",
                format!(
                    "{} bytes of pixels for a {}x{} canvas, expected {expected}",
                    bgra.len(),
                    canvas.width,
                    canvas.height
                ),
            ));
        }

        Ok(Bitmap {
            width: canvas.width,
            height: canvas.height,
            rgba: swap_red_blue(bgra),
        })
    }

    fn encode_bitmap(&self, bitmap: &Bitmap) -> Result<Vec<u8>> {
        if pixel_bytes(bitmap.width, bitmap.height) != Some(bitmap.rgba.len()) {
            return Err(Error::InvalidArgument(format!(
                "{} bytes of pixels for a {}x{} bitmap",
                bitmap.rgba.len(),
                bitmap.width,
                bitmap.height
            )));
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&swap_red_blue(bitmap.rgba.clone()))?;
        Ok(encoder.finish()?)
    }
}

/// Bytes of a `width` x `height` image at four bytes per pixel
fn pixel_bytes(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(4)
}

fn swap_red_blue(mut pixels: Vec<u8>) -> Vec<u8> {
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
    pixels
}

/// A decoded audio clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audio {
    /// Playback length in milliseconds
    pub length: u32,
    /// Sample frequency in Hz
    pub frequency: u32,
    /// Contents of a standalone audio file
    pub data: Vec<u8>,
}

/// Interprets binary payloads
pub trait AudioCodec: Send + Sync {
    fn decode_audio(&self, binary: &Binary) -> Result<Audio>;

    fn encode_audio(&self, audio: Audio) -> Result<Binary>;

    /// File extension of the files [`AudioCodec::decode_audio`] produces
    fn extension(&self) -> &'static str {
        "mp3"
    }
}

/// Payloads are stored as complete audio files
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAudioCodec;

impl AudioCodec for PassthroughAudioCodec {
    fn decode_audio(&self, binary: &Binary) -> Result<Audio> {
        if binary.payload.is_empty() {
            return Err(Error::codec("audio payload", "payload is empty"));
        }
        Ok(Audio {
            length: binary.length,
            frequency: binary.frequency,
            data: binary.payload.clone(),
        })
    }

    fn encode_audio(&self, audio: Audio) -> Result<Binary> {
        if audio.data.is_empty() {
            return Err(Error::InvalidArgument("audio data is empty".into()));
        }
        Ok(Binary {
            length: audio.length,
            frequency: audio.frequency,
            payload: audio.data,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use wz_node::{Binary, Canvas};

    use crate::error::{Error, Result};
    use crate::media::{AudioCodec, Bitmap, BitmapCodec, PassthroughAudioCodec, RawBitmapCodec};

    #[test]
    fn raw_bitmap_stores_bgra() -> Result<()> {
        let bitmap = Bitmap {
            width: 1,
            height: 2,
            rgba: vec![0x10, 0x20, 0x30, 0xFF, 0x40, 0x50, 0x60, 0x80],
        };
        let payload = RawBitmapCodec.encode_bitmap(&bitmap)?;

        let mut bgra = Vec::new();
        std::io::Read::read_to_end(
            &mut flate2::read::ZlibDecoder::new(payload.as_slice()),
            &mut bgra,
        )?;
        assert_eq!(bgra, vec![0x30, 0x20, 0x10, 0xFF, 0x60, 0x50, 0x40, 0x80]);

        let canvas = Canvas::new(1, 2, payload);
        assert_eq!(RawBitmapCodec.decode_bitmap(&canvas)?, bitmap);

        Ok(())
    }

    #[test]
    fn raw_bitmap_checks_dimensions() -> Result<()> {
        let bitmap = Bitmap {
            width: 1,
            height: 1,
            rgba: vec![0; 4],
        };
        let payload = RawBitmapCodec.encode_bitmap(&bitmap)?;

        let wrong = Canvas::new(2, 2, payload);
        assert!(matches!(
            RawBitmapCodec.decode_bitmap(&wrong),
            Err(Error::CodecError { .. })
        ));
        assert!(RawBitmapCodec
            .decode_bitmap(&Canvas::new(1, 1, vec![1, 2, 3]))
            .is_err());

        Ok(())
    }

    #[test]
    fn huge_dimensions_do_not_allocate() -> Result<()> {
        let payload = RawBitmapCodec.encode_bitmap(&Bitmap {
            width: 1,
            height: 1,
            rgba: vec![0; 4],
        })?;

        for (width, height) in [(u32::MAX, u32::MAX), (u32::MAX, 3), (1 << 20, 1 << 20)] {
            assert!(matches!(
                RawBitmapCodec.decode_bitmap(&Canvas::new(width, height, payload.clone())),
                Err(Error::CodecError { .. })
            ));
        }

        Ok(())
    }

    #[test]
    fn oversized_payload_is_rejected() -> Result<()> {
        let payload = RawBitmapCodec.encode_bitmap(&Bitmap {
            width: 2,
            height: 2,
            rgba: vec![7; 16],
        })?;

        assert!(matches!(
            RawBitmapCodec.decode_bitmap(&Canvas::new(1, 1, payload)),
            Err(Error::CodecError { .. })
        ));

        Ok(())
    }

    #[test]
    fn passthrough_audio_rejects_empty_payload() {
        let empty = Binary {
            length: 0,
            frequency: 44100,
            payload: vec![],
        };
        assert!(PassthroughAudioCodec.decode_audio(&empty).is_err());

        let clip = Binary {
            payload: b"ID3".to_vec(),
            ..empty
        };
        assert_eq!(
            PassthroughAudioCodec.decode_audio(&clip).map(|a| a.data).ok(),
            Some(b"ID3".to_vec())
        );
    }
}
