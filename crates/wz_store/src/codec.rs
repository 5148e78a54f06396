//! Unit codec seam

use wz_img::ImgWriterOptions;
use wz_node::Container;

use crate::error::{Error, Result};

/// Turns unit bytes into a property tree and back
pub trait UnitCodec: Send + Sync {
    fn decode_unit(&self, bytes: &[u8]) -> Result<Container>;

    fn encode_unit(&self, root: &Container) -> Result<Vec<u8>>;
}

/// The reference `.img` codec from [`wz_img`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ImgCodec {
    options: ImgWriterOptions,
}

impl ImgCodec {
    pub fn new(options: ImgWriterOptions) -> Self {
        Self { options }
    }
}

impl UnitCodec for ImgCodec {
    fn decode_unit(&self, bytes: &[u8]) -> Result<Container> {
        wz_img::decode(bytes).map_err(|e| Error::codec("img unit", e))
    }

    fn encode_unit(&self, root: &Container) -> Result<Vec<u8>> {
        wz_img::encode(root, self.options).map_err(|e| Error::codec("img unit", e))
    }
}
