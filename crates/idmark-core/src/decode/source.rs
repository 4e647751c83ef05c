//! Asynchronous image sources.
//!
//! The compositor and the document assembler never read bytes themselves;
//! they await an [`ImageSource`]. A source may finish synchronously (bytes
//! already in memory) or suspend while the host reads a file or blob.

use std::future::Future;

use super::{decode_image, DecodeError, DecodedImage};

/// Something that can produce a decoded raster, possibly after waiting.
pub trait ImageSource {
    /// Produce the decoded image.
    fn load(&self) -> impl Future<Output = Result<DecodedImage, DecodeError>>;
}

/// PNG or JPEG bytes held in memory, decoded on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for EncodedImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl ImageSource for EncodedImage {
    async fn load(&self) -> Result<DecodedImage, DecodeError> {
        decode_image(&self.bytes)
    }
}

impl ImageSource for DecodedImage {
    async fn load(&self) -> Result<DecodedImage, DecodeError> {
        Ok(self.clone())
    }
}

impl<S: ImageSource> ImageSource for &S {
    fn load(&self) -> impl Future<Output = Result<DecodedImage, DecodeError>> {
        (**self).load()
    }
}
