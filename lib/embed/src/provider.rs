//! Provider seams for text and image embedding models.
//!
//! Implementations are constructed once at startup and shared by reference.
//! A provider signals failure with an `Err`; a successful call that yields no
//! values is returned as an empty vector and treated as fatal by callers.

use image::RgbImage;
use shelfscout_core::Result;

/// Text embedding model (dimensionality D_text)
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, used for logging
    fn model(&self) -> &str;

    /// Declared output dimension
    fn dimension(&self) -> usize;

    /// Embed one text. Transient failures should be `Error::Provider`,
    /// permanent ones `Error::ProviderRejected`.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>>;
}

/// Image embedding model (dimensionality D_image)
pub trait ImageEmbeddingProvider: Send + Sync {
    fn model(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Embed an RGB image
    fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>>;
}
