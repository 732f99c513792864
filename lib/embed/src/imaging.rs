//! Image embedding path and dominant-color extraction.
//!
//! Images are forced to RGB8 before reaching a provider and the result is
//! L2-normalized. Nothing here is cached.

use crate::provider::ImageEmbeddingProvider;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use shelfscout_core::{Error, Result, Vector};
use std::collections::HashMap;
use std::sync::Arc;

/// Default image embedding dimension (8 levels per RGB channel)
pub const DEFAULT_IMAGE_DIM: usize = 512;

const HISTOGRAM_LEVELS: usize = 8;
const COLOR_SAMPLE_SIDE: u32 = 64;

/// Decode an encoded image (PNG, JPEG, WebP)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::Image(e.to_string()))
}

pub struct ImageEmbedder {
    provider: Arc<dyn ImageEmbeddingProvider>,
}

impl ImageEmbedder {
    pub fn new(provider: Arc<dyn ImageEmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn embed(&self, image: &DynamicImage) -> Result<Vector> {
        let rgb = image.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(Error::Image("image has no pixels".into()));
        }

        let values = self.provider.embed_image(&rgb)?;
        if values.is_empty() {
            return Err(Error::EmptyEmbedding);
        }
        if values.len() != self.provider.dimension() {
            return Err(Error::InvalidDimension {
                field: "image_embedding",
                expected: self.provider.dimension(),
                actual: values.len(),
            });
        }

        let mut vector = Vector::new(values);
        vector.normalize();
        Ok(vector)
    }
}

/// Coarse RGB histogram; a dependency-free stand-in for a vision model
#[derive(Debug, Clone, Default)]
pub struct ColorHistogramImageProvider;

impl ImageEmbeddingProvider for ColorHistogramImageProvider {
    fn model(&self) -> &str {
        "rgb-histogram-8"
    }

    fn dimension(&self) -> usize {
        DEFAULT_IMAGE_DIM
    }

    fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>> {
        let mut bins = vec![0.0f32; DEFAULT_IMAGE_DIM];
        let step = 256 / HISTOGRAM_LEVELS;
        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            let idx = (r as usize / step) * HISTOGRAM_LEVELS * HISTOGRAM_LEVELS
                + (g as usize / step) * HISTOGRAM_LEVELS
                + (b as usize / step);
            bins[idx] += 1.0;
        }
        Ok(bins)
    }
}

fn color_name(r: u8, g: u8, b: u8) -> &'static str {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    if r > 220 && g > 220 && b > 220 {
        return "white";
    }
    if r < 40 && g < 40 && b < 40 {
        return "black";
    }
    if r > g && r > b {
        if g > b && r - g < 40 {
            return "orange";
        }
        return "red";
    }
    if g > r && g > b {
        return "green";
    }
    if b > r && b > g {
        return "blue";
    }
    if r > 200 && g > 200 {
        return "yellow";
    }
    if r > 150 && b > 150 {
        return "magenta";
    }
    if g > 150 && b > 150 {
        return "cyan";
    }
    "gray"
}

/// Names of the most frequent colors, deduplicated, at most `top_k`
pub fn dominant_colors(image: &DynamicImage, top_k: usize) -> Vec<String> {
    let sample = image
        .resize_exact(COLOR_SAMPLE_SIDE, COLOR_SAMPLE_SIDE, FilterType::Triangle)
        .to_rgb8();

    let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
    for pixel in sample.pixels() {
        *counts.entry(pixel.0).or_insert(0) += 1;
    }

    let mut ranked: Vec<([u8; 3], usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut names: Vec<String> = Vec::with_capacity(top_k);
    for ([r, g, b], _) in ranked.into_iter().take(top_k * 2) {
        if names.len() >= top_k {
            break;
        }
        let name = color_name(r, g, b);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
