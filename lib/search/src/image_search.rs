//! Image similarity search with an explicit text fallback.
//!
//! The image path embeds the picture and asks the store for the nearest
//! `image_embedding` rows. When that path errors, or succeeds with no rows, the
//! caller falls back to a caption built from the image's dominant colors.

use crate::fusion::SearchHit;
use image::DynamicImage;
use serde::Serialize;
use shelfscout_core::{clamp_unit, Deadline, Error, Result, ScoreVector};
use shelfscout_embed::{dominant_colors, ImageEmbedder};
use shelfscout_storage::{ProductStore, StoreQuery};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Image,
    TextFallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSearchResult {
    pub source: MatchSource,
    /// Caption searched when the image path produced nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_query: Option<String>,
    pub hits: Vec<SearchHit>,
}

/// Caption for an image: `"photo product"` followed by its dominant color names
pub fn fallback_query(image: &DynamicImage, colors: usize) -> String {
    let mut query = String::from("photo product");
    for color in dominant_colors(image, colors) {
        query.push(' ');
        query.push_str(&color);
    }
    query
}

/// Nearest products by image embedding, best first, at most `k`.
/// The store is asked for `max(k, min_pool)` rows.
pub fn nearest_by_image(
    embedder: &ImageEmbedder,
    store: &dyn ProductStore,
    image: &DynamicImage,
    k: usize,
    min_pool: usize,
    deadline: &Deadline,
) -> Result<Vec<SearchHit>> {
    let vector = embedder
        .embed(image)
        .map_err(|e| Error::retrieval("embedding", e))?;
    deadline.check()?;

    let limit = k.max(min_pool);
    let rows = store
        .query(&StoreQuery::nearest_image(&vector, limit))
        .map_err(|e| Error::retrieval("store", e))?;
    debug!(limit, returned = rows.len(), "image candidates retrieved");

    Ok(rows
        .into_iter()
        .take(k)
        .map(|(product, distance)| {
            let badges = product.badges();
            SearchHit {
                product,
                scores: ScoreVector::fuse(clamp_unit(1.0 - distance), 0.0, 0.0),
                badges,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use shelfscout_core::{Product, Vector};
    use shelfscout_embed::ColorHistogramImageProvider;
    use shelfscout_storage::{CatalogConfig, CatalogStore};
    use std::sync::Arc;

    fn solid(rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(rgb)))
    }

    #[test]
    fn test_fallback_query_names_colors() {
        assert_eq!(fallback_query(&solid([250, 10, 10]), 2), "photo product red");
        assert_eq!(fallback_query(&solid([250, 10, 10]), 0), "photo product");
    }

    #[test]
    fn test_nearest_by_image_ranks_matching_color_first() {
        let embedder = ImageEmbedder::new(Arc::new(ColorHistogramImageProvider));
        let store = CatalogStore::new(CatalogConfig {
            text_dim: 4,
            image_dim: embedder.dimension(),
        });
        for (id, rgb) in [("blue", [10, 10, 250]), ("red", [250, 10, 10])] {
            let v: Vector = embedder.embed(&solid(rgb)).unwrap();
            store
                .import(Product::new(id).with_id(id).with_image_embedding(v))
                .unwrap();
        }
        store.import(Product::new("no image")).unwrap();

        let hits = nearest_by_image(&embedder, &store, &solid([250, 10, 10]), 1, 8, &Deadline::none()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.id.as_str(), "red");
        assert!(hits[0].scores.semantic > 0.99);
    }

    #[test]
    fn test_no_image_rows_is_empty_not_error() {
        let embedder = ImageEmbedder::new(Arc::new(ColorHistogramImageProvider));
        let store = CatalogStore::new(CatalogConfig {
            text_dim: 4,
            image_dim: embedder.dimension(),
        });
        store.import(Product::new("plain")).unwrap();
        let hits = nearest_by_image(&embedder, &store, &solid([0, 0, 0]), 3, 8, &Deadline::none()).unwrap();
        assert!(hits.is_empty());
    }
}
