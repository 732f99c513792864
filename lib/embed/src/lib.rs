//! # shelfscout Embed
//!
//! Embedding acquisition for the shelfscout search engine.
//!
//! - [`EmbeddingCache`] - normalized-text LRU cache in front of a text provider,
//!   with exponential-backoff retries and in-flight deduplication
//! - [`EmbeddingProvider`] / [`ImageEmbeddingProvider`] - model seams
//! - [`OpenAiEmbeddingProvider`] - OpenAI-compatible HTTP provider
//! - [`HashingEmbeddingProvider`] - deterministic offline provider
//! - [`ImageEmbedder`] - RGB canonicalization and normalization for image vectors
//! - [`dominant_colors`] - color names used to caption images for text fallback
//!
//! ## Example
//!
//! ```rust
//! use shelfscout_embed::{CacheConfig, EmbeddingCache, HashingEmbeddingProvider};
//! use std::sync::Arc;
//!
//! let cache = EmbeddingCache::new(
//!     Arc::new(HashingEmbeddingProvider::new(64)),
//!     CacheConfig::default(),
//! );
//! let a = cache.embed("Trail  Running Shoes").unwrap();
//! let b = cache.embed("trail running shoes").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(cache.stats().hits, 1);
//! ```

pub mod cache;
pub mod hashing;
pub mod imaging;
pub mod openai;
pub mod provider;

pub use cache::{normalize_text, CacheConfig, CacheStats, EmbeddingCache, RetryPolicy, DEFAULT_CACHE_CAPACITY};
pub use hashing::{HashingEmbeddingProvider, DEFAULT_HASHING_DIM};
pub use imaging::{decode_image, dominant_colors, ColorHistogramImageProvider, ImageEmbedder, DEFAULT_IMAGE_DIM};
pub use openai::{OpenAiConfig, OpenAiEmbeddingProvider};
pub use provider::{EmbeddingProvider, ImageEmbeddingProvider};
