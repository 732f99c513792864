//! # shelfscout
//!
//! Hybrid product search and use-case recommendations.
//!
//! shelfscout ranks catalog products by fusing vector similarity with keyword
//! overlap and domain rules, then reranks for use cases with explained boosts.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! shelfscout --catalog products.jsonl search --query "waterproof hiking boots" --k 5
//! shelfscout --catalog products.jsonl recommend --use-case "winter commute"
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use shelfscout::prelude::*;
//! use std::sync::Arc;
//!
//! let provider = HashingEmbeddingProvider::new(64);
//! let store = CatalogStore::new(CatalogConfig { text_dim: 64, image_dim: DEFAULT_IMAGE_DIM });
//! let boot = Product::new("Ridge hiking boot").with_keywords(["hiking", "boots"]);
//! let embedding = Vector::new(provider.embed(&boot.embedding_text()));
//! store.upsert(boot.with_text_embedding(embedding)).unwrap();
//!
//! let service = SearchService::new(
//!     Arc::new(EmbeddingCache::new(Arc::new(provider), CacheConfig::default())),
//!     Arc::new(ImageEmbedder::new(Arc::new(ColorHistogramImageProvider))),
//!     Arc::new(store),
//!     ServiceConfig::default(),
//! );
//! let hits = service.search(Some("hiking boots"), None, 3).unwrap();
//! assert_eq!(hits.len(), 1);
//! ```
//!
//! ## Crate Structure
//!
//! - [`shelfscout-core`](shelfscout_core) - Product model, filters, scores, vector math
//! - [`shelfscout-embed`](shelfscout_embed) - Embedding providers and the embedding cache
//! - [`shelfscout-storage`](shelfscout_storage) - In-memory catalog store and snapshots
//! - [`shelfscout-search`](shelfscout_search) - Retrieval, fusion, reranking, image search

pub use shelfscout_core::{
    Badge, Deadline, Error, Filter, Product, ProductId, Result, ScoreVector, SearchFilters, Vector,
};

pub use shelfscout_embed::{
    CacheConfig, ColorHistogramImageProvider, EmbeddingCache, EmbeddingProvider,
    HashingEmbeddingProvider, ImageEmbedder, ImageEmbeddingProvider, OpenAiConfig,
    OpenAiEmbeddingProvider, RetryPolicy, DEFAULT_IMAGE_DIM,
};

pub use shelfscout_storage::{load_snapshot, save_snapshot, CatalogConfig, CatalogStore, ProductStore};

pub use shelfscout_search::{
    ImageSearchResult, MatchSource, Recommendation, SearchHit, SearchService, ServiceConfig,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Badge, CacheConfig, CatalogConfig, CatalogStore, ColorHistogramImageProvider, Deadline,
        EmbeddingCache, EmbeddingProvider, Error, HashingEmbeddingProvider, ImageEmbedder,
        ImageSearchResult, MatchSource, Product, ProductId, ProductStore, Recommendation, Result,
        ScoreVector, SearchFilters, SearchHit, SearchService, ServiceConfig, Vector,
        DEFAULT_IMAGE_DIM,
    };
}
