//! # shelfscout Core
//!
//! Core data model for the shelfscout product search engine.
//!
//! - [`Product`] - A catalog product with tag sets and optional embeddings
//! - [`SearchFilters`] - Structured constraints pushed down into retrieval
//! - [`ScoreVector`] - Semantic, keyword and rule signals with the fused score
//! - [`Vector`] - Dense embedding with cosine distance
//! - [`Deadline`] - Caller time budget propagated through every stage
//!
//! ## Example
//!
//! ```rust
//! use shelfscout_core::{Filter, Product, SearchFilters, ScoreVector};
//!
//! let product = Product::new("Trail Runner")
//!     .with_brand("Northline")
//!     .with_category(["shoes"])
//!     .with_price_cents(4000);
//!
//! let filters = SearchFilters {
//!     category: Some(vec!["Shoes".to_string()]),
//!     price_max_cents: Some(5000),
//!     ..Default::default()
//! };
//! assert!(filters.matches(&product));
//!
//! let scores = ScoreVector::fuse(0.8, 0.5, 0.5);
//! assert!(scores.final_score > 0.0);
//! ```

pub mod deadline;
pub mod error;
pub mod filter;
pub mod product;
pub mod score;
pub mod tokenize;
pub mod vector;

pub use deadline::Deadline;
pub use error::{Error, Result};
pub use filter::{Filter, SearchFilters};
pub use product::{tags_intersect, Badge, Product, ProductId};
pub use score::{clamp_unit, ScoreVector, KEYWORD_WEIGHT, RULE_WEIGHT, SEMANTIC_WEIGHT};
pub use tokenize::{token_set, tokenize, TokenSet};
pub use vector::Vector;
