//! # shelfscout Search
//!
//! Hybrid product search on top of the embedding cache and product store.
//!
//! ## Pipeline
//!
//! ```text
//!   query ──> EmbeddingCache ──> CandidateRetriever ──> fuse ──> SearchHit
//!                                   (filters pushed       │
//!                                    into the store)      └──> rerank ──> Recommendation
//! ```
//!
//! - [`CandidateRetriever`] - oversampled, filtered candidates with semantic scores
//! - [`fusion`] - keyword and rule signals fused with the semantic score
//! - [`recommend`] - use-case term synthesis and explained boosts
//! - [`image_search`] - image similarity with a logged text fallback
//! - [`SearchService`] - the service root constructed at startup

pub mod config;
pub mod fusion;
pub mod image_search;
pub mod recommend;
pub mod retriever;
pub mod service;

pub use config::ServiceConfig;
pub use fusion::{fuse, keyword_score, rule_score, score, Rule, RuleContext, SearchHit, RULES};
pub use image_search::{fallback_query, ImageSearchResult, MatchSource};
pub use recommend::{rerank, synthesize_terms, Boost, BoostContext, Bonus, Recommendation, BOOSTS, EXPANSIONS};
pub use retriever::{Candidate, CandidateRetriever};
pub use service::SearchService;
