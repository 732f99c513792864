//! Candidate retrieval: embeds the query, pushes filters into the store and
//! returns an oversampled, ordered candidate list with semantic scores.

use shelfscout_core::{clamp_unit, Deadline, Error, Product, Result, SearchFilters};
use shelfscout_embed::EmbeddingCache;
use shelfscout_storage::{ProductStore, StoreQuery};
use std::sync::Arc;
use tracing::debug;

/// A retrieved product with its semantic score in `[0, 1]`
#[derive(Debug, Clone)]
pub struct Candidate {
    pub product: Product,
    pub semantic: f32,
}

pub struct CandidateRetriever {
    embeddings: Arc<EmbeddingCache>,
    store: Arc<dyn ProductStore>,
    text_oversample: usize,
    recency_oversample: usize,
}

impl CandidateRetriever {
    pub fn new(embeddings: Arc<EmbeddingCache>, store: Arc<dyn ProductStore>) -> Self {
        Self {
            embeddings,
            store,
            text_oversample: 5,
            recency_oversample: 2,
        }
    }

    #[must_use]
    pub fn with_oversample(mut self, text: usize, recency: usize) -> Self {
        self.text_oversample = text.max(1);
        self.recency_oversample = recency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn ProductStore> {
        &self.store
    }

    /// Number of candidates requested from the store for a given `k`
    pub fn oversample_count(&self, k: usize, has_query: bool) -> usize {
        let factor = if has_query {
            self.text_oversample
        } else {
            self.recency_oversample
        };
        k.max(1).saturating_mul(factor)
    }

    pub fn retrieve(
        &self,
        query: Option<&str>,
        filters: Option<&SearchFilters>,
        k: usize,
        deadline: &Deadline,
    ) -> Result<Vec<Candidate>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let limit = self.oversample_count(k, query.is_some());

        let rows = match query {
            Some(text) => {
                let vector = self
                    .embeddings
                    .embed_with_deadline(text, deadline)
                    .map_err(|e| Error::retrieval("embedding", e))?;
                deadline.check()?;
                self.store
                    .query(&StoreQuery::nearest_text(&vector, filters, limit))
                    .map_err(|e| Error::retrieval("store", e))?
                    .into_iter()
                    .map(|(product, distance)| Candidate {
                        product,
                        semantic: clamp_unit(1.0 - distance),
                    })
                    .collect::<Vec<_>>()
            }
            None => {
                deadline.check()?;
                self.store
                    .query(&StoreQuery::recent(filters, limit))
                    .map_err(|e| Error::retrieval("store", e))?
                    .into_iter()
                    .map(|(product, _)| Candidate {
                        product,
                        semantic: 0.0,
                    })
                    .collect()
            }
        };

        debug!(
            has_query = query.is_some(),
            limit,
            returned = rows.len(),
            "candidates retrieved"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfscout_core::Vector;
    use shelfscout_embed::{CacheConfig, EmbeddingProvider, HashingEmbeddingProvider, RetryPolicy};
    use shelfscout_storage::{CatalogConfig, CatalogStore};

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn model(&self) -> &str {
            "failing"
        }
        fn dimension(&self) -> usize {
            8
        }
        fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::ProviderRejected("401".into()))
        }
    }

    struct BrokenStore;

    impl ProductStore for BrokenStore {
        fn query(&self, _query: &StoreQuery<'_>) -> Result<Vec<(Product, f32)>> {
            Err(Error::Storage("connection reset".into()))
        }
    }

    fn retriever_over(store: Arc<dyn ProductStore>) -> CandidateRetriever {
        let cache = EmbeddingCache::new(Arc::new(HashingEmbeddingProvider::new(8)), CacheConfig::default());
        CandidateRetriever::new(Arc::new(cache), store)
    }

    fn store_with(products: Vec<Product>) -> Arc<CatalogStore> {
        let store = CatalogStore::new(CatalogConfig {
            text_dim: 8,
            image_dim: 4,
        });
        for p in products {
            store.import(p).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_oversample_counts() {
        let r = retriever_over(store_with(vec![]));
        assert_eq!(r.oversample_count(4, true), 20);
        assert_eq!(r.oversample_count(4, false), 8);
        assert_eq!(r.oversample_count(0, true), 5);
    }

    #[test]
    fn test_query_scores_and_limits() {
        let provider = HashingEmbeddingProvider::new(8);
        let products = (0..30)
            .map(|i| {
                let text = format!("item {i}");
                Product::new(text.clone())
                    .with_id(text.clone())
                    .with_text_embedding(Vector::new(provider.embed(&text)))
            })
            .collect();
        let r = retriever_over(store_with(products));

        let rows = r.retrieve(Some("item 3"), None, 2, &Deadline::none()).unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].product.id.as_str(), "item 3");
        assert!((rows[0].semantic - 1.0).abs() < 1e-5);
        assert!(rows.windows(2).all(|w| w[0].semantic >= w[1].semantic));
        assert!(rows.iter().all(|c| (0.0..=1.0).contains(&c.semantic)));
    }

    #[test]
    fn test_missing_embedding_scores_zero() {
        let r = retriever_over(store_with(vec![Product::new("bare")]));
        let rows = r.retrieve(Some("anything"), None, 1, &Deadline::none()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].semantic, 0.0);
    }

    #[test]
    fn test_blank_query_uses_recency() {
        let r = retriever_over(store_with(vec![Product::new("a"), Product::new("b"), Product::new("c")]));
        let rows = r.retrieve(Some("   "), None, 1, &Deadline::none()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|c| c.semantic == 0.0));
    }

    #[test]
    fn test_embedding_failure_is_retrieval_error() {
        let cache = EmbeddingCache::new(
            Arc::new(FailingProvider),
            CacheConfig {
                retry: RetryPolicy::immediate(1),
                ..Default::default()
            },
        );
        let r = CandidateRetriever::new(Arc::new(cache), store_with(vec![]));
        let err = r.retrieve(Some("boots"), None, 3, &Deadline::none()).unwrap_err();
        assert!(matches!(err, Error::Retrieval { stage: "embedding", .. }));
    }

    #[test]
    fn test_store_failure_is_retrieval_error() {
        let r = retriever_over(Arc::new(BrokenStore));
        let err = r.retrieve(None, None, 3, &Deadline::none()).unwrap_err();
        assert!(matches!(err, Error::Retrieval { stage: "store", .. }));
    }
}
