//! Service root wiring the cache, retriever, fusion and reranker together.
//!
//! Everything here is constructed once at startup and shared by reference;
//! calls hold no cross-request state beyond the embedding cache.

use crate::config::ServiceConfig;
use crate::fusion::{fuse, SearchHit};
use crate::image_search::{fallback_query, nearest_by_image, ImageSearchResult, MatchSource};
use crate::recommend::{rerank, synthesize_terms, Recommendation};
use crate::retriever::CandidateRetriever;
use image::DynamicImage;
use shelfscout_core::{token_set, Deadline, Error, Result, SearchFilters};
use shelfscout_embed::{EmbeddingCache, ImageEmbedder};
use shelfscout_storage::ProductStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SearchService {
    embeddings: Arc<EmbeddingCache>,
    images: Arc<ImageEmbedder>,
    retriever: CandidateRetriever,
    config: ServiceConfig,
}

impl SearchService {
    pub fn new(
        embeddings: Arc<EmbeddingCache>,
        images: Arc<ImageEmbedder>,
        store: Arc<dyn ProductStore>,
        config: ServiceConfig,
    ) -> Self {
        let retriever = CandidateRetriever::new(embeddings.clone(), store)
            .with_oversample(config.text_oversample, config.recency_oversample);
        Self {
            embeddings,
            images,
            retriever,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingCache> {
        &self.embeddings
    }

    fn validate_k(&self, k: usize) -> Result<()> {
        if k == 0 {
            return Err(Error::Validation("k must be at least 1".into()));
        }
        if k > self.config.max_k {
            return Err(Error::Validation(format!(
                "k must be at most {}, got {}",
                self.config.max_k, k
            )));
        }
        Ok(())
    }

    fn validate(&self, filters: Option<&SearchFilters>, k: usize) -> Result<()> {
        self.validate_k(k)?;
        filters.map_or(Ok(()), SearchFilters::validate)
    }

    /// Hybrid search: ranked products with their score breakdown
    pub fn search(
        &self,
        query: Option<&str>,
        filters: Option<&SearchFilters>,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        self.search_with_deadline(query, filters, k, &Deadline::none())
    }

    pub fn search_with_deadline(
        &self,
        query: Option<&str>,
        filters: Option<&SearchFilters>,
        k: usize,
        deadline: &Deadline,
    ) -> Result<Vec<SearchHit>> {
        self.validate(filters, k)?;
        let candidates = self.retriever.retrieve(query, filters, k, deadline)?;
        let tokens = token_set(query.unwrap_or_default());
        let hits = fuse(candidates, &tokens, filters, k);
        debug!(k, returned = hits.len(), "search complete");
        Ok(hits)
    }

    /// Recommendations for a use case, each with the reasons it ranked
    pub fn recommend(
        &self,
        use_case: &str,
        constraints: Option<&SearchFilters>,
        k: Option<usize>,
    ) -> Result<Vec<Recommendation>> {
        self.recommend_with_deadline(use_case, constraints, k, &Deadline::none())
    }

    pub fn recommend_with_deadline(
        &self,
        use_case: &str,
        constraints: Option<&SearchFilters>,
        k: Option<usize>,
        deadline: &Deadline,
    ) -> Result<Vec<Recommendation>> {
        let k = k.unwrap_or(self.config.default_recommend_k);
        self.validate(constraints, k)?;
        if use_case.trim().is_empty() {
            return Err(Error::Validation("use case must not be empty".into()));
        }

        let terms = synthesize_terms(use_case, constraints);
        let query = if terms.is_empty() {
            use_case.to_string()
        } else {
            terms.join(" ")
        };
        debug!(%query, "synthesized recommendation query");

        let pool = self.config.recommend_pool.max(k);
        let candidates = self.retriever.retrieve(Some(&query), constraints, pool, deadline)?;
        let hits = fuse(candidates, &token_set(&query), constraints, pool);
        Ok(rerank(hits, constraints, &terms, k))
    }

    /// Image search, falling back to a color caption through [`Self::search`]
    pub fn search_image(&self, image: &DynamicImage, k: usize) -> Result<ImageSearchResult> {
        self.search_image_with_deadline(image, k, &Deadline::none())
    }

    pub fn search_image_with_deadline(
        &self,
        image: &DynamicImage,
        k: usize,
        deadline: &Deadline,
    ) -> Result<ImageSearchResult> {
        self.validate_k(k)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Validation("image has no pixels".into()));
        }

        match nearest_by_image(
            &self.images,
            self.retriever.store().as_ref(),
            image,
            k,
            self.config.image_min_pool,
            deadline,
        ) {
            Ok(hits) if !hits.is_empty() => {
                return Ok(ImageSearchResult {
                    source: MatchSource::Image,
                    fallback_query: None,
                    hits,
                })
            }
            Ok(_) => info!("image query returned no rows, falling back to text search"),
            Err(e) if e.is_deadline() => return Err(e),
            Err(e) => warn!(error = %e, "image query failed, falling back to text search"),
        }

        let query = fallback_query(image, self.config.fallback_colors);
        let hits = self.search_with_deadline(Some(&query), None, k, deadline)?;
        Ok(ImageSearchResult {
            source: MatchSource::TextFallback,
            fallback_query: Some(query),
            hits,
        })
    }

    fn deadline(&self) -> Deadline {
        Deadline::from_timeout(self.config.request_timeout)
    }

    /// Run blocking work on tokio's blocking pool, bounded by the request timeout
    async fn run_blocking<T, F>(self: Arc<Self>, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SearchService, &Deadline) -> Result<T> + Send + 'static,
    {
        let deadline = self.deadline();
        let timeout = self.config.request_timeout;
        let task = tokio::task::spawn_blocking(move || work(&self, &deadline));

        let joined = match timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| Error::DeadlineExceeded)?,
            None => task.await,
        };
        joined.map_err(|e| Error::Task(e.to_string()))?
    }

    pub async fn search_async(
        self: Arc<Self>,
        query: Option<String>,
        filters: Option<SearchFilters>,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        self.run_blocking(move |svc, deadline| {
            svc.search_with_deadline(query.as_deref(), filters.as_ref(), k, deadline)
        })
        .await
    }

    pub async fn recommend_async(
        self: Arc<Self>,
        use_case: String,
        constraints: Option<SearchFilters>,
        k: Option<usize>,
    ) -> Result<Vec<Recommendation>> {
        self.run_blocking(move |svc, deadline| {
            svc.recommend_with_deadline(&use_case, constraints.as_ref(), k, deadline)
        })
        .await
    }

    pub async fn search_image_async(
        self: Arc<Self>,
        image: DynamicImage,
        k: usize,
    ) -> Result<ImageSearchResult> {
        self.run_blocking(move |svc, deadline| svc.search_image_with_deadline(&image, k, deadline))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use shelfscout_core::{Product, Vector};
    use shelfscout_embed::{
        CacheConfig, ColorHistogramImageProvider, EmbeddingProvider, HashingEmbeddingProvider,
    };
    use shelfscout_storage::{CatalogConfig, CatalogStore, StoreQuery};
    use std::time::Duration;

    const DIM: usize = 64;

    fn catalog() -> Arc<CatalogStore> {
        let provider = HashingEmbeddingProvider::new(DIM);
        let store = CatalogStore::new(CatalogConfig {
            text_dim: DIM,
            image_dim: 512,
        });
        let products = [
            Product::new("Ridge waterproof hiking boot")
                .with_id("boot")
                .with_brand("Northline")
                .with_category(["shoes"])
                .with_material(["leather"])
                .with_keywords(["hiking", "waterproof", "boots"])
                .with_price_cents(4000)
                .with_rating(4.7),
            Product::new("Breeze mesh running shoe")
                .with_id("runner")
                .with_brand("Fleet")
                .with_category(["shoes"])
                .with_material(["mesh"])
                .with_color(["red"])
                .with_keywords(["running", "breathable", "lightweight"])
                .with_price_cents(7000),
            Product::new("Harbor wool coat")
                .with_id("coat")
                .with_brand("Northline")
                .with_category(["outerwear"])
                .with_keywords(["warm", "insulated"])
                .with_price_cents(12000)
                .with_in_stock(false),
        ];
        for p in products {
            let v = Vector::new(provider.embed(&p.embedding_text()));
            store.import(p.with_text_embedding(v)).unwrap();
        }
        Arc::new(store)
    }

    fn service_over(store: Arc<dyn ProductStore>, config: ServiceConfig) -> SearchService {
        let cache = EmbeddingCache::new(Arc::new(HashingEmbeddingProvider::new(DIM)), CacheConfig::default());
        SearchService::new(
            Arc::new(cache),
            Arc::new(ImageEmbedder::new(Arc::new(ColorHistogramImageProvider))),
            store,
            config,
        )
    }

    fn service() -> SearchService {
        service_over(catalog(), ServiceConfig::default())
    }

    #[test]
    fn test_k_validation() {
        let svc = service();
        assert!(matches!(svc.search(Some("boots"), None, 0), Err(Error::Validation(_))));
        assert!(matches!(svc.search(Some("boots"), None, 201), Err(Error::Validation(_))));
        assert!(svc.search(Some("boots"), None, 200).is_ok());
    }

    #[test]
    fn test_inverted_price_range_rejected() {
        let filters = SearchFilters {
            price_min_cents: Some(5000),
            price_max_cents: Some(1000),
            ..Default::default()
        };
        assert!(matches!(
            service().search(None, Some(&filters), 3),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_search_ranks_matching_product_first() {
        let hits = service().search(Some("waterproof hiking boots"), None, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].product.id.as_str(), "boot");
        assert_eq!(hits[0].scores.keyword, 1.0);
    }

    #[test]
    fn test_search_is_deterministic() {
        let svc = service();
        let ids = |hits: Vec<SearchHit>| hits.into_iter().map(|h| h.product.id).collect::<Vec<_>>();
        let a = ids(svc.search(Some("shoes"), None, 3).unwrap());
        let b = ids(svc.search(Some("shoes"), None, 3).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_filters_pushed_down() {
        let filters = SearchFilters {
            in_stock: Some(true),
            ..Default::default()
        };
        let hits = service().search(Some("warm coat"), Some(&filters), 5).unwrap();
        assert!(hits.iter().all(|h| h.product.in_stock));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_recommend_reason_and_default_k() {
        let constraints = SearchFilters {
            brand: Some(vec!["Northline".into()]),
            price_max_cents: Some(5000),
            ..Default::default()
        };
        let recs = service().recommend("hiking trip", Some(&constraints), None).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].product.id.as_str(), "boot");
        assert!(recs[0].reason.contains("brand match: Northline; within budget"));
        assert!(recs[0].score >= recs[0].scores.final_score + 0.25 - 1e-6);
    }

    #[test]
    fn test_recommend_rejects_blank_use_case() {
        assert!(matches!(service().recommend("  ", None, None), Err(Error::Validation(_))));
    }

    #[test]
    fn test_image_search_falls_back_without_image_embeddings() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([250, 10, 10])));
        let result = service().search_image(&img, 2).unwrap();
        assert_eq!(result.source, MatchSource::TextFallback);
        assert_eq!(result.fallback_query.as_deref(), Some("photo product red"));
        assert!(!result.hits.is_empty());
    }

    struct ImageBrokenStore(Arc<CatalogStore>);

    impl ProductStore for ImageBrokenStore {
        fn query(&self, query: &StoreQuery<'_>) -> Result<Vec<(Product, f32)>> {
            match query.order {
                shelfscout_storage::CandidateOrder::Similarity {
                    field: shelfscout_storage::VectorField::Image,
                    ..
                } => Err(Error::Storage("image index offline".into())),
                _ => self.0.query(query),
            }
        }
    }

    #[test]
    fn test_image_search_falls_back_on_store_error() {
        let svc = service_over(Arc::new(ImageBrokenStore(catalog())), ServiceConfig::default());
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([10, 10, 250])));
        let result = svc.search_image(&img, 1).unwrap();
        assert_eq!(result.source, MatchSource::TextFallback);
        assert_eq!(result.hits.len(), 1);
    }

    #[test]
    fn test_image_without_pixels_rejected() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(service().search_image(&empty, 3), Err(Error::Validation(_))));
    }

    struct SlowProvider;

    impl EmbeddingProvider for SlowProvider {
        fn model(&self) -> &str {
            "slow"
        }
        fn dimension(&self) -> usize {
            DIM
        }
        fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
            std::thread::sleep(Duration::from_millis(300));
            HashingEmbeddingProvider::new(DIM).embed_text(text)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_search_async_matches_sync() {
        let svc = Arc::new(service());
        let sync_ids: Vec<_> = svc
            .search(Some("running shoe"), None, 2)
            .unwrap()
            .into_iter()
            .map(|h| h.product.id)
            .collect();
        let async_ids: Vec<_> = svc
            .clone()
            .search_async(Some("running shoe".into()), None, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.product.id)
            .collect();
        assert_eq!(sync_ids, async_ids);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_timeout_reports_deadline() {
        let cache = EmbeddingCache::new(Arc::new(SlowProvider), CacheConfig::default());
        let svc = Arc::new(SearchService::new(
            Arc::new(cache),
            Arc::new(ImageEmbedder::new(Arc::new(ColorHistogramImageProvider))),
            catalog(),
            ServiceConfig {
                request_timeout: Some(Duration::from_millis(50)),
                ..Default::default()
            },
        ));
        let err = svc.search_async(Some("boots".into()), None, 3).await.unwrap_err();
        assert!(err.is_deadline());
    }
}
