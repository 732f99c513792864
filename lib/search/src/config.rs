use std::time::Duration;

/// Tunables for [`crate::SearchService`]
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Largest accepted `k`
    pub max_k: usize,
    /// Candidate multiplier when a query text is present
    pub text_oversample: usize,
    /// Candidate multiplier when ordering by recency
    pub recency_oversample: usize,
    /// Candidates pulled before recommendation boosts
    pub recommend_pool: usize,
    pub default_recommend_k: usize,
    /// Minimum store limit for image similarity queries
    pub image_min_pool: usize,
    /// Color names used to caption an image for the text fallback
    pub fallback_colors: usize,
    /// Budget applied by the async entry points
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_k: 200,
            text_oversample: 5,
            recency_oversample: 2,
            recommend_pool: 48,
            default_recommend_k: 6,
            image_min_pool: 8,
            fallback_colors: 2,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}
