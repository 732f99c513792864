//! Storage engine seam used by candidate retrieval.
//!
//! A store orders rows either by cosine distance over a vector field or by
//! recency, applies [`SearchFilters`] before the limit, and returns each row
//! with its computed distance.

use shelfscout_core::{Product, Result, SearchFilters, Vector};

/// Distance reported for rows without a usable vector
pub const MISSING_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorField {
    Text,
    Image,
}

impl VectorField {
    pub fn name(&self) -> &'static str {
        match self {
            VectorField::Text => "text_embedding",
            VectorField::Image => "image_embedding",
        }
    }

    pub fn of<'a>(&self, product: &'a Product) -> Option<&'a Vector> {
        match self {
            VectorField::Text => product.text_embedding.as_ref(),
            VectorField::Image => product.image_embedding.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CandidateOrder<'a> {
    /// Ascending cosine distance to `vector`. Rows lacking the field sort
    /// last with [`MISSING_DISTANCE`], or are dropped when `require_vector`.
    Similarity {
        field: VectorField,
        vector: &'a Vector,
        require_vector: bool,
    },
    /// Most recently updated first, then rating descending (unrated last)
    Recency,
}

#[derive(Debug, Clone, Copy)]
pub struct StoreQuery<'a> {
    pub order: CandidateOrder<'a>,
    pub filters: Option<&'a SearchFilters>,
    pub limit: usize,
}

impl<'a> StoreQuery<'a> {
    pub fn nearest_text(vector: &'a Vector, filters: Option<&'a SearchFilters>, limit: usize) -> Self {
        Self {
            order: CandidateOrder::Similarity {
                field: VectorField::Text,
                vector,
                require_vector: false,
            },
            filters,
            limit,
        }
    }

    pub fn nearest_image(vector: &'a Vector, limit: usize) -> Self {
        Self {
            order: CandidateOrder::Similarity {
                field: VectorField::Image,
                vector,
                require_vector: true,
            },
            filters: None,
            limit,
        }
    }

    pub fn recent(filters: Option<&'a SearchFilters>, limit: usize) -> Self {
        Self {
            order: CandidateOrder::Recency,
            filters,
            limit,
        }
    }
}

pub trait ProductStore: Send + Sync {
    /// Run a filtered, ordered, limited query. Returns `(product, cosine distance)`
    /// pairs; recency-ordered rows carry [`MISSING_DISTANCE`].
    fn query(&self, query: &StoreQuery<'_>) -> Result<Vec<(Product, f32)>>;
}
