use crate::store::{CandidateOrder, ProductStore, StoreQuery, VectorField, MISSING_DISTANCE};
use chrono::Utc;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use rayon::prelude::*;
use shelfscout_core::{Error, Filter, Product, ProductId, Result, Vector};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Declared embedding dimensions for a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    pub text_dim: usize,
    pub image_dim: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            text_dim: 1536,
            image_dim: 512,
        }
    }
}

#[derive(Default)]
struct CatalogRows {
    products: Vec<Arc<Product>>,
    index: HashMap<ProductId, usize>,
}

/// In-memory product catalog
///
/// Rows keep insertion order, which is the final tie-break of every ordering.
/// Queries copy the row list under a short read lock and score outside it.
pub struct CatalogStore {
    config: CatalogConfig,
    rows: RwLock<CatalogRows>,
}

impl CatalogStore {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            rows: RwLock::new(CatalogRows::default()),
        }
    }

    pub fn config(&self) -> CatalogConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.rows.read().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dimensions(&self, product: &Product) -> Result<()> {
        let checks = [
            ("text_embedding", product.text_embedding.as_ref(), self.config.text_dim),
            ("image_embedding", product.image_embedding.as_ref(), self.config.image_dim),
        ];
        for (field, embedding, expected) in checks {
            if let Some(v) = embedding {
                if v.dim() != expected {
                    return Err(Error::InvalidDimension {
                        field,
                        expected,
                        actual: v.dim(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Insert or replace a product, stamping its timestamps.
    /// `created_at` survives replacement; `updated_at` is always now.
    pub fn upsert(&self, mut product: Product) -> Result<()> {
        self.check_dimensions(&product)?;

        let now = Utc::now();
        let mut rows = self.rows.write();
        product.created_at = match rows.index.get(&product.id) {
            Some(&pos) => rows.products[pos].created_at,
            None => now,
        };
        product.updated_at = now;
        Self::put(&mut rows, product);
        Ok(())
    }

    /// Insert or replace a product keeping the timestamps it carries
    pub fn import(&self, product: Product) -> Result<()> {
        self.check_dimensions(&product)?;
        Self::put(&mut self.rows.write(), product);
        Ok(())
    }

    fn put(rows: &mut CatalogRows, product: Product) {
        match rows.index.get(&product.id) {
            Some(&pos) => rows.products[pos] = Arc::new(product),
            None => {
                rows.index.insert(product.id.clone(), rows.products.len());
                rows.products.push(Arc::new(product));
            }
        }
    }

    pub fn get(&self, id: &ProductId) -> Option<Product> {
        let rows = self.rows.read();
        rows.index.get(id).map(|&pos| (*rows.products[pos]).clone())
    }

    /// All products in insertion order
    pub fn products(&self) -> Vec<Product> {
        self.snapshot_rows().iter().map(|p| (**p).clone()).collect()
    }

    fn snapshot_rows(&self) -> Vec<Arc<Product>> {
        self.rows.read().products.clone()
    }

    /// Compute text embeddings for products that lack one. Returns how many were filled.
    pub fn backfill_text_embeddings<F>(&self, mut embed: F) -> Result<usize>
    where
        F: FnMut(&Product) -> Result<Vector>,
    {
        let mut filled = 0;
        for product in self.snapshot_rows() {
            if product.text_embedding.is_some() {
                continue;
            }
            let embedding = embed(&product)?;
            let updated = (*product).clone().with_text_embedding(embedding);
            self.upsert(updated)?;
            filled += 1;
        }
        if filled > 0 {
            info!(filled, "backfilled text embeddings");
        }
        Ok(filled)
    }

    /// Import products from a JSON-lines file, one product object per line
    pub fn load_jsonl<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let file = std::fs::File::open(path.as_ref())?;
        let mut loaded = 0;
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let product: Product = serde_json::from_str(&line)
                .map_err(|e| Error::Serialization(format!("line {}: {}", lineno + 1, e)))?;
            self.import(product)?;
            loaded += 1;
        }
        info!(path = %path.as_ref().display(), loaded, "catalog loaded");
        Ok(loaded)
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}

fn rating_desc_nulls_last(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => OrderedFloat(y).cmp(&OrderedFloat(x)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl ProductStore for CatalogStore {
    fn query(&self, query: &StoreQuery<'_>) -> Result<Vec<(Product, f32)>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let rows = self.snapshot_rows();
        let mut candidates: Vec<(usize, &Arc<Product>)> = rows
            .iter()
            .enumerate()
            .filter(|(_, p)| query.filters.map_or(true, |f| f.matches(p)))
            .collect();

        let selected: Vec<(&Arc<Product>, f32)> = match query.order {
            CandidateOrder::Similarity {
                field,
                vector,
                require_vector,
            } => {
                let expected = match field {
                    VectorField::Text => self.config.text_dim,
                    VectorField::Image => self.config.image_dim,
                };
                if vector.dim() != expected {
                    return Err(Error::InvalidDimension {
                        field: field.name(),
                        expected,
                        actual: vector.dim(),
                    });
                }

                let mut scored: Vec<(usize, Option<f32>, &Arc<Product>)> = candidates
                    .par_iter()
                    .filter_map(|&(pos, p)| match field.of(p) {
                        Some(embedding) => Some((pos, Some(vector.cosine_distance(embedding)), p)),
                        None if require_vector => None,
                        None => Some((pos, None, p)),
                    })
                    .collect();

                scored.sort_by_key(|(pos, distance, _)| {
                    (distance.is_none(), OrderedFloat(distance.unwrap_or(MISSING_DISTANCE)), *pos)
                });
                scored
                    .into_iter()
                    .take(query.limit)
                    .map(|(_, distance, p)| (p, distance.unwrap_or(MISSING_DISTANCE)))
                    .collect()
            }
            CandidateOrder::Recency => {
                candidates.sort_by(|(pa, a), (pb, b)| {
                    b.updated_at
                        .cmp(&a.updated_at)
                        .then_with(|| rating_desc_nulls_last(a.rating, b.rating))
                        .then(pa.cmp(pb))
                });
                candidates
                    .into_iter()
                    .take(query.limit)
                    .map(|(_, p)| (p, MISSING_DISTANCE))
                    .collect()
            }
        };

        debug!(rows = rows.len(), returned = selected.len(), limit = query.limit, "store query");
        Ok(selected.into_iter().map(|(p, d)| ((**p).clone(), d)).collect())
    }
}
