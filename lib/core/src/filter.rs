// Structured search filters, evaluated at retrieval time
use crate::product::{tags_intersect, Product};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub trait Filter {
    fn matches(&self, product: &Product) -> bool;
}

/// Caller-constructed constraints. Every field is optional; `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub category: Option<Vec<String>>,
    pub price_min_cents: Option<u64>,
    pub price_max_cents: Option<u64>,
    pub color: Option<Vec<String>>,
    pub material: Option<Vec<String>>,
    pub size: Option<Vec<String>>,
    pub brand: Option<Vec<String>>,
    pub gender: Option<String>,
    pub in_stock: Option<bool>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject constraint combinations no product could satisfy by construction
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.price_min_cents, self.price_max_cents) {
            if min > max {
                return Err(Error::Validation(format!(
                    "price_min_cents ({min}) exceeds price_max_cents ({max})"
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Tag-set predicate: an empty filter list behaves as "no constraint"
    fn tag_predicate(wanted: &Option<Vec<String>>, have: &[String]) -> bool {
        match wanted {
            Some(w) if !w.is_empty() => tags_intersect(have, w),
            _ => true,
        }
    }

    fn brand_predicate(&self, product: &Product) -> bool {
        match &self.brand {
            Some(brands) if !brands.is_empty() => product
                .brand
                .as_deref()
                .map(|b| brands.iter().any(|w| w == b))
                .unwrap_or(false),
            _ => true,
        }
    }

    fn price_predicate(&self, product: &Product) -> bool {
        if self.price_min_cents.is_none() && self.price_max_cents.is_none() {
            return true;
        }
        let Some(price) = product.price_cents else {
            return false;
        };
        self.price_min_cents.map_or(true, |min| price >= min)
            && self.price_max_cents.map_or(true, |max| price <= max)
    }
}

impl Filter for SearchFilters {
    fn matches(&self, product: &Product) -> bool {
        Self::tag_predicate(&self.category, &product.category)
            && Self::tag_predicate(&self.color, &product.color)
            && Self::tag_predicate(&self.material, &product.material)
            && Self::tag_predicate(&self.size, &product.size)
            && self.brand_predicate(product)
            && self.price_predicate(product)
            && self
                .gender
                .as_ref()
                .map_or(true, |g| product.gender.as_ref() == Some(g))
            && self.in_stock.map_or(true, |s| product.in_stock == s)
    }
}
