//! Use-case recommendations
//!
//! A use case ("weekend hiking trip") is expanded into query terms, searched
//! like any other query, then reranked with additive boosts. Each boost that
//! fires contributes a clause to the human-readable reason.

use crate::fusion::SearchHit;
use serde::Serialize;
use shelfscout_core::{tags_intersect, Badge, Product, ScoreVector, SearchFilters};
use smallvec::SmallVec;

/// Max price (minor units) at or below which the use case is treated as budget shopping
pub const BUDGET_TERM_MAX_CENTS: u64 = 5000;

pub const DEFAULT_REASON: &str = "best overall fit";

/// Use-case substrings and the query terms they contribute
pub struct Expansion {
    pub triggers: &'static [&'static str],
    pub terms: &'static [&'static str],
}

pub static EXPANSIONS: &[Expansion] = &[
    Expansion {
        triggers: &["run"],
        terms: &["running", "breathable", "lightweight"],
    },
    Expansion {
        triggers: &["hot", "summer"],
        terms: &["breathable", "mesh", "lightweight"],
    },
    Expansion {
        triggers: &["hike", "trail"],
        terms: &["hiking", "waterproof", "grip", "leather"],
    },
    Expansion {
        triggers: &["winter", "cold"],
        terms: &["insulated", "warm", "puffer"],
    },
    Expansion {
        triggers: &["office"],
        terms: &["casual", "loafers", "comfortable"],
    },
];

/// Build the lowercase, de-duplicated term list for a use case.
/// Order is expansions, budget, then category, brand, color and material constraints.
pub fn synthesize_terms(use_case: &str, constraints: Option<&SearchFilters>) -> Vec<String> {
    let lowered = use_case.to_lowercase();
    let mut terms: Vec<String> = Vec::new();
    let mut push = |term: &str| {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    };

    for expansion in EXPANSIONS {
        if expansion.triggers.iter().any(|t| lowered.contains(t)) {
            expansion.terms.iter().for_each(|t| push(t));
        }
    }

    if let Some(c) = constraints {
        if c.price_max_cents.is_some_and(|max| max <= BUDGET_TERM_MAX_CENTS) {
            push("budget");
        }
        for tags in [&c.category, &c.brand, &c.color, &c.material].into_iter().flatten() {
            tags.iter().for_each(|t| push(t));
        }
    }
    terms
}

pub struct BoostContext<'a> {
    pub product: &'a Product,
    pub constraints: Option<&'a SearchFilters>,
    /// Synthesized query terms, lowercase
    pub terms: &'a [String],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bonus {
    pub amount: f32,
    pub reason: String,
}

impl Bonus {
    fn new(amount: f32, reason: impl Into<String>) -> Self {
        Self {
            amount,
            reason: reason.into(),
        }
    }
}

pub struct Boost {
    pub name: &'static str,
    pub evaluate: fn(&BoostContext<'_>) -> Option<Bonus>,
}

fn tag_boost(
    cx: &BoostContext<'_>,
    wanted: impl Fn(&SearchFilters) -> Option<&Vec<String>>,
    have: &[String],
    amount: f32,
    reason: &str,
) -> Option<Bonus> {
    let wanted = cx.constraints.and_then(wanted)?;
    tags_intersect(have, wanted).then(|| Bonus::new(amount, reason))
}

pub static BOOSTS: &[Boost] = &[
    Boost {
        name: "brand",
        evaluate: |cx| {
            let brand = cx.product.brand.as_deref()?;
            let wanted = cx.constraints?.brand.as_ref()?;
            wanted
                .iter()
                .any(|w| w == brand)
                .then(|| Bonus::new(0.15, format!("brand match: {brand}")))
        },
    },
    Boost {
        name: "category",
        evaluate: |cx| tag_boost(cx, |c| c.category.as_ref(), &cx.product.category, 0.10, "category match"),
    },
    Boost {
        name: "color",
        evaluate: |cx| tag_boost(cx, |c| c.color.as_ref(), &cx.product.color, 0.05, "color match"),
    },
    Boost {
        name: "material",
        evaluate: |cx| tag_boost(cx, |c| c.material.as_ref(), &cx.product.material, 0.05, "material match"),
    },
    Boost {
        name: "budget",
        evaluate: |cx| {
            let max = cx.constraints?.price_max_cents?;
            let price = cx.product.price_cents?;
            if price <= max {
                Some(Bonus::new(0.10, "within budget"))
            } else if price.saturating_mul(5) <= max.saturating_mul(6) {
                Some(Bonus::new(0.05, "near budget"))
            } else {
                None
            }
        },
    },
    Boost {
        name: "use-case keywords",
        evaluate: |cx| {
            tags_intersect(&cx.product.keywords, cx.terms).then(|| Bonus::new(0.10, "use-case keywords"))
        },
    },
];

/// Every boost that fires for a product, in table order
pub fn boosts_for(cx: &BoostContext<'_>) -> SmallVec<[Bonus; 4]> {
    BOOSTS.iter().filter_map(|b| (b.evaluate)(cx)).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub product: Product,
    /// Fused score plus boosts
    pub score: f32,
    pub scores: ScoreVector,
    pub reason: String,
    pub badges: Vec<Badge>,
}

/// Apply boosts to fused hits, stable-sort by boosted score and keep `k`
pub fn rerank(
    hits: Vec<SearchHit>,
    constraints: Option<&SearchFilters>,
    terms: &[String],
    k: usize,
) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = hits
        .into_iter()
        .map(|hit| {
            let bonuses = boosts_for(&BoostContext {
                product: &hit.product,
                constraints,
                terms,
            });
            let score = hit.scores.final_score + bonuses.iter().map(|b| b.amount).sum::<f32>();
            let reason = if bonuses.is_empty() {
                DEFAULT_REASON.to_string()
            } else {
                bonuses
                    .iter()
                    .map(|b| b.reason.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            Recommendation {
                product: hit.product,
                score,
                scores: hit.scores,
                reason,
                badges: hit.badges,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(product: Product, final_score: f32) -> SearchHit {
        let badges = product.badges();
        SearchHit {
            product,
            scores: ScoreVector {
                semantic: 0.0,
                keyword: 0.0,
                rule: 0.0,
                final_score,
            },
            badges,
        }
    }

    fn budget(max: u64) -> SearchFilters {
        SearchFilters {
            price_max_cents: Some(max),
            ..Default::default()
        }
    }

    #[test]
    fn test_terms_from_expansions_and_constraints() {
        let constraints = SearchFilters {
            brand: Some(vec!["Northline".into()]),
            color: Some(vec!["Brown".into()]),
            price_max_cents: Some(5000),
            ..Default::default()
        };
        let terms = synthesize_terms("Hiking trip on a rocky trail", Some(&constraints));
        assert_eq!(
            terms,
            vec!["hiking", "waterproof", "grip", "leather", "budget", "northline", "brown"]
        );
    }

    #[test]
    fn test_overlapping_expansions_dedupe() {
        let terms = synthesize_terms("hot summer run", None);
        assert_eq!(terms, vec!["running", "breathable", "lightweight", "mesh"]);
    }

    #[test]
    fn test_unknown_use_case_has_no_terms() {
        assert!(synthesize_terms("birthday gift", None).is_empty());
        assert!(!synthesize_terms("gift", Some(&budget(6000))).contains(&"budget".to_string()));
    }

    #[test]
    fn test_brand_and_budget_boosts_add() {
        let constraints = SearchFilters {
            brand: Some(vec!["Northline".into()]),
            price_max_cents: Some(5000),
            ..Default::default()
        };
        let product = Product::new("boot").with_brand("Northline").with_price_cents(4000);
        let ranked = rerank(vec![hit(product, 0.3)], Some(&constraints), &[], 6);

        assert!((ranked[0].score - 0.55).abs() < 1e-6);
        assert_eq!(ranked[0].reason, "brand match: Northline; within budget");
    }

    #[test]
    fn test_brand_boost_needs_exact_brand() {
        let constraints = SearchFilters {
            brand: Some(vec!["NORTHLINE".into()]),
            ..Default::default()
        };
        let product = Product::new("boot").with_brand("Northline");
        let ranked = rerank(vec![hit(product, 0.3)], Some(&constraints), &[], 6);
        assert_eq!(ranked[0].reason, DEFAULT_REASON);
    }

    #[test]
    fn test_near_budget_is_exclusive() {
        let near = Product::new("a").with_price_cents(5900);
        let over = Product::new("b").with_price_cents(6100);
        let constraints = budget(5000);
        let ranked = rerank(vec![hit(near, 0.0), hit(over, 0.0)], Some(&constraints), &[], 6);
        assert_eq!(ranked[0].reason, "near budget");
        assert!((ranked[0].score - 0.05).abs() < 1e-6);
        assert_eq!(ranked[1].reason, DEFAULT_REASON);
    }

    #[test]
    fn test_keyword_boost_uses_terms() {
        let product = Product::new("x").with_keywords(["Hiking"]);
        let terms = vec!["hiking".to_string()];
        let ranked = rerank(vec![hit(product, 0.0)], None, &terms, 6);
        assert_eq!(ranked[0].reason, "use-case keywords");
    }

    #[test]
    fn test_boosts_can_reorder_and_k_truncates() {
        let constraints = SearchFilters {
            color: Some(vec!["red".into()]),
            ..Default::default()
        };
        let plain = Product::new("plain").with_id("plain");
        let red = Product::new("red").with_id("red").with_color(["RED"]);
        let ranked = rerank(
            vec![hit(plain.clone(), 0.52), hit(red, 0.50), hit(plain, 0.1)],
            Some(&constraints),
            &[],
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].product.id.as_str(), "red");
        assert_eq!(ranked[0].reason, "color match");
    }
}
