//! Score fusion
//!
//! Combines the retriever's semantic score with a lexical keyword score and a
//! rule score drawn from [`RULES`]. Pure: no I/O, never fails.

use crate::retriever::Candidate;
use serde::Serialize;
use shelfscout_core::{clamp_unit, Badge, Product, ScoreVector, SearchFilters, TokenSet};

/// Inputs visible to a rule predicate
pub struct RuleContext<'a> {
    pub tokens: &'a TokenSet,
    pub product: &'a Product,
    pub filters: Option<&'a SearchFilters>,
}

/// One heuristic bonus, applied at most once per candidate
pub struct Rule {
    pub name: &'static str,
    pub bonus: f32,
    pub applies: fn(&RuleContext<'_>) -> bool,
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "price fit",
        bonus: 0.5,
        applies: price_fits,
    },
    Rule {
        name: "breathable",
        bonus: 0.25,
        applies: |cx| cx.tokens.contains("breathable") && cx.product.has_material(&["polyester", "mesh"]),
    },
    Rule {
        name: "leather",
        bonus: 0.25,
        applies: |cx| cx.tokens.contains("leather") && cx.product.has_material(&["leather"]),
    },
    Rule {
        name: "waterproof",
        bonus: 0.25,
        applies: |cx| {
            cx.tokens.contains("waterproof")
                && (cx.product.attribute_is_true("waterproof")
                    || cx.product.has_material(&["nylon", "leather"]))
        },
    },
];

fn price_fits(cx: &RuleContext<'_>) -> bool {
    match (cx.filters.and_then(|f| f.price_max_cents), cx.product.price_cents) {
        (Some(max), Some(price)) => price <= max,
        _ => false,
    }
}

/// Share of query tokens found among the product's keywords
pub fn keyword_score(tokens: &TokenSet, product: &Product) -> f32 {
    if tokens.is_empty() || product.keywords.is_empty() {
        return 0.0;
    }
    let hits = tokens
        .iter()
        .filter(|t| product.keywords.iter().any(|k| k.eq_ignore_ascii_case(t)))
        .count();
    clamp_unit(hits as f32 / tokens.len() as f32)
}

pub fn rule_score(tokens: &TokenSet, product: &Product, filters: Option<&SearchFilters>) -> f32 {
    let cx = RuleContext {
        tokens,
        product,
        filters,
    };
    clamp_unit(
        RULES
            .iter()
            .filter(|rule| (rule.applies)(&cx))
            .map(|rule| rule.bonus)
            .sum(),
    )
}

/// Keyword and rule signals for a candidate, fused with `semantic`
pub fn score(
    tokens: &TokenSet,
    product: &Product,
    filters: Option<&SearchFilters>,
    semantic: f32,
) -> ScoreVector {
    ScoreVector::fuse(
        semantic,
        keyword_score(tokens, product),
        rule_score(tokens, product, filters),
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub product: Product,
    pub scores: ScoreVector,
    pub badges: Vec<Badge>,
}

/// Score every candidate, sort by fused score (retrieval order breaks ties)
/// and keep the best `k`.
pub fn fuse(
    candidates: Vec<Candidate>,
    tokens: &TokenSet,
    filters: Option<&SearchFilters>,
    k: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .map(|c| {
            let scores = score(tokens, &c.product, filters, c.semantic);
            let badges = c.product.badges();
            SearchHit {
                product: c.product,
                scores,
                badges,
            }
        })
        .collect();

    hits.sort_by(|a, b| b.scores.final_score.total_cmp(&a.scores.final_score));
    hits.truncate(k);
    hits
}
