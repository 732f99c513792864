use serde::{Deserialize, Serialize};

/// Weight of the semantic (vector) signal in the fused score
pub const SEMANTIC_WEIGHT: f32 = 0.65;
/// Weight of the keyword-overlap signal
pub const KEYWORD_WEIGHT: f32 = 0.25;
/// Weight of the heuristic rule signal
pub const RULE_WEIGHT: f32 = 0.10;

/// Per-candidate relevance signals for one query. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub semantic: f32,
    pub keyword: f32,
    pub rule: f32,
    #[serde(rename = "final")]
    pub final_score: f32,
}

impl ScoreVector {
    /// Fuse the three sub-scores. Each input is clamped to [0, 1] first.
    pub fn fuse(semantic: f32, keyword: f32, rule: f32) -> Self {
        let semantic = clamp_unit(semantic);
        let keyword = clamp_unit(keyword);
        let rule = clamp_unit(rule);
        Self {
            semantic,
            keyword,
            rule,
            final_score: SEMANTIC_WEIGHT * semantic + KEYWORD_WEIGHT * keyword + RULE_WEIGHT * rule,
        }
    }
}

/// Clamp into [0, 1], mapping NaN to 0
#[inline]
pub fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuse_weights() {
        let s = ScoreVector::fuse(1.0, 1.0, 1.0);
        assert!((s.final_score - 1.0).abs() < 1e-6);

        let s = ScoreVector::fuse(0.5, 1.0, 0.5);
        assert!((s.final_score - (0.325 + 0.25 + 0.05)).abs() < 1e-6);
    }

    #[test]
    fn test_fuse_clamps_inputs() {
        let s = ScoreVector::fuse(1.4, -0.2, f32::NAN);
        assert_eq!(s.semantic, 1.0);
        assert_eq!(s.keyword, 0.0);
        assert_eq!(s.rule, 0.0);
    }

    #[test]
    fn test_serializes_final_field() {
        let json = serde_json::to_value(ScoreVector::fuse(0.0, 0.0, 1.0)).unwrap();
        assert!(json.get("final").is_some());
    }
}
