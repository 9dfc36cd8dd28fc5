//! Sentiment fusion: weighted sum of per-source sentiment.
//!
//! Weights of failed or silent sources are not redistributed. A missing source
//! contributes 0, which damps the result instead of silently re-weighting the
//! remaining ones.

use crate::aggregate::SentimentSample;

pub fn fuse(samples: &[SentimentSample]) -> f32 {
    let sum: f32 = samples
        .iter()
        .filter(|s| s.value.is_finite() && s.weight.is_finite())
        .map(|s| s.value.clamp(-1.0, 1.0) * s.weight)
        .sum();
    sum.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(source: &str, value: f32, weight: f32) -> SentimentSample {
        SentimentSample {
            source: source.into(),
            value,
            weight,
        }
    }

    #[test]
    fn weighted_sum_matches_hand_calculation() {
        let s = vec![
            sample("social", 0.6, 0.55),
            sample("weather", 0.2, 0.15),
            sample("news", -0.4, 0.30),
        ];
        // 0.33 + 0.03 - 0.12
        assert!((fuse(&s) - 0.24).abs() < 1e-6);
    }

    #[test]
    fn missing_sources_are_not_reweighted() {
        let s = vec![sample("social", 1.0, 0.55)];
        assert!((fuse(&s) - 0.55).abs() < 1e-6);
    }

    #[test]
    fn result_is_clamped() {
        let s = vec![sample("a", 1.0, 0.9), sample("b", 1.0, 0.9)];
        assert_eq!(fuse(&s), 1.0);
        let s = vec![sample("a", -5.0, 1.0), sample("b", -1.0, 1.0)];
        assert_eq!(fuse(&s), -1.0);
        assert_eq!(fuse(&[]), 0.0);
    }
}
