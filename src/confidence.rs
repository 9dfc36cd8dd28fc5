//! Confidence scoring.
//!
//! `ConfidenceFactors` are four normalized signals in [0,1]:
//! - `sentiment_strength`     : |unified sentiment|
//! - `convergence_strength`   : convergent trends / retention limit
//! - `cross_source_agreement` : mean share of succeeded sources behind each convergent trend
//! - `influence_spread`       : normalized entropy of the influence ranking
//!
//! confidence = 0.6 * success_rate + 0.4 * mean(factors), +0.1 when at least
//! three factors exceed 0.8; clamped to [0,1] and reported as an integer 0..=100.

use serde::Serialize;

use crate::convergence::ConvergentTrend;
use crate::influence::{self, InfluenceEntry};

const SUCCESS_WEIGHT: f32 = 0.6;
const FACTOR_WEIGHT: f32 = 0.4;
const AGREEMENT_BONUS: f32 = 0.1;
const STRONG_FACTOR: f32 = 0.8;
const STRONG_FACTOR_MIN: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceFactors {
    pub sentiment_strength: f32,
    pub convergence_strength: f32,
    pub cross_source_agreement: f32,
    pub influence_spread: f32,
}

impl ConfidenceFactors {
    /// Safe constructor with clamping.
    pub fn new(sentiment: f32, convergence: f32, agreement: f32, spread: f32) -> Self {
        fn c(x: f32) -> f32 {
            if x.is_finite() {
                x.clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
        Self {
            sentiment_strength: c(sentiment),
            convergence_strength: c(convergence),
            cross_source_agreement: c(agreement),
            influence_spread: c(spread),
        }
    }

    /// Derive factors from the fused aggregate.
    pub fn derive(
        unified_sentiment: f32,
        convergent: &[ConvergentTrend],
        convergence_limit: usize,
        succeeded: usize,
        ranking: &[InfluenceEntry],
    ) -> Self {
        let convergence = if convergence_limit == 0 {
            0.0
        } else {
            convergent.len() as f32 / convergence_limit as f32
        };

        let agreement = if convergent.is_empty() || succeeded == 0 {
            0.0
        } else {
            let sum: f32 = convergent
                .iter()
                .map(|t| t.source_count as f32 / succeeded as f32)
                .sum();
            sum / convergent.len() as f32
        };

        Self::new(
            unified_sentiment.abs(),
            convergence,
            agreement,
            influence::spread(ranking) as f32,
        )
    }

    pub fn values(&self) -> [f32; 4] {
        [
            self.sentiment_strength,
            self.convergence_strength,
            self.cross_source_agreement,
            self.influence_spread,
        ]
    }

    pub fn mean(&self) -> f32 {
        let v = self.values();
        v.iter().sum::<f32>() / v.len() as f32
    }

    pub fn strong_count(&self) -> usize {
        self.values().iter().filter(|v| **v > STRONG_FACTOR).count()
    }
}

/// Confidence in [0,1] before scaling.
pub fn raw_confidence(succeeded: usize, total: usize, factors: &ConfidenceFactors) -> f32 {
    let success_rate = if total == 0 {
        0.0
    } else {
        (succeeded.min(total)) as f32 / total as f32
    };
    let bonus = if factors.strong_count() >= STRONG_FACTOR_MIN {
        AGREEMENT_BONUS
    } else {
        0.0
    };
    (SUCCESS_WEIGHT * success_rate + FACTOR_WEIGHT * factors.mean() + bonus).clamp(0.0, 1.0)
}

/// Integer confidence score in 0..=100.
pub fn confidence_score(succeeded: usize, total: usize, factors: &ConfidenceFactors) -> u8 {
    (raw_confidence(succeeded, total, factors) * 100.0).round() as u8
}
