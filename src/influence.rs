//! Influence ranking of succeeded sources.
//!
//! `score = volume_scale * ln(1 + volume) + reach_scale * ln(1 + reach)`.
//! The log keeps sources whose raw units differ by orders of magnitude
//! (a handful of weather readings vs. millions of engagements) comparable;
//! the per-source scales are config constants.

use serde::Serialize;

use crate::aggregate::VolumeSignal;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluenceEntry {
    pub source: String,
    pub score: f64,
}

pub fn influence_score(signal: &VolumeSignal) -> f64 {
    let v = signal.scaling.volume_scale * signal.volume.max(0.0).ln_1p();
    let r = signal.scaling.reach_scale * signal.reach.max(0.0).ln_1p();
    let s = v + r;
    if s.is_finite() {
        s.max(0.0)
    } else {
        0.0
    }
}

/// Descending by score. The sort is stable, so equal scores keep the input
/// (registration) order.
pub fn rank(signals: &[VolumeSignal]) -> Vec<InfluenceEntry> {
    let mut ranked: Vec<InfluenceEntry> = signals
        .iter()
        .map(|s| InfluenceEntry {
            source: s.source.clone(),
            score: influence_score(s),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Share of total influence held by the top source (0 when nothing ranks).
pub fn top_share(ranking: &[InfluenceEntry]) -> f64 {
    let total: f64 = ranking.iter().map(|e| e.score).sum();
    match ranking.first() {
        Some(top) if total > 0.0 => top.score / total,
        _ => 0.0,
    }
}

/// Normalized Shannon entropy of the positive scores, in `[0, 1]`.
/// 1.0 means influence is spread evenly; 0.0 means one source (or none).
pub fn spread(ranking: &[InfluenceEntry]) -> f64 {
    let positive: Vec<f64> = ranking
        .iter()
        .map(|e| e.score)
        .filter(|s| *s > 0.0)
        .collect();
    if positive.len() < 2 {
        return 0.0;
    }
    let total: f64 = positive.iter().sum();
    let entropy: f64 = positive
        .iter()
        .map(|s| {
            let p = s / total;
            -p * p.ln()
        })
        .sum();
    (entropy / (positive.len() as f64).ln()).clamp(0.0, 1.0)
}
