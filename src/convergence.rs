//! # Convergence
//! Detects trend terms that several independent sources agree on.
//!
//! A term converges when at least `threshold` *distinct* sources report it.
//! Repeats from one source add weight but never add to the source count.
//! Convergent terms are ranked by accumulated weight and the top `limit` are
//! kept. Lifecycle stage is assigned by rank position only: there is no
//! history to judge real momentum, so "emerging / peak / declining" is a
//! relative-rank proxy.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::aggregate::{normalize_term, TrendObservation};

pub const DEFAULT_CONVERGENCE_THRESHOLD: usize = 3;
pub const DEFAULT_MAX_CONVERGENT: usize = 8;

/// Ranks 1..=3 are emerging, 4..=6 peak, the rest declining.
const EMERGING_RANKS: usize = 3;
const PEAK_RANKS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Emerging,
    Peak,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergentTrend {
    pub term: String,
    pub source_count: usize,
    pub total_weight: f32,
    pub lifecycle_stage: LifecycleStage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendLifecycle {
    pub emerging: Vec<String>,
    pub peak: Vec<String>,
    pub declining: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ConvergenceAnalyzer {
    threshold: usize,
    limit: usize,
}

impl Default for ConvergenceAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_CONVERGENT)
    }
}

impl ConvergenceAnalyzer {
    /// `threshold` below 1 is treated as 1.
    pub fn new(threshold: usize, limit: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            limit,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Sorted by total weight desc, then source count desc, then term asc.
    pub fn analyze(&self, observations: &[TrendObservation]) -> Vec<ConvergentTrend> {
        // BTreeMap keeps iteration order independent of input order.
        let mut acc: BTreeMap<String, (BTreeSet<&str>, f32)> = BTreeMap::new();
        for obs in observations {
            let term = normalize_term(&obs.term);
            if term.is_empty() {
                continue;
            }
            let entry = acc.entry(term).or_default();
            entry.0.insert(obs.source.as_str());
            entry.1 += obs.weight;
        }

        let mut convergent: Vec<(String, usize, f32)> = acc
            .into_iter()
            .filter(|(_, (sources, _))| sources.len() >= self.threshold)
            .map(|(term, (sources, weight))| (term, sources.len(), weight))
            .collect();

        convergent.sort_by(|a, b| {
            b.2.total_cmp(&a.2)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.0.cmp(&b.0))
        });
        convergent.truncate(self.limit);

        convergent
            .into_iter()
            .enumerate()
            .map(|(idx, (term, source_count, total_weight))| ConvergentTrend {
                term,
                source_count,
                total_weight,
                lifecycle_stage: stage_for_rank(idx + 1),
            })
            .collect()
    }
}

fn stage_for_rank(rank: usize) -> LifecycleStage {
    if rank <= EMERGING_RANKS {
        LifecycleStage::Emerging
    } else if rank <= PEAK_RANKS {
        LifecycleStage::Peak
    } else {
        LifecycleStage::Declining
    }
}

/// Split convergent trends by stage, keeping rank order within each stage.
pub fn lifecycle(trends: &[ConvergentTrend]) -> TrendLifecycle {
    let mut out = TrendLifecycle::default();
    for t in trends {
        let bucket = match t.lifecycle_stage {
            LifecycleStage::Emerging => &mut out.emerging,
            LifecycleStage::Peak => &mut out.peak,
            LifecycleStage::Declining => &mut out.declining,
        };
        bucket.push(t.term.clone());
    }
    out
}
