//! # Sources
//!
//! Immutable definitions of every data source the engine fans out to.
//!
//! - Each `Source` carries its family (which selects the extraction strategy),
//!   a fusion weight in `[0.0, 1.0]` and influence scaling constants.
//! - `SourceRegistry` validates the whole set once at construction: ids are
//!   unique after normalization, weights are in range and sum to at most 1.0.
//! - Includes a built-in `default_seed()` used when no config is provided.
//!
//! The constants in the seed have no derivation beyond "no single source
//! structurally dominates"; they are meant to be tuned through config.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Tolerance for the fusion weight sum check (f32 accumulation noise).
const WEIGHT_SUM_EPSILON: f32 = 1e-4;

/// Data domain of a source. Selects the payload shape and extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFamily {
    Social,
    Weather,
    News,
    Events,
    Economic,
    Health,
}

impl SourceFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFamily::Social => "social",
            SourceFamily::Weather => "weather",
            SourceFamily::News => "news",
            SourceFamily::Events => "events",
            SourceFamily::Economic => "economic",
            SourceFamily::Health => "health",
        }
    }
}

/// Per-source constants for the influence score.
///
/// `score = volume_scale * ln(1 + volume) + reach_scale * ln(1 + reach)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfluenceScaling {
    pub volume_scale: f64,
    pub reach_scale: f64,
}

impl Default for InfluenceScaling {
    fn default() -> Self {
        Self {
            volume_scale: 1.0,
            reach_scale: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Canonical identifier, e.g. `social.instagram` or `weather`.
    pub id: String,
    pub family: SourceFamily,
    /// Coefficient used by sentiment fusion.
    pub fusion_weight: f32,
    #[serde(default)]
    pub influence: InfluenceScaling,
}

impl Source {
    pub fn new(id: impl Into<String>, family: SourceFamily, fusion_weight: f32) -> Self {
        Self {
            id: normalize_id(&id.into()),
            family,
            fusion_weight,
            influence: InfluenceScaling::default(),
        }
    }

    pub fn with_influence(mut self, volume_scale: f64, reach_scale: f64) -> Self {
        self.influence = InfluenceScaling {
            volume_scale,
            reach_scale,
        };
        self
    }
}

/// Validated, ordered set of sources. Registration order is significant:
/// it fixes result slots and breaks influence ties.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Result<Self, RegistryError> {
        if sources.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut sources = sources;
        let mut seen = std::collections::HashSet::new();
        let mut sum = 0.0f32;
        for s in sources.iter_mut() {
            s.id = normalize_id(&s.id);
            if !seen.insert(s.id.clone()) {
                return Err(RegistryError::DuplicateId(s.id.clone()));
            }
            if !(0.0..=1.0).contains(&s.fusion_weight) {
                return Err(RegistryError::WeightOutOfRange {
                    id: s.id.clone(),
                    weight: s.fusion_weight,
                });
            }
            if s.influence.volume_scale < 0.0 || s.influence.reach_scale < 0.0 {
                return Err(RegistryError::NegativeScaling { id: s.id.clone() });
            }
            sum += s.fusion_weight;
        }

        if sum > 1.0 + WEIGHT_SUM_EPSILON {
            return Err(RegistryError::WeightSumExceeded(sum));
        }

        Ok(Self { sources })
    }

    /// Look up a source by id (case-insensitive, separator tolerant).
    pub fn get(&self, id: &str) -> Option<&Source> {
        let id = normalize_id(id);
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn total_fusion_weight(&self) -> f32 {
        self.sources.iter().map(|s| s.fusion_weight).sum()
    }

    /// Built-in seed: three social platforms share 0.55 of the fusion weight,
    /// the remainder goes to non-social signals.
    pub fn default_seed() -> Self {
        let sources = [
            ("social.instagram", SourceFamily::Social, 0.20, 1.0, 0.35),
            ("social.tiktok", SourceFamily::Social, 0.20, 1.0, 0.30),
            ("social.twitter", SourceFamily::Social, 0.15, 1.2, 0.40),
            ("weather", SourceFamily::Weather, 0.10, 0.5, 0.0),
            ("news", SourceFamily::News, 0.15, 1.5, 0.25),
            ("events", SourceFamily::Events, 0.10, 1.5, 0.30),
            ("economic", SourceFamily::Economic, 0.05, 0.5, 0.0),
            ("health", SourceFamily::Health, 0.05, 1.2, 0.20),
        ]
        .into_iter()
        .map(|(id, family, w, vs, rs)| Source::new(id, family, w).with_influence(vs, rs))
        .collect();

        Self { sources }
    }
}

/// Normalize a source id: trim, lowercase, map `_`, `/` and whitespace runs to
/// a single `.` so `Social_Instagram` and `social.instagram` collide.
pub fn normalize_id(s: &str) -> String {
    let lowered = s.trim().to_ascii_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_sep = false;
    for ch in lowered.chars() {
        if ch == '.' || ch == '_' || ch == '/' || ch.is_whitespace() {
            if !last_sep && !out.is_empty() {
                out.push('.');
            }
            last_sep = true;
        } else {
            out.push(ch);
            last_sep = false;
        }
    }
    while out.ends_with('.') {
        out.pop();
    }
    out
}
