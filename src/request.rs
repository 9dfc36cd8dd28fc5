//! Aggregation request and the closed set of request variant filters.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

const SPICE_MAX: u8 = 10;

/// Incoming request: where to look and what to look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub location: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<RequestVariant>,
}

impl AggregationRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            categories: Vec::new(),
            variant: None,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_variant(mut self, variant: RequestVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Validate and normalize: trimmed location, trimmed/deduplicated
    /// categories (first occurrence wins, case-insensitive), checked variant.
    pub fn validate(self) -> Result<Self, RequestError> {
        let location = self.location.trim().to_string();
        if location.is_empty() {
            return Err(RequestError::EmptyLocation);
        }

        let mut categories: Vec<String> = Vec::with_capacity(self.categories.len());
        for c in self.categories {
            let t = c.trim();
            if t.is_empty() {
                continue;
            }
            if !categories.iter().any(|x| x.eq_ignore_ascii_case(t)) {
                categories.push(t.to_string());
            }
        }

        if let Some(v) = &self.variant {
            v.validate()?;
        }

        Ok(Self {
            location,
            categories,
            variant: self.variant,
        })
    }
}

/// Demographic / preference filters. Closed on purpose: unknown keys are
/// rejected at deserialization instead of being passed through to adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_bracket: Option<IncomeBracket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spice_tolerance: Option<SpiceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticity: Option<AuthenticityPreference>,
}

impl RequestVariant {
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(r) = self.spice_tolerance {
            if r.min > r.max || r.max > SPICE_MAX {
                return Err(RequestError::InvalidSpiceRange {
                    min: r.min,
                    max: r.max,
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    GenZ,
    Millennial,
    GenX,
    Boomer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBracket {
    Low,
    Middle,
    Upper,
}

/// Inclusive spice tolerance range on a 0..=10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiceRange {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticityPreference {
    Traditional,
    Fusion,
    NoPreference,
}
