//! Per-family payloads returned by source adapters.
//!
//! The JSON form is internally tagged by `family`, e.g.
//! `{"family":"weather","temperature_c":4.0,"condition":"rain","precipitation_mm":6.5}`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::source::SourceFamily;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SourceSummary {
    Social(SocialSummary),
    Weather(WeatherSummary),
    News(NewsSummary),
    Events(EventsSummary),
    Economic(EconomicSummary),
    Health(HealthSummary),
}

impl SourceSummary {
    pub fn family(&self) -> SourceFamily {
        match self {
            SourceSummary::Social(_) => SourceFamily::Social,
            SourceSummary::Weather(_) => SourceFamily::Weather,
            SourceSummary::News(_) => SourceFamily::News,
            SourceSummary::Events(_) => SourceFamily::Events,
            SourceSummary::Economic(_) => SourceFamily::Economic,
            SourceSummary::Health(_) => SourceFamily::Health,
        }
    }

    /// Structural sanity check applied at the fan-out boundary.
    /// Returns a short description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SourceSummary::Social(s) => {
                if let Some(v) = s.sentiment {
                    if !v.is_finite() || !(-1.0..=1.0).contains(&v) {
                        return Err(format!("social sentiment {v} outside [-1, 1]"));
                    }
                }
                Ok(())
            }
            SourceSummary::Weather(w) => {
                if !w.temperature_c.is_finite() || !w.precipitation_mm.is_finite() {
                    return Err("weather readings must be finite".into());
                }
                if w.precipitation_mm < 0.0 {
                    return Err("negative precipitation".into());
                }
                Ok(())
            }
            SourceSummary::News(_) | SourceSummary::Events(_) => Ok(()),
            SourceSummary::Economic(e) => {
                if !e.consumer_confidence.is_finite() || !e.dining_spend_change_pct.is_finite() {
                    return Err("economic indicators must be finite".into());
                }
                Ok(())
            }
            SourceSummary::Health(h) => {
                if let Some(d) = h.trending_diets.iter().find(|d| d.search_interest > 100) {
                    return Err(format!(
                        "search interest {} for '{}' exceeds 100",
                        d.search_interest, d.name
                    ));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialSummary {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub trending_hashtags: Vec<HashtagCount>,
    /// Raw captions; scanned for inline hashtags and scored by the lexicon
    /// when the platform did not supply its own sentiment.
    #[serde(default)]
    pub posts: Vec<String>,
    #[serde(default)]
    pub sentiment: Option<f32>,
    #[serde(default)]
    pub post_count: u64,
    /// Likes + comments + shares.
    #[serde(default)]
    pub engagement: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashtagCount {
    pub tag: String,
    #[serde(default)]
    pub mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub temperature_c: f32,
    pub condition: WeatherCondition,
    #[serde(default)]
    pub precipitation_mm: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
    HeatWave,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsSummary {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub headline: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsSummary {
    #[serde(default)]
    pub events: Vec<LocalEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEvent {
    pub name: String,
    pub starts_on: NaiveDate,
    #[serde(default)]
    pub expected_attendance: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicSummary {
    /// Consumer confidence index, 100 = neutral.
    pub consumer_confidence: f32,
    /// Year-over-year change in local restaurant spend, in percent.
    #[serde(default)]
    pub dining_spend_change_pct: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    #[serde(default)]
    pub trending_diets: Vec<DietTrend>,
    #[serde(default)]
    pub advisory: AdvisoryLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietTrend {
    pub name: String,
    /// Relative search interest, 0..=100.
    pub search_interest: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryLevel {
    #[default]
    None,
    Low,
    Elevated,
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_payloads() {
        let raw = r#"{"family":"weather","temperature_c":4.0,"condition":"rain","precipitation_mm":6.5}"#;
        let s: SourceSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(s.family(), SourceFamily::Weather);

        let raw = r#"{"family":"events","events":[{"name":"Taco Fest","starts_on":"2026-05-02","expected_attendance":4000,"tags":["birria tacos"]}]}"#;
        let s: SourceSummary = serde_json::from_str(raw).unwrap();
        match s {
            SourceSummary::Events(e) => {
                assert_eq!(e.events[0].starts_on, NaiveDate::from_ymd_opt(2026, 5, 2).unwrap())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let s = SourceSummary::Social(SocialSummary {
            sentiment: Some(1.7),
            ..Default::default()
        });
        assert!(s.validate().is_err());

        let s = SourceSummary::Weather(WeatherSummary {
            temperature_c: f32::NAN,
            condition: WeatherCondition::Clear,
            precipitation_mm: 0.0,
        });
        assert!(s.validate().is_err());

        let s = SourceSummary::Health(HealthSummary {
            trending_diets: vec![DietTrend {
                name: "keto".into(),
                search_interest: 140,
            }],
            advisory: AdvisoryLevel::None,
        });
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(SourceSummary::News(NewsSummary::default()).validate().is_ok());
        assert!(SourceSummary::Social(SocialSummary::default()).validate().is_ok());
    }
}
