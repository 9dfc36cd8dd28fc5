//! Result aggregation: turns per-source payloads into flat, source-agnostic
//! signal collections. The only stage that knows payload shapes (through the
//! [`extract::Extract`] strategies).

pub mod extract;

use serde::Serialize;

use crate::fanout::SourceResult;
use crate::sentiment::SentimentAnalyzer;
use crate::source::InfluenceScaling;

/// One trend term reported by one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendObservation {
    /// Normalized term (see [`normalize_term`]).
    pub term: String,
    pub source: String,
    pub weight: f32,
}

/// One source's sentiment in `[-1, 1]`, with the source's fusion weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSample {
    pub source: String,
    pub value: f32,
    pub weight: f32,
}

/// Raw activity numbers for the influence ranker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeSignal {
    pub source: String,
    pub volume: f64,
    pub reach: f64,
    pub scaling: InfluenceScaling,
}

/// Everything downstream stages need, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedSignals {
    pub observations: Vec<TrendObservation>,
    pub samples: Vec<SentimentSample>,
    pub volumes: Vec<VolumeSignal>,
    pub succeeded: usize,
    pub total: usize,
}

impl AggregatedSignals {
    pub fn success_rate(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f32 / self.total as f32
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    analyzer: SentimentAnalyzer,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentAnalyzer::new(),
        }
    }

    /// Failed results contribute nothing. Non-finite extracted numbers are
    /// dropped rather than propagated.
    pub fn aggregate(&self, results: &[SourceResult]) -> AggregatedSignals {
        let mut out = AggregatedSignals {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            let Some(summary) = result.payload() else {
                continue;
            };
            out.succeeded += 1;

            let source = &result.source;
            let ex = summary.extractor();

            for (raw, weight) in ex.extract_trends() {
                let term = normalize_term(&raw);
                // Zero weight still counts as a mention of the term.
                if term.is_empty() || !weight.is_finite() || weight < 0.0 {
                    continue;
                }
                out.observations.push(TrendObservation {
                    term,
                    source: source.id.clone(),
                    weight,
                });
            }

            if let Some(value) = ex.extract_sentiment(&self.analyzer) {
                if value.is_finite() {
                    out.samples.push(SentimentSample {
                        source: source.id.clone(),
                        value: value.clamp(-1.0, 1.0),
                        weight: source.fusion_weight,
                    });
                }
            }

            let volume = ex.extract_volume();
            let reach = ex.extract_reach();
            out.volumes.push(VolumeSignal {
                source: source.id.clone(),
                volume: if volume.is_finite() { volume.max(0.0) } else { 0.0 },
                reach: if reach.is_finite() { reach.max(0.0) } else { 0.0 },
                scaling: source.influence,
            });
        }

        out
    }
}

/// Trim, strip leading `#`/`@`, lowercase, collapse inner whitespace.
pub fn normalize_term(s: &str) -> String {
    let stripped = s.trim().trim_start_matches(['#', '@']);
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::{Source, SourceFamily};
    use crate::convergence::ConvergenceAnalyzer;
    use crate::summary::{
        AdvisoryLevel, DietTrend, HashtagCount, HealthSummary, SocialSummary, SourceSummary,
        WeatherCondition, WeatherSummary,
    };

    fn social(tags: &[(&str, u64)], sentiment: f32) -> SourceSummary {
        SourceSummary::Social(SocialSummary {
            platform: "x".into(),
            trending_hashtags: tags
                .iter()
                .map(|(t, m)| HashtagCount {
                    tag: t.to_string(),
                    mentions: *m,
                })
                .collect(),
            posts: vec![],
            sentiment: Some(sentiment),
            post_count: 10,
            engagement: 100,
        })
    }

    #[test]
    fn normalize_term_strips_prefixes_and_case() {
        assert_eq!(normalize_term("  #Birria   Tacos "), "birria tacos");
        assert_eq!(normalize_term("@@FoodTruck"), "foodtruck");
        assert_eq!(normalize_term("#"), "");
    }

    #[test]
    fn failed_results_contribute_nothing() {
        let ig = Source::new("social.instagram", SourceFamily::Social, 0.2);
        let wx = Source::new("weather", SourceFamily::Weather, 0.1);
        let results = vec![
            SourceResult::success(ig, social(&[("#Birria", 5)], 0.5)),
            SourceResult::failed(wx, ErrorKind::Timeout),
        ];
        let agg = ResultAggregator::new().aggregate(&results);
        assert_eq!(agg.total, 2);
        assert_eq!(agg.succeeded, 1);
        assert!(agg.observations.iter().all(|o| o.source == "social.instagram"));
        assert_eq!(agg.samples.len(), 1);
        assert_eq!(agg.samples[0].weight, 0.2);
        assert_eq!(agg.volumes.len(), 1);
        assert!((agg.success_rate() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn observations_keep_registration_order() {
        let a = Source::new("social.a", SourceFamily::Social, 0.1);
        let w = Source::new("weather", SourceFamily::Weather, 0.1);
        let results = vec![
            SourceResult::success(
                w,
                SourceSummary::Weather(WeatherSummary {
                    temperature_c: 2.0,
                    condition: WeatherCondition::Snow,
                    precipitation_mm: 3.0,
                }),
            ),
            SourceResult::success(a, social(&[("#Ramen", 7)], 0.1)),
        ];
        let agg = ResultAggregator::new().aggregate(&results);
        assert_eq!(agg.observations.first().unwrap().source, "weather");
        assert_eq!(agg.observations.last().unwrap().term, "ramen");
        assert_eq!(agg.samples[0].source, "weather");
    }

    #[test]
    fn zero_interest_mention_still_counts_as_a_source() {
        let health = |id: &str, interest: u32| {
            SourceResult::success(
                Source::new(id, SourceFamily::Health, 0.1),
                SourceSummary::Health(HealthSummary {
                    trending_diets: vec![DietTrend {
                        name: "keto".into(),
                        search_interest: interest,
                    }],
                    advisory: AdvisoryLevel::None,
                }),
            )
        };
        let results = vec![
            health("health.a", 50),
            health("health.b", 50),
            health("health.c", 0),
        ];
        let agg = ResultAggregator::new().aggregate(&results);
        assert_eq!(agg.observations.len(), 3);
        assert_eq!(agg.observations[2].weight, 0.0);

        let convergent = ConvergenceAnalyzer::default().analyze(&agg.observations);
        assert_eq!(convergent.len(), 1);
        assert_eq!(convergent[0].term, "keto");
        assert_eq!(convergent[0].source_count, 3);
        assert!((convergent[0].total_weight - 10.0).abs() < 1e-6);
    }
}
