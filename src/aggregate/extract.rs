//! Per-family extraction strategies.
//!
//! Each payload type implements [`Extract`]; the aggregator only ever talks to
//! the trait. All heuristics are fixed keyword tables or lexicon scores, so
//! identical payloads always extract identically.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::sentiment::SentimentAnalyzer;
use crate::summary::{
    AdvisoryLevel, EconomicSummary, EventsSummary, HealthSummary, NewsSummary, SocialSummary,
    SourceSummary, WeatherCondition, WeatherSummary,
};

static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("valid hashtag regex"));

/// Raw `(term, weight)` pairs; normalization happens in the aggregator.
pub type RawTrends = Vec<(String, f32)>;

pub trait Extract {
    fn extract_trends(&self) -> RawTrends;
    /// Sentiment in `[-1, 1]`, or `None` when the payload carries no signal.
    fn extract_sentiment(&self, analyzer: &SentimentAnalyzer) -> Option<f32>;
    /// Activity count (posts, articles, events, ...).
    fn extract_volume(&self) -> f64;
    /// Audience / engagement term; 0 for sources without one.
    fn extract_reach(&self) -> f64;
}

impl SourceSummary {
    pub fn extractor(&self) -> &dyn Extract {
        match self {
            SourceSummary::Social(s) => s,
            SourceSummary::Weather(s) => s,
            SourceSummary::News(s) => s,
            SourceSummary::Events(s) => s,
            SourceSummary::Economic(s) => s,
            SourceSummary::Health(s) => s,
        }
    }
}

impl Extract for SocialSummary {
    fn extract_trends(&self) -> RawTrends {
        let mut out: RawTrends = self
            .trending_hashtags
            .iter()
            .map(|h| (h.tag.clone(), h.mentions.max(1) as f32))
            .collect();
        for post in &self.posts {
            for cap in HASHTAG.captures_iter(post) {
                out.push((cap[1].to_string(), 1.0));
            }
        }
        out
    }

    fn extract_sentiment(&self, analyzer: &SentimentAnalyzer) -> Option<f32> {
        self.sentiment
            .or_else(|| analyzer.mean_normalized(self.posts.iter().map(String::as_str)))
    }

    fn extract_volume(&self) -> f64 {
        if self.post_count > 0 {
            self.post_count as f64
        } else {
            self.posts.len() as f64
        }
    }

    fn extract_reach(&self) -> f64 {
        self.engagement as f64
    }
}

const COLD_MAX_C: f32 = 8.0;
const HOT_MIN_C: f32 = 28.0;
const MILD_MIN_C: f32 = 15.0;

impl Extract for WeatherSummary {
    fn extract_trends(&self) -> RawTrends {
        let mut terms: Vec<&'static str> = Vec::new();

        if self.temperature_c <= COLD_MAX_C {
            terms.extend(["ramen", "soup", "hot pot"]);
        } else if self.temperature_c >= HOT_MIN_C {
            terms.extend(["ice cream", "poke", "cold brew"]);
        }

        match self.condition {
            WeatherCondition::Rain | WeatherCondition::Storm => {
                terms.extend(["delivery", "comfort food"])
            }
            WeatherCondition::Snow => terms.extend(["delivery", "hot chocolate"]),
            WeatherCondition::HeatWave => terms.extend(["ice cream", "shaved ice"]),
            WeatherCondition::Clear
                if self.temperature_c >= MILD_MIN_C && self.temperature_c < HOT_MIN_C =>
            {
                terms.extend(["patio dining", "food trucks"])
            }
            WeatherCondition::Clear | WeatherCondition::Cloudy => {}
        }

        let mut out: RawTrends = Vec::with_capacity(terms.len());
        for t in terms {
            if !out.iter().any(|(x, _)| x == t) {
                out.push((t.to_string(), 1.0));
            }
        }
        out
    }

    fn extract_sentiment(&self, _analyzer: &SentimentAnalyzer) -> Option<f32> {
        Some(match self.condition {
            WeatherCondition::Clear => 0.4,
            WeatherCondition::Cloudy => 0.0,
            WeatherCondition::Rain => -0.2,
            WeatherCondition::Snow => -0.3,
            WeatherCondition::HeatWave => -0.3,
            WeatherCondition::Storm => -0.6,
        })
    }

    fn extract_volume(&self) -> f64 {
        1.0
    }

    fn extract_reach(&self) -> f64 {
        0.0
    }
}

impl Extract for NewsSummary {
    fn extract_trends(&self) -> RawTrends {
        let mut out = RawTrends::new();
        for article in &self.articles {
            // one vote per article, even if a topic is listed twice
            let mut seen: Vec<String> = Vec::new();
            for topic in &article.topics {
                let key = topic.trim().to_lowercase();
                if key.is_empty() || seen.contains(&key) {
                    continue;
                }
                seen.push(key);
                out.push((topic.clone(), 1.0));
            }
        }
        out
    }

    fn extract_sentiment(&self, analyzer: &SentimentAnalyzer) -> Option<f32> {
        let decoded: Vec<String> = self
            .articles
            .iter()
            .map(|a| html_escape::decode_html_entities(&a.headline).to_string())
            .collect();
        analyzer.mean_normalized(decoded.iter().map(String::as_str))
    }

    fn extract_volume(&self) -> f64 {
        self.articles.len() as f64
    }

    fn extract_reach(&self) -> f64 {
        self.total_results as f64
    }
}

const ATTENDANCE_UNIT: f32 = 1000.0;
const EVENT_SENTIMENT_STEP: f32 = 0.1;
const EVENT_SENTIMENT_CAP: f32 = 0.5;

impl Extract for EventsSummary {
    fn extract_trends(&self) -> RawTrends {
        self.events
            .iter()
            .flat_map(|ev| {
                let w = 1.0 + ev.expected_attendance as f32 / ATTENDANCE_UNIT;
                ev.tags.iter().map(move |t| (t.clone(), w))
            })
            .collect()
    }

    fn extract_sentiment(&self, _analyzer: &SentimentAnalyzer) -> Option<f32> {
        if self.events.is_empty() {
            return None;
        }
        Some((EVENT_SENTIMENT_STEP * self.events.len() as f32).min(EVENT_SENTIMENT_CAP))
    }

    fn extract_volume(&self) -> f64 {
        self.events.len() as f64
    }

    fn extract_reach(&self) -> f64 {
        self.events.iter().map(|e| e.expected_attendance as f64).sum()
    }
}

const SPEND_SHIFT_PCT: f32 = 2.0;

impl Extract for EconomicSummary {
    fn extract_trends(&self) -> RawTrends {
        let terms: &[&str] = if self.dining_spend_change_pct < -SPEND_SHIFT_PCT {
            &["budget eats", "value menu"]
        } else if self.dining_spend_change_pct > SPEND_SHIFT_PCT {
            &["fine dining", "date night"]
        } else {
            &[]
        };
        terms.iter().map(|t| (t.to_string(), 1.0)).collect()
    }

    fn extract_sentiment(&self, _analyzer: &SentimentAnalyzer) -> Option<f32> {
        Some(((self.consumer_confidence - 100.0) / 50.0).clamp(-1.0, 1.0))
    }

    fn extract_volume(&self) -> f64 {
        1.0
    }

    fn extract_reach(&self) -> f64 {
        0.0
    }
}

impl Extract for HealthSummary {
    fn extract_trends(&self) -> RawTrends {
        self.trending_diets
            .iter()
            .map(|d| (d.name.clone(), d.search_interest as f32 / 10.0))
            .collect()
    }

    fn extract_sentiment(&self, _analyzer: &SentimentAnalyzer) -> Option<f32> {
        Some(match self.advisory {
            AdvisoryLevel::None => 0.1,
            AdvisoryLevel::Low => 0.0,
            AdvisoryLevel::Elevated => -0.3,
            AdvisoryLevel::High => -0.7,
        })
    }

    fn extract_volume(&self) -> f64 {
        self.trending_diets.len() as f64
    }

    fn extract_reach(&self) -> f64 {
        self.trending_diets
            .iter()
            .map(|d| d.search_interest as f64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{Article, DietTrend, HashtagCount, LocalEvent};
    use chrono::NaiveDate;

    #[test]
    fn social_uses_hashtags_and_caption_tags() {
        let s = SocialSummary {
            platform: "instagram".into(),
            trending_hashtags: vec![
                HashtagCount {
                    tag: "#BirriaTacos".into(),
                    mentions: 40,
                },
                HashtagCount {
                    tag: "#ube".into(),
                    mentions: 0,
                },
            ],
            posts: vec!["Best #smashburger in town #foodie".into()],
            sentiment: None,
            post_count: 0,
            engagement: 900,
        };
        let t = s.extract_trends();
        assert_eq!(t[0], ("#BirriaTacos".to_string(), 40.0));
        assert_eq!(t[1], ("#ube".to_string(), 1.0));
        assert!(t.contains(&("smashburger".to_string(), 1.0)));
        assert!(t.contains(&("foodie".to_string(), 1.0)));
        assert_eq!(s.extract_volume(), 1.0);
        assert_eq!(s.extract_reach(), 900.0);
        assert!(s.extract_sentiment(&SentimentAnalyzer::new()).unwrap() > 0.0);
    }

    #[test]
    fn social_prefers_platform_sentiment() {
        let s = SocialSummary {
            posts: vec!["terrible".into()],
            sentiment: Some(0.6),
            ..Default::default()
        };
        assert_eq!(s.extract_sentiment(&SentimentAnalyzer::new()), Some(0.6));
        assert_eq!(
            SocialSummary::default().extract_sentiment(&SentimentAnalyzer::new()),
            None
        );
    }

    #[test]
    fn cold_rain_suggests_comfort_food() {
        let w = WeatherSummary {
            temperature_c: 3.0,
            condition: WeatherCondition::Rain,
            precipitation_mm: 12.0,
        };
        let terms: Vec<String> = w.extract_trends().into_iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["ramen", "soup", "hot pot", "delivery", "comfort food"]);
        assert_eq!(w.extract_sentiment(&SentimentAnalyzer::new()), Some(-0.2));
    }

    #[test]
    fn heat_wave_does_not_duplicate_ice_cream() {
        let w = WeatherSummary {
            temperature_c: 38.0,
            condition: WeatherCondition::HeatWave,
            precipitation_mm: 0.0,
        };
        let terms: Vec<String> = w.extract_trends().into_iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["ice cream", "poke", "cold brew", "shaved ice"]);
    }

    #[test]
    fn news_counts_each_topic_once_per_article() {
        let n = NewsSummary {
            articles: vec![
                Article {
                    headline: "Birria tacos are the city&#39;s new favorite".into(),
                    topics: vec!["Birria Tacos".into(), "birria tacos".into()],
                },
                Article {
                    headline: "Food truck festival opens".into(),
                    topics: vec!["birria tacos".into()],
                },
            ],
            total_results: 120,
        };
        let t = n.extract_trends();
        assert_eq!(t.len(), 2);
        assert!(n.extract_sentiment(&SentimentAnalyzer::new()).unwrap() > 0.0);
        assert_eq!(n.extract_reach(), 120.0);
    }

    #[test]
    fn events_weight_by_attendance() {
        let e = EventsSummary {
            events: vec![LocalEvent {
                name: "Taco Fest".into(),
                starts_on: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
                expected_attendance: 4000,
                tags: vec!["birria tacos".into()],
            }],
        };
        assert_eq!(e.extract_trends(), vec![("birria tacos".to_string(), 5.0)]);
        assert_eq!(e.extract_sentiment(&SentimentAnalyzer::new()), Some(0.1));
        assert_eq!(EventsSummary::default().extract_sentiment(&SentimentAnalyzer::new()), None);
    }

    #[test]
    fn economic_and_health_map_to_bounded_sentiment() {
        let e = EconomicSummary {
            consumer_confidence: 10.0,
            dining_spend_change_pct: -6.0,
        };
        assert_eq!(e.extract_sentiment(&SentimentAnalyzer::new()), Some(-1.0));
        assert_eq!(e.extract_trends()[0].0, "budget eats");

        let h = HealthSummary {
            trending_diets: vec![DietTrend {
                name: "high protein".into(),
                search_interest: 80,
            }],
            advisory: AdvisoryLevel::High,
        };
        assert_eq!(h.extract_trends(), vec![("high protein".to_string(), 8.0)]);
        assert_eq!(h.extract_sentiment(&SentimentAnalyzer::new()), Some(-0.7));
    }
}
