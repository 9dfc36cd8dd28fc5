//! Deterministic narrative for downstream recommendation prompts.
//!
//! Checks run in a fixed order (sentiment, convergence, influence
//! concentration, coverage, confidence); each one that fires appends a clause.
//! Numbers use fixed precision so identical inputs render byte-identical text.

use crate::convergence::ConvergentTrend;
use crate::influence::{self, InfluenceEntry};

pub const NEUTRAL_CLAUSE: &str = "Signals are neutral; no strong sentiment or cross-source trend detected.";

const SENTIMENT_THRESHOLD: f32 = 0.3;
const CONCENTRATION_THRESHOLD: f64 = 0.5;
const LOW_COVERAGE_THRESHOLD: f32 = 0.5;
const HIGH_CONFIDENCE: u8 = 75;

/// Inputs for the narrative, borrowed from the finished aggregate.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInputs<'a> {
    pub unified_sentiment: f32,
    pub convergent: &'a [ConvergentTrend],
    pub ranking: &'a [InfluenceEntry],
    pub succeeded: usize,
    pub total: usize,
    pub confidence_score: u8,
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationContextBuilder {
    clauses: Vec<String>,
}

impl RecommendationContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self, inputs: &NarrativeInputs<'_>) -> String {
        self.sentiment(inputs);
        self.convergence(inputs);
        self.concentration(inputs);
        self.coverage(inputs);
        self.confidence(inputs);

        if self.clauses.is_empty() {
            return NEUTRAL_CLAUSE.to_string();
        }
        self.clauses.join(" ")
    }

    fn sentiment(&mut self, i: &NarrativeInputs<'_>) {
        let s = i.unified_sentiment;
        if s >= SENTIMENT_THRESHOLD {
            self.clauses
                .push(format!("Overall sentiment is strongly positive ({s:+.2})."));
        } else if s <= -SENTIMENT_THRESHOLD {
            self.clauses
                .push(format!("Overall sentiment is strongly negative ({s:+.2})."));
        }
    }

    fn convergence(&mut self, i: &NarrativeInputs<'_>) {
        let Some(lead) = i.convergent.first() else {
            return;
        };
        let clause = if i.convergent.len() == 1 {
            format!(
                "'{}' is converging across {} sources.",
                lead.term, lead.source_count
            )
        } else {
            format!(
                "{} trends converge across sources, led by '{}' ({} sources).",
                i.convergent.len(),
                lead.term,
                lead.source_count
            )
        };
        self.clauses.push(clause);
    }

    fn concentration(&mut self, i: &NarrativeInputs<'_>) {
        if i.ranking.len() < 2 {
            return;
        }
        let share = influence::top_share(i.ranking);
        if share >= CONCENTRATION_THRESHOLD {
            self.clauses.push(format!(
                "Influence is concentrated in {} ({:.0}% of total).",
                i.ranking[0].source,
                share * 100.0
            ));
        }
    }

    fn coverage(&mut self, i: &NarrativeInputs<'_>) {
        if i.total == 0 {
            return;
        }
        let rate = i.succeeded as f32 / i.total as f32;
        if rate < LOW_COVERAGE_THRESHOLD {
            self.clauses.push(format!(
                "Only {} of {} sources responded; treat signals with caution.",
                i.succeeded, i.total
            ));
        }
    }

    fn confidence(&mut self, i: &NarrativeInputs<'_>) {
        if i.confidence_score >= HIGH_CONFIDENCE {
            self.clauses.push(format!(
                "Confidence is high ({}/100).",
                i.confidence_score
            ));
        }
    }
}
