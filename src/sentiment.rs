//! Lexicon sentiment for raw text handed back by adapters (post captions,
//! headlines). Deterministic and dependency-free at runtime: the lexicon is
//! embedded at compile time.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Squashing constant for `normalized_score`: a raw score of ±4 maps to ±0.5.
const SQUASH: f32 = 4.0;

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (raw score, token count).
    /// Negation: a negator within the previous 1..=3 tokens flips the sign of
    /// the word's lexicon score.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
        }

        (score, tokens.len())
    }

    /// Raw score squashed into the open interval (-1, 1).
    pub fn normalized_score(&self, text: &str) -> f32 {
        let (s, _) = self.score_text(text);
        let s = s as f32;
        s / (s.abs() + SQUASH)
    }

    /// Mean normalized score over non-empty texts; `None` when there is no text.
    pub fn mean_normalized<'a, I>(&self, texts: I) -> Option<f32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut sum = 0.0f32;
        let mut n = 0usize;
        for t in texts {
            if t.trim().is_empty() {
                continue;
            }
            sum += self.normalized_score(t);
            n += 1;
        }
        (n > 0).then(|| (sum / n as f32).clamp(-1.0, 1.0))
    }
}

/// Alphanumeric tokens, lower-case. Apostrophes split contractions, so the
/// negator list carries the stems ("isn", "don", ...).
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn"
            | "wasn"
            | "aren"
            | "don"
            | "doesn"
            | "didn"
            | "won"
            | "cannot"
            | "without"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_and_negative_words_score() {
        let a = SentimentAnalyzer::new();
        assert!(a.score_text("The birria tacos were delicious").0 > 0);
        assert!(a.score_text("Health department recall after outbreak").0 < 0);
        assert_eq!(a.score_text("tacos on tuesday").0, 0);
    }

    #[test]
    fn negation_flips_sign() {
        let a = SentimentAnalyzer::new();
        let (pos, _) = a.score_text("this place is good");
        let (neg, _) = a.score_text("this place isn't good");
        assert!(pos > 0);
        assert_eq!(neg, -pos);
    }

    #[test]
    fn normalized_is_bounded() {
        let a = SentimentAnalyzer::new();
        let s = a.normalized_score(&"amazing ".repeat(200));
        assert!(s > 0.99 && s < 1.0);
        let s = a.normalized_score(&"terrible ".repeat(200));
        assert!(s < -0.99 && s > -1.0);
    }

    #[test]
    fn mean_skips_blank_texts() {
        let a = SentimentAnalyzer::new();
        assert_eq!(a.mean_normalized(["", "   "]), None);
        let m = a.mean_normalized(["great tacos", "", "tacos"]).unwrap();
        // (2/6 + 0) / 2
        assert!((m - (2.0 / 6.0) / 2.0).abs() < 1e-6);
    }
}
