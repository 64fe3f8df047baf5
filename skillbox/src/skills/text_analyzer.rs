//! Text analysis skill: statistics, sentiment, and pattern extraction.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};

use crate::error::SkillError;
use crate::model::{Params, params_from};
use crate::skill::Skill;

// Pre-compiled patterns shared across calls.
static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b").expect("valid regex"));

const POSITIVE_WORDS: &[&str] = &["good", "great", "excellent", "nice", "love", "happy", "awesome"];
const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "awful", "hate", "sad", "angry", "poor"];

/// Analyze text for statistics, sentiment, and common patterns.
///
/// Actions:
/// - `text_stats`: word, character and sentence counts plus averages
/// - `text_sentiment`: lexicon-based sentiment classification
/// - `text_patterns`: URLs, email addresses and phone numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAnalyzerSkill;

impl TextAnalyzerSkill {
    /// Create a text analyzer skill.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn stats(text: &str) -> Params {
        let words: Vec<&str> = text.split_whitespace().collect();
        let sentence_count = SENTENCE_RE
            .split(text)
            .filter(|s| !s.trim().is_empty())
            .count();
        let total_word_chars: usize = words.iter().map(|w| w.chars().count()).sum();
        let avg_word_length = if words.is_empty() {
            0.0
        } else {
            total_word_chars as f64 / words.len() as f64
        };
        let avg_words_per_sentence = words.len() as f64 / sentence_count.max(1) as f64;

        params_from(json!({
            "word_count": words.len(),
            "char_count": text.chars().count(),
            "char_count_no_spaces": text.chars().filter(|c| *c != ' ').count(),
            "sentence_count": sentence_count,
            "avg_word_length": avg_word_length,
            "avg_words_per_sentence": avg_words_per_sentence,
        }))
    }

    fn sentiment(text: &str) -> Params {
        let lowered = text.to_lowercase();
        let positive = lowered
            .split_whitespace()
            .filter(|w| POSITIVE_WORDS.contains(w))
            .count();
        let negative = lowered
            .split_whitespace()
            .filter(|w| NEGATIVE_WORDS.contains(w))
            .count();

        let sentiment = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => "positive",
            std::cmp::Ordering::Less => "negative",
            std::cmp::Ordering::Equal => "neutral",
        };
        let confidence =
            positive.abs_diff(negative) as f64 / (positive + negative).max(1) as f64;

        params_from(json!({
            "sentiment": sentiment,
            "positive_words": positive,
            "negative_words": negative,
            "confidence": confidence,
        }))
    }

    fn patterns(text: &str) -> Params {
        let urls: Vec<&str> = URL_RE.find_iter(text).map(|m| m.as_str()).collect();
        let emails: Vec<&str> = EMAIL_RE.find_iter(text).map(|m| m.as_str()).collect();
        let phones: Vec<&str> = PHONE_RE.find_iter(text).map(|m| m.as_str()).collect();

        params_from(json!({
            "urls": urls,
            "emails": emails,
            "phone_numbers": phones,
            "patterns_found": urls.len() + emails.len() + phones.len(),
        }))
    }
}

#[async_trait]
impl Skill for TextAnalyzerSkill {
    fn name(&self) -> &str {
        "text-analyzer"
    }

    fn description(&self) -> String {
        "Analyze text for statistics, sentiment, and patterns".to_string()
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["text_stats", "text_sentiment", "text_patterns"]
    }

    async fn process(&self, action: &str, parameters: &Params) -> Result<Params, SkillError> {
        let text = parameters
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SkillError::missing("text"))?;

        match action {
            "text_stats" => Ok(Self::stats(text)),
            "text_sentiment" => Ok(Self::sentiment(text)),
            "text_patterns" => Ok(Self::patterns(text)),
            other => Err(SkillError::unknown_action(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SkillRequest;

    fn text_params(text: &str) -> Params {
        params_from(json!({"text": text}))
    }

    #[tokio::test]
    async fn stats_counts_words_chars_and_sentences() {
        let skill = TextAnalyzerSkill::new();
        let result = skill
            .process("text_stats", &text_params("Hello world! This is a test."))
            .await
            .unwrap();

        assert_eq!(result.get("word_count"), Some(&json!(6)));
        assert_eq!(result.get("char_count"), Some(&json!(28)));
        assert_eq!(result.get("sentence_count"), Some(&json!(2)));
        assert_eq!(
            result.get("avg_words_per_sentence").and_then(Value::as_f64),
            Some(3.0)
        );
    }

    #[tokio::test]
    async fn sentiment_classifies_positive_text() {
        let skill = TextAnalyzerSkill::new();
        let result = skill
            .process("text_sentiment", &text_params("what a great and awesome day"))
            .await
            .unwrap();

        assert_eq!(result.get("sentiment"), Some(&json!("positive")));
        assert_eq!(result.get("positive_words"), Some(&json!(2)));
        assert_eq!(result.get("negative_words"), Some(&json!(0)));
        assert_eq!(result.get("confidence").and_then(Value::as_f64), Some(1.0));
    }

    #[tokio::test]
    async fn sentiment_classifies_negative_and_neutral_text() {
        let skill = TextAnalyzerSkill::new();

        let negative = skill
            .process("text_sentiment", &text_params("a terrible awful day"))
            .await
            .unwrap();
        assert_eq!(negative.get("sentiment"), Some(&json!("negative")));

        let neutral = skill
            .process("text_sentiment", &text_params("the sky is blue"))
            .await
            .unwrap();
        assert_eq!(neutral.get("sentiment"), Some(&json!("neutral")));
        assert_eq!(neutral.get("confidence").and_then(Value::as_f64), Some(0.0));
    }

    #[tokio::test]
    async fn patterns_finds_urls_emails_and_phones() {
        let skill = TextAnalyzerSkill::new();
        let text = "Reach us at team@example.com, see https://example.com or call 555-123-4567.";
        let result = skill.process("text_patterns", &text_params(text)).await.unwrap();

        assert_eq!(result.get("emails"), Some(&json!(["team@example.com"])));
        assert_eq!(
            result.get("urls").and_then(Value::as_array).map(Vec::len),
            Some(1)
        );
        assert_eq!(result.get("phone_numbers"), Some(&json!(["555-123-4567"])));
        assert_eq!(result.get("patterns_found"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn missing_text_is_rejected() {
        let skill = TextAnalyzerSkill::new();
        let err = skill.process("text_stats", &Params::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::MissingParameter(_)));

        // Empty text counts as missing.
        let err = skill
            .process("text_stats", &text_params(""))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let skill = TextAnalyzerSkill::new();
        let err = skill
            .process("text_translate", &text_params("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::UnknownAction(_)));
    }

    #[tokio::test]
    async fn envelope_integration() {
        let skill = TextAnalyzerSkill::new();
        let response = skill
            .execute(SkillRequest::new("text_stats").with_parameters(text_params("one two three")))
            .await;

        assert!(response.success);
        assert_eq!(response.metadata.skill, "text-analyzer");
        assert_eq!(
            response.result.unwrap().get("word_count"),
            Some(&json!(3))
        );
    }
}
