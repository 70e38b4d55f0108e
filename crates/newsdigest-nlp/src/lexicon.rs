//! Offline backend: lead-sentence summarizer and lexicon sentiment scorer.

use async_trait::async_trait;
use newsdigest_core::{Sentiment, SentimentLabel};

use crate::error::NlpError;
use crate::{ensure_summarizable, SentimentClassifier, Summarizer};

/// News-domain word stems and weights.
///
/// Stems are matched as prefixes of lowercase tokens so Korean particles
/// and English inflections still hit (`상승했다`, `gains`). Values in
/// `(0.0, 1.0]` are positive, in `[-1.0, 0.0)` negative.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("상승", 0.4),
    ("성장", 0.4),
    ("호조", 0.5),
    ("호재", 0.5),
    ("흑자", 0.5),
    ("회복", 0.4),
    ("개선", 0.3),
    ("강세", 0.4),
    ("돌파", 0.3),
    ("성공", 0.4),
    ("합의", 0.3),
    ("수상", 0.4),
    ("증가", 0.2),
    ("기대", 0.2),
    ("growth", 0.4),
    ("gain", 0.3),
    ("rise", 0.3),
    ("rally", 0.4),
    ("recovery", 0.4),
    ("profit", 0.4),
    ("success", 0.4),
    ("improve", 0.3),
    ("agreement", 0.3),
    // Negative signals
    ("하락", -0.4),
    ("감소", -0.3),
    ("적자", -0.5),
    ("우려", -0.4),
    ("위기", -0.5),
    ("사고", -0.5),
    ("사망", -0.6),
    ("논란", -0.4),
    ("부진", -0.4),
    ("폭락", -0.7),
    ("약세", -0.4),
    ("악재", -0.5),
    ("피해", -0.4),
    ("갈등", -0.4),
    ("비판", -0.3),
    ("decline", -0.4),
    ("loss", -0.4),
    ("crisis", -0.5),
    ("fall", -0.3),
    ("accident", -0.5),
    ("death", -0.6),
    ("conflict", -0.4),
    ("concern", -0.3),
    ("crash", -0.6),
    ("deficit", -0.5),
];

/// Scores within `±NEUTRAL_BAND` are labelled neutral.
const NEUTRAL_BAND: f64 = 0.1;

/// Score a text string using the news lexicon.
///
/// Splits text into lowercase words, sums the weight of the first matching
/// stem per word, and clamps the result to `[-1.0, 1.0]`. Returns `0.0` for
/// empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f64 {
    let mut score = 0.0_f64;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if w.is_empty() {
            continue;
        }
        if let Some(&(_, weight)) = LEXICON.iter().find(|(stem, _)| w.starts_with(stem)) {
            score += weight;
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Map a lexicon score to a label and a confidence in `(0.0, 1.0]`.
fn label_score(score: f64) -> Sentiment {
    if score > NEUTRAL_BAND {
        Sentiment {
            label: SentimentLabel::Positive,
            score: 0.5 + score / 2.0,
        }
    } else if score < -NEUTRAL_BAND {
        Sentiment {
            label: SentimentLabel::Negative,
            score: 0.5 + score.abs() / 2.0,
        }
    } else {
        Sentiment {
            label: SentimentLabel::Neutral,
            score: 0.5 + (NEUTRAL_BAND - score.abs()) / NEUTRAL_BAND * 0.25,
        }
    }
}

/// Lexicon-based [`SentimentClassifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconClassifier;

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, NlpError> {
        if text.trim().is_empty() {
            return Err(NlpError::InputTooShort { chars: 0, min: 1 });
        }
        Ok(label_score(lexicon_score(text)))
    }
}

/// Extractive [`Summarizer`] that keeps the article's leading sentences.
///
/// Whole sentences are kept while they fit in `max_words`. If that leaves
/// fewer than `min_words`, the next sentence is cut to fill the gap.
#[derive(Debug, Clone, Copy)]
pub struct LeadSummarizer {
    min_words: usize,
    max_words: usize,
}

impl LeadSummarizer {
    #[must_use]
    pub fn new(min_words: usize, max_words: usize) -> Self {
        let max_words = max_words.max(1);
        Self {
            min_words: min_words.min(max_words),
            max_words,
        }
    }

    fn lead(&self, text: &str) -> String {
        let mut kept: Vec<&str> = Vec::new();
        for sentence in split_sentences(text) {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            if kept.len() + words.len() <= self.max_words {
                kept.extend(words);
                continue;
            }
            if kept.len() < self.min_words || kept.is_empty() {
                let room = self.max_words - kept.len();
                kept.extend(words.into_iter().take(room));
            }
            break;
        }
        kept.join(" ")
    }
}

#[async_trait]
impl Summarizer for LeadSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, NlpError> {
        ensure_summarizable(text)?;
        Ok(self.lead(text))
    }
}

/// Split text after `.`, `!`, `?` or `。` when followed by whitespace or the end.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?' | '。') {
            continue;
        }
        let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_scores_zero() {
        assert!(lexicon_score("").abs() < f64::EPSILON);
    }

    #[test]
    fn korean_stems_match_with_particles() {
        let score = lexicon_score("코스피가 큰 폭으로 상승했다");
        assert!(score > 0.0, "expected positive score, got {score}");

        let score = lexicon_score("수출 부진과 적자 우려가 커졌다");
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[test]
    fn score_clamps_to_unit_range() {
        let score = lexicon_score("폭락 폭락 폭락 사망 위기");
        assert!((score + 1.0).abs() < f64::EPSILON, "got {score}");
    }

    #[test]
    fn punctuation_is_stripped_before_matching() {
        assert!(lexicon_score("(growth!)") > 0.0);
    }

    #[test]
    fn label_score_bands() {
        assert_eq!(label_score(0.6).label, SentimentLabel::Positive);
        assert!((label_score(0.6).score - 0.8).abs() < 1e-9);
        assert_eq!(label_score(-0.4).label, SentimentLabel::Negative);
        assert_eq!(label_score(0.05).label, SentimentLabel::Neutral);
        assert!(label_score(0.0).score > 0.0);
    }

    #[tokio::test]
    async fn classifier_labels_text() {
        let sentiment = LexiconClassifier
            .classify("정부와 노조가 임금 협상에 합의하며 경기 회복 기대가 커졌다")
            .await
            .unwrap();
        assert_eq!(sentiment.label, SentimentLabel::Positive);
        assert!(sentiment.score > 0.5 && sentiment.score <= 1.0);
    }

    #[tokio::test]
    async fn classifier_rejects_empty_text() {
        assert!(LexiconClassifier.classify("  ").await.is_err());
    }

    #[test]
    fn split_sentences_keeps_decimals_together() {
        let sentences = split_sentences("금리는 3.5%로 동결됐다. 시장은 안정됐다! 다음은?");
        assert_eq!(
            sentences,
            vec!["금리는 3.5%로 동결됐다.", "시장은 안정됐다!", "다음은?"]
        );
    }

    #[test]
    fn lead_keeps_whole_sentences_within_max() {
        let summarizer = LeadSummarizer::new(2, 6);
        let text = "One two three. Four five six. Seven eight.";
        assert_eq!(summarizer.lead(text), "One two three. Four five six.");
    }

    #[test]
    fn lead_cuts_a_long_first_sentence() {
        let summarizer = LeadSummarizer::new(2, 3);
        assert_eq!(summarizer.lead("a b c d e f. g h."), "a b c");
    }

    #[test]
    fn lead_fills_up_to_min_words() {
        let summarizer = LeadSummarizer::new(4, 5);
        let text = "Short one. This next sentence is rather long.";
        assert_eq!(summarizer.lead(text), "Short one. This next sentence");
    }

    #[tokio::test]
    async fn summarize_rejects_short_input() {
        let summarizer = LeadSummarizer::new(30, 100);
        let err = summarizer.summarize("짧은 기사").await.unwrap_err();
        assert!(matches!(err, NlpError::InputTooShort { .. }), "got: {err:?}");
    }
}
