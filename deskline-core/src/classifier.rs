//! Keyword-scoring topic classifier.
//!
//! Deterministic, static model: each category owns a keyword list, and a
//! conversation's concatenated text is scored per category. No training,
//! no external model calls.

use crate::{MessageCategory, RowId};
use serde::{Deserialize, Serialize};

/// Confidence below which a result is flagged for manual review.
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;
/// A weaker score still auto-commits when enough distinct keywords matched.
pub const WEAK_CONFIDENCE_THRESHOLD: f64 = 0.3;
/// Distinct-keyword count required to accept a weak score.
pub const WEAK_MIN_HITS: usize = 2;

/// Classification result for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyOutcome {
    /// Winning category id; 0 when nothing matched at all.
    pub category_id: RowId,
    /// Confidence score in [0, 1].
    pub confidence: f64,
    /// Distinct keywords of the winning category found in the text.
    pub matched_keywords: Vec<String>,
    /// True when the result should not be committed automatically.
    pub needs_manual: bool,
}

impl ClassifyOutcome {
    fn manual(category_id: RowId, confidence: f64, matched: Vec<String>) -> Self {
        ClassifyOutcome {
            category_id,
            confidence,
            matched_keywords: matched,
            needs_manual: true,
        }
    }
}

/// Classifier over a snapshot of the category table.
///
/// Categories are sorted by id at construction so scoring order, and
/// therefore tie detection, is stable across runs.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    categories: Vec<ScoredCategory>,
}

#[derive(Debug, Clone)]
struct ScoredCategory {
    category_id: RowId,
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(categories: &[MessageCategory]) -> Self {
        let mut categories: Vec<ScoredCategory> = categories
            .iter()
            .map(|c| ScoredCategory {
                category_id: c.category_id,
                keywords: c.normalized_keywords(),
            })
            .filter(|c| !c.keywords.is_empty())
            .collect();
        categories.sort_by_key(|c| c.category_id);
        KeywordClassifier { categories }
    }

    /// Score `text` against every category and return the winner.
    ///
    /// Per category: hit ratio = matched keywords / total keywords, coverage
    /// = characters of matched keywords / text length (capped at 1). The
    /// combined score weighs hits at 0.6 and coverage at 0.4. The result is
    /// flagged `needs_manual` when the table is empty, nothing matched, the
    /// top two scores tie, or the top score is below the confidence
    /// threshold without the weak-score escape hatch (>= 0.3 and at least
    /// two distinct keyword hits).
    pub fn classify(&self, text: &str) -> ClassifyOutcome {
        let text = text.to_lowercase();
        if self.categories.is_empty() || text.trim().is_empty() {
            return ClassifyOutcome::manual(0, 0.0, Vec::new());
        }

        let mut best: Option<(f64, &ScoredCategory, Vec<String>)> = None;
        let mut runner_up_score = 0.0f64;

        for category in &self.categories {
            let matched: Vec<String> = category
                .keywords
                .iter()
                .filter(|k| text.contains(k.as_str()))
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }
            let hit_ratio = matched.len() as f64 / category.keywords.len() as f64;
            let matched_chars: usize = matched.iter().map(|k| k.len()).sum();
            let coverage = (matched_chars as f64 / text.len() as f64).min(1.0);
            let score = 0.6 * hit_ratio + 0.4 * coverage;

            match &best {
                Some((best_score, _, _)) if score <= *best_score => {
                    if score > runner_up_score {
                        runner_up_score = score;
                    }
                }
                _ => {
                    if let Some((prev, _, _)) = &best {
                        runner_up_score = *prev;
                    }
                    best = Some((score, category, matched));
                }
            }
        }

        let Some((score, winner, matched)) = best else {
            return ClassifyOutcome::manual(0, 0.0, Vec::new());
        };

        let tied = (score - runner_up_score).abs() < f64::EPSILON && runner_up_score > 0.0;
        let confident = score >= CONFIDENCE_THRESHOLD
            || (score >= WEAK_CONFIDENCE_THRESHOLD && matched.len() >= WEAK_MIN_HITS);

        ClassifyOutcome {
            category_id: winner.category_id,
            confidence: score,
            matched_keywords: matched,
            needs_manual: tied || !confident,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
