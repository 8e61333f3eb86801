//! Post-generation grounding gate.
//!
//! Generation output is never trusted on its own: an answer must be
//! backed by citations, and under the lexical policy must also share
//! vocabulary with the cited text, or it is replaced by the refusal.

use crate::rag::prompts::REFUSAL_TEXT;
use crate::types::ScoredChunk;
use std::collections::HashSet;
use tracing::debug;

/// Tokens ignored when comparing answer and citation vocabulary.
const STOPWORDS: &[&str] = &[
    "the", "is", "a", "an", "and", "or", "to", "of", "in", "on", "for", "with", "this", "that",
    "it", "as", "are", "was",
];

/// How strictly answers are checked against their citations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundingPolicy {
    /// An answer passes as long as at least one citation exists.
    CitationsOnly,
    /// An answer must additionally share at least `min_overlap`
    /// non-stopword tokens with at least one citation's text.
    LexicalOverlap {
        /// Minimum shared token count.
        min_overlap: usize,
    },
}

impl Default for GroundingPolicy {
    fn default() -> Self {
        GroundingPolicy::LexicalOverlap { min_overlap: 1 }
    }
}

/// Lowercased whitespace tokens of `text`, stopwords removed.
fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Whether `answer` shares at least `min_overlap` non-stopword tokens
/// with `source`.
///
/// An answer whose token set is empty after stopword removal carries no
/// checkable content and is treated as ungrounded.
pub fn is_answer_grounded(answer: &str, source: &str, min_overlap: usize) -> bool {
    let answer_tokens = token_set(answer);
    if answer_tokens.is_empty() {
        return false;
    }

    let source_tokens = token_set(source);
    let overlap = answer_tokens.intersection(&source_tokens).count();
    overlap >= min_overlap
}

/// Apply the grounding gate: return `answer` if it passes, the refusal
/// text otherwise.
///
/// With no citations every answer fails, regardless of policy.
pub fn enforce_grounding(answer: &str, citations: &[ScoredChunk], policy: &GroundingPolicy) -> String {
    if citations.is_empty() {
        debug!("Grounding gate: no citations, refusing");
        return REFUSAL_TEXT.to_string();
    }

    if let GroundingPolicy::LexicalOverlap { min_overlap } = policy {
        let supported = citations
            .iter()
            .any(|c| is_answer_grounded(answer, &c.chunk.chunk_text, *min_overlap));
        if !supported {
            debug!("Grounding gate: no citation meets the overlap threshold, refusing");
            return REFUSAL_TEXT.to_string();
        }
    }

    answer.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn citation(text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                chunk_text: text.to_string(),
                chunk_index: 0,
            },
            score: 1.0,
        }
    }

    #[test]
    fn test_grounded_answer_passes() {
        let answer = "The capital of France is Paris.";
        let source = "Paris is the capital and largest city of France.";
        assert!(is_answer_grounded(answer, source, 1));
    }

    #[test]
    fn test_disjoint_answer_fails() {
        let answer = "Berlin has great weather.";
        let source = "Paris is the capital of France.";
        assert!(!is_answer_grounded(answer, source, 1));
    }

    #[test]
    fn test_stopword_only_answer_fails() {
        // Every token is a stopword, so there is nothing to check.
        assert!(!is_answer_grounded("the and of", "the and of", 1));
        assert!(!is_answer_grounded("", "anything", 1));
    }

    #[test]
    fn test_min_overlap_threshold() {
        let answer = "rust compiles fast binaries";
        let source = "rust produces fast native code";

        // Shares "rust" and "fast".
        assert!(is_answer_grounded(answer, source, 2));
        assert!(!is_answer_grounded(answer, source, 3));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(is_answer_grounded("PARIS", "paris", 1));
    }

    #[test]
    fn test_no_citations_always_refuses() {
        let result = enforce_grounding("Paris", &[], &GroundingPolicy::CitationsOnly);
        assert_eq!(result, REFUSAL_TEXT);
    }

    #[test]
    fn test_citations_only_skips_lexical_check() {
        let citations = vec![citation("completely unrelated source text")];
        let result = enforce_grounding("zebras", &citations, &GroundingPolicy::CitationsOnly);
        assert_eq!(result, "zebras");
    }

    #[test]
    fn test_lexical_policy_refuses_ungrounded_answer() {
        let citations = vec![citation("Paris is the capital of France.")];
        let result = enforce_grounding(
            "Berlin has great weather.",
            &citations,
            &GroundingPolicy::default(),
        );
        assert_eq!(result, REFUSAL_TEXT);
    }

    #[test]
    fn test_lexical_policy_passes_grounded_answer() {
        let citations = vec![citation("Paris is the capital of France.")];
        let result = enforce_grounding(
            "The capital is Paris.",
            &citations,
            &GroundingPolicy::default(),
        );
        assert_eq!(result, "The capital is Paris.");
    }

    #[test]
    fn test_any_single_citation_can_ground_the_answer() {
        let citations = vec![
            citation("unrelated text about zebras"),
            citation("cargo builds rust projects quickly"),
        ];
        let result = enforce_grounding(
            "cargo builds projects",
            &citations,
            &GroundingPolicy::LexicalOverlap { min_overlap: 2 },
        );
        assert_eq!(result, "cargo builds projects");
    }

    #[test]
    fn test_overlap_is_not_pooled_across_citations() {
        // Two tokens shared in total, but no single citation shares two.
        let citations = vec![citation("rust language"), citation("cargo tooling")];
        let result = enforce_grounding(
            "rust cargo",
            &citations,
            &GroundingPolicy::LexicalOverlap { min_overlap: 2 },
        );
        assert_eq!(result, REFUSAL_TEXT);
    }
}
