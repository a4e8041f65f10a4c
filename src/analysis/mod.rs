//! CPU-bound text analysis
//!
//! This module implements the analysis stage of the pipeline: a pure,
//! deterministic computation over one record's free text. It is deliberately
//! structured as compute-heavy work (repeated accumulation passes over the
//! tokenized text) rather than I/O-bound work, so it benefits from running on
//! the worker pool's dedicated threads instead of the async scheduler.
//!
//! The function has no shared mutable state and no environment dependency
//! beyond its input, which is what makes it safe to execute on any worker
//! thread without coordination.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Accumulation passes per chunk. Models a realistic CPU cost per record.
const HEAVY_PASSES: usize = 2000;

/// Words longer than this many characters count toward the rarity score.
const RARE_WORD_LEN: usize = 7;

/// Sentences grouped into one analysis chunk.
const CHUNK_SENTENCES: usize = 2;

lazy_static! {
    static ref WORD_PATTERN: Regex = Regex::new(r"\b\w+\b").unwrap();
    static ref SENTENCE_SPLIT: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

/// Aggregated statistics for one record's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    /// Number of sentence chunks the text was divided into
    pub chunk_count: usize,
    /// Total word-like tokens across all chunks
    pub word_count: usize,
    /// Accumulated count of words longer than the rarity threshold
    pub rare_score: u64,
}

/// One pool invocation's output: the stats plus the worker that produced
/// them. The worker id is diagnostic only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnalysisResult {
    pub stats: ContentStats,
    pub worker: usize,
}

fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_SPLIT.split(text.trim()).collect()
}

fn sentence_chunks(text: &str, max_sentences: usize) -> Vec<String> {
    split_sentences(text)
        .chunks(max_sentences)
        .map(|group| group.join(" "))
        .collect()
}

fn heavy_sentence_analysis(chunk: &str) -> (usize, u64) {
    let words: Vec<&str> = WORD_PATTERN.find_iter(chunk).map(|m| m.as_str()).collect();

    let mut rare_score = 0u64;
    for _ in 0..HEAVY_PASSES {
        rare_score += words
            .iter()
            .filter(|w| w.chars().count() > RARE_WORD_LEN)
            .count() as u64;
    }

    (words.len(), rare_score)
}

/// Analyze one record's text: chunk it into sentence groups, then run the
/// heavy per-chunk pass and sum the results.
///
/// Pure and idempotent: the same input always yields the same stats. Empty
/// text yields zero words and a zero rarity score.
pub fn analyze_content(paragraph: &str) -> ContentStats {
    let mut stats = ContentStats::default();

    for chunk in sentence_chunks(paragraph, CHUNK_SENTENCES) {
        let (word_count, rare_score) = heavy_sentence_analysis(&chunk);
        stats.chunk_count += 1;
        stats.word_count += word_count;
        stats.rare_score += rare_score;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_words_in_short_sentences() {
        assert_eq!(analyze_content("Short sentence here.").word_count, 3);
        assert_eq!(analyze_content("Another short one.").word_count, 3);
        assert_eq!(
            analyze_content("A considerably lengthier overview sentence indeed.").word_count,
            6
        );
    }

    #[test]
    fn rarity_tracks_long_words() {
        let first = analyze_content("Short sentence here.");
        let second = analyze_content("Another short one.");
        let third = analyze_content("A considerably lengthier overview sentence indeed.");

        // "considerably", "lengthier" and "overview" all exceed the threshold
        assert_eq!(third.rare_score, 3 * HEAVY_PASSES as u64);
        assert!(third.rare_score > first.rare_score);
        assert!(third.rare_score > second.rare_score);
    }

    #[test]
    fn empty_text_yields_zero_stats() {
        let stats = analyze_content("");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.rare_score, 0);
    }

    #[test]
    fn is_idempotent() {
        let text = "Deterministic analysis produces identical results. Every single time.";
        assert_eq!(analyze_content(text), analyze_content(text));
    }

    #[test]
    fn chunks_group_two_sentences() {
        let stats = analyze_content("One. Two. Three. Four. Five.");
        assert_eq!(stats.chunk_count, 3);
        assert_eq!(stats.word_count, 5);
    }

    #[test]
    fn word_length_is_measured_in_characters() {
        // "straße" is 6 characters but 7 bytes; it must not count as rare
        let stats = analyze_content("straße");
        assert_eq!(stats.word_count, 1);
        assert_eq!(stats.rare_score, 0);
    }
}
