//! # MostFrequentFeedback Strategy
//!
//! Suggests the feedback that the largest share of cluster-mates received.
//!
//! ## Overview
//!
//! - Feedback on the target element itself is ignored; without other candidates there is
//!   no suggestion.
//! - Candidates are grouped by credits and grading instruction, in first-seen order.
//! - The largest group wins; on equal sizes the group seen first wins.
//! - Confidence is the winning group's share of all candidates. Below the configured
//!   threshold there is no suggestion.
//! - The suggestion copies text, detail text, credits and grading instruction of the first
//!   feedback in the winning group.

use crate::traits::selector::{FeedbackCandidate, FeedbackSelection, SuggestedFeedback, foreign_candidates};

#[derive(Debug, Clone, Default)]
pub struct MostFrequentFeedback {
    confidence_threshold: f64,
}

impl MostFrequentFeedback {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
        }
    }
}

/// Credits compared in hundredths so `0.1 + 0.2` and `0.3` count as the same grade.
fn group_key(candidate: &FeedbackCandidate) -> (i64, Option<i64>) {
    ((candidate.credits * 100.0).round() as i64, candidate.grading_instruction_id)
}

impl FeedbackSelection for MostFrequentFeedback {
    fn select(
        &self,
        target_submission_id: i64,
        target_reference: &str,
        candidates: &[FeedbackCandidate],
    ) -> Option<SuggestedFeedback> {
        let candidates = foreign_candidates(target_submission_id, target_reference, candidates);
        if candidates.is_empty() {
            return None;
        }

        // (key, first candidate, count) in first-seen order
        let mut groups: Vec<((i64, Option<i64>), &FeedbackCandidate, usize)> = Vec::new();
        for &candidate in &candidates {
            let key = group_key(candidate);
            match groups.iter_mut().find(|(k, _, _)| *k == key) {
                Some((_, _, count)) => *count += 1,
                None => groups.push((key, candidate, 1)),
            }
        }

        let mut winner = &groups[0];
        for group in &groups[1..] {
            if group.2 > winner.2 {
                winner = group;
            }
        }

        let confidence = winner.2 as f64 / candidates.len() as f64;
        if confidence < self.confidence_threshold {
            return None;
        }

        Some(SuggestedFeedback::from_candidate(target_reference, winner.1, confidence))
    }
}
