//! Strict strategy: suggest only when every cluster-mate was graded with the same credits.

use crate::traits::selector::{FeedbackCandidate, FeedbackSelection, SuggestedFeedback, foreign_candidates};

#[derive(Debug, Clone, Copy, Default)]
pub struct Unanimous;

impl FeedbackSelection for Unanimous {
    fn select(
        &self,
        target_submission_id: i64,
        target_reference: &str,
        candidates: &[FeedbackCandidate],
    ) -> Option<SuggestedFeedback> {
        let candidates = foreign_candidates(target_submission_id, target_reference, candidates);
        let first = *candidates.first()?;

        let agree = candidates
            .iter()
            .all(|c| (c.credits - first.credits).abs() < 0.005);
        agree.then(|| SuggestedFeedback::from_candidate(target_reference, first, 1.0))
    }
}
