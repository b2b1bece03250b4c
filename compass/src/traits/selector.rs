//!
//! # Feedback Selection
//!
//! A [`FeedbackSelection`] strategy receives the manual feedback that tutors gave on the
//! cluster-mates of one element and decides which single feedback, if any, should be
//! suggested for that element.

use db::models::feedback::{FeedbackType, NewFeedback};
use serde::Serialize;

/// Manual feedback on one cluster member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackCandidate {
    /// Submission the feedback was given on.
    pub submission_id: i64,
    /// `"{elementType}:{elementId}"` within that submission.
    pub reference: String,
    pub text: Option<String>,
    pub detail_text: Option<String>,
    pub credits: f64,
    pub grading_instruction_id: Option<i64>,
}

/// Feedback proposed for an element of the submission being assessed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedFeedback {
    pub reference: String,
    pub text: Option<String>,
    pub detail_text: Option<String>,
    pub credits: f64,
    pub grading_instruction_id: Option<i64>,
    /// Share of the candidates that agreed with this suggestion, in `(0, 1]`.
    pub confidence: f64,
}

impl SuggestedFeedback {
    /// Copies the content of `candidate` onto the element addressed by `reference`.
    pub fn from_candidate(reference: &str, candidate: &FeedbackCandidate, confidence: f64) -> Self {
        Self {
            reference: reference.to_string(),
            text: candidate.text.clone(),
            detail_text: candidate.detail_text.clone(),
            credits: candidate.credits,
            grading_instruction_id: candidate.grading_instruction_id,
            confidence,
        }
    }

    /// Row values for persisting the suggestion as automatic feedback.
    pub fn to_new_feedback(&self) -> NewFeedback {
        NewFeedback {
            reference: self.reference.clone(),
            text: self.text.clone(),
            detail_text: self.detail_text.clone(),
            credits: self.credits,
            grading_instruction_id: self.grading_instruction_id,
            feedback_type: FeedbackType::Automatic,
        }
    }
}

/// A strategy for turning cluster feedback into a suggestion.
///
/// # Arguments
/// - `target_reference`: reference of the element that needs feedback.
/// - `target_submission_id`: submission the element belongs to; feedback already given on
///   the element itself must not be used as a candidate.
/// - `candidates`: manual feedback on the element's cluster-mates, in feedback-id order.
///
/// # Returns
/// - `Some(SuggestedFeedback)` addressed to `target_reference`.
/// - `None` when the strategy has nothing to suggest.
///
/// Implementations must be pure functions of their inputs.
pub trait FeedbackSelection: Send + Sync {
    fn select(
        &self,
        target_submission_id: i64,
        target_reference: &str,
        candidates: &[FeedbackCandidate],
    ) -> Option<SuggestedFeedback>;
}

/// Candidates left once feedback on the target element itself is removed.
pub fn foreign_candidates<'a>(
    target_submission_id: i64,
    target_reference: &str,
    candidates: &'a [FeedbackCandidate],
) -> Vec<&'a FeedbackCandidate> {
    candidates
        .iter()
        .filter(|c| !(c.submission_id == target_submission_id && c.reference == target_reference))
        .collect()
}
