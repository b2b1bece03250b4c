//!
//! # Storage Traits
//!
//! The engine never talks to the database directly; it goes through these traits so the
//! orchestrator can be driven by [`crate::store::DbStore`] in production and by any other
//! implementation where that is more convenient.
//!
//! All cross-submission lookups are keyed by `(submission_id, reference)` pairs, since
//! element ids are only unique within a single submission.

use std::collections::HashMap;

use async_trait::async_trait;
use db::models::{assessment_result, feedback, model_cluster, model_element, modeling_exercise, modeling_submission};

use crate::clustering::ElementCluster;
use crate::error::CompassResult;
use crate::traits::selector::{FeedbackCandidate, SuggestedFeedback};

/// Result of a submission together with the feedback it now carries.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedResult {
    pub result: assessment_result::Model,
    pub feedback: Vec<feedback::Model>,
}

#[async_trait]
pub trait SubmissionProvider: Send + Sync {
    async fn exercise(&self, exercise_id: i64) -> CompassResult<Option<modeling_exercise::Model>>;

    async fn submission(&self, submission_id: i64) -> CompassResult<Option<modeling_submission::Model>>;

    /// Submitted submissions of an exercise, ordered by id.
    async fn submitted_submissions(&self, exercise_id: i64) -> CompassResult<Vec<modeling_submission::Model>>;
}

#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn has_clusters(&self, exercise_id: i64) -> CompassResult<bool>;

    /// Persists clusters and their members in a single transaction.
    ///
    /// Returns `false`, writing nothing, when the exercise already has clusters at the
    /// time the transaction runs.
    async fn save_clusters(&self, exercise_id: i64, clusters: &[ElementCluster]) -> CompassResult<bool>;

    /// Deletes all clusters of an exercise, returning how many were removed.
    async fn delete_clusters(&self, exercise_id: i64) -> CompassResult<u64>;

    async fn clusters_of_exercise(&self, exercise_id: i64) -> CompassResult<Vec<model_cluster::Model>>;

    /// Persisted elements of one submission.
    async fn elements_of_submission(&self, submission_id: i64) -> CompassResult<Vec<model_element::Model>>;

    /// Members of the given clusters, grouped by cluster id.
    ///
    /// Clusters that do not exist are absent from the map.
    async fn cluster_members(&self, cluster_ids: &[i64]) -> CompassResult<HashMap<i64, Vec<model_element::Model>>>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Manual feedback given on exactly the given elements, in feedback-id order.
    async fn manual_feedback_for(&self, elements: &[model_element::Model]) -> CompassResult<Vec<FeedbackCandidate>>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn result_of_submission(&self, submission_id: i64) -> CompassResult<Option<assessment_result::Model>>;

    /// Creates or reuses the submission's result, replaces its feedback with `suggestions`
    /// and marks it semi-automatic, all in one transaction.
    ///
    /// Returns `None` without writing when the result turned manual in the meantime.
    async fn save_suggested_result(
        &self,
        submission_id: i64,
        suggestions: &[SuggestedFeedback],
        score: f64,
    ) -> CompassResult<Option<SuggestedResult>>;
}

/// Everything the suggestion service needs from storage.
pub trait CompassStore: SubmissionProvider + ClusterStore + FeedbackStore + ResultStore {}

impl<T> CompassStore for T where T: SubmissionProvider + ClusterStore + FeedbackStore + ResultStore {}
