//! # Cluster Builder
//!
//! Groups the elements of all submissions of an exercise into clusters of mutually similar
//! elements.
//!
//! Submissions are visited in ascending id order and the elements of each submission in
//! ascending JSON id order. Every element is compared with the representative (first
//! member) of each existing cluster of the same element kind:
//! - the cluster with the highest overall similarity wins; on equal scores the cluster that
//!   was created first wins;
//! - the element joins the winner when the score reaches the similarity threshold,
//!   otherwise it starts a new cluster.
//!
//! Scoring against the representatives runs on the rayon pool; assignment stays sequential,
//! so the outcome does not depend on the number of threads.

use std::collections::HashMap;
use std::mem::Discriminant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::CompassConfig;
use crate::error::{CompassError, CompassResult};
use crate::umlmodel::{ElementKind, ElementRef, UmlDiagram};

/// Below this many representatives the sequential scan is used even when parallelism is on.
const PARALLEL_MIN_CANDIDATES: usize = 64;

/// A parsed submission ready for clustering.
#[derive(Debug, Clone)]
pub struct SubmissionModel {
    pub submission_id: i64,
    pub diagram: UmlDiagram,
}

/// Identifies one element of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClusterMember {
    pub submission_id: i64,
    pub model_element_id: String,
    pub model_element_type: String,
}

impl ClusterMember {
    fn of(submission_id: i64, element: &ElementRef<'_>) -> Self {
        Self {
            submission_id,
            model_element_id: element.json_id().to_string(),
            model_element_type: element.json_type().to_string(),
        }
    }

    pub fn reference(&self) -> String {
        format!("{}:{}", self.model_element_type, self.model_element_id)
    }
}

/// Elements judged similar enough to share feedback, in the order they joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementCluster {
    pub members: Vec<ClusterMember>,
}

impl ElementCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

struct WorkingCluster<'a> {
    representative: ElementRef<'a>,
    members: Vec<ClusterMember>,
}

#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    similarity_threshold: f64,
    parallel: bool,
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::from_config(&CompassConfig::default())
    }
}

impl ClusterBuilder {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold: similarity_threshold.clamp(0.0, 1.0),
            parallel: true,
        }
    }

    pub fn from_config(config: &CompassConfig) -> Self {
        Self::new(config.similarity_threshold).with_parallel(config.parallel_comparisons)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    /// Clusters every element of `submissions`.
    ///
    /// The result lists clusters in creation order; every element of every submission is a
    /// member of exactly one cluster.
    pub fn build(&self, submissions: &[SubmissionModel]) -> Vec<ElementCluster> {
        let mut ordered: Vec<&SubmissionModel> = submissions.iter().collect();
        ordered.sort_by_key(|s| s.submission_id);

        let mut clusters: Vec<WorkingCluster<'_>> = Vec::new();
        let mut by_kind: HashMap<Discriminant<ElementKind>, Vec<usize>> = HashMap::new();

        for submission in ordered {
            for element in submission.diagram.sorted_elements() {
                let member = ClusterMember::of(submission.submission_id, &element);
                let bucket = by_kind.entry(element.kind_key()).or_default();

                match self.best_cluster(&element, bucket, &clusters) {
                    Some((position, score)) if score >= self.similarity_threshold => {
                        debug!(reference = %member.reference(), score, "Joining cluster");
                        clusters[position].members.push(member);
                    }
                    _ => {
                        bucket.push(clusters.len());
                        clusters.push(WorkingCluster {
                            representative: element,
                            members: vec![member],
                        });
                    }
                }
            }
        }

        info!(
            clusters = clusters.len(),
            elements = clusters.iter().map(|c| c.members.len()).sum::<usize>(),
            "Built element clusters"
        );

        clusters
            .into_iter()
            .map(|c| ElementCluster { members: c.members })
            .collect()
    }

    /// Runs [`Self::build`] on the blocking pool.
    pub async fn build_in_background(&self, submissions: Vec<SubmissionModel>) -> CompassResult<Vec<ElementCluster>> {
        let builder = self.clone();
        tokio::task::spawn_blocking(move || builder.build(&submissions))
            .await
            .map_err(|e| CompassError::Task(e.to_string()))
    }

    /// Position (into `clusters`) and score of the best representative in `bucket`.
    fn best_cluster(
        &self,
        element: &ElementRef<'_>,
        bucket: &[usize],
        clusters: &[WorkingCluster<'_>],
    ) -> Option<(usize, f64)> {
        let score = |&position: &usize| element.overall_similarity(&clusters[position].representative);

        let scores: Vec<f64> = if self.parallel && bucket.len() >= PARALLEL_MIN_CANDIDATES {
            bucket.par_iter().map(score).collect()
        } else {
            bucket.iter().map(score).collect()
        };

        let mut best: Option<(usize, f64)> = None;
        for (&position, score) in bucket.iter().zip(scores) {
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((position, score));
            }
        }
        best
    }
}
