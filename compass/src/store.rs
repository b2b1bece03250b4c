//! SeaORM implementation of the storage traits.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use db::models::assessment_result::{self, AssessmentType};
use db::models::{feedback, model_cluster, model_element, modeling_exercise, modeling_submission};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::debug;

use crate::clustering::ElementCluster;
use crate::error::CompassResult;
use crate::traits::selector::{FeedbackCandidate, SuggestedFeedback};
use crate::traits::store::{
    ClusterStore, FeedbackStore, ResultStore, SubmissionProvider, SuggestedResult,
};

/// Rows per multi-row insert; keeps statements under SQLite's bound-parameter limit.
const INSERT_CHUNK: usize = 500;

#[derive(Debug, Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl SubmissionProvider for DbStore {
    async fn exercise(&self, exercise_id: i64) -> CompassResult<Option<modeling_exercise::Model>> {
        Ok(modeling_exercise::Model::find_by_id(&self.db, exercise_id).await?)
    }

    async fn submission(&self, submission_id: i64) -> CompassResult<Option<modeling_submission::Model>> {
        Ok(modeling_submission::Model::find_by_id(&self.db, submission_id).await?)
    }

    async fn submitted_submissions(&self, exercise_id: i64) -> CompassResult<Vec<modeling_submission::Model>> {
        Ok(modeling_submission::Model::find_submitted_for_exercise(&self.db, exercise_id).await?)
    }
}

#[async_trait]
impl ClusterStore for DbStore {
    async fn has_clusters(&self, exercise_id: i64) -> CompassResult<bool> {
        Ok(model_cluster::Model::count_for_exercise(&self.db, exercise_id).await? > 0)
    }

    async fn save_clusters(&self, exercise_id: i64, clusters: &[ElementCluster]) -> CompassResult<bool> {
        let txn = self.db.begin().await?;

        if model_cluster::Model::count_for_exercise(&txn, exercise_id).await? > 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        let mut rows = Vec::new();
        for cluster in clusters.iter().filter(|c| !c.is_empty()) {
            let saved = model_cluster::Model::create(&txn, exercise_id).await?;
            rows.extend(cluster.members.iter().map(|m| {
                model_element::Model::active(
                    saved.id,
                    m.submission_id,
                    &m.model_element_id,
                    &m.model_element_type,
                )
            }));
        }

        while !rows.is_empty() {
            let rest = rows.split_off(rows.len().min(INSERT_CHUNK));
            model_element::Model::insert_batch(&txn, rows).await?;
            rows = rest;
        }

        txn.commit().await?;
        Ok(true)
    }

    async fn delete_clusters(&self, exercise_id: i64) -> CompassResult<u64> {
        let txn = self.db.begin().await?;
        let removed = model_cluster::Model::delete_for_exercise(&txn, exercise_id).await?;
        txn.commit().await?;
        Ok(removed)
    }

    async fn clusters_of_exercise(&self, exercise_id: i64) -> CompassResult<Vec<model_cluster::Model>> {
        Ok(model_cluster::Model::find_for_exercise(&self.db, exercise_id).await?)
    }

    async fn elements_of_submission(&self, submission_id: i64) -> CompassResult<Vec<model_element::Model>> {
        Ok(model_element::Model::find_by_submission(&self.db, submission_id).await?)
    }

    async fn cluster_members(&self, cluster_ids: &[i64]) -> CompassResult<HashMap<i64, Vec<model_element::Model>>> {
        let mut members: HashMap<i64, Vec<model_element::Model>> = model_cluster::Model::find_by_ids(&self.db, cluster_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, Vec::new()))
            .collect();

        for element in model_element::Model::find_by_clusters(&self.db, cluster_ids).await? {
            if let Some(list) = members.get_mut(&element.cluster_id) {
                list.push(element);
            }
        }
        Ok(members)
    }
}

#[async_trait]
impl FeedbackStore for DbStore {
    async fn manual_feedback_for(&self, elements: &[model_element::Model]) -> CompassResult<Vec<FeedbackCandidate>> {
        let pairs: HashSet<(i64, String)> = elements.iter().map(|e| (e.submission_id, e.reference())).collect();

        let mut submission_ids: Vec<i64> = pairs.iter().map(|(s, _)| *s).collect();
        submission_ids.sort_unstable();
        submission_ids.dedup();
        let mut references: Vec<String> = pairs.iter().map(|(_, r)| r.clone()).collect();
        references.sort_unstable();
        references.dedup();

        let rows = feedback::Model::find_manual_for_elements(&self.db, &submission_ids, &references).await?;
        Ok(rows
            .into_iter()
            .filter(|(submission_id, f)| pairs.contains(&(*submission_id, f.reference.clone())))
            .map(|(submission_id, f)| FeedbackCandidate {
                submission_id,
                reference: f.reference,
                text: f.text,
                detail_text: f.detail_text,
                credits: f.credits,
                grading_instruction_id: f.grading_instruction_id,
            })
            .collect())
    }
}

#[async_trait]
impl ResultStore for DbStore {
    async fn result_of_submission(&self, submission_id: i64) -> CompassResult<Option<assessment_result::Model>> {
        Ok(assessment_result::Model::find_by_submission(&self.db, submission_id).await?)
    }

    async fn save_suggested_result(
        &self,
        submission_id: i64,
        suggestions: &[SuggestedFeedback],
        score: f64,
    ) -> CompassResult<Option<SuggestedResult>> {
        let txn = self.db.begin().await?;

        let result = match assessment_result::Model::find_by_submission(&txn, submission_id).await? {
            Some(existing) if existing.is_manual() => {
                debug!(submission_id, "Result became manual, keeping it");
                txn.rollback().await?;
                return Ok(None);
            }
            Some(existing) => {
                existing
                    .update_assessment(&txn, AssessmentType::SemiAutomatic, score)
                    .await?
            }
            None => {
                assessment_result::Model::create(&txn, submission_id, AssessmentType::SemiAutomatic, score).await?
            }
        };

        feedback::Model::delete_by_result(&txn, result.id).await?;
        let mut saved = Vec::with_capacity(suggestions.len());
        for suggestion in suggestions {
            saved.push(feedback::Model::create(&txn, result.id, &suggestion.to_new_feedback()).await?);
        }

        txn.commit().await?;
        Ok(Some(SuggestedResult {
            result,
            feedback: saved,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusterMember;
    use db::models::feedback::{FeedbackType, NewFeedback};
    use db::models::modeling_exercise::DiagramType;
    use db::test_utils::setup_test_db;

    async fn seeded() -> (DbStore, i64, i64, i64) {
        let db = setup_test_db().await;
        let exercise = modeling_exercise::Model::create(
            &db,
            "Library",
            DiagramType::ClassDiagram,
            AssessmentType::SemiAutomatic,
            false,
            10.0,
        )
        .await
        .unwrap();
        let a = modeling_submission::Model::create(&db, exercise.id, Some("{}"), true)
            .await
            .unwrap();
        let b = modeling_submission::Model::create(&db, exercise.id, Some("{}"), true)
            .await
            .unwrap();
        (DbStore::new(db), exercise.id, a.id, b.id)
    }

    fn member(submission_id: i64, id: &str) -> ClusterMember {
        ClusterMember {
            submission_id,
            model_element_id: id.to_string(),
            model_element_type: "Class".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_clusters_only_once() {
        let (store, exercise_id, a, b) = seeded().await;
        let clusters = vec![
            ElementCluster {
                members: vec![member(a, "x"), member(b, "x")],
            },
            ElementCluster {
                members: vec![member(b, "y")],
            },
        ];

        assert!(!store.has_clusters(exercise_id).await.unwrap());
        assert!(store.save_clusters(exercise_id, &clusters).await.unwrap());
        assert!(!store.save_clusters(exercise_id, &clusters[..1]).await.unwrap());

        let saved = store.clusters_of_exercise(exercise_id).await.unwrap();
        assert_eq!(saved.len(), 2);

        let members = store.cluster_members(&[saved[0].id, saved[1].id, 999]).await.unwrap();
        assert_eq!(members[&saved[0].id].len(), 2);
        assert_eq!(members[&saved[1].id][0].reference(), "Class:y");
        assert!(!members.contains_key(&999));

        assert_eq!(store.elements_of_submission(b).await.unwrap().len(), 2);
        assert_eq!(store.delete_clusters(exercise_id).await.unwrap(), 2);
        assert!(store.elements_of_submission(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_feedback_is_narrowed_to_exact_pairs() {
        let (store, exercise_id, a, b) = seeded().await;
        store
            .save_clusters(
                exercise_id,
                &[ElementCluster {
                    members: vec![member(a, "x"), member(b, "y")],
                }],
            )
            .await
            .unwrap();

        let result_a = assessment_result::Model::create(store.connection(), a, AssessmentType::Manual, 0.0)
            .await
            .unwrap();
        for reference in ["Class:x", "Class:y"] {
            feedback::Model::create(
                store.connection(),
                result_a.id,
                &NewFeedback {
                    reference: reference.to_string(),
                    text: Some(format!("on {reference}")),
                    detail_text: None,
                    credits: 1.0,
                    grading_instruction_id: None,
                    feedback_type: FeedbackType::Manual,
                },
            )
            .await
            .unwrap();
        }

        let elements = vec![
            model_element::Model {
                id: 0,
                cluster_id: 0,
                submission_id: a,
                model_element_id: "x".into(),
                model_element_type: "Class".into(),
            },
            model_element::Model {
                id: 0,
                cluster_id: 0,
                submission_id: b,
                model_element_id: "y".into(),
                model_element_type: "Class".into(),
            },
        ];
        let candidates = store.manual_feedback_for(&elements).await.unwrap();

        // "Class:y" of submission a was never asked for
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].submission_id, a);
        assert_eq!(candidates[0].text.as_deref(), Some("on Class:x"));
    }

    #[tokio::test]
    async fn test_suggested_result_replaces_feedback_and_respects_manual() {
        let (store, _, a, _) = seeded().await;
        let suggestion = SuggestedFeedback {
            reference: "Class:x".into(),
            text: Some("missing validation".into()),
            detail_text: None,
            credits: 2.0,
            grading_instruction_id: None,
            confidence: 1.0,
        };

        let first = store
            .save_suggested_result(a, &[suggestion.clone(), suggestion.clone()], 40.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.result.assessment_type, AssessmentType::SemiAutomatic);
        assert_eq!(first.feedback.len(), 2);
        assert!(first.feedback.iter().all(|f| f.feedback_type == FeedbackType::Automatic));

        let second = store
            .save_suggested_result(a, &[suggestion.clone()], 20.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.result.id, first.result.id);
        assert_eq!(second.result.score, 20.0);
        assert_eq!(
            feedback::Model::find_by_result(store.connection(), second.result.id)
                .await
                .unwrap()
                .len(),
            1
        );

        second.result.complete_manually(store.connection()).await.unwrap();
        assert!(store
            .save_suggested_result(a, &[suggestion], 20.0)
            .await
            .unwrap()
            .is_none());
        let kept = store.result_of_submission(a).await.unwrap().unwrap();
        assert!(kept.is_manual());
        assert_eq!(kept.score, 20.0);
    }
}
