//! # Suggestion Service
//!
//! Orchestrates clustering and feedback suggestion for modeling exercises.
//!
//! ## Lifecycle
//! 1. [`SuggestionService::build`] parses every submitted model of an exercise, clusters
//!    the elements and persists the clusters. It runs at most once per exercise: a
//!    per-exercise lock serializes concurrent callers and the persist re-checks for existing
//!    clusters inside its transaction.
//! 2. [`SuggestionService::get_suggestion_result`] then proposes feedback for a submission by
//!    asking the feedback selector, per element, what the element's cluster-mates received.
//!
//! A submission's result moves from absent to semi-automatic, may be re-suggested while it
//! stays semi-automatic, and is never touched again once it is manual.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use db::models::modeling_exercise::{self, AssessmentType};
use db::models::{model_element, modeling_submission};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clustering::{ClusterBuilder, SubmissionModel};
use crate::config::CompassConfig;
use crate::error::{CompassError, CompassResult};
use crate::feedback::MostFrequentFeedback;
use crate::parsers::model_parser::{UmlModelParser, is_diagram_type_supported};
use crate::traits::selector::{FeedbackCandidate, FeedbackSelection, SuggestedFeedback};
use crate::traits::store::{CompassStore, SuggestedResult};
use crate::umlmodel::UmlDiagram;

/// What a call to [`SuggestionService::build`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildOutcome {
    /// Clusters were computed and persisted.
    Built { clusters: usize, elements: usize },
    /// The exercise already had clusters; nothing was written.
    AlreadyBuilt,
    /// The exercise cannot use suggestions; nothing was done.
    Unsupported,
}

/// Summary of the persisted clusters of an exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterStatistics {
    pub clusters: usize,
    pub elements: usize,
    /// Clusters with at least one manually assessed member.
    pub clusters_with_feedback: usize,
    pub elements_by_type: BTreeMap<String, usize>,
}

/// Score of a result in percent of `max_points`, rounded to two decimals.
///
/// Credits are capped to `[0, max_points]`; an exercise without points always scores 0.
pub fn total_score(credits: f64, max_points: f64) -> f64 {
    if max_points <= 0.0 {
        return 0.0;
    }
    round2(credits.clamp(0.0, max_points) / max_points * 100.0)
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub struct SuggestionService<S> {
    store: S,
    config: CompassConfig,
    parser: UmlModelParser,
    selector: Box<dyn FeedbackSelection>,
    build_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl<S: CompassStore> SuggestionService<S> {
    pub fn new(store: S, config: CompassConfig) -> Self {
        let selector = Box::new(MostFrequentFeedback::new(config.confidence_threshold));
        Self {
            store,
            config,
            parser: UmlModelParser,
            selector,
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the default [`MostFrequentFeedback`] strategy.
    pub fn with_selector(mut self, selector: impl FeedbackSelection + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CompassConfig {
        &self.config
    }

    /// Whether suggestions can be used for this exercise at all.
    pub fn is_supported(&self, exercise: &modeling_exercise::Model) -> bool {
        is_diagram_type_supported(exercise.diagram_type)
            && (exercise.assessment_type == AssessmentType::SemiAutomatic || !exercise.team_mode)
    }

    async fn build_lock(&self, exercise_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.build_locks.lock().await;
        locks.entry(exercise_id).or_default().clone()
    }

    /// Clusters all submitted models of `exercise` once.
    pub async fn build(&self, exercise: &modeling_exercise::Model) -> CompassResult<BuildOutcome> {
        if !self.is_supported(exercise) {
            info!(exercise_id = exercise.id, "Exercise does not support suggestions, skipping build");
            return Ok(BuildOutcome::Unsupported);
        }

        let lock = self.build_lock(exercise.id).await;
        let _guard = lock.lock().await;
        self.build_locked(exercise).await
    }

    /// Drops the clusters of `exercise` and builds them again while holding the build lock,
    /// so no other build can slip in between the two steps.
    pub async fn rebuild(&self, exercise: &modeling_exercise::Model) -> CompassResult<BuildOutcome> {
        if !self.is_supported(exercise) {
            info!(exercise_id = exercise.id, "Exercise does not support suggestions, skipping rebuild");
            return Ok(BuildOutcome::Unsupported);
        }

        let lock = self.build_lock(exercise.id).await;
        let _guard = lock.lock().await;

        let removed = self.store.delete_clusters(exercise.id).await?;
        info!(exercise_id = exercise.id, removed, "Deleted clusters for rebuild");
        self.build_locked(exercise).await
    }

    /// Body of [`Self::build`]; the caller holds the build lock of the exercise.
    async fn build_locked(&self, exercise: &modeling_exercise::Model) -> CompassResult<BuildOutcome> {
        if self.store.has_clusters(exercise.id).await? {
            info!(exercise_id = exercise.id, "Clusters already built");
            return Ok(BuildOutcome::AlreadyBuilt);
        }

        info!(exercise_id = exercise.id, "Building clusters");
        let submissions = self.store.submitted_submissions(exercise.id).await?;
        let mut models = Vec::with_capacity(submissions.len());
        for submission in &submissions {
            if let Some(diagram) = self.parse_submission(submission)? {
                models.push(SubmissionModel {
                    submission_id: submission.id,
                    diagram,
                });
            }
        }

        let builder = ClusterBuilder::from_config(&self.config);
        let clusters = builder.build_in_background(models).await?;
        let elements = clusters.iter().map(|c| c.len()).sum();

        if !self.store.save_clusters(exercise.id, &clusters).await? {
            info!(exercise_id = exercise.id, "Clusters were persisted concurrently, discarding");
            return Ok(BuildOutcome::AlreadyBuilt);
        }

        info!(
            exercise_id = exercise.id,
            submissions = submissions.len(),
            clusters = clusters.len(),
            elements,
            "Clusters built"
        );
        Ok(BuildOutcome::Built {
            clusters: clusters.len(),
            elements,
        })
    }

    /// Removes the clusters of an exercise so that the next [`Self::build`] recomputes them.
    pub async fn delete_clusters(&self, exercise_id: i64) -> CompassResult<u64> {
        let lock = self.build_lock(exercise_id).await;
        let _guard = lock.lock().await;

        let removed = self.store.delete_clusters(exercise_id).await?;
        info!(exercise_id, removed, "Deleted clusters");
        Ok(removed)
    }

    /// Parsed model of a submission, or `None` when it has nothing to cluster.
    fn parse_submission(&self, submission: &modeling_submission::Model) -> CompassResult<Option<UmlDiagram>> {
        match self.parser.parse_submission(submission.model.as_deref()) {
            Ok(diagram) if diagram.is_empty() => {
                debug!(submission_id = submission.id, "Submission has no elements");
                Ok(None)
            }
            Ok(diagram) => Ok(Some(diagram)),
            Err(e) if e.is_parse_error() => {
                warn!(submission_id = submission.id, error = %e, "Skipping unparsable submission");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Whole-model similarity of two submissions, or `None` when either has nothing to compare.
    pub fn compare_submissions(
        &self,
        first: &modeling_submission::Model,
        second: &modeling_submission::Model,
        min_similarity: f64,
    ) -> CompassResult<Option<f64>> {
        let (Some(a), Some(b)) = (self.parse_submission(first)?, self.parse_submission(second)?) else {
            return Ok(None);
        };
        if a.diagram_type() != b.diagram_type() {
            debug!(first = first.id, second = second.id, "Submissions use different diagram types");
            return Ok(Some(0.0));
        }
        Ok(Some(a.similarity(&b, min_similarity)))
    }

    /// Suggests a semi-automatic result for `submission` from the feedback on its
    /// elements' cluster-mates.
    ///
    /// Returns `Ok(None)` when the result is manual, the model cannot be parsed, or no
    /// element receives a suggestion.
    pub async fn get_suggestion_result(
        &self,
        submission: &modeling_submission::Model,
        exercise: &modeling_exercise::Model,
    ) -> CompassResult<Option<SuggestedResult>> {
        if !self.is_supported(exercise) {
            return Ok(None);
        }

        if let Some(result) = self.store.result_of_submission(submission.id).await? {
            if result.is_manual() {
                debug!(submission_id = submission.id, "Result is manual, no suggestion");
                return Ok(None);
            }
        }

        let Some(diagram) = self.parse_submission(submission)? else {
            return Ok(None);
        };

        let suggestions = self.suggest_feedback(submission.id, &diagram).await?;
        if suggestions.is_empty() {
            debug!(submission_id = submission.id, "No suggestions");
            return Ok(None);
        }

        let credits: f64 = suggestions.iter().map(|s| s.credits).sum();
        let score = total_score(credits, exercise.max_points);
        let saved = self
            .store
            .save_suggested_result(submission.id, &suggestions, score)
            .await?;

        if let Some(saved) = &saved {
            info!(
                submission_id = submission.id,
                feedback = saved.feedback.len(),
                score,
                "Saved semi-automatic result"
            );
        }
        Ok(saved)
    }

    async fn suggest_feedback(&self, submission_id: i64, diagram: &UmlDiagram) -> CompassResult<Vec<SuggestedFeedback>> {
        let clustered: HashMap<String, i64> = self
            .store
            .elements_of_submission(submission_id)
            .await?
            .into_iter()
            .map(|e| (e.reference(), e.cluster_id))
            .collect();

        let mut targets: Vec<(String, i64)> = Vec::new();
        for element in diagram.sorted_elements() {
            let reference = element.reference();
            match clustered.get(&reference) {
                Some(&cluster_id) => targets.push((reference, cluster_id)),
                None => debug!(submission_id, reference = %reference, "Element is not clustered"),
            }
        }
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let mut cluster_ids: Vec<i64> = targets.iter().map(|(_, c)| *c).collect();
        cluster_ids.sort_unstable();
        cluster_ids.dedup();

        let members = self.store.cluster_members(&cluster_ids).await?;
        for cluster_id in &cluster_ids {
            if members.get(cluster_id).is_none_or(|m| m.is_empty()) {
                return Err(CompassError::ClusterIntegrity(format!(
                    "element of submission {submission_id} points at cluster {cluster_id}, which has no members"
                )));
            }
        }

        let candidates = self.candidates_by_cluster(&members).await?;
        let none: Vec<FeedbackCandidate> = Vec::new();

        Ok(targets
            .iter()
            .filter_map(|(reference, cluster_id)| {
                let pool = candidates.get(cluster_id).unwrap_or(&none);
                self.selector.select(submission_id, reference, pool)
            })
            .collect())
    }

    /// Manual feedback of every cluster, keyed by cluster id, in feedback-id order.
    async fn candidates_by_cluster(
        &self,
        members: &HashMap<i64, Vec<model_element::Model>>,
    ) -> CompassResult<HashMap<i64, Vec<FeedbackCandidate>>> {
        let all: Vec<model_element::Model> = members.values().flatten().cloned().collect();
        let cluster_of: HashMap<(i64, String), i64> = all
            .iter()
            .map(|e| ((e.submission_id, e.reference()), e.cluster_id))
            .collect();

        let mut by_cluster: HashMap<i64, Vec<FeedbackCandidate>> = HashMap::new();
        for candidate in self.store.manual_feedback_for(&all).await? {
            if let Some(&cluster_id) = cluster_of.get(&(candidate.submission_id, candidate.reference.clone())) {
                by_cluster.entry(cluster_id).or_default().push(candidate);
            }
        }
        Ok(by_cluster)
    }

    /// Counts over the persisted clusters of an exercise.
    pub async fn cluster_statistics(&self, exercise_id: i64) -> CompassResult<ClusterStatistics> {
        let clusters = self.store.clusters_of_exercise(exercise_id).await?;
        let ids: Vec<i64> = clusters.iter().map(|c| c.id).collect();
        let members = self.store.cluster_members(&ids).await?;
        let candidates = self.candidates_by_cluster(&members).await?;

        let mut statistics = ClusterStatistics {
            clusters: clusters.len(),
            clusters_with_feedback: candidates.values().filter(|c| !c.is_empty()).count(),
            ..Default::default()
        };
        for element in members.values().flatten() {
            statistics.elements += 1;
            *statistics
                .elements_by_type
                .entry(element.model_element_type.clone())
                .or_default() += 1;
        }
        Ok(statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Unanimous;
    use crate::store::DbStore;
    use crate::traits::store::{ClusterStore, ResultStore};
    use db::models::assessment_result;
    use db::models::feedback::{self, FeedbackType, NewFeedback};
    use db::models::model_cluster;
    use db::models::modeling_exercise::DiagramType;
    use db::test_utils::setup_test_db;
    use sea_orm::{ConnectionTrait, EntityTrait};
    use serde_json::json;

    fn class_model(element_id: &str, name: &str) -> String {
        json!({
            "version": "2.0.0",
            "type": "ClassDiagram",
            "elements": [{
                "id": element_id,
                "name": name,
                "type": "Class",
                "owner": null,
                "attributes": [],
                "methods": []
            }],
            "relationships": []
        })
        .to_string()
    }

    struct Fixture {
        service: SuggestionService<DbStore>,
        exercise: modeling_exercise::Model,
        submissions: Vec<modeling_submission::Model>,
    }

    /// Exercise with one submission per `(element id, class name)` pair.
    async fn fixture(classes: &[(&str, &str)]) -> Fixture {
        let db = setup_test_db().await;
        let exercise = modeling_exercise::Model::create(
            &db,
            "Authentication",
            DiagramType::ClassDiagram,
            AssessmentType::SemiAutomatic,
            false,
            10.0,
        )
        .await
        .unwrap();

        let mut submissions = Vec::new();
        for (id, name) in classes {
            let model = class_model(id, name);
            submissions.push(
                modeling_submission::Model::create(&db, exercise.id, Some(model.as_str()), true)
                    .await
                    .unwrap(),
            );
        }

        Fixture {
            service: SuggestionService::new(DbStore::new(db), CompassConfig::default()),
            exercise,
            submissions,
        }
    }

    async fn assess_manually(fixture: &Fixture, index: usize, reference: &str, text: &str, credits: f64) {
        let db = fixture.service.store().connection();
        let result = assessment_result::Model::create(
            db,
            fixture.submissions[index].id,
            AssessmentType::Manual,
            0.0,
        )
        .await
        .unwrap();
        feedback::Model::create(
            db,
            result.id,
            &NewFeedback {
                reference: reference.to_string(),
                text: Some(text.to_string()),
                detail_text: None,
                credits,
                grading_instruction_id: None,
                feedback_type: FeedbackType::Manual,
            },
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_total_score() {
        assert_eq!(total_score(2.0, 10.0), 20.0);
        assert_eq!(total_score(15.0, 10.0), 100.0);
        assert_eq!(total_score(-3.0, 10.0), 0.0);
        assert_eq!(total_score(1.0, 3.0), 33.33);
        assert_eq!(total_score(5.0, 0.0), 0.0);
    }

    #[tokio::test]
    async fn test_login_elements_cluster_and_logout_does_not() {
        let fx = fixture(&[("a", "Login"), ("b", "Login"), ("c", "Logout")]).await;

        let outcome = fx.service.build(&fx.exercise).await.unwrap();
        assert_eq!(
            outcome,
            BuildOutcome::Built {
                clusters: 2,
                elements: 3
            }
        );

        let store = fx.service.store();
        let a = store.elements_of_submission(fx.submissions[0].id).await.unwrap();
        let b = store.elements_of_submission(fx.submissions[1].id).await.unwrap();
        let c = store.elements_of_submission(fx.submissions[2].id).await.unwrap();
        assert_eq!(a[0].cluster_id, b[0].cluster_id);
        assert_ne!(a[0].cluster_id, c[0].cluster_id);
    }

    #[tokio::test]
    async fn test_rebuild_leaves_clusters_unchanged() {
        let fx = fixture(&[("a", "Login"), ("b", "Login"), ("c", "Logout")]).await;
        fx.service.build(&fx.exercise).await.unwrap();

        let db = fx.service.store().connection();
        let clusters_before = model_cluster::Entity::find().all(db).await.unwrap();
        let elements_before = model_element::Entity::find().all(db).await.unwrap();

        assert_eq!(fx.service.build(&fx.exercise).await.unwrap(), BuildOutcome::AlreadyBuilt);

        assert_eq!(model_cluster::Entity::find().all(db).await.unwrap(), clusters_before);
        assert_eq!(model_element::Entity::find().all(db).await.unwrap(), elements_before);
    }

    #[tokio::test]
    async fn test_concurrent_builds_persist_once() {
        let fx = fixture(&[("a", "Login"), ("b", "Login")]).await;
        let (first, second) = tokio::join!(fx.service.build(&fx.exercise), fx.service.build(&fx.exercise));

        let mut outcomes = vec![first.unwrap(), second.unwrap()];
        outcomes.sort_by_key(|o| matches!(o, BuildOutcome::AlreadyBuilt));
        assert_eq!(
            outcomes,
            vec![
                BuildOutcome::Built {
                    clusters: 1,
                    elements: 2
                },
                BuildOutcome::AlreadyBuilt
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_then_rebuild() {
        let fx = fixture(&[("a", "Login"), ("b", "Logout")]).await;
        fx.service.build(&fx.exercise).await.unwrap();
        assert_eq!(fx.service.delete_clusters(fx.exercise.id).await.unwrap(), 2);
        assert!(matches!(
            fx.service.build(&fx.exercise).await.unwrap(),
            BuildOutcome::Built { clusters: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_rebuild_replaces_clusters_under_one_lock() {
        let fx = fixture(&[("a", "Login"), ("b", "Logout")]).await;
        fx.service.build(&fx.exercise).await.unwrap();

        let (rebuilt, built) = tokio::join!(fx.service.rebuild(&fx.exercise), fx.service.build(&fx.exercise));
        assert!(matches!(rebuilt.unwrap(), BuildOutcome::Built { clusters: 2, .. }));
        assert!(matches!(
            built.unwrap(),
            BuildOutcome::AlreadyBuilt | BuildOutcome::Built { clusters: 2, .. }
        ));

        let statistics = fx.service.cluster_statistics(fx.exercise.id).await.unwrap();
        assert_eq!(statistics.clusters, 2);
        assert_eq!(statistics.elements, 2);
    }

    #[tokio::test]
    async fn test_feedback_propagates_to_cluster_mate() {
        let fx = fixture(&[("a", "Login"), ("b", "Login")]).await;
        fx.service.build(&fx.exercise).await.unwrap();
        assess_manually(&fx, 0, "Class:a", "missing validation", 2.0).await;

        let suggested = fx
            .service
            .get_suggestion_result(&fx.submissions[1], &fx.exercise)
            .await
            .unwrap()
            .expect("cluster-mate feedback should be suggested");

        assert_eq!(suggested.result.assessment_type, AssessmentType::SemiAutomatic);
        assert_eq!(suggested.result.submission_id, fx.submissions[1].id);
        assert_eq!(suggested.result.score, 20.0);
        assert_eq!(suggested.feedback.len(), 1);
        assert_eq!(suggested.feedback[0].reference, "Class:b");
        assert_eq!(suggested.feedback[0].text.as_deref(), Some("missing validation"));
        assert_eq!(suggested.feedback[0].feedback_type, FeedbackType::Automatic);

        // a second call reuses the result
        let again = fx
            .service
            .get_suggestion_result(&fx.submissions[1], &fx.exercise)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.result.id, suggested.result.id);
        assert_eq!(again.feedback.len(), 1);
    }

    #[tokio::test]
    async fn test_manual_result_is_never_replaced() {
        let fx = fixture(&[("a", "Login"), ("b", "Login")]).await;
        fx.service.build(&fx.exercise).await.unwrap();
        assess_manually(&fx, 0, "Class:a", "missing validation", 2.0).await;
        assess_manually(&fx, 1, "Class:b", "fine", 5.0).await;

        assert!(fx
            .service
            .get_suggestion_result(&fx.submissions[1], &fx.exercise)
            .await
            .unwrap()
            .is_none());

        let db = fx.service.store().connection();
        let kept = assessment_result::Model::find_by_submission(db, fx.submissions[1].id)
            .await
            .unwrap()
            .unwrap();
        assert!(kept.is_manual());
        let feedback = feedback::Model::find_by_result(db, kept.id).await.unwrap();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].text.as_deref(), Some("fine"));
    }

    #[tokio::test]
    async fn test_no_feedback_in_cluster_means_no_result() {
        let fx = fixture(&[("a", "Login"), ("c", "Logout")]).await;
        fx.service.build(&fx.exercise).await.unwrap();
        assess_manually(&fx, 0, "Class:a", "missing validation", 2.0).await;

        assert!(fx
            .service
            .get_suggestion_result(&fx.submissions[1], &fx.exercise)
            .await
            .unwrap()
            .is_none());
        assert!(fx
            .service
            .store()
            .result_of_submission(fx.submissions[1].id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unparsable_submissions_are_skipped() {
        let fx = fixture(&[("a", "Login")]).await;
        let db = fx.service.store().connection();
        let broken = modeling_submission::Model::create(db, fx.exercise.id, Some("not json"), true)
            .await
            .unwrap();
        modeling_submission::Model::create(db, fx.exercise.id, None, true)
            .await
            .unwrap();

        assert_eq!(
            fx.service.build(&fx.exercise).await.unwrap(),
            BuildOutcome::Built {
                clusters: 1,
                elements: 1
            }
        );
        assert!(fx
            .service
            .get_suggestion_result(&broken, &fx.exercise)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_submissions_with_duplicate_ids_are_skipped() {
        let fx = fixture(&[("a", "Login")]).await;
        let db = fx.service.store().connection();

        let twice = json!({
            "type": "ClassDiagram",
            "elements": [
                { "id": "x", "name": "Login", "type": "Class", "attributes": [], "methods": [] },
                { "id": "x", "name": "Logout", "type": "Class", "attributes": [], "methods": [] }
            ],
            "relationships": []
        })
        .to_string();
        let shared_attribute = json!({
            "type": "ClassDiagram",
            "elements": [
                { "id": "c1", "name": "Login", "type": "Class", "attributes": ["attr"], "methods": [] },
                { "id": "c2", "name": "Session", "type": "Class", "attributes": ["attr"], "methods": [] },
                { "id": "attr", "name": "user: String", "type": "ClassAttribute", "owner": "c1" }
            ],
            "relationships": []
        })
        .to_string();
        for model in [twice, shared_attribute] {
            modeling_submission::Model::create(db, fx.exercise.id, Some(model.as_str()), true)
                .await
                .unwrap();
        }

        assert_eq!(
            fx.service.build(&fx.exercise).await.unwrap(),
            BuildOutcome::Built {
                clusters: 1,
                elements: 1
            }
        );
    }

    #[tokio::test]
    async fn test_compare_submissions() {
        let fx = fixture(&[("a", "Login"), ("b", "Login"), ("c", "Logout")]).await;
        let db = fx.service.store().connection();
        let broken = modeling_submission::Model::create(db, fx.exercise.id, Some("not json"), true)
            .await
            .unwrap();

        let same = fx
            .service
            .compare_submissions(&fx.submissions[0], &fx.submissions[1], 0.0)
            .unwrap();
        assert!(same.is_some_and(|s| (s - 1.0).abs() < 1e-9));

        // 0.7 * name similarity of "Login" and "Logout" plus the equal class type
        let different = fx
            .service
            .compare_submissions(&fx.submissions[0], &fx.submissions[2], 0.0)
            .unwrap()
            .unwrap();
        assert!((different - 0.65).abs() < 1e-9);
        assert_eq!(
            fx.service
                .compare_submissions(&fx.submissions[0], &fx.submissions[2], 0.8)
                .unwrap(),
            Some(0.0)
        );

        assert_eq!(
            fx.service
                .compare_submissions(&fx.submissions[0], &broken, 0.0)
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_unsupported_exercises_do_nothing() {
        let fx = fixture(&[("a", "Login")]).await;

        let mut team_manual = fx.exercise.clone();
        team_manual.team_mode = true;
        team_manual.assessment_type = AssessmentType::Manual;
        assert!(!fx.service.is_supported(&team_manual));
        assert_eq!(fx.service.build(&team_manual).await.unwrap(), BuildOutcome::Unsupported);

        let mut team_semi = team_manual.clone();
        team_semi.assessment_type = AssessmentType::SemiAutomatic;
        assert!(fx.service.is_supported(&team_semi));

        let mut bpmn = fx.exercise.clone();
        bpmn.diagram_type = DiagramType::Bpmn;
        assert!(fx.service.is_supported(&bpmn));

        assert!(!fx.service.store().has_clusters(fx.exercise.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_cluster_is_an_integrity_error() {
        let fx = fixture(&[("a", "Login"), ("c", "Logout")]).await;
        fx.service.build(&fx.exercise).await.unwrap();

        let db = fx.service.store().connection();
        let orphan = fx
            .service
            .store()
            .elements_of_submission(fx.submissions[1].id)
            .await
            .unwrap()
            .remove(0);
        db.execute_unprepared("PRAGMA foreign_keys = OFF").await.unwrap();
        model_cluster::Entity::delete_by_id(orphan.cluster_id)
            .exec(db)
            .await
            .unwrap();

        let err = fx
            .service
            .get_suggestion_result(&fx.submissions[1], &fx.exercise)
            .await
            .unwrap_err();
        assert!(matches!(err, CompassError::ClusterIntegrity(_)));
    }

    #[tokio::test]
    async fn test_statistics_and_custom_selector() {
        let fx = fixture(&[("a", "Login"), ("b", "Login"), ("c", "Login")]).await;
        fx.service.build(&fx.exercise).await.unwrap();
        assess_manually(&fx, 0, "Class:a", "good", 1.0).await;
        assess_manually(&fx, 1, "Class:b", "wrong name", 0.0).await;

        let statistics = fx.service.cluster_statistics(fx.exercise.id).await.unwrap();
        assert_eq!(statistics.clusters, 1);
        assert_eq!(statistics.elements, 3);
        assert_eq!(statistics.clusters_with_feedback, 1);
        assert_eq!(statistics.elements_by_type.get("Class"), Some(&3));

        let Fixture {
            service,
            exercise,
            submissions,
        } = fx;
        let strict = service.with_selector(Unanimous);
        assert!(strict
            .get_suggestion_result(&submissions[2], &exercise)
            .await
            .unwrap()
            .is_none());
    }
}
