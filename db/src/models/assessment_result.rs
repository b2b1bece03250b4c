//! Assessment results of modeling submissions.
//!
//! A result is created empty, then populated either by a human assessor or by the
//! suggestion engine. Once a result is `Manual` it is never touched again by the engine.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

pub use super::modeling_exercise::AssessmentType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// One result per submission.
    #[sea_orm(unique)]
    pub submission_id: i64,

    pub assessment_type: AssessmentType,

    /// Percentage of the exercise's max points, rounded to two decimals.
    pub score: f64,

    pub successful: bool,

    pub completion_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::modeling_submission::Entity",
        from = "Column::SubmissionId",
        to = "super::modeling_submission::Column::Id",
        on_delete = "Cascade"
    )]
    Submission,
    #[sea_orm(has_many = "super::feedback::Entity")]
    Feedback,
}

impl Related<super::modeling_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        submission_id: i64,
        assessment_type: AssessmentType,
        score: f64,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            submission_id: Set(submission_id),
            assessment_type: Set(assessment_type),
            score: Set(score),
            successful: Set(score >= 100.0),
            completion_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_submission<C: ConnectionTrait>(
        db: &C,
        submission_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .one(db)
            .await
    }

    /// Updates assessment type and score, keeping the row id.
    pub async fn update_assessment<C: ConnectionTrait>(
        self,
        db: &C,
        assessment_type: AssessmentType,
        score: f64,
    ) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.into();
        active.assessment_type = Set(assessment_type);
        active.score = Set(score);
        active.successful = Set(score >= 100.0);
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    /// Finalizes the result as a human assessment.
    pub async fn complete_manually<C: ConnectionTrait>(self, db: &C) -> Result<Self, DbErr> {
        let mut active: ActiveModel = self.into();
        active.assessment_type = Set(AssessmentType::Manual);
        active.completion_date = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    pub fn is_manual(&self) -> bool {
        self.assessment_type == AssessmentType::Manual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{modeling_exercise, modeling_submission};
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_result_lifecycle() {
        let db = setup_test_db().await;
        let exercise = modeling_exercise::Model::create(
            &db,
            "Components",
            modeling_exercise::DiagramType::ComponentDiagram,
            AssessmentType::SemiAutomatic,
            false,
            5.0,
        )
        .await
        .unwrap();
        let submission = modeling_submission::Model::create(&db, exercise.id, Some("{}"), true)
            .await
            .unwrap();

        assert!(Model::find_by_submission(&db, submission.id).await.unwrap().is_none());

        let created = Model::create(&db, submission.id, AssessmentType::SemiAutomatic, 40.0)
            .await
            .unwrap();
        assert!(!created.is_manual());
        assert!(!created.successful);

        let updated = created
            .update_assessment(&db, AssessmentType::SemiAutomatic, 100.0)
            .await
            .unwrap();
        assert!(updated.successful);

        let finalized = updated.complete_manually(&db).await.unwrap();
        assert!(finalized.is_manual());
        assert!(finalized.completion_date.is_some());

        let found = Model::find_by_submission(&db, submission.id).await.unwrap().unwrap();
        assert_eq!(found.id, finalized.id);
        assert_eq!(found.assessment_type, AssessmentType::Manual);
    }
}
