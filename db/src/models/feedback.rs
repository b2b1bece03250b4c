//! Feedback attached to a single diagram element of a submission.
//!
//! The `reference` column has the form `"{elementType}:{elementId}"`, where the element
//! id is only unique within its submission. Lookups across submissions therefore always
//! pair the reference with the submission the owning result belongs to.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub result_id: i64,

    /// Element reference, `"{elementType}:{elementId}"`.
    pub reference: String,

    pub text: Option<String>,

    pub detail_text: Option<String>,

    pub credits: f64,

    pub grading_instruction_id: Option<i64>,

    pub feedback_type: FeedbackType,

    pub created_at: DateTime<Utc>,
}

/// Who authored a feedback item.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    sea_orm::strum::Display,
    sea_orm::strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FeedbackType {
    /// Written by a tutor.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Propagated by the suggestion engine.
    #[sea_orm(string_value = "automatic")]
    Automatic,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assessment_result::Entity",
        from = "Column::ResultId",
        to = "super::assessment_result::Column::Id",
        on_delete = "Cascade"
    )]
    AssessmentResult,
}

impl Related<super::assessment_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssessmentResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Values of a feedback row that is about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub reference: String,
    pub text: Option<String>,
    pub detail_text: Option<String>,
    pub credits: f64,
    pub grading_instruction_id: Option<i64>,
    pub feedback_type: FeedbackType,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        result_id: i64,
        feedback: &NewFeedback,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            result_id: Set(result_id),
            reference: Set(feedback.reference.clone()),
            text: Set(feedback.text.clone()),
            detail_text: Set(feedback.detail_text.clone()),
            credits: Set(feedback.credits),
            grading_instruction_id: Set(feedback.grading_instruction_id),
            feedback_type: Set(feedback.feedback_type),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_result<C: ConnectionTrait>(
        db: &C,
        result_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::ResultId.eq(result_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn delete_by_result<C: ConnectionTrait>(db: &C, result_id: i64) -> Result<u64, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::ResultId.eq(result_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Manual feedback on any of `references` within results of `submission_ids`,
    /// paired with the submission it was given on and ordered by feedback id.
    ///
    /// The filter is a superset of the exact `(submission, reference)` pairs; callers
    /// narrow it down to the pairs they actually asked for.
    pub async fn find_manual_for_elements<C: ConnectionTrait>(
        db: &C,
        submission_ids: &[i64],
        references: &[String],
    ) -> Result<Vec<(i64, Self)>, DbErr> {
        if submission_ids.is_empty() || references.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Entity::find()
            .find_also_related(super::assessment_result::Entity)
            .filter(Column::FeedbackType.eq(FeedbackType::Manual))
            .filter(Column::Reference.is_in(references.iter().cloned()))
            .filter(super::assessment_result::Column::SubmissionId.is_in(submission_ids.iter().copied()))
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(feedback, result)| result.map(|r| (r.submission_id, feedback)))
            .collect())
    }
}
