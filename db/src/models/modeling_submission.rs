//! Modeling submissions and the raw diagram JSON they carry.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "modeling_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub exercise_id: i64,

    /// Diagram JSON as produced by the editor. `None` for empty (e.g. exam) submissions.
    pub model: Option<String>,

    /// Drafts are `false` and never take part in clustering.
    pub submitted: bool,

    pub submitted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::modeling_exercise::Entity",
        from = "Column::ExerciseId",
        to = "super::modeling_exercise::Column::Id",
        on_delete = "Cascade"
    )]
    Exercise,
    #[sea_orm(has_one = "super::assessment_result::Entity")]
    AssessmentResult,
}

impl Related<super::modeling_exercise::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exercise.def()
    }
}

impl Related<super::assessment_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssessmentResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts a submission. `submitted_at` is stamped when `submitted` is true.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        exercise_id: i64,
        model: Option<&str>,
        submitted: bool,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            exercise_id: Set(exercise_id),
            model: Set(model.map(str::to_string)),
            submitted: Set(submitted),
            submitted_at: Set(submitted.then_some(now)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// All submitted (non-draft) submissions of an exercise, ordered by id.
    pub async fn find_submitted_for_exercise<C: ConnectionTrait>(
        db: &C,
        exercise_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::ExerciseId.eq(exercise_id))
            .filter(Column::Submitted.eq(true))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
