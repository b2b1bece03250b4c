//! Clusters of equivalent diagram elements across all submissions of one exercise.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryOrder};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "model_clusters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning exercise. Clusters are never shared between exercises.
    pub exercise_id: i64,

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
    #[sea_orm(has_many = "super::model_element::Entity")]
    Elements,
}

impl Related<super::modeling_exercise::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exercise.def()
    }
}

impl Related<super::model_element::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Elements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(db: &C, exercise_id: i64) -> Result<Self, DbErr> {
        ActiveModel {
            exercise_id: Set(exercise_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn count_for_exercise<C: ConnectionTrait>(db: &C, exercise_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ExerciseId.eq(exercise_id))
            .count(db)
            .await
    }

    /// Clusters of an exercise in creation order.
    pub async fn find_for_exercise<C: ConnectionTrait>(
        db: &C,
        exercise_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::ExerciseId.eq(exercise_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn find_by_ids<C: ConnectionTrait>(db: &C, ids: &[i64]) -> Result<Vec<Self>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Removes every cluster of an exercise; member elements go with them (cascade).
    pub async fn delete_for_exercise<C: ConnectionTrait>(db: &C, exercise_id: i64) -> Result<u64, DbErr> {
        let ids: Vec<i64> = Self::find_for_exercise(db, exercise_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        super::model_element::Entity::delete_many()
            .filter(super::model_element::Column::ClusterId.is_in(ids.iter().copied()))
            .exec(db)
            .await?;

        let res = Entity::delete_many()
            .filter(Column::Id.is_in(ids))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }
}
