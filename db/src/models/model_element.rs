//! Persisted projection of a clustered diagram element.

use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "model_elements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub cluster_id: i64,

    pub submission_id: i64,

    /// Element id as it appears in the submission's diagram JSON.
    pub model_element_id: String,

    /// Element type tag, e.g. `Class` or `UseCaseAssociation`.
    pub model_element_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::model_cluster::Entity",
        from = "Column::ClusterId",
        to = "super::model_cluster::Column::Id",
        on_delete = "Cascade"
    )]
    Cluster,
    #[sea_orm(
        belongs_to = "super::modeling_submission::Entity",
        from = "Column::SubmissionId",
        to = "super::modeling_submission::Column::Id",
        on_delete = "Cascade"
    )]
    Submission,
}

impl Related<super::model_cluster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cluster.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `"{type}:{id}"`, the key feedback uses to point at this element.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.model_element_type, self.model_element_id)
    }

    pub fn active(
        cluster_id: i64,
        submission_id: i64,
        model_element_id: &str,
        model_element_type: &str,
    ) -> ActiveModel {
        ActiveModel {
            cluster_id: Set(cluster_id),
            submission_id: Set(submission_id),
            model_element_id: Set(model_element_id.to_string()),
            model_element_type: Set(model_element_type.to_string()),
            ..Default::default()
        }
    }

    /// Bulk insert. A no-op for an empty batch.
    pub async fn insert_batch<C: ConnectionTrait>(db: &C, batch: Vec<ActiveModel>) -> Result<(), DbErr> {
        if batch.is_empty() {
            return Ok(());
        }
        Entity::insert_many(batch).exec(db).await?;
        Ok(())
    }

    pub async fn find_by_submission<C: ConnectionTrait>(
        db: &C,
        submission_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn find_by_clusters<C: ConnectionTrait>(
        db: &C,
        cluster_ids: &[i64],
    ) -> Result<Vec<Self>, DbErr> {
        if cluster_ids.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::ClusterId.is_in(cluster_ids.iter().copied()))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }
}
