//! Modeling exercises: the diagram type students draw and how submissions are assessed.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "modeling_exercises")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub title: String,

    /// Kind of diagram every submission of this exercise contains.
    pub diagram_type: DiagramType,

    /// Configured assessment mode of the exercise.
    pub assessment_type: AssessmentType,

    /// Whether submissions are made by teams rather than individual students.
    pub team_mode: bool,

    /// Upper bound for the score of a single result.
    pub max_points: f64,

    pub created_at: DateTime<Utc>,
}

/// Diagram types that can be drawn in a modeling exercise.
///
/// The string values match the `type` tag of the diagram JSON.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    sea_orm::strum::Display,
    sea_orm::strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum DiagramType {
    #[sea_orm(string_value = "ClassDiagram")]
    ClassDiagram,
    #[sea_orm(string_value = "ObjectDiagram")]
    ObjectDiagram,
    #[sea_orm(string_value = "ActivityDiagram")]
    ActivityDiagram,
    #[sea_orm(string_value = "UseCaseDiagram")]
    UseCaseDiagram,
    #[sea_orm(string_value = "CommunicationDiagram")]
    CommunicationDiagram,
    #[sea_orm(string_value = "ComponentDiagram")]
    ComponentDiagram,
    #[sea_orm(string_value = "DeploymentDiagram")]
    DeploymentDiagram,
    #[sea_orm(string_value = "PetriNet")]
    PetriNet,
    #[sea_orm(string_value = "SyntaxTree")]
    SyntaxTree,
    #[sea_orm(string_value = "Flowchart")]
    Flowchart,
    #[strum(serialize = "BPMN")]
    #[sea_orm(string_value = "BPMN")]
    Bpmn,
}

/// How a result (or an exercise) is assessed.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AssessmentType {
    /// Assessed by a human; terminal for results.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Suggested by the engine, pending human confirmation.
    #[sea_orm(string_value = "semi_automatic")]
    SemiAutomatic,
    #[sea_orm(string_value = "automatic")]
    Automatic,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::modeling_submission::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::model_cluster::Entity")]
    Clusters,
}

impl Related<super::modeling_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::model_cluster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clusters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        title: &str,
        diagram_type: DiagramType,
        assessment_type: AssessmentType,
        team_mode: bool,
        max_points: f64,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            title: Set(title.to_string()),
            diagram_type: Set(diagram_type),
            assessment_type: Set(assessment_type),
            team_mode: Set(team_mode),
            max_points: Set(max_points),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }
}
