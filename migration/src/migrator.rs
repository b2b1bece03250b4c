use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202510010001_create_modeling_exercises::Migration),
            Box::new(migrations::m202510010002_create_modeling_submissions::Migration),
            Box::new(migrations::m202510010003_create_results::Migration),
            Box::new(migrations::m202510010004_create_feedback::Migration),
            Box::new(migrations::m202510010005_create_model_clusters::Migration),
            Box::new(migrations::m202510010006_create_model_elements::Migration),
        ]
    }
}
