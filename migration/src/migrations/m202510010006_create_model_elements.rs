use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510010006_create_model_elements"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("model_elements"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("cluster_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("submission_id")).big_integer().not_null())
                    .col(ColumnDef::new(Alias::new("model_element_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("model_element_type")).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_model_elements_cluster")
                            .from(Alias::new("model_elements"), Alias::new("cluster_id"))
                            .to(Alias::new("model_clusters"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_model_elements_submission")
                            .from(Alias::new("model_elements"), Alias::new("submission_id"))
                            .to(Alias::new("modeling_submissions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_model_elements_submission_element")
                    .table(Alias::new("model_elements"))
                    .col(Alias::new("submission_id"))
                    .col(Alias::new("model_element_id"))
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_model_elements_cluster")
                    .table(Alias::new("model_elements"))
                    .col(Alias::new("cluster_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("model_elements")).to_owned())
            .await
    }
}
