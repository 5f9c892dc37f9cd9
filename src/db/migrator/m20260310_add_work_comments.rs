use crate::entities::{prelude::*, work_comments};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(
                schema
                    .create_table_from_entity(WorkComments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WorkCommentLikes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_work_comments_work_id")
                    .table(WorkComments)
                    .col(work_comments::Column::WorkId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_work_comments_work_id")
                    .table(WorkComments)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(WorkCommentLikes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkComments).to_owned())
            .await?;

        Ok(())
    }
}
