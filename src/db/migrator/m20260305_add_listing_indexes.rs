use crate::entities::{comments, notifications, posts, prelude::*, works};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_posts_created_at")
                    .table(Posts)
                    .col(posts::Column::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_works_created_at")
                    .table(Works)
                    .col(works::Column::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_id")
                    .table(Comments)
                    .col(comments::Column::PostId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_recipient")
                    .table(Notifications)
                    .col(notifications::Column::RecipientId)
                    .col(notifications::Column::CreatedAt)
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
                    .name("idx_notifications_recipient")
                    .table(Notifications)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_comments_post_id")
                    .table(Comments)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_works_created_at").table(Works).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_posts_created_at").table(Posts).to_owned())
            .await?;

        Ok(())
    }
}
