use crate::entities::{categories, prelude::*, system_settings};
use crate::constants::settings::{BAN_SCREEN_KEY, DEFAULT_BAN_SCREEN};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("General Discussion", "general", "Talk about anything"),
    ("Help & Support", "help", "Ask questions and get help"),
    ("Showcase", "showcase", "Show off your projects"),
    ("Tutorials", "tutorials", "Guides and how-tos"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(Categories)
            .columns([
                categories::Column::Name,
                categories::Column::Slug,
                categories::Column::Description,
            ])
            .on_conflict(
                OnConflict::column(categories::Column::Slug)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        for (name, slug, description) in DEFAULT_CATEGORIES {
            insert.values_panic([(*name).into(), (*slug).into(), (*description).into()]);
        }

        manager.exec_stmt(insert).await?;

        let now = chrono::Utc::now().to_rfc3339();
        let setting = Query::insert()
            .into_table(SystemSettings)
            .columns([
                system_settings::Column::Key,
                system_settings::Column::Value,
                system_settings::Column::UpdatedAt,
            ])
            .values_panic([BAN_SCREEN_KEY.into(), DEFAULT_BAN_SCREEN.into(), now.into()])
            .on_conflict(
                OnConflict::column(system_settings::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        manager.exec_stmt(setting).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let slugs: Vec<&str> = DEFAULT_CATEGORIES.iter().map(|(_, slug, _)| *slug).collect();
        let delete = Query::delete()
            .from_table(Categories)
            .and_where(Expr::col(categories::Column::Slug).is_in(slugs))
            .to_owned();
        manager.exec_stmt(delete).await?;

        let delete = Query::delete()
            .from_table(SystemSettings)
            .and_where(Expr::col(system_settings::Column::Key).eq(BAN_SCREEN_KEY))
            .to_owned();
        manager.exec_stmt(delete).await?;

        Ok(())
    }
}
