use sea_orm_migration::prelude::*;

mod m20260301_initial;
mod m20260302_seed_defaults;
mod m20260305_add_listing_indexes;
mod m20260310_add_work_comments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_initial::Migration),
            Box::new(m20260302_seed_defaults::Migration),
            Box::new(m20260305_add_listing_indexes::Migration),
            Box::new(m20260310_add_work_comments::Migration),
        ]
    }
}
