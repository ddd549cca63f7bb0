//! Database schema for Yatube, derived from the SeaORM entities.

pub use sea_orm_migration::prelude::*;

mod m20210704_000001_create_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20210704_000001_create_tables::Migration)]
    }
}
