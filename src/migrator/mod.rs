use sea_orm_migration::prelude::*;

mod m20260101_000001_create_table;
mod m20260110_000002_create_animal_images;
mod m20260123_000003_create_testimonies_and_adoptions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_table::Migration),
            Box::new(m20260110_000002_create_animal_images::Migration),
            Box::new(m20260123_000003_create_testimonies_and_adoptions::Migration),
        ]
    }
}
