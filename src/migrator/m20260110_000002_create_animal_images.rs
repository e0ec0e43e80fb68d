use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AnimalImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnimalImages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AnimalImages::ImageUrl).string().not_null())
                    .col(ColumnDef::new(AnimalImages::PublicId).string().not_null())
                    .col(ColumnDef::new(AnimalImages::AnimalId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-animal_images-animal_id")
                            .from(AnimalImages::Table, AnimalImages::AnimalId)
                            .to(Animals::Table, Animals::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_animal_images_animal_id")
                    .table(AnimalImages::Table)
                    .col(AnimalImages::AnimalId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnimalImages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AnimalImages {
    Table,
    Id,
    ImageUrl,
    PublicId,
    AnimalId,
}

#[derive(DeriveIden)]
enum Animals {
    Table,
    Id,
}
