use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Testimonies Table
        manager
            .create_table(
                Table::create()
                    .table(Testimonies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Testimonies::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Testimonies::UserId).integer())
                    .col(ColumnDef::new(Testimonies::AnimalId).integer().not_null())
                    .col(ColumnDef::new(Testimonies::Description).text().not_null())
                    .col(
                        ColumnDef::new(Testimonies::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-testimonies-animal_id")
                            .from(Testimonies::Table, Testimonies::AnimalId)
                            .to(Animals::Table, Animals::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-testimonies-user_id")
                            .from(Testimonies::Table, Testimonies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create Adoption Requests Table
        manager
            .create_table(
                Table::create()
                    .table(AdoptionRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdoptionRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdoptionRequests::UserId).integer().not_null())
                    .col(ColumnDef::new(AdoptionRequests::AnimalId).integer().not_null())
                    .col(
                        ColumnDef::new(AdoptionRequests::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-adoption_requests-animal_id")
                            .from(AdoptionRequests::Table, AdoptionRequests::AnimalId)
                            .to(Animals::Table, Animals::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-adoption_requests-user_id")
                            .from(AdoptionRequests::Table, AdoptionRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_testimonies_animal_id")
                    .table(Testimonies::Table)
                    .col(Testimonies::AnimalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_adoption_requests_animal_id")
                    .table(AdoptionRequests::Table)
                    .col(AdoptionRequests::AnimalId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdoptionRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Testimonies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Testimonies {
    Table,
    Id,
    UserId,
    AnimalId,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AdoptionRequests {
    Table,
    Id,
    UserId,
    AnimalId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Animals {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
