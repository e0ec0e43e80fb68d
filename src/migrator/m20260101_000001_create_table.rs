use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Users Table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("USER"),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create Animals Table
        manager
            .create_table(
                Table::create()
                    .table(Animals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Animals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Animals::Name).string().not_null())
                    .col(ColumnDef::new(Animals::AnimalType).string().not_null())
                    .col(ColumnDef::new(Animals::BirthDate).date().not_null())
                    .col(ColumnDef::new(Animals::Size).string())
                    .col(ColumnDef::new(Animals::Gender).string())
                    .col(
                        ColumnDef::new(Animals::Vaccinated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Animals::Castrated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Animals::Dewormed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Animals::Microchip)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Animals::PublicationDate)
                            .date()
                            .not_null()
                            .default(Expr::current_date()),
                    )
                    .col(ColumnDef::new(Animals::AdditionalInformation).text())
                    .col(
                        ColumnDef::new(Animals::Status)
                            .string_len(20)
                            .not_null()
                            .default("NOT_ADOPTED"),
                    )
                    .col(
                        ColumnDef::new(Animals::IdentificationCode)
                            .string_len(16)
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Animals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Animals {
    Table,
    Id,
    Name,
    #[sea_orm(iden = "type")]
    AnimalType,
    BirthDate,
    Size,
    Gender,
    Vaccinated,
    Castrated,
    Dewormed,
    Microchip,
    PublicationDate,
    AdditionalInformation,
    Status,
    IdentificationCode,
}
