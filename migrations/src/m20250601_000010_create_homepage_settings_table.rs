use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250601_000010_create_homepage_settings_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HomepageSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HomepageSettings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HomepageSettings::SiteName)
                            .string_len(120)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomepageSettings::Logo)
                            .string_len(1024)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(HomepageSettings::HeroSlides)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HomepageSettings::NavLinks).json().not_null())
                    .col(
                        ColumnDef::new(HomepageSettings::FeaturedProductIds)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomepageSettings::GridProductIds)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HomepageSettings::UpdatedBy).uuid().null())
                    .col(
                        ColumnDef::new(HomepageSettings::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(HomepageSettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HomepageSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HomepageSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum HomepageSettings {
    Table,
    Id,
    SiteName,
    Logo,
    HeroSlides,
    NavLinks,
    FeaturedProductIds,
    GridProductIds,
    UpdatedBy,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
