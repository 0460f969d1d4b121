use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250601_000002_create_products_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Products::Sku)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Products::ShortDescription)
                            .string_len(500)
                            .null(),
                    )
                    .col(ColumnDef::new(Products::LongDescription).text().null())
                    .col(
                        ColumnDef::new(Products::RegularPrice)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::DiscountedPrice)
                            .decimal_len(16, 4)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Products::StockQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::Status)
                            .string_len(20)
                            .not_null()
                            .default("Draft"),
                    )
                    .col(ColumnDef::new(Products::Images).json().not_null())
                    .col(ColumnDef::new(Products::MediaAssetIds).json().not_null())
                    .col(ColumnDef::new(Products::CategoryIds).json().not_null())
                    .col(
                        ColumnDef::new(Products::RelatedProductIds)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::Tags).json().not_null())
                    .col(ColumnDef::new(Products::DeliveryInfo).text().null())
                    .col(ColumnDef::new(Products::ReturnsInfo).text().null())
                    .col(ColumnDef::new(Products::SeoTitle).string_len(255).null())
                    .col(
                        ColumnDef::new(Products::SeoDescription)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Products::SalesCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_status")
                    .table(Products::Table)
                    .col(Products::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_created")
                    .table(Products::Table)
                    .col((Products::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    Sku,
    Name,
    ShortDescription,
    LongDescription,
    RegularPrice,
    DiscountedPrice,
    StockQuantity,
    Status,
    Images,
    MediaAssetIds,
    CategoryIds,
    RelatedProductIds,
    Tags,
    DeliveryInfo,
    ReturnsInfo,
    SeoTitle,
    SeoDescription,
    SalesCount,
    CreatedAt,
    UpdatedAt,
}
