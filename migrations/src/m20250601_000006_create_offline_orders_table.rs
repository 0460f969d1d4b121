use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250601_000006_create_offline_orders_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OfflineOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OfflineOrders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OfflineOrders::Customer).json().not_null())
                    .col(ColumnDef::new(OfflineOrders::Items).json().not_null())
                    .col(
                        ColumnDef::new(OfflineOrders::ShippingAddress)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OfflineOrders::DeliveryAddress)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OfflineOrders::Payment).json().not_null())
                    .col(ColumnDef::new(OfflineOrders::Amounts).json().not_null())
                    .col(
                        ColumnDef::new(OfflineOrders::Status)
                            .string_len(20)
                            .not_null()
                            .default("created"),
                    )
                    .col(ColumnDef::new(OfflineOrders::Notes).text().null())
                    .col(
                        ColumnDef::new(OfflineOrders::CreatedBy)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OfflineOrders::Source)
                            .string_len(32)
                            .not_null()
                            .default("offline"),
                    )
                    .col(
                        ColumnDef::new(OfflineOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OfflineOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offline_orders_created")
                    .table(OfflineOrders::Table)
                    .col((OfflineOrders::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OfflineOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OfflineOrders {
    Table,
    Id,
    Customer,
    Items,
    ShippingAddress,
    DeliveryAddress,
    Payment,
    Amounts,
    Status,
    Notes,
    CreatedBy,
    Source,
    CreatedAt,
    UpdatedAt,
}
