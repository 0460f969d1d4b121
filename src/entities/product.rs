use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog product. Image URLs, media asset ids, category/related-product
/// references and tags are embedded JSON arrays.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Stock keeping unit, stored uppercase
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub short_description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub long_description: Option<String>,
    pub regular_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub status: ProductStatus,
    #[sea_orm(column_type = "Json")]
    pub images: Json,
    /// Opaque ids assigned by the media host, parallel to `images`
    #[sea_orm(column_type = "Json")]
    pub media_asset_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub category_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub related_product_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub tags: Json,
    pub delivery_info: Option<String>,
    pub returns_info: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub sales_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProductStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Out of Stock")]
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[sea_orm(string_value = "Discontinued")]
    Discontinued,
}
