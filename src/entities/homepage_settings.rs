use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Homepage content. Exactly one row has `is_active = true`; the upsert in
/// the homepage service enforces this inside a transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "homepage_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub site_name: String,
    pub logo: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub hero_slides: Json,
    #[sea_orm(column_type = "Json")]
    pub nav_links: Json,
    #[sea_orm(column_type = "Json")]
    pub featured_product_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub grid_product_ids: Json,
    pub updated_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
