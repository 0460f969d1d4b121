use crate::{
    clients::{MediaAsset, MediaClient},
    entities::product::{self, ProductStatus},
    entities::{Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{json_strings, strings_json, uuids_json};

pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Effective selling price: the discounted price when it undercuts the
/// regular price, else the regular price.
pub fn current_price(regular: Decimal, discounted: Option<Decimal>) -> Decimal {
    match discounted {
        Some(d) if d < regular => d,
        _ => regular,
    }
}

/// Rounded percentage saved against the regular price; 0 when there is no
/// valid discount or the regular price is zero.
pub fn discount_percentage(regular: Decimal, discounted: Option<Decimal>) -> i32 {
    match discounted {
        Some(d) if d < regular && !regular.is_zero() => {
            let pct = (regular - d) / regular * Decimal::from(100);
            pct.round().to_i32().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Human-readable stock label derived from the on-hand quantity.
pub fn stock_status(stock_quantity: i32) -> &'static str {
    if stock_quantity <= 0 {
        "Out of Stock"
    } else if stock_quantity <= LOW_STOCK_THRESHOLD {
        "Low Stock"
    } else {
        "In Stock"
    }
}

/// Status after a stock change: zero stock forces `OutOfStock`, and a
/// restock flips an `OutOfStock` product back to `Active`. Other statuses
/// are left alone.
pub fn status_for_stock(stock_quantity: i32, current: ProductStatus) -> ProductStatus {
    if stock_quantity <= 0 && current == ProductStatus::Active {
        ProductStatus::OutOfStock
    } else if stock_quantity > 0 && current == ProductStatus::OutOfStock {
        ProductStatus::Active
    } else {
        current
    }
}

fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub name: String,
    pub sku: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub regular_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub status: Option<ProductStatus>,
    /// Inline payloads or pass-through URLs; at least one required
    pub images: Vec<String>,
    pub category_ids: Vec<Uuid>,
    pub related_product_ids: Vec<Uuid>,
    pub tags: Vec<String>,
    pub delivery_info: Option<String>,
    pub returns_info: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub regular_price: Option<Decimal>,
    pub discounted_price: Option<Option<Decimal>>,
    pub stock_quantity: Option<i32>,
    pub status: Option<ProductStatus>,
    pub images: Option<Vec<String>>,
    pub category_ids: Option<Vec<Uuid>>,
    pub related_product_ids: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub delivery_info: Option<String>,
    pub returns_info: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    pub category_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct ProductPage {
    pub products: Vec<ProductModel>,
    pub total: u64,
}

/// Catalog service: product CRUD, listing, search and the stock/status
/// coupling. Image persistence goes through the media host.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    media: Arc<MediaClient>,
}

impl ProductCatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        media: Arc<MediaClient>,
    ) -> Self {
        Self {
            db,
            event_sender,
            media,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let sku = normalize_sku(&input.sku);
        self.ensure_unique_sku(&sku, None).await?;

        if let Some(discounted) = input.discounted_price {
            if discounted >= input.regular_price {
                return Err(ServiceError::ValidationError(
                    "Discounted price must be less than the regular price".into(),
                ));
            }
        }
        if input.images.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one product image is required".into(),
            ));
        }

        let mut image_urls = Vec::with_capacity(input.images.len());
        let mut asset_ids = Vec::with_capacity(input.images.len());
        for (index, image) in input.images.iter().enumerate() {
            let hint = format!("product_{}_{}", sku, index);
            let asset = self.media.store_image(image, "products", Some(&hint)).await?;
            image_urls.push(asset.url);
            asset_ids.push(asset.asset_id);
        }

        let product_id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or(ProductStatus::Draft);
        let status = status_for_stock(input.stock_quantity, status);

        let active = product::ActiveModel {
            id: Set(product_id),
            sku: Set(sku),
            name: Set(input.name),
            short_description: Set(input.short_description),
            long_description: Set(input.long_description),
            regular_price: Set(input.regular_price),
            discounted_price: Set(input.discounted_price),
            stock_quantity: Set(input.stock_quantity),
            status: Set(status),
            images: Set(strings_json(&image_urls)),
            media_asset_ids: Set(strings_json(&asset_ids)),
            category_ids: Set(uuids_json(&input.category_ids)),
            related_product_ids: Set(uuids_json(&input.related_product_ids)),
            tags: Set(strings_json(&input.tags)),
            delivery_info: Set(input.delivery_info),
            returns_info: Set(input.returns_info),
            seo_title: Set(input.seo_title),
            seo_description: Set(input.seo_description),
            sales_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product {}", product_id);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let existing = self.get_product(product_id).await?;

        let sku = match input.sku {
            Some(raw) => {
                let sku = normalize_sku(&raw);
                self.ensure_unique_sku(&sku, Some(product_id)).await?;
                Some(sku)
            }
            None => None,
        };

        let regular = input.regular_price.unwrap_or(existing.regular_price);
        let discounted = match input.discounted_price {
            Some(value) => value,
            None => existing.discounted_price,
        };
        if let Some(d) = discounted {
            if d >= regular {
                return Err(ServiceError::ValidationError(
                    "Discounted price must be less than the regular price".into(),
                ));
            }
        }

        // Re-point images through the media host, dropping assets the
        // update no longer references.
        let media_update = match &input.images {
            Some(images) => Some(self.reconcile_images(&existing, images).await?),
            None => None,
        };

        let mut active: product::ActiveModel = existing.clone().into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(sku) = sku {
            active.sku = Set(sku);
        }
        if let Some(short) = input.short_description {
            active.short_description = Set(Some(short));
        }
        if let Some(long) = input.long_description {
            active.long_description = Set(Some(long));
        }
        if let Some(price) = input.regular_price {
            active.regular_price = Set(price);
        }
        if input.discounted_price.is_some() {
            active.discounted_price = Set(discounted);
        }
        if let Some((urls, ids)) = media_update {
            active.images = Set(strings_json(&urls));
            active.media_asset_ids = Set(strings_json(&ids));
        }
        if let Some(ids) = input.category_ids {
            active.category_ids = Set(uuids_json(&ids));
        }
        if let Some(ids) = input.related_product_ids {
            active.related_product_ids = Set(uuids_json(&ids));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(strings_json(&tags));
        }
        if let Some(delivery) = input.delivery_info {
            active.delivery_info = Set(Some(delivery));
        }
        if let Some(returns) = input.returns_info {
            active.returns_info = Set(Some(returns));
        }
        if let Some(title) = input.seo_title {
            active.seo_title = Set(Some(title));
        }
        if let Some(desc) = input.seo_description {
            active.seo_description = Set(Some(desc));
        }

        // Stock and status are coupled: recompute whenever either moves.
        let stock = input.stock_quantity.unwrap_or(existing.stock_quantity);
        let requested_status = input.status.unwrap_or(existing.status);
        let status = status_for_stock(stock, requested_status);
        if let Some(stock) = input.stock_quantity {
            active.stock_quantity = Set(stock);
        }
        active.status = Set(status);
        active.updated_at = Set(Utc::now());

        let model = active.update(&*self.db).await?;

        if status == ProductStatus::OutOfStock && existing.status != ProductStatus::OutOfStock {
            self.event_sender
                .send_or_log(Event::ProductOutOfStock(product_id))
                .await;
        }
        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!("Updated product {}", product_id);
        Ok(model)
    }

    /// Uploads new inline images, keeps referenced URLs, and deletes
    /// managed assets the update dropped.
    async fn reconcile_images(
        &self,
        existing: &ProductModel,
        images: &[String],
    ) -> Result<(Vec<String>, Vec<String>), ServiceError> {
        if images.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one product image is required".into(),
            ));
        }

        let old_urls = json_strings(&existing.images);
        let old_ids = json_strings(&existing.media_asset_ids);

        let mut urls = Vec::with_capacity(images.len());
        let mut ids = Vec::with_capacity(images.len());
        for image in images {
            if MediaClient::is_inline_image(image) {
                let asset = self.media.store_image(image, "products", None).await?;
                urls.push(asset.url);
                ids.push(asset.asset_id);
            } else {
                // Existing URL kept; carry its asset id along.
                let id = old_urls
                    .iter()
                    .position(|u| u == image)
                    .and_then(|i| old_ids.get(i).cloned())
                    .unwrap_or_else(|| crate::clients::media::EXISTING_ASSET_ID.to_string());
                urls.push(image.clone());
                ids.push(id);
            }
        }

        for (url, id) in old_urls.iter().zip(old_ids.iter()) {
            let dropped = !urls.contains(url);
            let managed = MediaAsset {
                url: url.clone(),
                asset_id: id.clone(),
            }
            .is_managed();
            if dropped && managed {
                self.media.delete_asset_or_log(id).await;
            }
        }

        Ok((urls, ids))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = self.get_product(product_id).await?;

        for asset_id in json_strings(&product.media_asset_ids) {
            self.media.delete_asset_or_log(&asset_id).await;
        }

        product.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!("Deleted product {}", product_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductListQuery) -> Result<ProductPage, ServiceError> {
        let mut db_query = Product::find();

        if let Some(category_id) = query.category_id {
            // category_ids is a JSON array column; textual containment of
            // the uuid is the portable filter for it.
            db_query =
                db_query.filter(product::Column::CategoryIds.contains(category_id.to_string()));
        }
        if let Some(status) = query.status {
            db_query = db_query.filter(product::Column::Status.eq(status));
        }
        if let Some(search) = &query.search {
            db_query = db_query.filter(
                product::Column::Name
                    .contains(search)
                    .or(product::Column::ShortDescription.contains(search))
                    .or(product::Column::Sku.contains(search))
                    .or(product::Column::Tags.contains(search)),
            );
        }

        let total = db_query.clone().count(&*self.db).await?;

        let sort_column = match query.sort.as_deref() {
            Some("name") => product::Column::Name,
            Some("regularPrice") => product::Column::RegularPrice,
            Some("stockQuantity") => product::Column::StockQuantity,
            _ => product::Column::CreatedAt,
        };
        db_query = if query.descending {
            db_query.order_by_desc(sort_column)
        } else {
            db_query.order_by_asc(sort_column)
        };

        let products = db_query
            .limit(query.limit)
            .offset(query.offset)
            .all(&*self.db)
            .await?;

        Ok(ProductPage { products, total })
    }

    /// Active products in one category, newest first.
    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<ProductPage, ServiceError> {
        self.list_products(ProductListQuery {
            category_id: Some(category_id),
            status: Some(ProductStatus::Active),
            search: None,
            sort: None,
            descending: true,
            limit,
            offset,
        })
        .await
    }

    /// Free-text search over name, short description, SKU and tags.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        term: &str,
        limit: u64,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .filter(
                product::Column::Name
                    .contains(term)
                    .or(product::Column::ShortDescription.contains(term))
                    .or(product::Column::Sku.contains(term))
                    .or(product::Column::Tags.contains(term)),
            )
            .order_by_desc(product::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Loads several products by id, preserving no particular order.
    pub async fn get_products_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ProductModel>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Product::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    async fn ensure_unique_sku(
        &self,
        sku: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Product with SKU {} already exists",
                sku
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn current_price_prefers_valid_discount() {
        assert_eq!(current_price(dec!(100), Some(dec!(80))), dec!(80));
        assert_eq!(current_price(dec!(100), None), dec!(100));
        // A "discount" at or above the regular price is ignored.
        assert_eq!(current_price(dec!(100), Some(dec!(100))), dec!(100));
        assert_eq!(current_price(dec!(100), Some(dec!(120))), dec!(100));
    }

    #[test]
    fn discount_percentage_rounds() {
        assert_eq!(discount_percentage(dec!(100), Some(dec!(80))), 20);
        assert_eq!(discount_percentage(dec!(3), Some(dec!(2))), 33);
        assert_eq!(discount_percentage(dec!(3), Some(dec!(1))), 67);
        assert_eq!(discount_percentage(dec!(100), None), 0);
        assert_eq!(discount_percentage(dec!(100), Some(dec!(150))), 0);
        assert_eq!(discount_percentage(dec!(0), Some(dec!(0))), 0);
    }

    #[test]
    fn stock_status_buckets() {
        assert_eq!(stock_status(0), "Out of Stock");
        assert_eq!(stock_status(-1), "Out of Stock");
        assert_eq!(stock_status(1), "Low Stock");
        assert_eq!(stock_status(10), "Low Stock");
        assert_eq!(stock_status(11), "In Stock");
    }

    #[test]
    fn stock_zero_forces_out_of_stock() {
        assert_eq!(
            status_for_stock(0, ProductStatus::Active),
            ProductStatus::OutOfStock
        );
        // Draft and discontinued products are left alone.
        assert_eq!(
            status_for_stock(0, ProductStatus::Draft),
            ProductStatus::Draft
        );
    }

    #[test]
    fn restock_reactivates_out_of_stock_product() {
        assert_eq!(
            status_for_stock(5, ProductStatus::OutOfStock),
            ProductStatus::Active
        );
        assert_eq!(
            status_for_stock(5, ProductStatus::Draft),
            ProductStatus::Draft
        );
    }

    #[test]
    fn sku_is_normalized_uppercase() {
        assert_eq!(normalize_sku("  abc-1 "), "ABC-1");
    }
}
