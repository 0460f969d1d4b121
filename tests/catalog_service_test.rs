mod common;

use rust_decimal_macros::dec;
use std::sync::Arc;
use storefront_api::clients::MediaClient;
use storefront_api::entities::product::ProductStatus;
use storefront_api::errors::ServiceError;
use storefront_api::services::categories::{CategoryService, CreateCategoryInput};
use storefront_api::services::products::{
    CreateProductInput, ProductCatalogService, ProductListQuery, UpdateProductInput,
};

fn media_client() -> Arc<MediaClient> {
    // URL images pass through without touching the network
    Arc::new(MediaClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
        "test".to_string(),
    ))
}

fn product_input(sku: &str) -> CreateProductInput {
    CreateProductInput {
        name: format!("Product {}", sku),
        sku: sku.to_string(),
        short_description: None,
        long_description: None,
        regular_price: dec!(100.00),
        discounted_price: None,
        stock_quantity: 25,
        status: Some(ProductStatus::Active),
        images: vec!["https://cdn.example.com/a.jpg".to_string()],
        category_ids: vec![],
        related_product_ids: vec![],
        tags: vec![],
        delivery_info: None,
        returns_info: None,
        seo_title: None,
        seo_description: None,
    }
}

async fn catalog() -> ProductCatalogService {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    ProductCatalogService::new(db, events, media_client())
}

#[tokio::test]
async fn create_normalizes_sku_and_rejects_duplicates() {
    let service = catalog().await;

    let created = service.create_product(product_input(" tea-01 ")).await.unwrap();
    assert_eq!(created.sku, "TEA-01");

    let err = service.create_product(product_input("TEA-01")).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn create_with_zero_stock_forces_out_of_stock() {
    let service = catalog().await;

    let mut input = product_input("TEA-02");
    input.stock_quantity = 0;
    let created = service.create_product(input).await.unwrap();
    assert_eq!(created.status, ProductStatus::OutOfStock);
}

#[tokio::test]
async fn restock_flips_status_back_to_active() {
    let service = catalog().await;

    let mut input = product_input("TEA-03");
    input.stock_quantity = 0;
    let created = service.create_product(input).await.unwrap();
    assert_eq!(created.status, ProductStatus::OutOfStock);

    let updated = service
        .update_product(
            created.id,
            UpdateProductInput {
                stock_quantity: Some(40),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, ProductStatus::Active);
    assert_eq!(updated.stock_quantity, 40);
}

#[tokio::test]
async fn discounted_price_must_undercut_regular() {
    let service = catalog().await;

    let mut input = product_input("TEA-04");
    input.discounted_price = Some(dec!(120.00));
    let err = service.create_product(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn images_are_required() {
    let service = catalog().await;

    let mut input = product_input("TEA-05");
    input.images = vec![];
    let err = service.create_product(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn search_matches_name_sku_and_tags() {
    let service = catalog().await;

    let mut a = product_input("GREEN-TEA");
    a.name = "Green Tea".to_string();
    a.tags = vec!["detox".to_string()];
    service.create_product(a).await.unwrap();

    let mut b = product_input("COFFEE-01");
    b.name = "Dark Roast".to_string();
    service.create_product(b).await.unwrap();

    let by_name = service.search_products("green", 10).await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "Green Tea");

    let by_sku = service.search_products("COFFEE", 10).await.unwrap();
    assert_eq!(by_sku.len(), 1);

    let by_tag = service.search_products("detox", 10).await.unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].sku, "GREEN-TEA");
}

#[tokio::test]
async fn list_filters_by_status() {
    let service = catalog().await;

    service.create_product(product_input("A-1")).await.unwrap();
    let mut draft = product_input("A-2");
    draft.status = Some(ProductStatus::Draft);
    service.create_product(draft).await.unwrap();

    let page = service
        .list_products(ProductListQuery {
            status: Some(ProductStatus::Active),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.products[0].sku, "A-1");
}

#[tokio::test]
async fn category_slug_is_generated_and_unique() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let service = CategoryService::new(db, events, media_client());

    let input = CreateCategoryInput {
        name: "Herbal Teas & Infusions".to_string(),
        description: None,
        image: None,
        parent_id: None,
        display_order: None,
        status: None,
        seo_title: None,
        seo_description: None,
    };
    let created = service.create_category(input.clone()).await.unwrap();
    assert_eq!(created.slug, "herbal-teas-infusions");

    // Same name is rejected outright
    let err = service.create_category(input).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn category_with_children_cannot_be_deleted() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let service = CategoryService::new(db, events, media_client());

    let parent = service
        .create_category(CreateCategoryInput {
            name: "Teas".to_string(),
            description: None,
            image: None,
            parent_id: None,
            display_order: None,
            status: None,
            seo_title: None,
            seo_description: None,
        })
        .await
        .unwrap();

    service
        .create_category(CreateCategoryInput {
            name: "Green".to_string(),
            description: None,
            image: None,
            parent_id: Some(parent.id),
            display_order: None,
            status: None,
            seo_title: None,
            seo_description: None,
        })
        .await
        .unwrap();

    let err = service.delete_category(parent.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn category_with_products_cannot_be_deleted() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let categories = CategoryService::new(db.clone(), events.clone(), media_client());
    let products = ProductCatalogService::new(db, events, media_client());

    let category = categories
        .create_category(CreateCategoryInput {
            name: "Infusions".to_string(),
            description: None,
            image: None,
            parent_id: None,
            display_order: None,
            status: None,
            seo_title: None,
            seo_description: None,
        })
        .await
        .unwrap();

    let mut input = product_input("INF-01");
    input.category_ids = vec![category.id];
    products.create_product(input).await.unwrap();

    let err = categories.delete_category(category.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}
