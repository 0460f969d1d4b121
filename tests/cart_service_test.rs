mod common;

use rust_decimal_macros::dec;
use std::sync::Arc;
use storefront_api::clients::MediaClient;
use storefront_api::entities::product::ProductStatus;
use storefront_api::errors::ServiceError;
use storefront_api::services::carts::CartService;
use storefront_api::services::products::{CreateProductInput, ProductCatalogService};

struct Fixture {
    carts: CartService,
    products: ProductCatalogService,
    user_id: uuid::Uuid,
}

async fn fixture() -> Fixture {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let media = Arc::new(MediaClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
        "test".to_string(),
    ));
    let user = common::seed_user(&db, "shopper@example.com").await;

    Fixture {
        carts: CartService::new(db.clone(), events.clone()),
        products: ProductCatalogService::new(db, events, media),
        user_id: user.id,
    }
}

async fn seed_product(fx: &Fixture, sku: &str, stock: i32) -> storefront_api::entities::ProductModel {
    fx.products
        .create_product(CreateProductInput {
            name: format!("Product {}", sku),
            sku: sku.to_string(),
            short_description: None,
            long_description: None,
            regular_price: dec!(99.00),
            discounted_price: None,
            stock_quantity: stock,
            status: Some(ProductStatus::Active),
            images: vec!["https://cdn.example.com/a.jpg".to_string()],
            category_ids: vec![],
            related_product_ids: vec![],
            tags: vec![],
            delivery_info: None,
            returns_info: None,
            seo_title: None,
            seo_description: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn empty_cart_has_no_lines() {
    let fx = fixture().await;

    let view = fx.carts.get_cart(fx.user_id).await.unwrap();
    assert!(view.cart_id.is_none());
    assert!(view.lines.is_empty());
}

#[tokio::test]
async fn adding_an_existing_line_replaces_the_quantity() {
    let fx = fixture().await;
    let product = seed_product(&fx, "TEA-01", 20).await;

    let first = fx.carts.add_item(fx.user_id, product.id, 2).await.unwrap();
    assert_eq!(first.lines.len(), 1);
    assert_eq!(first.lines[0].item.quantity, 2);

    let second = fx.carts.add_item(fx.user_id, product.id, 5).await.unwrap();
    assert_eq!(second.lines.len(), 1);
    assert_eq!(second.lines[0].item.quantity, 5);
}

#[tokio::test]
async fn quantity_above_stock_is_rejected() {
    let fx = fixture().await;
    let product = seed_product(&fx, "TEA-02", 3).await;

    let err = fx
        .carts
        .add_item(fx.user_id, product.id, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn inactive_products_cannot_be_added() {
    let fx = fixture().await;
    let mut product = seed_product(&fx, "TEA-03", 10).await;

    product = fx
        .products
        .update_product(
            product.id,
            storefront_api::services::products::UpdateProductInput {
                status: Some(ProductStatus::Discontinued),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = fx
        .carts
        .add_item(fx.user_id, product.id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn remove_and_clear() {
    let fx = fixture().await;
    let a = seed_product(&fx, "TEA-04", 10).await;
    let b = seed_product(&fx, "TEA-05", 10).await;

    fx.carts.add_item(fx.user_id, a.id, 1).await.unwrap();
    fx.carts.add_item(fx.user_id, b.id, 2).await.unwrap();

    let after_remove = fx.carts.remove_item(fx.user_id, a.id).await.unwrap();
    assert_eq!(after_remove.lines.len(), 1);

    fx.carts.clear_cart(fx.user_id).await.unwrap();
    let view = fx.carts.get_cart(fx.user_id).await.unwrap();
    assert!(view.lines.is_empty());
}
