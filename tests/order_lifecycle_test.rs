mod common;

use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use storefront_api::clients::MediaClient;
use storefront_api::entities::coupon::DiscountType;
use storefront_api::entities::order::OrderStatus;
use storefront_api::entities::product::ProductStatus;
use storefront_api::errors::ServiceError;
use storefront_api::events::Event;
use storefront_api::services::coupons::{CouponService, CreateCouponInput};
use storefront_api::services::orders::{
    CreateOrderInput, OrderAmounts, OrderItemInput, OrderService,
};
use storefront_api::services::products::{CreateProductInput, ProductCatalogService};

struct Fixture {
    products: ProductCatalogService,
    orders: OrderService,
    coupons: CouponService,
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
    let user = common::seed_user(&db, "buyer@example.com").await;

    Fixture {
        products: ProductCatalogService::new(db.clone(), events.clone(), media),
        orders: OrderService::new(db.clone(), events.clone(), "INR".to_string()),
        coupons: CouponService::new(db, events),
        user_id: user.id,
    }
}

async fn seed_product(
    products: &ProductCatalogService,
    sku: &str,
    price: rust_decimal::Decimal,
    stock: i32,
) -> storefront_api::entities::ProductModel {
    products
        .create_product(CreateProductInput {
            name: format!("Product {}", sku),
            sku: sku.to_string(),
            short_description: None,
            long_description: None,
            regular_price: price,
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

fn order_input(items: Vec<OrderItemInput>) -> CreateOrderInput {
    CreateOrderInput {
        items,
        shipping_address: json!({"line1": "1 Main St", "city": "Pune"}),
        payment: json!({"method": "cod"}),
        coupon_code: None,
        notes: None,
    }
}

#[tokio::test]
async fn create_order_decrements_stock_and_computes_amounts() {
    let fx = fixture().await;
    let product = seed_product(&fx.products, "TEA-01", dec!(150.00), 10).await;

    let order = fx
        .orders
        .create_order(
            fx.user_id,
            order_input(vec![OrderItemInput {
                product_id: product.id,
                quantity: 3,
            }]),
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Created);

    let amounts: OrderAmounts = serde_json::from_value(order.amounts.clone()).unwrap();
    assert_eq!(amounts.subtotal, dec!(450.00));
    assert_eq!(amounts.discount, dec!(0));
    assert_eq!(amounts.total, dec!(450.00));
    assert_eq!(amounts.currency, "INR");

    let after = fx.products.get_product(product.id).await.unwrap();
    assert_eq!(after.stock_quantity, 7);
    assert_eq!(after.sales_count, 3);
}

#[tokio::test]
async fn order_exceeding_stock_is_rejected() {
    let fx = fixture().await;
    let product = seed_product(&fx.products, "TEA-02", dec!(80.00), 2).await;

    let err = fx
        .orders
        .create_order(
            fx.user_id,
            order_input(vec![OrderItemInput {
                product_id: product.id,
                quantity: 5,
            }]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    // Nothing was deducted
    let after = fx.products.get_product(product.id).await.unwrap();
    assert_eq!(after.stock_quantity, 2);
}

#[tokio::test]
async fn coupon_discount_is_applied_and_usage_counted() {
    let fx = fixture().await;
    let product = seed_product(&fx.products, "TEA-03", dec!(200.00), 10).await;

    let coupon = fx
        .coupons
        .create_coupon(CreateCouponInput {
            code: "save10".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            starts_at: None,
            expires_at: None,
            is_active: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(coupon.code, "SAVE10");

    let mut input = order_input(vec![OrderItemInput {
        product_id: product.id,
        quantity: 2,
    }]);
    input.coupon_code = Some("save10".to_string());

    let order = fx.orders.create_order(fx.user_id, input).await.unwrap();

    let amounts: OrderAmounts = serde_json::from_value(order.amounts.clone()).unwrap();
    assert_eq!(amounts.subtotal, dec!(400.00));
    assert_eq!(amounts.discount, dec!(40.00));
    assert_eq!(amounts.total, dec!(360.00));

    let after = fx.coupons.get_coupon(coupon.id).await.unwrap();
    assert_eq!(after.usage_count, 1);
}

#[tokio::test]
async fn redeeming_a_coupon_emits_the_order_it_was_used_on() {
    let db = common::test_db().await;
    let (events, mut rx) = common::test_events();
    let media = Arc::new(MediaClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
        "test".to_string(),
    ));
    let user = common::seed_user(&db, "emitter@example.com").await;
    let products = ProductCatalogService::new(db.clone(), events.clone(), media);
    let orders = OrderService::new(db.clone(), events.clone(), "INR".to_string());
    let coupons = CouponService::new(db, events);

    let product = seed_product(&products, "TEA-09", dec!(100.00), 5).await;
    let coupon = coupons
        .create_coupon(CreateCouponInput {
            code: "EMIT".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            starts_at: None,
            expires_at: None,
            is_active: Some(true),
        })
        .await
        .unwrap();

    let mut input = order_input(vec![OrderItemInput {
        product_id: product.id,
        quantity: 1,
    }]);
    input.coupon_code = Some("EMIT".to_string());
    let order = orders.create_order(user.id, input).await.unwrap();

    let mut redeemed = None;
    while let Ok(event) = rx.try_recv() {
        if let Event::CouponRedeemed {
            coupon_id,
            order_id,
        } = event
        {
            redeemed = Some((coupon_id, order_id));
        }
    }
    assert_eq!(redeemed, Some((coupon.id, order.id)));
}

#[tokio::test]
async fn cancel_restocks_items() {
    let fx = fixture().await;
    let product = seed_product(&fx.products, "TEA-04", dec!(50.00), 5).await;

    let order = fx
        .orders
        .create_order(
            fx.user_id,
            order_input(vec![OrderItemInput {
                product_id: product.id,
                quantity: 5,
            }]),
        )
        .await
        .unwrap();

    // Order drained the stock entirely
    let drained = fx.products.get_product(product.id).await.unwrap();
    assert_eq!(drained.stock_quantity, 0);
    assert_eq!(drained.status, ProductStatus::OutOfStock);

    let cancelled = fx.orders.cancel_order(order.id, fx.user_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let restocked = fx.products.get_product(product.id).await.unwrap();
    assert_eq!(restocked.stock_quantity, 5);
    assert_eq!(restocked.status, ProductStatus::Active);
    assert_eq!(restocked.sales_count, 0);
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() {
    let fx = fixture().await;
    let product = seed_product(&fx.products, "TEA-05", dec!(50.00), 5).await;

    let order = fx
        .orders
        .create_order(
            fx.user_id,
            order_input(vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
            }]),
        )
        .await
        .unwrap();

    fx.orders
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let err = fx.orders.cancel_order(order.id, fx.user_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn only_the_owner_can_cancel() {
    let fx = fixture().await;
    let product = seed_product(&fx.products, "TEA-06", dec!(50.00), 5).await;

    let order = fx
        .orders
        .create_order(
            fx.user_id,
            order_input(vec![OrderItemInput {
                product_id: product.id,
                quantity: 1,
            }]),
        )
        .await
        .unwrap();

    let err = fx
        .orders
        .cancel_order(order.id, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}
