mod common;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use storefront_api::clients::{IdentityClient, MediaClient};
use storefront_api::entities::coupon::DiscountType;
use storefront_api::errors::ServiceError;
use storefront_api::services::addresses::{AddressBookService, AddressInput};
use storefront_api::services::coupons::{CouponService, CreateCouponInput};
use storefront_api::services::homepage::{HeroSlideInput, HomePageService, UpdateSettingsInput};
use storefront_api::services::offline_orders::{CreateOfflineOrderInput, OfflineOrderService};
use storefront_api::services::users::{UpdateProfileInput, UserService};
use uuid::Uuid;

fn address_input(is_default: bool) -> AddressInput {
    AddressInput {
        full_name: "A Customer".to_string(),
        phone: "9876543210".to_string(),
        line1: "1 Main St".to_string(),
        line2: None,
        city: "Pune".to_string(),
        state: "MH".to_string(),
        postal_code: "411001".to_string(),
        country: "India".to_string(),
        is_default,
    }
}

fn coupon_input(code: &str) -> CreateCouponInput {
    CreateCouponInput {
        code: code.to_string(),
        description: None,
        discount_type: DiscountType::Fixed,
        discount_value: dec!(50),
        min_order_amount: None,
        max_discount_amount: None,
        usage_limit: None,
        starts_at: None,
        expires_at: None,
        is_active: Some(true),
    }
}

fn offline_input() -> CreateOfflineOrderInput {
    CreateOfflineOrderInput {
        customer: json!({"name": "Walk-in", "phone": "12345"}),
        items: json!([{"name": "Green Tea", "quantity": 2, "price": "150.00"}]),
        shipping_address: json!({"line1": "1 Main St"}),
        delivery_address: json!({"line1": "1 Main St"}),
        payment: json!({"method": "cash"}),
        amounts: json!({"subtotal": "300.00", "total": "300.00"}),
        notes: None,
    }
}

#[tokio::test]
async fn first_address_becomes_the_default() {
    let db = common::test_db().await;
    let user = common::seed_user(&db, "addr@example.com").await;
    let service = AddressBookService::new(db);

    let first = service
        .add_address(user.id, address_input(false))
        .await
        .unwrap();
    assert!(first.is_default);

    let second = service
        .add_address(user.id, address_input(true))
        .await
        .unwrap();
    assert!(second.is_default);

    let listed = service.list_addresses(user.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    // Exactly one default, listed first
    assert_eq!(listed.iter().filter(|a| a.is_default).count(), 1);
    assert_eq!(listed[0].id, second.id);
}

#[tokio::test]
async fn set_default_swaps_the_flag() {
    let db = common::test_db().await;
    let user = common::seed_user(&db, "addr2@example.com").await;
    let service = AddressBookService::new(db);

    let first = service
        .add_address(user.id, address_input(false))
        .await
        .unwrap();
    let second = service
        .add_address(user.id, address_input(false))
        .await
        .unwrap();
    assert!(!second.is_default);

    let promoted = service.set_default(second.id, user.id).await.unwrap();
    assert!(promoted.is_default);

    let listed = service.list_addresses(user.id).await.unwrap();
    let old = listed.iter().find(|a| a.id == first.id).unwrap();
    assert!(!old.is_default);
}

#[tokio::test]
async fn addresses_are_owner_scoped() {
    let db = common::test_db().await;
    let owner = common::seed_user(&db, "owner@example.com").await;
    let stranger = common::seed_user(&db, "stranger@example.com").await;
    let service = AddressBookService::new(db);

    let address = service
        .add_address(owner.id, address_input(false))
        .await
        .unwrap();

    let err = service
        .delete_address(address.id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn expired_coupons_do_not_validate() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let service = CouponService::new(db, events);

    let mut input = coupon_input("OLD50");
    input.expires_at = Some(Utc::now() - Duration::days(1));
    input.starts_at = Some(Utc::now() - Duration::days(30));
    service.create_coupon(input).await.unwrap();

    let err = service
        .validate_coupon("OLD50", dec!(500))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn fixed_discount_never_exceeds_the_subtotal() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let service = CouponService::new(db, events);

    service.create_coupon(coupon_input("FLAT50")).await.unwrap();

    let (_, discount) = service.validate_coupon("flat50", dec!(30)).await.unwrap();
    assert_eq!(discount, dec!(30));
}

#[tokio::test]
async fn duplicate_coupon_codes_are_rejected() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let service = CouponService::new(db, events);

    service.create_coupon(coupon_input("ONCE")).await.unwrap();
    let err = service.create_coupon(coupon_input("once")).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn offline_orders_require_every_document() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let service = OfflineOrderService::new(db, events);

    let mut missing = offline_input();
    missing.payment = serde_json::Value::Null;
    let err = service
        .create_offline_order("admin@example.com", missing)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let mut empty_items = offline_input();
    empty_items.items = json!([]);
    let err = service
        .create_offline_order("admin@example.com", empty_items)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let created = service
        .create_offline_order("admin@example.com", offline_input())
        .await
        .unwrap();
    assert_eq!(created.created_by, "admin@example.com");
    assert_eq!(created.source, "offline");
}

#[tokio::test]
async fn homepage_slides_round_trip() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let media = Arc::new(MediaClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
        "test".to_string(),
    ));
    let service = HomePageService::new(db, events, media);
    let admin_id = Uuid::new_v4();

    assert!(service.get_settings().await.unwrap().is_none());

    let settings = service
        .update_settings(
            admin_id,
            UpdateSettingsInput {
                site_name: Some("Tea House".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(settings.site_name, "Tea House");

    let with_slide = service
        .add_hero_slide(
            admin_id,
            HeroSlideInput {
                title: "Summer Sale".to_string(),
                subtitle: None,
                image: "https://cdn.example.com/hero.jpg".to_string(),
                cta_text: None,
                cta_link: None,
            },
        )
        .await
        .unwrap();
    let slides = with_slide.hero_slides.as_array().unwrap().clone();
    assert_eq!(slides.len(), 1);
    let slide_id: Uuid = slides[0]["id"].as_str().unwrap().parse().unwrap();

    let after_delete = service.delete_hero_slide(admin_id, slide_id).await.unwrap();
    assert!(after_delete.hero_slides.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn nav_link_deletion_checks_bounds() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let media = Arc::new(MediaClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
        "test".to_string(),
    ));
    let service = HomePageService::new(db, events, media);
    let admin_id = Uuid::new_v4();

    service
        .add_nav_link(admin_id, "Shop".to_string(), "/products".to_string())
        .await
        .unwrap();

    let err = service.delete_nav_link(admin_id, 5).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let after = service.delete_nav_link(admin_id, 0).await.unwrap();
    assert!(after.nav_links.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn profile_update_changes_only_the_given_fields() {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let identity = Arc::new(IdentityClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
    ));
    let user = common::seed_user(&db, "profile@example.com").await;
    let service = UserService::new(db, events, identity);

    let updated = service
        .update_profile(
            user.id,
            UpdateProfileInput {
                display_name: Some("Renamed User".to_string()),
                phone: None,
                profile_address: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.display_name, "Renamed User");
    assert_eq!(updated.email, "profile@example.com");
    assert_eq!(updated.phone, None);
}
