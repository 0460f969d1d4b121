mod common;

use rust_decimal_macros::dec;
use std::sync::Arc;
use storefront_api::clients::MediaClient;
use storefront_api::entities::product::ProductStatus;
use storefront_api::entities::review::ReviewStatus;
use storefront_api::errors::ServiceError;
use storefront_api::services::products::{CreateProductInput, ProductCatalogService};
use storefront_api::services::reviews::{CreateReviewInput, ReviewService};

struct Fixture {
    reviews: ReviewService,
    product_id: uuid::Uuid,
    user_id: uuid::Uuid,
    other_user_id: uuid::Uuid,
}

async fn fixture() -> Fixture {
    let db = common::test_db().await;
    let (events, _rx) = common::test_events();
    let media = Arc::new(MediaClient::new(
        "http://127.0.0.1:1".to_string(),
        None,
        "test".to_string(),
    ));

    let products = ProductCatalogService::new(db.clone(), events.clone(), media);
    let product = products
        .create_product(CreateProductInput {
            name: "Green Tea".to_string(),
            sku: "TEA-01".to_string(),
            short_description: None,
            long_description: None,
            regular_price: dec!(100.00),
            discounted_price: None,
            stock_quantity: 10,
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
        .unwrap();

    let user = common::seed_user(&db, "reviewer@example.com").await;
    let other = common::seed_user(&db, "other@example.com").await;

    Fixture {
        reviews: ReviewService::new(db, events),
        product_id: product.id,
        user_id: user.id,
        other_user_id: other.id,
    }
}

fn review_input(product_id: uuid::Uuid, rating: i16) -> CreateReviewInput {
    CreateReviewInput {
        product_id,
        rating,
        title: "Lovely".to_string(),
        comment: "Would buy again".to_string(),
    }
}

#[tokio::test]
async fn new_reviews_start_pending() {
    let fx = fixture().await;

    let review = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 5))
        .await
        .unwrap();

    assert_eq!(review.status, ReviewStatus::Pending);
    assert!(!review.verified_purchase);

    // Pending reviews are invisible on the product page
    let (page, _stats) = fx.reviews.product_reviews(fx.product_id, 10, 0).await.unwrap();
    assert!(page.reviews.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn one_review_per_user_per_product() {
    let fx = fixture().await;

    fx.reviews
        .create_review(fx.user_id, review_input(fx.product_id, 4))
        .await
        .unwrap();

    let err = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn rating_outside_range_is_rejected() {
    let fx = fixture().await;

    let err = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 6))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn approved_reviews_feed_the_stats() {
    let fx = fixture().await;

    let first = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 5))
        .await
        .unwrap();
    let second = fx
        .reviews
        .create_review(fx.other_user_id, review_input(fx.product_id, 4))
        .await
        .unwrap();

    fx.reviews
        .moderate_review(first.id, ReviewStatus::Approved, None)
        .await
        .unwrap();
    fx.reviews
        .moderate_review(second.id, ReviewStatus::Approved, None)
        .await
        .unwrap();

    let (page, stats) = fx.reviews.product_reviews(fx.product_id, 10, 0).await.unwrap();
    assert_eq!(page.reviews.len(), 2);
    assert_eq!(stats.total_reviews, 2);
    assert_eq!(stats.average_rating, 4.5);

    let fives = stats.distribution.iter().find(|b| b.rating == 5).unwrap();
    assert_eq!(fives.count, 1);
    assert_eq!(fives.percentage, 50.0);
}

#[tokio::test]
async fn moderation_cannot_set_pending() {
    let fx = fixture().await;

    let review = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 3))
        .await
        .unwrap();

    let err = fx
        .reviews
        .moderate_review(review.id, ReviewStatus::Pending, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn owner_edit_resets_moderation() {
    let fx = fixture().await;

    let review = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 2))
        .await
        .unwrap();
    fx.reviews
        .moderate_review(review.id, ReviewStatus::Approved, None)
        .await
        .unwrap();

    let edited = fx
        .reviews
        .update_review(
            review.id,
            fx.user_id,
            storefront_api::services::reviews::UpdateReviewInput {
                rating: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.status, ReviewStatus::Pending);
    assert_eq!(edited.rating, 4);
}

#[tokio::test]
async fn helpful_votes_toggle() {
    let fx = fixture().await;

    let review = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 5))
        .await
        .unwrap();

    let on = fx
        .reviews
        .toggle_helpful(review.id, fx.other_user_id)
        .await
        .unwrap();
    assert!(on.is_helpful);
    assert_eq!(on.helpful_count, 1);

    let off = fx
        .reviews
        .toggle_helpful(review.id, fx.other_user_id)
        .await
        .unwrap();
    assert!(!off.is_helpful);
    assert_eq!(off.helpful_count, 0);
}

#[tokio::test]
async fn a_user_can_report_a_review_once() {
    let fx = fixture().await;

    let review = fx
        .reviews
        .create_review(fx.user_id, review_input(fx.product_id, 1))
        .await
        .unwrap();

    fx.reviews
        .report_review(review.id, fx.other_user_id)
        .await
        .unwrap();

    let err = fx
        .reviews
        .report_review(review.id, fx.other_user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
