use crate::{
    entities::review::{self, ReviewStatus},
    entities::{order, Order, Product, Review, ReviewModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Rounds to one decimal place, half away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-star bucket of the rating distribution.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatingBucket {
    pub rating: i16,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewStats {
    pub average_rating: f64,
    pub total_reviews: u64,
    pub distribution: Vec<RatingBucket>,
}

/// Aggregates approved ratings into an average and a 1..5 star
/// distribution with percentages.
pub fn aggregate_ratings(ratings: &[i16]) -> ReviewStats {
    let total = ratings.len() as u64;
    let average = if total == 0 {
        0.0
    } else {
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        round_one_decimal(sum as f64 / total as f64)
    };
    let distribution = (1..=5)
        .map(|star| {
            let count = ratings.iter().filter(|r| **r == star).count() as u64;
            let percentage = if total == 0 {
                0.0
            } else {
                round_one_decimal(count as f64 * 100.0 / total as f64)
            };
            RatingBucket {
                rating: star,
                count,
                percentage,
            }
        })
        .collect();
    ReviewStats {
        average_rating: average,
        total_reviews: total,
        distribution,
    }
}

#[derive(Debug, Clone)]
pub struct CreateReviewInput {
    pub product_id: Uuid,
    pub rating: i16,
    pub title: String,
    pub comment: String,
}

/// Owner edits. Any change sends the review back through moderation.
#[derive(Debug, Clone, Default)]
pub struct UpdateReviewInput {
    pub rating: Option<i16>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AdminReviewListQuery {
    pub status: Option<ReviewStatus>,
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewModel>,
    pub total: u64,
}

/// Review totals per moderation status, for the admin dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewStatusTotals {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[derive(Debug)]
pub struct HelpfulToggle {
    pub helpful_count: u64,
    pub is_helpful: bool,
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Submits a review. One review per user per product; every review
    /// starts pending.
    #[instrument(skip(self, input))]
    pub async fn create_review(
        &self,
        user_id: Uuid,
        input: CreateReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::ValidationError(
                "Rating must be between 1 and 5".into(),
            ));
        }
        Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", input.product_id)))?;

        let existing = Review::find()
            .filter(review::Column::ProductId.eq(input.product_id))
            .filter(review::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "You have already reviewed this product".into(),
            ));
        }

        let verified = self.has_purchased(user_id, input.product_id).await?;

        let review_id = Uuid::new_v4();
        let now = Utc::now();
        let active = review::ActiveModel {
            id: Set(review_id),
            product_id: Set(input.product_id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            title: Set(input.title),
            comment: Set(input.comment),
            status: Set(ReviewStatus::Pending),
            verified_purchase: Set(verified),
            admin_response: Set(None),
            helpful_voters: Set(json!([])),
            reported_voters: Set(json!([])),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewSubmitted {
                review_id,
                product_id: input.product_id,
            })
            .await;

        info!("Review {} submitted for product {}", review_id, input.product_id);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_review(&self, review_id: Uuid) -> Result<ReviewModel, ServiceError> {
        Review::find_by_id(review_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {}", review_id)))
    }

    /// Approved reviews for one product, newest first, plus the rating
    /// stats computed over all approved reviews.
    #[instrument(skip(self))]
    pub async fn product_reviews(
        &self,
        product_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(ReviewPage, ReviewStats), ServiceError> {
        let base = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::Status.eq(ReviewStatus::Approved));

        let total = base.clone().count(&*self.db).await?;
        let reviews = base
            .clone()
            .order_by_desc(review::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        let ratings: Vec<i16> = base
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| r.rating)
            .collect();
        let stats = aggregate_ratings(&ratings);

        Ok((ReviewPage { reviews, total }, stats))
    }

    /// The caller's own reviews, any status, newest first.
    #[instrument(skip(self))]
    pub async fn user_reviews(&self, user_id: Uuid) -> Result<Vec<ReviewModel>, ServiceError> {
        Review::find()
            .filter(review::Column::UserId.eq(user_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn admin_list(
        &self,
        query: AdminReviewListQuery,
    ) -> Result<(ReviewPage, ReviewStatusTotals), ServiceError> {
        let mut db_query = Review::find();
        if let Some(status) = query.status {
            db_query = db_query.filter(review::Column::Status.eq(status));
        }
        if let Some(search) = &query.search {
            db_query = db_query.filter(
                review::Column::Title
                    .contains(search)
                    .or(review::Column::Comment.contains(search)),
            );
        }

        let total = db_query.clone().count(&*self.db).await?;
        let reviews = db_query
            .order_by_desc(review::Column::CreatedAt)
            .limit(query.limit)
            .offset(query.offset)
            .all(&*self.db)
            .await?;

        let totals = ReviewStatusTotals {
            pending: self.count_status(ReviewStatus::Pending).await?,
            approved: self.count_status(ReviewStatus::Approved).await?,
            rejected: self.count_status(ReviewStatus::Rejected).await?,
        };

        Ok((ReviewPage { reviews, total }, totals))
    }

    /// Owner edit of rating, title or comment. The review goes back to
    /// pending for re-moderation.
    #[instrument(skip(self, input))]
    pub async fn update_review(
        &self,
        review_id: Uuid,
        user_id: Uuid,
        input: UpdateReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        let review = self.get_review(review_id).await?;
        if review.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "You can only edit your own reviews".into(),
            ));
        }
        if let Some(rating) = input.rating {
            if !(1..=5).contains(&rating) {
                return Err(ServiceError::ValidationError(
                    "Rating must be between 1 and 5".into(),
                ));
            }
        }

        let mut active: review::ActiveModel = review.into();
        if let Some(rating) = input.rating {
            active.rating = Set(rating);
        }
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(comment) = input.comment {
            active.comment = Set(comment);
        }
        active.status = Set(ReviewStatus::Pending);
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        Ok(model)
    }

    /// Moderation decision with an optional public admin response.
    #[instrument(skip(self, response))]
    pub async fn moderate_review(
        &self,
        review_id: Uuid,
        status: ReviewStatus,
        response: Option<String>,
    ) -> Result<ReviewModel, ServiceError> {
        if status == ReviewStatus::Pending {
            return Err(ServiceError::ValidationError(
                "Moderation must approve or reject the review".into(),
            ));
        }
        let review = self.get_review(review_id).await?;

        let mut active: review::ActiveModel = review.into();
        active.status = Set(status);
        if let Some(message) = response {
            active.admin_response = Set(Some(json!({
                "message": message,
                "responded_at": Utc::now(),
            })));
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewModerated {
                review_id,
                status: status.as_str().to_string(),
            })
            .await;

        info!("Review {} moderated to {}", review_id, status.as_str());
        Ok(model)
    }

    /// Owner or moderator removal.
    #[instrument(skip(self))]
    pub async fn delete_review(
        &self,
        review_id: Uuid,
        user_id: Uuid,
        is_moderator: bool,
    ) -> Result<(), ServiceError> {
        let review = self.get_review(review_id).await?;
        if !is_moderator && review.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "You can only delete your own reviews".into(),
            ));
        }
        review.delete(&*self.db).await?;
        info!("Deleted review {}", review_id);
        Ok(())
    }

    /// Toggles the caller's helpful vote and reports the new tally.
    #[instrument(skip(self))]
    pub async fn toggle_helpful(
        &self,
        review_id: Uuid,
        user_id: Uuid,
    ) -> Result<HelpfulToggle, ServiceError> {
        let review = self.get_review(review_id).await?;
        let mut voters = super::json_strings(&review.helpful_voters);
        let key = user_id.to_string();

        let is_helpful = if let Some(pos) = voters.iter().position(|v| *v == key) {
            voters.remove(pos);
            false
        } else {
            voters.push(key);
            true
        };
        let helpful_count = voters.len() as u64;

        let mut active: review::ActiveModel = review.into();
        active.helpful_voters = Set(super::strings_json(&voters));
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        Ok(HelpfulToggle {
            helpful_count,
            is_helpful,
        })
    }

    /// Flags a review for moderator attention; each user may report a
    /// review once.
    #[instrument(skip(self))]
    pub async fn report_review(
        &self,
        review_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        let review = self.get_review(review_id).await?;
        let mut reporters = super::json_strings(&review.reported_voters);
        let key = user_id.to_string();
        if reporters.contains(&key) {
            return Err(ServiceError::ValidationError(
                "You have already reported this review".into(),
            ));
        }
        reporters.push(key);

        let mut active: review::ActiveModel = review.into();
        active.reported_voters = Set(super::strings_json(&reporters));
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewReported {
                review_id,
                reporter_id: user_id,
            })
            .await;

        Ok(())
    }

    async fn count_status(&self, status: ReviewStatus) -> Result<u64, ServiceError> {
        Review::find()
            .filter(review::Column::Status.eq(status))
            .count(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Whether any of the user's orders contains the product.
    async fn has_purchased(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;
        let key = product_id.to_string();
        Ok(orders.iter().any(|o| {
            o.items
                .as_array()
                .map(|items| {
                    items.iter().any(|item| {
                        item.get("product_id").and_then(|v| v.as_str()) == Some(key.as_str())
                    })
                })
                .unwrap_or(false)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_empty_ratings() {
        let stats = aggregate_ratings(&[]);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.distribution.len(), 5);
        assert!(stats.distribution.iter().all(|b| b.count == 0));
        assert!(stats.distribution.iter().all(|b| b.percentage == 0.0));
    }

    #[test]
    fn aggregate_rounds_average_to_one_decimal() {
        // (5 + 4 + 4) / 3 = 4.333... -> 4.3
        let stats = aggregate_ratings(&[5, 4, 4]);
        assert_eq!(stats.average_rating, 4.3);
        assert_eq!(stats.total_reviews, 3);
        // (2 / 3) * 100 = 66.66... -> 66.7
        let fours = &stats.distribution[3];
        assert_eq!(fours.rating, 4);
        assert_eq!(fours.count, 2);
        assert_eq!(fours.percentage, 66.7);
    }

    #[test]
    fn aggregate_buckets_cover_all_stars() {
        let stats = aggregate_ratings(&[1, 1, 3, 5]);
        let ones = &stats.distribution[0];
        assert_eq!(ones.count, 2);
        assert_eq!(ones.percentage, 50.0);
        assert_eq!(stats.distribution[1].count, 0);
        assert_eq!(stats.distribution[4].count, 1);
        assert_eq!(stats.average_rating, 2.5);
    }
}
