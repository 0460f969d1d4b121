use crate::{
    entities::coupon::{self, DiscountType},
    entities::{Coupon, CouponModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Discount a usable coupon grants against a subtotal. Percentage
/// discounts are capped by `max_discount_amount` when set; the result
/// never exceeds the subtotal.
pub fn compute_discount(coupon: &CouponModel, subtotal: Decimal) -> Result<Decimal, ServiceError> {
    if !coupon.is_usable(Utc::now()) {
        return Err(ServiceError::ValidationError(
            "Coupon is not currently valid".into(),
        ));
    }
    if let Some(min) = coupon.min_order_amount {
        if subtotal < min {
            return Err(ServiceError::ValidationError(format!(
                "Order subtotal must be at least {} to use this coupon",
                min
            )));
        }
    }

    let raw = match coupon.discount_type {
        DiscountType::Percentage => subtotal * coupon.discount_value / Decimal::from(100),
        DiscountType::Fixed => coupon.discount_value,
    };
    let capped = match coupon.max_discount_amount {
        Some(cap) if coupon.discount_type == DiscountType::Percentage => raw.min(cap),
        _ => raw,
    };
    Ok(capped.min(subtotal).max(Decimal::ZERO))
}

#[derive(Debug, Clone)]
pub struct CreateCouponInput {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCouponInput {
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub min_order_amount: Option<Option<Decimal>>,
    pub max_discount_amount: Option<Option<Decimal>>,
    pub usage_limit: Option<Option<i32>>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
}

#[derive(Debug)]
pub struct CouponPage {
    pub coupons: Vec<CouponModel>,
    pub total: u64,
}

#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_coupon(
        &self,
        input: CreateCouponInput,
    ) -> Result<CouponModel, ServiceError> {
        let code = input.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Coupon code is required".into(),
            ));
        }
        if input.discount_value <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Discount value must be positive".into(),
            ));
        }
        if input.discount_type == DiscountType::Percentage
            && input.discount_value > Decimal::from(100)
        {
            return Err(ServiceError::ValidationError(
                "Percentage discount cannot exceed 100".into(),
            ));
        }
        if let (Some(start), Some(end)) = (input.starts_at, input.expires_at) {
            if end <= start {
                return Err(ServiceError::ValidationError(
                    "Expiry must be after the start date".into(),
                ));
            }
        }

        let exists = Coupon::find()
            .filter(coupon::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?;
        if exists.is_some() {
            return Err(ServiceError::ValidationError(
                "Coupon code already exists".into(),
            ));
        }

        let coupon_id = Uuid::new_v4();
        let now = Utc::now();
        let active = coupon::ActiveModel {
            id: Set(coupon_id),
            code: Set(code),
            description: Set(input.description),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            min_order_amount: Set(input.min_order_amount),
            max_discount_amount: Set(input.max_discount_amount),
            usage_limit: Set(input.usage_limit),
            usage_count: Set(0),
            starts_at: Set(input.starts_at),
            expires_at: Set(input.expires_at),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CouponCreated(coupon_id))
            .await;

        info!("Created coupon {}", model.code);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_coupon(
        &self,
        coupon_id: Uuid,
        input: UpdateCouponInput,
    ) -> Result<CouponModel, ServiceError> {
        let existing = self.get_coupon(coupon_id).await?;

        let mut active: coupon::ActiveModel = existing.into();
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(discount_type) = input.discount_type {
            active.discount_type = Set(discount_type);
        }
        if let Some(value) = input.discount_value {
            if value <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Discount value must be positive".into(),
                ));
            }
            active.discount_value = Set(value);
        }
        if let Some(min) = input.min_order_amount {
            active.min_order_amount = Set(min);
        }
        if let Some(max) = input.max_discount_amount {
            active.max_discount_amount = Set(max);
        }
        if let Some(limit) = input.usage_limit {
            active.usage_limit = Set(limit);
        }
        if let Some(starts) = input.starts_at {
            active.starts_at = Set(starts);
        }
        if let Some(expires) = input.expires_at {
            active.expires_at = Set(expires);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&*self.db).await?;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_coupon(&self, coupon_id: Uuid) -> Result<(), ServiceError> {
        let coupon = self.get_coupon(coupon_id).await?;
        coupon.delete(&*self.db).await?;
        info!("Deleted coupon {}", coupon_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_coupon(&self, coupon_id: Uuid) -> Result<CouponModel, ServiceError> {
        Coupon::find_by_id(coupon_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {}", coupon_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_coupons(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<CouponPage, ServiceError> {
        let total = Coupon::find().count(&*self.db).await?;
        let coupons = Coupon::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok(CouponPage { coupons, total })
    }

    /// Resolves a code and computes the discount it would grant on the
    /// given subtotal, without redeeming it.
    #[instrument(skip(self))]
    pub async fn validate_coupon(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> Result<(CouponModel, Decimal), ServiceError> {
        let coupon = Coupon::find()
            .filter(coupon::Column::Code.eq(code.trim().to_uppercase()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ValidationError("Invalid coupon code".into()))?;
        let discount = compute_discount(&coupon, subtotal)?;
        Ok((coupon, discount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coupon(discount_type: DiscountType, value: Decimal) -> CouponModel {
        CouponModel {
            id: Uuid::new_v4(),
            code: "SAVE".into(),
            description: None,
            discount_type,
            discount_value: value,
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            usage_count: 0,
            starts_at: None,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_discount_is_computed_and_capped() {
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        assert_eq!(compute_discount(&c, dec!(500)).unwrap(), dec!(50));

        c.max_discount_amount = Some(dec!(30));
        assert_eq!(compute_discount(&c, dec!(500)).unwrap(), dec!(30));
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let c = coupon(DiscountType::Fixed, dec!(100));
        assert_eq!(compute_discount(&c, dec!(60)).unwrap(), dec!(60));
        assert_eq!(compute_discount(&c, dec!(200)).unwrap(), dec!(100));
    }

    #[test]
    fn minimum_order_amount_is_enforced() {
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.min_order_amount = Some(dec!(300));
        assert!(compute_discount(&c, dec!(299)).is_err());
        assert_eq!(compute_discount(&c, dec!(300)).unwrap(), dec!(50));
    }

    #[test]
    fn inactive_or_exhausted_coupon_is_rejected() {
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.is_active = false;
        assert!(compute_discount(&c, dec!(500)).is_err());

        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.usage_limit = Some(1);
        c.usage_count = 1;
        assert!(compute_discount(&c, dec!(500)).is_err());
    }
}
