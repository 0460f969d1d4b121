use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Discount coupon, looked up by its uppercase code.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    /// Cap applied to percentage discounts
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now > at).unwrap_or(false)
    }

    pub fn is_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.map(|at| now >= at).unwrap_or(true)
    }

    pub fn is_usage_exhausted(&self) -> bool {
        self.usage_limit
            .map(|limit| self.usage_count >= limit)
            .unwrap_or(false)
    }

    /// A coupon is usable only when active, started, unexpired, and under
    /// its usage limit.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.is_started(now) && !self.is_expired(now) && !self.is_usage_exhausted()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon() -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            code: "WELCOME10".into(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: Some(100),
            usage_count: 0,
            starts_at: None,
            expires_at: Some(now + Duration::days(30)),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fresh_coupon_is_usable() {
        assert!(coupon().is_usable(Utc::now()));
    }

    #[test]
    fn expired_coupon_is_not_usable() {
        let mut c = coupon();
        c.expires_at = Some(Utc::now() - Duration::days(1));
        assert!(c.is_expired(Utc::now()));
        assert!(!c.is_usable(Utc::now()));
    }

    #[test]
    fn exhausted_coupon_is_not_usable() {
        let mut c = coupon();
        c.usage_count = 100;
        assert!(c.is_usage_exhausted());
        assert!(!c.is_usable(Utc::now()));
    }

    #[test]
    fn not_yet_started_coupon_is_not_usable() {
        let mut c = coupon();
        c.starts_at = Some(Utc::now() + Duration::days(1));
        assert!(!c.is_usable(Utc::now()));
    }

    #[test]
    fn inactive_coupon_is_not_usable() {
        let mut c = coupon();
        c.is_active = false;
        assert!(!c.is_usable(Utc::now()));
    }
}
