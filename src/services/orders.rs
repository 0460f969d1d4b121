use crate::{
    entities::order::{self, OrderStatus},
    entities::product::{self, ProductStatus},
    entities::{coupon, Coupon, Order, OrderModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::products::{current_price, status_for_stock};

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: serde_json::Value,
    pub payment: serde_json::Value,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Immutable money summary stored on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAmounts {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Default)]
pub struct OrderListQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct OrderPage {
    pub orders: Vec<OrderModel>,
    pub total: u64,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    currency: String,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            currency,
        }
    }

    /// Places an order: snapshots product details into the order document,
    /// decrements stock, applies an optional coupon and records the amounts.
    /// Runs in one transaction so stock and coupon usage stay consistent.
    #[instrument(skip(self, input))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> Result<OrderModel, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let mut subtotal = Decimal::ZERO;
        let mut item_snapshots = Vec::with_capacity(input.items.len());
        for line in &input.items {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(
                    "Item quantity must be at least 1".into(),
                ));
            }
            let product = Product::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Product {}", line.product_id)))?;
            if product.status != ProductStatus::Active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product {} is not available for purchase",
                    product.name
                )));
            }
            if product.stock_quantity < line.quantity {
                return Err(ServiceError::InvalidOperation(format!(
                    "Insufficient stock for {}",
                    product.name
                )));
            }

            let unit_price = current_price(product.regular_price, product.discounted_price);
            let line_total = unit_price * Decimal::from(line.quantity);
            subtotal += line_total;

            let first_image = super::json_strings(&product.images).into_iter().next();
            item_snapshots.push(json!({
                "product_id": product.id,
                "name": product.name,
                "sku": product.sku,
                "image": first_image,
                "price": unit_price,
                "quantity": line.quantity,
                "line_total": line_total,
            }));

            let remaining = product.stock_quantity - line.quantity;
            let status = status_for_stock(remaining, product.status);
            let product_id = product.id;
            let sales = product.sales_count;
            let mut active: product::ActiveModel = product.into();
            active.stock_quantity = Set(remaining);
            active.status = Set(status);
            active.sales_count = Set(sales + i64::from(line.quantity));
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?;

            if status == ProductStatus::OutOfStock {
                self.event_sender
                    .send_or_log(Event::ProductOutOfStock(product_id))
                    .await;
            }
        }

        // Coupon snapshot and discount, applied against the subtotal.
        let (discount, coupon_snapshot, redeemed_coupon) = match &input.coupon_code {
            Some(code) => {
                let coupon = Coupon::find()
                    .filter(coupon::Column::Code.eq(code.trim().to_uppercase()))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::ValidationError("Invalid coupon code".into())
                    })?;
                let discount = super::coupons::compute_discount(&coupon, subtotal)?;
                let snapshot = json!({
                    "code": coupon.code,
                    "discount_type": coupon.discount_type,
                    "discount_value": coupon.discount_value,
                    "discount": discount,
                });
                let coupon_id = coupon.id;
                let used = coupon.usage_count;
                let mut active: coupon::ActiveModel = coupon.into();
                active.usage_count = Set(used + 1);
                active.updated_at = Set(Utc::now());
                active.update(&txn).await?;
                (discount, Some(snapshot), Some(coupon_id))
            }
            None => (Decimal::ZERO, None, None),
        };

        let shipping = Decimal::ZERO;
        let amounts = OrderAmounts {
            subtotal,
            discount,
            shipping,
            total: subtotal - discount + shipping,
            currency: self.currency.clone(),
        };

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let active = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            status: Set(OrderStatus::Created),
            items: Set(serde_json::Value::Array(item_snapshots)),
            address: Set(input.shipping_address),
            payment: Set(input.payment),
            amounts: Set(serde_json::to_value(&amounts)?),
            coupon: Set(coupon_snapshot),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;
        if let Some(coupon_id) = redeemed_coupon {
            self.event_sender
                .send_or_log(Event::CouponRedeemed {
                    coupon_id,
                    order_id,
                })
                .await;
        }

        info!("Created order {} for user {}", order_id, user_id);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {}", order_id)))
    }

    /// Newest first; optionally scoped to one user or one status.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, query: OrderListQuery) -> Result<OrderPage, ServiceError> {
        let mut db_query = Order::find();
        if let Some(user_id) = query.user_id {
            db_query = db_query.filter(order::Column::UserId.eq(user_id));
        }
        if let Some(status) = query.status {
            db_query = db_query.filter(order::Column::Status.eq(status));
        }

        let total = db_query.clone().count(&*self.db).await?;
        let orders = db_query
            .order_by_desc(order::Column::CreatedAt)
            .limit(query.limit)
            .offset(query.offset)
            .all(&*self.db)
            .await?;

        Ok(OrderPage { orders, total })
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let order = self.get_order(order_id).await?;
        let old_status = order.status;
        if old_status == new_status {
            return Ok(order);
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.as_str().to_string(),
                new_status: new_status.as_str().to_string(),
            })
            .await;

        info!(
            "Order {} moved from {} to {}",
            order_id,
            old_status.as_str(),
            new_status.as_str()
        );
        Ok(model)
    }

    /// Lets the owner cancel their own order before it ships. The held
    /// stock goes back on the shelf.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrderModel, ServiceError> {
        let order = self.get_order(order_id).await?;
        if order.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "You can only cancel your own orders".into(),
            ));
        }
        match order.status {
            OrderStatus::Created | OrderStatus::Confirmed => {}
            OrderStatus::Cancelled => {
                return Err(ServiceError::InvalidOperation(
                    "Order is already cancelled".into(),
                ))
            }
            _ => {
                return Err(ServiceError::InvalidOperation(
                    "Order can no longer be cancelled".into(),
                ))
            }
        }

        let txn = self.db.begin().await?;
        self.restock_items(&txn, &order).await?;

        let old_status = order.status;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.as_str().to_string(),
                new_status: OrderStatus::Cancelled.as_str().to_string(),
            })
            .await;

        info!("Order {} cancelled by its owner", order_id);
        Ok(model)
    }

    /// Owners may delete only orders that never progressed or were
    /// cancelled.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let order = self.get_order(order_id).await?;
        if order.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "You can only delete your own orders".into(),
            ));
        }
        if !order.status.is_deletable() {
            return Err(ServiceError::InvalidOperation(
                "Only new or cancelled orders can be deleted".into(),
            ));
        }

        order.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderDeleted(order_id))
            .await;

        info!("Deleted order {}", order_id);
        Ok(())
    }

    async fn restock_items<C>(&self, conn: &C, order: &OrderModel) -> Result<(), ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        let items = order.items.as_array().cloned().unwrap_or_default();
        for item in items {
            let product_id = item
                .get("product_id")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok());
            let quantity = item.get("quantity").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
            let (product_id, quantity) = match (product_id, quantity) {
                (Some(id), q) if q > 0 => (id, q),
                _ => continue,
            };
            // Products deleted since the order was placed are skipped.
            if let Some(product) = Product::find_by_id(product_id).one(conn).await? {
                let restocked = product.stock_quantity + quantity;
                let status = status_for_stock(restocked, product.status);
                let sales = product.sales_count;
                let mut active: product::ActiveModel = product.into();
                active.stock_quantity = Set(restocked);
                active.status = Set(status);
                active.sales_count = Set((sales - i64::from(quantity)).max(0));
                active.updated_at = Set(Utc::now());
                active.update(conn).await?;
            }
        }
        Ok(())
    }
}
