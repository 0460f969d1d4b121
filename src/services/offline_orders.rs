use crate::{
    entities::offline_order::{self},
    entities::order::OrderStatus,
    entities::{OfflineOrder, OfflineOrderModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const OFFLINE_SOURCE: &str = "offline";

/// Operator-entered order taken outside the storefront. All documents
/// arrive pre-built from the back office form.
#[derive(Debug, Clone)]
pub struct CreateOfflineOrderInput {
    pub customer: serde_json::Value,
    pub items: serde_json::Value,
    pub shipping_address: serde_json::Value,
    pub delivery_address: serde_json::Value,
    pub payment: serde_json::Value,
    pub amounts: serde_json::Value,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OfflineOrderListQuery {
    pub status: Option<OrderStatus>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct OfflineOrderPage {
    pub orders: Vec<OfflineOrderModel>,
    pub total: u64,
}

#[derive(Clone)]
pub struct OfflineOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OfflineOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_offline_order(
        &self,
        created_by: &str,
        input: CreateOfflineOrderInput,
    ) -> Result<OfflineOrderModel, ServiceError> {
        for (field, value) in [
            ("customer", &input.customer),
            ("items", &input.items),
            ("shippingAddress", &input.shipping_address),
            ("deliveryAddress", &input.delivery_address),
            ("payment", &input.payment),
            ("amounts", &input.amounts),
        ] {
            if value.is_null() {
                return Err(ServiceError::ValidationError(format!(
                    "Missing required field: {}",
                    field
                )));
            }
        }
        if input.items.as_array().map(|a| a.is_empty()).unwrap_or(true) {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".into(),
            ));
        }

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let active = offline_order::ActiveModel {
            id: Set(order_id),
            customer: Set(input.customer),
            items: Set(input.items),
            shipping_address: Set(input.shipping_address),
            delivery_address: Set(input.delivery_address),
            payment: Set(input.payment),
            amounts: Set(input.amounts),
            status: Set(OrderStatus::Created),
            notes: Set(input.notes),
            created_by: Set(created_by.to_string()),
            source: Set(OFFLINE_SOURCE.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OfflineOrderCreated(order_id))
            .await;

        info!("Created offline order {} by {}", order_id, created_by);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_offline_order(
        &self,
        order_id: Uuid,
    ) -> Result<OfflineOrderModel, ServiceError> {
        OfflineOrder::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Offline order {}", order_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_offline_orders(
        &self,
        query: OfflineOrderListQuery,
    ) -> Result<OfflineOrderPage, ServiceError> {
        let mut db_query = OfflineOrder::find();
        if let Some(status) = query.status {
            db_query = db_query.filter(offline_order::Column::Status.eq(status));
        }

        let total = db_query.clone().count(&*self.db).await?;
        let orders = db_query
            .order_by_desc(offline_order::Column::CreatedAt)
            .limit(query.limit)
            .offset(query.offset)
            .all(&*self.db)
            .await?;

        Ok(OfflineOrderPage { orders, total })
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OfflineOrderModel, ServiceError> {
        let order = self.get_offline_order(order_id).await?;
        if order.status == new_status {
            return Ok(order);
        }
        let old_status = order.status;

        let mut active: offline_order::ActiveModel = order.into();
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

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_offline_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.get_offline_order(order_id).await?;
        order.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderDeleted(order_id))
            .await;

        info!("Deleted offline order {}", order_id);
        Ok(())
    }
}
