use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Cloneable handle for emitting domain events onto the in-process channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging on failure instead of surfacing the error.
    /// Event delivery must never fail the request that produced it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event channel send failed: {}", e);
        }
    }
}

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    ProductOutOfStock(Uuid),
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),

    // Orders
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderDeleted(Uuid),
    OfflineOrderCreated(Uuid),

    // Cart
    CartItemAdded {
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        user_id: Uuid,
        product_id: Uuid,
    },

    // Reviews
    ReviewSubmitted {
        review_id: Uuid,
        product_id: Uuid,
    },
    ReviewModerated {
        review_id: Uuid,
        status: String,
    },
    ReviewReported {
        review_id: Uuid,
        reporter_id: Uuid,
    },

    // Coupons
    CouponCreated(Uuid),
    CouponRedeemed {
        coupon_id: Uuid,
        order_id: Uuid,
    },

    // Users
    UserSynced(Uuid),
    UserRoleChanged {
        user_id: Uuid,
        role: String,
    },
    UserDeleted(Uuid),

    // Homepage
    HomePageSettingsUpdated,
}

/// Consumes events from the channel and logs them. The loop runs for the
/// lifetime of the process; a closed channel ends it.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    from = %old_status,
                    to = %new_status,
                    "Order status changed"
                );
            }
            Event::ProductOutOfStock(product_id) => {
                info!(product_id = %product_id, "Product went out of stock");
            }
            Event::ReviewReported {
                review_id,
                reporter_id,
            } => {
                info!(review_id = %review_id, reporter_id = %reporter_id, "Review reported");
            }
            other => {
                debug!("Event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::ProductCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::ProductCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out even though the receiver is gone.
        sender.send_or_log(Event::OrderCreated(Uuid::new_v4())).await;
    }
}
