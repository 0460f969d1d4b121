use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::sync::Arc;
use storefront_api::entities::user::{self, UserRole};
use storefront_api::events::EventSender;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fresh in-memory database with the full schema applied. A single pooled
/// connection so every query sees the same in-memory database.
pub async fn test_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("sqlite in-memory connection");
    storefront_api::db::run_migrations(&db)
        .await
        .expect("migrations");
    Arc::new(db)
}

/// Event sender wired to a live channel; the receiver is returned so tests
/// can assert on emitted events or simply drop it.
pub fn test_events() -> (
    Arc<EventSender>,
    mpsc::Receiver<storefront_api::events::Event>,
) {
    let (tx, rx) = mpsc::channel(64);
    (Arc::new(EventSender::new(tx)), rx)
}

pub async fn seed_user(db: &DatabaseConnection, email: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        subject: Set(format!("sub-{}", Uuid::new_v4())),
        email: Set(email.to_string()),
        display_name: Set("Test User".to_string()),
        avatar_url: Set(None),
        phone: Set(None),
        email_verified: Set(true),
        role: Set(UserRole::User),
        profile_address: Set(None),
        last_login_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed user")
}
