pub mod addresses;
pub mod cart;
pub mod categories;
pub mod common;
pub mod coupons;
pub mod homepage;
pub mod offline_orders;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use crate::clients::{IdentityClient, MediaClient};
use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    addresses::AddressBookService, carts::CartService, categories::CategoryService,
    coupons::CouponService, homepage::HomePageService, offline_orders::OfflineOrderService,
    orders::OrderService, products::ProductCatalogService, reviews::ReviewService,
    users::UserService,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductCatalogService>,
    pub categories: Arc<CategoryService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub offline_orders: Arc<OfflineOrderService>,
    pub reviews: Arc<ReviewService>,
    pub coupons: Arc<CouponService>,
    pub addresses: Arc<AddressBookService>,
    pub users: Arc<UserService>,
    pub homepage: Arc<HomePageService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
        identity: Arc<IdentityClient>,
        media: Arc<MediaClient>,
    ) -> Self {
        Self {
            products: Arc::new(ProductCatalogService::new(
                db.clone(),
                event_sender.clone(),
                media.clone(),
            )),
            categories: Arc::new(CategoryService::new(
                db.clone(),
                event_sender.clone(),
                media.clone(),
            )),
            carts: Arc::new(CartService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(
                db.clone(),
                event_sender.clone(),
                config.default_currency.clone(),
            )),
            offline_orders: Arc::new(OfflineOrderService::new(
                db.clone(),
                event_sender.clone(),
            )),
            reviews: Arc::new(ReviewService::new(db.clone(), event_sender.clone())),
            coupons: Arc::new(CouponService::new(db.clone(), event_sender.clone())),
            addresses: Arc::new(AddressBookService::new(db.clone())),
            users: Arc::new(UserService::new(
                db.clone(),
                event_sender.clone(),
                identity,
            )),
            homepage: Arc::new(HomePageService::new(db, event_sender, media)),
        }
    }
}
