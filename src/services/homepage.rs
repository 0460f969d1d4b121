use crate::{
    clients::MediaClient,
    entities::{homepage_settings, HomePageSettings, HomePageSettingsModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const DEFAULT_SITE_NAME: &str = "Storefront";

#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    pub site_name: Option<String>,
    pub logo: Option<String>,
    pub featured_product_ids: Option<Vec<Uuid>>,
    pub grid_product_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone)]
pub struct HeroSlideInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub image: String,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
}

/// Storefront home page configuration. A single active settings row is
/// maintained; every write is a transactional find-or-create followed
/// by the mutation.
#[derive(Clone)]
pub struct HomePageService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    media: Arc<MediaClient>,
}

impl HomePageService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        media: Arc<MediaClient>,
    ) -> Self {
        Self {
            db,
            event_sender,
            media,
        }
    }

    /// The active settings row, if one has ever been saved.
    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<Option<HomePageSettingsModel>, ServiceError> {
        HomePageSettings::find()
            .filter(homepage_settings::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_settings(
        &self,
        updated_by: Uuid,
        input: UpdateSettingsInput,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        let logo = match &input.logo {
            Some(image) if MediaClient::is_inline_image(image) => {
                let asset = self.media.store_image(image, "homepage", Some("logo")).await?;
                Some(asset.url)
            }
            Some(url) => Some(url.clone()),
            None => None,
        };

        let txn = self.db.begin().await?;
        let settings = Self::find_or_create(&txn, updated_by).await?;

        let mut active: homepage_settings::ActiveModel = settings.into();
        if let Some(site_name) = input.site_name {
            active.site_name = Set(site_name);
        }
        if let Some(logo) = logo {
            active.logo = Set(Some(logo));
        }
        if let Some(ids) = input.featured_product_ids {
            active.featured_product_ids = Set(super::uuids_json(&ids));
        }
        if let Some(ids) = input.grid_product_ids {
            active.grid_product_ids = Set(super::uuids_json(&ids));
        }
        active.updated_by = Set(Some(updated_by));
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::HomePageSettingsUpdated)
            .await;

        info!("Home page settings updated");
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn add_hero_slide(
        &self,
        updated_by: Uuid,
        input: HeroSlideInput,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        let image_url = self.resolve_slide_image(&input.image).await?;

        let txn = self.db.begin().await?;
        let settings = Self::find_or_create(&txn, updated_by).await?;

        let mut slides = settings.hero_slides.as_array().cloned().unwrap_or_default();
        slides.push(json!({
            "id": Uuid::new_v4(),
            "title": input.title,
            "subtitle": input.subtitle,
            "image": image_url,
            "cta_text": input.cta_text,
            "cta_link": input.cta_link,
        }));

        let model = Self::save_slides(&txn, settings, slides, updated_by).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::HomePageSettingsUpdated)
            .await;
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_hero_slide(
        &self,
        updated_by: Uuid,
        slide_id: Uuid,
        input: HeroSlideInput,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        let image_url = self.resolve_slide_image(&input.image).await?;

        let txn = self.db.begin().await?;
        let settings = Self::find_or_create(&txn, updated_by).await?;

        let mut slides = settings.hero_slides.as_array().cloned().unwrap_or_default();
        let key = slide_id.to_string();
        let slot = slides
            .iter_mut()
            .find(|s| s.get("id").and_then(|v| v.as_str()) == Some(key.as_str()))
            .ok_or_else(|| ServiceError::NotFound(format!("Hero slide {}", slide_id)))?;
        *slot = json!({
            "id": slide_id,
            "title": input.title,
            "subtitle": input.subtitle,
            "image": image_url,
            "cta_text": input.cta_text,
            "cta_link": input.cta_link,
        });

        let model = Self::save_slides(&txn, settings, slides, updated_by).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::HomePageSettingsUpdated)
            .await;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_hero_slide(
        &self,
        updated_by: Uuid,
        slide_id: Uuid,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        let txn = self.db.begin().await?;
        let settings = Self::find_or_create(&txn, updated_by).await?;

        let mut slides = settings.hero_slides.as_array().cloned().unwrap_or_default();
        let key = slide_id.to_string();
        let before = slides.len();
        slides.retain(|s| s.get("id").and_then(|v| v.as_str()) != Some(key.as_str()));
        if slides.len() == before {
            return Err(ServiceError::NotFound(format!("Hero slide {}", slide_id)));
        }

        let model = Self::save_slides(&txn, settings, slides, updated_by).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::HomePageSettingsUpdated)
            .await;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn add_nav_link(
        &self,
        updated_by: Uuid,
        label: String,
        url: String,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        let txn = self.db.begin().await?;
        let settings = Self::find_or_create(&txn, updated_by).await?;

        let mut links = settings.nav_links.as_array().cloned().unwrap_or_default();
        links.push(json!({ "label": label, "url": url }));

        let mut active: homepage_settings::ActiveModel = settings.into();
        active.nav_links = Set(serde_json::Value::Array(links));
        active.updated_by = Set(Some(updated_by));
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::HomePageSettingsUpdated)
            .await;
        Ok(model)
    }

    /// Removes the navigation link at the given position.
    #[instrument(skip(self))]
    pub async fn delete_nav_link(
        &self,
        updated_by: Uuid,
        index: usize,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        let txn = self.db.begin().await?;
        let settings = Self::find_or_create(&txn, updated_by).await?;

        let mut links = settings.nav_links.as_array().cloned().unwrap_or_default();
        if index >= links.len() {
            return Err(ServiceError::NotFound(format!(
                "Navigation link at position {}",
                index
            )));
        }
        links.remove(index);

        let mut active: homepage_settings::ActiveModel = settings.into();
        active.nav_links = Set(serde_json::Value::Array(links));
        active.updated_by = Set(Some(updated_by));
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::HomePageSettingsUpdated)
            .await;
        Ok(model)
    }

    async fn resolve_slide_image(&self, image: &str) -> Result<String, ServiceError> {
        if MediaClient::is_inline_image(image) {
            let asset = self.media.store_image(image, "homepage", None).await?;
            Ok(asset.url)
        } else {
            Ok(image.to_string())
        }
    }

    async fn save_slides(
        txn: &DatabaseTransaction,
        settings: HomePageSettingsModel,
        slides: Vec<serde_json::Value>,
        updated_by: Uuid,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        let mut active: homepage_settings::ActiveModel = settings.into();
        active.hero_slides = Set(serde_json::Value::Array(slides));
        active.updated_by = Set(Some(updated_by));
        active.updated_at = Set(Utc::now());
        active.update(txn).await.map_err(Into::into)
    }

    /// The single active row, created with defaults on first write.
    async fn find_or_create(
        txn: &DatabaseTransaction,
        updated_by: Uuid,
    ) -> Result<HomePageSettingsModel, ServiceError> {
        if let Some(settings) = HomePageSettings::find()
            .filter(homepage_settings::Column::IsActive.eq(true))
            .one(txn)
            .await?
        {
            return Ok(settings);
        }

        let now = Utc::now();
        let active = homepage_settings::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_name: Set(DEFAULT_SITE_NAME.to_string()),
            logo: Set(None),
            hero_slides: Set(json!([])),
            nav_links: Set(json!([])),
            featured_product_ids: Set(json!([])),
            grid_product_ids: Set(json!([])),
            updated_by: Set(Some(updated_by)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(txn).await.map_err(Into::into)
    }
}
