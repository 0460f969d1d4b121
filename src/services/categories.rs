use crate::{
    clients::MediaClient,
    entities::category::{self, CategoryStatus},
    entities::{product, Category, CategoryModel, Product},
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

/// URL slug from a display name: lowercased, punctuation stripped,
/// whitespace collapsed to single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_hyphen = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub display_order: Option<i32>,
    pub status: Option<CategoryStatus>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub display_order: Option<i32>,
    pub status: Option<CategoryStatus>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

/// `parent == Some(None)` filters to root categories only.
#[derive(Debug, Clone, Default)]
pub struct CategoryListQuery {
    pub status: Option<CategoryStatus>,
    pub parent: Option<Option<Uuid>>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct CategoryPage {
    pub categories: Vec<CategoryModel>,
    pub total: u64,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    media: Arc<MediaClient>,
}

impl CategoryService {
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

    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        self.ensure_unique_name(&input.name, None).await?;
        if let Some(parent_id) = input.parent_id {
            self.get_category(parent_id).await?;
        }

        let slug = self.unique_slug(&input.name, None).await?;

        let (image_url, asset_id) = match &input.image {
            Some(image) => {
                let asset = self.media.store_image(image, "categories", None).await?;
                (Some(asset.url), Some(asset.asset_id))
            }
            None => (None, None),
        };

        let category_id = Uuid::new_v4();
        let now = Utc::now();
        let active = category::ActiveModel {
            id: Set(category_id),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            image: Set(image_url),
            media_asset_id: Set(asset_id),
            parent_id: Set(input.parent_id),
            display_order: Set(input.display_order.unwrap_or(0)),
            status: Set(input.status.unwrap_or(CategoryStatus::Active)),
            seo_title: Set(input.seo_title),
            seo_description: Set(input.seo_description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category_id))
            .await;

        info!("Created category {}", category_id);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let existing = self.get_category(category_id).await?;

        if let Some(parent) = input.parent_id {
            if parent == Some(category_id) {
                return Err(ServiceError::ValidationError(
                    "A category cannot be its own parent".into(),
                ));
            }
            if let Some(parent_id) = parent {
                self.get_category(parent_id).await?;
            }
        }

        let slug = match &input.name {
            Some(name) if !name.eq_ignore_ascii_case(&existing.name) => {
                self.ensure_unique_name(name, Some(category_id)).await?;
                Some(self.unique_slug(name, Some(category_id)).await?)
            }
            _ => None,
        };

        let media_update = match &input.image {
            Some(image) if MediaClient::is_inline_image(image) => {
                let asset = self.media.store_image(image, "categories", None).await?;
                if let Some(old) = &existing.media_asset_id {
                    self.media.delete_asset_or_log(old).await;
                }
                Some((asset.url, asset.asset_id))
            }
            Some(url) => Some((
                url.clone(),
                existing
                    .media_asset_id
                    .clone()
                    .unwrap_or_else(|| crate::clients::media::EXISTING_ASSET_ID.to_string()),
            )),
            None => None,
        };

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some((url, asset_id)) = media_update {
            active.image = Set(Some(url));
            active.media_asset_id = Set(Some(asset_id));
        }
        if let Some(parent) = input.parent_id {
            active.parent_id = Set(parent);
        }
        if let Some(order) = input.display_order {
            active.display_order = Set(order);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(title) = input.seo_title {
            active.seo_title = Set(Some(title));
        }
        if let Some(desc) = input.seo_description {
            active.seo_description = Set(Some(desc));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category_id))
            .await;

        info!("Updated category {}", category_id);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let category = self.get_category(category_id).await?;

        let children = Category::find()
            .filter(category::Column::ParentId.eq(category_id))
            .count(&*self.db)
            .await?;
        if children > 0 {
            return Err(ServiceError::InvalidOperation(
                "Cannot delete a category that has subcategories".into(),
            ));
        }

        // category_ids is a JSON array column; textual containment of the
        // uuid is the portable filter for it.
        let products = Product::find()
            .filter(product::Column::CategoryIds.contains(category_id.to_string()))
            .count(&*self.db)
            .await?;
        if products > 0 {
            return Err(ServiceError::InvalidOperation(
                "Cannot delete a category that still has products".into(),
            ));
        }

        if let Some(asset_id) = &category.media_asset_id {
            self.media.delete_asset_or_log(asset_id).await;
        }

        category.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(category_id))
            .await;

        info!("Deleted category {}", category_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, category_id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {}", category_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<CategoryModel, ServiceError> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {}", slug)))
    }

    /// Ordered by display order then newest first.
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        query: CategoryListQuery,
    ) -> Result<CategoryPage, ServiceError> {
        let mut db_query = Category::find();
        if let Some(status) = query.status {
            db_query = db_query.filter(category::Column::Status.eq(status));
        }
        match query.parent {
            Some(Some(parent_id)) => {
                db_query = db_query.filter(category::Column::ParentId.eq(parent_id));
            }
            Some(None) => {
                db_query = db_query.filter(category::Column::ParentId.is_null());
            }
            None => {}
        }

        let total = db_query.clone().count(&*self.db).await?;
        let categories = db_query
            .order_by_asc(category::Column::DisplayOrder)
            .order_by_desc(category::Column::CreatedAt)
            .limit(query.limit)
            .offset(query.offset)
            .all(&*self.db)
            .await?;

        Ok(CategoryPage { categories, total })
    }

    async fn ensure_unique_name(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let existing = Category::find().all(&*self.db).await?;
        let clash = existing.iter().any(|c| {
            c.name.eq_ignore_ascii_case(name.trim()) && Some(c.id) != exclude_id
        });
        if clash {
            return Err(ServiceError::ValidationError(format!(
                "Category with name {} already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    /// Appends a numeric suffix when the natural slug is taken.
    async fn unique_slug(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<String, ServiceError> {
        let base = slugify(name);
        if base.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name must contain at least one letter or digit".into(),
            ));
        }
        let mut candidate = base.clone();
        let mut suffix = 1u32;
        loop {
            let mut query = Category::find().filter(category::Column::Slug.eq(candidate.clone()));
            if let Some(id) = exclude_id {
                query = query.filter(category::Column::Id.ne(id));
            }
            if query.one(&*self.db).await?.is_none() {
                return Ok(candidate);
            }
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Herbal Teas"), "herbal-teas");
        assert_eq!(slugify("  Gift & Combo Packs!  "), "gift-combo-packs");
        assert_eq!(slugify("Already-Slugged"), "already-slugged");
    }

    #[test]
    fn slugify_collapses_runs_and_trims_hyphens() {
        assert_eq!(slugify("a   b"), "a-b");
        assert_eq!(slugify("--hello--"), "hello");
        assert_eq!(slugify("???"), "");
    }
}
