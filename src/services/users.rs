use crate::{
    clients::IdentityClient,
    entities::user::{self, UserRole},
    entities::{User, UserModel},
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

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub profile_address: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub role: Option<UserRole>,
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct UserPage {
    pub users: Vec<UserModel>,
    pub total: u64,
}

/// Account directory. Creation happens at the auth boundary; this service
/// covers profile edits and admin management.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    identity: Arc<IdentityClient>,
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        identity: Arc<IdentityClient>,
    ) -> Self {
        Self {
            db,
            event_sender,
            identity,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserModel, ServiceError> {
        User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", user_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_subject(&self, subject: &str) -> Result<UserModel, ServiceError> {
        User::find()
            .filter(user::Column::Subject.eq(subject))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".into()))
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<UserModel, ServiceError> {
        let existing = self.get_user(user_id).await?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = input.display_name {
            active.display_name = Set(name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.profile_address {
            active.profile_address = Set(Some(address));
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        Ok(model)
    }

    /// Newest accounts first; filter by role, search by email or name.
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: UserListQuery) -> Result<UserPage, ServiceError> {
        let mut db_query = User::find();
        if let Some(role) = query.role {
            db_query = db_query.filter(user::Column::Role.eq(role));
        }
        if let Some(search) = &query.search {
            db_query = db_query.filter(
                user::Column::Email
                    .contains(search)
                    .or(user::Column::DisplayName.contains(search)),
            );
        }

        let total = db_query.clone().count(&*self.db).await?;
        let users = db_query
            .order_by_desc(user::Column::CreatedAt)
            .limit(query.limit)
            .offset(query.offset)
            .all(&*self.db)
            .await?;

        Ok(UserPage { users, total })
    }

    #[instrument(skip(self))]
    pub async fn update_role(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<UserModel, ServiceError> {
        let existing = self.get_user(user_id).await?;
        if existing.role == role {
            return Ok(existing);
        }

        let mut active: user::ActiveModel = existing.into();
        active.role = Set(role);
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserRoleChanged {
                user_id,
                role: role.as_str().to_string(),
            })
            .await;

        info!("User {} role changed to {}", user_id, role.as_str());
        Ok(model)
    }

    /// Removes the account here and asks the identity provider to drop
    /// the subject. A provider failure is logged, not surfaced; the
    /// local deletion already happened.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let user = self.get_user(user_id).await?;
        let subject = user.subject.clone();

        user.delete(&*self.db).await?;
        self.identity.delete_subject_or_log(&subject).await;

        self.event_sender
            .send_or_log(Event::UserDeleted(user_id))
            .await;

        info!("Deleted user {}", user_id);
        Ok(())
    }
}
