use crate::{
    entities::{address, Address, AddressModel},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, Unchanged,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AddressInput {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

/// Saved shipping addresses, owner-scoped. At most one address per user
/// is the default; the swap happens inside a transaction.
#[derive(Clone)]
pub struct AddressBookService {
    db: Arc<DatabaseConnection>,
}

impl AddressBookService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Default address first, then newest.
    #[instrument(skip(self))]
    pub async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<AddressModel>, ServiceError> {
        Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn add_address(
        &self,
        user_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .all(&txn)
            .await?;
        // The first address a user saves always becomes the default.
        let is_default = input.is_default || existing.is_empty();
        if is_default {
            Self::clear_defaults(&txn, user_id).await?;
        }

        let now = Utc::now();
        let active = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            full_name: Set(input.full_name),
            phone: Set(input.phone),
            line1: Set(input.line1),
            line2: Set(input.line2),
            city: Set(input.city),
            state: Set(input.state),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            is_default: Set(is_default),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&txn).await?;
        txn.commit().await?;

        info!("Added address {} for user {}", model.id, user_id);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_address(
        &self,
        address_id: Uuid,
        user_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = Self::owned_address(&txn, address_id, user_id).await?;

        if input.is_default && !existing.is_default {
            Self::clear_defaults(&txn, user_id).await?;
        }

        let mut active: address::ActiveModel = existing.into();
        active.full_name = Set(input.full_name);
        active.phone = Set(input.phone);
        active.line1 = Set(input.line1);
        active.line2 = Set(input.line2);
        active.city = Set(input.city);
        active.state = Set(input.state);
        active.postal_code = Set(input.postal_code);
        active.country = Set(input.country);
        active.is_default = Set(input.is_default);
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;
        txn.commit().await?;

        Ok(model)
    }

    /// Demotes the current default and promotes the given address, as one
    /// transaction.
    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        address_id: Uuid,
        user_id: Uuid,
    ) -> Result<AddressModel, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = Self::owned_address(&txn, address_id, user_id).await?;

        Self::clear_defaults(&txn, user_id).await?;
        let active = address::ActiveModel {
            id: Unchanged(existing.id),
            is_default: Set(true),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = active.update(&txn).await?;
        txn.commit().await?;

        info!("Address {} set as default for user {}", address_id, user_id);
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_address(
        &self,
        address_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        let address = Self::owned_address(&*self.db, address_id, user_id).await?;
        address.delete(&*self.db).await?;
        info!("Deleted address {} for user {}", address_id, user_id);
        Ok(())
    }

    async fn owned_address<C>(
        conn: &C,
        address_id: Uuid,
        user_id: Uuid,
    ) -> Result<AddressModel, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        let address = Address::find_by_id(address_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {}", address_id)))?;
        if address.user_id != user_id {
            return Err(ServiceError::NotFound(format!("Address {}", address_id)));
        }
        Ok(address)
    }

    async fn clear_defaults<C>(conn: &C, user_id: Uuid) -> Result<(), ServiceError>
    where
        C: sea_orm::ConnectionTrait,
    {
        Address::update_many()
            .col_expr(
                address::Column::IsDefault,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::IsDefault.eq(true))
            .exec(conn)
            .await?;
        Ok(())
    }
}
