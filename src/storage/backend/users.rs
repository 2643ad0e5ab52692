//! CMS user accounts

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::info;

use super::converters::{model_to_user, user_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, TalentenraadError};
use crate::storage::models::{User, UserRole};

use migration::entities::user;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl SeaOrmStorage {
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = user::Entity::find()
            .order_by_asc(user::Column::Email)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(model_to_user).collect())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = &self.db;
        let email = normalize_email(email);
        let row = retry::with_retry("find_user_by_email", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Email.eq(email.as_str()))
                .one(db)
                .await
        })
        .await?;
        Ok(row.map(model_to_user))
    }

    pub async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let row = user::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(row.map(model_to_user))
    }

    /// Register a new user, rejecting duplicate emails
    pub async fn create_user(
        &self,
        email: &str,
        name: Option<String>,
        role: UserRole,
    ) -> Result<User> {
        let email = normalize_email(email);
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(TalentenraadError::validation(format!(
                "User with email {} already exists",
                email
            )));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name,
            role,
            created_at: Utc::now(),
            last_login_at: None,
        };
        user::Entity::insert(user_to_active_model(&user))
            .exec_without_returning(&self.db)
            .await?;

        info!("User created: {} ({})", user.email, user.role);
        Ok(user)
    }

    pub async fn update_user(
        &self,
        id: &str,
        name: Option<String>,
        role: Option<UserRole>,
    ) -> Result<User> {
        let existing = user::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| TalentenraadError::not_found(format!("User not found: {}", id)))?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(Some(name));
        }
        if let Some(role) = role {
            active.role = Set(role.to_string());
        }
        let updated = active.update(&self.db).await?;
        Ok(model_to_user(updated))
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let result = user::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TalentenraadError::not_found(format!(
                "User not found: {}",
                id
            )));
        }
        info!("User deleted: {}", id);
        Ok(())
    }

    /// Stamp `last_login_at`; unknown emails are ignored
    pub async fn touch_user_login(&self, email: &str) -> Result<()> {
        user::Entity::update_many()
            .col_expr(
                user::Column::LastLoginAt,
                sea_orm::sea_query::Expr::val(Utc::now()),
            )
            .filter(user::Column::Email.eq(normalize_email(email)))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
