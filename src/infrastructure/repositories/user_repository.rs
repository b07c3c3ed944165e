//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::{DomainError, NewUser, Role, UpsertedUser, UserFilter, UserRepository};
use crate::models::document;
use crate::models::user::{ActiveModel, Column, Entity as UserEntity, Model};

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

/// Emails compare case-insensitively; rows written before normalization may be mixed case
fn email_matches(email: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(Column::Email))).eq(email.trim().to_lowercase())
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn get(&self, id: i32) -> Result<Model, DomainError> {
        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_all(&self, filter: UserFilter) -> Result<Vec<Model>, DomainError> {
        let mut query = UserEntity::find();
        if let Some(role) = filter.role {
            query = query.filter(Column::Role.eq(role.as_str()));
        }
        if let Some(active) = filter.is_active {
            query = query.filter(Column::IsActive.eq(active));
        }
        Ok(query.order_by_asc(Column::Username).all(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, DomainError> {
        Ok(UserEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<Model>, DomainError> {
        Ok(UserEntity::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(email_matches(identifier)),
            )
            .one(&self.db)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Model>, DomainError> {
        Ok(UserEntity::find()
            .filter(email_matches(email))
            .one(&self.db)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Model>, DomainError> {
        Ok(UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    async fn create(&self, user: NewUser) -> Result<Model, DomainError> {
        let model = ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            last_login: Set(None),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn upsert_by_email(&self, user: NewUser) -> Result<UpsertedUser, DomainError> {
        if let Some(holder) = self.find_by_username(&user.username).await? {
            if !holder.email.eq_ignore_ascii_case(&user.email) {
                return Err(DomainError::Conflict(format!(
                    "Username {} is already taken",
                    user.username
                )));
            }
        }

        match self.find_by_email(&user.email).await? {
            Some(existing) => {
                let mut active: ActiveModel = existing.into();
                active.username = Set(user.username);
                active.password_hash = Set(user.password_hash);
                let user = active.update(&self.db).await?;
                Ok(UpsertedUser {
                    user,
                    created: false,
                })
            }
            None => {
                let user = self.create(user).await?;
                Ok(UpsertedUser {
                    user,
                    created: true,
                })
            }
        }
    }

    async fn set_role(&self, id: i32, role: Role) -> Result<Model, DomainError> {
        let mut active: ActiveModel = self.get(id).await?.into();
        active.role = Set(role.as_str().to_string());
        Ok(active.update(&self.db).await?)
    }

    async fn set_active(&self, id: i32, is_active: bool) -> Result<Model, DomainError> {
        let mut active: ActiveModel = self.get(id).await?.into();
        active.is_active = Set(is_active);
        Ok(active.update(&self.db).await?)
    }

    async fn set_password_hash(&self, id: i32, hash: String) -> Result<(), DomainError> {
        let mut active: ActiveModel = self.get(id).await?.into();
        active.password_hash = Set(hash);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn touch_last_login(&self, id: i32) -> Result<(), DomainError> {
        UserEntity::update_many()
            .col_expr(Column::LastLogin, Expr::value(chrono::Utc::now().to_rfc3339()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        self.get(id).await?;

        document::Entity::update_many()
            .col_expr(document::Column::UploadedBy, Expr::value(Option::<i32>::None))
            .filter(document::Column::UploadedBy.eq(id))
            .exec(&self.db)
            .await?;

        UserEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
