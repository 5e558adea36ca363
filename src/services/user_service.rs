use std::collections::HashMap;

use serde::Serialize;

use crate::auth::password::hash_password;
use crate::db::dao::DaoContext;
use crate::db::dao::user_dao::{NewUser, ProfileChanges, UserFilter};
use crate::db::entities::{role, user};
use crate::error::{AppError, codes};
use crate::services::{Page, dedup_preserving_order};

/// Listing/detail row: the account plus every role it holds.
#[derive(Debug, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: user::Model,
    pub roles: Vec<role::Model>,
}

#[derive(Clone)]
pub struct UserService {
    daos: DaoContext,
}

impl UserService {
    pub fn new(daos: DaoContext) -> Self {
        Self { daos }
    }

    fn ensure_valid_id(id: i32) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::bad_request(
                codes::INVALID_USER_ID,
                "user id is invalid",
            ));
        }
        Ok(())
    }

    async fn fetch(&self, id: i32) -> Result<user::Model, AppError> {
        self.daos
            .user()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(codes::USER_NOT_FOUND, "user does not exist"))
    }

    async fn require_user(&self, id: i32) -> Result<user::Model, AppError> {
        Self::ensure_valid_id(id)?;
        self.fetch(id).await
    }

    /// Newest first, each row decorated with its roles in two queries total.
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: &UserFilter,
    ) -> Result<Page<UserWithRoles>, AppError> {
        let (rows, total) = self.daos.user().list(page, limit, filter).await?;
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
        let pairs = self.daos.rbac().roles_for_users(&ids).await?;

        let mut by_user: HashMap<i32, Vec<role::Model>> = HashMap::new();
        for (user_id, role) in pairs {
            by_user.entry(user_id).or_default().push(role);
        }
        let list = rows
            .into_iter()
            .map(|user| {
                let roles = by_user.remove(&user.id).unwrap_or_default();
                UserWithRoles { user, roles }
            })
            .collect();
        Ok(Page {
            list,
            total,
            page,
            limit,
        })
    }

    pub async fn detail(&self, id: i32) -> Result<UserWithRoles, AppError> {
        let user = self.require_user(id).await?;
        let roles = self.daos.rbac().roles_of_user(id).await?;
        Ok(UserWithRoles { user, roles })
    }

    pub async fn create(
        &self,
        username: String,
        password: String,
        nickname: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<user::Model, AppError> {
        if username.is_empty() {
            return Err(AppError::bad_request(
                codes::USERNAME_EMPTY,
                "username is required",
            ));
        }
        if password.is_empty() {
            return Err(AppError::bad_request(
                codes::PASSWORD_EMPTY,
                "password is required",
            ));
        }
        if self.daos.user().find_by_username(&username).await?.is_some() {
            return Err(AppError::conflict(
                codes::USERNAME_EXISTS,
                "username is already taken",
            ));
        }

        let password_hash = hash_password(&password)?;
        Ok(self
            .daos
            .user()
            .create(NewUser {
                username,
                password_hash,
                nickname,
                email,
                phone,
            })
            .await?)
    }

    /// Profile fields only; username, password and status have their own
    /// operations.
    pub async fn update_profile(
        &self,
        id: i32,
        changes: ProfileChanges,
    ) -> Result<user::Model, AppError> {
        let user = self.require_user(id).await?;
        Ok(self.daos.user().update_profile(user, changes).await?)
    }

    pub async fn set_status(&self, id: i32, status: i16) -> Result<user::Model, AppError> {
        Self::ensure_valid_id(id)?;
        if !matches!(status, 0 | 1) {
            return Err(AppError::bad_request(
                codes::INVALID_STATUS,
                "status must be 0 or 1",
            ));
        }
        let user = self.fetch(id).await?;
        Ok(self.daos.user().set_status(user, status).await?)
    }

    pub async fn reset_password(&self, id: i32, password: &str) -> Result<user::Model, AppError> {
        Self::ensure_valid_id(id)?;
        let password = password.trim();
        if password.is_empty() {
            return Err(AppError::bad_request(
                codes::PASSWORD_EMPTY,
                "password is required",
            ));
        }
        if password.len() < 6 {
            return Err(AppError::bad_request(
                codes::PASSWORD_TOO_SHORT,
                "password must be at least 6 characters",
            ));
        }
        let user = self.fetch(id).await?;
        let password_hash = hash_password(password)?;
        Ok(self.daos.user().set_password(user, password_hash).await?)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.require_user(id).await?;
        Ok(self.daos.user().delete_cascading(id).await?)
    }

    pub async fn roles_of(&self, id: i32) -> Result<Vec<role::Model>, AppError> {
        self.require_user(id).await?;
        Ok(self.daos.rbac().roles_of_user(id).await?)
    }

    /// Replaces the membership set. Duplicates collapse (first occurrence
    /// wins) and every id must exist; the deduplicated set is returned for
    /// the response echo.
    pub async fn assign_roles(&self, id: i32, role_ids: &[i32]) -> Result<Vec<i32>, AppError> {
        self.require_user(id).await?;
        let unique = dedup_preserving_order(role_ids);
        if !unique.is_empty() {
            let existing = self.daos.role().count_existing(&unique).await?;
            if existing != unique.len() as u64 {
                return Err(AppError::bad_request(
                    codes::INVALID_ROLE_IDS,
                    "one or more role ids do not exist",
                ));
            }
        }
        self.daos.rbac().replace_user_roles(id, &unique).await?;
        Ok(unique)
    }
}
