use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::auth::TokenService;
use crate::auth::password::verify_password;
use crate::db::dao::DaoContext;
use crate::db::entities::{role, user};
use crate::error::{AppError, codes};
use crate::services::menu_tree::{MenuNode, build_tree};
use crate::services::rbac_service::RbacService;

/// Session payload handed to the frontend: the account, its roles, the
/// navigation tree and the flat permission codes.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: user::Model,
    pub roles: Vec<role::Model>,
    pub menus: Vec<MenuNode>,
    pub permissions: Vec<String>,
}

#[derive(Clone)]
pub struct AuthService {
    daos: DaoContext,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(daos: DaoContext, tokens: TokenService) -> Self {
        Self { daos, tokens }
    }

    fn rbac(&self) -> RbacService {
        RbacService::new(self.daos.clone())
    }

    /// Checks credentials and issues a token. The caller learns only which
    /// step failed through the error code; the disabled check deliberately
    /// runs before the password check so a locked-out operator is told so.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ip: Option<String>,
    ) -> Result<(String, user::Model), AppError> {
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

        let user = self
            .daos
            .user()
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(codes::USER_NOT_FOUND, "user does not exist")
            })?;
        if user.status != 1 {
            return Err(AppError::forbidden(codes::USER_DISABLED, "user is disabled"));
        }
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized(
                codes::PASSWORD_INVALID,
                "password is incorrect",
            ));
        }

        let user = self.daos.user().record_login(user, ip).await?;
        let role_code = self.rbac().primary_role_code(user.id).await?;
        let token = self.tokens.issue(&user, &role_code)?;
        Ok((token, user))
    }

    /// The bare profile for the logged-in account; the password hash never
    /// serializes.
    pub async fn user_info(&self, user_id: i32) -> Result<user::Model, AppError> {
        self.daos
            .user()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(codes::USER_NOT_FOUND, "user does not exist"))
    }

    /// Everything the frontend needs to boot a session, in one response.
    pub async fn info(&self, user_id: i32) -> Result<SessionInfo, AppError> {
        let user = self.user_info(user_id).await?;

        let rbac = self.rbac();
        let roles = rbac.roles_of(user_id).await?;
        let is_super = rbac.is_super_admin(user_id).await?;
        let menus = self.menus_for(user_id, is_super).await?;
        let permissions = self.permissions_for(user_id, is_super).await?;
        Ok(SessionInfo {
            user,
            roles,
            menus,
            permissions,
        })
    }

    pub async fn user_menus(&self, user_id: i32) -> Result<Vec<MenuNode>, AppError> {
        let is_super = self.rbac().is_super_admin(user_id).await?;
        self.menus_for(user_id, is_super).await
    }

    pub async fn user_permissions(&self, user_id: i32) -> Result<Vec<String>, AppError> {
        let is_super = self.rbac().is_super_admin(user_id).await?;
        self.permissions_for(user_id, is_super).await
    }

    /// Active menus the user may see, as a tree. Superadmins get the whole
    /// tree; everyone else gets the active subset their roles link to.
    async fn menus_for(&self, user_id: i32, is_super: bool) -> Result<Vec<MenuNode>, AppError> {
        if is_super {
            let menus = self.daos.menu().all(Some(1)).await?;
            return Ok(build_tree(&menus, 0));
        }

        let allowed: HashSet<i32> = self
            .rbac()
            .effective_menu_ids(user_id)
            .await?
            .into_iter()
            .collect();
        if allowed.is_empty() {
            return Ok(Vec::new());
        }
        let visible: Vec<_> = self
            .daos
            .menu()
            .all(Some(1))
            .await?
            .into_iter()
            .filter(|menu| allowed.contains(&menu.id))
            .collect();
        Ok(build_tree(&visible, 0))
    }

    async fn permissions_for(&self, user_id: i32, is_super: bool) -> Result<Vec<String>, AppError> {
        if is_super {
            let all = self.daos.permission().all_active().await?;
            let unique: BTreeSet<String> = all.into_iter().map(|p| p.code).collect();
            return Ok(unique.into_iter().collect());
        }
        self.rbac().effective_permission_codes(user_id).await
    }
}
