use std::collections::BTreeSet;

use crate::access::SUPER_ADMIN_CODE;
use crate::db::dao::{DaoContext, RbacDao};
use crate::db::entities::role;
use crate::error::AppError;

/// Answers the questions the route guard and the session endpoints ask:
/// which roles a user holds, what those roles grant, and whether a given
/// operation is allowed.
#[derive(Clone)]
pub struct RbacService {
    daos: DaoContext,
}

impl RbacService {
    pub fn new(daos: DaoContext) -> Self {
        Self { daos }
    }

    fn rbac(&self) -> RbacDao {
        self.daos.rbac()
    }

    /// Every role assigned to the user, active or not, in (sort, id) order.
    pub async fn roles_of(&self, user_id: i32) -> Result<Vec<role::Model>, AppError> {
        Ok(self.rbac().roles_of_user(user_id).await?)
    }

    /// Permission codes granted through the user's active roles, sorted and
    /// deduplicated. Disabled roles and disabled permissions contribute
    /// nothing.
    pub async fn effective_permission_codes(&self, user_id: i32) -> Result<Vec<String>, AppError> {
        let role_ids = self.rbac().active_role_ids_of_user(user_id).await?;
        let codes = self.rbac().permission_codes_for_roles(&role_ids).await?;
        let unique: BTreeSet<String> = codes.into_iter().collect();
        Ok(unique.into_iter().collect())
    }

    /// Menu ids reachable through the user's active roles, sorted and
    /// deduplicated.
    pub async fn effective_menu_ids(&self, user_id: i32) -> Result<Vec<i32>, AppError> {
        let role_ids = self.rbac().active_role_ids_of_user(user_id).await?;
        let ids = self.rbac().menu_ids_for_roles(&role_ids).await?;
        let unique: BTreeSet<i32> = ids.into_iter().collect();
        Ok(unique.into_iter().collect())
    }

    /// Whether the user holds the superadmin role, regardless of the role's
    /// status. Disabling that role must not lock the operators out.
    pub async fn is_super_admin(&self, user_id: i32) -> Result<bool, AppError> {
        Ok(self.rbac().has_role_code(user_id, SUPER_ADMIN_CODE).await?)
    }

    pub async fn has_permission(&self, user_id: i32, code: &str) -> Result<bool, AppError> {
        let codes = self.effective_permission_codes(user_id).await?;
        Ok(codes.iter().any(|held| held == code))
    }

    /// The guard's decision: superadmins pass, everyone else needs the code.
    pub async fn allows(&self, user_id: i32, code: &str) -> Result<bool, AppError> {
        if self.is_super_admin(user_id).await? {
            return Ok(true);
        }
        self.has_permission(user_id, code).await
    }

    /// Role code embedded in the token payload as a display hint: the first
    /// active role in (sort, id) order, or `user` when none qualifies.
    pub async fn primary_role_code(&self, user_id: i32) -> Result<String, AppError> {
        let roles = self.roles_of(user_id).await?;
        Ok(roles
            .into_iter()
            .find(|role| role.status == 1)
            .map(|role| role.code)
            .unwrap_or_else(|| "user".to_string()))
    }
}
