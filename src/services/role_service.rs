use crate::db::dao::DaoContext;
use crate::db::dao::role_dao::{NewRole, RoleChanges, RoleFilter};
use crate::db::entities::{menu, permission, role, user};
use crate::error::{AppError, codes};
use crate::services::{Page, dedup_preserving_order};

#[derive(Clone)]
pub struct RoleService {
    daos: DaoContext,
}

impl RoleService {
    pub fn new(daos: DaoContext) -> Self {
        Self { daos }
    }

    fn ensure_valid_id(id: i32) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::bad_request(
                codes::INVALID_ROLE_ID,
                "role id is invalid",
            ));
        }
        Ok(())
    }

    async fn require_role(&self, id: i32) -> Result<role::Model, AppError> {
        Self::ensure_valid_id(id)?;
        self.daos
            .role()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(codes::ROLE_NOT_FOUND, "role does not exist"))
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: &RoleFilter,
    ) -> Result<Page<role::Model>, AppError> {
        let (list, total) = self.daos.role().list(page, limit, filter).await?;
        Ok(Page {
            list,
            total,
            page,
            limit,
        })
    }

    pub async fn detail(&self, id: i32) -> Result<role::Model, AppError> {
        self.require_role(id).await
    }

    pub async fn create(
        &self,
        name: String,
        code: String,
        description: Option<String>,
        sort: i32,
    ) -> Result<role::Model, AppError> {
        if name.is_empty() {
            return Err(AppError::bad_request(
                codes::NAME_EMPTY,
                "role name is required",
            ));
        }
        if code.is_empty() {
            return Err(AppError::bad_request(
                codes::CODE_EMPTY,
                "role code is required",
            ));
        }
        if self.daos.role().find_by_code(&code).await?.is_some() {
            return Err(AppError::conflict(
                codes::CODE_EXISTS,
                "role code is already taken",
            ));
        }
        Ok(self
            .daos
            .role()
            .create(NewRole {
                name,
                code,
                description,
                sort,
            })
            .await?)
    }

    /// `code` is immutable; `RoleChanges` has no field for it.
    pub async fn update(&self, id: i32, changes: RoleChanges) -> Result<role::Model, AppError> {
        let role = self.require_role(id).await?;
        Ok(self.daos.role().update(role, changes).await?)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.require_role(id).await?;
        Ok(self.daos.role().delete_cascading(id).await?)
    }

    pub async fn permissions_of(&self, id: i32) -> Result<Vec<permission::Model>, AppError> {
        self.require_role(id).await?;
        let ids = self.daos.rbac().permission_ids_of_role(id).await?;
        Ok(self.daos.permission().find_many(&ids).await?)
    }

    pub async fn assign_permissions(
        &self,
        id: i32,
        permission_ids: &[i32],
    ) -> Result<Vec<i32>, AppError> {
        self.require_role(id).await?;
        let unique = dedup_preserving_order(permission_ids);
        if !unique.is_empty() {
            let existing = self.daos.permission().count_existing(&unique).await?;
            if existing != unique.len() as u64 {
                return Err(AppError::bad_request(
                    codes::INVALID_PERMISSION_IDS,
                    "one or more permission ids do not exist",
                ));
            }
        }
        self.daos.rbac().replace_role_permissions(id, &unique).await?;
        Ok(unique)
    }

    pub async fn menus_of(&self, id: i32) -> Result<Vec<menu::Model>, AppError> {
        self.require_role(id).await?;
        let ids = self.daos.rbac().menu_ids_of_role(id).await?;
        Ok(self.daos.menu().find_many(&ids).await?)
    }

    pub async fn assign_menus(&self, id: i32, menu_ids: &[i32]) -> Result<Vec<i32>, AppError> {
        self.require_role(id).await?;
        let unique = dedup_preserving_order(menu_ids);
        if !unique.is_empty() {
            let existing = self.daos.menu().count_existing(&unique).await?;
            if existing != unique.len() as u64 {
                return Err(AppError::bad_request(
                    codes::INVALID_MENU_IDS,
                    "one or more menu ids do not exist",
                ));
            }
        }
        self.daos.rbac().replace_role_menus(id, &unique).await?;
        Ok(unique)
    }

    pub async fn users_of(&self, id: i32) -> Result<Vec<user::Model>, AppError> {
        self.require_role(id).await?;
        let ids = self.daos.rbac().user_ids_of_role(id).await?;
        Ok(self.daos.user().find_many(&ids).await?)
    }
}
