use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::db::dao::DaoContext;
use crate::db::dao::permission_dao::{NewPermission, PermissionChanges, PermissionFilter};
use crate::db::entities::permission;
use crate::error::{AppError, codes};
use crate::services::Page;

/// Bucket label for active permissions whose menu link is unset or points at
/// a vanished menu.
const UNGROUPED: &str = "ungrouped";

#[derive(Debug, Serialize)]
pub struct MenuSummary {
    pub id: i32,
    pub name: String,
    pub title: String,
}

/// Detail row: the permission plus a summary of the menu it belongs to.
#[derive(Debug, Serialize)]
pub struct PermissionWithMenu {
    #[serde(flatten)]
    pub permission: permission::Model,
    pub menu: Option<MenuSummary>,
}

#[derive(Clone)]
pub struct PermissionService {
    daos: DaoContext,
}

impl PermissionService {
    pub fn new(daos: DaoContext) -> Self {
        Self { daos }
    }

    fn ensure_valid_id(id: i32) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::bad_request(
                codes::INVALID_PERMISSION_ID,
                "permission id is invalid",
            ));
        }
        Ok(())
    }

    async fn require_permission(&self, id: i32) -> Result<permission::Model, AppError> {
        Self::ensure_valid_id(id)?;
        self.daos
            .permission()
            .find_by_id(id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(codes::PERMISSION_NOT_FOUND, "permission does not exist")
            })
    }

    /// A referenced menu must exist; the permission side never stores a
    /// dangling link.
    async fn ensure_menu_exists(&self, menu_id: i32) -> Result<(), AppError> {
        if self.daos.menu().find_by_id(menu_id).await?.is_none() {
            return Err(AppError::bad_request(
                codes::MENU_NOT_FOUND,
                "menu does not exist",
            ));
        }
        Ok(())
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: &PermissionFilter,
    ) -> Result<Page<permission::Model>, AppError> {
        let (list, total) = self.daos.permission().list(page, limit, filter).await?;
        Ok(Page {
            list,
            total,
            page,
            limit,
        })
    }

    /// Active permissions bucketed by the title of their owning menu, each
    /// bucket in (sort, id) order.
    pub async fn grouped(
        &self,
    ) -> Result<BTreeMap<String, Vec<permission::Model>>, AppError> {
        let permissions = self.daos.permission().all_active().await?;
        let menu_ids: Vec<i32> = permissions
            .iter()
            .filter_map(|p| p.menu_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let titles: HashMap<i32, String> = self
            .daos
            .menu()
            .find_many(&menu_ids)
            .await?
            .into_iter()
            .map(|menu| (menu.id, menu.title))
            .collect();

        let mut grouped: BTreeMap<String, Vec<permission::Model>> = BTreeMap::new();
        for permission in permissions {
            let bucket = permission
                .menu_id
                .and_then(|id| titles.get(&id).cloned())
                .unwrap_or_else(|| UNGROUPED.to_string());
            grouped.entry(bucket).or_default().push(permission);
        }
        Ok(grouped)
    }

    pub async fn detail(&self, id: i32) -> Result<PermissionWithMenu, AppError> {
        let permission = self.require_permission(id).await?;
        let menu = match permission.menu_id {
            Some(menu_id) => self
                .daos
                .menu()
                .find_by_id(menu_id)
                .await?
                .map(|menu| MenuSummary {
                    id: menu.id,
                    name: menu.name,
                    title: menu.title,
                }),
            None => None,
        };
        Ok(PermissionWithMenu { permission, menu })
    }

    pub async fn create(
        &self,
        menu_id: Option<i32>,
        name: String,
        code: String,
        r#type: Option<String>,
        description: Option<String>,
        sort: i32,
        status: i16,
    ) -> Result<permission::Model, AppError> {
        if name.is_empty() {
            return Err(AppError::bad_request(
                codes::NAME_EMPTY,
                "permission name is required",
            ));
        }
        if code.is_empty() {
            return Err(AppError::bad_request(
                codes::CODE_EMPTY,
                "permission code is required",
            ));
        }
        if self.daos.permission().find_by_code(&code).await?.is_some() {
            return Err(AppError::conflict(
                codes::CODE_EXISTS,
                "permission code is already taken",
            ));
        }
        if let Some(menu_id) = menu_id {
            self.ensure_menu_exists(menu_id).await?;
        }

        Ok(self
            .daos
            .permission()
            .create(NewPermission {
                menu_id,
                name,
                code,
                r#type: r#type
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "api".to_string()),
                description,
                sort,
                status,
            })
            .await?)
    }

    /// `code` and `type` are immutable; `PermissionChanges` carries neither.
    pub async fn update(
        &self,
        id: i32,
        changes: PermissionChanges,
    ) -> Result<permission::Model, AppError> {
        let permission = self.require_permission(id).await?;
        if let Some(menu_id) = changes.menu_id {
            self.ensure_menu_exists(menu_id).await?;
        }
        Ok(self.daos.permission().update(permission, changes).await?)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.require_permission(id).await?;
        Ok(self.daos.permission().delete_cascading(id).await?)
    }
}
