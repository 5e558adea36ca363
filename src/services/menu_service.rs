use crate::db::dao::DaoContext;
use crate::db::dao::menu_dao::{MenuChanges, NewMenu};
use crate::db::entities::menu;
use crate::error::{AppError, codes};
use crate::services::menu_tree::{MenuNode, build_tree};

/// Creation input; every `None` falls back to the documented default.
#[derive(Debug, Default, Clone)]
pub struct MenuDraft {
    pub parent_id: Option<i32>,
    pub name: String,
    pub r#type: Option<String>,
    pub path: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub title: String,
    pub hidden: Option<i16>,
    pub always_show: Option<i16>,
    pub breadcrumb: Option<i16>,
    pub affix: Option<i16>,
    pub no_cache: Option<i16>,
    pub sort: Option<i32>,
    pub status: Option<i16>,
}

#[derive(Clone)]
pub struct MenuService {
    daos: DaoContext,
}

impl MenuService {
    pub fn new(daos: DaoContext) -> Self {
        Self { daos }
    }

    fn ensure_valid_id(id: i32) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::bad_request(
                codes::INVALID_MENU_ID,
                "menu id is invalid",
            ));
        }
        Ok(())
    }

    async fn require_menu(&self, id: i32) -> Result<menu::Model, AppError> {
        Self::ensure_valid_id(id)?;
        self.daos
            .menu()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(codes::MENU_NOT_FOUND, "menu does not exist"))
    }

    /// Management listing: the subtree under `parent_id`, optionally filtered
    /// by status, from one bulk query.
    pub async fn admin_list(
        &self,
        parent_id: i32,
        status: Option<i16>,
    ) -> Result<Vec<MenuNode>, AppError> {
        let rows = self.daos.menu().all(status).await?;
        Ok(build_tree(&rows, parent_id))
    }

    /// Picker tree: active menus only, from the root.
    pub async fn tree(&self) -> Result<Vec<MenuNode>, AppError> {
        let rows = self.daos.menu().all(Some(1)).await?;
        Ok(build_tree(&rows, 0))
    }

    pub async fn detail(&self, id: i32) -> Result<menu::Model, AppError> {
        self.require_menu(id).await
    }

    fn materialize(draft: MenuDraft) -> Result<NewMenu, AppError> {
        if draft.name.is_empty() {
            return Err(AppError::bad_request(
                codes::NAME_EMPTY,
                "menu name is required",
            ));
        }
        if draft.title.is_empty() {
            return Err(AppError::bad_request(
                codes::TITLE_EMPTY,
                "menu title is required",
            ));
        }
        Ok(NewMenu {
            parent_id: draft.parent_id.unwrap_or(0),
            name: draft.name,
            r#type: draft
                .r#type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "menu".to_string()),
            path: draft.path,
            component: draft.component,
            redirect: draft.redirect,
            icon: draft.icon,
            title: draft.title,
            hidden: draft.hidden.unwrap_or(0),
            always_show: draft.always_show.unwrap_or(0),
            breadcrumb: draft.breadcrumb.unwrap_or(1),
            affix: draft.affix.unwrap_or(0),
            no_cache: draft.no_cache.unwrap_or(0),
            sort: draft.sort.unwrap_or(0),
            status: draft.status.unwrap_or(1),
        })
    }

    pub async fn create(&self, draft: MenuDraft) -> Result<menu::Model, AppError> {
        let new_menu = Self::materialize(draft)?;
        Ok(self.daos.menu().create(new_menu).await?)
    }

    pub async fn update(&self, id: i32, changes: MenuChanges) -> Result<menu::Model, AppError> {
        let menu = self.require_menu(id).await?;
        if changes.parent_id == Some(id) {
            return Err(AppError::bad_request(
                codes::INVALID_PARENT_ID,
                "a menu cannot be its own parent",
            ));
        }
        Ok(self.daos.menu().update(menu, changes).await?)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        self.require_menu(id).await?;
        if self.daos.menu().has_children(id).await? {
            return Err(AppError::bad_request(
                codes::HAS_CHILDREN,
                "menu still has children",
            ));
        }
        Ok(self.daos.menu().delete_cascading(id).await?)
    }
}
