use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{DaoLayerError, DaoResult};
use crate::db::entities::{menu, role_menu};

#[derive(Debug, Clone)]
pub struct NewMenu {
    pub parent_id: i32,
    pub name: String,
    pub r#type: String,
    pub path: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub title: String,
    pub hidden: i16,
    pub always_show: i16,
    pub breadcrumb: i16,
    pub affix: i16,
    pub no_cache: i16,
    pub sort: i32,
    pub status: i16,
}

#[derive(Debug, Default, Clone)]
pub struct MenuChanges {
    pub parent_id: Option<i32>,
    pub name: Option<String>,
    pub r#type: Option<String>,
    pub path: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub title: Option<String>,
    pub hidden: Option<i16>,
    pub always_show: Option<i16>,
    pub breadcrumb: Option<i16>,
    pub affix: Option<i16>,
    pub no_cache: Option<i16>,
    pub sort: Option<i32>,
    pub status: Option<i16>,
}

#[derive(Clone)]
pub struct MenuDao {
    db: DatabaseConnection,
}

impl MenuDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub async fn find_by_id(&self, id: i32) -> DaoResult<Option<menu::Model>> {
        Ok(menu::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_many(&self, ids: &[i32]) -> DaoResult<Vec<menu::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(menu::Entity::find()
            .filter(menu::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(menu::Column::Sort)
            .order_by_asc(menu::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn count_existing(&self, ids: &[i32]) -> DaoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        Ok(menu::Entity::find()
            .filter(menu::Column::Id.is_in(ids.to_vec()))
            .count(&self.db)
            .await?)
    }

    /// Bulk load for tree building, in (sort, id) order. The tree builder
    /// works over this one result set instead of querying per node.
    pub async fn all(&self, status: Option<i16>) -> DaoResult<Vec<menu::Model>> {
        let mut query = menu::Entity::find();
        if let Some(status) = status {
            query = query.filter(menu::Column::Status.eq(status));
        }
        Ok(query
            .order_by_asc(menu::Column::Sort)
            .order_by_asc(menu::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn has_children(&self, id: i32) -> DaoResult<bool> {
        let count = menu::Entity::find()
            .filter(menu::Column::ParentId.eq(id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, new_menu: NewMenu) -> DaoResult<menu::Model> {
        let now = Utc::now().naive_utc();
        let active = menu::ActiveModel {
            parent_id: Set(new_menu.parent_id),
            name: Set(new_menu.name),
            r#type: Set(new_menu.r#type),
            path: Set(new_menu.path),
            component: Set(new_menu.component),
            redirect: Set(new_menu.redirect),
            icon: Set(new_menu.icon),
            title: Set(new_menu.title),
            hidden: Set(new_menu.hidden),
            always_show: Set(new_menu.always_show),
            breadcrumb: Set(new_menu.breadcrumb),
            affix: Set(new_menu.affix),
            no_cache: Set(new_menu.no_cache),
            sort: Set(new_menu.sort),
            status: Set(new_menu.status),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    pub async fn update(&self, model: menu::Model, changes: MenuChanges) -> DaoResult<menu::Model> {
        let mut active = model.into_active_model();
        if let Some(parent_id) = changes.parent_id {
            active.parent_id = Set(parent_id);
        }
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(kind) = changes.r#type {
            active.r#type = Set(kind);
        }
        if let Some(path) = changes.path {
            active.path = Set(Some(path));
        }
        if let Some(component) = changes.component {
            active.component = Set(Some(component));
        }
        if let Some(redirect) = changes.redirect {
            active.redirect = Set(Some(redirect));
        }
        if let Some(icon) = changes.icon {
            active.icon = Set(Some(icon));
        }
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(hidden) = changes.hidden {
            active.hidden = Set(hidden);
        }
        if let Some(always_show) = changes.always_show {
            active.always_show = Set(always_show);
        }
        if let Some(breadcrumb) = changes.breadcrumb {
            active.breadcrumb = Set(breadcrumb);
        }
        if let Some(affix) = changes.affix {
            active.affix = Set(affix);
        }
        if let Some(no_cache) = changes.no_cache {
            active.no_cache = Set(no_cache);
        }
        if let Some(sort) = changes.sort {
            active.sort = Set(sort);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// Removes the menu and any role links referencing it in one transaction.
    /// Child checks belong to the service layer.
    pub async fn delete_cascading(&self, id: i32) -> DaoResult<()> {
        let txn = self.db.begin().await?;
        role_menu::Entity::delete_many()
            .filter(role_menu::Column::MenuId.eq(id))
            .exec(&txn)
            .await?;
        let result = menu::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DaoLayerError::NotFound { entity: "menu", id });
        }
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    #[tokio::test]
    async fn find_by_id_returns_none_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<menu::Model>::new()])
            .into_connection();
        let dao = MenuDao::new(&db);

        let found = dao.find_by_id(99).await.expect("query ok");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn count_existing_skips_query_for_empty_ids() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = MenuDao::new(&db);

        assert_eq!(dao.count_existing(&[]).await.expect("no query"), 0);
    }
}
