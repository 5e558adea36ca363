use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{DaoLayerError, DaoResult, validate_pagination};
use crate::db::entities::{permission, role_permission};

#[derive(Debug, Default, Clone)]
pub struct PermissionFilter {
    pub keyword: Option<String>,
    pub r#type: Option<String>,
    pub menu_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewPermission {
    pub menu_id: Option<i32>,
    pub name: String,
    pub code: String,
    pub r#type: String,
    pub description: Option<String>,
    pub sort: i32,
    pub status: i16,
}

/// Partial permission update. `code` and `type` are immutable once created.
#[derive(Debug, Default, Clone)]
pub struct PermissionChanges {
    pub menu_id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort: Option<i32>,
    pub status: Option<i16>,
}

#[derive(Clone)]
pub struct PermissionDao {
    db: DatabaseConnection,
}

impl PermissionDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub async fn find_by_id(&self, id: i32) -> DaoResult<Option<permission::Model>> {
        Ok(permission::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_by_code(&self, code: &str) -> DaoResult<Option<permission::Model>> {
        Ok(permission::Entity::find()
            .filter(permission::Column::Code.eq(code))
            .one(&self.db)
            .await?)
    }

    pub async fn find_many(&self, ids: &[i32]) -> DaoResult<Vec<permission::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(permission::Entity::find()
            .filter(permission::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(permission::Column::Sort)
            .order_by_asc(permission::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn count_existing(&self, ids: &[i32]) -> DaoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        Ok(permission::Entity::find()
            .filter(permission::Column::Id.is_in(ids.to_vec()))
            .count(&self.db)
            .await?)
    }

    /// Active permissions in grouping order, for the grouped listing.
    pub async fn all_active(&self) -> DaoResult<Vec<permission::Model>> {
        Ok(permission::Entity::find()
            .filter(permission::Column::Status.eq(1i16))
            .order_by_asc(permission::Column::Sort)
            .order_by_asc(permission::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: &PermissionFilter,
    ) -> DaoResult<(Vec<permission::Model>, u64)> {
        validate_pagination(page, limit)?;

        let mut query = permission::Entity::find();
        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.is_empty()) {
            let pattern = format!("%{keyword}%");
            query = query.filter(
                Condition::any()
                    .add(permission::Column::Name.like(&pattern))
                    .add(permission::Column::Code.like(&pattern))
                    .add(permission::Column::Description.like(&pattern)),
            );
        }
        if let Some(kind) = filter.r#type.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(permission::Column::Type.eq(kind));
        }
        if let Some(menu_id) = filter.menu_id {
            query = query.filter(permission::Column::MenuId.eq(menu_id));
        }

        let paginator = query
            .order_by_asc(permission::Column::Sort)
            .order_by_desc(permission::Column::Id)
            .paginate(&self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;
        Ok((rows, total))
    }

    pub async fn create(&self, new_permission: NewPermission) -> DaoResult<permission::Model> {
        let now = Utc::now().naive_utc();
        let active = permission::ActiveModel {
            menu_id: Set(new_permission.menu_id),
            name: Set(new_permission.name),
            code: Set(new_permission.code),
            r#type: Set(new_permission.r#type),
            description: Set(new_permission.description),
            sort: Set(new_permission.sort),
            status: Set(new_permission.status),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    pub async fn update(
        &self,
        model: permission::Model,
        changes: PermissionChanges,
    ) -> DaoResult<permission::Model> {
        let mut active = model.into_active_model();
        if let Some(menu_id) = changes.menu_id {
            active.menu_id = Set(Some(menu_id));
        }
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
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

    /// Removes the permission and any role grants referencing it in one
    /// transaction.
    pub async fn delete_cascading(&self, id: i32) -> DaoResult<()> {
        let txn = self.db.begin().await?;
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::PermissionId.eq(id))
            .exec(&txn)
            .await?;
        let result = permission::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DaoLayerError::NotFound {
                entity: "permission",
                id,
            });
        }
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    fn sample_permission(id: i32, code: &str) -> permission::Model {
        let ts = NaiveDate::from_ymd_opt(2026, 1, 1)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time");
        permission::Model {
            id,
            menu_id: None,
            name: format!("perm-{id}"),
            code: code.to_string(),
            r#type: "api".to_string(),
            description: None,
            sort: 0,
            status: 1,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[tokio::test]
    async fn find_by_code_returns_match() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[sample_permission(5, "user:list")]])
            .into_connection();
        let dao = PermissionDao::new(&db);

        let found = dao.find_by_code("user:list").await.expect("query ok");
        assert_eq!(found.map(|p| p.code), Some("user:list".to_string()));
    }

    #[tokio::test]
    async fn find_many_short_circuits_on_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = PermissionDao::new(&db);

        let rows = dao.find_many(&[]).await.expect("no query issued");
        assert!(rows.is_empty());
    }
}
