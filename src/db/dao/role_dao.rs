use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{DaoLayerError, DaoResult, validate_pagination};
use crate::db::entities::{role, role_menu, role_permission, user_role};

#[derive(Debug, Default, Clone)]
pub struct RoleFilter {
    pub keyword: Option<String>,
    pub status: Option<i16>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub sort: i32,
}

/// Partial role update. `code` is immutable once created.
#[derive(Debug, Default, Clone)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort: Option<i32>,
    pub status: Option<i16>,
}

#[derive(Clone)]
pub struct RoleDao {
    db: DatabaseConnection,
}

impl RoleDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub async fn find_by_id(&self, id: i32) -> DaoResult<Option<role::Model>> {
        Ok(role::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_by_code(&self, code: &str) -> DaoResult<Option<role::Model>> {
        Ok(role::Entity::find()
            .filter(role::Column::Code.eq(code))
            .one(&self.db)
            .await?)
    }

    pub async fn find_many(&self, ids: &[i32]) -> DaoResult<Vec<role::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(role::Entity::find()
            .filter(role::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(role::Column::Sort)
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// How many of the given ids actually exist; used to validate assignment
    /// input before replacing a membership set.
    pub async fn count_existing(&self, ids: &[i32]) -> DaoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        Ok(role::Entity::find()
            .filter(role::Column::Id.is_in(ids.to_vec()))
            .count(&self.db)
            .await?)
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: &RoleFilter,
    ) -> DaoResult<(Vec<role::Model>, u64)> {
        validate_pagination(page, limit)?;

        let mut query = role::Entity::find();
        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.is_empty()) {
            let pattern = format!("%{keyword}%");
            query = query.filter(
                Condition::any()
                    .add(role::Column::Name.like(&pattern))
                    .add(role::Column::Code.like(&pattern))
                    .add(role::Column::Description.like(&pattern)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(role::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_asc(role::Column::Sort)
            .order_by_desc(role::Column::Id)
            .paginate(&self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;
        Ok((rows, total))
    }

    pub async fn create(&self, new_role: NewRole) -> DaoResult<role::Model> {
        let now = Utc::now().naive_utc();
        let active = role::ActiveModel {
            name: Set(new_role.name),
            code: Set(new_role.code),
            description: Set(new_role.description),
            sort: Set(new_role.sort),
            status: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    pub async fn update(&self, model: role::Model, changes: RoleChanges) -> DaoResult<role::Model> {
        let mut active = model.into_active_model();
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

    /// Removes the role together with its memberships, grants and menu links
    /// in one transaction.
    pub async fn delete_cascading(&self, id: i32) -> DaoResult<()> {
        let txn = self.db.begin().await?;
        user_role::Entity::delete_many()
            .filter(user_role::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;
        role_menu::Entity::delete_many()
            .filter(role_menu::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;
        let result = role::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DaoLayerError::NotFound { entity: "role", id });
        }
        txn.commit().await?;
        Ok(())
    }
}
