use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::DaoResult;
use crate::db::entities::{permission, role, role_menu, role_permission, user_role};

/// Queries and replacements over the three membership tables. Reads are
/// chained id lookups rather than joins so each step stays independently
/// testable; writes replace a membership set wholesale inside one
/// transaction.
#[derive(Clone)]
pub struct RbacDao {
    db: DatabaseConnection,
}

impl RbacDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub async fn role_ids_of_user(&self, user_id: i32) -> DaoResult<Vec<i32>> {
        let rows = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| row.role_id).collect())
    }

    /// Every role the user holds, any status, in (sort, id) order.
    pub async fn roles_of_user(&self, user_id: i32) -> DaoResult<Vec<role::Model>> {
        let ids = self.role_ids_of_user(user_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(role::Entity::find()
            .filter(role::Column::Id.is_in(ids))
            .order_by_asc(role::Column::Sort)
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn active_role_ids_of_user(&self, user_id: i32) -> DaoResult<Vec<i32>> {
        let ids = self.role_ids_of_user(user_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let roles = role::Entity::find()
            .filter(role::Column::Id.is_in(ids))
            .filter(role::Column::Status.eq(1i16))
            .all(&self.db)
            .await?;
        Ok(roles.into_iter().map(|r| r.id).collect())
    }

    /// Whether the user holds a role with this code. Status is deliberately
    /// not consulted: a disabled superadmin role still bypasses checks.
    pub async fn has_role_code(&self, user_id: i32, code: &str) -> DaoResult<bool> {
        let ids = self.role_ids_of_user(user_id).await?;
        if ids.is_empty() {
            return Ok(false);
        }
        let count = role::Entity::find()
            .filter(role::Column::Id.is_in(ids))
            .filter(role::Column::Code.eq(code))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn permission_ids_of_role(&self, role_id: i32) -> DaoResult<Vec<i32>> {
        let rows = role_permission::Entity::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| row.permission_id).collect())
    }

    pub async fn menu_ids_of_role(&self, role_id: i32) -> DaoResult<Vec<i32>> {
        let rows = role_menu::Entity::find()
            .filter(role_menu::Column::RoleId.eq(role_id))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| row.menu_id).collect())
    }

    pub async fn user_ids_of_role(&self, role_id: i32) -> DaoResult<Vec<i32>> {
        let rows = user_role::Entity::find()
            .filter(user_role::Column::RoleId.eq(role_id))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| row.user_id).collect())
    }

    /// Codes of active permissions granted through any of the given roles,
    /// in whatever order the database returns them.
    pub async fn permission_codes_for_roles(&self, role_ids: &[i32]) -> DaoResult<Vec<String>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let grants = role_permission::Entity::find()
            .filter(role_permission::Column::RoleId.is_in(role_ids.to_vec()))
            .all(&self.db)
            .await?;
        let permission_ids: Vec<i32> = grants.into_iter().map(|g| g.permission_id).collect();
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }
        let permissions = permission::Entity::find()
            .filter(permission::Column::Id.is_in(permission_ids))
            .filter(permission::Column::Status.eq(1i16))
            .all(&self.db)
            .await?;
        Ok(permissions.into_iter().map(|p| p.code).collect())
    }

    pub async fn menu_ids_for_roles(&self, role_ids: &[i32]) -> DaoResult<Vec<i32>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = role_menu::Entity::find()
            .filter(role_menu::Column::RoleId.is_in(role_ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| row.menu_id).collect())
    }

    /// (user_id, role) pairs for a batch of users, used to decorate the user
    /// listing without a query per row.
    pub async fn roles_for_users(&self, user_ids: &[i32]) -> DaoResult<Vec<(i32, role::Model)>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let links = user_role::Entity::find()
            .filter(user_role::Column::UserId.is_in(user_ids.to_vec()))
            .all(&self.db)
            .await?;
        let role_ids: Vec<i32> = links
            .iter()
            .map(|link| link.role_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let roles = role::Entity::find()
            .filter(role::Column::Id.is_in(role_ids))
            .order_by_asc(role::Column::Sort)
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?;
        let by_id: HashMap<i32, role::Model> =
            roles.into_iter().map(|role| (role.id, role)).collect();

        let mut pairs = Vec::with_capacity(links.len());
        for link in links {
            if let Some(role) = by_id.get(&link.role_id) {
                pairs.push((link.user_id, role.clone()));
            }
        }
        Ok(pairs)
    }

    pub async fn replace_user_roles(&self, user_id: i32, role_ids: &[i32]) -> DaoResult<()> {
        let txn = self.db.begin().await?;
        user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        if !role_ids.is_empty() {
            let now = Utc::now().naive_utc();
            let rows = role_ids.iter().map(|&role_id| user_role::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(role_id),
                created_at: Set(now),
                ..Default::default()
            });
            user_role::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn replace_role_permissions(
        &self,
        role_id: i32,
        permission_ids: &[i32],
    ) -> DaoResult<()> {
        let txn = self.db.begin().await?;
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        if !permission_ids.is_empty() {
            let now = Utc::now().naive_utc();
            let rows = permission_ids
                .iter()
                .map(|&permission_id| role_permission::ActiveModel {
                    role_id: Set(role_id),
                    permission_id: Set(permission_id),
                    created_at: Set(now),
                    ..Default::default()
                });
            role_permission::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn replace_role_menus(&self, role_id: i32, menu_ids: &[i32]) -> DaoResult<()> {
        let txn = self.db.begin().await?;
        role_menu::Entity::delete_many()
            .filter(role_menu::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        if !menu_ids.is_empty() {
            let now = Utc::now().naive_utc();
            let rows = menu_ids.iter().map(|&menu_id| role_menu::ActiveModel {
                role_id: Set(role_id),
                menu_id: Set(menu_id),
                created_at: Set(now),
                ..Default::default()
            });
            role_menu::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;
    use crate::db::entities::{role, user_role};

    fn ts() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
    }

    fn link(id: i32, user_id: i32, role_id: i32) -> user_role::Model {
        user_role::Model {
            id,
            user_id,
            role_id,
            created_at: ts(),
        }
    }

    fn sample_role(id: i32, code: &str) -> role::Model {
        role::Model {
            id,
            name: format!("role-{id}"),
            code: code.to_string(),
            description: None,
            sort: 0,
            status: 1,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[tokio::test]
    async fn has_role_code_false_without_memberships() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user_role::Model>::new()])
            .into_connection();
        let dao = RbacDao::new(&db);

        let held = dao.has_role_code(7, "super_admin").await.expect("query ok");
        assert!(!held);
    }

    #[tokio::test]
    async fn permission_codes_skip_queries_for_empty_roles() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = RbacDao::new(&db);

        let codes = dao
            .permission_codes_for_roles(&[])
            .await
            .expect("no query issued");
        assert!(codes.is_empty());
    }

    #[tokio::test]
    async fn roles_for_users_pairs_links_with_models() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![link(1, 10, 1), link(2, 11, 1), link(3, 11, 2)]])
            .append_query_results([vec![sample_role(1, "editor"), sample_role(2, "viewer")]])
            .into_connection();
        let dao = RbacDao::new(&db);

        let pairs = dao.roles_for_users(&[10, 11]).await.expect("query ok");
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].0, 10);
        assert_eq!(pairs[0].1.code, "editor");
        assert_eq!(pairs[2].0, 11);
        assert_eq!(pairs[2].1.code, "viewer");
    }

    #[tokio::test]
    async fn replace_user_roles_with_empty_set_only_clears() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let dao = RbacDao::new(&db);

        dao.replace_user_roles(5, &[]).await.expect("replace ok");
    }
}
