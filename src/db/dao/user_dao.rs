use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Query,
};

use super::{DaoLayerError, DaoResult, validate_pagination};
use crate::db::entities::{user, user_role};

/// Optional filters for the paged user listing.
#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub keyword: Option<String>,
    pub status: Option<i16>,
    pub role_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl UserDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub async fn find_by_id(&self, id: i32) -> DaoResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    pub async fn find_many(&self, ids: &[i32]) -> DaoResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(user::Entity::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Newest accounts first; `role_id` restricts to members of that role.
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: &UserFilter,
    ) -> DaoResult<(Vec<user::Model>, u64)> {
        validate_pagination(page, limit)?;

        let mut query = user::Entity::find();
        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.is_empty()) {
            let pattern = format!("%{keyword}%");
            query = query.filter(
                Condition::any()
                    .add(user::Column::Username.like(&pattern))
                    .add(user::Column::Nickname.like(&pattern))
                    .add(user::Column::Email.like(&pattern))
                    .add(user::Column::Phone.like(&pattern)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(user::Column::Status.eq(status));
        }
        if let Some(role_id) = filter.role_id {
            query = query.filter(
                user::Column::Id.in_subquery(
                    Query::select()
                        .column(user_role::Column::UserId)
                        .from(user_role::Entity)
                        .and_where(user_role::Column::RoleId.eq(role_id))
                        .to_owned(),
                ),
            );
        }

        let paginator = query
            .order_by_desc(user::Column::Id)
            .paginate(&self.db, limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;
        Ok((rows, total))
    }

    pub async fn create(&self, new_user: NewUser) -> DaoResult<user::Model> {
        let now = Utc::now().naive_utc();
        let active = user::ActiveModel {
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            nickname: Set(new_user.nickname),
            email: Set(new_user.email),
            phone: Set(new_user.phone),
            status: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    pub async fn update_profile(
        &self,
        model: user::Model,
        changes: ProfileChanges,
    ) -> DaoResult<user::Model> {
        let mut active = model.into_active_model();
        if let Some(nickname) = changes.nickname {
            active.nickname = Set(Some(nickname));
        }
        if let Some(avatar) = changes.avatar {
            active.avatar = Set(Some(avatar));
        }
        if let Some(email) = changes.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    pub async fn set_status(&self, model: user::Model, status: i16) -> DaoResult<user::Model> {
        let mut active = model.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    pub async fn set_password(
        &self,
        model: user::Model,
        password_hash: String,
    ) -> DaoResult<user::Model> {
        let mut active = model.into_active_model();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    pub async fn record_login(&self, model: user::Model, ip: Option<String>) -> DaoResult<user::Model> {
        let mut active = model.into_active_model();
        active.last_login_time = Set(Some(Utc::now().naive_utc()));
        active.last_login_ip = Set(ip);
        Ok(active.update(&self.db).await?)
    }

    /// Removes the account and its role memberships in one transaction.
    pub async fn delete_cascading(&self, id: i32) -> DaoResult<()> {
        let txn = self.db.begin().await?;
        user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        let result = user::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DaoLayerError::NotFound { entity: "user", id });
        }
        txn.commit().await?;
        Ok(())
    }
}
