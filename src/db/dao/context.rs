use sea_orm::DatabaseConnection;

use super::{MenuDao, PermissionDao, RbacDao, RoleDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        UserDao::new(&self.db)
    }

    pub fn role(&self) -> RoleDao {
        RoleDao::new(&self.db)
    }

    pub fn permission(&self) -> PermissionDao {
        PermissionDao::new(&self.db)
    }

    pub fn menu(&self) -> MenuDao {
        MenuDao::new(&self.db)
    }

    pub fn rbac(&self) -> RbacDao {
        RbacDao::new(&self.db)
    }
}
