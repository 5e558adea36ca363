use sea_orm::DatabaseConnection;

use crate::auth::TokenService;
use crate::db::dao::DaoContext;
use crate::state::AppState;

use super::{
    AuthService, MenuService, PermissionService, RbacService, RoleService, UserService,
};

/// Hands out service instances over one shared connection pool; handlers
/// build the one they need per request.
#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    tokens: TokenService,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, tokens: TokenService) -> Self {
        Self {
            daos: DaoContext::new(db),
            tokens,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, state.tokens.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.daos.clone(), self.tokens.clone())
    }

    pub fn rbac(&self) -> RbacService {
        RbacService::new(self.daos.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.daos.clone())
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(self.daos.clone())
    }

    pub fn menus(&self) -> MenuService {
        MenuService::new(self.daos.clone())
    }

    pub fn permissions(&self) -> PermissionService {
        PermissionService::new(self.daos.clone())
    }
}
