mod context;
pub mod error;
pub mod menu_dao;
pub mod permission_dao;
pub mod rbac_dao;
pub mod role_dao;
pub mod user_dao;

pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use menu_dao::{MenuDao, NewMenu};
pub use permission_dao::{NewPermission, PermissionDao};
pub use rbac_dao::RbacDao;
pub use role_dao::{NewRole, RoleDao};
pub use user_dao::{NewUser, UserDao};

/// Hard cap on page sizes accepted from clients.
pub const MAX_PAGE_SIZE: u64 = 100;

pub(crate) fn validate_pagination(page: u64, limit: u64) -> DaoResult<()> {
    if page == 0 || limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(DaoLayerError::InvalidPagination { page, limit });
    }
    Ok(())
}
