use std::collections::HashSet;

use serde::Serialize;

pub mod auth_service;
pub mod context;
pub mod menu_service;
pub mod menu_tree;
pub mod permission_service;
pub mod rbac_service;
pub mod role_service;
pub mod user_service;

pub use auth_service::{AuthService, SessionInfo};
pub use context::ServiceContext;
pub use menu_service::{MenuDraft, MenuService};
pub use menu_tree::{MenuNode, build_tree};
pub use permission_service::{PermissionService, PermissionWithMenu};
pub use rbac_service::RbacService;
pub use role_service::RoleService;
pub use user_service::{UserService, UserWithRoles};

/// One page of a listing plus the echo of the requested window.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Assignment inputs keep their order but never repeat; the first occurrence
/// wins.
pub(crate) fn dedup_preserving_order(ids: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
