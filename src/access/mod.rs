pub mod layer;
pub mod route_table;

pub use layer::PermissionLayer;
pub use route_table::RouteTable;

/// Role code that bypasses every permission check.
pub const SUPER_ADMIN_CODE: &str = "super_admin";
