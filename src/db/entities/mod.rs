pub mod menu;
pub mod permission;
pub mod role;
pub mod role_menu;
pub mod role_permission;
pub mod user;
pub mod user_role;
