use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Navigation node. `parent_id = 0` marks a root; the tree is materialized in
/// memory by the menu tree builder, never through recursive queries. Flags use
/// 0/1 like `status` to stay wire-compatible with the admin SPA.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_id: i32,
    pub name: String,
    pub r#type: String,
    pub path: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub title: String,
    pub hidden: i16,
    pub always_show: i16,
    pub breadcrumb: i16,
    pub affix: i16,
    pub no_cache: i16,
    pub sort: i32,
    pub status: i16,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::permission::Entity")]
    Permissions,
    #[sea_orm(has_many = "super::role_menu::Entity")]
    RoleMenus,
}

impl Related<super::permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Permissions.def()
    }
}

impl Related<super::role_menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleMenus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
