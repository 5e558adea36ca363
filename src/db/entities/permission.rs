use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Permission code checked by the route guard. `menu_id` ties the code to the
/// menu it belongs to for grouping; `r#type` is a free-form label
/// (conventionally `api`, `menu` or `button`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub menu_id: Option<i32>,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub r#type: String,
    pub description: Option<String>,
    pub sort: i32,
    pub status: i16,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::menu::Entity",
        from = "Column::MenuId",
        to = "super::menu::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Menu,
    #[sea_orm(has_many = "super::role_permission::Entity")]
    RolePermissions,
}

impl Related<super::menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menu.def()
    }
}

impl Related<super::role_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
