use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

use super::entities::{menu, permission, role, role_menu, role_permission, user, user_role};

/// Creates every table the entities describe, skipping ones that already
/// exist. Ordered so foreign keys always point at a created table.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(role::Entity),
        schema.create_table_from_entity(menu::Entity),
        schema.create_table_from_entity(permission::Entity),
        schema.create_table_from_entity(user_role::Entity),
        schema.create_table_from_entity(role_permission::Entity),
        schema.create_table_from_entity(role_menu::Entity),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute_raw(backend.build(&*statement)).await?;
    }

    Ok(())
}
