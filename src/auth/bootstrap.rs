use crate::{
    access::SUPER_ADMIN_CODE,
    config::AuthConfig,
    db::dao::{DaoContext, NewRole, NewUser},
};

use super::password::hash_password;

/// Ensures the superadmin role and the configured admin account exist, and
/// that the account holds the role. Runs on every start; reruns are no-ops.
pub async fn seed_admin(cfg: &AuthConfig, daos: &DaoContext) -> anyhow::Result<()> {
    let role = match daos.role().find_by_code(SUPER_ADMIN_CODE).await? {
        Some(role) => role,
        None => {
            let role = daos
                .role()
                .create(NewRole {
                    name: "Super Admin".to_string(),
                    code: SUPER_ADMIN_CODE.to_string(),
                    description: Some("Bypasses all permission checks".to_string()),
                    sort: 0,
                })
                .await?;
            tracing::info!("seeded role {}", role.code);
            role
        }
    };

    let user = match daos.user().find_by_username(&cfg.admin_username).await? {
        Some(existing) => {
            tracing::info!("admin user already present: {}", existing.username);
            existing
        }
        None => {
            let hash = hash_password(&cfg.admin_password)
                .map_err(|err| anyhow::anyhow!("admin seed hash error: {err}"))?;
            let user = daos
                .user()
                .create(NewUser {
                    username: cfg.admin_username.clone(),
                    password_hash: hash,
                    nickname: Some("Administrator".to_string()),
                    email: None,
                    phone: None,
                })
                .await?;
            tracing::info!("seeded admin user {}", user.username);
            user
        }
    };

    let held = daos.rbac().role_ids_of_user(user.id).await?;
    if !held.contains(&role.id) {
        let mut role_ids = held;
        role_ids.push(role.id);
        daos.rbac().replace_user_roles(user.id, &role_ids).await?;
        tracing::info!("granted {} to {}", role.code, user.username);
    }

    Ok(())
}
