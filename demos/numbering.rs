//! Sets up a party, issues a few numbers and checks a user's permissions.
//!
//! Run with `cargo run --example numbering [config.toml]`.
use anyhow::Context;
use party_registry::{
    AuthorizationService, Authorizer, Config, PermissionRegistry, Purpose, SequenceError,
    SequenceService, ids,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(Path::new(&path))?,
        None => Config::default(),
    };
    let db = Arc::new(config.storage.open()?);

    let sequences = SequenceService::with_config(db.clone(), &config.numbering)?;
    for (purpose, prefix) in [(Purpose::Article, "AEC-05-A"), (Purpose::Order, "AEC-05-B")] {
        match sequences.create_sequence("aec-05", purpose, prefix) {
            Ok(_) | Err(SequenceError::DuplicateSequence { .. }) => {}
            Err(err) => return Err(err.into()),
        }
    }

    for _ in 0..3 {
        let number = sequences
            .generate_order_number("aec-05")
            .context("order placement failed")?;
        tracing::info!(%number, "placed order");
    }
    let article = sequences.generate_article_number("aec-05")?;
    tracing::info!(%article, "created article");

    let registry = Arc::new(PermissionRegistry::for_mode(config.app.mode)?);
    let roles = Arc::new(AuthorizationService::new(db.clone())?);
    let user_id = ids::new_user_id()?;

    if roles.find_role("shop_clerk")?.is_none() {
        roles.create_role("shop_clerk", "Shop clerk")?;
        for permission_id in ["shop_order.view", "shop_order.mark_as_paid", "legacy.export"] {
            roles.create_permission(permission_id, permission_id)?;
            roles.assign_permission_to_role(permission_id, "shop_clerk")?;
        }
    }
    roles.assign_role_to_user("shop_clerk", &user_id, None)?;

    // a bootstrap admin gets every role there is
    let admin_id = ids::new_user_id()?;
    for role_id in roles.get_all_role_ids()? {
        roles.assign_role_to_user(&role_id, &admin_id, None)?;
    }
    for (role, permissions) in roles.get_permissions_by_roles_with_titles()? {
        tracing::info!(role = %role.title, permissions = permissions.len(), "role");
    }

    let authorizer = Authorizer::new(roles, registry);
    for permission in authorizer.permissions_for_user(&user_id)? {
        tracing::info!(user_id, %permission, "granted");
    }

    db.flush()?;
    Ok(())
}
