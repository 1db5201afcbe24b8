//! tenantfs - Entry Point
//!
//! Loads configuration, prepares the storage root and bootstraps the admin
//! account. Request handling lives in the layer that embeds this crate.

use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;

use tenantfs::auth::{Argon2Hasher, UserStore};
use tenantfs::config::ServerConfig;
use tenantfs::error::UserStoreError;
use tenantfs::storage::FileStore;
use tenantfs::utils::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    info!("Starting tenantfs...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(default_limit) = config.default_storage_limit_bytes() else {
        error!(
            "Invalid default_storage_limit {:?}",
            config.default_storage_limit
        );
        return ExitCode::FAILURE;
    };

    let root = config.storage_root_path();
    if let Err(e) = tokio::fs::create_dir_all(&root).await {
        error!("Failed to create storage root {}: {e}", root.display());
        return ExitCode::FAILURE;
    }

    let store = match FileStore::with_root(&root, config.path_comparison) {
        Ok(store) => store,
        Err(e) => {
            error!("Invalid storage root {}: {e}", root.display());
            return ExitCode::FAILURE;
        }
    };

    if let Some(bootstrap) = &config.bootstrap {
        let users = match UserStore::new(&root, &bootstrap.tenant, Arc::new(Argon2Hasher::new())) {
            Ok(users) => users.with_metadata_file_name(&config.metadata_file_name),
            Err(e) => {
                error!("Invalid bootstrap tenant: {e}");
                return ExitCode::FAILURE;
            }
        };

        match users
            .try_create(
                &bootstrap.username,
                &bootstrap.password,
                true,
                Some(default_limit),
            )
            .await
        {
            Ok(_) => info!(
                "Bootstrapped admin {:?} for tenant {:?}",
                bootstrap.username, bootstrap.tenant
            ),
            Err(UserStoreError::AlreadyExists(_)) => {
                info!("Admin {:?} already present", bootstrap.username)
            }
            Err(e) => warn!("Failed to bootstrap admin {:?}: {e}", bootstrap.username),
        }
    }

    info!(
        "Storage ready at {} ({:?} paths, default limit {} bytes)",
        store.root().unwrap_or(root.as_path()).display(),
        config.path_comparison,
        default_limit
    );

    ExitCode::SUCCESS
}
