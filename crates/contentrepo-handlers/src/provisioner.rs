//! Seeds the user pool with the configured users.

use std::sync::Arc;

use contentrepo_core::ProvisionerConfig;
use contentrepo_identity::{IdentityError, UserDirectory};
use tracing::{error, info};

/// Errors from provisioning.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The user could not be created.
    #[error("failed to create user {username}: {source}")]
    CreateUser {
        /// The user being created.
        username: String,
        /// The directory error.
        source: IdentityError,
    },

    /// The user was created but could not join its group.
    #[error("failed to add user {username} to group {group}: {source}")]
    AddToGroup {
        /// The user being added.
        username: String,
        /// The target group.
        group: String,
        /// The directory error.
        source: IdentityError,
    },
}

/// Creates each configured user and adds it to its group.
///
/// Users are processed in configuration order and processing stops at the
/// first failure; users created before it are left in place.
#[derive(Debug, Clone)]
pub struct UserProvisioner<D: ?Sized> {
    directory: Arc<D>,
    config: ProvisionerConfig,
}

impl<D: UserDirectory + ?Sized> UserProvisioner<D> {
    /// Create a provisioner writing to `directory`.
    #[must_use]
    pub fn new(directory: Arc<D>, config: ProvisionerConfig) -> Self {
        Self { directory, config }
    }

    /// Provision every user; returns how many were provisioned.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Later users are not attempted.
    pub async fn provision_users(&self) -> Result<usize, ProvisionError> {
        let pool = &self.config.user_pool_id;
        for user in &self.config.users {
            self.directory
                .create_user(pool, &user.username, &user.password)
                .await
                .map_err(|source| ProvisionError::CreateUser {
                    username: user.username.clone(),
                    source,
                })?;
            self.directory
                .add_user_to_group(pool, &user.username, &user.group)
                .await
                .map_err(|source| ProvisionError::AddToGroup {
                    username: user.username.clone(),
                    group: user.group.to_string(),
                    source,
                })?;
            info!(username = %user.username, group = %user.group, "provisioned user");
        }
        Ok(self.config.users.len())
    }

    /// Provision every user, reporting success as a boolean.
    pub async fn run(&self) -> bool {
        match self.provision_users().await {
            Ok(count) => {
                info!(count, "user provisioning complete");
                true
            }
            Err(e) => {
                error!(error = %e, "user provisioning failed");
                false
            }
        }
    }
}
