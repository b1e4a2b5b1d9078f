//! User pool administration.
//!
//! [`UserDirectory`] covers the three user pool calls the handlers make:
//! creating a user, adding it to a group, and listing the pool's groups.
//! [`CognitoDirectory`] implements it on top of the Cognito Identity Provider
//! SDK client.

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::error::DisplayErrorContext;
use aws_sdk_cognitoidentityprovider::types::MessageActionType;
use contentrepo_core::GroupName;
use tracing::debug;

use crate::error::IdentityError;

/// A group as returned by the user pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Group name.
    pub name: String,
    /// IAM role attached to the group, if any.
    pub role_arn: Option<String>,
}

impl DirectoryGroup {
    /// Create a group with an attached role.
    #[must_use]
    pub fn new(name: impl Into<String>, role_arn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role_arn: Some(role_arn.into()),
        }
    }
}

/// One page of a group listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPage {
    /// Groups on this page, in service order.
    pub groups: Vec<DirectoryGroup>,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

/// Administrative access to a user pool.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create a user with a temporary password without sending the welcome
    /// message.
    async fn create_user(
        &self,
        user_pool_id: &str,
        username: &str,
        temporary_password: &str,
    ) -> Result<(), IdentityError>;

    /// Add an existing user to a group.
    async fn add_user_to_group(
        &self,
        user_pool_id: &str,
        username: &str,
        group: &GroupName,
    ) -> Result<(), IdentityError>;

    /// One page of the pool's groups, starting at `next_token`.
    async fn list_groups_page(
        &self,
        user_pool_id: &str,
        next_token: Option<String>,
    ) -> Result<GroupPage, IdentityError>;

    /// List every group in the pool, in the order the service returns them.
    ///
    /// Follows page tokens until the last page. An empty token ends the
    /// listing like a missing one.
    async fn list_groups(&self, user_pool_id: &str) -> Result<Vec<DirectoryGroup>, IdentityError> {
        let mut groups = Vec::new();
        let mut next_token = None;
        loop {
            let page = self.list_groups_page(user_pool_id, next_token.take()).await?;
            groups.extend(page.groups);
            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!(user_pool_id, count = groups.len(), "listed groups");
        Ok(groups)
    }
}

/// [`UserDirectory`] backed by the Cognito Identity Provider API.
#[derive(Debug, Clone)]
pub struct CognitoDirectory {
    client: Client,
}

impl CognitoDirectory {
    /// Wrap an SDK client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserDirectory for CognitoDirectory {
    async fn create_user(
        &self,
        user_pool_id: &str,
        username: &str,
        temporary_password: &str,
    ) -> Result<(), IdentityError> {
        let output = self
            .client
            .admin_create_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .temporary_password(temporary_password)
            .message_action(MessageActionType::Suppress)
            .send()
            .await
            .map_err(|e| IdentityError::Service {
                operation: "AdminCreateUser",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(
            user = username,
            status = ?output.user().and_then(|u| u.user_status()),
            "created user"
        );
        Ok(())
    }

    async fn add_user_to_group(
        &self,
        user_pool_id: &str,
        username: &str,
        group: &GroupName,
    ) -> Result<(), IdentityError> {
        self.client
            .admin_add_user_to_group()
            .user_pool_id(user_pool_id)
            .username(username)
            .group_name(group.as_str())
            .send()
            .await
            .map_err(|e| IdentityError::Service {
                operation: "AdminAddUserToGroup",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(user = username, %group, "added user to group");
        Ok(())
    }

    async fn list_groups_page(
        &self,
        user_pool_id: &str,
        next_token: Option<String>,
    ) -> Result<GroupPage, IdentityError> {
        let resp = self
            .client
            .list_groups()
            .user_pool_id(user_pool_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| IdentityError::Service {
                operation: "ListGroups",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let groups = resp
            .groups()
            .iter()
            .filter_map(|group| {
                Some(DirectoryGroup {
                    name: group.group_name()?.to_owned(),
                    role_arn: group.role_arn().map(ToOwned::to_owned),
                })
            })
            .collect();

        Ok(GroupPage {
            groups,
            next_token: resp.next_token().map(ToOwned::to_owned),
        })
    }
}
