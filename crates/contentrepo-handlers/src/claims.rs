//! Cognito pre-token-generation trigger adding the `department` claim.
//!
//! The user's preferred role (chosen by Cognito from the user's groups) is
//! matched against the role attached to each group of the pool; the first
//! group with that exact role names the department. Fields of the event the
//! trigger does not touch are passed back unchanged.

use std::sync::Arc;

use aws_lambda_events::cognito::{ClaimsOverrideDetails, CognitoEventUserPoolsPreTokenGen};
use contentrepo_core::{ClaimsConfig, UnmatchedRolePolicy};
use contentrepo_identity::{DirectoryGroup, IdentityError, UserDirectory};
use tracing::{info, warn};

use crate::http::DEPARTMENT_CLAIM;

/// Errors from the claims trigger. Any error fails the sign-in.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    /// The group lookup failed.
    #[error("failed to list user pool groups: {0}")]
    Directory(#[from] IdentityError),

    /// The event names no user pool to read groups from.
    #[error("event carries no userPoolId")]
    MissingUserPoolId,

    /// No group is attached to the preferred role.
    #[error("no group matches preferred role {}", .role.as_deref().unwrap_or("<none>"))]
    NoMatchingGroup {
        /// The preferred role, if the event carried one.
        role: Option<String>,
    },
}

/// The preferred role of a trigger event, if present and non-empty.
#[must_use]
pub fn preferred_role(event: &CognitoEventUserPoolsPreTokenGen) -> Option<&str> {
    event
        .request
        .group_configuration
        .preferred_role
        .as_deref()
        .filter(|r| !r.is_empty())
}

/// Add or replace `name` in the ID token claims of `event`.
///
/// A fresh override keeps the user's current groups so the trigger does not
/// strip them from the token.
pub fn set_claim(event: &mut CognitoEventUserPoolsPreTokenGen, name: &str, value: impl Into<String>) {
    let groups = &event.request.group_configuration;
    event
        .response
        .claims_override_details
        .get_or_insert_with(|| ClaimsOverrideDetails {
            group_override_details: groups.clone(),
            ..Default::default()
        })
        .claims_to_add_or_override
        .insert(name.to_owned(), value.into());
}

/// The first group whose attached role is exactly `role`.
#[must_use]
pub fn resolve_group<'a>(groups: &'a [DirectoryGroup], role: &str) -> Option<&'a DirectoryGroup> {
    groups
        .iter()
        .find(|g| g.role_arn.as_deref() == Some(role))
}

/// Pre-token-generation trigger adding the `department` claim.
#[derive(Debug, Clone)]
pub struct ClaimsAugmenter<D: ?Sized> {
    directory: Arc<D>,
    config: ClaimsConfig,
}

impl<D: UserDirectory + ?Sized> ClaimsAugmenter<D> {
    /// Create a trigger reading groups from `directory`.
    #[must_use]
    pub fn new(directory: Arc<D>, config: ClaimsConfig) -> Self {
        Self { directory, config }
    }

    /// Return `event` with the `department` claim set.
    ///
    /// Without a preferred role the directory is not consulted. When no
    /// group matches, the configured [`UnmatchedRolePolicy`] decides between
    /// failing and returning the event unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::Directory`] if the groups cannot be listed,
    /// [`ClaimsError::MissingUserPoolId`] if the event names no pool, and
    /// [`ClaimsError::NoMatchingGroup`] under the `Reject` policy.
    pub async fn handle(
        &self,
        mut event: CognitoEventUserPoolsPreTokenGen,
    ) -> Result<CognitoEventUserPoolsPreTokenGen, ClaimsError> {
        let header = &event.cognito_event_user_pools_header;
        let matched = match preferred_role(&event) {
            Some(role) => {
                let user_pool_id = header
                    .user_pool_id
                    .as_deref()
                    .ok_or(ClaimsError::MissingUserPoolId)?;
                let groups = self.directory.list_groups(user_pool_id).await?;
                resolve_group(&groups, role).map(|g| g.name.clone())
            }
            None => None,
        };
        let user = header.user_name.clone();

        match matched {
            Some(group) => {
                info!(?user, %group, "adding department claim");
                set_claim(&mut event, DEPARTMENT_CLAIM, group);
                Ok(event)
            }
            None => {
                let role = preferred_role(&event).map(ToOwned::to_owned);
                match self.config.unmatched_role_policy {
                    UnmatchedRolePolicy::Reject => Err(ClaimsError::NoMatchingGroup { role }),
                    UnmatchedRolePolicy::OmitClaim => {
                        warn!(?user, ?role, "no group matches preferred role");
                        Ok(event)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use contentrepo_identity::{DirectoryCall, StaticDirectory};
    use serde_json::{Value, json};

    use super::*;

    const FINANCE_ROLE: &str = "arn:aws:iam::123456789012:role/finance";

    fn event(preferred_role: Value) -> CognitoEventUserPoolsPreTokenGen {
        serde_json::from_value(json!({
            "version": "1",
            "triggerSource": "TokenGeneration_Authentication",
            "region": "us-east-1",
            "userPoolId": "us-east-1_Pool",
            "userName": "alice",
            "callerContext": {"awsSdkVersion": "aws-sdk-unknown-unknown", "clientId": "client"},
            "request": {
                "userAttributes": {"sub": "abc", "email": "alice@example.com"},
                "groupConfiguration": {
                    "groupsToOverride": ["finance"],
                    "iamRolesToOverride": [FINANCE_ROLE],
                    "preferredRole": preferred_role
                }
            },
            "response": {"claimsOverrideDetails": null}
        }))
        .unwrap()
    }

    fn augmenter(
        groups: Vec<DirectoryGroup>,
        policy: UnmatchedRolePolicy,
    ) -> (ClaimsAugmenter<StaticDirectory>, Arc<StaticDirectory>) {
        with_directory(StaticDirectory::new(groups), policy)
    }

    fn with_directory(
        directory: StaticDirectory,
        policy: UnmatchedRolePolicy,
    ) -> (ClaimsAugmenter<StaticDirectory>, Arc<StaticDirectory>) {
        let directory = Arc::new(directory);
        let config = ClaimsConfig::builder().unmatched_role_policy(policy).build();
        (ClaimsAugmenter::new(directory.clone(), config), directory)
    }

    fn groups() -> Vec<DirectoryGroup> {
        vec![
            DirectoryGroup::new("hr", "arn:aws:iam::123456789012:role/hr"),
            DirectoryGroup::new("finance", FINANCE_ROLE),
        ]
    }

    #[test]
    fn test_should_resolve_first_group_with_exact_role() {
        let mut groups = groups();
        groups.push(DirectoryGroup::new("finance-2", FINANCE_ROLE));
        groups.push(DirectoryGroup {
            name: "no-role".to_owned(),
            role_arn: None,
        });

        assert_eq!(resolve_group(&groups, FINANCE_ROLE).unwrap().name, "finance");
        assert!(resolve_group(&groups, "arn:aws:iam::123456789012:role/fin").is_none());
    }

    #[tokio::test]
    async fn test_should_add_department_claim() {
        let (augmenter, _) = augmenter(groups(), UnmatchedRolePolicy::Reject);

        let out = augmenter.handle(event(json!(FINANCE_ROLE))).await.unwrap();
        let wire = serde_json::to_value(&out).unwrap();

        assert_eq!(
            wire["response"]["claimsOverrideDetails"]["claimsToAddOrOverride"],
            json!({"department": "finance"})
        );
        assert_eq!(wire["triggerSource"], "TokenGeneration_Authentication");
        assert_eq!(wire["request"]["userAttributes"]["email"], "alice@example.com");
        assert_eq!(wire["request"]["groupConfiguration"]["groupsToOverride"], json!(["finance"]));
        assert_eq!(
            wire["response"]["claimsOverrideDetails"]["groupOverrideDetails"]["groupsToOverride"],
            json!(["finance"])
        );
    }

    #[tokio::test]
    async fn test_should_find_group_on_later_page() {
        let mut groups: Vec<DirectoryGroup> = (0..7)
            .map(|i| DirectoryGroup::new(format!("team-{i}"), format!("arn:aws:iam::1:role/team-{i}")))
            .collect();
        groups.push(DirectoryGroup::new("finance", FINANCE_ROLE));
        let (augmenter, directory) = with_directory(
            StaticDirectory::new(groups).with_page_size(3),
            UnmatchedRolePolicy::Reject,
        );

        let out = augmenter.handle(event(json!(FINANCE_ROLE))).await.unwrap();
        let details = out.response.claims_override_details.unwrap();

        assert_eq!(details.claims_to_add_or_override[DEPARTMENT_CLAIM], "finance");
        assert_eq!(directory.calls(), vec![DirectoryCall::ListGroups; 3]);
    }

    #[tokio::test]
    async fn test_should_reject_event_without_user_pool() {
        let (augmenter, directory) = augmenter(groups(), UnmatchedRolePolicy::Reject);
        let mut input = event(json!(FINANCE_ROLE));
        input.cognito_event_user_pools_header.user_pool_id = None;

        let err = augmenter.handle(input).await.unwrap_err();

        assert!(matches!(err, ClaimsError::MissingUserPoolId));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_should_keep_existing_override_fields() {
        let (augmenter, _) = augmenter(groups(), UnmatchedRolePolicy::Reject);
        let mut input = event(json!(FINANCE_ROLE));
        input.response.claims_override_details = Some(ClaimsOverrideDetails {
            claims_to_add_or_override: [("tier".to_owned(), "gold".to_owned())].into(),
            claims_to_suppress: vec!["email".to_owned()],
            ..Default::default()
        });

        let out = augmenter.handle(input).await.unwrap();
        let details = out.response.claims_override_details.unwrap();

        assert_eq!(details.claims_to_add_or_override.len(), 2);
        assert_eq!(details.claims_to_suppress, vec!["email".to_owned()]);
    }

    #[tokio::test]
    async fn test_should_reject_unmatched_role_by_default() {
        let (augmenter, _) = augmenter(groups(), UnmatchedRolePolicy::default());

        let err = augmenter
            .handle(event(json!("arn:aws:iam::123456789012:role/other")))
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimsError::NoMatchingGroup { role: Some(_) }));
    }

    #[tokio::test]
    async fn test_should_omit_claim_when_configured() {
        let (augmenter, _) = augmenter(groups(), UnmatchedRolePolicy::OmitClaim);

        let out = augmenter
            .handle(event(json!("arn:aws:iam::123456789012:role/other")))
            .await
            .unwrap();

        assert!(out.response.claims_override_details.is_none());
    }

    #[tokio::test]
    async fn test_should_skip_lookup_without_preferred_role() {
        let (augmenter, directory) = augmenter(groups(), UnmatchedRolePolicy::Reject);

        let err = augmenter.handle(event(Value::Null)).await.unwrap_err();

        assert!(matches!(err, ClaimsError::NoMatchingGroup { role: None }));
        assert!(!directory.calls().contains(&DirectoryCall::ListGroups));
    }

    #[tokio::test]
    async fn test_should_reject_pool_without_groups() {
        let (augmenter, directory) = augmenter(vec![], UnmatchedRolePolicy::Reject);

        let err = augmenter.handle(event(json!(FINANCE_ROLE))).await.unwrap_err();

        assert!(matches!(err, ClaimsError::NoMatchingGroup { .. }));
        assert_eq!(directory.calls(), vec![DirectoryCall::ListGroups]);
    }
}
