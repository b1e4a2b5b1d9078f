//! Federated identity exchange.
//!
//! Turning a caller's ID token into storage credentials takes two identity
//! pool calls: `GetId` resolves the token to a federated identity id, and
//! `GetCredentialsForIdentity` issues temporary credentials for the role the
//! caller selected. [`CredentialExchange`] runs both in order.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_cognitoidentity::Client;
use aws_sdk_cognitoidentity::error::{DisplayErrorContext, SdkError};
use aws_sdk_cognitoidentity::operation::get_credentials_for_identity::GetCredentialsForIdentityError;
use aws_sdk_cognitoidentity::operation::get_id::GetIdError;
use chrono::DateTime;
use contentrepo_core::{RoleArn, TemporaryCredential};
use tracing::debug;

use crate::error::IdentityError;

/// An ID token presented under a login provider name.
#[derive(Clone, PartialEq, Eq)]
pub struct Login {
    /// Login provider, e.g. `cognito-idp.<region>.amazonaws.com/<userPoolId>`.
    pub provider: String,
    /// The raw ID token.
    pub token: String,
}

impl Login {
    /// Pair a token with its login provider.
    #[must_use]
    pub fn new(provider: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("provider", &self.provider)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Identity pool operations used by the credential exchange.
#[async_trait]
pub trait IdentityFederation: Send + Sync {
    /// Resolve a login to a federated identity id.
    async fn get_id(&self, identity_pool_id: &str, login: &Login) -> Result<String, IdentityError>;

    /// Issue temporary credentials for `identity_id` assuming `role`.
    async fn get_credentials_for_identity(
        &self,
        identity_id: &str,
        role: &RoleArn,
        login: &Login,
    ) -> Result<TemporaryCredential, IdentityError>;
}

/// [`IdentityFederation`] backed by the Cognito Identity API.
#[derive(Debug, Clone)]
pub struct CognitoFederation {
    client: Client,
}

impl CognitoFederation {
    /// Wrap an SDK client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityFederation for CognitoFederation {
    async fn get_id(&self, identity_pool_id: &str, login: &Login) -> Result<String, IdentityError> {
        let output = self
            .client
            .get_id()
            .identity_pool_id(identity_pool_id)
            .logins(&login.provider, &login.token)
            .send()
            .await
            .map_err(get_id_error)?;

        output
            .identity_id()
            .map(ToOwned::to_owned)
            .ok_or(IdentityError::MissingField {
                operation: "GetId",
                field: "IdentityId",
            })
    }

    async fn get_credentials_for_identity(
        &self,
        identity_id: &str,
        role: &RoleArn,
        login: &Login,
    ) -> Result<TemporaryCredential, IdentityError> {
        const OPERATION: &str = "GetCredentialsForIdentity";

        let output = self
            .client
            .get_credentials_for_identity()
            .identity_id(identity_id)
            .custom_role_arn(role.as_str())
            .logins(&login.provider, &login.token)
            .send()
            .await
            .map_err(get_credentials_error)?;

        let credentials = output.credentials().ok_or(IdentityError::MissingField {
            operation: OPERATION,
            field: "Credentials",
        })?;
        let field = |value: Option<&str>, field: &'static str| {
            value
                .map(ToOwned::to_owned)
                .ok_or(IdentityError::MissingField {
                    operation: OPERATION,
                    field,
                })
        };

        Ok(TemporaryCredential {
            access_key_id: field(credentials.access_key_id(), "AccessKeyId")?,
            secret_key: field(credentials.secret_key(), "SecretKey")?,
            session_token: field(credentials.session_token(), "SessionToken")?,
            expiration: credentials
                .expiration()
                .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        })
    }
}

fn get_id_error<R: fmt::Debug>(err: SdkError<GetIdError, R>) -> IdentityError {
    let message = DisplayErrorContext(&err).to_string();
    if err
        .as_service_error()
        .is_some_and(GetIdError::is_not_authorized_exception)
    {
        IdentityError::NotAuthorized {
            operation: "GetId",
            message,
        }
    } else {
        IdentityError::Service {
            operation: "GetId",
            message,
        }
    }
}

fn get_credentials_error<R: fmt::Debug>(
    err: SdkError<GetCredentialsForIdentityError, R>,
) -> IdentityError {
    let message = DisplayErrorContext(&err).to_string();
    if err
        .as_service_error()
        .is_some_and(GetCredentialsForIdentityError::is_not_authorized_exception)
    {
        IdentityError::NotAuthorized {
            operation: "GetCredentialsForIdentity",
            message,
        }
    } else {
        IdentityError::Service {
            operation: "GetCredentialsForIdentity",
            message,
        }
    }
}

/// Exchanges ID tokens for temporary credentials through one identity pool.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use contentrepo_core::RoleArn;
/// use contentrepo_identity::{CredentialExchange, StaticFederation};
///
/// let federation = StaticFederation::new().with_identity("id-token", "eu-central-1:alice");
/// let exchange = CredentialExchange::new(
///     "eu-central-1:pool",
///     "cognito-idp.eu-central-1.amazonaws.com/eu-central-1_AbCdEf",
/// );
///
/// let role = RoleArn::new("arn:aws:iam::123456789012:role/finance").unwrap();
/// let credential = exchange.exchange(&federation, &role, "id-token").await.unwrap();
/// assert!(!credential.session_token.is_empty());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct CredentialExchange {
    identity_pool_id: String,
    login_provider: String,
}

impl CredentialExchange {
    /// Create an exchange for one identity pool and login provider.
    #[must_use]
    pub fn new(identity_pool_id: impl Into<String>, login_provider: impl Into<String>) -> Self {
        Self {
            identity_pool_id: identity_pool_id.into(),
            login_provider: login_provider.into(),
        }
    }

    /// Resolve `id_token` to an identity and obtain credentials for `role`.
    pub async fn exchange(
        &self,
        federation: &dyn IdentityFederation,
        role: &RoleArn,
        id_token: &str,
    ) -> Result<TemporaryCredential, IdentityError> {
        let login = Login::new(&self.login_provider, id_token);

        let identity_id = federation.get_id(&self.identity_pool_id, &login).await?;
        debug!(identity_id = %identity_id, "resolved federated identity");

        let credential = federation
            .get_credentials_for_identity(&identity_id, role, &login)
            .await?;
        debug!(
            access_key_id = %credential.access_key_id,
            expiration = ?credential.expiration,
            %role,
            "issued temporary credentials"
        );

        Ok(credential)
    }
}
