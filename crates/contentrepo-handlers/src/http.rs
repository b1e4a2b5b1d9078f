//! API Gateway proxy events and responses.
//!
//! The HTTP handlers sit behind an API Gateway REST API with a Cognito user
//! pool authorizer. The authorizer has already verified the ID token, so the
//! claims in `requestContext.authorizer.claims` are trusted; the raw token is
//! still needed to exchange it for storage credentials.

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use base64::Engine as _;
use contentrepo_core::{GroupName, IdentityClaims, RoleArn};
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE,
    InvalidHeaderValue,
};
use http::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Content type of every response body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Claim holding the caller's group.
pub const DEPARTMENT_CLAIM: &str = "department";

/// Claim holding the caller's preferred IAM role.
pub const PREFERRED_ROLE_CLAIM: &str = "cognito:preferred_role";

/// Authorizer field under which a Cognito user pool authorizer puts the
/// verified token claims.
const CLAIMS_FIELD: &str = "claims";

/// Accessors the handlers need on an API Gateway proxy request.
pub trait ProxyRequestExt {
    /// Header value by case-insensitive name.
    fn header_str(&self, name: &str) -> Option<&str>;

    /// A string claim set by the authorizer.
    fn claim(&self, name: &str) -> Option<&str>;

    /// The caller's group and preferred role.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthorized` error if either claim is missing or empty.
    fn identity_claims(&self) -> Result<IdentityClaims, ApiError>;

    /// The raw ID token from the `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthorized` error if the header is missing or blank.
    fn id_token(&self) -> Result<&str, ApiError>;

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a `BadRequest` error if the body is missing, is not valid
    /// base64 when flagged as such, or does not deserialize into `T`.
    fn json_body<T: DeserializeOwned>(&self) -> Result<T, ApiError>;
}

impl ProxyRequestExt for ApiGatewayProxyRequest {
    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    fn claim(&self, name: &str) -> Option<&str> {
        self.request_context
            .authorizer
            .fields
            .get(CLAIMS_FIELD)?
            .get(name)?
            .as_str()
    }

    fn identity_claims(&self) -> Result<IdentityClaims, ApiError> {
        let group = self
            .claim(DEPARTMENT_CLAIM)
            .and_then(|v| GroupName::new(v).ok())
            .ok_or_else(|| ApiError::unauthorized(format!("missing {DEPARTMENT_CLAIM} claim")))?;
        let preferred_role = self
            .claim(PREFERRED_ROLE_CLAIM)
            .and_then(|v| RoleArn::new(v).ok())
            .ok_or_else(|| {
                ApiError::unauthorized(format!("missing {PREFERRED_ROLE_CLAIM} claim"))
            })?;
        Ok(IdentityClaims {
            group,
            preferred_role,
        })
    }

    fn id_token(&self) -> Result<&str, ApiError> {
        self.header_str(AUTHORIZATION.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("missing Authorization header"))
    }

    fn json_body<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let raw = self
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("request body is required"))?;

        let parsed = if self.is_base64_encoded {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(raw)
                .map_err(|e| ApiError::bad_request("request body is not valid base64").with_source(e))?;
            serde_json::from_slice(&bytes)
        } else {
            serde_json::from_str(raw)
        };
        parsed.map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")).with_source(e))
    }
}

/// Accessors used when inspecting a proxy response.
pub trait ProxyResponseExt {
    /// The body parsed as JSON, if it is a JSON text body.
    fn json_value(&self) -> Option<serde_json::Value>;

    /// Header value by case-insensitive name.
    fn header_str(&self, name: &str) -> Option<&str>;
}

impl ProxyResponseExt for ApiGatewayProxyResponse {
    fn json_value(&self) -> Option<serde_json::Value> {
        match self.body.as_ref()? {
            Body::Text(text) => serde_json::from_str(text).ok(),
            Body::Binary(bytes) => serde_json::from_slice(bytes).ok(),
            Body::Empty => None,
        }
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// CORS headers attached to every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
}

impl CorsHeaders {
    /// Allow `allow_origin`, with credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if `allow_origin` is not a valid header value.
    pub fn new(allow_origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(allow_origin)?,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers
    }
}

fn response(status: http::StatusCode, body: String, cors: &CorsHeaders) -> ApiGatewayProxyResponse {
    ApiGatewayProxyResponse {
        status_code: i64::from(status.as_u16()),
        headers: cors.headers(),
        body: Some(Body::Text(body)),
        ..Default::default()
    }
}

/// Serialize `body` into a response with `status`.
///
/// A body that fails to serialize becomes a 500 response.
#[must_use]
pub fn json_response<T: Serialize>(
    status: http::StatusCode,
    body: &T,
    cors: &CorsHeaders,
) -> ApiGatewayProxyResponse {
    match serde_json::to_string(body) {
        Ok(json) => response(status, json, cors),
        Err(e) => error_to_response(
            &ApiError::internal("could not serialize response").with_source(e),
            cors,
        ),
    }
}

/// Convert an [`ApiError`] into a complete error response.
#[must_use]
pub fn error_to_response(error: &ApiError, cors: &CorsHeaders) -> ApiGatewayProxyResponse {
    response(error.status_code, error.to_json().to_string(), cors)
}

/// A proxy request from a partial JSON event, with the method fields filled in.
#[cfg(test)]
pub(crate) fn test_request(mut value: serde_json::Value) -> ApiGatewayProxyRequest {
    let event = value.as_object_mut().unwrap();
    event.insert("httpMethod".to_owned(), "POST".into());
    event
        .entry("requestContext")
        .or_insert_with(|| serde_json::json!({}))
        .as_object_mut()
        .unwrap()
        .insert("httpMethod".to_owned(), "POST".into());
    serde_json::from_value(value).unwrap()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_request as request;
    use super::*;
    use crate::error::ApiErrorCode;

    #[test]
    fn test_should_extract_claims_and_token() {
        let req = request(json!({
            "resource": "/upload",
            "path": "/upload",
            "headers": {"authorization": " id-token "},
            "requestContext": {
                "requestId": "r-1",
                "authorizer": {"claims": {
                    "department": "finance",
                    "cognito:preferred_role": "arn:aws:iam::1:role/finance",
                    "email": "a@example.com"
                }}
            },
            "body": null
        }));

        let claims = req.identity_claims().unwrap();
        assert_eq!(claims.group.as_str(), "finance");
        assert_eq!(claims.preferred_role.as_str(), "arn:aws:iam::1:role/finance");
        assert_eq!(req.id_token().unwrap(), "id-token");
        assert_eq!(req.request_context.request_id.as_deref(), Some("r-1"));
    }

    #[test]
    fn test_should_find_mixed_case_authorization_header() {
        let req = request(json!({"headers": {"AUTHORIZATION": "tok"}}));
        assert_eq!(req.id_token().unwrap(), "tok");
    }

    #[test]
    fn test_should_reject_missing_department() {
        let req = request(json!({
            "headers": {"Authorization": "t"},
            "requestContext": {"authorizer": {"claims": {
                "cognito:preferred_role": "arn:aws:iam::1:role/finance"
            }}}
        }));
        let err = req.identity_claims().unwrap_err();
        assert_eq!(err.code, ApiErrorCode::Unauthorized);
        assert!(err.message.contains("department"));
    }

    #[test]
    fn test_should_reject_missing_authorizer_and_headers() {
        let req = request(json!({}));
        assert_eq!(req.identity_claims().unwrap_err().code, ApiErrorCode::Unauthorized);
        assert_eq!(req.id_token().unwrap_err().code, ApiErrorCode::Unauthorized);
    }

    #[test]
    fn test_should_decode_base64_body() {
        let req = request(json!({
            "body": "eyJhIjoxfQ==",
            "isBase64Encoded": true
        }));
        let value: serde_json::Value = req.json_body().unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_should_reject_missing_or_malformed_body() {
        let missing = request(json!({}));
        assert_eq!(
            missing.json_body::<serde_json::Value>().unwrap_err().code,
            ApiErrorCode::BadRequest
        );
        let malformed = request(json!({"body": "{not json"}));
        assert_eq!(
            malformed.json_body::<serde_json::Value>().unwrap_err().code,
            ApiErrorCode::BadRequest
        );
    }

    #[test]
    fn test_should_reject_invalid_origin() {
        assert!(CorsHeaders::new("https://app.example.com\n").is_err());
    }

    #[test]
    fn test_should_attach_cors_headers_to_errors() {
        let cors = CorsHeaders::new("https://app.example.com").unwrap();
        let resp = error_to_response(&ApiError::unauthorized("missing token"), &cors);

        assert_eq!(resp.status_code, 401);
        assert_eq!(
            resp.header_str("Access-Control-Allow-Origin"),
            Some("https://app.example.com")
        );
        assert_eq!(resp.header_str("Access-Control-Allow-Credentials"), Some("true"));
        assert_eq!(
            resp.json_value(),
            Some(json!({"code": "Unauthorized", "message": "missing token"}))
        );
    }

    #[test]
    fn test_should_serialize_proxy_response() {
        let cors = CorsHeaders::new("*").unwrap();
        let resp = json_response(http::StatusCode::OK, &json!({"ok": true}), &cors);
        let wire = serde_json::to_value(&resp).unwrap();
        assert_eq!(wire["statusCode"], 200);
        assert_eq!(wire["body"], "{\"ok\":true}");
        assert_eq!(wire["headers"]["content-type"], "application/json");
    }
}
