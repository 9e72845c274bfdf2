//! Cognito user pool configuration and client.
//!
//! The user pool speaks a JSON-over-HTTP protocol: every operation is a
//! `POST /` with an `X-Amz-Target` header naming the action. The public
//! client operations used here (sign-in, sign-up, confirmation, sign-out,
//! attribute lookup) need no request signing.

use crate::error::AuthError;
use crate::identity::Identity;
use crate::provider::{IdentityProvider, SignUpOutcome, SignUpRequest};
use crate::session::{AuthSession, SessionTokens};
use async_trait::async_trait;
use chrono::Duration;
use reqwest::{Client, StatusCode};
use rootcause::Report;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const STUDENT_ID_ATTRIBUTE: &str = "custom:student_id";
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Configuration for the managed identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// AWS region hosting the user pool (e.g. "us-east-1").
    region: String,
    /// User pool identifier (e.g. "us-east-1_AbCdEf123").
    user_pool_id: String,
    /// App client id registered with the user pool.
    client_id: String,
    /// Identity pool id for federated credentials, if one is used.
    #[serde(default)]
    identity_pool_id: Option<String>,
    /// Endpoint override; defaults to the regional user pool endpoint.
    #[serde(default)]
    endpoint: Option<String>,
}

impl IdentityConfig {
    /// Creates a configuration for the given pool.
    #[must_use]
    pub fn new(region: String, user_pool_id: String, client_id: String) -> Self {
        Self {
            region,
            user_pool_id,
            client_id,
            identity_pool_id: None,
            endpoint: None,
        }
    }

    /// Overrides the endpoint (useful for local emulators).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the user pool id.
    #[must_use]
    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    /// Returns the app client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the identity pool id, if configured.
    #[must_use]
    pub fn identity_pool_id(&self) -> Option<&str> {
        self.identity_pool_id.as_deref()
    }

    /// Returns the endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com/", self.region))
    }
}

/// Identity provider backed by a Cognito user pool.
#[derive(Debug, Clone)]
pub struct CognitoIdentityProvider {
    client: Client,
    config: IdentityConfig,
}

impl CognitoIdentityProvider {
    /// Creates a provider for the configured pool.
    #[must_use]
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Creates a provider reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, config: IdentityConfig) -> Self {
        Self { client, config }
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    async fn call<B, R>(&self, action: &str, body: &B) -> Result<R, Report<AuthError>>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.config.endpoint())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", format!("{TARGET_PREFIX}.{action}"))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AuthError::Transport {
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            let err = parse_error(status, &text);
            debug!(action, %status, error = %err, "identity provider rejected request");
            return Err(err.into());
        }

        serde_json::from_str(&text).map_err(|e| {
            AuthError::Generic {
                message: format!("unexpected {action} response: {e}"),
            }
            .into()
        })
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, Report<AuthError>> {
        let request = InitiateAuthRequest {
            auth_flow: "USER_PASSWORD_AUTH",
            client_id: self.config.client_id(),
            auth_parameters: AuthParameters {
                username: email,
                password,
            },
        };
        let response: InitiateAuthResponse = self.call("InitiateAuth", &request).await?;

        let Some(result) = response.authentication_result else {
            let challenge = response.challenge_name.unwrap_or_default();
            warn!(challenge = %challenge, "sign-in requires an unsupported challenge");
            return Err(AuthError::Generic {
                message: format!("Additional sign-in step required: {challenge}"),
            }
            .into());
        };

        let lifetime = Duration::seconds(result.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS));
        let tokens = SessionTokens {
            id_token: result.id_token,
            access_token: result.access_token,
            refresh_token: result.refresh_token,
        };

        let mut session = AuthSession::with_tokens(Identity::new(), tokens, lifetime);
        let mut identity = self.current_identity(&session).await?;
        if identity.email().is_none() {
            identity.set_email(Some(email.to_string()));
        }
        session.set_identity(identity);

        debug!(session_key = %session.identity().session_key(), "signed in");
        Ok(session)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, Report<AuthError>> {
        let body = SignUpBody {
            client_id: self.config.client_id(),
            username: &request.email,
            password: &request.password,
            user_attributes: vec![
                AttributeType::new("email", &request.email),
                AttributeType::new("name", &request.name),
                AttributeType::new(STUDENT_ID_ATTRIBUTE, &request.student_id),
            ],
        };
        let response: SignUpResponse = self.call("SignUp", &body).await?;

        if response.user_confirmed {
            Ok(SignUpOutcome::Confirmed)
        } else {
            Ok(SignUpOutcome::ConfirmationRequired {
                destination: response.code_delivery_details.and_then(|d| d.destination),
            })
        }
    }

    #[instrument(skip(self, code))]
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), Report<AuthError>> {
        let body = ConfirmSignUpBody {
            client_id: self.config.client_id(),
            username: email,
            confirmation_code: code,
        };
        let _: serde_json::Value = self.call("ConfirmSignUp", &body).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn resend_code(&self, email: &str) -> Result<(), Report<AuthError>> {
        let body = ResendCodeBody {
            client_id: self.config.client_id(),
            username: email,
        };
        let _: serde_json::Value = self.call("ResendConfirmationCode", &body).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, session: &AuthSession) -> Result<(), Report<AuthError>> {
        let Some(access_token) = session.access_token() else {
            return Ok(());
        };
        let body = AccessTokenBody { access_token };
        let _: serde_json::Value = self.call("GlobalSignOut", &body).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn current_identity(&self, session: &AuthSession) -> Result<Identity, Report<AuthError>> {
        let Some(access_token) = session.access_token() else {
            return Ok(session.identity().clone());
        };
        let body = AccessTokenBody { access_token };
        let response: GetUserResponse = self.call("GetUser", &body).await?;
        Ok(identity_from_attributes(
            response.username,
            &response.user_attributes,
        ))
    }

    fn name(&self) -> &str {
        "cognito"
    }
}

/// Builds an identity from user pool attributes.
fn identity_from_attributes(username: Option<String>, attributes: &[UserAttribute]) -> Identity {
    let lookup = |name: &str| {
        attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.clone())
    };

    Identity::with_all_fields(
        username,
        lookup("name"),
        lookup("email"),
        lookup(STUDENT_ID_ATTRIBUTE),
    )
}

/// Maps a non-success response to an `AuthError`.
fn parse_error(status: StatusCode, body: &str) -> AuthError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => AuthError::classify(
            parsed.kind.as_deref().unwrap_or_default(),
            parsed.message.unwrap_or_default(),
        ),
        Err(_) if status.is_server_error() => AuthError::Transport {
            reason: format!("identity provider returned {status}"),
        },
        Err(_) => AuthError::Generic {
            message: body.trim().to_string(),
        },
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: AuthParameters<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct AuthParameters<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpBody<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType<'a> {
    name: &'a str,
    value: &'a str,
}

impl<'a> AttributeType<'a> {
    fn new(name: &'a str, value: &'a str) -> Self {
        Self { name, value }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    #[serde(default)]
    user_confirmed: bool,
    code_delivery_details: Option<CodeDeliveryDetails>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CodeDeliveryDetails {
    destination: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConfirmSignUpBody<'a> {
    client_id: &'a str,
    username: &'a str,
    confirmation_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResendCodeBody<'a> {
    client_id: &'a str,
    username: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AccessTokenBody<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: Option<String>,
    #[serde(default)]
    user_attributes: Vec<UserAttribute>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserAttribute {
    name: String,
    value: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> IdentityConfig {
        IdentityConfig::new(
            "us-east-1".to_string(),
            "us-east-1_Pool".to_string(),
            "client123".to_string(),
        )
    }

    #[test]
    fn default_endpoint_uses_region() {
        assert_eq!(
            config().endpoint(),
            "https://cognito-idp.us-east-1.amazonaws.com/"
        );
    }

    #[test]
    fn endpoint_override_wins() {
        let config = config().with_endpoint("http://localhost:9229/");
        assert_eq!(config.endpoint(), "http://localhost:9229/");
    }

    #[test]
    fn config_deserializes_with_optional_fields_missing() {
        let config: IdentityConfig = serde_json::from_value(json!({
            "region": "us-east-1",
            "user_pool_id": "us-east-1_Pool",
            "client_id": "client123",
        }))
        .expect("deserialize");

        assert!(config.identity_pool_id().is_none());
        assert_eq!(config.client_id(), "client123");
    }

    #[test]
    fn initiate_auth_body_uses_provider_field_names() {
        let body = InitiateAuthRequest {
            auth_flow: "USER_PASSWORD_AUTH",
            client_id: "client123",
            auth_parameters: AuthParameters {
                username: "alice@example.edu",
                password: "secret",
            },
        };

        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["AuthFlow"], "USER_PASSWORD_AUTH");
        assert_eq!(value["ClientId"], "client123");
        assert_eq!(value["AuthParameters"]["USERNAME"], "alice@example.edu");
        assert_eq!(value["AuthParameters"]["PASSWORD"], "secret");
    }

    #[test]
    fn sign_up_body_carries_student_id_attribute() {
        let body = SignUpBody {
            client_id: "client123",
            username: "alice@example.edu",
            password: "Str0ng!pass",
            user_attributes: vec![AttributeType::new(STUDENT_ID_ATTRIBUTE, "S1001")],
        };

        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["UserAttributes"][0]["Name"], "custom:student_id");
        assert_eq!(value["UserAttributes"][0]["Value"], "S1001");
    }

    #[test]
    fn identity_is_built_from_attributes() {
        let response: GetUserResponse = serde_json::from_value(json!({
            "Username": "7f3a-uuid",
            "UserAttributes": [
                {"Name": "email", "Value": "alice@example.edu"},
                {"Name": "name", "Value": "Alice"},
                {"Name": "custom:student_id", "Value": "S1001"},
            ]
        }))
        .expect("deserialize");

        let identity = identity_from_attributes(response.username, &response.user_attributes);

        assert_eq!(identity.username(), Some("7f3a-uuid"));
        assert_eq!(identity.display_name(), Some("Alice"));
        assert_eq!(identity.email(), Some("alice@example.edu"));
        assert_eq!(identity.session_key(), "S1001");
    }

    #[test]
    fn missing_student_id_falls_back_to_guest_key() {
        let identity = identity_from_attributes(None, &[]);
        assert_eq!(identity.session_key(), "guest");
    }

    #[test]
    fn provider_errors_are_classified() {
        let body = r#"{"__type":"UserNotConfirmedException","message":"User is not confirmed."}"#;
        assert_eq!(
            parse_error(StatusCode::BAD_REQUEST, body),
            AuthError::UnverifiedAccount
        );

        let body = r#"{"__type":"NotAuthorizedException","Message":"Incorrect username or password."}"#;
        assert_eq!(
            parse_error(StatusCode::BAD_REQUEST, body),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn unparseable_server_error_is_transport_failure() {
        let err = parse_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, AuthError::Transport { .. }));
    }

    #[test]
    fn sign_up_response_without_confirmation() {
        let response: SignUpResponse = serde_json::from_value(json!({
            "UserConfirmed": false,
            "UserSub": "abc",
            "CodeDeliveryDetails": {"Destination": "a***@e***.edu", "DeliveryMedium": "EMAIL"}
        }))
        .expect("deserialize");

        assert!(!response.user_confirmed);
        assert_eq!(
            response.code_delivery_details.and_then(|d| d.destination),
            Some("a***@e***.edu".to_string())
        );
    }
}
