//! HTTP client for the managed bot runtime.
//!
//! Speaks the runtime's `RecognizeText` JSON contract. Request signing is
//! left to whatever fronts the configured endpoint; a bearer token is
//! forwarded when the caller has one.

use crate::error::GatewayError;
use crate::runtime::{BotReply, BotRuntime, RecognizeTextRequest, ReplyFragment};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, instrument};

/// Bot runtime reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBotRuntime {
    client: Client,
    endpoint: String,
}

impl HttpBotRuntime {
    /// Creates a runtime client for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    /// Creates a runtime client reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BotRuntime for HttpBotRuntime {
    #[instrument(skip_all, fields(session_id = %request.session_id))]
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> campus_desk_core::Result<BotReply, GatewayError> {
        let url = request_url(&self.endpoint, request)?;

        let mut builder = self.client.post(url).json(&request_body(request));
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable {
                reason: e.to_string(),
            })?;

        let reply = parse_reply(status, &body)?;
        debug!(%status, fragments = reply.fragments.len(), "bot runtime replied");
        Ok(reply)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Builds the `RecognizeText` URL for a request.
///
/// # Errors
///
/// Returns `UpstreamUnavailable` if the endpoint is not a usable base URL.
pub fn request_url(endpoint: &str, request: &RecognizeTextRequest) -> Result<Url, GatewayError> {
    let invalid = |reason: String| GatewayError::UpstreamUnavailable {
        reason: format!("invalid bot endpoint '{endpoint}': {reason}"),
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend([
            "bots",
            request.bot_id.as_str(),
            "botAliases",
            request.bot_alias_id.as_str(),
            "botLocales",
            request.locale_id.as_str(),
            "sessions",
            request.session_id.as_str(),
            "text",
        ]);
    Ok(url)
}

/// Builds the JSON body for a request.
#[must_use]
pub fn request_body(request: &RecognizeTextRequest) -> JsonValue {
    json!({
        "text": request.text,
        "sessionState": {
            "sessionAttributes": request.session_attributes,
        },
    })
}

/// Interprets a runtime response.
///
/// A missing `messages` field is an empty reply, not an error.
///
/// # Errors
///
/// Returns `UpstreamUnavailable` for error statuses and `MalformedReply`
/// when the body is not a JSON object of the expected shape.
pub fn parse_reply(status: StatusCode, body: &str) -> Result<BotReply, GatewayError> {
    if !status.is_success() {
        return Err(GatewayError::UpstreamUnavailable {
            reason: format!("bot runtime returned {status}"),
        });
    }

    let value: JsonValue =
        serde_json::from_str(body).map_err(|e| GatewayError::MalformedReply {
            reason: e.to_string(),
        })?;
    if !value.is_object() {
        return Err(GatewayError::MalformedReply {
            reason: "expected a JSON object".to_string(),
        });
    }

    let parsed: RecognizeTextResponse =
        serde_json::from_value(value).map_err(|e| GatewayError::MalformedReply {
            reason: e.to_string(),
        })?;

    let fragments = parsed
        .messages
        .unwrap_or_default()
        .into_iter()
        .filter_map(|message| {
            message.content.map(|content| ReplyFragment {
                content,
                content_type: message.content_type,
            })
        })
        .collect();

    Ok(BotReply::new(fragments))
}

#[derive(Deserialize)]
struct RecognizeTextResponse {
    #[serde(default)]
    messages: Option<Vec<WireMessage>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
}
