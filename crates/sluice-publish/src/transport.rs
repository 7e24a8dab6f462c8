//! Topic transport capability and its HTTP implementation.
//!
//! The publisher consumes the [`TopicTransport`] trait; production wires in
//! [`HttpTopicClient`], which speaks the topic service's JSON API and maps
//! the service's error codes onto [`PublishError`] variants so retry and
//! breaker decisions stay transport-agnostic.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_core::MessageId;
use tracing::debug;

use crate::error::{PublishError, Result};

/// Capability to publish to a named topic and probe its metadata.
#[async_trait]
pub trait TopicTransport: Send + Sync {
    /// Publishes one message body, returning the service-assigned id.
    async fn publish(&self, topic_arn: &str, body: &str) -> Result<MessageId>;

    /// Lightweight topic-metadata lookup used by the health probe.
    async fn describe_topic(&self, topic_arn: &str) -> Result<()>;
}

/// Configuration for the HTTP topic client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL of the topic service.
    pub endpoint: String,
    /// Socket-level request timeout. The publisher applies its own, tighter
    /// per-attempt budget on top of this.
    pub request_timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9911".to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: "Sluice-Publisher/1.0".to_string(),
        }
    }
}

/// HTTP client for an SNS-compatible topic service.
#[derive(Debug, Clone)]
pub struct HttpTopicClient {
    client: reqwest::Client,
    config: TransportConfig,
}

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    topic_arn: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error_code: String,
    #[serde(default)]
    message: String,
}

impl HttpTopicClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| PublishError::unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(TransportConfig::default())
    }

    fn map_request_error(&self, error: &reqwest::Error) -> PublishError {
        if error.is_timeout() {
            return PublishError::Timeout {
                timeout_ms: u64::try_from(self.config.request_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            };
        }
        if error.is_connect() {
            return PublishError::network(format!("connection failed: {error}"));
        }
        PublishError::network(error.to_string())
    }
}

#[async_trait]
impl TopicTransport for HttpTopicClient {
    async fn publish(&self, topic_arn: &str, body: &str) -> Result<MessageId> {
        let url = format!("{}/publish", self.config.endpoint);
        let request = PublishRequest { topic_arn, message: body };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_request_error(&e))?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            let parsed: PublishResponse = response
                .json()
                .await
                .map_err(|e| PublishError::unexpected(format!("malformed publish response: {e}")))?;

            debug!(message_id = %parsed.message_id, "message accepted by topic");
            return Ok(MessageId(parsed.message_id));
        }

        Err(service_error(status, &read_truncated_body(response).await))
    }

    async fn describe_topic(&self, topic_arn: &str) -> Result<()> {
        let url = format!("{}/topics/{topic_arn}", self.config.endpoint);

        let response =
            self.client.get(&url).send().await.map_err(|e| self.map_request_error(&e))?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(());
        }

        Err(service_error(status, &read_truncated_body(response).await))
    }
}

/// Reads a response body, truncated to a size safe for logs.
async fn read_truncated_body(response: reqwest::Response) -> String {
    const MAX_BODY: usize = 1024;

    match response.bytes().await {
        Ok(bytes) if bytes.len() > MAX_BODY => {
            format!("{}... (truncated)", String::from_utf8_lossy(&bytes[..MAX_BODY]))
        },
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => format!("[failed to read response body: {e}]"),
    }
}

/// Maps a non-2xx response onto the transport error taxonomy.
///
/// Prefers the service's error code when the body parses; falls back to the
/// bare HTTP status otherwise.
fn service_error(status: u16, body: &str) -> PublishError {
    let Ok(parsed) = serde_json::from_str::<ServiceErrorBody>(body) else {
        return PublishError::HttpStatus { status, body: body.to_string() };
    };

    let message =
        if parsed.message.is_empty() { parsed.error_code.clone() } else { parsed.message };

    match parsed.error_code.as_str() {
        "Throttling" | "ThrottledException" => PublishError::Throttled { message },
        "KMSThrottling" => PublishError::KmsThrottled { message },
        "KMSDisabled" | "KMSNotFound" | "KMSOptInRequired" | "KMSAccessDenied" => {
            PublishError::KmsConfiguration { message }
        },
        "InvalidParameter" | "InvalidParameterValue" => PublishError::InvalidParameter { message },
        "AuthorizationError" => PublishError::AuthorizationFailure { message },
        "NotFound" => PublishError::TopicNotFound { message },
        "InternalError" | "InternalFailure" | "ServiceUnavailable" => {
            PublishError::InternalError { message }
        },
        _ => PublishError::HttpStatus { status, body: body.to_string() },
    }
}
