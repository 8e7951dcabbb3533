// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for devices on the local network.
//!
//! Local-API devices accept a JSON POST to `/config`: a signed `header`
//! naming the namespace and method, plus the command payload. The signature
//! is an MD5 digest over message id, shared device key, and timestamp.

use std::time::Duration;

use chrono::Utc;
use md5::{Digest as _, Md5};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::ProtocolError;
use crate::transport::{CommandRequest, CommandTransport};

/// Configuration for the local HTTP transport.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use merosync::transport::HttpTransportConfig;
///
/// let config = HttpTransportConfig::new("192.168.1.42")
///     .with_key("shared-device-key")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    host: String,
    key: String,
    timeout: Duration,
}

impl HttpTransportConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the device at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            key: String::new(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the shared device key used for message signing.
    ///
    /// Devices paired without a cloud account use an empty key, which is
    /// the default.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the device host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Builds the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}/config", self.host)
        } else {
            format!("http://{}/config", self.host)
        }
    }

    /// Creates an [`HttpTransport`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_transport(self) -> Result<HttpTransport, ProtocolError> {
        let endpoint = self.endpoint();
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpTransport {
            endpoint,
            key: self.key,
            timeout: self.timeout,
            client,
        })
    }
}

/// HTTP implementation of [`CommandTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    key: String,
    timeout: Duration,
    client: Client,
}

/// Envelope of a device response.
#[derive(Debug, Deserialize)]
struct DeviceMessage {
    header: MessageHeader,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    #[serde(default)]
    method: Option<String>,
}

impl HttpTransport {
    /// Builds the signed message envelope for one request.
    fn envelope(&self, request: &CommandRequest) -> serde_json::Value {
        let message_id = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = Utc::now().timestamp();
        let sign = sign_message(&message_id, &self.key, timestamp);

        json!({
            "header": {
                "messageId": message_id,
                "method": request.method,
                "namespace": request.namespace,
                "payloadVersion": 1,
                "from": "/config",
                "timestamp": timestamp,
                "sign": sign,
            },
            "payload": request.payload,
        })
    }

    fn map_error(&self, error: reqwest::Error) -> ProtocolError {
        if error.is_timeout() {
            ProtocolError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else if error.is_connect() {
            ProtocolError::ConnectionFailed(error.to_string())
        } else {
            ProtocolError::Http(error)
        }
    }
}

#[async_trait::async_trait]
impl CommandTransport for HttpTransport {
    async fn send(&self, request: CommandRequest) -> Result<serde_json::Value, ProtocolError> {
        let body = self.envelope(&request);

        tracing::debug!(
            endpoint = %self.endpoint,
            namespace = request.namespace,
            method = request.method,
            "sending device request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let message: DeviceMessage = response.json().await.map_err(|e| self.map_error(e))?;

        tracing::debug!(payload = %message.payload, "received device response");

        if message.header.method.as_deref() == Some("ERROR") {
            return Err(ProtocolError::Transport(format!(
                "device rejected request: {}",
                message.payload
            )));
        }

        Ok(message.payload)
    }
}

/// Computes the local-API message signature.
fn sign_message(message_id: &str, key: &str, timestamp: i64) -> String {
    let mut hasher = Md5::new();
    hasher.update(message_id.as_bytes());
    hasher.update(key.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SystemAllCommand;

    #[test]
    fn endpoint_from_bare_host() {
        let config = HttpTransportConfig::new("192.168.1.42");
        assert_eq!(config.endpoint(), "http://192.168.1.42/config");
    }

    #[test]
    fn endpoint_from_url_host() {
        let config = HttpTransportConfig::new("http://192.168.1.42:8080");
        assert_eq!(config.endpoint(), "http://192.168.1.42:8080/config");
    }

    #[test]
    fn sign_is_stable_and_hex() {
        let sign = sign_message("abc", "key", 1_700_000_000);
        assert_eq!(sign, sign_message("abc", "key", 1_700_000_000));
        assert_eq!(sign.len(), 32);
        assert!(sign.chars().all(|c| c.is_ascii_hexdigit()));

        // Any input change produces a different signature.
        assert_ne!(sign, sign_message("abd", "key", 1_700_000_000));
        assert_ne!(sign, sign_message("abc", "key2", 1_700_000_000));
    }

    #[test]
    fn envelope_carries_namespace_and_signature() {
        let transport = HttpTransportConfig::new("192.168.1.42")
            .with_key("secret")
            .into_transport()
            .unwrap();

        let request = CommandRequest::from_command(&SystemAllCommand);
        let envelope = transport.envelope(&request);

        let header = &envelope["header"];
        assert_eq!(header["namespace"], "Appliance.System.All");
        assert_eq!(header["method"], "GET");
        assert_eq!(header["payloadVersion"], 1);
        assert_eq!(header["sign"].as_str().unwrap().len(), 32);
        assert!(!header["messageId"].as_str().unwrap().is_empty());
    }
}
