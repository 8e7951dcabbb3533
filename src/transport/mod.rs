// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound transport seam.
//!
//! The core never talks to the network directly; it hands a
//! [`CommandRequest`] to whatever [`CommandTransport`] was injected at
//! construction. The crate ships an HTTP implementation for devices on the
//! local network (feature `http`); any other carrier (a cloud broker, a
//! test double) plugs in through the same trait.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};

use crate::command::Command;
use crate::error::ProtocolError;

/// One outbound request in the appliance message format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Wire namespace, e.g. `"Appliance.Control.ToggleX"`.
    pub namespace: &'static str,
    /// Request method: `GET` for queries, `SET` for mutations.
    pub method: &'static str,
    /// JSON payload.
    pub payload: serde_json::Value,
}

impl CommandRequest {
    /// Serializes a typed command into a transport request.
    #[must_use]
    pub fn from_command<C: Command>(command: &C) -> Self {
        Self {
            namespace: command.namespace(),
            method: command.method(),
            payload: command.payload(),
        }
    }
}

/// Carrier for outbound device requests.
///
/// Implementations return the response's `payload` object, or a
/// [`ProtocolError`] when the device cannot be reached or rejects the
/// request. They do not retry; recovery is the caller's next scheduled poll
/// or explicit command.
#[async_trait::async_trait]
pub trait CommandTransport: Send + Sync {
    /// Sends one request and returns the response payload.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails to send or the device
    /// answers with an error.
    async fn send(&self, request: CommandRequest) -> Result<serde_json::Value, ProtocolError>;
}
