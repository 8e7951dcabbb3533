// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Full-state poll response (`Appliance.System.All`).

use serde::Deserialize;

use crate::types::ProtocolVariant;

/// Payload of a full-state poll response.
///
/// # Examples
///
/// ```
/// use merosync::response::SystemAllResponse;
/// use merosync::types::ProtocolVariant;
///
/// let json = r#"{"all": {"digest": {"togglex": [{"channel": 0, "onoff": 1}]}}}"#;
/// let response: SystemAllResponse = serde_json::from_str(json).unwrap();
///
/// assert_eq!(response.detected_variant(), ProtocolVariant::Extended);
/// assert_eq!(response.onoff(), Some(true));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemAllResponse {
    /// The `all` digest block.
    #[serde(default)]
    pub all: SystemAll,
}

/// The `all` block of a full-state response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemAll {
    /// Control digest (relay state in one of two encodings).
    #[serde(default)]
    pub digest: Digest,

    /// System metadata (identity, network, connectivity).
    #[serde(default)]
    pub system: SystemBlock,
}

/// Relay digest, present in exactly one of the two wire encodings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Digest {
    /// Channel-addressed entries (Extended variant).
    #[serde(default)]
    pub togglex: Vec<ToggleEntry>,

    /// Single unaddressed entry (Legacy variant).
    #[serde(default)]
    pub toggle: Option<ToggleEntry>,
}

/// One relay entry of either digest encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleEntry {
    /// Relay state: 1 = on, 0 = off.
    pub onoff: u8,

    /// Channel index, present only in the Extended encoding.
    #[serde(default)]
    pub channel: Option<u32>,
}

/// The `system` block of a full-state response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemBlock {
    /// Hardware identity.
    #[serde(default)]
    pub hardware: Option<HardwareBlock>,

    /// Firmware and network identity.
    #[serde(default)]
    pub firmware: Option<FirmwareBlock>,

    /// Cloud connectivity status.
    #[serde(default)]
    pub online: Option<OnlineBlock>,
}

/// Hardware identity fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HardwareBlock {
    /// Device MAC address.
    #[serde(rename = "macAddress", default)]
    pub mac_address: Option<String>,

    /// Hardware revision.
    #[serde(default)]
    pub version: Option<String>,
}

/// Firmware and network fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirmwareBlock {
    /// LAN IP address, re-checked on every poll.
    #[serde(rename = "innerIp", default)]
    pub inner_ip: Option<String>,

    /// Firmware version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Cloud connectivity status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnlineBlock {
    /// 1 = online.
    #[serde(default)]
    pub status: Option<u8>,
}

impl SystemAllResponse {
    /// Returns the wire variant this response discriminates, if any.
    ///
    /// A non-empty `togglex` array marks the Extended encoding; a `toggle`
    /// object marks Legacy. A response carrying neither (unusual, but seen
    /// on partial digests) leaves the variant undetermined.
    #[must_use]
    pub fn detected_variant(&self) -> ProtocolVariant {
        if !self.all.digest.togglex.is_empty() {
            ProtocolVariant::Extended
        } else if self.all.digest.toggle.is_some() {
            ProtocolVariant::Legacy
        } else {
            ProtocolVariant::Unknown
        }
    }

    /// Returns the relay state from whichever digest encoding is present.
    #[must_use]
    pub fn onoff(&self) -> Option<bool> {
        self.all
            .digest
            .togglex
            .first()
            .or(self.all.digest.toggle.as_ref())
            .map(|entry| entry.onoff == 1)
    }

    /// Returns the reported LAN IP address, if present.
    #[must_use]
    pub fn inner_ip(&self) -> Option<&str> {
        self.all
            .system
            .firmware
            .as_ref()
            .and_then(|fw| fw.inner_ip.as_deref())
    }

    /// Returns the connectivity flag from the `online` block, if present.
    #[must_use]
    pub fn online(&self) -> Option<bool> {
        self.all
            .system
            .online
            .as_ref()
            .and_then(|online| online.status)
            .map(|status| status == 1)
    }
}
