// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport-agnostic telemetry fragments.
//!
//! A [`TelemetryFragment`] carries any subset of the device's observable
//! values. Poll responses and push messages both reduce to this shape before
//! they reach the reconciler, so the merge path cannot tell the transports
//! apart.

use crate::response::{ElectricityReading, SystemAllResponse};

/// A partial observation of device state.
///
/// Every field is optional; absent fields are left untouched by the
/// reconciler. Electricity values stay in raw device units here; scaling
/// happens at the single merge point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryFragment {
    /// Relay state.
    pub onoff: Option<bool>,
    /// Instantaneous power draw in milliwatts.
    pub power_mw: Option<i64>,
    /// Mains voltage in decivolts.
    pub voltage_dv: Option<i64>,
    /// Connectivity flag.
    pub online: Option<bool>,
    /// LAN IP address as reported by the device.
    pub inner_ip: Option<String>,
}

impl TelemetryFragment {
    /// Creates a fragment carrying only a relay state.
    #[must_use]
    pub fn switch(on: bool) -> Self {
        Self {
            onoff: Some(on),
            ..Self::default()
        }
    }

    /// Creates a fragment carrying only a connectivity flag.
    #[must_use]
    pub fn connectivity(online: bool) -> Self {
        Self {
            online: Some(online),
            ..Self::default()
        }
    }

    /// Returns `true` if the fragment carries no values at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Extracts the observable subset of a full-state poll response.
    #[must_use]
    pub fn from_system_all(response: &SystemAllResponse) -> Self {
        Self {
            onoff: response.onoff(),
            power_mw: None,
            voltage_dv: None,
            online: response.online(),
            inner_ip: response.inner_ip().map(str::to_owned),
        }
    }

    /// Extracts the observable subset of an electricity reading.
    #[must_use]
    pub fn from_electricity(reading: &ElectricityReading) -> Self {
        Self {
            onoff: reading.onoff.map(|v| v == 1),
            power_mw: reading.power,
            voltage_dv: reading.voltage,
            online: None,
            inner_ip: None,
        }
    }

    /// Extracts a fragment from an asynchronous push payload.
    ///
    /// Push messages carry the same digest shapes as poll responses:
    /// a `togglex` array, a `toggle` object, or an `electricity` block.
    /// Returns `None` when the payload matches none of them.
    #[must_use]
    pub fn from_push_payload(payload: &serde_json::Value) -> Option<Self> {
        if let Some(entry) = payload
            .get("togglex")
            .and_then(|v| v.as_array())
            .and_then(|entries| entries.first())
            .or_else(|| payload.get("togglex").filter(|v| v.is_object()))
            .or_else(|| payload.get("toggle"))
        {
            let onoff = entry.get("onoff").and_then(serde_json::Value::as_u64)?;
            return Some(Self::switch(onoff == 1));
        }

        if let Some(block) = payload.get("electricity") {
            let reading: ElectricityReading = serde_json::from_value(block.clone()).ok()?;
            return Some(Self::from_electricity(&reading));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_system_all_carries_digest_and_network() {
        let response: SystemAllResponse = serde_json::from_str(
            r#"{"all": {
                "digest": {"togglex": [{"channel": 0, "onoff": 1}]},
                "system": {"firmware": {"innerIp": "10.0.0.7"}, "online": {"status": 1}}
            }}"#,
        )
        .unwrap();

        let fragment = TelemetryFragment::from_system_all(&response);
        assert_eq!(fragment.onoff, Some(true));
        assert_eq!(fragment.online, Some(true));
        assert_eq!(fragment.inner_ip.as_deref(), Some("10.0.0.7"));
        assert!(fragment.power_mw.is_none());
    }

    #[test]
    fn from_push_togglex_array() {
        let payload = json!({"togglex": [{"channel": 0, "onoff": 0}]});
        let fragment = TelemetryFragment::from_push_payload(&payload).unwrap();
        assert_eq!(fragment.onoff, Some(false));
    }

    #[test]
    fn from_push_togglex_object() {
        // Some firmware pushes a bare object instead of an array.
        let payload = json!({"togglex": {"channel": 0, "onoff": 1}});
        let fragment = TelemetryFragment::from_push_payload(&payload).unwrap();
        assert_eq!(fragment.onoff, Some(true));
    }

    #[test]
    fn from_push_legacy_toggle() {
        let payload = json!({"toggle": {"onoff": 1}});
        let fragment = TelemetryFragment::from_push_payload(&payload).unwrap();
        assert_eq!(fragment.onoff, Some(true));
    }

    #[test]
    fn from_push_electricity() {
        let payload = json!({"electricity": {"power": 4500, "voltage": 2291}});
        let fragment = TelemetryFragment::from_push_payload(&payload).unwrap();
        assert_eq!(fragment.power_mw, Some(4500));
        assert_eq!(fragment.voltage_dv, Some(2291));
        assert!(fragment.onoff.is_none());
    }

    #[test]
    fn from_push_unrecognized_payload() {
        assert!(TelemetryFragment::from_push_payload(&json!({"bind": {}})).is_none());
        assert!(TelemetryFragment::from_push_payload(&json!("garbage")).is_none());
        assert!(TelemetryFragment::from_push_payload(&json!({"toggle": {"onoff": "yes"}})).is_none());
    }

    #[test]
    fn empty_fragment() {
        assert!(TelemetryFragment::default().is_empty());
        assert!(!TelemetryFragment::switch(true).is_empty());
    }
}
