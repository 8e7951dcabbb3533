// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change notifications.
//!
//! A [`StateChange`] names one cache field together with its new value. The
//! reconciler emits exactly one change per confirmed delta; the notification
//! sink renders them as user-facing controls and history entries.

use serde::{Deserialize, Serialize};

/// One confirmed change to a cache field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateChange {
    /// Relay state changed.
    Switch(bool),

    /// Connectivity flag changed.
    Online(bool),

    /// Power draw changed, in watts (already scaled and rounded).
    Power(f64),

    /// Mains voltage changed, in volts (already scaled and rounded).
    Voltage(f64),

    /// In-use derivation changed (commanded on and drawing above threshold).
    InUse(bool),

    /// The device reported a different LAN IP address.
    IpAddress(String),
}

impl StateChange {
    /// Returns the field name this change applies to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Switch(_) => "switch",
            Self::Online(_) => "online",
            Self::Power(_) => "power",
            Self::Voltage(_) => "voltage",
            Self::InUse(_) => "in_use",
            Self::IpAddress(_) => "ip_address",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names() {
        assert_eq!(StateChange::Switch(true).field(), "switch");
        assert_eq!(StateChange::Power(1.2).field(), "power");
        assert_eq!(
            StateChange::IpAddress("10.0.0.7".to_string()).field(),
            "ip_address"
        );
    }

    #[test]
    fn serializes_round_trip() {
        let change = StateChange::Voltage(231.56);
        let json = serde_json::to_string(&change).unwrap();
        let back: StateChange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, change);
    }
}
