// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-device state cache.

use serde::{Deserialize, Serialize};

use crate::types::ProtocolVariant;

/// Tracked state of one smart plug.
///
/// One instance exists per device, owned by the reconciler for its whole
/// lifetime. Telemetry-derived fields start unknown (`None`); `online`
/// starts `true` until a poll failure proves otherwise.
///
/// All setters follow the compare-and-set pattern: they return `true` only
/// when the stored value actually changed, which is what gates change
/// notifications upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Last relay state this core reported outward; source of truth for
    /// outbound intent.
    commanded_on: bool,
    /// Latest power draw in watts, valid only once metering is detected.
    reported_power: Option<f64>,
    /// Latest mains voltage in volts, valid only once metering is detected.
    reported_voltage: Option<f64>,
    /// Commanded on and drawing above the configured threshold.
    in_use: bool,
    /// Connectivity flag.
    online: bool,
    /// Wire-protocol variant, resolved once from the first successful poll.
    variant: ProtocolVariant,
    /// Whether the device exposes power metering; sticky once set.
    power_capable: bool,
    /// Identity and network metadata.
    identity: DeviceIdentity,
}

/// Identity and network metadata captured from poll responses.
///
/// All fields except `ip` are write-once on the first successful poll; the
/// IP address is re-checked on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Device MAC address.
    pub mac_address: Option<String>,
    /// Firmware version.
    pub firmware_version: Option<String>,
    /// Hardware revision.
    pub hardware_version: Option<String>,
    /// LAN IP address.
    pub ip_address: Option<String>,
}

impl DeviceState {
    /// Creates a new state cache for a device that has not been contacted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            online: true,
            ..Self::default()
        }
    }

    // ========== Relay ==========

    /// Returns the last commanded relay state.
    #[must_use]
    pub fn commanded_on(&self) -> bool {
        self.commanded_on
    }

    /// Updates the commanded relay state. Returns `true` on change.
    pub fn set_commanded_on(&mut self, on: bool) -> bool {
        if self.commanded_on == on {
            false
        } else {
            self.commanded_on = on;
            true
        }
    }

    // ========== Electricity ==========

    /// Returns the latest power draw in watts.
    #[must_use]
    pub fn reported_power(&self) -> Option<f64> {
        self.reported_power
    }

    /// Updates the power draw. Returns `true` on change.
    pub fn set_reported_power(&mut self, watts: f64) -> bool {
        if self.reported_power == Some(watts) {
            false
        } else {
            self.reported_power = Some(watts);
            true
        }
    }

    /// Returns the latest mains voltage in volts.
    #[must_use]
    pub fn reported_voltage(&self) -> Option<f64> {
        self.reported_voltage
    }

    /// Updates the mains voltage. Returns `true` on change.
    pub fn set_reported_voltage(&mut self, volts: f64) -> bool {
        if self.reported_voltage == Some(volts) {
            false
        } else {
            self.reported_voltage = Some(volts);
            true
        }
    }

    /// Returns whether the device counts as actively in use.
    #[must_use]
    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Updates the in-use derivation. Returns `true` on change.
    pub fn set_in_use(&mut self, in_use: bool) -> bool {
        if self.in_use == in_use {
            false
        } else {
            self.in_use = in_use;
            true
        }
    }

    // ========== Connectivity ==========

    /// Returns the connectivity flag.
    #[must_use]
    pub fn online(&self) -> bool {
        self.online
    }

    /// Updates the connectivity flag. Returns `true` on change.
    pub fn set_online(&mut self, online: bool) -> bool {
        if self.online == online {
            false
        } else {
            self.online = online;
            true
        }
    }

    // ========== Capabilities ==========

    /// Returns the resolved wire variant.
    #[must_use]
    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    /// Resolves the wire variant if still unknown. Returns `true` if this
    /// call performed the resolution; later calls never change it.
    pub fn resolve_variant(&mut self, detected: ProtocolVariant) -> bool {
        self.variant.resolve(detected)
    }

    /// Returns whether power metering has been detected.
    #[must_use]
    pub fn power_capable(&self) -> bool {
        self.power_capable
    }

    /// Marks power metering as available. Sticky: returns `true` only on the
    /// first call.
    pub fn mark_power_capable(&mut self) -> bool {
        if self.power_capable {
            false
        } else {
            self.power_capable = true;
            true
        }
    }

    // ========== Identity ==========

    /// Returns the captured identity metadata.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Captures write-once identity fields. Fields already set are left
    /// untouched.
    pub fn capture_identity(
        &mut self,
        mac_address: Option<&str>,
        firmware_version: Option<&str>,
        hardware_version: Option<&str>,
    ) {
        if self.identity.mac_address.is_none() {
            self.identity.mac_address = mac_address.map(str::to_owned);
        }
        if self.identity.firmware_version.is_none() {
            self.identity.firmware_version = firmware_version.map(str::to_owned);
        }
        if self.identity.hardware_version.is_none() {
            self.identity.hardware_version = hardware_version.map(str::to_owned);
        }
    }

    /// Updates the IP address. Returns `true` on change.
    pub fn set_ip_address(&mut self, ip: &str) -> bool {
        if self.identity.ip_address.as_deref() == Some(ip) {
            false
        } else {
            self.identity.ip_address = Some(ip.to_owned());
            true
        }
    }
}
