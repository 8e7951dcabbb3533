// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device configuration.

use std::time::Duration;

/// How the device is reached, which sets the default polling cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionProfile {
    /// Direct LAN connection; polling can be frequent.
    #[default]
    Local,
    /// Relayed through a cloud broker; polling stays coarse.
    Cloud,
}

impl ConnectionProfile {
    /// Returns the default full-state poll interval for this profile.
    #[must_use]
    pub const fn default_poll_interval(self) -> Duration {
        match self {
            Self::Local => Duration::from_secs(5),
            Self::Cloud => Duration::from_secs(300),
        }
    }
}

/// Configuration for one synchronized device.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use merosync::config::{ConnectionProfile, DeviceConfig};
///
/// let config = DeviceConfig::new(ConnectionProfile::Local)
///     .with_poll_interval(Duration::from_secs(30))
///     .with_in_use_threshold(5.0);
///
/// assert_eq!(config.poll_interval(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    profile: ConnectionProfile,
    poll_interval: Option<Duration>,
    in_use_threshold: f64,
}

impl DeviceConfig {
    /// Interval of the independent power-readings poll loop.
    pub const POWER_POLL_INTERVAL: Duration = Duration::from_secs(60);

    /// Grace delay before a failed command reverts the visible control
    /// value; long enough to let a UI toggle animation settle.
    pub const REVERT_GRACE: Duration = Duration::from_secs(2);

    /// Creates a configuration with the profile's defaults.
    #[must_use]
    pub const fn new(profile: ConnectionProfile) -> Self {
        Self {
            profile,
            poll_interval: None,
            in_use_threshold: 0.0,
        }
    }

    /// Overrides the full-state poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the power level in watts above which the device counts as
    /// actively in use while commanded on. Defaults to 0, so any measured
    /// draw counts.
    #[must_use]
    pub const fn with_in_use_threshold(mut self, watts: f64) -> Self {
        self.in_use_threshold = watts;
        self
    }

    /// Returns the connection profile.
    #[must_use]
    pub const fn profile(&self) -> ConnectionProfile {
        self.profile
    }

    /// Returns the effective full-state poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
            .unwrap_or_else(|| self.profile.default_poll_interval())
    }

    /// Returns the in-use power threshold in watts.
    #[must_use]
    pub const fn in_use_threshold(&self) -> f64 {
        self.in_use_threshold
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new(ConnectionProfile::Local)
    }
}
