// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device builder.

use std::sync::Arc;

use crate::config::DeviceConfig;
use crate::device::PlugDevice;
use crate::notify::{Notifier, NullNotifier, TelemetryLog};
use crate::transport::CommandTransport;

/// Builder for a [`PlugDevice`].
///
/// The transport is mandatory; notification sink, history log, and
/// configuration fall back to quiet defaults.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use merosync::config::{ConnectionProfile, DeviceConfig};
/// use merosync::device::PlugDevice;
/// use merosync::transport::HttpTransportConfig;
///
/// # fn example() -> merosync::Result<()> {
/// let device = PlugDevice::http(HttpTransportConfig::new("192.168.1.42"))?
///     .with_config(DeviceConfig::new(ConnectionProfile::Local).with_in_use_threshold(5.0))
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct PlugDeviceBuilder {
    transport: Arc<dyn CommandTransport>,
    config: DeviceConfig,
    notifier: Arc<dyn Notifier>,
    log: Arc<dyn TelemetryLog>,
}

impl PlugDeviceBuilder {
    pub(crate) fn new(transport: Arc<dyn CommandTransport>) -> Self {
        Self {
            transport,
            config: DeviceConfig::default(),
            notifier: Arc::new(NullNotifier),
            log: Arc::new(NullNotifier),
        }
    }

    /// Sets the device configuration.
    #[must_use]
    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the sink receiving one call per confirmed state delta.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets the sink receiving historical accounting entries.
    #[must_use]
    pub fn with_telemetry_log(mut self, log: Arc<dyn TelemetryLog>) -> Self {
        self.log = log;
        self
    }

    /// Builds the device.
    ///
    /// Must be called from within a tokio runtime: the command queue spawns
    /// its worker here. The poll loops start only on
    /// [`PlugDevice::start`].
    #[must_use]
    pub fn build(self) -> PlugDevice {
        PlugDevice::new(self.config, self.transport, self.notifier, self.log)
    }
}

impl std::fmt::Debug for PlugDeviceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlugDeviceBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
