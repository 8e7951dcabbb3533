// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-metering poll response (`Appliance.Control.Electricity`).

use serde::Deserialize;

/// Payload of a power-readings response.
///
/// Devices without power metering answer without the `electricity` block;
/// [`reading`](Self::reading) returning `None` is how the capability probe
/// recognizes an unsupported device.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElectricityResponse {
    /// Instantaneous readings, absent on devices without metering.
    #[serde(default)]
    pub electricity: Option<ElectricityReading>,
}

/// Instantaneous electricity readings in raw device units.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElectricityReading {
    /// Channel index.
    #[serde(default)]
    pub channel: Option<u32>,

    /// Relay state piggybacked on the reading: 1 = on.
    #[serde(default)]
    pub onoff: Option<u8>,

    /// Instantaneous power draw in milliwatts.
    #[serde(default)]
    pub power: Option<i64>,

    /// Mains voltage in decivolts.
    #[serde(default)]
    pub voltage: Option<i64>,
}

impl ElectricityResponse {
    /// Returns the readings block if the device reported one.
    #[must_use]
    pub fn reading(&self) -> Option<&ElectricityReading> {
        self.electricity.as_ref()
    }
}
