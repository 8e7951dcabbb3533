// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scaling for raw electricity readings.
//!
//! The device reports power in integer milliwatts and voltage in integer
//! decivolts. Both are scaled to display units and rounded to two decimals
//! before they are compared against the cache, so repeated reports of the
//! same reading never register as a change.

/// Raw power divisor: milliwatts per watt.
const POWER_DIVISOR: f64 = 1000.0;

/// Raw voltage divisor: decivolts per volt.
const VOLTAGE_DIVISOR: f64 = 100.0;

/// Converts a raw milliwatt reading into watts, rounded to two decimals.
// Raw readings stay far below 2^53; the cast is exact in practice.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn scale_milliwatts(raw: i64) -> f64 {
    round2(raw as f64 / POWER_DIVISOR)
}

/// Converts a raw decivolt reading into volts, rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn scale_decivolts(raw: i64) -> f64 {
    round2(raw as f64 / VOLTAGE_DIVISOR)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
