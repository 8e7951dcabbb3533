// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound notification seams.
//!
//! The host integration layer that renders cache values as user-facing
//! controls, and whatever records consumption history, are external
//! collaborators. They plug in through these two traits; the core never
//! knows what sits behind them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::StateChange;

/// Sink for confirmed state deltas.
///
/// Called exactly once per distinct cache change; never called for a no-op
/// write. Implementations must be cheap and non-blocking; they run inside
/// the reconciler's critical section.
pub trait Notifier: Send + Sync {
    /// Delivers one confirmed change.
    fn notify(&self, change: &StateChange);
}

/// Sink for historical consumption accounting.
///
/// Receives an entry whenever a command is accepted, and a zero-power entry
/// when a steady-state power poll fails, so long-running consumption totals
/// do not advance during an outage.
pub trait TelemetryLog: Send + Sync {
    /// Records one accounting entry.
    fn record(&self, entry: TelemetryEntry);
}

/// One historical accounting entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEntry {
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
    /// Relay state at that moment.
    pub on: bool,
    /// Power draw in watts; zero during outages.
    pub power: f64,
}

impl TelemetryEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn now(on: bool, power: f64) -> Self {
        Self {
            at: Utc::now(),
            on,
            power,
        }
    }

    /// Creates a zero-power entry stamped with the current time.
    #[must_use]
    pub fn outage() -> Self {
        Self::now(false, 0.0)
    }
}

/// A notifier that discards every change.
///
/// Useful for headless deployments and tests that only assert on the cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _change: &StateChange) {}
}

impl TelemetryLog for NullNotifier {
    fn record(&self, _entry: TelemetryEntry) {}
}
