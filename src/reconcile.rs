// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Telemetry reconciliation.
//!
//! [`UpdateReconciler`] is the single merge point for every inbound
//! observation, whether it arrived through a poll or through the push
//! channel. All cache mutation goes through it; poll loops and the push
//! handler never write fields directly.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::notify::Notifier;
use crate::state::{DeviceState, StateChange};
use crate::telemetry::TelemetryFragment;
use crate::types::{scale_decivolts, scale_milliwatts};

/// How a fragment is merged into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Notify only on actual deltas. The steady-state mode.
    DeltasOnly,
    /// Notify every present field regardless of deltas. Used once, for the
    /// first poll's initial materialization.
    Forced,
}

/// Merges telemetry fragments into the device state cache and emits one
/// notification per confirmed delta.
///
/// The reconciler owns the cache for the device's lifetime. It holds the
/// lock for the duration of one `apply` call, so the push path may run
/// concurrently with a queued poll without additional coordination.
pub struct UpdateReconciler {
    state: RwLock<DeviceState>,
    notifier: Arc<dyn Notifier>,
    in_use_threshold: f64,
}

impl UpdateReconciler {
    /// Creates a reconciler around a fresh cache.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, in_use_threshold: f64) -> Self {
        Self {
            state: RwLock::new(DeviceState::new()),
            notifier,
            in_use_threshold,
        }
    }

    /// Returns a snapshot of the current cache.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state.read().clone()
    }

    /// Runs a closure against the locked cache, for writers that are not
    /// fragment-shaped (variant resolution, identity capture).
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut DeviceState) -> T) -> T {
        f(&mut self.state.write())
    }

    /// Merges one telemetry fragment into the cache.
    ///
    /// Per present field: compare against the cache, write on change, and
    /// emit exactly one notification for that field. Raw electricity values
    /// are scaled before comparison, so a repeated reading is a no-op.
    pub fn apply(&self, fragment: &TelemetryFragment, mode: ApplyMode) {
        let forced = mode == ApplyMode::Forced;
        let mut state = self.state.write();

        if let Some(on) = fragment.onoff {
            if state.set_commanded_on(on) || forced {
                self.notifier.notify(&StateChange::Switch(on));
            }
        }

        if let Some(raw) = fragment.power_mw {
            let watts = scale_milliwatts(raw);
            if state.set_reported_power(watts) || forced {
                self.notifier.notify(&StateChange::Power(watts));
            }
        }

        if let Some(raw) = fragment.voltage_dv {
            let volts = scale_decivolts(raw);
            if state.set_reported_voltage(volts) || forced {
                self.notifier.notify(&StateChange::Voltage(volts));
            }
        }

        if let Some(online) = fragment.online {
            if state.set_online(online) || forced {
                self.notifier.notify(&StateChange::Online(online));
            }
        }

        if let Some(ip) = fragment.inner_ip.as_deref() {
            if state.set_ip_address(ip) || forced {
                tracing::debug!(ip, "device address");
                self.notifier
                    .notify(&StateChange::IpAddress(ip.to_owned()));
            }
        }

        // The in-use derivation depends on the relay and the power reading;
        // recompute once whenever either was part of the fragment.
        if fragment.onoff.is_some() || fragment.power_mw.is_some() {
            self.refresh_in_use(&mut state, forced);
        }
    }

    /// Records an accepted outbound command.
    ///
    /// This is the command-acceptance writer for `commanded_on`; everything
    /// else still flows through [`apply`](Self::apply).
    pub fn confirm_command(&self, on: bool) {
        let mut state = self.state.write();
        if state.set_commanded_on(on) {
            self.notifier.notify(&StateChange::Switch(on));
            self.refresh_in_use(&mut state, false);
        }
    }

    /// Recomputes the in-use derivation after relay or power changes.
    fn refresh_in_use(&self, state: &mut DeviceState, forced: bool) {
        let in_use = state.commanded_on()
            && state
                .reported_power()
                .is_some_and(|watts| watts > self.in_use_threshold);
        if state.set_in_use(in_use) || forced {
            self.notifier.notify(&StateChange::InUse(in_use));
        }
    }
}

impl std::fmt::Debug for UpdateReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateReconciler")
            .field("in_use_threshold", &self.in_use_threshold)
            .finish_non_exhaustive()
    }
}
