// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound push telemetry.
//!
//! The push transport (connection lifecycle, subscribe/publish mechanics)
//! lives outside this crate; it hands each message for this device to
//! [`PushUpdateHandler::receive_update`]. Push delivery is not an outbound
//! command, so it bypasses the command queue entirely: it is neither
//! rate-limited nor serialized against outbound requests.

use std::sync::Arc;

use crate::reconcile::{ApplyMode, UpdateReconciler};
use crate::telemetry::TelemetryFragment;

/// Entry point for asynchronous telemetry fragments.
///
/// Cheap to clone; hand one to the push transport's dispatch loop.
#[derive(Debug, Clone)]
pub struct PushUpdateHandler {
    reconciler: Arc<UpdateReconciler>,
}

impl PushUpdateHandler {
    pub(crate) fn new(reconciler: Arc<UpdateReconciler>) -> Self {
        Self { reconciler }
    }

    /// Feeds one push payload into the reconciler.
    ///
    /// Malformed payloads are dropped after a diagnostic log entry; this
    /// method never fails, so a bad message cannot destabilize the device's
    /// reconciled state or its caller.
    pub fn receive_update(&self, payload: &serde_json::Value) {
        match TelemetryFragment::from_push_payload(payload) {
            Some(fragment) => {
                tracing::debug!(?fragment, "push update");
                self.reconciler.apply(&fragment, ApplyMode::DeltasOnly);
            }
            None => {
                tracing::debug!(%payload, "ignoring unrecognized push payload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use serde_json::json;

    fn handler() -> (Arc<UpdateReconciler>, PushUpdateHandler) {
        let reconciler = Arc::new(UpdateReconciler::new(Arc::new(NullNotifier), 0.0));
        let handler = PushUpdateHandler::new(reconciler.clone());
        (reconciler, handler)
    }

    #[test]
    fn applies_togglex_push() {
        let (reconciler, handler) = handler();

        handler.receive_update(&json!({"togglex": [{"channel": 0, "onoff": 1}]}));
        assert!(reconciler.state().commanded_on());
    }

    #[test]
    fn applies_electricity_push() {
        let (reconciler, handler) = handler();

        handler.receive_update(&json!({"electricity": {"power": 12_000, "voltage": 2300}}));
        let state = reconciler.state();
        assert_eq!(state.reported_power(), Some(1.2));
        assert_eq!(state.reported_voltage(), Some(23.0));
    }

    #[test]
    fn malformed_push_is_ignored() {
        let (reconciler, handler) = handler();
        let before = reconciler.state();

        handler.receive_update(&json!({"togglex": [{"channel": 0}]}));
        handler.receive_update(&json!(42));
        handler.receive_update(&json!({"unrelated": true}));

        assert_eq!(reconciler.state(), before);
    }
}
