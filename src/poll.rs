// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic full-state polling.
//!
//! The scheduler alternates between idle and polling: each tick submits one
//! `Appliance.System.All` request through the command queue, unless the
//! queue is already busy with a command or an earlier poll. In that case the tick
//! is skipped rather than piled up behind it.
//!
//! The first successful poll does double duty as capability detection: it
//! resolves the wire-protocol variant from the digest encoding, captures
//! the device's identity metadata, and force-materializes every observable
//! so the host layer starts from a fully populated picture.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::command::SystemAllCommand;
use crate::connectivity::ConnectivityTracker;
use crate::error::Error;
use crate::queue::CommandQueue;
use crate::reconcile::{ApplyMode, UpdateReconciler};
use crate::response::SystemAllResponse;
use crate::telemetry::TelemetryFragment;
use crate::transport::{CommandRequest, CommandTransport};

/// Drives the periodic full-state poll loop.
pub struct PollScheduler {
    queue: Arc<CommandQueue>,
    transport: Arc<dyn CommandTransport>,
    reconciler: Arc<UpdateReconciler>,
    interval: Duration,
}

impl PollScheduler {
    /// Creates a scheduler; [`run`](Self::run) starts the loop.
    #[must_use]
    pub fn new(
        queue: Arc<CommandQueue>,
        transport: Arc<dyn CommandTransport>,
        reconciler: Arc<UpdateReconciler>,
        interval: Duration,
    ) -> Self {
        Self {
            queue,
            transport,
            reconciler,
            interval,
        }
    }

    /// Runs the poll loop until the owning task is aborted.
    ///
    /// The first tick fires immediately. A tick that finds the queue busy
    /// is skipped; the queue's own spacing makes an extra poll pointless
    /// while something else is in flight.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut first_run = true;

        loop {
            ticker.tick().await;

            if self.queue.is_busy() {
                tracing::trace!("skipping state poll; an operation is in flight");
                continue;
            }

            if self.poll_once(first_run).await {
                first_run = false;
            }
        }
    }

    /// Performs one poll cycle. Returns `true` on a successful poll.
    ///
    /// `first_run` stays set until the first success, so a device that is
    /// absent at startup still gets its initial materialization from the
    /// first poll that reaches it.
    pub async fn poll_once(&self, first_run: bool) -> bool {
        let transport = self.transport.clone();
        let result = self
            .queue
            .submit(move || async move {
                transport
                    .send(CommandRequest::from_command(&SystemAllCommand))
                    .await
                    .map_err(Error::Protocol)
            })
            .await;

        match result {
            Ok(payload) => match serde_json::from_value::<SystemAllResponse>(payload) {
                Ok(response) => {
                    self.reconcile_success(&response, first_run);
                    true
                }
                Err(error) => {
                    tracing::warn!(%error, "state poll returned an unexpected shape");
                    false
                }
            },
            Err(error) => {
                self.reconcile_failure(&error, first_run);
                false
            }
        }
    }

    fn reconcile_success(&self, response: &SystemAllResponse, first_run: bool) {
        if first_run {
            let detected = response.detected_variant();
            self.reconciler.with_state(|state| {
                if state.resolve_variant(detected) {
                    tracing::debug!(variant = %detected, "wire protocol detected");
                }

                let system = &response.all.system;
                state.capture_identity(
                    system
                        .hardware
                        .as_ref()
                        .and_then(|hw| hw.mac_address.as_deref()),
                    system
                        .firmware
                        .as_ref()
                        .and_then(|fw| fw.version.as_deref()),
                    system.hardware.as_ref().and_then(|hw| hw.version.as_deref()),
                );
            });
        }

        let mut fragment = TelemetryFragment::from_system_all(response);
        // A reachable device with no online block is online.
        fragment.online = Some(fragment.online.unwrap_or(true));

        let mode = if first_run {
            ApplyMode::Forced
        } else {
            ApplyMode::DeltasOnly
        };
        self.reconciler.apply(&fragment, mode);
    }

    fn reconcile_failure(&self, error: &Error, first_run: bool) {
        tracing::warn!(%error, first_run, "state poll failed");

        let was_online = self.reconciler.state().online();
        if ConnectivityTracker::should_mark_offline(error, was_online, first_run) {
            self.reconciler
                .apply(&TelemetryFragment::connectivity(false), ApplyMode::DeltasOnly);
        }
    }
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
