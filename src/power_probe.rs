// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-metering detection and polling.
//!
//! Not every plug carries a metering chip. One probe at startup asks for an
//! electricity reading: an answer without the expected block means the
//! capability is absent, which is an ordinary outcome, not an error, and
//! no readings loop is started. A device that does answer gets its own
//! 60-second loop, independent of the state poll, funneling through the
//! same queue and reconciler.

use std::sync::Arc;

use crate::command::ElectricityCommand;
use crate::config::DeviceConfig;
use crate::error::Error;
use crate::notify::{TelemetryEntry, TelemetryLog};
use crate::queue::CommandQueue;
use crate::reconcile::{ApplyMode, UpdateReconciler};
use crate::response::ElectricityResponse;
use crate::telemetry::TelemetryFragment;
use crate::transport::{CommandRequest, CommandTransport};

/// Result of the one-shot capability probe.
///
/// `Unsupported` is a first-class outcome, distinct from the transport
/// error channel: a malformed or empty reading means the device has no
/// metering, while an unreachable device is a real failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The device answers with readings; the polling loop may start.
    Supported,
    /// The device has no power metering; nothing further happens.
    Unsupported,
}

/// One-shot capability probe plus the steady-state readings loop.
pub struct PowerTelemetryProbe {
    queue: Arc<CommandQueue>,
    transport: Arc<dyn CommandTransport>,
    reconciler: Arc<UpdateReconciler>,
    log: Arc<dyn TelemetryLog>,
}

impl PowerTelemetryProbe {
    /// Creates a probe; [`run`](Self::run) performs detection and, when
    /// supported, keeps polling.
    #[must_use]
    pub fn new(
        queue: Arc<CommandQueue>,
        transport: Arc<dyn CommandTransport>,
        reconciler: Arc<UpdateReconciler>,
        log: Arc<dyn TelemetryLog>,
    ) -> Self {
        Self {
            queue,
            transport,
            reconciler,
            log,
        }
    }

    /// Probes once, then loops at the readings interval if supported.
    ///
    /// Runs until the owning task is aborted. An unsupported or unreachable
    /// device ends the task quietly; the state poll owns connectivity.
    pub async fn run(self) {
        match self.probe().await {
            Ok(ProbeOutcome::Supported) => {}
            Ok(ProbeOutcome::Unsupported) => {
                tracing::debug!("device has no power metering");
                return;
            }
            Err(error) => {
                tracing::warn!(%error, "power metering probe failed");
                return;
            }
        }

        let mut ticker = tokio::time::interval(DeviceConfig::POWER_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The probe itself was the first reading.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// Performs the one-shot capability detection.
    ///
    /// On `Supported`, marks the capability (sticky for the session) and
    /// applies the first readings.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the request itself failed; a
    /// malformed response is `Ok(Unsupported)`, not an error.
    pub async fn probe(&self) -> Result<ProbeOutcome, Error> {
        let payload = self.request_reading().await?;

        let Ok(response) = serde_json::from_value::<ElectricityResponse>(payload) else {
            return Ok(ProbeOutcome::Unsupported);
        };
        let Some(reading) = response.reading() else {
            return Ok(ProbeOutcome::Unsupported);
        };

        self.reconciler.with_state(|state| {
            if state.mark_power_capable() {
                tracing::debug!("power metering detected");
            }
        });
        self.reconciler
            .apply(&TelemetryFragment::from_electricity(reading), ApplyMode::DeltasOnly);

        Ok(ProbeOutcome::Supported)
    }

    /// Performs one steady-state readings poll.
    ///
    /// A failure here never touches the online flag (that is the state
    /// poll's call), but it records a zero-power entry so consumption
    /// history does not advance during an outage.
    pub async fn poll_once(&self) {
        match self.request_reading().await {
            Ok(payload) => {
                let reading = serde_json::from_value::<ElectricityResponse>(payload)
                    .ok()
                    .and_then(|response| response.reading().cloned());
                match reading {
                    Some(reading) => {
                        self.reconciler.apply(
                            &TelemetryFragment::from_electricity(&reading),
                            ApplyMode::DeltasOnly,
                        );
                    }
                    None => {
                        tracing::warn!("power poll returned an unexpected shape");
                        self.log.record(TelemetryEntry::outage());
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "power poll failed");
                self.log.record(TelemetryEntry::outage());
            }
        }
    }

    async fn request_reading(&self) -> Result<serde_json::Value, Error> {
        let transport = self.transport.clone();
        self.queue
            .submit(move || async move {
                transport
                    .send(CommandRequest::from_command(&ElectricityCommand))
                    .await
                    .map_err(Error::Protocol)
            })
            .await
    }
}

impl std::fmt::Debug for PowerTelemetryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerTelemetryProbe").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use parking_lot::Mutex;
    use serde_json::json;

    struct ScriptedTransport {
        outcomes: Mutex<Vec<Result<serde_json::Value, String>>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<serde_json::Value, String>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
            })
        }
    }

    #[async_trait::async_trait]
    impl CommandTransport for ScriptedTransport {
        async fn send(
            &self,
            _request: CommandRequest,
        ) -> Result<serde_json::Value, crate::error::ProtocolError> {
            match self.outcomes.lock().remove(0) {
                Ok(value) => Ok(value),
                Err(text) => Err(crate::error::ProtocolError::Transport(text)),
            }
        }
    }

    #[derive(Default)]
    struct RecordingLog {
        entries: Mutex<Vec<TelemetryEntry>>,
    }

    impl TelemetryLog for RecordingLog {
        fn record(&self, entry: TelemetryEntry) {
            self.entries.lock().push(entry);
        }
    }

    fn probe(
        transport: Arc<dyn CommandTransport>,
    ) -> (Arc<UpdateReconciler>, Arc<RecordingLog>, PowerTelemetryProbe) {
        let reconciler = Arc::new(UpdateReconciler::new(Arc::new(NullNotifier), 0.0));
        let log = Arc::new(RecordingLog::default());
        let probe = PowerTelemetryProbe::new(
            Arc::new(CommandQueue::new()),
            transport,
            reconciler.clone(),
            log.clone(),
        );
        (reconciler, log, probe)
    }

    #[tokio::test(start_paused = true)]
    async fn probe_detects_metering() {
        let transport = ScriptedTransport::new(vec![Ok(
            json!({"electricity": {"channel": 0, "power": 12_000, "voltage": 2300}}),
        )]);
        let (reconciler, _, probe) = probe(transport);

        assert_eq!(probe.probe().await.unwrap(), ProbeOutcome::Supported);

        let state = reconciler.state();
        assert!(state.power_capable());
        assert_eq!(state.reported_power(), Some(1.2));
        assert_eq!(state.reported_voltage(), Some(23.0));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_missing_block_is_unsupported() {
        let transport = ScriptedTransport::new(vec![Ok(json!({}))]);
        let (reconciler, log, probe) = probe(transport);

        assert_eq!(probe.probe().await.unwrap(), ProbeOutcome::Unsupported);
        assert!(!reconciler.state().power_capable());
        assert!(log.entries.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn probe_malformed_shape_is_unsupported() {
        let transport = ScriptedTransport::new(vec![Ok(json!("nonsense"))]);
        let (_, _, probe) = probe(transport);
        assert_eq!(probe.probe().await.unwrap(), ProbeOutcome::Unsupported);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_transport_error_is_an_error() {
        let transport = ScriptedTransport::new(vec![Err("host unreachable".to_string())]);
        let (reconciler, _, probe) = probe(transport);

        assert!(probe.probe().await.is_err());
        assert!(!reconciler.state().power_capable());
    }

    #[tokio::test(start_paused = true)]
    async fn steady_state_failure_records_outage_entry() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"electricity": {"power": 9000, "voltage": 2310}})),
            Err("request timed out".to_string()),
        ]);
        let (reconciler, log, probe) = probe(transport);

        probe.probe().await.unwrap();
        probe.poll_once().await;

        let entries = log.entries.lock();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].power.abs() < f64::EPSILON);
        // The failing power poll never drops the online flag.
        assert!(reconciler.state().online());
    }

    #[tokio::test(start_paused = true)]
    async fn steady_state_success_updates_readings() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"electricity": {"power": 9000, "voltage": 2310}})),
            Ok(json!({"electricity": {"power": 15_500, "voltage": 2295}})),
        ]);
        let (reconciler, log, probe) = probe(transport);

        probe.probe().await.unwrap();
        probe.poll_once().await;

        let state = reconciler.state();
        assert_eq!(state.reported_power(), Some(15.5));
        assert_eq!(state.reported_voltage(), Some(22.95));
        assert!(log.entries.lock().is_empty());
    }
}
