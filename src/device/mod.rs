// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The synchronized device handle.
//!
//! [`PlugDevice`] wires the core together: one command queue, one
//! reconciler-owned state cache, the two poll loops, and the push entry
//! point. Collaborators (the outbound transport, the notification sink,
//! the history log) are injected at construction, never reached ambiently.
//!
//! # Example
//!
//! ```no_run
//! use merosync::config::{ConnectionProfile, DeviceConfig};
//! use merosync::device::PlugDevice;
//! use merosync::transport::HttpTransportConfig;
//!
//! # async fn example() -> merosync::Result<()> {
//! let device = PlugDevice::http(HttpTransportConfig::new("192.168.1.42"))?
//!     .with_config(DeviceConfig::new(ConnectionProfile::Local))
//!     .build();
//!
//! device.start();
//! device.set_desired_state(true).await?;
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::PlugDeviceBuilder;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::command::ToggleCommand;
use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::notify::{Notifier, TelemetryEntry, TelemetryLog};
use crate::poll::PollScheduler;
use crate::power_probe::PowerTelemetryProbe;
use crate::push::PushUpdateHandler;
use crate::queue::CommandQueue;
use crate::reconcile::UpdateReconciler;
use crate::state::{DeviceState, StateChange};
use crate::transport::{CommandRequest, CommandTransport};

/// Synchronization core for one networked smart plug.
///
/// Owns the device's state cache (through the reconciler) and the command
/// queue that serializes every outbound operation. Dropping the handle
/// cancels the poll loops.
pub struct PlugDevice {
    config: DeviceConfig,
    queue: Arc<CommandQueue>,
    transport: Arc<dyn CommandTransport>,
    reconciler: Arc<UpdateReconciler>,
    notifier: Arc<dyn Notifier>,
    log: Arc<dyn TelemetryLog>,
    command_epoch: Arc<AtomicU64>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PlugDevice {
    pub(crate) fn new(
        config: DeviceConfig,
        transport: Arc<dyn CommandTransport>,
        notifier: Arc<dyn Notifier>,
        log: Arc<dyn TelemetryLog>,
    ) -> Self {
        let reconciler = Arc::new(UpdateReconciler::new(
            notifier.clone(),
            config.in_use_threshold(),
        ));

        Self {
            config,
            queue: Arc::new(CommandQueue::new()),
            transport,
            reconciler,
            notifier,
            log,
            command_epoch: Arc::new(AtomicU64::new(0)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Creates a builder around an already-constructed transport.
    #[must_use]
    pub fn builder(transport: Arc<dyn CommandTransport>) -> PlugDeviceBuilder {
        PlugDeviceBuilder::new(transport)
    }

    /// Creates a builder for a device reached over the local HTTP API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    #[cfg(feature = "http")]
    pub fn http(config: crate::transport::HttpTransportConfig) -> Result<PlugDeviceBuilder> {
        let transport = config.into_transport().map_err(Error::Protocol)?;
        Ok(PlugDeviceBuilder::new(Arc::new(transport)))
    }

    /// Returns a snapshot of the current state cache.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.reconciler.state()
    }

    /// Returns the entry point for the external push transport.
    #[must_use]
    pub fn push_handler(&self) -> PushUpdateHandler {
        PushUpdateHandler::new(self.reconciler.clone())
    }

    /// Starts the state poll loop and the power-metering probe.
    ///
    /// Calling `start` on an already started device is a no-op.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            return;
        }

        let scheduler = PollScheduler::new(
            self.queue.clone(),
            self.transport.clone(),
            self.reconciler.clone(),
            self.config.poll_interval(),
        );
        tasks.push(tokio::spawn(scheduler.run()));

        let probe = PowerTelemetryProbe::new(
            self.queue.clone(),
            self.transport.clone(),
            self.reconciler.clone(),
            self.log.clone(),
        );
        tasks.push(tokio::spawn(probe.run()));
    }

    /// Cancels the poll loops. The cache and queue survive, so the device
    /// can be restarted.
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    /// Requests a relay state change.
    ///
    /// Performs no I/O when the device is already in the desired state.
    /// Otherwise the toggle goes through the command queue; on success the
    /// cache and history are updated. The command is never retried here;
    /// the next poll or the next explicit request is the recovery path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommunicationFailure`] when the command could not
    /// be delivered (including timeouts). The externally visible control
    /// value is reverted to the pre-command cache value after a short grace
    /// delay, unless a newer command has been accepted in the meantime.
    pub async fn set_desired_state(&self, desired_on: bool) -> Result<()> {
        let before = self.state();
        if before.commanded_on() == desired_on {
            tracing::debug!(desired_on, "relay already in desired state");
            return Ok(());
        }

        let epoch = self.command_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let command = ToggleCommand::new(desired_on, before.variant());
        let transport = self.transport.clone();

        let result = self
            .queue
            .submit(move || async move {
                transport
                    .send(CommandRequest::from_command(&command))
                    .await
                    .map_err(Error::Protocol)
            })
            .await;

        match result {
            Ok(_) => {
                self.reconciler.confirm_command(desired_on);
                let power = if desired_on {
                    self.state().reported_power().unwrap_or(0.0)
                } else {
                    0.0
                };
                self.log.record(TelemetryEntry::now(desired_on, power));
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, desired_on, "toggle command failed");
                self.schedule_revert(before.commanded_on(), epoch);
                Err(Error::CommunicationFailure)
            }
        }
    }

    /// After a failed command, reverts the externally visible control value
    /// once the grace delay has passed, but only if no newer command has
    /// been accepted since this failure.
    fn schedule_revert(&self, revert_to: bool, failed_epoch: u64) {
        let notifier = self.notifier.clone();
        let epoch = self.command_epoch.clone();

        tokio::spawn(async move {
            tokio::time::sleep(DeviceConfig::REVERT_GRACE).await;
            if epoch.load(Ordering::SeqCst) == failed_epoch {
                tracing::debug!(revert_to, "reverting control value after failed command");
                notifier.notify(&StateChange::Switch(revert_to));
            }
        });
    }
}

impl Drop for PlugDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PlugDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlugDevice")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
