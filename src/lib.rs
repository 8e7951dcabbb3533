// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `MeroSync` - synchronization core for a networked on/off smart plug.
//!
//! This library keeps an in-memory state cache consistent with one physical
//! Meross-style appliance that is controlled and observed over two
//! independent transports: a request/response polling channel and an
//! asynchronous push channel. Every outbound command is serialized through
//! a single rate-limited queue, so the device is never driven concurrently
//! or faster than it can handle.
//!
//! # What it does
//!
//! - **Command queue**: one operation in flight at a time, 250ms between
//!   task starts, 10s hard timeout per task
//! - **Reconciliation**: poll results and push messages merge through one
//!   path; a notification fires once per actual delta, never for a no-op
//! - **Capability detection**: the first successful poll resolves which of
//!   two wire encodings the device speaks; a one-shot probe detects power
//!   metering and starts a readings loop only when it is present
//! - **Connectivity tracking**: poll failures drive an online flag through
//!   a heuristic that ignores transient blips on an already-offline device
//!
//! # Quick Start
//!
//! ```no_run
//! use merosync::config::{ConnectionProfile, DeviceConfig};
//! use merosync::device::PlugDevice;
//! use merosync::transport::HttpTransportConfig;
//!
//! #[tokio::main]
//! async fn main() -> merosync::Result<()> {
//!     let device = PlugDevice::http(HttpTransportConfig::new("192.168.1.42"))?
//!         .with_config(DeviceConfig::new(ConnectionProfile::Local))
//!         .build();
//!
//!     // Start the state poll loop and the power-metering probe.
//!     device.start();
//!
//!     // Switch the relay on; the wire encoding follows the detected
//!     // protocol variant.
//!     device.set_desired_state(true).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Push telemetry
//!
//! The push transport's connection lifecycle lives outside this crate.
//! Hand its dispatch loop a [`push::PushUpdateHandler`]:
//!
//! ```ignore
//! let handler = device.push_handler();
//! push_transport.on_message(move |payload| handler.receive_update(&payload));
//! ```

pub mod command;
pub mod config;
pub mod connectivity;
pub mod device;
pub mod error;
pub mod notify;
pub mod poll;
pub mod power_probe;
pub mod push;
pub mod queue;
pub mod reconcile;
pub mod response;
pub mod state;
pub mod telemetry;
pub mod transport;
pub mod types;

pub use command::{Command, ElectricityCommand, SystemAllCommand, ToggleCommand};
pub use config::{ConnectionProfile, DeviceConfig};
pub use connectivity::ConnectivityTracker;
pub use device::{PlugDevice, PlugDeviceBuilder};
pub use error::{Error, ParseError, ProtocolError, Result};
pub use notify::{Notifier, TelemetryEntry, TelemetryLog};
pub use poll::PollScheduler;
pub use power_probe::{PowerTelemetryProbe, ProbeOutcome};
pub use push::PushUpdateHandler;
pub use queue::CommandQueue;
pub use reconcile::{ApplyMode, UpdateReconciler};
pub use response::{ElectricityResponse, SystemAllResponse};
pub use state::{DeviceIdentity, DeviceState, StateChange};
pub use telemetry::TelemetryFragment;
pub use transport::{CommandRequest, CommandTransport};
#[cfg(feature = "http")]
pub use transport::{HttpTransport, HttpTransportConfig};
pub use types::ProtocolVariant;
