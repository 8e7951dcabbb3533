// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed device command definitions.
//!
//! Every outbound operation is a typed command serialized to the appliance
//! message format: a namespace string plus a JSON payload.
//!
//! | Command Type | Namespace | Purpose |
//! |--------------|-----------|---------|
//! | [`ToggleCommand`] | `Appliance.Control.ToggleX` / `.Toggle` | Switch the relay on or off |
//! | [`SystemAllCommand`] | `Appliance.System.All` | Full-state poll (digest, identity, connectivity) |
//! | [`ElectricityCommand`] | `Appliance.Control.Electricity` | Power/voltage readings |
//!
//! # Examples
//!
//! ```
//! use merosync::command::{Command, ToggleCommand};
//! use merosync::types::ProtocolVariant;
//!
//! let cmd = ToggleCommand::new(true, ProtocolVariant::Extended);
//! assert_eq!(cmd.namespace(), "Appliance.Control.ToggleX");
//! assert_eq!(
//!     cmd.payload(),
//!     serde_json::json!({"togglex": {"channel": 0, "onoff": 1}})
//! );
//! ```

mod query;
mod toggle;

pub use query::{ElectricityCommand, SystemAllCommand};
pub use toggle::ToggleCommand;

/// A command that can be sent to the device.
///
/// Commands are serialized to the appliance message format for transmission
/// over whichever transport carries outbound requests.
pub trait Command {
    /// Returns the wire namespace, e.g. `"Appliance.Control.ToggleX"`.
    fn namespace(&self) -> &'static str;

    /// Returns the JSON payload sent with the command.
    ///
    /// Query commands return an empty object.
    fn payload(&self) -> serde_json::Value;

    /// Returns the request method: `SET` for mutations, `GET` for queries.
    fn method(&self) -> &'static str {
        "GET"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProtocolVariant;

    #[test]
    fn toggle_is_a_set() {
        let cmd = ToggleCommand::new(false, ProtocolVariant::Legacy);
        assert_eq!(cmd.method(), "SET");
    }

    #[test]
    fn queries_are_gets() {
        assert_eq!(SystemAllCommand.method(), "GET");
        assert_eq!(ElectricityCommand.method(), "GET");
    }
}
