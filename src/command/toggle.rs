// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay toggle commands.

use serde_json::json;

use crate::command::Command;
use crate::types::ProtocolVariant;

/// Command to switch the relay on or off.
///
/// The wire encoding depends on the detected [`ProtocolVariant`]:
/// `Extended` devices take a channel-addressed `togglex` payload, `Legacy`
/// devices a bare `toggle` payload with the same binary state. Before the
/// first poll has resolved the variant, the command falls back to Extended
/// semantics; the detection step would resolve to the same encoding on the
/// next poll, so a wrong guess is self-correcting.
///
/// # Examples
///
/// ```
/// use merosync::command::{Command, ToggleCommand};
/// use merosync::types::ProtocolVariant;
///
/// let legacy = ToggleCommand::new(true, ProtocolVariant::Legacy);
/// assert_eq!(legacy.namespace(), "Appliance.Control.Toggle");
/// assert_eq!(legacy.payload(), serde_json::json!({"toggle": {"onoff": 1}}));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleCommand {
    on: bool,
    variant: ProtocolVariant,
}

impl ToggleCommand {
    /// Creates a toggle command for the desired state and wire variant.
    #[must_use]
    pub const fn new(on: bool, variant: ProtocolVariant) -> Self {
        Self { on, variant }
    }

    /// Returns the desired relay state.
    #[must_use]
    pub const fn on(&self) -> bool {
        self.on
    }

    const fn onoff(&self) -> u8 {
        if self.on { 1 } else { 0 }
    }

    const fn effective_variant(&self) -> ProtocolVariant {
        match self.variant {
            ProtocolVariant::Legacy => ProtocolVariant::Legacy,
            // Unknown falls back to the Extended encoding.
            ProtocolVariant::Extended | ProtocolVariant::Unknown => ProtocolVariant::Extended,
        }
    }
}

impl Command for ToggleCommand {
    fn namespace(&self) -> &'static str {
        match self.effective_variant() {
            ProtocolVariant::Legacy => "Appliance.Control.Toggle",
            _ => "Appliance.Control.ToggleX",
        }
    }

    fn payload(&self) -> serde_json::Value {
        match self.effective_variant() {
            ProtocolVariant::Legacy => json!({"toggle": {"onoff": self.onoff()}}),
            _ => json!({"togglex": {"channel": 0, "onoff": self.onoff()}}),
        }
    }

    fn method(&self) -> &'static str {
        "SET"
    }
}
