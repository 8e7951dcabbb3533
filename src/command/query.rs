// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Query commands for polling device state.

use serde_json::json;

use crate::command::Command;

/// Command requesting the device's complete current digest in one round trip:
/// relay state, identity metadata, and connectivity status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllCommand;

impl Command for SystemAllCommand {
    fn namespace(&self) -> &'static str {
        "Appliance.System.All"
    }

    fn payload(&self) -> serde_json::Value {
        json!({})
    }
}

/// Command requesting instantaneous power and voltage readings.
///
/// Devices without power metering answer without the `electricity` block;
/// the capability probe treats that shape as "not supported".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElectricityCommand;

impl Command for ElectricityCommand {
    fn namespace(&self) -> &'static str {
        "Appliance.Control.Electricity"
    }

    fn payload(&self) -> serde_json::Value {
        json!({"electricity": {"channel": 0}})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_all_command() {
        assert_eq!(SystemAllCommand.namespace(), "Appliance.System.All");
        assert_eq!(SystemAllCommand.payload(), json!({}));
    }

    #[test]
    fn electricity_command() {
        assert_eq!(
            ElectricityCommand.namespace(),
            "Appliance.Control.Electricity"
        );
        assert_eq!(
            ElectricityCommand.payload(),
            json!({"electricity": {"channel": 0}})
        );
    }
}
