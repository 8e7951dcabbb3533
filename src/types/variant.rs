// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire-protocol variant detection.

use serde::{Deserialize, Serialize};

/// The wire encoding a device uses for its on/off command.
///
/// Meross firmware generations speak one of two encodings for the same
/// toggle operation. The variant is resolved once, from the first successful
/// full-state poll, and never reverts afterwards.
///
/// # Examples
///
/// ```
/// use merosync::types::ProtocolVariant;
///
/// let mut variant = ProtocolVariant::Unknown;
/// assert!(variant.resolve(ProtocolVariant::Extended));
/// // Resolution is sticky: later evidence is ignored.
/// assert!(!variant.resolve(ProtocolVariant::Legacy));
/// assert_eq!(variant, ProtocolVariant::Extended);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVariant {
    /// No poll has completed yet; commands fall back to Extended encoding.
    #[default]
    Unknown,
    /// Single-channel `Toggle` encoding, no channel field.
    Legacy,
    /// Channel-addressed `ToggleX` encoding.
    Extended,
}

impl ProtocolVariant {
    /// Resolves the variant if it is still [`Unknown`](Self::Unknown).
    ///
    /// Returns `true` if the variant was resolved by this call. Resolving to
    /// `Unknown` is a no-op.
    pub fn resolve(&mut self, detected: Self) -> bool {
        if *self == Self::Unknown && detected != Self::Unknown {
            *self = detected;
            true
        } else {
            false
        }
    }

    /// Returns `true` once the variant has been detected.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        *self != Self::Unknown
    }

    /// Returns a short label for log output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Legacy => "toggle",
            Self::Extended => "togglex",
        }
    }
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
