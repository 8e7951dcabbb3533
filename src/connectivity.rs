// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectivity heuristics for poll failures.
//!
//! A single transient failure must not flap a healthy device into a
//! persistent offline notification, but a failure on the very first poll
//! has to surface immediately: the device may simply not be there.

use crate::error::Error;

/// Error-text fragments that identify a connectivity failure, as opposed to
/// a device-side rejection or a parse problem.
const CONNECTIVITY_SIGNATURES: &[&str] = &[
    "timed out",
    "timeout",
    "unreachable",
    "no route to host",
    "connection refused",
    "connection failed",
];

/// Classifies poll failures and decides when the online flag drops.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectivityTracker;

impl ConnectivityTracker {
    /// Returns `true` if the error looks like the device is unreachable.
    ///
    /// Queue-level timeouts always count; other errors are matched against
    /// known connectivity signatures in their text.
    #[must_use]
    pub fn is_connectivity_failure(error: &Error) -> bool {
        if error.is_timeout() {
            return true;
        }
        let text = error.to_string().to_ascii_lowercase();
        CONNECTIVITY_SIGNATURES
            .iter()
            .any(|signature| text.contains(signature))
    }

    /// Decides whether a poll failure should mark the device offline.
    ///
    /// Only connectivity failures qualify, and only when the device was
    /// previously online or this was the first poll. Repeated failures on
    /// an already-offline device stay silent.
    #[must_use]
    pub fn should_mark_offline(error: &Error, was_online: bool, first_run: bool) -> bool {
        Self::is_connectivity_failure(error) && (was_online || first_run)
    }
}
