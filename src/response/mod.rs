// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed response payloads.
//!
//! Responses are deserialized into structs whose optional blocks are
//! `Option` fields; a missing block is a first-class `None`, never a runtime
//! existence check on raw JSON.

mod electricity;
mod system_all;

pub use electricity::{ElectricityReading, ElectricityResponse};
pub use system_all::{Digest, SystemAllResponse, ToggleEntry};
