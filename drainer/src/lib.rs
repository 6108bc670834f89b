// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-phase migration of routes off (and back onto) a VPN tunnel
//!
//! This is a small shim over the library modules so the binary stays thin
//! and tests can drive the orchestrator directly.

pub mod config;
pub mod migrate;
