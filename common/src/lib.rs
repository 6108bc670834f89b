// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared types and pure logic for migrating routes off a VPN tunnel.
//!
//! Everything in this crate is network-free: the wire types for the Compute
//! API resources the tool touches, the tunnel identity resolver, the
//! provenance codec that makes a deactivation invertible without external
//! state, the route transform itself, and the inventory filter that picks the
//! routes a migration should touch.  The crates that talk to the provider
//! (`compute-client`) and drive the two-phase protocol (`tunnel-drain`) build
//! on these.

pub mod api;
pub mod backoff;
pub mod error;
pub mod identity;
pub mod provenance;
pub mod select;
pub mod transform;

pub use error::Error;
