// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Run configuration

use drain_common::select::Direction;
use std::time::Duration;

/// The default priority for deactivated clones: a high-magnitude value,
/// i.e. a low preference under the provider's smaller-wins ordering.
pub const DEFAULT_TARGET_PRIORITY: u32 = 2000;

/// Everything a single migration run needs to know, resolved before the
/// first network call and threaded through by reference.
#[derive(Clone, Debug)]
pub struct Config {
    pub project: String,
    pub region: String,
    pub tunnel: String,
    pub direction: Direction,
    /// Priority assigned to clones during deactivation; ignored on restore,
    /// where each route's original priority comes from its provenance
    /// record.
    pub target_priority: u32,
    /// Grace period between route creation and source deletion, so the new
    /// routes can propagate before the originals disappear.
    pub pause: Duration,
    /// Bound on how long to wait for any single operation; `None` waits
    /// until the operation is terminal.
    pub timeout: Option<Duration>,
    /// Compute and report everything, mutate nothing.
    pub dry_run: bool,
}
