// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module providing utilities for polling long-running operations with
//! exponential backoff.

use std::time::Duration;

pub use ::backoff::future::{retry, retry_notify};
pub use ::backoff::Error as BackoffError;
pub use ::backoff::{backoff::Backoff, ExponentialBackoff, Notify};

/// Return a backoff policy for polling a route operation to completion.
///
/// The first poll happens after one second; later polls back off to a
/// five-second cap.  `timeout` bounds the total wait for one operation;
/// `None` blocks until the operation reaches a terminal status.
pub fn operation_poll_policy(
    timeout: Option<Duration>,
) -> ::backoff::ExponentialBackoff {
    const INITIAL_INTERVAL: Duration = Duration::from_secs(1);
    const MAX_INTERVAL: Duration = Duration::from_secs(5);
    let current_interval = INITIAL_INTERVAL;
    ::backoff::ExponentialBackoff {
        current_interval,
        initial_interval: INITIAL_INTERVAL,
        multiplier: 2.0,
        max_interval: MAX_INTERVAL,
        max_elapsed_time: timeout,
        ..::backoff::ExponentialBackoff::default()
    }
}
