// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error handling facilities for the route migration tool
//!
//! Every fatal condition a migration can hit maps onto one of these
//! variants so callers can tell terminal operation failures apart from
//! transport trouble that merely looks retryable.  Provenance decode
//! problems are deliberately *not* represented here: a malformed record
//! classifies a route as unmanaged (see [crate::provenance]) and is never
//! fatal.

use std::fmt;
use std::fmt::Display;

/// An error generated while preparing or running a migration
///
/// Variants are deliberately coarse: a new one is only worth adding when a
/// caller needs to handle it differently from the existing kinds.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Credentials were missing or rejected.  Fatal at startup, before any
    /// migration work is attempted.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// A resource looked up by name does not exist.  Fatal before any
    /// mutation.
    #[error("{type_name} not found: {name:?}")]
    NotFound { type_name: ResourceType, name: String },

    /// A create or delete operation reported a terminal error.  Fatal;
    /// aborts the remaining steps of the current phase.
    #[error("operation {operation:?} failed: {message}")]
    Operation { operation: String, message: String },

    /// The request was well-formed but cannot be carried out given the
    /// current state of the route set.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The provider (or the path to it) is unavailable.
    #[error("service unavailable: {internal_message}")]
    ServiceUnavailable { internal_message: String },

    /// An unhandled operational error.
    #[error("internal error: {internal_message}")]
    InternalError { internal_message: String },
}

/// The kinds of resource a lookup can fail to find.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceType {
    Route,
    VpnTunnel,
    Operation,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Route => "route",
            ResourceType::VpnTunnel => "VPN tunnel",
            ResourceType::Operation => "operation",
        };
        write!(f, "{}", name)
    }
}

impl Error {
    pub fn authentication(message: &str) -> Error {
        Error::Authentication { message: message.to_owned() }
    }

    pub fn not_found(type_name: ResourceType, name: &str) -> Error {
        Error::NotFound { type_name, name: name.to_owned() }
    }

    pub fn operation_failed(operation: &str, message: &str) -> Error {
        Error::Operation {
            operation: operation.to_owned(),
            message: message.to_owned(),
        }
    }

    pub fn invalid_request(message: &str) -> Error {
        Error::InvalidRequest { message: message.to_owned() }
    }

    /// For transient failures where a caller might reasonably retry.
    pub fn unavail(message: &str) -> Error {
        Error::ServiceUnavailable { internal_message: message.to_owned() }
    }

    /// For operational conditions that should not happen but cannot be
    /// reasonably handled at runtime.
    pub fn internal_error(message: &str) -> Error {
        Error::InternalError { internal_message: message.to_owned() }
    }

    /// Whether the error is likely transient and could reasonably be
    /// retried.
    ///
    /// The migration itself never retries a failed phase; this only informs
    /// the per-poll retry loop in the operation waiter.
    pub fn retryable(&self) -> bool {
        match self {
            Error::ServiceUnavailable { .. } => true,

            Error::Authentication { .. }
            | Error::NotFound { .. }
            | Error::Operation { .. }
            | Error::InvalidRequest { .. }
            | Error::InternalError { .. } => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::not_found(ResourceType::VpnTunnel, "t1").to_string(),
            "VPN tunnel not found: \"t1\""
        );
        assert_eq!(
            Error::operation_failed("operation-7", "quota exhausted")
                .to_string(),
            "operation \"operation-7\" failed: quota exhausted"
        );
    }

    #[test]
    fn test_only_unavailability_is_retryable() {
        assert!(Error::unavail("connection reset").retryable());
        assert!(!Error::authentication("expired token").retryable());
        assert!(!Error::operation_failed("op", "boom").retryable());
        assert!(!Error::not_found(ResourceType::Route, "r1").retryable());
    }
}
