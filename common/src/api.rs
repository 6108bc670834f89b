// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire representations of the Compute API resources this tool touches
//!
//! Field names follow the provider's JSON (camelCase on the wire).  Only the
//! attributes the migration needs are modeled; everything else the provider
//! returns is ignored on deserialization.

use serde::Deserialize;
use serde::Serialize;

/// A routing-table entry in the target network.
///
/// The same shape serves both as a listing result and as the body of an
/// insert request: the provider accepts the resource representation it
/// returns, and the output-only fields this tool never reads are simply not
/// modeled.  Routes are never mutated in place -- the provider has no
/// update-priority operation, so a migration is always create-new plus
/// delete-old.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Unique name within the project.
    pub name: String,
    /// Resource path of the virtual network this route belongs to.
    pub network: String,
    /// Resource path of the tunnel carrying this route's traffic, absent for
    /// routes whose next hop is not a VPN tunnel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop_vpn_tunnel: Option<String>,
    /// Destination CIDR.
    pub dest_range: String,
    /// Route selection preference; smaller values win.
    pub priority: u32,
    /// Free-text metadata.  A route created by this tool carries its
    /// provenance record here (see [crate::provenance]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Handle for an asynchronous create or delete request.
///
/// Owned by the provider; this tool only polls a handle to completion and
/// then discards it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Opaque operation id, used to poll for status.
    pub name: String,
    pub status: OperationStatus,
    /// Present only on a terminal operation that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

/// The provider's error payload: a list of individual error details.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationErrors {
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationErrors {
    /// Flatten the provider's error list into one printable line.
    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            return String::from("provider reported an unspecified error");
        }
        self.errors
            .iter()
            .map(|detail| match (&detail.code, &detail.message) {
                (Some(code), Some(message)) => {
                    format!("{}: {}", code, message)
                }
                (Some(code), None) => code.clone(),
                (None, Some(message)) => message.clone(),
                (None, None) => String::from("unspecified"),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A VPN tunnel, as much of it as the pre-flight lookup and verbose listing
/// need.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnTunnel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_vpn_gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_route_wire_format() {
        let json = r#"{
            "name": "corp-to-dc",
            "network": "https://www.googleapis.com/compute/v1/projects/p1/global/networks/corp",
            "nextHopVpnTunnel": "https://www.googleapis.com/compute/v1/projects/p1/regions/us-central1/vpnTunnels/t1",
            "destRange": "10.40.0.0/16",
            "priority": 1000,
            "kind": "compute#route"
        }"#;
        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.name, "corp-to-dc");
        assert_eq!(route.priority, 1000);
        assert_eq!(route.description, None);
        assert!(route.next_hop_vpn_tunnel.unwrap().ends_with("/vpnTunnels/t1"));
    }

    #[test]
    fn test_operation_wire_format() {
        let op: Operation = serde_json::from_str(
            r#"{"name": "operation-123", "status": "RUNNING"}"#,
        )
        .unwrap();
        assert_eq!(op.status, OperationStatus::Running);
        assert_eq!(op.error, None);

        let op: Operation = serde_json::from_str(
            r#"{
                "name": "operation-456",
                "status": "DONE",
                "error": {"errors": [
                    {"code": "RESOURCE_ALREADY_EXISTS",
                     "message": "route exists"}
                ]}
            }"#,
        )
        .unwrap();
        assert_eq!(op.status, OperationStatus::Done);
        assert_eq!(
            op.error.unwrap().summary(),
            "RESOURCE_ALREADY_EXISTS: route exists"
        );
    }

    #[test]
    fn test_error_summary_handles_sparse_details() {
        let errors = OperationErrors {
            errors: vec![
                OperationErrorDetail { code: None, message: None },
                OperationErrorDetail {
                    code: Some(String::from("QUOTA_EXCEEDED")),
                    message: None,
                },
            ],
        };
        assert_eq!(errors.summary(), "unspecified; QUOTA_EXCEEDED");
        assert_eq!(
            OperationErrors::default().summary(),
            "provider reported an unspecified error"
        );
    }
}
