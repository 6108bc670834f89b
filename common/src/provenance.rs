// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Provenance records embedded in a route's `description` field
//!
//! A route created by a deactivation carries a small JSON record in its
//! free-text `description`: a marker key identifying this tool plus the
//! original route's name, priority, and description.  That record is the only
//! durable state the system keeps, and it lives entirely inside the resource
//! it describes, so a later restore can reconstruct the original route with
//! no external memory.
//!
//! Classification fails open: a description that is not JSON, is JSON without
//! the marker key, or carries the marker but not a complete record is treated
//! as "not managed".  Such a route is indistinguishable from one whose
//! metadata an operator edited, and it must be treated as an original rather
//! than aborting the run.

use crate::api::Route;
use serde::Deserialize;
use serde::Serialize;

/// The marker key identifying records written by this tool.
pub const MARKER: &str = "tunnel-drain";

/// The pre-migration identity of a route, as captured at deactivation time.
///
/// Serialization is canonical: declaration-order fields, no extraneous
/// whitespace, `description` omitted when absent.  Repeated encodings of the
/// same route are byte-identical.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Provenance {
    #[serde(rename = "tunnel-drain")]
    marker: u8,
    pub name: String,
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("route {0:?} carries no provenance record")]
pub struct DecodeError(pub String);

fn parse(route: &Route) -> Option<Provenance> {
    let description = route.description.as_deref()?;
    serde_json::from_str(description).ok()
}

/// True iff `route` was created by a prior deactivation.
pub fn is_managed(route: &Route) -> bool {
    parse(route).is_some()
}

/// Returns the original identity captured when `route` was created.
///
/// Fails iff [is_managed] is false for `route`.
pub fn decode(route: &Route) -> Result<Provenance, DecodeError> {
    parse(route).ok_or_else(|| DecodeError(route.name.clone()))
}

/// Produces the canonical record preserving `route`'s current identity.
pub fn encode(route: &Route) -> String {
    let record = Provenance {
        marker: 1,
        name: route.name.clone(),
        priority: route.priority,
        description: route.description.clone(),
    };
    serde_json::to_string(&record).expect("provenance record serializes")
}

#[cfg(test)]
mod test {
    use super::*;

    fn route(description: Option<&str>) -> Route {
        Route {
            name: String::from("r1"),
            network: String::from("projects/p1/global/networks/corp"),
            next_hop_vpn_tunnel: Some(String::from(
                "p1/regions/us-central1/vpnTunnels/t1",
            )),
            dest_range: String::from("10.40.0.0/16"),
            priority: 1000,
            description: description.map(String::from),
        }
    }

    #[test]
    fn test_encoding_is_canonical() {
        assert_eq!(
            encode(&route(None)),
            r#"{"tunnel-drain":1,"name":"r1","priority":1000}"#
        );
        assert_eq!(
            encode(&route(Some("spare line"))),
            r#"{"tunnel-drain":1,"name":"r1","priority":1000,"description":"spare line"}"#
        );
        // Identical inputs encode to identical bytes across runs.
        assert_eq!(encode(&route(None)), encode(&route(None)));
    }

    #[test]
    fn test_decode_round_trips() {
        let original = route(Some("kept"));
        let encoded = encode(&original);
        let record = decode(&route(Some(encoded.as_str()))).unwrap();
        assert_eq!(record.name, "r1");
        assert_eq!(record.priority, 1000);
        assert_eq!(record.description.as_deref(), Some("kept"));
    }

    #[test]
    fn test_classification_fails_open() {
        // No description at all.
        assert!(!is_managed(&route(None)));
        // Free-text description.
        assert!(!is_managed(&route(Some("backhaul route, ask netops"))));
        // Valid JSON without the marker key.
        assert!(!is_managed(&route(Some(
            r#"{"name":"r1","priority":1000}"#
        ))));
        // Marker present but the record is incomplete: operator-edited
        // metadata, treated as original.
        assert!(!is_managed(&route(Some(r#"{"tunnel-drain":1}"#))));
        // Truncated JSON.
        assert!(!is_managed(&route(Some(r#"{"tunnel-drain":1,"name""#))));
    }

    #[test]
    fn test_decode_requires_managed() {
        let error = decode(&route(Some("not a record"))).unwrap_err();
        assert_eq!(error, DecodeError(String::from("r1")));
    }

    #[test]
    fn test_managed_classification() {
        let encoded = encode(&route(None));
        assert!(is_managed(&route(Some(encoded.as_str()))));
        // Extra keys alongside a complete record do not break decoding.
        let padded = r#"{"tunnel-drain":1,"name":"r1","priority":1000,"note":"x"}"#;
        assert!(is_managed(&route(Some(padded))));
    }
}
