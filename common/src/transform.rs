// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The invertible route transform at the heart of a migration
//!
//! [forward] computes the deactivating clone of an original route; [inverse]
//! reconstructs the original from a clone's provenance record.  Both are pure
//! functions over route values and never touch the network.

use crate::api::Route;
use crate::error::Error;
use crate::provenance;

/// The name tag appended to a clone, deterministic per target priority so
/// repeated runs compute the same name.
pub fn clone_suffix(target_priority: u32) -> String {
    format!("-p{}", target_priority)
}

/// Computes the deactivating clone of an unmanaged route.
///
/// The clone keeps the original's network, tunnel, and destination range,
/// takes `target_priority` (conventionally a high-magnitude value, i.e. a low
/// preference under the provider's smaller-wins ordering), appends the clone
/// suffix to the name, and embeds the original's identity as a provenance
/// record in the description.
///
/// Rejected inputs, both before any mutation would happen:
/// - a route that is already managed (one migration generation at a time);
/// - a route whose name already ends in the clone suffix, since its clone
///   could later be mistaken for one of ours.
pub fn forward(route: &Route, target_priority: u32) -> Result<Route, Error> {
    if provenance::is_managed(route) {
        return Err(Error::invalid_request(&format!(
            "route {:?} was created by a prior deactivation; \
             refusing to clone it again",
            route.name
        )));
    }
    let suffix = clone_suffix(target_priority);
    if route.name.ends_with(&suffix) {
        return Err(Error::invalid_request(&format!(
            "route name {:?} already ends in {:?}; \
             its clone would be indistinguishable from the original",
            route.name, suffix
        )));
    }
    Ok(Route {
        name: format!("{}{}", route.name, suffix),
        network: route.network.clone(),
        next_hop_vpn_tunnel: route.next_hop_vpn_tunnel.clone(),
        dest_range: route.dest_range.clone(),
        priority: target_priority,
        description: Some(provenance::encode(route)),
    })
}

/// Reconstructs the pre-migration route from a managed clone.
///
/// Name, priority, and description come from the provenance record; network,
/// tunnel, and destination range from the clone itself.  This is the exact
/// left inverse of [forward]: `inverse(&forward(&r, p)?) == r` for any
/// unmanaged `r` and any priority `p`.
pub fn inverse(route: &Route) -> Result<Route, Error> {
    let record = provenance::decode(route)
        .map_err(|error| Error::invalid_request(&error.to_string()))?;
    Ok(Route {
        name: record.name,
        network: route.network.clone(),
        next_hop_vpn_tunnel: route.next_hop_vpn_tunnel.clone(),
        dest_range: route.dest_range.clone(),
        priority: record.priority,
        description: record.description,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn original(name: &str, description: Option<&str>) -> Route {
        Route {
            name: name.to_owned(),
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
    fn test_forward_builds_shadow_route() {
        let route = original("r1", None);
        let clone = forward(&route, 2000).unwrap();
        assert_eq!(clone.name, "r1-p2000");
        assert_eq!(clone.priority, 2000);
        assert_eq!(clone.network, route.network);
        assert_eq!(clone.next_hop_vpn_tunnel, route.next_hop_vpn_tunnel);
        assert_eq!(clone.dest_range, route.dest_range);
        let record = provenance::decode(&clone).unwrap();
        assert_eq!(record.name, "r1");
        assert_eq!(record.priority, 1000);
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_forward_marks_clone_as_managed() {
        let route = original("r1", Some("hand-written note"));
        assert!(!provenance::is_managed(&route));
        let clone = forward(&route, 2000).unwrap();
        assert!(provenance::is_managed(&clone));
    }

    #[test]
    fn test_round_trip() {
        for description in [None, Some(""), Some("kept note")] {
            let route = original("r1", description);
            for priority in [0, 500, 2000, u32::MAX] {
                let clone = forward(&route, priority).unwrap();
                assert_eq!(inverse(&clone).unwrap(), route);
            }
        }
    }

    #[test]
    fn test_forward_rejects_managed_routes() {
        let clone = forward(&original("r1", None), 2000).unwrap();
        let error = forward(&clone, 2000).unwrap_err();
        assert!(matches!(error, Error::InvalidRequest { .. }));
    }

    #[test]
    fn test_forward_rejects_suffix_collisions() {
        let route = original("r1-p2000", None);
        let error = forward(&route, 2000).unwrap_err();
        assert!(matches!(error, Error::InvalidRequest { .. }));
        // The same name is fine at a different target priority.
        assert!(forward(&route, 3000).is_ok());
    }

    #[test]
    fn test_inverse_rejects_unmanaged_routes() {
        let error = inverse(&original("r1", Some("plain text"))).unwrap_err();
        assert!(matches!(error, Error::InvalidRequest { .. }));
    }
}
