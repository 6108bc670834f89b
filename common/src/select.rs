// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selecting the routes a migration should touch

use crate::api::Route;
use crate::identity::TunnelKey;
use crate::provenance;
use parse_display::Display;
use parse_display::FromStr;

/// Which half of the migration is being run.
#[derive(Clone, Copy, Debug, Display, Eq, FromStr, PartialEq)]
#[display(style = "lowercase")]
pub enum Direction {
    /// Clone each original route at the target priority, then delete the
    /// originals.
    Deactivate,
    /// Recreate the originals from the clones' provenance, then delete the
    /// clones.
    Restore,
}

/// Filters a project's route inventory down to the migration worklist:
/// routes pointing at the given tunnel whose provenance state matches the
/// direction (deactivation wants originals, restoration wants clones).
///
/// Result order is the inventory's listing order, which the provider does not
/// guarantee to be stable across runs; callers must not depend on it beyond
/// per-route independence.  An empty result is a valid worklist.
///
/// For restoration, selection is by provenance alone -- the clone name suffix
/// is never consulted, so a clone renamed out-of-band remains restorable and
/// a coincidentally-suffixed original is never misclassified.
pub fn select_for_migration<'a>(
    routes: &'a [Route],
    key: &TunnelKey,
    direction: Direction,
) -> Vec<&'a Route> {
    routes
        .iter()
        .filter(|route| {
            let Some(next_hop) = route.next_hop_vpn_tunnel.as_deref() else {
                return false;
            };
            if !key.matches(next_hop) {
                return false;
            }
            match direction {
                Direction::Deactivate => !provenance::is_managed(route),
                Direction::Restore => provenance::is_managed(route),
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transform;

    fn key() -> TunnelKey {
        TunnelKey::new("p1", "us-central1", "t1")
    }

    fn tunnel_route(name: &str, tunnel: &str) -> Route {
        Route {
            name: name.to_owned(),
            network: String::from("projects/p1/global/networks/corp"),
            next_hop_vpn_tunnel: Some(format!(
                "p1/regions/us-central1/vpnTunnels/{}",
                tunnel
            )),
            dest_range: String::from("10.40.0.0/16"),
            priority: 1000,
            description: None,
        }
    }

    fn gateway_route(name: &str) -> Route {
        Route { next_hop_vpn_tunnel: None, ..tunnel_route(name, "unused") }
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(
            "deactivate".parse::<Direction>().unwrap(),
            Direction::Deactivate
        );
        assert_eq!("restore".parse::<Direction>().unwrap(), Direction::Restore);
        assert!("drain".parse::<Direction>().is_err());
        assert_eq!(Direction::Deactivate.to_string(), "deactivate");
    }

    #[test]
    fn test_selection_by_tunnel_and_provenance() {
        let clone = transform::forward(&tunnel_route("r2", "t1"), 2000).unwrap();
        let routes = vec![
            tunnel_route("r1", "t1"),
            clone.clone(),
            tunnel_route("r3", "t2"),
            gateway_route("r4"),
        ];

        let deactivate =
            select_for_migration(&routes, &key(), Direction::Deactivate);
        assert_eq!(
            deactivate.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["r1"]
        );

        let restore =
            select_for_migration(&routes, &key(), Direction::Restore);
        assert_eq!(
            restore.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec![clone.name.as_str()]
        );
    }

    #[test]
    fn test_directions_partition_the_tunnel_routes() {
        let mut routes = vec![
            tunnel_route("r1", "t1"),
            tunnel_route("r2", "t1"),
            tunnel_route("other", "t2"),
        ];
        routes
            .push(transform::forward(&tunnel_route("r3", "t1"), 2000).unwrap());

        let deactivate =
            select_for_migration(&routes, &key(), Direction::Deactivate);
        let restore =
            select_for_migration(&routes, &key(), Direction::Restore);

        // Disjoint...
        for route in &deactivate {
            assert!(!restore.iter().any(|r| r.name == route.name));
        }
        // ...and together exactly the routes on the tunnel.
        let matching = routes
            .iter()
            .filter(|r| {
                r.next_hop_vpn_tunnel
                    .as_deref()
                    .is_some_and(|url| key().matches(url))
            })
            .count();
        assert_eq!(deactivate.len() + restore.len(), matching);
    }

    #[test]
    fn test_selection_preserves_listing_order() {
        let routes = vec![
            tunnel_route("zebra", "t1"),
            tunnel_route("apple", "t1"),
            tunnel_route("mango", "t1"),
        ];
        let selected =
            select_for_migration(&routes, &key(), Direction::Deactivate);
        assert_eq!(
            selected.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["zebra", "apple", "mango"]
        );
    }

    #[test]
    fn test_empty_worklist_is_not_an_error() {
        let routes = vec![tunnel_route("other", "t2"), gateway_route("gw")];
        assert!(select_for_migration(&routes, &key(), Direction::Deactivate)
            .is_empty());
        assert!(select_for_migration(&routes, &key(), Direction::Restore)
            .is_empty());
    }
}
