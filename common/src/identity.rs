// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deriving canonical names from fully-qualified resource references

use std::fmt;

/// Returns the final path segment of a resource reference.
///
/// Pure and total: input that is not a resource URL yields the last
/// `/`-separated token, which for a bare name is the name itself.
pub fn short_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Identifies "the routes belonging to tunnel T in region R of project P".
///
/// A route belongs to a tunnel iff the last five path segments of its
/// `nextHopVpnTunnel` reference equal this key exactly.  Comparing segments
/// rather than a substring means a tunnel name that is a proper prefix or
/// suffix of another can never match the wrong tunnel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TunnelKey {
    project: String,
    region: String,
    tunnel: String,
}

impl TunnelKey {
    pub fn new(project: &str, region: &str, tunnel: &str) -> TunnelKey {
        TunnelKey {
            project: project.to_owned(),
            region: region.to_owned(),
            tunnel: tunnel.to_owned(),
        }
    }

    /// True iff the last five path segments of `url` name this tunnel.
    ///
    /// A reference with fewer than five segments never matches.
    pub fn matches(&self, url: &str) -> bool {
        let mut segments = url.rsplit('/');
        segments.next() == Some(self.tunnel.as_str())
            && segments.next() == Some("vpnTunnels")
            && segments.next() == Some(self.region.as_str())
            && segments.next() == Some("regions")
            && segments.next() == Some(self.project.as_str())
    }
}

impl fmt::Display for TunnelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/regions/{}/vpnTunnels/{}",
            self.project, self.region, self.tunnel
        )
    }
}
