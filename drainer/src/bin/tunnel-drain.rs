// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drain traffic off a VPN tunnel by deprioritizing its routes, or put it
//! back by restoring the originals from the clones' provenance records.

use anyhow::{Context, Result};
use clap::Parser;
use compute_client::{Api, Client};
use drain_common::identity::short_name;
use drain_common::select::Direction;
use slog::{info, Drain, Logger};
use std::time::Duration;
use tunnel_drain::config::{Config, DEFAULT_TARGET_PRIORITY};
use tunnel_drain::migrate::Migration;

#[derive(Debug, Parser)]
#[clap(
    name = "tunnel-drain",
    about = "Migrate routes off a VPN tunnel, or restore them"
)]
struct Opt {
    /// Project to operate on.
    #[clap(long, value_name = "PROJECT_ID")]
    project: String,

    /// Region the tunnel lives in.
    #[clap(long, value_name = "REGION_NAME")]
    region: String,

    /// Tunnel whose routes should be migrated.
    #[clap(long, value_name = "TUNNEL_NAME")]
    tunnel: String,

    /// "deactivate" clones each of the tunnel's routes at the target
    /// priority and deletes the originals; "restore" recreates the originals
    /// from the clones and deletes the clones.
    #[clap(long, default_value_t = Direction::Deactivate)]
    direction: Direction,

    /// Priority for deactivated clones (larger values are less preferred).
    #[clap(long, default_value_t = DEFAULT_TARGET_PRIORITY)]
    priority: u32,

    /// Seconds to wait between creating the new routes and deleting the old
    /// ones, so the new routes can propagate.
    #[clap(long, default_value_t = 0)]
    sleep: u64,

    /// Bound, in seconds, on how long to wait for any single route
    /// operation; without it, waits until the operation is terminal.
    #[clap(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Compute and report the migration without creating or deleting any
    /// route.
    #[clap(long)]
    dry_run: bool,

    /// Report every tunnel and every considered route.
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    let log = init_logger(opt.verbose);

    let token = compute_client::fetch_access_token()
        .await
        .context("obtaining credentials")?;
    let client = Client::new(&token, log.clone())?;

    let config = Config {
        project: opt.project,
        region: opt.region,
        tunnel: opt.tunnel,
        direction: opt.direction,
        target_priority: opt.priority,
        pause: Duration::from_secs(opt.sleep),
        timeout: opt.timeout.map(Duration::from_secs),
        dry_run: opt.dry_run,
    };

    if opt.verbose {
        let tunnels =
            client.list_tunnels(&config.project, &config.region).await?;
        for tunnel in &tunnels {
            info!(log, "tunnel";
                "name" => &tunnel.name,
                "gateway" => tunnel
                    .target_vpn_gateway
                    .as_deref()
                    .map_or("-", short_name),
                "status" => tunnel.status.as_deref().unwrap_or("-"),
            );
        }
    }

    let migration = Migration::new(&client, &config, log.clone());
    let outcome = migration.run().await.context("migrating routes")?;
    info!(log, "migration complete";
        "created" => outcome.created.len(),
        "deleted" => outcome.deleted.len(),
        "dry_run" => config.dry_run,
    );
    Ok(())
}

fn init_logger(verbose: bool) -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let mut builder = slog_envlogger::LogBuilder::new(drain);
    builder = builder.filter(
        None,
        if verbose {
            slog::FilterLevel::Debug
        } else {
            slog::FilterLevel::Info
        },
    );
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder = builder.parse(&filter);
    }
    let drain = builder.build().fuse();
    let drain = slog_async::Async::new(drain).chan_size(0x2000).build().fuse();
    Logger::root(drain, slog::o!())
}
