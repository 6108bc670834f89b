// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The two-phase migration protocol
//!
//! Create every transformed route, wait for all creations to complete, then
//! delete every source route and wait again.  The active and shadow copies
//! of a route are never both absent: the source set is only deleted after
//! the entire replacement set is confirmed.
//!
//! Failure leaves partial state in place.  If a create fails, clones already
//! created survive and no source is deleted; if a delete fails, the result
//! is a mix of deleted sources, surviving sources, and clones.  Neither case
//! is rolled back -- the surviving state is reported route by route so an
//! operator can rerun or clean up by hand.  The one concurrency assumption
//! is operational, not mechanical: nothing else mutates the tunnel's routes
//! during a run.

use compute_client::Api;
use drain_common::api::{Operation, OperationStatus, Route};
use drain_common::backoff::{self, BackoffError};
use drain_common::error::Error;
use drain_common::identity::{short_name, TunnelKey};
use drain_common::select::{select_for_migration, Direction};
use drain_common::transform;
use slog::{debug, info, warn, Logger};

use crate::config::Config;

/// Names of the routes a completed run touched, in submission order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MigrationOutcome {
    pub created: Vec<String>,
    pub deleted: Vec<String>,
}

pub struct Migration<'a> {
    client: &'a dyn Api,
    config: &'a Config,
    log: Logger,
}

impl<'a> Migration<'a> {
    pub fn new(
        client: &'a dyn Api,
        config: &'a Config,
        log: Logger,
    ) -> Migration<'a> {
        Migration { client, config, log }
    }

    /// Run the migration to completion.
    ///
    /// An empty worklist is a successful no-op.  Any operation error is
    /// fatal and aborts the remaining steps; see the module comment for
    /// what survives.
    pub async fn run(&self) -> Result<MigrationOutcome, Error> {
        let config = self.config;

        // Resolving the tunnel up front turns a typo'd tunnel name into a
        // clean failure before any mutation.
        let tunnel = self
            .client
            .get_tunnel(&config.project, &config.region, &config.tunnel)
            .await?;
        debug!(self.log, "resolved tunnel";
            "tunnel" => &tunnel.name,
            "gateway" => tunnel
                .target_vpn_gateway
                .as_deref()
                .map_or("-", short_name),
        );

        let key =
            TunnelKey::new(&config.project, &config.region, &config.tunnel);
        let inventory = self.client.list_routes(&config.project).await?;
        for route in &inventory {
            debug!(self.log, "considered route";
                "name" => &route.name,
                "network" => short_name(&route.network),
                "matches_tunnel" => route
                    .next_hop_vpn_tunnel
                    .as_deref()
                    .is_some_and(|url| key.matches(url)),
            );
        }

        let sources: Vec<Route> =
            select_for_migration(&inventory, &key, config.direction)
                .into_iter()
                .cloned()
                .collect();
        info!(self.log, "selected routes";
            "direction" => %config.direction,
            "tunnel" => %key,
            "count" => sources.len(),
        );
        if sources.is_empty() {
            return Ok(MigrationOutcome::default());
        }

        // Compute every replacement before submitting anything, and report
        // each one: a dry run prints exactly what a real run would do.
        let mut replacements = Vec::with_capacity(sources.len());
        for source in &sources {
            let replacement = match config.direction {
                Direction::Deactivate => {
                    transform::forward(source, config.target_priority)?
                }
                Direction::Restore => transform::inverse(source)?,
            };
            info!(self.log, "route replacement";
                "source" => &source.name,
                "replacement" => &replacement.name,
                "network" => short_name(&replacement.network),
                "dest_range" => &replacement.dest_range,
                "priority" => replacement.priority,
            );
            replacements.push(replacement);
        }

        // Create phase: submit everything, then wait for everything.
        let mut created = Vec::with_capacity(replacements.len());
        let mut create_ops = Vec::with_capacity(replacements.len());
        for replacement in &replacements {
            let operation = if config.dry_run {
                info!(self.log, "dry run: skipping route creation";
                    "route" => &replacement.name,
                );
                noop_operation("create", &replacement.name)
            } else {
                match self
                    .client
                    .create_route(&config.project, replacement)
                    .await
                {
                    Ok(operation) => operation,
                    Err(error) => {
                        self.surface_partial(
                            "create",
                            "submitted",
                            &created,
                            &replacement.name,
                        );
                        return Err(error);
                    }
                }
            };
            debug!(self.log, "submitted";
                "phase" => "create",
                "route" => &replacement.name,
                "operation" => &operation.name,
            );
            created.push(replacement.name.clone());
            create_ops.push(operation);
        }
        self.await_phase("create", &created, &create_ops).await?;

        if !config.pause.is_zero() {
            info!(self.log, "pausing before deletion";
                "seconds" => config.pause.as_secs(),
            );
            tokio::time::sleep(config.pause).await;
        }

        // Delete phase: exactly the sources enumerated at discovery time --
        // never the set a fresh selection would return, which now includes
        // the routes created above.
        let mut deleted = Vec::with_capacity(sources.len());
        let mut delete_ops = Vec::with_capacity(sources.len());
        for source in &sources {
            let operation = if config.dry_run {
                info!(self.log, "dry run: skipping route deletion";
                    "route" => &source.name,
                );
                noop_operation("delete", &source.name)
            } else {
                match self
                    .client
                    .delete_route(&config.project, &source.name)
                    .await
                {
                    Ok(operation) => operation,
                    Err(error) => {
                        self.surface_partial(
                            "delete",
                            "submitted",
                            &deleted,
                            &source.name,
                        );
                        return Err(error);
                    }
                }
            };
            debug!(self.log, "submitted";
                "phase" => "delete",
                "route" => &source.name,
                "operation" => &operation.name,
            );
            deleted.push(source.name.clone());
            delete_ops.push(operation);
        }
        self.await_phase("delete", &deleted, &delete_ops).await?;

        Ok(MigrationOutcome { created, deleted })
    }

    /// Wait for every operation in a phase, in submission order.
    async fn await_phase(
        &self,
        phase: &str,
        names: &[String],
        operations: &[Operation],
    ) -> Result<(), Error> {
        for (index, operation) in operations.iter().enumerate() {
            if let Err(error) = self.await_operation(operation).await {
                self.surface_partial(
                    phase,
                    "confirmed",
                    &names[..index],
                    &names[index],
                );
                return Err(error);
            }
        }
        Ok(())
    }

    /// Poll one operation to a terminal status.
    ///
    /// An already-terminal handle is inspected without any network call;
    /// this is what makes the synthetic dry-run handles free.  A failure
    /// here does not cancel operations submitted for other routes -- those
    /// keep running on the provider side.
    async fn await_operation(&self, handle: &Operation) -> Result<(), Error> {
        if let OperationStatus::Done = handle.status {
            return check_terminal(handle);
        }

        let policy = backoff::operation_poll_policy(self.config.timeout);
        let log = &self.log;
        backoff::retry_notify(
            policy,
            || async {
                let operation = self
                    .client
                    .get_operation(&self.config.project, &handle.name)
                    .await
                    .map_err(|error| {
                        if error.retryable() {
                            BackoffError::transient(error)
                        } else {
                            BackoffError::Permanent(error)
                        }
                    })?;
                match operation.status {
                    OperationStatus::Done => check_terminal(&operation)
                        .map_err(BackoffError::Permanent),
                    _ => {
                        Err(BackoffError::transient(Error::unavail(&format!(
                            "operation {:?} still in progress",
                            operation.name
                        ))))
                    }
                }
            },
            |error, delay| {
                debug!(log, "operation not complete yet";
                    "operation" => &handle.name,
                    "error" => %error,
                    "retry_after" => ?delay,
                );
            },
        )
        .await
    }

    /// Report exactly what survived a failed phase, route by route, so the
    /// operator can clean up or rerun.
    fn surface_partial(
        &self,
        phase: &str,
        disposition: &str,
        survivors: &[String],
        failed: &str,
    ) {
        warn!(self.log, "phase failed partway; surviving state follows";
            "phase" => phase,
            "failed_route" => failed,
        );
        for name in survivors {
            warn!(self.log, "route mutation outlives the failed phase";
                "phase" => phase,
                "disposition" => disposition,
                "route" => name,
            );
        }
    }
}

fn check_terminal(operation: &Operation) -> Result<(), Error> {
    match &operation.error {
        Some(errors) => {
            Err(Error::operation_failed(&operation.name, &errors.summary()))
        }
        None => Ok(()),
    }
}

/// The handle used in place of a network call under `--dry-run`: already
/// terminal, so the waiter accepts it without polling.
fn noop_operation(phase: &str, route_name: &str) -> Operation {
    Operation {
        name: format!("noop-{}-{}", phase, route_name),
        status: OperationStatus::Done,
        error: None,
    }
}
