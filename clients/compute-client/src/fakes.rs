// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A fake implementation of [crate::Api] backed by an in-memory route table
//!
//! Tests drive the migration orchestrator against this instead of the real
//! provider.  Operations complete after a configurable number of status
//! polls, and individual creates or deletes can be scripted to fail so the
//! partial-failure paths are reachable.

use crate::Api;
use async_trait::async_trait;
use drain_common::api::{
    Operation, OperationErrorDetail, OperationErrors, OperationStatus, Route,
    VpnTunnel,
};
use drain_common::error::{Error, ResourceType};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// How many mutating and polling calls the fake has served.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counters {
    pub create_calls: u64,
    pub delete_calls: u64,
    pub poll_calls: u64,
}

struct PendingOperation {
    polls_remaining: u32,
    error: Option<OperationErrors>,
}

struct State {
    routes: Vec<Route>,
    tunnels: Vec<VpnTunnel>,
    operations: BTreeMap<String, PendingOperation>,
    fail_creates: BTreeMap<String, String>,
    fail_deletes: BTreeMap<String, String>,
    polls_to_done: u32,
    next_operation: u64,
    counters: Counters,
}

pub struct FakeCompute {
    state: Mutex<State>,
}

impl FakeCompute {
    pub fn new() -> FakeCompute {
        FakeCompute {
            state: Mutex::new(State {
                routes: Vec::new(),
                tunnels: Vec::new(),
                operations: BTreeMap::new(),
                fail_creates: BTreeMap::new(),
                fail_deletes: BTreeMap::new(),
                polls_to_done: 2,
                next_operation: 0,
                counters: Counters::default(),
            }),
        }
    }

    pub fn push_route(&self, route: Route) {
        self.state.lock().unwrap().routes.push(route);
    }

    pub fn push_tunnel(&self, tunnel: VpnTunnel) {
        self.state.lock().unwrap().tunnels.push(tunnel);
    }

    /// Script the create of `route_name` to complete with an error.
    pub fn fail_create(&self, route_name: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_creates
            .insert(route_name.to_owned(), message.to_owned());
    }

    /// Script the delete of `route_name` to complete with an error.
    pub fn fail_delete(&self, route_name: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_deletes
            .insert(route_name.to_owned(), message.to_owned());
    }

    /// How many status polls an operation stays non-terminal for.
    pub fn set_polls_to_done(&self, polls: u32) {
        self.state.lock().unwrap().polls_to_done = polls;
    }

    pub fn routes(&self) -> Vec<Route> {
        self.state.lock().unwrap().routes.clone()
    }

    pub fn counters(&self) -> Counters {
        self.state.lock().unwrap().counters
    }
}

impl Default for FakeCompute {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn submit(
        &mut self,
        verb: &str,
        target: &str,
        error: Option<String>,
    ) -> Operation {
        let name = format!("op-{}-{}-{}", self.next_operation, verb, target);
        self.next_operation += 1;
        self.operations.insert(
            name.clone(),
            PendingOperation {
                polls_remaining: self.polls_to_done,
                error: error.map(|message| OperationErrors {
                    errors: vec![OperationErrorDetail {
                        code: Some(String::from("INJECTED_FAILURE")),
                        message: Some(message),
                    }],
                }),
            },
        );
        Operation {
            name,
            status: OperationStatus::Pending,
            error: None,
        }
    }
}

#[async_trait]
impl Api for FakeCompute {
    async fn list_routes(&self, _project: &str) -> Result<Vec<Route>, Error> {
        Ok(self.routes())
    }

    async fn create_route(
        &self,
        _project: &str,
        route: &Route,
    ) -> Result<Operation, Error> {
        let mut state = self.state.lock().unwrap();
        state.counters.create_calls += 1;
        match state.fail_creates.remove(&route.name) {
            Some(message) => Ok(state.submit("insert", &route.name, Some(message))),
            None => {
                state.routes.push(route.clone());
                Ok(state.submit("insert", &route.name, None))
            }
        }
    }

    async fn delete_route(
        &self,
        _project: &str,
        route_name: &str,
    ) -> Result<Operation, Error> {
        let mut state = self.state.lock().unwrap();
        state.counters.delete_calls += 1;
        if let Some(message) = state.fail_deletes.remove(route_name) {
            return Ok(state.submit("delete", route_name, Some(message)));
        }
        let Some(index) =
            state.routes.iter().position(|route| route.name == route_name)
        else {
            return Err(Error::not_found(ResourceType::Route, route_name));
        };
        state.routes.remove(index);
        Ok(state.submit("delete", route_name, None))
    }

    async fn get_operation(
        &self,
        _project: &str,
        operation_name: &str,
    ) -> Result<Operation, Error> {
        let mut state = self.state.lock().unwrap();
        state.counters.poll_calls += 1;
        let Some(pending) = state.operations.get_mut(operation_name) else {
            return Err(Error::not_found(
                ResourceType::Operation,
                operation_name,
            ));
        };
        if pending.polls_remaining > 0 {
            pending.polls_remaining -= 1;
            return Ok(Operation {
                name: operation_name.to_owned(),
                status: OperationStatus::Running,
                error: None,
            });
        }
        Ok(Operation {
            name: operation_name.to_owned(),
            status: OperationStatus::Done,
            error: pending.error.clone(),
        })
    }

    async fn get_tunnel(
        &self,
        _project: &str,
        _region: &str,
        tunnel: &str,
    ) -> Result<VpnTunnel, Error> {
        let state = self.state.lock().unwrap();
        state
            .tunnels
            .iter()
            .find(|t| t.name == tunnel)
            .cloned()
            .ok_or_else(|| Error::not_found(ResourceType::VpnTunnel, tunnel))
    }

    async fn list_tunnels(
        &self,
        _project: &str,
        _region: &str,
    ) -> Result<Vec<VpnTunnel>, Error> {
        Ok(self.state.lock().unwrap().tunnels.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn route(name: &str) -> Route {
        Route {
            name: name.to_owned(),
            network: String::from("projects/p1/global/networks/corp"),
            next_hop_vpn_tunnel: None,
            dest_range: String::from("0.0.0.0/0"),
            priority: 1000,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_operations_complete_after_configured_polls() {
        let fake = FakeCompute::new();
        fake.set_polls_to_done(2);
        let op = fake.create_route("p1", &route("r1")).await.unwrap();
        assert_eq!(op.status, OperationStatus::Pending);

        let polled = fake.get_operation("p1", &op.name).await.unwrap();
        assert_eq!(polled.status, OperationStatus::Running);
        let polled = fake.get_operation("p1", &op.name).await.unwrap();
        assert_eq!(polled.status, OperationStatus::Running);
        let polled = fake.get_operation("p1", &op.name).await.unwrap();
        assert_eq!(polled.status, OperationStatus::Done);
        assert_eq!(polled.error, None);

        assert_eq!(fake.counters().poll_calls, 3);
        assert_eq!(fake.routes().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_create_failure_leaves_table_unchanged() {
        let fake = FakeCompute::new();
        fake.set_polls_to_done(0);
        fake.fail_create("r1", "quota exhausted");
        let op = fake.create_route("p1", &route("r1")).await.unwrap();
        let polled = fake.get_operation("p1", &op.name).await.unwrap();
        assert_eq!(polled.status, OperationStatus::Done);
        assert!(polled.error.unwrap().summary().contains("quota exhausted"));
        assert!(fake.routes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_missing_route_is_not_found() {
        let fake = FakeCompute::new();
        let error = fake.delete_route("p1", "ghost").await.unwrap_err();
        assert_eq!(error, Error::not_found(ResourceType::Route, "ghost"));
    }
}
