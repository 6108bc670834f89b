// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for the Compute Engine routes, tunnels, and operations surface
//!
//! The migration core talks to the provider exclusively through the [Api]
//! trait; [Client] implements it over HTTP, and [fakes::FakeCompute]
//! implements it in memory for tests.

mod auth;
pub mod fakes;

pub use auth::fetch_access_token;
pub use auth::TOKEN_ENV_VAR;

use async_trait::async_trait;
use drain_common::api::{Operation, Route, VpnTunnel};
use drain_common::error::{Error, ResourceType};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use slog::{debug, Logger};
use std::time::Duration;

/// The route-table provider surface the migration needs.
///
/// Create and delete are asynchronous on the provider side: both return an
/// [Operation] handle immediately, which callers poll to completion through
/// [Api::get_operation].
#[async_trait]
pub trait Api: Send + Sync {
    /// List every route in the project, following pagination.
    async fn list_routes(&self, project: &str) -> Result<Vec<Route>, Error>;

    async fn create_route(
        &self,
        project: &str,
        route: &Route,
    ) -> Result<Operation, Error>;

    async fn delete_route(
        &self,
        project: &str,
        route_name: &str,
    ) -> Result<Operation, Error>;

    async fn get_operation(
        &self,
        project: &str,
        operation_name: &str,
    ) -> Result<Operation, Error>;

    async fn get_tunnel(
        &self,
        project: &str,
        region: &str,
        tunnel: &str,
    ) -> Result<VpnTunnel, Error>;

    async fn list_tunnels(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<VpnTunnel>, Error>;
}

pub const DEFAULT_BASE_URL: &str =
    "https://compute.googleapis.com/compute/v1";

/// One page of a list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

/// HTTP implementation of [Api] against the Compute v1 endpoint.
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    token: String,
    log: Logger,
}

impl Client {
    pub fn new(token: &str, log: Logger) -> Result<Client, Error> {
        Client::new_with_base_url(DEFAULT_BASE_URL, token, log)
    }

    pub fn new_with_base_url(
        base_url: &str,
        token: &str,
        log: Logger,
    ) -> Result<Client, Error> {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|error| {
                Error::internal_error(&format!(
                    "building HTTP client: {}",
                    error
                ))
            })?;
        Ok(Client {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            log,
        })
    }

    /// Issue one request and decode the response, mapping HTTP failures onto
    /// the error taxonomy.  `type_name`/`name` identify the resource for
    /// not-found errors.
    async fn request<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<&Route>,
        type_name: ResourceType,
        name: &str,
    ) -> Result<T, Error> {
        debug!(self.log, "client request";
            "method" => method.as_str(),
            "uri" => &url,
        );
        let mut request =
            self.client.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|error| {
            Error::unavail(&format!("transport error: {}", error))
        })?;

        let status = response.status();
        debug!(self.log, "client response"; "status" => %status);
        if status.is_success() {
            return response.json::<T>().await.map_err(|error| {
                Error::internal_error(&format!(
                    "decoding response body: {}",
                    error
                ))
            });
        }

        let detail = response.text().await.unwrap_or_default();
        Err(if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            Error::authentication(&format!(
                "provider rejected credentials ({}): {}",
                status, detail
            ))
        } else if status == StatusCode::NOT_FOUND {
            Error::not_found(type_name, name)
        } else if status.is_server_error() {
            Error::unavail(&format!(
                "provider returned {}: {}",
                status, detail
            ))
        } else {
            Error::internal_error(&format!(
                "provider returned {}: {}",
                status, detail
            ))
        })
    }

    async fn list_paginated<T: DeserializeOwned>(
        &self,
        collection_url: &str,
        type_name: ResourceType,
    ) -> Result<Vec<T>, Error> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = match &page_token {
                Some(token) => {
                    format!("{}?pageToken={}", collection_url, token)
                }
                None => collection_url.to_owned(),
            };
            let page: ListPage<T> = self
                .request(reqwest::Method::GET, url, None, type_name, "list")
                .await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl Api for Client {
    async fn list_routes(&self, project: &str) -> Result<Vec<Route>, Error> {
        let url =
            format!("{}/projects/{}/global/routes", self.base_url, project);
        self.list_paginated(&url, ResourceType::Route).await
    }

    async fn create_route(
        &self,
        project: &str,
        route: &Route,
    ) -> Result<Operation, Error> {
        let url =
            format!("{}/projects/{}/global/routes", self.base_url, project);
        self.request(
            reqwest::Method::POST,
            url,
            Some(route),
            ResourceType::Route,
            &route.name,
        )
        .await
    }

    async fn delete_route(
        &self,
        project: &str,
        route_name: &str,
    ) -> Result<Operation, Error> {
        let url = format!(
            "{}/projects/{}/global/routes/{}",
            self.base_url, project, route_name
        );
        self.request(
            reqwest::Method::DELETE,
            url,
            None,
            ResourceType::Route,
            route_name,
        )
        .await
    }

    async fn get_operation(
        &self,
        project: &str,
        operation_name: &str,
    ) -> Result<Operation, Error> {
        let url = format!(
            "{}/projects/{}/global/operations/{}",
            self.base_url, project, operation_name
        );
        self.request(
            reqwest::Method::GET,
            url,
            None,
            ResourceType::Operation,
            operation_name,
        )
        .await
    }

    async fn get_tunnel(
        &self,
        project: &str,
        region: &str,
        tunnel: &str,
    ) -> Result<VpnTunnel, Error> {
        let url = format!(
            "{}/projects/{}/regions/{}/vpnTunnels/{}",
            self.base_url, project, region, tunnel
        );
        self.request(
            reqwest::Method::GET,
            url,
            None,
            ResourceType::VpnTunnel,
            tunnel,
        )
        .await
    }

    async fn list_tunnels(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<VpnTunnel>, Error> {
        let url = format!(
            "{}/projects/{}/regions/{}/vpnTunnels",
            self.base_url, project, region
        );
        self.list_paginated(&url, ResourceType::VpnTunnel).await
    }
}
