// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Access-token acquisition for the Compute API

use drain_common::error::Error;
use serde::Deserialize;
use std::time::Duration;

/// Checked first; set it to the output of
/// `gcloud auth print-access-token` when running outside the cloud.
pub const TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const METADATA_TOKEN_URL: &str = "http://metadata.google.internal/\
     computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Obtain an access token: `$GOOGLE_OAUTH_ACCESS_TOKEN` if set, otherwise
/// the instance metadata server.
///
/// Failure here is fatal at startup, before any migration work is attempted.
pub async fn fetch_access_token() -> Result<String, Error> {
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_owned());
        }
    }

    let client = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|error| {
            Error::authentication(&format!(
                "building metadata client: {}",
                error
            ))
        })?;
    let response = client
        .get(METADATA_TOKEN_URL)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|error| {
            Error::authentication(&format!(
                "${} is unset and the metadata server is unreachable: {}",
                TOKEN_ENV_VAR, error
            ))
        })?;
    if !response.status().is_success() {
        return Err(Error::authentication(&format!(
            "metadata server returned {}",
            response.status()
        )));
    }
    let token: MetadataToken = response.json().await.map_err(|error| {
        Error::authentication(&format!(
            "decoding metadata token response: {}",
            error
        ))
    })?;
    Ok(token.access_token)
}
