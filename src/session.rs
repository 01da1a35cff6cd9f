// Copyright 2026 The turingpi Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Session structure definition.
//!
//! The Session object serves as a wrapper around an HTTP(s) client, handling
//! authentication and the response envelope of the BMC.

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::config::ClusterConfig;
use crate::protocol::{BmcQuery, ResponseRoot};
use crate::utils::is_ok_result;
use crate::{Error, ErrorKind, Result};

/// A BMC API session.
///
/// The BMC lives on the local network, so system proxies are not used.
///
/// Cheap to clone: all clones share the configuration and the connection pool.
#[derive(Clone)]
pub(crate) struct Session {
    client: Client,
    endpoint: Url,
    config: Arc<ClusterConfig>,
}

impl Session {
    /// Create a new session from a configuration.
    ///
    /// Does not make any requests.
    pub(crate) fn new(config: ClusterConfig) -> Result<Session> {
        let endpoint = Url::parse(&config.endpoint()).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot build the BMC URL: {}", e),
            )
        })?;

        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .no_proxy()
            .user_agent(concat!("turingpi-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("Cannot build an HTTP client: {}", e),
                )
            })?;

        if !config.verify_tls {
            debug!(
                "TLS certificate verification is disabled for {}",
                config.address
            );
        }

        Ok(Session {
            client,
            endpoint,
            config: Arc::new(config),
        })
    }

    /// Configuration of this session.
    #[inline]
    pub(crate) fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Make a request to the BMC and return its result.
    pub(crate) async fn request(&self, query: &BmcQuery) -> Result<Value> {
        let url = self
            .endpoint
            .join("bmc")
            .map_err(|e| Error::new(ErrorKind::InvalidConfig, e.to_string()))?;
        trace!("Sending {} request to {}", query.kind(), url);

        let mut builder = self.client.get(url).query(&query.params);
        if let Some(ref username) = self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_ref());
        }

        let response = builder.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            debug!(
                "BMC request {} failed with status {}",
                query.kind(),
                status
            );
            let message = body.unwrap_or_else(|| format!("Non 200 response received: {}", status));
            return Err(Error::from_status(status, Some(message)));
        }

        let root: ResponseRoot = response.json().await.map_err(|e| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("Invalid response received: {}", e),
            )
        })?;
        let result = root.into_result()?;
        trace!("Received {} result: {:?}", query.kind(), result);
        Ok(result)
    }

    /// Make a modifying request and check that the BMC reported success.
    pub(crate) async fn request_ok(&self, query: &BmcQuery) -> Result<()> {
        let result = self.request(query).await?;
        if is_ok_result(&result) {
            debug!("BMC request {} succeeded", query.kind());
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::OperationFailed,
                format!("BMC request {} returned {}", query.kind(), result),
            ))
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .finish()
    }
}
