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

//! Latest firmware release lookup.

use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::types::FirmwareVersion;
use crate::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Deserialize)]
struct ReleaseRecord {
    tag_name: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

/// Fetch the version of the latest firmware release from the feed.
///
/// The feed is not on the BMC, so the usual certificate verification applies.
pub(crate) async fn latest_version(feed: &str, timeout: Duration) -> Result<FirmwareVersion> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("turingpi-rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot build an HTTP client: {}", e),
            )
        })?;

    trace!("Fetching the latest firmware release from {}", feed);
    let response = client
        .get(feed)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::from_status(
            status,
            Some(format!("Cannot fetch the release feed {}", feed)),
        ));
    }

    let release: ReleaseRecord = response.json().await?;
    if release.draft || release.prerelease {
        warn!(
            "Latest release {} is a draft or a pre-release",
            release.tag_name
        );
    }

    let version = FirmwareVersion::from_str(&release.tag_name)?;
    debug!("Latest firmware release is {}", version);
    Ok(version)
}
