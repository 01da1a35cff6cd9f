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

//! Cluster API.

use std::net::Ipv4Addr;
use std::path::Path;

use futures::try_join;
use static_assertions::assert_impl_all;

use crate::config::ClusterConfig;
use crate::models::{About, Info, Other, StorageDetails, UsbStatus};
use crate::nodes::{self, Node};
use crate::protocol::{self, first_item, BmcQuery};
use crate::releases;
use crate::session::Session;
use crate::types::{FirmwareVersion, PowerState};
use crate::{Error, ErrorKind, Result};

/// Turing Pi 2 cluster API.
///
/// Provides high-level API for working with the BMC of a single board.
/// The configuration cannot be changed after the cluster is created.
#[derive(Debug, Clone)]
pub struct Cluster {
    session: Session,
}

assert_impl_all!(Cluster: Clone, Send, Sync);

impl Cluster {
    /// Create a new cluster object with the given configuration.
    ///
    /// No requests are made until a query method is called.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// fn cluster() -> turingpi::Result<turingpi::Cluster> {
    ///     let config = turingpi::ClusterConfig::new("192.168.1.10")?
    ///         .with_credentials("root", "turing");
    ///     turingpi::Cluster::new(config)
    /// }
    ///
    /// # fn main() { cluster().unwrap(); }
    /// ```
    ///
    /// # See Also
    ///
    /// * [from_config](#method.from_config) to create a Cluster from clusters.yaml
    /// * [from_env](#method.from_env) to create a Cluster from environment variables
    pub fn new(config: ClusterConfig) -> Result<Cluster> {
        debug!("Creating a client for BMC at {}", config.address());
        Ok(Cluster {
            session: Session::new(config)?,
        })
    }

    /// Create a new cluster object for the given address with default options.
    ///
    /// Fails with `ErrorKind::InvalidConfig` if the address is not a valid IPv4 address.
    pub fn from_address<S: AsRef<str>>(address: S) -> Result<Cluster> {
        Cluster::new(ClusterConfig::new(address)?)
    }

    /// Create a new cluster object from a named entry in `clusters.yaml`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # fn cluster_from_config() -> turingpi::Result<()> {
    /// let cluster = turingpi::Cluster::from_config("home")?;
    /// # Ok(()) }
    /// # fn main() { cluster_from_config().unwrap(); }
    /// ```
    pub fn from_config<S: AsRef<str>>(name: S) -> Result<Cluster> {
        Cluster::new(ClusterConfig::from_config(name)?)
    }

    /// Create a new cluster object from a named entry in the given YAML file.
    pub fn from_config_file<P: AsRef<Path>, S: AsRef<str>>(path: P, name: S) -> Result<Cluster> {
        Cluster::new(ClusterConfig::from_file(path, name)?)
    }

    /// Create a new cluster object from environment variables.
    ///
    /// See [ClusterConfig::from_env](struct.ClusterConfig.html#method.from_env)
    /// for the list of variables.
    pub fn from_env() -> Result<Cluster> {
        Cluster::new(ClusterConfig::from_env()?)
    }

    /// Address of the BMC.
    #[inline]
    pub fn address(&self) -> Ipv4Addr {
        self.session.config().address()
    }

    /// Configuration in use.
    #[inline]
    pub fn config(&self) -> &ClusterConfig {
        self.session.config()
    }

    /// Fetch firmware details of the BMC.
    pub async fn about(&self) -> Result<About> {
        let result = self.session.request(&BmcQuery::get("about")).await?;
        let record: protocol::AboutRecord = first_item(result)?;
        Ok(About::from(record))
    }

    /// Fetch network and storage information of the BMC.
    pub async fn info(&self) -> Result<Info> {
        let result = self.session.request(&BmcQuery::get("info")).await?;
        let record: protocol::InfoRecord = first_item(result)?;
        Ok(Info::from(record))
    }

    /// Fetch additional details about the BMC.
    pub async fn other(&self) -> Result<Other> {
        let result = self.session.request(&BmcQuery::get("other")).await?;
        let record: protocol::OtherRecord = first_item(result)?;
        Ok(Other::from(record))
    }

    /// Fetch all nodes with their power state.
    ///
    /// Nodes are returned in slot order.
    pub async fn nodes(&self) -> Result<Vec<Node>> {
        let record = nodes::fetch_power(&self.session).await?;
        Ok(Node::from_power_record(&self.session, record))
    }

    /// Fetch the node in the given slot (0-based).
    pub async fn node(&self, slot: usize) -> Result<Node> {
        let mut nodes = self.nodes().await?;
        if slot < nodes.len() {
            Ok(nodes.swap_remove(slot))
        } else {
            Err(Error::new(
                ErrorKind::ResourceNotFound,
                format!("No node in slot {}, the board has {} nodes", slot, nodes.len()),
            ))
        }
    }

    /// Fetch the SD card details.
    pub async fn get_sdcard(&self) -> Result<StorageDetails> {
        let result = self.session.request(&BmcQuery::get("sdcard")).await?;
        let record: protocol::SdCardRecord = first_item(result)?;
        Ok(StorageDetails::from(record))
    }

    /// Fetch the current USB configuration.
    pub async fn usb_status(&self) -> Result<UsbStatus> {
        let result = self.session.request(&BmcQuery::get("usb")).await?;
        let record: protocol::UsbRecord = first_item(result)?;
        UsbStatus::try_from(record)
    }

    /// Power on the given nodes in one request.
    ///
    /// The power state of the nodes is updated on success.
    pub async fn start_nodes(&self, nodes: &mut [Node]) -> Result<()> {
        self.set_power(nodes, PowerState::On).await
    }

    /// Power off the given nodes in one request.
    ///
    /// The power state of the nodes is updated on success.
    pub async fn stop_nodes(&self, nodes: &mut [Node]) -> Result<()> {
        self.set_power(nodes, PowerState::Off).await
    }

    /// Change the power state of the given nodes in one request.
    pub async fn set_power(&self, nodes: &mut [Node], state: PowerState) -> Result<()> {
        debug!(
            "Setting power of {} node(s) on {} to {}",
            nodes.len(),
            self.address(),
            state
        );
        nodes::set_power(&self.session, nodes.iter().map(|n| (n.name(), state))).await?;
        for node in nodes.iter_mut() {
            node.set_power_state(state);
        }
        Ok(())
    }

    /// Reset the network switch of the board.
    pub async fn network_reset(&self) -> Result<()> {
        debug!("Resetting network on {}", self.address());
        self.session.request_ok(&BmcQuery::set("network")).await
    }

    /// Reload the system management daemon of the BMC.
    pub async fn reload(&self) -> Result<()> {
        debug!("Reloading the management daemon on {}", self.address());
        self.session.request_ok(&BmcQuery::set("reload")).await
    }

    /// Reboot the BMC.
    pub async fn reboot(&self) -> Result<()> {
        debug!("Rebooting the BMC on {}", self.address());
        self.session.request_ok(&BmcQuery::set("reboot")).await
    }

    /// Fetch the version of the latest firmware release.
    ///
    /// This request goes to the release feed, not to the BMC.
    pub async fn latest_version(&self) -> Result<FirmwareVersion> {
        let config = self.session.config();
        releases::latest_version(&config.release_feed, config.timeout()).await
    }

    /// Check whether a newer firmware release is available.
    pub async fn update_available(&self) -> Result<bool> {
        let (about, latest) = try_join!(self.about(), self.latest_version())?;
        let current = about.firmware_version()?;
        debug!("Current firmware is {}, latest is {}", current, latest);
        Ok(current < latest)
    }
}
