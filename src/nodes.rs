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

//! Compute nodes of the board.

use std::fmt;

use async_trait::async_trait;
use static_assertions::assert_impl_all;

use crate::protocol::{BmcQuery, PowerRecord};
use crate::session::Session;
use crate::types::{PowerState, Refresh, UsbConfig};
use crate::{Error, ErrorKind, Result};

/// A compute node - one module bay on the board.
///
/// The power state is a snapshot taken when the node was fetched. It is
/// updated by the power actions of this object and by `refresh`.
#[derive(Clone)]
pub struct Node {
    session: Session,
    slot: usize,
    name: String,
    power_state: PowerState,
}

assert_impl_all!(Node: Clone, Send, Sync);

/// Fetch power state of all nodes.
pub(crate) async fn fetch_power(session: &Session) -> Result<PowerRecord> {
    let result = session.request(&BmcQuery::get("power")).await?;
    let record = PowerRecord::from_result(result)?;
    trace!("Received power state {:?}", record.nodes);
    Ok(record)
}

/// Set power state of several nodes in one request.
pub(crate) async fn set_power<'n, I>(session: &Session, names: I) -> Result<()>
where
    I: IntoIterator<Item = (&'n str, PowerState)>,
{
    let mut query = BmcQuery::set("power");
    let mut empty = true;
    for (name, state) in names {
        query = query.with(name, state.as_flag());
        empty = false;
    }

    if empty {
        debug!("No nodes to change power state for");
        return Ok(());
    }

    session.request_ok(&query).await
}

impl Node {
    pub(crate) fn new(
        session: Session,
        slot: usize,
        name: String,
        power_state: PowerState,
    ) -> Node {
        Node {
            session,
            slot,
            name,
            power_state,
        }
    }

    /// Build the list of nodes from a power state response.
    pub(crate) fn from_power_record(session: &Session, record: PowerRecord) -> Vec<Node> {
        record
            .nodes
            .into_iter()
            .enumerate()
            .map(|(slot, (name, state))| Node::new(session.clone(), slot, name, state))
            .collect()
    }

    /// Slot of the node (0-based).
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Name of the node as used by the BMC (e.g. `node1`).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Power state at the time of the last fetch or action.
    #[inline]
    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    /// Whether the node was powered on at the time of the last fetch or action.
    #[inline]
    pub fn is_powered_on(&self) -> bool {
        self.power_state.is_on()
    }

    pub(crate) fn set_power_state(&mut self, state: PowerState) {
        self.power_state = state;
    }

    /// Power on the node.
    pub async fn start(&mut self) -> Result<()> {
        self.set_power(PowerState::On).await
    }

    /// Power off the node.
    pub async fn stop(&mut self) -> Result<()> {
        self.set_power(PowerState::Off).await
    }

    /// Change the power state of the node.
    pub async fn set_power(&mut self, state: PowerState) -> Result<()> {
        debug!("Setting power of {} to {}", self.name, state);
        set_power(&self.session, [(self.name.as_str(), state)]).await?;
        self.power_state = state;
        Ok(())
    }

    /// Boot the node from USB on the next start.
    pub async fn usb_boot(&self) -> Result<()> {
        debug!("Enabling USB boot for {}", self.name);
        self.node_action("usb_boot").await
    }

    /// Clear the USB boot flag of the node.
    pub async fn clear_usb_boot(&self) -> Result<()> {
        debug!("Clearing USB boot for {}", self.name);
        self.node_action("clear_usb_boot").await
    }

    /// Expose the storage of the node as a USB mass storage device.
    pub async fn set_mass_storage_device(&self) -> Result<()> {
        debug!("Exposing {} as a mass storage device", self.name);
        self.node_action("node_to_msd").await
    }

    /// Connect the node to the USB bus with the given configuration.
    pub async fn set_usb_mode(&self, config: UsbConfig) -> Result<()> {
        debug!("Setting USB mode of {} to {:?}", self.name, config);
        let query = BmcQuery::set("usb")
            .with("mode", config.code())
            .with("node", self.slot);
        self.session.request_ok(&query).await
    }

    async fn node_action(&self, kind: &str) -> Result<()> {
        let query = BmcQuery::set(kind).with("node", self.slot);
        self.session.request_ok(&query).await
    }
}

#[async_trait]
impl Refresh for Node {
    /// Refresh the power state of the node.
    async fn refresh(&mut self) -> Result<()> {
        let record = fetch_power(&self.session).await?;
        let state = record
            .nodes
            .into_iter()
            .find(|(name, _)| *name == self.name)
            .map(|(_, state)| state)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::ResourceNotFound,
                    format!("Node {} is no longer reported by the BMC", self.name),
                )
            })?;
        self.power_state = state;
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("slot", &self.slot)
            .field("name", &self.name)
            .field("power_state", &self.power_state)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
