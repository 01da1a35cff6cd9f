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

//! Read-only snapshots of the board state.

use std::net::Ipv4Addr;
use std::str::FromStr;

use chrono::NaiveDateTime;
use macaddr::MacAddr6;

use crate::protocol::{self, node_number};
use crate::types::{FirmwareVersion, UsbMode, UsbRoute};
use crate::{Error, ErrorKind, Result};

/// Name given to the storage descriptor of the SD card.
pub(crate) const SD_CARD_NAME: &str = "SD Card";

/// Storage device details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDetails {
    name: String,
    free_bytes: u64,
    total_bytes: u64,
    used_bytes: u64,
}

impl StorageDetails {
    /// Create storage details.
    ///
    /// If `used_bytes` is not provided, it is calculated from the total and free bytes.
    pub fn new<S: Into<String>>(
        name: S,
        free_bytes: u64,
        total_bytes: u64,
        used_bytes: Option<u64>,
    ) -> StorageDetails {
        StorageDetails {
            name: name.into(),
            free_bytes,
            total_bytes,
            used_bytes: used_bytes.unwrap_or_else(|| total_bytes.saturating_sub(free_bytes)),
        }
    }

    /// The name of the storage device.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of free bytes.
    #[inline]
    pub fn free_bytes(&self) -> u64 {
        self.free_bytes
    }

    /// The total number of bytes.
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// The number of used bytes.
    #[inline]
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }
}

impl From<protocol::SdCardRecord> for StorageDetails {
    fn from(value: protocol::SdCardRecord) -> StorageDetails {
        StorageDetails::new(SD_CARD_NAME, value.free, value.total, value.used)
    }
}

impl From<protocol::StorageRecord> for StorageDetails {
    fn from(value: protocol::StorageRecord) -> StorageDetails {
        StorageDetails::new(value.name, value.free, value.total, None)
    }
}

/// Network interface details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDetails {
    inner: protocol::InterfaceRecord,
}

impl InterfaceDetails {
    transparent_property! {
        /// The device name.
        device: ref String
    }

    transparent_property! {
        /// The IP address.
        ip: Ipv4Addr
    }

    transparent_property! {
        /// The MAC address.
        mac: MacAddr6
    }
}

/// Network and storage information of the BMC.
#[derive(Debug, Clone)]
pub struct Info {
    interfaces: Vec<InterfaceDetails>,
    storage: Vec<StorageDetails>,
}

impl Info {
    /// Network interfaces.
    #[inline]
    pub fn interfaces(&self) -> &[InterfaceDetails] {
        &self.interfaces
    }

    /// Storage devices.
    #[inline]
    pub fn storage(&self) -> &[StorageDetails] {
        &self.storage
    }
}

impl From<protocol::InfoRecord> for Info {
    fn from(value: protocol::InfoRecord) -> Info {
        Info {
            interfaces: value
                .ip
                .into_iter()
                .map(|inner| InterfaceDetails { inner })
                .collect(),
            storage: value.storage.into_iter().map(From::from).collect(),
        }
    }
}

/// Firmware details of the BMC.
#[derive(Debug, Clone)]
pub struct About {
    inner: protocol::AboutRecord,
}

impl About {
    transparent_property! {
        /// The API version.
        api: ref Option<String>
    }

    transparent_property! {
        /// The build version.
        build_version: ref Option<String>
    }

    transparent_property! {
        /// The buildroot release the firmware is based on.
        buildroot: ref Option<String>
    }

    transparent_property! {
        /// When the firmware was built (if reported in a known format).
        buildtime: Option<NaiveDateTime>
    }

    transparent_property! {
        /// Host name of the BMC (recent firmware only).
        hostname: ref Option<String>
    }

    transparent_property! {
        /// Firmware version as reported by the BMC.
        version: ref String
    }

    /// Parsed firmware version.
    pub fn firmware_version(&self) -> Result<FirmwareVersion> {
        FirmwareVersion::from_str(&self.inner.version)
    }
}

impl From<protocol::AboutRecord> for About {
    fn from(inner: protocol::AboutRecord) -> About {
        About { inner }
    }
}

/// Additional details about the BMC.
#[derive(Debug, Clone)]
pub struct Other {
    inner: protocol::OtherRecord,
}

impl Other {
    transparent_property! {
        /// The API version.
        api: ref String
    }

    transparent_property! {
        /// The build version.
        build_version: ref String
    }

    transparent_property! {
        /// The buildroot release the firmware is based on.
        buildroot: ref String
    }

    transparent_property! {
        /// When the firmware was built (if reported in a known format).
        buildtime: Option<NaiveDateTime>
    }

    transparent_property! {
        /// The IP address of the BMC.
        ip: Ipv4Addr
    }

    transparent_property! {
        /// The MAC address of the BMC.
        mac: MacAddr6
    }

    transparent_property! {
        /// The firmware version.
        version: ref String
    }
}

impl From<protocol::OtherRecord> for Other {
    fn from(inner: protocol::OtherRecord) -> Other {
        Other { inner }
    }
}

/// Current USB configuration of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbStatus {
    slot: usize,
    mode: UsbMode,
    route: UsbRoute,
}

impl UsbStatus {
    /// Slot (0-based) of the node connected to the USB bus.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// USB mode of that node.
    #[inline]
    pub fn mode(&self) -> UsbMode {
        self.mode
    }

    /// Where the USB bus is routed.
    #[inline]
    pub fn route(&self) -> UsbRoute {
        self.route
    }
}

impl TryFrom<protocol::UsbRecord> for UsbStatus {
    type Error = Error;

    fn try_from(value: protocol::UsbRecord) -> Result<UsbStatus> {
        let slot = node_number(&value.node)
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidResponse,
                    format!("Unexpected node in USB status: {}", value.node),
                )
            })?;
        Ok(UsbStatus {
            slot,
            mode: value.mode,
            route: value.route,
        })
    }
}
