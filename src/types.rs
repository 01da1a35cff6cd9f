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

//! Types and traits shared by the cluster and node APIs.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::de::{Error as DeserError, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, ErrorKind, Result};

/// Trait representing something that can be refreshed.
#[async_trait]
pub trait Refresh {
    /// Refresh the resource representation.
    async fn refresh(&mut self) -> Result<()>;
}

/// Power state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerState {
    /// Node is powered off.
    #[default]
    Off,
    /// Node is powered on.
    On,
}

impl PowerState {
    /// Value used by the BMC for this state.
    #[inline]
    pub fn as_flag(&self) -> u8 {
        match self {
            PowerState::Off => 0,
            PowerState::On => 1,
        }
    }

    /// Whether the state is `On`.
    #[inline]
    pub fn is_on(&self) -> bool {
        *self == PowerState::On
    }
}

impl From<bool> for PowerState {
    fn from(value: bool) -> PowerState {
        if value {
            PowerState::On
        } else {
            PowerState::Off
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerState::Off => "off",
            PowerState::On => "on",
        })
    }
}

impl Serialize for PowerState {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_flag())
    }
}

struct PowerStateVisitor;

impl<'de> Visitor<'de> for PowerStateVisitor {
    type Value = PowerState;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("0 or 1 as a number or a string")
    }

    fn visit_u64<E>(self, value: u64) -> ::std::result::Result<PowerState, E>
    where
        E: DeserError,
    {
        match value {
            0 => Ok(PowerState::Off),
            1 => Ok(PowerState::On),
            other => Err(E::invalid_value(Unexpected::Unsigned(other), &self)),
        }
    }

    fn visit_i64<E>(self, value: i64) -> ::std::result::Result<PowerState, E>
    where
        E: DeserError,
    {
        match value {
            0 => Ok(PowerState::Off),
            1 => Ok(PowerState::On),
            other => Err(E::invalid_value(Unexpected::Signed(other), &self)),
        }
    }

    fn visit_bool<E>(self, value: bool) -> ::std::result::Result<PowerState, E>
    where
        E: DeserError,
    {
        Ok(PowerState::from(value))
    }

    fn visit_str<E>(self, value: &str) -> ::std::result::Result<PowerState, E>
    where
        E: DeserError,
    {
        match value.trim() {
            "0" => Ok(PowerState::Off),
            "1" => Ok(PowerState::On),
            other => Err(E::invalid_value(Unexpected::Str(other), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for PowerState {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<PowerState, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PowerStateVisitor)
    }
}

protocol_enum! {
    /// USB mode of the node currently connected to the USB bus.
    enum UsbMode {
        /// The node acts as a USB host.
        Host = "host",
        /// The node acts as a USB device.
        Device = "device",
        /// The node is in flashing mode.
        Flash = "flash"
    }
}

protocol_enum! {
    /// Where the USB bus of the node is routed.
    enum UsbRoute {
        /// Routed to the BMC.
        Bmc = "bmc",
        /// Routed to the USB-A port of the board.
        UsbA = "usb-a"
    }
}

/// USB configuration to apply to a node.
///
/// The BMC expects this configuration as a single numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbConfig {
    mode: UsbMode,
    route: UsbRoute,
    flash: bool,
}

impl UsbConfig {
    /// Create a configuration for the given mode, routed to the USB-A port.
    ///
    /// `UsbMode::Flash` is the same as `UsbMode::Device` with flashing enabled.
    pub fn new(mode: UsbMode) -> UsbConfig {
        match mode {
            UsbMode::Flash => UsbConfig {
                mode: UsbMode::Device,
                route: UsbRoute::UsbA,
                flash: true,
            },
            other => UsbConfig {
                mode: other,
                route: UsbRoute::UsbA,
                flash: false,
            },
        }
    }

    /// Node acting as a USB host.
    #[inline]
    pub fn host() -> UsbConfig {
        UsbConfig::new(UsbMode::Host)
    }

    /// Node acting as a USB device.
    #[inline]
    pub fn device() -> UsbConfig {
        UsbConfig::new(UsbMode::Device)
    }

    /// Route the USB bus to the given destination.
    #[inline]
    pub fn with_route(mut self, route: UsbRoute) -> UsbConfig {
        self.route = route;
        self
    }

    /// Enable or disable flashing mode.
    #[inline]
    pub fn with_flash(mut self, flash: bool) -> UsbConfig {
        self.flash = flash;
        self
    }

    /// USB mode (host or device).
    #[inline]
    pub fn mode(&self) -> UsbMode {
        self.mode
    }

    /// USB route.
    #[inline]
    pub fn route(&self) -> UsbRoute {
        self.route
    }

    /// Whether flashing mode is requested.
    #[inline]
    pub fn is_flash(&self) -> bool {
        self.flash
    }

    /// Numeric code understood by the BMC.
    pub fn code(&self) -> u8 {
        let route = match self.route {
            UsbRoute::UsbA => 0,
            UsbRoute::Bmc => 4,
        };
        let flash = if self.flash { 2 } else { 0 };
        let mode = match self.mode {
            UsbMode::Device | UsbMode::Flash => 1,
            UsbMode::Host => 0,
        };
        route + flash + mode
    }
}

impl Default for UsbConfig {
    fn default() -> UsbConfig {
        UsbConfig::host()
    }
}

/// Firmware version of the BMC (major, minor, patch).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct FirmwareVersion(pub u16, pub u16, pub u16);

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

fn parse_component(component: &str, message: &str) -> Result<u16> {
    component
        .trim()
        .parse()
        .map_err(|_| Error::new(ErrorKind::InvalidResponse, message))
}

impl FromStr for FirmwareVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<FirmwareVersion> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        // Pre-release and build suffixes do not take part in comparison.
        let core = trimmed.split(['-', '+']).next().unwrap_or_default();
        let parts: Vec<&str> = core.split('.').collect();

        if parts.len() < 2 || parts.len() > 3 {
            let msg = format!("Invalid firmware version: expected X.Y.Z, got {}", s);
            return Err(Error::new(ErrorKind::InvalidResponse, msg));
        }

        let major = parse_component(parts[0], "First version component is not a number")?;
        let minor = parse_component(parts[1], "Second version component is not a number")?;
        let patch = match parts.get(2) {
            Some(value) => parse_component(value, "Third version component is not a number")?,
            None => 0,
        };

        Ok(FirmwareVersion(major, minor, patch))
    }
}

impl Serialize for FirmwareVersion {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FirmwareVersion {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<FirmwareVersion, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        FirmwareVersion::from_str(&value).map_err(D::Error::custom)
    }
}
