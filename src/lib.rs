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

//! Turing Pi 2 BMC client in Rust.
//!
//! The goal of this project is to provide a simple API for working with
//! the management controller (BMC) of a Turing Pi 2 board.
//!
//! # Usage
//!
//! Start with [configuring](struct.ClusterConfig.html) the address of the
//! board and creating a [Cluster](struct.Cluster.html):
//!
//! ```rust,no_run
//! # async fn cluster() -> turingpi::Result<()> {
//! let config = turingpi::ClusterConfig::new("192.168.1.10")?
//!     .with_credentials("root", "turing")
//!     .with_tls_verification(false);
//! let cluster = turingpi::Cluster::new(config)?;
//!
//! for node in cluster.nodes().await? {
//!     println!("{} powered on: {}", node.name(), node.is_powered_on());
//! }
//!
//! let sdcard = cluster.get_sdcard().await?;
//! println!("SD card: {} of {} bytes free", sdcard.free_bytes(), sdcard.total_bytes());
//! # Ok(()) }
//! # fn main() {}
//! ```
//!
//! No request is made until one of the query methods is called, and each
//! call results in exactly one request to the BMC.

#![crate_name = "turingpi"]
#![crate_type = "lib"]
#![doc(html_root_url = "https://docs.rs/turingpi/0.1.0")]
#![deny(unsafe_code)]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![warn(
    dead_code,
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    unused_results,
    while_true
)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

#[macro_use]
mod utils;

mod cluster;
mod config;
mod error;
mod models;
mod nodes;
mod protocol;
mod releases;
mod session;
mod types;

pub use crate::cluster::Cluster;
pub use crate::config::{ClusterConfig, Scheme};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::models::{About, Info, InterfaceDetails, Other, StorageDetails, UsbStatus};
pub use crate::nodes::Node;
pub use crate::types::{FirmwareVersion, PowerState, Refresh, UsbConfig, UsbMode, UsbRoute};
