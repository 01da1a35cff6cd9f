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

use std::env;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let cluster = match env::args().nth(1) {
        Some(name) => turingpi::Cluster::from_config(name),
        None => turingpi::Cluster::from_env(),
    }
    .expect("Failed to create a cluster client");

    let about = cluster.about().await.expect("Cannot get firmware details");
    println!("Firmware version: {}", about.version());
    if let Some(api) = about.api() {
        println!("API version: {}", api);
    }

    let info = cluster.info().await.expect("Cannot get BMC information");
    for iface in info.interfaces() {
        println!("{}: {} ({})", iface.device(), iface.ip(), iface.mac());
    }
    for storage in info.storage() {
        println!(
            "{}: {} of {} bytes free",
            storage.name(),
            storage.free_bytes(),
            storage.total_bytes()
        );
    }

    let usb = cluster.usb_status().await.expect("Cannot get USB status");
    println!(
        "USB: slot {} in {} mode, routed to {}",
        usb.slot(),
        usb.mode(),
        usb.route()
    );

    match cluster.update_available().await {
        Ok(true) => println!("A firmware update is available"),
        Ok(false) => println!("Firmware is up to date"),
        Err(e) => println!("Cannot check for updates: {}", e),
    }
}
