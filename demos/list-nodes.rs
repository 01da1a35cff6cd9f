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

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let cluster = turingpi::Cluster::from_env()
        .expect("Failed to create a cluster client from the environment");

    let nodes = cluster.nodes().await.expect("Cannot list nodes");
    println!("Nodes of {}:", cluster.address());
    for node in &nodes {
        println!(
            "Slot = {}, Name = {}, Power = {}",
            node.slot(),
            node.name(),
            node.power_state()
        );
    }

    let sdcard = cluster.get_sdcard().await.expect("Cannot get SD card");
    println!(
        "{}: {} used, {} free, {} total",
        sdcard.name(),
        sdcard.used_bytes(),
        sdcard.free_bytes(),
        sdcard.total_bytes()
    );
}
