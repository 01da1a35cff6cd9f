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

use turingpi::PowerState;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let slot: usize = env::args()
        .nth(1)
        .expect("Provide a node slot (0-based)")
        .parse()
        .expect("The slot must be a number");
    let state = match env::args().nth(2).as_deref() {
        Some("on") => PowerState::On,
        Some("off") => PowerState::Off,
        _ => panic!("Provide the desired power state: on or off"),
    };

    let cluster = turingpi::Cluster::from_env()
        .expect("Failed to create a cluster client from the environment");
    let mut node = cluster.node(slot).await.expect("Cannot find the node");

    if node.power_state() == state {
        println!("{} is already {}", node, state);
    } else {
        node.set_power(state).await.expect("Cannot change power state");
        println!("{} is now {}", node, node.power_state());
    }
}
