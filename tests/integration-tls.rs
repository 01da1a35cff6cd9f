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

mod common;

use turingpi::{Cluster, ClusterConfig, ErrorKind};

use common::{init_logging, MockBmc, State};

async fn set_up(verify: bool) -> (MockBmc, Cluster) {
    init_logging();
    let mock = MockBmc::start_tls(State::default()).await;
    let config = ClusterConfig::new("127.0.0.1")
        .expect("Invalid address")
        .with_port(mock.port())
        .with_tls_verification(verify);
    let cluster = Cluster::new(config).expect("Cannot create a cluster");
    (mock, cluster)
}

#[tokio::test]
async fn test_self_signed_accepted_without_verification() {
    let (mock, cluster) = set_up(false).await;
    let nodes = cluster.nodes().await.expect("Cannot list nodes over TLS");
    assert_eq!(nodes.len(), 4);
    let sdcard = cluster.get_sdcard().await.expect("Cannot get SD card over TLS");
    assert_eq!(sdcard.total_bytes(), 4_000);
    assert_eq!(mock.requests().len(), 2);
}

#[tokio::test]
async fn test_self_signed_rejected_with_verification() {
    let (mock, cluster) = set_up(true).await;
    let err = cluster.nodes().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolError);
    assert!(mock.requests().is_empty());
}
