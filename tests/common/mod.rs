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

//! In-process mock of the BMC API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};

use axum::extract::{self, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use base64::Engine;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use serde_json::{json, Value};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A request received by the mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub params: Vec<(String, String)>,
    pub authorization: Option<String>,
}

impl Recorded {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct State {
    pub power: Vec<u8>,
    pub sdcard: (u64, u64, u64),
    pub credentials: Option<(String, String)>,
    pub failing: Vec<String>,
    pub statuses: HashMap<String, u16>,
    pub latest_release: String,
    pub version: String,
    pub requests: Vec<Recorded>,
}

impl Default for State {
    fn default() -> State {
        State {
            power: vec![1, 0, 0, 1],
            sdcard: (1_000, 4_000, 3_000),
            credentials: None,
            failing: Vec::new(),
            statuses: HashMap::new(),
            latest_release: String::from("v2.1.0"),
            version: String::from("2.0.5"),
            requests: Vec::new(),
        }
    }
}

type Shared = Arc<Mutex<State>>;

/// Mock BMC listening on a random local port.
#[derive(Debug, Clone)]
pub struct MockBmc {
    pub addr: SocketAddr,
    pub state: Shared,
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/bmc", get(bmc))
        .route("/releases/latest", get(latest_release))
        .with_state(state)
}

impl MockBmc {
    /// Start a plain HTTP mock.
    pub async fn start(state: State) -> MockBmc {
        let state = Arc::new(Mutex::new(state));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        let _ = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        MockBmc { addr, state }
    }

    /// Start an HTTPS mock with a freshly generated self-signed certificate.
    pub async fn start_tls(state: State) -> MockBmc {
        let names = vec![String::from("127.0.0.1")];
        let certified = rcgen::generate_simple_self_signed(names).unwrap();
        let cert = CertificateDer::from(certified.cert.der().to_vec());
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
            certified.key_pair.serialize_der(),
        ));
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let mut config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert], key)
            .unwrap();
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        let state = Arc::new(Mutex::new(state));
        let app = router(state.clone());
        let handle = Handle::new();
        let server = axum_server::bind_rustls(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            RustlsConfig::from_config(Arc::new(config)),
        )
        .handle(handle.clone());
        let _ = tokio::spawn(async move {
            let _ = server.serve(app.into_make_service()).await;
        });
        let addr = handle.listening().await.unwrap();
        MockBmc { addr, state }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn power(&self) -> Vec<u8> {
        self.state.lock().unwrap().power.clone()
    }

    pub fn fail(&self, kind: &str) {
        self.state.lock().unwrap().failing.push(String::from(kind));
    }

    pub fn respond_with_status(&self, kind: &str, status: u16) {
        let _ = self
            .state
            .lock()
            .unwrap()
            .statuses
            .insert(String::from(kind), status);
    }

    pub fn release_feed(&self) -> String {
        format!("http://127.0.0.1:{}/releases/latest", self.port())
    }
}

fn wrap(result: Value) -> Json<Value> {
    Json(json!({ "response": [{ "result": result }] }))
}

async fn latest_release(extract::State(state): extract::State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(json!({
        "tag_name": state.latest_release,
        "draft": false,
        "prerelease": false,
    }))
}

async fn bmc(
    extract::State(state): extract::State<Shared>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let request = Recorded {
        path: String::from("/api/bmc"),
        params,
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    };
    let mut state = state.lock().unwrap();
    let response = respond(&mut state, &request);
    state.requests.push(request);
    response
}

fn respond(state: &mut State, request: &Recorded) -> (StatusCode, Json<Value>) {
    if let Some((ref username, ref password)) = state.credentials {
        let expected = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password))
        );
        if request.authorization.as_deref() != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
        }
    }

    let opt = request.param("opt").unwrap_or_default().to_string();
    let kind = request.param("type").unwrap_or_default().to_string();

    if let Some(status) = state.statuses.get(&kind) {
        let status = StatusCode::from_u16(*status).unwrap();
        return (status, Json(json!({ "error": "injected" })));
    }

    if state.failing.contains(&kind) {
        return (StatusCode::OK, wrap(json!("failed")));
    }

    let result = match (opt.as_str(), kind.as_str()) {
        ("get", "power") => {
            let mut nodes = serde_json::Map::new();
            for (idx, value) in state.power.iter().enumerate() {
                let _ = nodes.insert(format!("node{}", idx + 1), json!(value.to_string()));
            }
            json!([nodes])
        }
        ("get", "sdcard") => {
            let (free, total, used) = state.sdcard;
            json!([{ "free": free, "total": total, "use": used }])
        }
        ("get", "about") => json!([{
            "api": "1.1",
            "build_version": "2023.11",
            "buildroot": "Buildroot 2022.08",
            "buildtime": "2023-11-13 13:27:04",
            "version": state.version,
        }]),
        ("get", "info") => json!({
            "ip": [{ "device": "eth0", "ip": "127.0.0.1", "mac": "02:00:00:00:00:01 " }],
            "storage": [{ "name": "BMC", "bytes_free": 100, "total_bytes": 400 }],
        }),
        ("get", "other") => json!([{
            "api": "1.1",
            "build_version": "2023.11",
            "buildroot": "Buildroot 2022.08",
            "buildtime": "2023-11-13 13:27:04",
            "ip": "127.0.0.1",
            "mac": "02:00:00:00:00:02",
            "version": state.version,
        }]),
        ("get", "usb") => json!([{ "mode": "Device", "node": "Node 2", "route": "USB-A" }]),
        ("set", "power") => {
            for (key, value) in &request.params {
                if let Some(number) = key.strip_prefix("node") {
                    let idx = match number.parse::<usize>() {
                        Ok(n) if n >= 1 && n <= state.power.len() => n - 1,
                        _ => return (StatusCode::OK, wrap(json!("unknown node"))),
                    };
                    state.power[idx] = value.parse().unwrap_or(0);
                }
            }
            json!("ok")
        }
        (
            "set",
            "usb_boot" | "clear_usb_boot" | "node_to_msd" | "usb" | "network" | "reload" | "reboot",
        ) => json!("ok"),
        _ => return (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown request" }))),
    };
    (StatusCode::OK, wrap(result))
}
