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

//! JSON structures and protocol bits for the BMC API.

use std::net::Ipv4Addr;

use chrono::NaiveDateTime;
use macaddr::MacAddr6;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::types::{PowerState, UsbMode, UsbRoute};
use crate::utils::{build_time, mac_address, number_or_string, optional_number_or_string};
use crate::{Error, ErrorKind, Result};

/// Envelope of every BMC response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRoot {
    pub response: Vec<ResponseItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseItem {
    pub result: Value,
}

impl ResponseRoot {
    /// Extract the result of the first response item.
    pub fn into_result(self) -> Result<Value> {
        self.response
            .into_iter()
            .next()
            .map(|item| item.result)
            .ok_or_else(|| Error::new(ErrorKind::InvalidResponse, "Empty response received"))
    }
}

/// Convert a result that is either a list with one item or the item itself.
///
/// Some queries wrap the payload in a list, some do not, depending on the
/// firmware version.
pub fn first_item<T: DeserializeOwned>(result: Value) -> Result<T> {
    let item = match result {
        Value::Array(items) => items.into_iter().next().ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse, "Empty result list received")
        })?,
        other => other,
    };
    serde_json::from_value(item).map_err(From::from)
}

/// Power state of all nodes, keyed by node name (`node1` ... `node4`).
#[derive(Debug, Clone)]
pub struct PowerRecord {
    pub nodes: Vec<(String, PowerState)>,
}

impl PowerRecord {
    pub fn from_result(result: Value) -> Result<PowerRecord> {
        let map: Map<String, Value> = first_item(result)?;
        let mut nodes = Vec::with_capacity(map.len());
        for (name, value) in map {
            let state: PowerState = serde_json::from_value(value)?;
            nodes.push((name, state));
        }
        nodes.sort_by_key(|(name, _)| node_number(name));
        Ok(PowerRecord { nodes })
    }
}

/// Number of the node from its name, e.g. 1 from `node1` or `Node 1`.
pub fn node_number(name: &str) -> Option<usize> {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdCardRecord {
    #[serde(deserialize_with = "number_or_string")]
    pub free: u64,
    #[serde(deserialize_with = "number_or_string")]
    pub total: u64,
    #[serde(default, rename = "use", deserialize_with = "optional_number_or_string")]
    pub used: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageRecord {
    pub name: String,
    #[serde(rename = "bytes_free", deserialize_with = "number_or_string")]
    pub free: u64,
    #[serde(rename = "total_bytes", deserialize_with = "number_or_string")]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterfaceRecord {
    pub device: String,
    pub ip: Ipv4Addr,
    #[serde(deserialize_with = "mac_address")]
    pub mac: MacAddr6,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoRecord {
    #[serde(default)]
    pub ip: Vec<InterfaceRecord>,
    #[serde(default)]
    pub storage: Vec<StorageRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AboutRecord {
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub build_version: Option<String>,
    #[serde(default)]
    pub buildroot: Option<String>,
    #[serde(default, deserialize_with = "build_time")]
    pub buildtime: Option<NaiveDateTime>,
    #[serde(default)]
    pub hostname: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtherRecord {
    pub api: String,
    pub build_version: String,
    pub buildroot: String,
    #[serde(default, deserialize_with = "build_time")]
    pub buildtime: Option<NaiveDateTime>,
    pub ip: Ipv4Addr,
    #[serde(deserialize_with = "mac_address")]
    pub mac: MacAddr6,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsbRecord {
    pub mode: UsbMode,
    pub node: String,
    pub route: UsbRoute,
}

/// Query string of a BMC request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmcQuery {
    pub(crate) params: Vec<(String, String)>,
}

impl BmcQuery {
    fn new(opt: &str, kind: &str) -> BmcQuery {
        BmcQuery {
            params: vec![
                (String::from("opt"), String::from(opt)),
                (String::from("type"), String::from(kind)),
            ],
        }
    }

    /// A read request.
    #[inline]
    pub fn get(kind: &str) -> BmcQuery {
        BmcQuery::new("get", kind)
    }

    /// A modifying request.
    #[inline]
    pub fn set(kind: &str) -> BmcQuery {
        BmcQuery::new("set", kind)
    }

    /// Add a parameter.
    pub fn with<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> BmcQuery {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// The kind of the request (for logging).
    pub fn kind(&self) -> &str {
        self.params
            .iter()
            .find(|(k, _)| k == "type")
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{first_item, node_number, BmcQuery, PowerRecord, ResponseRoot, SdCardRecord};
    use crate::types::PowerState;
    use crate::ErrorKind;

    #[test]
    fn test_response_root() {
        let root: ResponseRoot =
            serde_json::from_value(json!({"response": [{"result": "ok"}]})).unwrap();
        assert_eq!(root.into_result().unwrap(), json!("ok"));

        let empty: ResponseRoot = serde_json::from_value(json!({"response": []})).unwrap();
        assert_eq!(
            empty.into_result().unwrap_err().kind(),
            ErrorKind::InvalidResponse
        );
    }

    #[test]
    fn test_power_record_sorted_by_node() {
        let result = json!([{"node3": "0", "node1": "1", "node4": 0, "node2": 1}]);
        let record = PowerRecord::from_result(result).unwrap();
        let names: Vec<&str> = record.nodes.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["node1", "node2", "node3", "node4"]);
        assert_eq!(record.nodes[0].1, PowerState::On);
        assert_eq!(record.nodes[2].1, PowerState::Off);
    }

    #[test]
    fn test_power_record_invalid() {
        let err = PowerRecord::from_result(json!([{"node1": "maybe"}])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        let err = PowerRecord::from_result(json!([])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_node_number() {
        assert_eq!(node_number("node1"), Some(1));
        assert_eq!(node_number("Node 4"), Some(4));
        assert_eq!(node_number("bmc"), None);
    }

    #[test]
    fn test_sdcard_record() {
        let record: SdCardRecord =
            first_item(json!([{"free": 100, "total": "300", "use": 200}])).unwrap();
        assert_eq!(record.free, 100);
        assert_eq!(record.total, 300);
        assert_eq!(record.used, Some(200));

        let record: SdCardRecord = first_item(json!({"free": 10, "total": 30})).unwrap();
        assert_eq!(record.used, None);
    }

    #[test]
    fn test_query_kind() {
        let query = BmcQuery::set("power").with("node1", 1);
        assert_eq!(query.kind(), "power");
        assert_eq!(query.params.len(), 3);
        assert_eq!(query.params[2], (String::from("node1"), String::from("1")));
    }
}
