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

//! Client configuration.
//!
//! A configuration can be built in code, loaded from environment variables
//! or from a `clusters.yaml` file looking like this:
//!
//! ```yaml
//! clusters:
//!   home:
//!     host: 192.168.1.10
//!     username: root
//!     password: turing
//!     verify_tls: false
//! ```

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, ErrorKind, Result};

/// URL of the release feed of the official BMC firmware.
pub(crate) const DEFAULT_RELEASE_FEED: &str =
    "https://api.github.com/repos/turing-machines/BMC-Firmware/releases/latest";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONFIG_FILE_NAME: &str = "clusters.yaml";

protocol_enum! {
    /// Scheme used to talk to the BMC.
    enum Scheme {
        /// HTTPS, used by firmware 2.0 and newer.
        Https = "https",
        /// Plain HTTP, used by legacy firmware.
        Http = "http"
    }
}

impl Default for Scheme {
    fn default() -> Scheme {
        Scheme::Https
    }
}

/// Configuration of a cluster client.
///
/// Only the address is required, everything else has reasonable defaults:
/// HTTPS with certificate verification, no credentials, 30 seconds timeout.
#[derive(Clone)]
pub struct ClusterConfig {
    pub(crate) address: Ipv4Addr,
    pub(crate) port: Option<u16>,
    pub(crate) scheme: Scheme,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) verify_tls: bool,
    pub(crate) timeout: Duration,
    pub(crate) release_feed: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    clusters: HashMap<String, ClusterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusterEntry {
    host: String,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    scheme: Option<Scheme>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    verify_tls: Option<bool>,
    #[serde(default)]
    timeout: Option<u64>,
}

fn parse_address(address: &str) -> Result<Ipv4Addr> {
    address.parse().map_err(|_| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("{} is not a valid IPv4 address", address),
        )
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::new(
            ErrorKind::InvalidConfig,
            format!("{} must be a boolean, got {}", name, value),
        )),
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl ClusterConfig {
    /// Create a configuration for the BMC at the given IPv4 address.
    ///
    /// Fails with `ErrorKind::InvalidConfig` if the address is not valid.
    pub fn new<S: AsRef<str>>(address: S) -> Result<ClusterConfig> {
        let address = parse_address(address.as_ref())?;
        Ok(ClusterConfig::from_address(address))
    }

    /// Create a configuration from an already parsed address.
    pub fn from_address(address: Ipv4Addr) -> ClusterConfig {
        ClusterConfig {
            address,
            port: None,
            scheme: Scheme::default(),
            username: None,
            password: None,
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
            release_feed: String::from(DEFAULT_RELEASE_FEED),
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Understands `TPI_HOST` (required), `TPI_PORT`, `TPI_SCHEME`,
    /// `TPI_USERNAME`, `TPI_PASSWORD` and `TPI_VERIFY_TLS`.
    pub fn from_env() -> Result<ClusterConfig> {
        let host = env_var("TPI_HOST").ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidConfig,
                "TPI_HOST environment variable is not set",
            )
        })?;
        let mut config = ClusterConfig::new(host)?;

        if let Some(port) = env_var("TPI_PORT") {
            let port = port.trim().parse().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("TPI_PORT must be a port number, got {}", port),
                )
            })?;
            config.port = Some(port);
        }

        if let Some(scheme) = env_var("TPI_SCHEME") {
            config.scheme = scheme
                .parse::<Scheme>()
                .map_err(|e: Error| Error::new(ErrorKind::InvalidConfig, e.to_string()))?;
        }

        if let Some(username) = env_var("TPI_USERNAME") {
            config.username = Some(username);
            config.password = env_var("TPI_PASSWORD");
        }

        if let Some(verify) = env_var("TPI_VERIFY_TLS") {
            config.verify_tls = parse_bool("TPI_VERIFY_TLS", &verify)?;
        }

        Ok(config)
    }

    /// Create a configuration from an entry in a YAML file.
    pub fn from_file<P: AsRef<Path>, S: AsRef<str>>(path: P, name: S) -> Result<ClusterConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot read {}: {}", path.display(), e),
            )
        })?;
        trace!("Loading cluster {} from {}", name.as_ref(), path.display());
        ClusterConfig::from_yaml(&content, name)
    }

    /// Create a configuration from the `clusters.yaml` file.
    ///
    /// The file is looked up in the current directory, then in
    /// `$XDG_CONFIG_HOME/turingpi` (defaulting to `~/.config/turingpi`),
    /// then in `/etc/turingpi`.
    pub fn from_config<S: AsRef<str>>(name: S) -> Result<ClusterConfig> {
        let path = config_file_candidates()
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("{} was not found", CONFIG_FILE_NAME),
                )
            })?;
        ClusterConfig::from_file(path, name)
    }

    pub(crate) fn from_yaml<S: AsRef<str>>(content: &str, name: S) -> Result<ClusterConfig> {
        let name = name.as_ref();
        let mut file: ConfigFile = serde_yaml::from_str(content)?;
        let entry = file.clusters.remove(name).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cluster {} is not found in the configuration", name),
            )
        })?;

        let mut config = ClusterConfig::new(&entry.host)?;
        config.port = entry.port;
        if let Some(scheme) = entry.scheme {
            config.scheme = scheme;
        }
        if let Some(username) = entry.username {
            config = config.with_credentials(username, entry.password.unwrap_or_default());
        }
        if let Some(verify) = entry.verify_tls {
            config.verify_tls = verify;
        }
        if let Some(timeout) = entry.timeout {
            config.timeout = Duration::from_secs(timeout);
        }
        Ok(config)
    }

    /// Use the given credentials (HTTP basic authentication).
    ///
    /// Required for firmware 2.0 and newer.
    pub fn with_credentials<U, P>(mut self, username: U, password: P) -> ClusterConfig
    where
        U: Into<String>,
        P: Into<String>,
    {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Enable or disable TLS certificate verification.
    ///
    /// The BMC ships with a self-signed certificate, so verification usually
    /// has to be disabled unless a proper certificate was installed.
    #[inline]
    pub fn with_tls_verification(mut self, verify: bool) -> ClusterConfig {
        self.verify_tls = verify;
        self
    }

    /// Use a non-standard port.
    #[inline]
    pub fn with_port(mut self, port: u16) -> ClusterConfig {
        self.port = Some(port);
        self
    }

    /// Use the given scheme.
    #[inline]
    pub fn with_scheme(mut self, scheme: Scheme) -> ClusterConfig {
        self.scheme = scheme;
        self
    }

    /// Time out for each request.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> ClusterConfig {
        self.timeout = timeout;
        self
    }

    /// URL of the feed used to find the latest firmware release.
    pub fn with_release_feed<S: Into<String>>(mut self, url: S) -> ClusterConfig {
        self.release_feed = url.into();
        self
    }

    /// Address of the BMC.
    #[inline]
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Port (if not standard).
    #[inline]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Scheme in use.
    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// User name (if any).
    #[inline]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether TLS certificates are verified.
    #[inline]
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Time out for each request.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL of the BMC API.
    pub(crate) fn endpoint(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}/api/", self.scheme, self.address, port),
            None => format!("{}://{}/api/", self.scheme, self.address),
        }
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .field("release_feed", &self.release_feed)
            .finish()
    }
}

fn config_file_candidates() -> Vec<PathBuf> {
    let mut result = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_home) = env_var("XDG_CONFIG_HOME") {
        result.push(PathBuf::from(config_home).join("turingpi").join(CONFIG_FILE_NAME));
    } else if let Some(home) = env_var("HOME") {
        result.push(
            PathBuf::from(home)
                .join(".config")
                .join("turingpi")
                .join(CONFIG_FILE_NAME),
        );
    }
    result.push(PathBuf::from("/etc/turingpi").join(CONFIG_FILE_NAME));
    result
}

#[cfg(test)]
mod test {
    use std::env;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use super::{ClusterConfig, Scheme};
    use crate::ErrorKind;

    #[test]
    fn test_config_new() {
        let config = ClusterConfig::new("192.168.1.10").unwrap();
        assert_eq!(config.address(), Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(config.scheme(), Scheme::Https);
        assert!(config.verify_tls());
        assert!(config.username().is_none());
        assert_eq!(config.endpoint(), "https://192.168.1.10/api/");
    }

    #[test]
    fn test_config_invalid_address() {
        for address in [
            "",
            "turingpi.local",
            "192.168.1",
            "256.1.1.1",
            "::1",
            " 10.0.0.1\n",
            "10.0.0.1 ",
        ] {
            let err = ClusterConfig::new(address).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfig, "{}", address);
        }
    }

    #[test]
    fn test_config_builder() {
        let config = ClusterConfig::new("10.0.0.2")
            .unwrap()
            .with_credentials("root", "turing")
            .with_tls_verification(false)
            .with_scheme(Scheme::Http)
            .with_port(8080)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.username(), Some("root"));
        assert!(!config.verify_tls());
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.endpoint(), "http://10.0.0.2:8080/api/");
    }

    #[test]
    fn test_config_debug_hides_password() {
        let config = ClusterConfig::new("10.0.0.2")
            .unwrap()
            .with_credentials("root", "s3cr3t");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("root"));
    }

    #[test]
    fn test_config_from_yaml() {
        let content = r#"
clusters:
  home:
    host: 192.168.1.10
    username: root
    password: turing
    verify_tls: false
  lab:
    host: 10.1.1.1
    port: 8443
    scheme: http
    timeout: 5
"#;
        let home = ClusterConfig::from_yaml(content, "home").unwrap();
        assert_eq!(home.address(), Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(home.username(), Some("root"));
        assert_eq!(home.password.as_deref(), Some("turing"));
        assert!(!home.verify_tls());

        let lab = ClusterConfig::from_yaml(content, "lab").unwrap();
        assert_eq!(lab.endpoint(), "http://10.1.1.1:8443/api/");
        assert_eq!(lab.timeout(), Duration::from_secs(5));
        assert!(lab.verify_tls());

        let err = ClusterConfig::from_yaml(content, "missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_config_from_yaml_invalid() {
        let err = ClusterConfig::from_yaml("clusters: 42", "home").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        let bad_host = "clusters:\n  home:\n    host: turingpi.local\n";
        let err = ClusterConfig::from_yaml(bad_host, "home").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = ClusterConfig::from_file("/nonexistent/clusters.yaml", "home").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    // The only test touching TPI_* variables, so it cannot race with others.
    #[test]
    fn test_config_from_env() {
        env::remove_var("TPI_HOST");
        let err = ClusterConfig::from_env().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        env::set_var("TPI_HOST", "10.0.0.2");
        env::set_var("TPI_PORT", "8443");
        env::set_var("TPI_SCHEME", "HTTP");
        env::set_var("TPI_USERNAME", "root");
        env::set_var("TPI_PASSWORD", "turing");
        env::set_var("TPI_VERIFY_TLS", "false");
        let config = ClusterConfig::from_env().unwrap();
        assert_eq!(config.address(), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(config.port(), Some(8443));
        assert_eq!(config.scheme(), Scheme::Http);
        assert_eq!(config.username(), Some("root"));
        assert!(!config.verify_tls());
        assert_eq!(config.endpoint(), "http://10.0.0.2:8443/api/");

        env::set_var("TPI_PORT", "not-a-port");
        let err = ClusterConfig::from_env().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        for name in [
            "TPI_HOST",
            "TPI_PORT",
            "TPI_SCHEME",
            "TPI_USERNAME",
            "TPI_PASSWORD",
            "TPI_VERIFY_TLS",
        ] {
            env::remove_var(name);
        }
    }
}
