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

//! Various utilities.

use chrono::{DateTime, NaiveDateTime};
use macaddr::MacAddr6;
use serde::de::Error as DeserError;
use serde::{Deserialize, Deserializer};

/// Generate an enumeration mapped to the strings used by the BMC.
///
/// Matching is case-insensitive and ignores `-`, `_` and spaces, since the
/// firmware is not consistent (`USB-A` vs `usba`, `Host` vs `host`).
macro_rules! protocol_enum {
    {$(#[$attr:meta])* enum $name:ident {
        $($(#[$iattr:meta])* $item:ident = $val:expr),+
    }} => (
        protocol_enum! {
            @base $(#[$attr])* enum $name { $($(#[$iattr])* $item = $val),+ }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(value: &str) -> $crate::Result<$name> {
                let normalized = $crate::utils::normalize(value);
                $(
                    if normalized == $crate::utils::normalize($val) {
                        return Ok($name::$item);
                    }
                )+
                Err($crate::Error::new(
                    $crate::ErrorKind::InvalidResponse,
                    format!("Unexpected {}: {}", stringify!($name), value),
                ))
            }
        }
    );

    {@base $(#[$attr:meta])* enum $name:ident {
        $($(#[$iattr:meta])* $item:ident = $val:expr),+
    }} => (
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$iattr])* $item),+
        }

        impl $name {
            /// String representation used by the BMC.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$item => $val),+
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                String::from(value.as_str())
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<$name, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value: String = ::serde::Deserialize::deserialize(deserializer)?;
                value.parse().map_err(::serde::de::Error::custom)
            }
        }
    );
}

/// Expose a field of the wrapped protocol structure as a getter.
macro_rules! transparent_property {
    ($(#[$attr:meta])* $name:ident: ref $type:ty) => (
        $(#[$attr])*
        #[inline]
        pub fn $name(&self) -> &$type {
            &self.inner.$name
        }
    );

    ($(#[$attr:meta])* $name:ident: $type:ty) => (
        $(#[$attr])*
        #[inline]
        pub fn $name(&self) -> $type {
            self.inner.$name
        }
    );
}

/// Normalize a string received from the BMC for comparison.
pub(crate) fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether the BMC reported a successful `set` operation.
pub(crate) fn is_ok_result(value: &serde_json::Value) -> bool {
    value
        .as_str()
        .map(|s| s.trim().eq_ignore_ascii_case("ok"))
        .unwrap_or(false)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

/// Deserialize a number that older firmware sends as a string.
pub(crate) fn number_or_string<'de, D>(des: D) -> ::std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(des)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

/// Same as `number_or_string` but for an optional field.
pub(crate) fn optional_number_or_string<'de, D>(
    des: D,
) -> ::std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(des)? {
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

/// Deserialize a MAC address, tolerating surrounding whitespace.
pub(crate) fn mac_address<'de, D>(des: D) -> ::std::result::Result<MacAddr6, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(des)?;
    value.trim().parse().map_err(D::Error::custom)
}

const BUILD_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a build time as reported by the firmware.
pub(crate) fn parse_build_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    BUILD_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Deserialize an optional build time, treating unknown formats as missing.
pub(crate) fn build_time<'de, D>(des: D) -> ::std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(des)?;
    Ok(value.as_deref().and_then(|v| {
        let result = parse_build_time(v);
        if result.is_none() {
            debug!("Ignoring build time in unknown format: {}", v);
        }
        result
    }))
}
