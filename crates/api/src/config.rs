//! Process configuration, read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "TAXONOMY_BIND_ADDR";
pub const STORE_PATH_VAR: &str = "TAXONOMY_STORE_PATH";
pub const PRODUCTS_PATH_VAR: &str = "TAXONOMY_PRODUCTS_PATH";
pub const REQUIRE_IF_MATCH_VAR: &str = "TAXONOMY_REQUIRE_IF_MATCH";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Snapshot file for the taxonomy; `None` keeps it in memory.
    pub store_path: Option<PathBuf>,
    /// JSON export of the product catalog; `None` starts with no products.
    pub products_path: Option<PathBuf>,
    /// Reject mutations that carry no `If-Match` header.
    pub require_if_match: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            store_path: None,
            products_path: None,
            require_if_match: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_addr = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: BIND_ADDR_VAR,
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;

        let require_if_match = match get(REQUIRE_IF_MATCH_VAR) {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: REQUIRE_IF_MATCH_VAR,
                value: raw.clone(),
                reason: "expected true or false".to_string(),
            })?,
        };

        Ok(Self {
            bind_addr,
            store_path: get(STORE_PATH_VAR).map(PathBuf::from),
            products_path: get(PRODUCTS_PATH_VAR).map(PathBuf::from),
            require_if_match,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
