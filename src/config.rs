//! Component H: configuration consumed (not owned) by the server root.

use std::net::IpAddr;

use serde::Deserialize;

/// A named partition of the room directory. Display-only beyond its index.
#[derive(Clone, Debug, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default = "default_max_rooms_per_group")]
    pub max_rooms: usize,
}

fn default_max_rooms_per_group() -> usize {
    256
}

/// Settings the server root needs to bind, authenticate, and bound itself.
/// Deserialized from an optional TOML file; every field has a default so the
/// binary runs with no configuration at all.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_ip: IpAddr,
    pub listen_port: u16,
    pub accepted_versions: Vec<u16>,
    pub session_timeout_seconds: u64,
    pub max_concurrent_sessions: usize,
    pub groups: Vec<GroupConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_ip: IpAddr::from([0, 0, 0, 0]),
            listen_port: 57000,
            accepted_versions: vec![1],
            session_timeout_seconds: 30,
            max_concurrent_sessions: 1024,
            groups: vec![GroupConfig {
                name: "default".to_owned(),
                max_rooms: 256,
            }],
        }
    }
}

impl Config {
    /// Loads a config from a TOML file, falling back to [`Config::default`]
    /// if `path` is `None`. Missing fields within a present file fall back to
    /// `Config::default()`'s values via `#[serde(default)]`.
    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?;
        Ok(config)
    }

    pub fn accepts_version(&self, version: u16) -> bool {
        self.accepted_versions.contains(&version)
    }
}
