//! Client configuration – reads/writes `~/.kachaka/config.toml`.
//!
//! ```toml
//! target = "100.94.1.1:26400"
//!
//! [simulator]
//! default_location_id = "L01"
//!
//! [[simulator.shelves]]
//! id = "S01"
//! name = "kitchen-cart"
//!
//! [[simulator.locations]]
//! id = "L01"
//! name = "charger"
//! ```
//!
//! The `[simulator]` table seeds the in-process
//! [`SimulatedRobot`][crate::sim::SimulatedRobot]; a real robot reports its
//! own layout.

use std::fs;
use std::path::{Path, PathBuf};

use kachaka_types::{KachakaError, Location, Shelf};
use serde::{Deserialize, Serialize};

/// Endpoint of a robot on its default network.
pub const DEFAULT_TARGET: &str = "100.94.1.1:26400";

/// Persisted client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `host:port` of the robot's RPC endpoint.
    #[serde(default = "default_target")]
    pub target: String,

    /// Layout served by the simulated robot.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Initial state of the simulated robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_serial_number")]
    pub serial_number: String,
    #[serde(default)]
    pub default_location_id: String,
    #[serde(default)]
    pub shelves: Vec<Shelf>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}
fn default_serial_number() -> String {
    "SIM-0000".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            serial_number: default_serial_number(),
            default_location_id: "L01".to_string(),
            shelves: vec![
                Shelf::new("S01", "kitchen-cart"),
                Shelf::new("S02", "laundry-rack"),
            ],
            locations: vec![
                Location::new("L01", "charger"),
                Location::new("L02", "living-room"),
                Location::new("L03", "bedroom"),
            ],
        }
    }
}

/// Check that `target` is a `host:port` pair with a non-empty host and a
/// non-zero port.
pub fn validate_target(target: &str) -> Result<(), KachakaError> {
    let invalid = || KachakaError::InvalidTarget(target.to_string());
    let (host, port) = target.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    match port.parse::<u16>() {
        Ok(p) if p != 0 => Ok(()),
        _ => Err(invalid()),
    }
}

/// Return the path to `~/.kachaka/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".kachaka").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<ClientConfig>, KachakaError> {
    load_from(&config_path())
}

/// Load the config from a specific path and apply environment overrides.
pub fn load_from(path: &Path) -> Result<Option<ClientConfig>, KachakaError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        KachakaError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut cfg: ClientConfig = toml::from_str(&raw)
        .map_err(|e| KachakaError::Config(format!("failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `KACHAKA_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `KACHAKA_TARGET` | `target` |
pub fn apply_env_overrides(cfg: &mut ClientConfig) {
    if let Ok(v) = std::env::var("KACHAKA_TARGET")
        && !v.is_empty()
    {
        cfg.target = v;
    }
}

/// Save the config to disk, creating `~/.kachaka/` if necessary.
pub fn save(cfg: &ClientConfig) -> Result<(), KachakaError> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub fn save_to(cfg: &ClientConfig, path: &Path) -> Result<(), KachakaError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            KachakaError::Config(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| KachakaError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| KachakaError::Config(format!("failed to write {}: {e}", path.display())))
}
