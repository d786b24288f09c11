//! Configuration for the probe set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Frida server's default listening port.
pub const FRIDA_DEFAULT_PORT: u16 = 27042;

/// Configuration for the Frida probes.
///
/// The defaults describe a real Android device; tests and the CLI point the
/// paths at synthetic files instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Process memory map.
    pub maps_path: PathBuf,
    /// Kernel IPv4 TCP table.
    pub tcp_table_path: PathBuf,
    /// Process status file (for `TracerPid`).
    pub status_path: PathBuf,
    /// Library whose export is inspected for an inline hook.
    pub hook_library: String,
    /// Exported function inspected for an inline hook.
    pub hook_symbol: String,
    /// Ports the Frida server listens on.
    pub server_ports: Vec<u16>,
    /// Mapping names that identify an instrumentation agent.
    pub agent_markers: Vec<String>,
    /// Files left behind by a Frida install.
    pub artifact_paths: Vec<PathBuf>,
    /// Whether the memory scan alone is enough for the quick check to report.
    pub memory_scan_decisive: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            maps_path: "/proc/self/maps".into(),
            tcp_table_path: "/proc/net/tcp".into(),
            status_path: "/proc/self/status".into(),
            hook_library: default_libc().into(),
            hook_symbol: "open".into(),
            server_ports: vec![FRIDA_DEFAULT_PORT, FRIDA_DEFAULT_PORT + 1],
            agent_markers: vec!["frida".into(), "gadget".into()],
            artifact_paths: vec![
                "/data/local/tmp/frida-server".into(),
                "/data/local/tmp/frida-gadget.so".into(),
                "/data/local/tmp/re.frida.server".into(),
            ],
            // ART's JIT cache is rwxp anon on stock devices
            memory_scan_decisive: false,
        }
    }
}

impl ProbeConfig {
    /// Load a config from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let raw = std::fs::read(&path).map_err(|e| ProbeError::source_unavailable(&path, e))?;
        let config = serde_json::from_slice(&raw)?;
        Ok(config)
    }

    /// Port encodings as they appear in `/proc/net/tcp` (`27042` -> `6A6A`).
    pub fn port_patterns(&self) -> Vec<String> {
        self.server_ports.iter().map(|p| encode_port(*p)).collect()
    }
}

/// Errors loading a [`ProbeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error(transparent)]
    Read(#[from] ProbeError),

    /// The file is not a valid config.
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Encode a port the way the kernel prints it in the TCP table.
pub fn encode_port(port: u16) -> String {
    format!("{port:04X}")
}

fn default_libc() -> &'static str {
    // On glibc "libc.so" is a linker script, not a loadable object
    if cfg!(target_os = "android") {
        "libc.so"
    } else {
        "libc.so.6"
    }
}
