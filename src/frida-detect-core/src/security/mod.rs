//! Frida detection probes.
//!
//! Every probe is a one-shot boolean query. A probe that cannot read its
//! input reports "not detected": a negative answer means no evidence was
//! found, never that Frida is absent.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use frida_detect_core::security::ProbeSet;
//!
//! let probes = ProbeSet::default();
//! if let Some(detection) = probes.quick_check() {
//!     eprintln!("instrumentation detected: {detection}");
//! }
//! ```

pub mod anti_tamper;
pub mod inline_hook;
pub mod proc_scan;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info};

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::types::{Detection, ProbeKind, ProbeReport, RegionFinding};

pub use anti_tamper::{find_artifact, is_traced};
pub use inline_hook::{inspect_export, read_prologue};
pub use proc_scan::{classify_region, scan_memory_maps, scan_tcp_table, tracer_pid};

/// The Frida probe set.
///
/// Holds only immutable configuration, so one instance can be shared across
/// threads and probes can run concurrently.
#[derive(Debug, Clone, Default)]
pub struct ProbeSet {
    config: ProbeConfig,
}

impl ProbeSet {
    /// Create a probe set with the given configuration.
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Inline-hook check on the configured libc export.
    pub fn check_trampoline(&self) -> bool {
        inspect_export(&self.config.hook_library, &self.config.hook_symbol)
            .unwrap_or_else(|e| inconclusive(ProbeKind::Trampoline, &e))
    }

    /// Frida server port check against the TCP table.
    pub fn check_server_port(&self) -> bool {
        self.find_server_port().is_some()
    }

    /// The first TCP table line carrying a Frida port.
    pub fn find_server_port(&self) -> Option<String> {
        let reader = self.open(ProbeKind::ServerPort, &self.config.tcp_table_path)?;
        scan_tcp_table(reader, &self.config.port_patterns())
    }

    /// Suspicious memory region scan.
    pub fn scan_suspicious_memory(&self) -> bool {
        self.find_suspicious_region().is_some()
    }

    /// The first suspicious region in the memory map.
    pub fn find_suspicious_region(&self) -> Option<RegionFinding> {
        let reader = self.open(ProbeKind::MemoryScan, &self.config.maps_path)?;
        scan_memory_maps(reader, &self.config.agent_markers)
    }

    /// Whether a tracer is attached to this process.
    pub fn check_debugger(&self) -> bool {
        self.tracer().is_some()
    }

    /// Pid of the attached tracer, if any.
    pub fn tracer(&self) -> Option<i32> {
        let reader = self.open(ProbeKind::Debugger, &self.config.status_path)?;
        let pid = tracer_pid(reader).filter(|pid| is_traced(*pid))?;
        info!("Tracer attached: pid {}", pid);
        Some(pid)
    }

    /// Whether a Frida file exists on disk.
    pub fn check_artifact_files(&self) -> bool {
        self.find_artifact_file().is_some()
    }

    /// The first Frida file found on disk.
    pub fn find_artifact_file(&self) -> Option<&Path> {
        find_artifact(&self.config.artifact_paths)
    }

    /// Run one probe.
    pub fn run(&self, kind: ProbeKind) -> bool {
        match kind {
            ProbeKind::Trampoline => self.check_trampoline(),
            ProbeKind::ServerPort => self.check_server_port(),
            ProbeKind::MemoryScan => self.scan_suspicious_memory(),
            ProbeKind::Debugger => self.check_debugger(),
            ProbeKind::ArtifactFiles => self.check_artifact_files(),
        }
    }

    /// Run every probe without short-circuiting.
    pub fn run_all(&self) -> ProbeReport {
        let mut report = ProbeReport::default();
        for kind in ProbeKind::ALL {
            report.set(kind, self.run(kind));
        }
        report
    }

    /// Run the probes in order and return the first detection.
    ///
    /// The memory scan always runs, but only reports when
    /// [`ProbeConfig::memory_scan_decisive`] is set.
    pub fn quick_check(&self) -> Option<Detection> {
        if let Some(tracer_pid) = self.tracer() {
            return Some(Detection::DebuggerAttached { tracer_pid });
        }
        if let Some(path) = self.find_artifact_file() {
            return Some(Detection::ArtifactFile {
                path: path.display().to_string(),
            });
        }
        if self.check_trampoline() {
            return Some(Detection::TrampolineHook);
        }
        if self.check_server_port() {
            return Some(Detection::ServerPort);
        }
        let finding = self.find_suspicious_region()?;
        if self.config.memory_scan_decisive {
            return Some(Detection::SuspiciousMemory { finding });
        }
        info!(
            "Ignoring memory scan hit on line {}: {:?}",
            finding.line_number, finding.condition
        );
        None
    }

    fn open(&self, kind: ProbeKind, path: &Path) -> Option<BufReader<File>> {
        match File::open(path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) => {
                inconclusive(kind, &ProbeError::source_unavailable(path, e));
                None
            },
        }
    }
}

/// Log why a probe could not run and report "not detected".
fn inconclusive(kind: ProbeKind, err: &ProbeError) -> bool {
    if err.is_not_found() {
        debug!(probe = %kind, "Probe inconclusive: {}", err);
    } else {
        info!(probe = %kind, "Probe inconclusive: {}", err);
    }
    false
}

/// Inline-hook check with the default configuration.
pub fn check_frida_trampoline() -> bool {
    ProbeSet::default().check_trampoline()
}

/// Frida server port check with the default configuration.
pub fn check_frida_server() -> bool {
    ProbeSet::default().check_server_port()
}

/// Memory map scan with the default configuration.
pub fn scan_suspicious_memory() -> bool {
    ProbeSet::default().scan_suspicious_memory()
}
