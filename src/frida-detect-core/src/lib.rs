//! # frida-detect-core
//!
//! Heuristic probes for the Frida dynamic instrumentation toolkit, written
//! for Android apps that load them through JNI.
//!
//! ## Probes
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          ProbeSet                            │
//! │                                                              │
//! │  Debugger      /proc/self/status   TracerPid != 0            │
//! │  ArtifactFiles /data/local/tmp     frida-server, gadget      │
//! │  Trampoline    dlsym(libc, open)   first opcode denylist     │
//! │  ServerPort    /proc/net/tcp       6A6A / 6A6B substring     │
//! │  MemoryScan    /proc/self/maps     rwxp+anon, frida/gadget   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Properties
//!
//! - **Inconclusive is negative**: unreadable input yields `false`, never an error
//! - **Stateless**: no shared mutable state; probes may run concurrently
//! - **Scoped handles**: files and `dlopen` handles are released on every path
//! - **Textual matching**: lines are matched as raw text, not parsed into columns

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod config;
pub mod error;
pub mod security;
pub mod types;

pub use config::{ConfigError, ProbeConfig};
pub use error::ProbeError;
pub use security::{check_frida_server, check_frida_trampoline, scan_suspicious_memory, ProbeSet};
pub use types::{
    Detection, FunctionPrologueBytes, MemoryRegionLine, ProbeKind, ProbeReport, RegionCondition,
    RegionFinding, TcpConnectionLine,
};
