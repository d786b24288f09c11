//! Types shared by the probes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of prologue bytes read from a hooked function.
pub const PROLOGUE_LEN: usize = 4;

/// First opcode bytes that indicate a trampoline or a cleared entry point.
///
/// `0xFF` is an absolute indirect jump, `0x00` a zeroed instruction and `0x20`
/// a branch encoding seen on patched entries.
pub const SUSPICIOUS_OPCODES: [u8; 3] = [0xFF, 0x00, 0x20];

/// The probes this crate knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Inline hook on a libc export.
    Trampoline,
    /// Frida server port in the TCP table.
    ServerPort,
    /// RWX anonymous region or agent library in the memory map.
    MemoryScan,
    /// A tracer is attached to this process.
    Debugger,
    /// Frida files on disk.
    ArtifactFiles,
}

impl ProbeKind {
    /// Every probe, in quick-check order.
    pub const ALL: [ProbeKind; 5] = [
        ProbeKind::Debugger,
        ProbeKind::ArtifactFiles,
        ProbeKind::Trampoline,
        ProbeKind::ServerPort,
        ProbeKind::MemoryScan,
    ];

    /// Short stable name, used by the CLI and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trampoline => "trampoline",
            Self::ServerPort => "server_port",
            Self::MemoryScan => "memory_scan",
            Self::Debugger => "debugger",
            Self::ArtifactFiles => "artifact_files",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First bytes of a function's machine code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionPrologueBytes(pub [u8; PROLOGUE_LEN]);

impl FunctionPrologueBytes {
    /// Whether the first byte is one of [`SUSPICIOUS_OPCODES`].
    pub fn is_suspicious(&self) -> bool {
        is_suspicious_prologue(&self.0)
    }
}

impl fmt::Display for FunctionPrologueBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:02X} {b:02X} {c:02X} {d:02X}")
    }
}

/// Check a byte sequence against the opcode denylist.
///
/// Only the first byte is inspected; an empty slice is clean.
pub fn is_suspicious_prologue(bytes: &[u8]) -> bool {
    bytes
        .first()
        .is_some_and(|b| SUSPICIOUS_OPCODES.contains(b))
}

/// One line of `/proc/<pid>/maps`.
///
/// Format: `start-end perms offset dev inode [name]`. Fields are split lazily;
/// matching is done against [`MemoryRegionLine::raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegionLine<'a> {
    raw: &'a str,
}

impl<'a> MemoryRegionLine<'a> {
    /// Wrap a raw line.
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// The line as read.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// `start-end` address range.
    pub fn address_range(&self) -> Option<&'a str> {
        self.raw.split_whitespace().next()
    }

    /// Permission flags, e.g. `r-xp`.
    pub fn permissions(&self) -> Option<&'a str> {
        self.raw.split_whitespace().nth(1)
    }

    /// Backing path or pseudo-name; empty for plain anonymous memory.
    pub fn name(&self) -> &'a str {
        let mut rest = self.raw.trim_start();
        // Skip the five fixed columns; the name may contain spaces.
        for _ in 0..5 {
            match rest.find(char::is_whitespace) {
                Some(idx) => rest = rest[idx..].trim_start(),
                None => return "",
            }
        }
        rest.trim_end()
    }
}

/// One line of `/proc/net/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpConnectionLine<'a> {
    raw: &'a str,
}

impl<'a> TcpConnectionLine<'a> {
    /// Wrap a raw line.
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// The line as read.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// `local_address` column (`ADDR:PORT` in hex).
    pub fn local_address(&self) -> Option<&'a str> {
        self.raw.split_whitespace().nth(1)
    }
}

/// Which memory-scan condition matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionCondition {
    /// Private RWX mapping with an anonymous name.
    RwxAnonymous,
    /// Mapping name contains an agent marker.
    AgentLibrary,
}

/// A memory-scan hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFinding {
    /// Condition that fired.
    pub condition: RegionCondition,
    /// 1-based line number in the map.
    pub line_number: usize,
    /// Offending line.
    pub line: String,
}

/// Per-probe results of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Inline hook on the inspected export.
    pub trampoline: bool,
    /// Frida server port open.
    pub server_port: bool,
    /// Suspicious memory region.
    pub memory_scan: bool,
    /// Tracer attached.
    pub debugger: bool,
    /// Frida files present.
    pub artifact_files: bool,
}

impl ProbeReport {
    /// Record one probe's result.
    pub fn set(&mut self, kind: ProbeKind, detected: bool) {
        match kind {
            ProbeKind::Trampoline => self.trampoline = detected,
            ProbeKind::ServerPort => self.server_port = detected,
            ProbeKind::MemoryScan => self.memory_scan = detected,
            ProbeKind::Debugger => self.debugger = detected,
            ProbeKind::ArtifactFiles => self.artifact_files = detected,
        }
    }

    /// Result of one probe.
    pub fn get(&self, kind: ProbeKind) -> bool {
        match kind {
            ProbeKind::Trampoline => self.trampoline,
            ProbeKind::ServerPort => self.server_port,
            ProbeKind::MemoryScan => self.memory_scan,
            ProbeKind::Debugger => self.debugger,
            ProbeKind::ArtifactFiles => self.artifact_files,
        }
    }

    /// Whether any probe fired.
    pub fn any(&self) -> bool {
        ProbeKind::ALL.iter().any(|k| self.get(*k))
    }
}

/// Reason returned by the quick check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    /// A tracer is attached.
    DebuggerAttached {
        /// Tracer's pid.
        tracer_pid: i32,
    },
    /// A Frida file exists on disk.
    ArtifactFile {
        /// The file found.
        path: String,
    },
    /// The libc prologue looks patched.
    TrampolineHook,
    /// Frida server port is open.
    ServerPort,
    /// Suspicious memory region.
    SuspiciousMemory {
        /// The region that matched.
        finding: RegionFinding,
    },
}

impl Detection {
    /// The probe that produced this detection.
    pub fn kind(&self) -> ProbeKind {
        match self {
            Self::DebuggerAttached { .. } => ProbeKind::Debugger,
            Self::ArtifactFile { .. } => ProbeKind::ArtifactFiles,
            Self::TrampolineHook => ProbeKind::Trampoline,
            Self::ServerPort => ProbeKind::ServerPort,
            Self::SuspiciousMemory { .. } => ProbeKind::MemoryScan,
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DebuggerAttached { .. } => write!(f, "Debugger Detected"),
            Self::ArtifactFile { path } => write!(f, "Frida File Detected: {path}"),
            Self::TrampolineHook => write!(f, "libc function prologue has been modified"),
            Self::ServerPort => write!(f, "TCP port 27042/27043 is open"),
            Self::SuspiciousMemory { finding } => match finding.condition {
                RegionCondition::RwxAnonymous => write!(f, "RWX anonymous memory region present"),
                RegionCondition::AgentLibrary => write!(f, "Frida gadget library is loaded"),
            },
        }
    }
}
