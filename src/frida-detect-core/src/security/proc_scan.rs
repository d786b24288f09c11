//! Line scanners for `/proc` pseudo-files.
//!
//! Matching is textual on the raw line, not a column parse. That tolerates
//! kernel format drift at the cost of the odd false positive (a port pattern
//! can also match an inode or a remote address).

use std::io::BufRead;

use tracing::{debug, warn};

use crate::types::{MemoryRegionLine, RegionCondition, RegionFinding, TcpConnectionLine};

/// Permission flags of a private read/write/execute mapping.
const RWX_PRIVATE: &str = "rwxp";

/// Name fragment of an anonymous mapping (`[anon:...]`, `anon_inode:...`).
const ANON_MARKER: &str = "anon";

/// Visit each line until `f` returns `Some`.
///
/// Lines are decoded lossily. A read error ends the scan like EOF does.
fn find_line<R, T, F>(mut reader: R, mut f: F) -> Option<T>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Option<T>,
{
    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return None,
            Ok(_) => {},
            Err(e) => {
                debug!("Scan stopped after {} lines: {}", line_number, e);
                return None;
            },
        }
        line_number += 1;
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        if let Some(hit) = f(line_number, line) {
            return Some(hit);
        }
    }
}

/// Scan a TCP table for any of `port_patterns`.
///
/// Returns the first matching line.
pub fn scan_tcp_table<R: BufRead>(reader: R, port_patterns: &[String]) -> Option<String> {
    find_line(reader, |_, raw| {
        let line = TcpConnectionLine::new(raw);
        if port_patterns.iter().any(|p| line.raw().contains(p.as_str())) {
            warn!(
                local_address = line.local_address().unwrap_or(""),
                "Frida server port found in /proc/net/tcp"
            );
            Some(line.raw().to_string())
        } else {
            None
        }
    })
}

/// Decide whether a single map line is suspicious.
///
/// The RWX check runs before the marker check.
pub fn classify_region(line: &MemoryRegionLine<'_>, agent_markers: &[String]) -> Option<RegionCondition> {
    let raw = line.raw();
    if raw.contains(RWX_PRIVATE) && raw.contains(ANON_MARKER) {
        return Some(RegionCondition::RwxAnonymous);
    }
    if agent_markers.iter().any(|m| raw.contains(m.as_str())) {
        return Some(RegionCondition::AgentLibrary);
    }
    None
}

/// Scan a memory map top to bottom and return the first suspicious region.
pub fn scan_memory_maps<R: BufRead>(reader: R, agent_markers: &[String]) -> Option<RegionFinding> {
    find_line(reader, |line_number, raw| {
        let region = MemoryRegionLine::new(raw);
        let condition = classify_region(&region, agent_markers)?;
        match condition {
            RegionCondition::RwxAnonymous => {
                warn!("Suspicious RWX memory detected: {}", region.raw());
            },
            RegionCondition::AgentLibrary => {
                warn!(name = region.name(), "Frida/gadget library found");
            },
        }
        Some(RegionFinding {
            condition,
            line_number,
            line: region.raw().to_string(),
        })
    })
}

/// Read `TracerPid` from a `/proc/<pid>/status` file.
///
/// `None` if the field is missing or malformed.
pub fn tracer_pid<R: BufRead>(reader: R) -> Option<i32> {
    find_line(reader, |_, line| {
        line.strip_prefix("TracerPid:")
            .and_then(|rest| rest.trim().parse::<i32>().ok())
    })
}
