//! Debugger and on-disk artifact checks.

use std::path::{Path, PathBuf};

use tracing::warn;

/// First of `paths` that exists.
pub fn find_artifact(paths: &[PathBuf]) -> Option<&Path> {
    let found = paths.iter().map(PathBuf::as_path).find(|p| p.exists())?;
    warn!("Frida file found: {}", found.display());
    Some(found)
}

/// Whether a `TracerPid` value means a tracer is attached.
pub fn is_traced(tracer_pid: i32) -> bool {
    tracer_pid != 0
}
