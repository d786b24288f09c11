//! Error types for probe operations.
//!
//! None of these reach a probe's caller: the public probe operations collapse
//! every error into a negative result. They exist so the reasons can be logged.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while gathering probe input.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A pseudo-file could not be opened or read.
    #[error("Source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The shared library could not be loaded.
    #[error("Library unavailable: {library}: {reason}")]
    LibraryUnavailable {
        /// Library name passed to the loader.
        library: String,
        /// Loader diagnostic, if any.
        reason: String,
    },

    /// The exported symbol could not be resolved.
    #[error("Symbol unresolved: {symbol}")]
    SymbolUnresolved {
        /// Symbol name.
        symbol: String,
    },

    /// A library or symbol name contained an interior NUL byte.
    #[error("Invalid name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

impl ProbeError {
    /// Build a [`ProbeError::SourceUnavailable`] for `path`.
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the input simply does not exist here
    /// (e.g. `/proc/net/tcp` hidden by SELinux) rather than a read failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::SourceUnavailable { source, .. } => {
                matches!(
                    source.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                )
            },
            Self::LibraryUnavailable { .. } | Self::SymbolUnresolved { .. } => true,
            Self::InvalidName { .. } => false,
        }
    }
}
