//! Inline-hook detection on a libc export.
//!
//! Frida's interceptor rewrites the first instructions of a hooked function
//! with a jump into its trampoline. We resolve the export ourselves and look
//! at the first opcode byte.

use tracing::warn;

use crate::error::ProbeError;
use crate::types::FunctionPrologueBytes;

/// Resolve `symbol` in `library` and read its first bytes.
///
/// The library handle is released before returning.
pub fn read_prologue(library: &str, symbol: &str) -> Result<FunctionPrologueBytes, ProbeError> {
    let handle = imp::LibraryHandle::open(library)?;
    let entry = handle.symbol(symbol)?;
    // SAFETY: `entry` is the address of an exported function in a library
    // that stays loaded while `handle` is alive; code pages are readable.
    let bytes = unsafe { std::ptr::read_unaligned(entry.as_ptr().cast::<[u8; 4]>()) };
    Ok(FunctionPrologueBytes(bytes))
}

/// Inspect `symbol` in `library` for a trampoline.
///
/// Errors mean the probe could not run, not that the function is clean.
pub fn inspect_export(library: &str, symbol: &str) -> Result<bool, ProbeError> {
    let prologue = read_prologue(library, symbol)?;
    if prologue.is_suspicious() {
        warn!("Inline hook suspicious at {}(): {}", symbol, prologue);
        return Ok(true);
    }
    Ok(false)
}

#[cfg(unix)]
mod imp {
    use std::ffi::{c_void, CStr, CString};
    use std::ptr::NonNull;

    use crate::error::ProbeError;

    /// Scoped `dlopen` handle, closed on drop.
    pub(super) struct LibraryHandle {
        raw: NonNull<c_void>,
    }

    impl LibraryHandle {
        pub(super) fn open(library: &str) -> Result<Self, ProbeError> {
            let c_name = to_cstring(library)?;
            // SAFETY: `c_name` is a valid NUL-terminated string.
            let raw = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_NOW) };
            match NonNull::new(raw) {
                Some(raw) => Ok(Self { raw }),
                None => Err(ProbeError::LibraryUnavailable {
                    library: library.to_string(),
                    reason: last_dl_error(),
                }),
            }
        }

        pub(super) fn symbol(&self, symbol: &str) -> Result<NonNull<c_void>, ProbeError> {
            let c_name = to_cstring(symbol)?;
            // SAFETY: `self.raw` is a live handle from `dlopen`.
            let addr = unsafe { libc::dlsym(self.raw.as_ptr(), c_name.as_ptr()) };
            NonNull::new(addr).ok_or_else(|| ProbeError::SymbolUnresolved {
                symbol: symbol.to_string(),
            })
        }
    }

    impl Drop for LibraryHandle {
        fn drop(&mut self) {
            // SAFETY: handle came from `dlopen` and is closed exactly once.
            unsafe {
                libc::dlclose(self.raw.as_ptr());
            }
        }
    }

    fn to_cstring(name: &str) -> Result<CString, ProbeError> {
        CString::new(name).map_err(|_| ProbeError::InvalidName {
            name: name.to_string(),
        })
    }

    fn last_dl_error() -> String {
        // SAFETY: dlerror returns NULL or a thread-local C string.
        unsafe {
            let msg = libc::dlerror();
            if msg.is_null() {
                String::new()
            } else {
                CStr::from_ptr(msg).to_string_lossy().into_owned()
            }
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::ffi::c_void;
    use std::ptr::NonNull;

    use crate::error::ProbeError;

    pub(super) struct LibraryHandle;

    impl LibraryHandle {
        pub(super) fn open(library: &str) -> Result<Self, ProbeError> {
            Err(ProbeError::LibraryUnavailable {
                library: library.to_string(),
                reason: "dynamic loading not supported on this platform".into(),
            })
        }

        pub(super) fn symbol(&self, symbol: &str) -> Result<NonNull<c_void>, ProbeError> {
            Err(ProbeError::SymbolUnresolved {
                symbol: symbol.to_string(),
            })
        }
    }
}
