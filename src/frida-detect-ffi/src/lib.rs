//! # frida-detect-ffi
//!
//! C-compatible FFI and Android JNI interface for frida-detect.
//!
//! ## Usage
//!
//! ```c
//! #include "frida_detect.h"
//!
//! int main() {
//!     if (frida_detect_check_server() == 1) {
//!         // Frida server listening on 27042/27043
//!     }
//!
//!     char* reason = NULL;
//!     if (frida_detect_quick_check(&reason) == 1) {
//!         fprintf(stderr, "%s\n", reason);
//!         frida_detect_free(reason);
//!     }
//!     return 0;
//! }
//! ```
//!
//! On Android the library is loaded by
//! `com.baro.baro_baedal.modules.security.FridaNative`, which declares
//! `checkFridaTrampoline`, `checkFridaServer`, `scanSuspiciousMemory` and
//! `quickCheck` as `external` functions.

#![allow(clippy::missing_safety_doc)] // FFI functions are inherently unsafe

use std::ffi::{c_char, c_void, CString};
use std::ptr;

use frida_detect_core::ProbeSet;

/// Log tag shared by every record this library emits.
pub const LOG_TAG: &str = "FRIDA-DETECT";

/// Result codes returned by FFI functions.
#[repr(C)]
pub enum FridaDetectResult {
    /// Nothing detected (or the probe could not run).
    NotDetected = 0,
    /// Instrumentation detected.
    Detected = 1,
    /// Invalid argument.
    InvalidArgument = -1,
    /// Internal error.
    InternalError = -99,
}

impl From<bool> for FridaDetectResult {
    fn from(detected: bool) -> Self {
        if detected {
            Self::Detected
        } else {
            Self::NotDetected
        }
    }
}

/// Initialize platform logging. Safe to call repeatedly.
pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Info)
                .with_tag(LOG_TAG),
        );
    }
}

/// Inline-hook check on libc `open()`.
///
/// Returns 1 if the prologue looks patched, 0 otherwise.
#[no_mangle]
pub extern "C" fn frida_detect_check_trampoline() -> i32 {
    init_logging();
    FridaDetectResult::from(frida_detect_core::check_frida_trampoline()) as i32
}

/// Frida server port check.
///
/// Returns 1 if port 27042 or 27043 appears in `/proc/net/tcp`, 0 otherwise.
#[no_mangle]
pub extern "C" fn frida_detect_check_server() -> i32 {
    init_logging();
    FridaDetectResult::from(frida_detect_core::check_frida_server()) as i32
}

/// Suspicious memory region scan.
///
/// Returns 1 on an RWX anonymous region or a loaded Frida/gadget library.
#[no_mangle]
pub extern "C" fn frida_detect_scan_memory() -> i32 {
    init_logging();
    FridaDetectResult::from(frida_detect_core::scan_suspicious_memory()) as i32
}

/// Run all probes in order and stop at the first detection.
///
/// # Arguments
///
/// * `reason` - Output: on detection, a NUL-terminated message the caller
///   must free with `frida_detect_free`; NULL otherwise
///
/// # Returns
///
/// 1 if detected, 0 if not, negative error code on failure.
///
/// # Safety
///
/// `reason` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn frida_detect_quick_check(reason: *mut *mut c_char) -> i32 {
    if reason.is_null() {
        return FridaDetectResult::InvalidArgument as i32;
    }
    init_logging();

    *reason = ptr::null_mut();
    let Some(detection) = ProbeSet::default().quick_check() else {
        return FridaDetectResult::NotDetected as i32;
    };

    let message = match CString::new(detection.to_string()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Detection message contains NUL: {}", e);
            return FridaDetectResult::InternalError as i32;
        },
    };

    // Allocate with malloc so frida_detect_free can release it
    let bytes = message.as_bytes_with_nul();
    let out = libc::malloc(bytes.len()) as *mut c_char;
    if out.is_null() {
        return FridaDetectResult::InternalError as i32;
    }
    ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), out, bytes.len());
    *reason = out;

    FridaDetectResult::Detected as i32
}

/// Free memory allocated by frida-detect functions.
///
/// # Safety
///
/// `data` must be a pointer returned by a frida-detect function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn frida_detect_free(data: *mut c_void) {
    if !data.is_null() {
        libc::free(data);
    }
}

/// Get the library version.
///
/// Returns a static string with the version number.
#[no_mangle]
pub extern "C" fn frida_detect_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// Android JNI bindings for com.baro.baro_baedal.modules.security.FridaNative
#[cfg(target_os = "android")]
mod android {
    use jni::objects::JObject;
    use jni::sys::{jboolean, jstring, JNI_FALSE, JNI_TRUE};
    use jni::JNIEnv;

    use super::*;

    fn to_jboolean(detected: bool) -> jboolean {
        if detected {
            JNI_TRUE
        } else {
            JNI_FALSE
        }
    }

    #[no_mangle]
    pub extern "system" fn Java_com_baro_baro_1baedal_modules_security_FridaNative_checkFridaTrampoline(
        _env: JNIEnv,
        _this: JObject,
    ) -> jboolean {
        init_logging();
        to_jboolean(frida_detect_core::check_frida_trampoline())
    }

    #[no_mangle]
    pub extern "system" fn Java_com_baro_baro_1baedal_modules_security_FridaNative_checkFridaServer(
        _env: JNIEnv,
        _this: JObject,
    ) -> jboolean {
        init_logging();
        to_jboolean(frida_detect_core::check_frida_server())
    }

    #[no_mangle]
    pub extern "system" fn Java_com_baro_baro_1baedal_modules_security_FridaNative_scanSuspiciousMemory(
        _env: JNIEnv,
        _this: JObject,
    ) -> jboolean {
        init_logging();
        to_jboolean(frida_detect_core::scan_suspicious_memory())
    }

    /// Returns the detection message, or null when nothing was found.
    #[no_mangle]
    pub extern "system" fn Java_com_baro_baro_1baedal_modules_security_FridaNative_quickCheck(
        env: JNIEnv,
        _this: JObject,
    ) -> jstring {
        init_logging();
        let Some(detection) = ProbeSet::default().quick_check() else {
            return ptr::null_mut();
        };
        match env.new_string(detection.to_string()) {
            Ok(s) => s.into_raw(),
            Err(e) => {
                tracing::error!("Failed to create Java string: {}", e);
                ptr::null_mut()
            },
        }
    }
}
