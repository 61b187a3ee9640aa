//! C-FFI layer for rfmt — used by R's `.Call` glue and other C consumers.
//!
//! No formatting logic here. All calls delegate to `rfmt-core`.
//!
//! # Memory Contract
//!
//! All functions that return `*mut c_char` allocate via `CString`.
//! The caller MUST free the returned string by calling `rfmt_free_string()`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use rfmt_core::FormatConfig;

/// Result from an rfmt FFI call.
/// If `error` is null, the call succeeded and `result` contains the output.
/// If `error` is non-null, the call failed and `error` contains the error message.
/// The caller MUST free both `result` and `error` with `rfmt_free_string()`.
#[repr(C)]
pub struct RfmtResult {
    pub result: *mut c_char,
    pub error: *mut c_char,
}

impl RfmtResult {
    fn ok(value: String) -> Self {
        let c = CString::new(value).unwrap_or_default();
        RfmtResult {
            result: c.into_raw(),
            error: std::ptr::null_mut(),
        }
    }

    fn err(msg: String) -> Self {
        let c = CString::new(msg).unwrap_or_else(|_| c"unknown error".to_owned());
        RfmtResult {
            result: std::ptr::null_mut(),
            error: c.into_raw(),
        }
    }

    fn from_json<T: serde::Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(json) => RfmtResult::ok(json),
            Err(e) => RfmtResult::err(format!("Serialization error: {}", e)),
        }
    }
}

/// Convert a C string pointer to a Rust &str.
/// Returns None if the pointer is null or not valid UTF-8.
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Format R source text with the default configuration.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `rfmt_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn rfmt_format(text: *const c_char) -> RfmtResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return RfmtResult::err("null or invalid UTF-8 input".into()),
    };

    match rfmt_core::format_source(text, &FormatConfig::default()) {
        Ok(formatted) => RfmtResult::ok(formatted),
        Err(e) => RfmtResult::err(e.to_string()),
    }
}

/// Format R source text with a configuration given as TOML (`rfmt.toml` syntax).
///
/// # Safety
/// `text` and `config_toml` must be valid null-terminated UTF-8 C strings.
/// The caller must free the returned strings with `rfmt_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn rfmt_format_with_config(
    text: *const c_char,
    config_toml: *const c_char,
) -> RfmtResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return RfmtResult::err("null or invalid UTF-8 text".into()),
    };
    let config_toml = match cstr_to_str(config_toml) {
        Some(s) => s,
        None => return RfmtResult::err("null or invalid UTF-8 config".into()),
    };

    let config = match FormatConfig::from_toml_str(config_toml) {
        Ok(c) => c,
        Err(e) => return RfmtResult::err(e.to_string()),
    };

    match rfmt_core::format_source(text, &config) {
        Ok(formatted) => RfmtResult::ok(formatted),
        Err(e) => RfmtResult::err(e.to_string()),
    }
}

/// Tokenize and classify R source; returns the token list as JSON.
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `rfmt_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn rfmt_tokens(text: *const c_char) -> RfmtResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return RfmtResult::err("null or invalid UTF-8 input".into()),
    };

    match rfmt_core::parse(text) {
        Ok(source) => RfmtResult::from_json(&source.tokens),
        Err(e) => RfmtResult::err(e.to_string()),
    }
}

/// Function definitions and packages of R source.
/// Returns JSON: { "functions": [...], "packages": [...] }
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `rfmt_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn rfmt_outline(text: *const c_char) -> RfmtResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return RfmtResult::err("null or invalid UTF-8 input".into()),
    };

    let source = match rfmt_core::parse(text) {
        Ok(source) => source,
        Err(e) => return RfmtResult::err(e.to_string()),
    };

    let packages: Vec<&str> = source.packages.iter().map(|n| n.value.as_str()).collect();
    let output = serde_json::json!({
        "functions": source.functions,
        "packages": packages,
    });
    RfmtResult::from_json(&output)
}

/// SHA-256 token fingerprint of R source (layout-insensitive).
///
/// # Safety
/// `text` must be a valid null-terminated UTF-8 C string.
/// The caller must free the returned strings with `rfmt_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn rfmt_fingerprint(text: *const c_char) -> RfmtResult {
    let text = match cstr_to_str(text) {
        Some(s) => s,
        None => return RfmtResult::err("null or invalid UTF-8 input".into()),
    };

    match rfmt_core::fingerprint(text) {
        Ok(hash) => RfmtResult::ok(hash),
        Err(e) => RfmtResult::err(e.to_string()),
    }
}

/// Free a string previously returned by an rfmt FFI function.
///
/// # Safety
/// `ptr` must be a pointer previously returned by an rfmt FFI function,
/// or null (in which case this is a no-op).
#[no_mangle]
pub unsafe extern "C" fn rfmt_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
