//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, a pointer plus length instead of a map,
//! and plain integer codes for enums the caller passes in. Conversion
//! functions live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use curlrelay_core::{
    ConfigError, HttpMethod, RequestDescriptor, StrategyKind, TransportError, TransportOutcome,
};

/// Strategy codes accepted by `curlrelay_execute`.
#[repr(C)]
pub enum FfiStrategy {
    Direct = 0,
    LocalRelay = 1,
    HostedRelay = 2,
    OpaqueRewrite = 3,
    PrefixRewrite = 4,
}

impl FfiStrategy {
    /// Map a raw code from C. Unknown codes yield `None` instead of an
    /// invalid enum value.
    pub(crate) fn from_raw(code: u32) -> Option<StrategyKind> {
        match code {
            0 => Some(StrategyKind::Direct),
            1 => Some(StrategyKind::LocalRelay),
            2 => Some(StrategyKind::HostedRelay),
            3 => Some(StrategyKind::OpaqueRewrite),
            4 => Some(StrategyKind::PrefixRewrite),
            _ => None,
        }
    }
}

/// Copy `s` into a heap C string owned by the caller. Interior NULs are
/// dropped.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

/// Read a nullable C string. Null becomes `None`; invalid UTF-8 is replaced.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A parsed request exposed to C.
///
/// `url` is an empty string, never null, when no URL was found. `body` is
/// null when the command carried no data flag.
#[repr(C)]
pub struct FfiRequestDescriptor {
    pub method: *mut c_char,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiRequestDescriptor {
    /// Convert a core descriptor into a heap-allocated `FfiRequestDescriptor`.
    pub(crate) fn from_core(descriptor: RequestDescriptor) -> *mut Self {
        let body = match &descriptor.body {
            Some(b) => to_c_string(b),
            None => std::ptr::null_mut(),
        };

        let mut pairs: Vec<(String, String)> = descriptor.headers.into_iter().collect();
        pairs.sort();
        let headers_len = pairs.len() as u32;
        let headers = if pairs.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = pairs
                .iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiRequestDescriptor {
            method: to_c_string(descriptor.method.as_str()),
            url: to_c_string(&descriptor.url),
            headers,
            headers_len,
            body,
        }))
    }

    /// Read the descriptor back into core form. A null method means `GET`.
    ///
    /// # Safety
    /// Every non-null pointer must be a valid C string, and `headers` must
    /// point to `headers_len` entries when non-null.
    pub(crate) unsafe fn to_core(&self) -> RequestDescriptor {
        let method = unsafe { from_c_string(self.method) }
            .map(|m| HttpMethod::parse(&m))
            .unwrap_or_default();
        let url = unsafe { from_c_string(self.url) }.unwrap_or_default();
        let body = unsafe { from_c_string(self.body) };

        let mut headers = HashMap::new();
        if !self.headers.is_null() && self.headers_len > 0 {
            let entries =
                unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) };
            for entry in entries {
                let key = unsafe { from_c_string(entry.key) };
                let value = unsafe { from_c_string(entry.value) };
                if let (Some(k), Some(v)) = (key, value) {
                    headers.insert(k, v);
                }
            }
        }

        RequestDescriptor {
            method,
            url,
            headers,
            body,
        }
    }
}

/// Error codes returned in `FfiOutcomeResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Network = 1,
    Envelope = 2,
    InvalidRequest = 3,
    UnknownStrategy = 4,
    Config = 5,
    NullArg = 6,
    Panic = 7,
}

/// Result envelope for `curlrelay_execute`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `status`,
/// `ok` and `body` carry the outcome. On failure `error_message` is the
/// human-readable text to show, `status` is 0 and `body` is null.
#[repr(C)]
pub struct FfiOutcomeResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub status: u16,
    pub ok: bool,
    pub body: *mut c_char,
}

impl FfiOutcomeResult {
    pub(crate) fn from_outcome(outcome: TransportOutcome) -> *mut Self {
        Box::into_raw(Box::new(FfiOutcomeResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            status: outcome.status(),
            ok: outcome.ok(),
            body: to_c_string(outcome.body()),
        }))
    }

    pub(crate) fn from_error(err: TransportError) -> *mut Self {
        let code = match &err {
            TransportError::Network { .. } => FfiErrorCode::Network,
            TransportError::Envelope { .. } => FfiErrorCode::Envelope,
            TransportError::InvalidRequest(_) => FfiErrorCode::InvalidRequest,
        };
        Self::failure(code, &err.to_string())
    }

    pub(crate) fn from_config_error(err: ConfigError) -> *mut Self {
        Self::failure(FfiErrorCode::Config, &err.to_string())
    }

    pub(crate) fn unknown_strategy(code: u32) -> *mut Self {
        Self::failure(
            FfiErrorCode::UnknownStrategy,
            &format!("unknown strategy code: {code}"),
        )
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }

    fn failure(code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiOutcomeResult {
            error_code: code,
            error_message: to_c_string(msg),
            status: TransportOutcome::NO_RESPONSE,
            ok: false,
            body: std::ptr::null_mut(),
        }))
    }
}
