//! C-ABI wrapper around `curlrelay-core`.
//!
//! # Overview
//! Exposes command parsing and strategy dispatch through `extern "C"`
//! functions so a UI written in any language with a C FFI can turn pasted
//! curl text into a request and execute it.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `curlrelay_parse` never fails for non-null input; an empty `url` on the
//!   result is the caller's signal that nothing usable was found.
//! - `curlrelay_execute` blocks for one network round trip and reads its
//!   endpoints from the `CURLRELAY_*` environment on every call.
//! - The C caller owns all returned pointers and must call the matching
//!   `curlrelay_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use curlrelay_core::{DispatchConfig, Dispatcher};

use types::*;

/// Parse curl-style command text.
///
/// Returns null if `raw` is null or an internal panic occurs.
/// The caller must free the returned pointer with `curlrelay_free_descriptor`.
#[unsafe(no_mangle)]
pub extern "C" fn curlrelay_parse(raw: *const c_char) -> *mut FfiRequestDescriptor {
    catch_unwind(|| {
        let Some(text) = (unsafe { from_c_string(raw) }) else {
            return std::ptr::null_mut();
        };
        FfiRequestDescriptor::from_core(curlrelay_core::parse(&text))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Execute a descriptor with the strategy identified by `strategy`
/// (see `FfiStrategy` for codes).
///
/// Blocks until the single round trip completes. HTTP error statuses are
/// reported with `error_code = Ok` and `ok = false`.
/// The caller must free the returned pointer with `curlrelay_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn curlrelay_execute(
    descriptor: *const FfiRequestDescriptor,
    strategy: u32,
) -> *mut FfiOutcomeResult {
    catch_unwind(|| {
        if descriptor.is_null() {
            return FfiOutcomeResult::null_arg("descriptor");
        }
        let Some(strategy) = FfiStrategy::from_raw(strategy) else {
            return FfiOutcomeResult::unknown_strategy(strategy);
        };
        let config = match DispatchConfig::from_env() {
            Ok(config) => config,
            Err(e) => return FfiOutcomeResult::from_config_error(e),
        };

        let request = unsafe { (*descriptor).to_core() };
        match Dispatcher::new(config).execute(&request, strategy) {
            Ok(outcome) => FfiOutcomeResult::from_outcome(outcome),
            Err(e) => FfiOutcomeResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiOutcomeResult::panic("panic in curlrelay_execute"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiRequestDescriptor` returned by `curlrelay_parse`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn curlrelay_free_descriptor(descriptor: *mut FfiRequestDescriptor) {
    if descriptor.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let d = unsafe { Box::from_raw(descriptor) };
        free_c_string(d.method);
        free_c_string(d.url);
        free_c_string(d.body);
        if !d.headers.is_null() && d.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(d.headers, d.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiOutcomeResult` returned by `curlrelay_execute`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn curlrelay_free_result(result: *mut FfiOutcomeResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let r = unsafe { Box::from_raw(result) };
        free_c_string(r.error_message);
        free_c_string(r.body);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn curlrelay_free_string(s: *mut c_char) {
    free_c_string(s);
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, CString};

    use super::*;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn read(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    fn start_server() -> String {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                relay_server::run(listener).await
            })
            .unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn parse_scenario_exposes_all_fields() {
        let raw = c(r#"curl -X PUT -H "Content-Type: application/json" -d '{"a":1}' https://api.test/items/5"#);
        let d = curlrelay_parse(raw.as_ptr());
        assert!(!d.is_null());

        let r = unsafe { &*d };
        assert_eq!(read(r.method), "PUT");
        assert_eq!(read(r.url), "https://api.test/items/5");
        assert_eq!(read(r.body), r#"{"a":1}"#);
        assert_eq!(r.headers_len, 1);
        let headers = unsafe { std::slice::from_raw_parts(r.headers, r.headers_len as usize) };
        assert_eq!(read(headers[0].key), "Content-Type");
        assert_eq!(read(headers[0].value), "application/json");

        curlrelay_free_descriptor(d);
    }

    #[test]
    fn parse_without_url_gives_empty_string() {
        let raw = c("curl -v");
        let d = curlrelay_parse(raw.as_ptr());
        let r = unsafe { &*d };
        assert_eq!(read(r.url), "");
        assert!(r.body.is_null());
        assert!(r.headers.is_null());
        assert_eq!(r.headers_len, 0);
        curlrelay_free_descriptor(d);
    }

    #[test]
    fn parse_null_returns_null() {
        assert!(curlrelay_parse(std::ptr::null()).is_null());
    }

    #[test]
    fn descriptor_survives_c_round_trip() {
        let raw = c("curl -u user:pass -b 'a=1' -d x https://api.test");
        let d = curlrelay_parse(raw.as_ptr());
        let back = unsafe { (*d).to_core() };
        assert_eq!(back, curlrelay_core::parse("curl -u user:pass -b 'a=1' -d x https://api.test"));
        curlrelay_free_descriptor(d);
    }

    #[test]
    fn execute_null_descriptor_is_null_arg() {
        let result = curlrelay_execute(std::ptr::null(), 0);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(read(r.error_message), "null argument: descriptor");
        curlrelay_free_result(result);
    }

    #[test]
    fn execute_unknown_strategy_is_rejected() {
        let raw = c("curl https://api.test");
        let d = curlrelay_parse(raw.as_ptr());
        let result = curlrelay_execute(d, 42);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::UnknownStrategy);
        assert!(r.body.is_null());
        curlrelay_free_result(result);
        curlrelay_free_descriptor(d);
    }

    #[test]
    fn execute_direct_against_live_server() {
        let base = start_server();
        let raw = c(&format!("curl -X POST -H 'X-A: 1' -d hi {base}/echo"));
        let d = curlrelay_parse(raw.as_ptr());

        let result = curlrelay_execute(d, FfiStrategy::Direct as u32);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.status, 200);
        assert!(r.ok);
        let body = read(r.body);
        assert!(body.contains(r#""method":"POST""#), "{body}");
        assert!(body.contains(r#""body":"hi""#), "{body}");

        curlrelay_free_result(result);
        curlrelay_free_descriptor(d);
    }

    #[test]
    fn execute_reports_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);

        let raw = c(&format!("curl http://{dead}/"));
        let d = curlrelay_parse(raw.as_ptr());
        let result = curlrelay_execute(d, FfiStrategy::Direct as u32);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Network);
        assert!(!r.ok);
        assert_eq!(r.status, 0);
        assert!(!read(r.error_message).is_empty());

        curlrelay_free_result(result);
        curlrelay_free_descriptor(d);
    }

    #[test]
    fn free_functions_accept_null() {
        curlrelay_free_descriptor(std::ptr::null_mut());
        curlrelay_free_result(std::ptr::null_mut());
        curlrelay_free_string(std::ptr::null_mut());
    }
}
