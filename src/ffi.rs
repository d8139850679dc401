//! FFI interface for host-side interop
//!
//! A host that renders the feed (a browser shell, a headless driver) hands
//! over the serialized HTML and gets the scrape result back as JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Serialize;

use crate::config::ScraperConfig;
use crate::count::parse_count;
use crate::scrape::scrape_document_with;

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_scrape_result
#[repr(C)]
pub struct ScrapeResultFFI {
    /// JSON-serialized ScrapeResult (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Scrape posts out of a rendered feed page.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `page_url` - URL the page was rendered from (null-terminated), or null
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `page_url` must be null or a valid null-terminated C string
/// - Caller must free the result via `free_scrape_result`
#[no_mangle]
pub unsafe extern "C" fn scrape_html_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    page_url: *const c_char,
) -> ScrapeResultFFI {
    scrape_html_with_config_ffi(html_ptr, html_len, page_url, ptr::null())
}

/// Same as `scrape_html_ffi`, with the strategy table taken from a TOML
/// configuration. A null `config_toml` uses the defaults.
///
/// # Safety
/// Same as `scrape_html_ffi`; `config_toml` must be null or a valid
/// null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn scrape_html_with_config_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    page_url: *const c_char,
    config_toml: *const c_char,
) -> ScrapeResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let page_url = if page_url.is_null() {
        ""
    } else {
        match CStr::from_ptr(page_url).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in page URL"),
        }
    };

    let config = if config_toml.is_null() {
        ScraperConfig::default()
    } else {
        let text = match CStr::from_ptr(config_toml).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in config"),
        };
        match ScraperConfig::from_toml_str(text) {
            Ok(c) => c,
            Err(e) => return make_error_result(&e.to_string()),
        }
    };

    let result = scrape_document_with(&config.cascade(), html, page_url);
    make_json_result(&result)
}

/// Free a ScrapeResultFFI returned by one of the scrape functions
///
/// # Safety
/// - `result` must have been returned by `scrape_html_ffi` or
///   `scrape_html_with_config_ffi`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_scrape_result(result: ScrapeResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

/// Parse a count label such as "1.2K upvotes". Null or unparseable gives 0.
///
/// # Safety
/// `label` must be null or a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn parse_count_ffi(label: *const c_char) -> u64 {
    if label.is_null() {
        return 0;
    }
    match CStr::from_ptr(label).to_str() {
        Ok(s) => parse_count(s),
        Err(_) => 0,
    }
}

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

fn make_json_result<T: Serialize>(value: &T) -> ScrapeResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ScrapeResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_error_result(msg: &str) -> ScrapeResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ScrapeResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
