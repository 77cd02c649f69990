//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use the `extern "C"` calling convention and
//! `#[no_mangle]` symbol names prefixed with `cinv_`.
//!
//! ## Memory management
//! - Buffers and strings returned through out-pointers are allocated on the
//!   Rust heap. Free them with `cinv_free_buffer` / `cinv_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Fallible functions return a `c_int`: `0` on success, otherwise
//!   `1` null argument, `2` invalid UTF-8, `3` invalid form or config JSON,
//!   `4` export failure.
//! - The message for the last failure is available from `cinv_last_error`.
//!
//! ## Thread safety
//! - The last-error slot is thread-local; functions hold no other shared state.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::export::{export_filename, export_pdf_blocking, ExportConfig};
use crate::fonts::FontManager;
use crate::form::InvoiceFormState;
use crate::raster::LayoutRasterizer;
use crate::session::InvoiceSession;
use crate::view::render_view;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Borrow `len` bytes at `data` as UTF-8, recording an error on failure.
///
/// # Safety
/// `data` must point to `len` readable bytes.
unsafe fn utf8_arg<'a>(data: *const u8, len: u32) -> Result<&'a str, c_int> {
    let bytes = slice::from_raw_parts(data, len as usize);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        2
    })
}

/// Parse the form JSON argument.
///
/// # Safety
/// Same as [`utf8_arg`].
unsafe fn form_arg(data: *const u8, len: u32) -> Result<InvoiceFormState, c_int> {
    let json = utf8_arg(data, len)?;
    InvoiceFormState::from_json(json).map_err(|e| {
        set_last_error(&format!("Invalid form JSON: {e}"));
        3
    })
}

fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Render the invoice view for a form and return it as JSON.
///
/// # Parameters
/// - `form_ptr`, `form_len`: UTF-8 form state JSON (not necessarily null-terminated)
/// - `out_json_ptr`: receives a null-terminated JSON string
///
/// # Safety
/// - `form_ptr` must point to `form_len` valid bytes.
/// - `out_json_ptr` must be a valid pointer.
/// - The caller must free `*out_json_ptr` with `cinv_free_string`.
#[no_mangle]
pub unsafe extern "C" fn cinv_render_view(
    form_ptr: *const u8,
    form_len: u32,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if form_ptr.is_null() || out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let state = match form_arg(form_ptr, form_len) {
        Ok(s) => s,
        Err(rc) => return rc,
    };

    let json = render_view(&state).to_json();
    let out = into_c_string(json);
    if out.is_null() {
        set_last_error("JSON contained null byte");
        return 3;
    }
    *out_json_ptr = out;
    0
}

/// Return the download filename for a customer name.
///
/// Returns null if `name` is null or not UTF-8. The caller must free the
/// result with `cinv_free_string`.
///
/// # Safety
/// `name`, if non-null, must be a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn cinv_export_filename(name: *const c_char) -> *mut c_char {
    if name.is_null() {
        set_last_error("Null pointer argument");
        return ptr::null_mut();
    }
    match CStr::from_ptr(name).to_str() {
        Ok(name) => into_c_string(export_filename(name)),
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8: {e}"));
            ptr::null_mut()
        }
    }
}

/// Export a form to PDF using the built-in layout rasterizer.
///
/// # Parameters
/// - `form_ptr`, `form_len`: UTF-8 form state JSON
/// - `config_json`: optional null-terminated export config JSON; `NULL` for defaults
/// - `out_buf`, `out_len`: PDF output (free with `cinv_free_buffer`)
/// - `out_filename`: optional; if non-null receives the suggested filename
///   (free with `cinv_free_string`)
///
/// # Safety
/// - `form_ptr` must point to `form_len` valid bytes.
/// - `config_json`, if non-null, must be a valid null-terminated string.
/// - `out_buf` and `out_len` must be valid pointers.
#[no_mangle]
pub unsafe extern "C" fn cinv_export_pdf(
    form_ptr: *const u8,
    form_len: u32,
    config_json: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
    out_filename: *mut *mut c_char,
) -> c_int {
    if form_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }

    let state = match form_arg(form_ptr, form_len) {
        Ok(s) => s,
        Err(rc) => return rc,
    };

    let config = if config_json.is_null() {
        ExportConfig::default()
    } else {
        let parsed = CStr::from_ptr(config_json)
            .to_str()
            .map_err(|e| e.to_string())
            .and_then(|json| ExportConfig::from_json(json).map_err(|e| e.to_string()));
        match parsed {
            Ok(c) => c,
            Err(e) => {
                set_last_error(&e);
                return 3;
            }
        }
    };

    let fonts = FontManager::discover_system_fonts();
    let mut session = InvoiceSession::new(state);
    match export_pdf_blocking(&mut session, &fonts, &LayoutRasterizer::new(&fonts), &config) {
        Ok(exported) => {
            if !out_filename.is_null() {
                *out_filename = into_c_string(exported.filename);
            }
            let len = exported.bytes.len() as u32;
            let buf = exported.bytes.into_boxed_slice();
            *out_buf = Box::into_raw(buf) as *mut u8;
            *out_len = len;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            4
        }
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `cinv_export_pdf`.
///
/// # Safety
/// `buf` must have been returned by `cinv_export_pdf` and `len` must be the
/// corresponding length.
#[no_mangle]
pub unsafe extern "C" fn cinv_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a string returned by this library.
///
/// # Safety
/// `s` must have been returned by a `cinv_*` function that documents
/// freeing with `cinv_free_string`.
#[no_mangle]
pub unsafe extern "C" fn cinv_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message on this thread, or null.
///
/// The pointer stays valid until the next failing `cinv_*` call on the same
/// thread. Do **not** free it.
#[no_mangle]
pub extern "C" fn cinv_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cs) => cs.as_ptr(),
        None => ptr::null(),
    })
}

/// Return the library version as a static null-terminated string.
#[no_mangle]
pub extern "C" fn cinv_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
