//! C ABI for the browser host. Only built for wasm32, where pointers are
//! 32 bits wide.
//!
//! Inputs are UTF-8 buffers the host writes into memory obtained from
//! [`alloc`]. A call returns a pointer to its output, whose length is then
//! available from [`last_len`]; on failure it returns 0 and the error is
//! available through `last_err_*`. The host frees both buffers with
//! [`dealloc`].
//!
//! Error codes: 1 empty input, 2 invalid UTF-8, 3 invalid JSON request.

use crate::json::{apply_request, remove_request, transform_request};
use crate::styler::extract_title;

static mut LAST_LEN: u32 = 0;
static mut LAST_ERR_PTR: u32 = 0;
static mut LAST_ERR_LEN: u32 = 0;
static mut LAST_ERR_CODE: u32 = 0;

const ERR_EMPTY: u32 = 1;
const ERR_UTF8: u32 = 2;
const ERR_JSON: u32 = 3;

#[no_mangle]
pub extern "C" fn styler_api_version() -> u32 {
    1
}

#[no_mangle]
pub extern "C" fn last_len() -> u32 {
    unsafe { LAST_LEN }
}

#[no_mangle]
pub extern "C" fn last_err_ptr() -> u32 {
    unsafe { LAST_ERR_PTR }
}

#[no_mangle]
pub extern "C" fn last_err_len() -> u32 {
    unsafe { LAST_ERR_LEN }
}

#[no_mangle]
pub extern "C" fn last_err_code() -> u32 {
    unsafe { LAST_ERR_CODE }
}

#[no_mangle]
pub extern "C" fn clear_last_error() {
    unsafe {
        LAST_ERR_PTR = 0;
        LAST_ERR_LEN = 0;
        LAST_ERR_CODE = 0;
    }
}

#[no_mangle]
pub extern "C" fn alloc(size: u32) -> u32 {
    let mut buf = Vec::<u8>::with_capacity(size as usize);
    let ptr = buf.as_mut_ptr() as u32;
    std::mem::forget(buf);
    ptr
}

#[no_mangle]
pub extern "C" fn dealloc(ptr: u32, size: u32) {
    if ptr == 0 || size == 0 {
        return;
    }
    unsafe {
        let _ = Vec::<u8>::from_raw_parts(ptr as *mut u8, size as usize, size as usize);
    }
}

fn set_error(code: u32, message: &str) -> u32 {
    unsafe {
        LAST_ERR_CODE = code;
        LAST_LEN = 0;
        let mut out = message.as_bytes().to_vec();
        LAST_ERR_LEN = out.len() as u32;
        LAST_ERR_PTR = out.as_mut_ptr() as u32;
        std::mem::forget(out);
    }
    0
}

fn read_utf8(ptr: u32, len: u32) -> Result<&'static str, (u32, String)> {
    if ptr == 0 || len == 0 {
        return Err((ERR_EMPTY, "empty input".to_string()));
    }
    let bytes = unsafe { std::slice::from_raw_parts(ptr as *const u8, len as usize) };
    std::str::from_utf8(bytes).map_err(|_| (ERR_UTF8, "input is not valid UTF-8".to_string()))
}

fn write_out(text: &str) -> u32 {
    clear_last_error();
    let mut out = text.as_bytes().to_vec();
    unsafe {
        LAST_LEN = out.len() as u32;
    }
    let out_ptr = out.as_mut_ptr() as u32;
    std::mem::forget(out);
    out_ptr
}

fn finish(result: Result<String, (u32, String)>) -> u32 {
    match result {
        Ok(text) => write_out(&text),
        Err((code, message)) => set_error(code, &message),
    }
}

fn bad_json(e: serde_json::Error) -> (u32, String) {
    (ERR_JSON, format!("invalid request: {e}"))
}

/// Style raw article markup. Output is JSON `{styledHtml, title, toc}`.
/// `opts_ptr`/`opts_len` may be 0 for the default chrome.
#[no_mangle]
pub extern "C" fn styler_transform(ptr: u32, len: u32, opts_ptr: u32, opts_len: u32) -> u32 {
    let result = read_utf8(ptr, len).and_then(|raw| {
        let options = if opts_ptr == 0 || opts_len == 0 {
            None
        } else {
            Some(read_utf8(opts_ptr, opts_len)?)
        };
        transform_request(raw, options).map_err(bad_json)
    });
    finish(result)
}

#[no_mangle]
pub extern "C" fn styler_extract_title(ptr: u32, len: u32) -> u32 {
    finish(read_utf8(ptr, len).map(extract_title))
}

/// Request `{html, highlights}`, response `{html, unanchored}`.
#[no_mangle]
pub extern "C" fn styler_apply_highlights(ptr: u32, len: u32) -> u32 {
    finish(read_utf8(ptr, len).and_then(|req| apply_request(req).map_err(bad_json)))
}

/// Request `{html, id}`, response is the markup with that highlight removed.
#[no_mangle]
pub extern "C" fn styler_remove_highlight(ptr: u32, len: u32) -> u32 {
    finish(read_utf8(ptr, len).and_then(|req| remove_request(req).map_err(bad_json)))
}
