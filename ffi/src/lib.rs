//! C-ABI wrapper around `pocketbase-core`.
//!
//! # Overview
//! Lets a C or C++ sketch build PocketBase records requests and interpret the
//! responses while keeping its own HTTP stack and network link handling.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `pb_build_*` / `pb_parse_*` mirror the core `Collection` API 1:1.
//! - Every parse returns an `FfiPbResult` whose `body` is the empty string on
//!   failure, so callers that only test for `""` keep working, while
//!   `error_code` says what went wrong.
//! - The C caller owns all returned pointers and must call the matching
//!   `pb_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use pocketbase_core::{ApiError, CreateParams, ListParams, RecordParams};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to `base_url`, stored verbatim.
///
/// Returns null if `base_url` is null or not UTF-8.
/// The caller must free the returned pointer with `pb_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pb_client_new(base_url: *const c_char) -> *mut FfiPbClient {
    catch_unwind(|| match req_string(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiPbClient {
            inner: pocketbase_core::PocketbaseClient::new(&url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `pb_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_client_free(client: *mut FfiPbClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request listing records of `collection`.
///
/// `sort`, `filter`, `expand` and `fields` may be null (omitted).
/// Returns null if `client` or `collection` is null, if any string argument
/// is not UTF-8, or if `page` or `per_page` is zero. Free the result with
/// `pb_free_request`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn pb_build_get_list(
    client: *const FfiPbClient,
    collection: *const c_char,
    page: u32,
    per_page: u32,
    sort: *const c_char,
    filter: *const c_char,
    expand: *const c_char,
    fields: *const c_char,
    skip_total: bool,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let params = ListParams {
            page,
            per_page,
            sort: opt_string(sort).ok()?,
            filter: opt_string(filter).ok()?,
            expand: opt_string(expand).ok()?,
            fields: opt_string(fields).ok()?,
            skip_total,
        };
        let client = client_ref(client)?;
        client.inner.collection(&req_string(collection)?).build_get_list(&params).ok()
    })
    .ok()
    .flatten()
    .map_or(std::ptr::null_mut(), FfiHttpRequest::from_core)
}

/// Build the request fetching one record.
///
/// `expand` and `fields` may be null. Returns null if `client`,
/// `collection` or `record_id` is null, if any string argument is not UTF-8,
/// or if `record_id` is empty.
#[unsafe(no_mangle)]
pub extern "C" fn pb_build_get_one(
    client: *const FfiPbClient,
    collection: *const c_char,
    record_id: *const c_char,
    expand: *const c_char,
    fields: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let params = RecordParams {
            expand: opt_string(expand).ok()?,
            fields: opt_string(fields).ok()?,
        };
        let client = client_ref(client)?;
        client
            .inner
            .collection(&req_string(collection)?)
            .build_get_one(&req_string(record_id)?, &params)
            .ok()
    })
    .ok()
    .flatten()
    .map_or(std::ptr::null_mut(), FfiHttpRequest::from_core)
}

/// Build the request creating a record from `json_data`.
///
/// `id`, `expand` and `fields` may be null. Returns null if `client`,
/// `collection` or `json_data` is null, if any string argument is not UTF-8,
/// or if `json_data` is not a JSON object.
#[unsafe(no_mangle)]
pub extern "C" fn pb_build_create(
    client: *const FfiPbClient,
    collection: *const c_char,
    json_data: *const c_char,
    id: *const c_char,
    expand: *const c_char,
    fields: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let params = CreateParams {
            id: opt_string(id).ok()?,
            expand: opt_string(expand).ok()?,
            fields: opt_string(fields).ok()?,
        };
        let client = client_ref(client)?;
        client
            .inner
            .collection(&req_string(collection)?)
            .build_create(&req_string(json_data)?, &params)
            .ok()
    })
    .ok()
    .flatten()
    .map_or(std::ptr::null_mut(), FfiHttpRequest::from_core)
}

fn client_ref<'a>(client: *const FfiPbClient) -> Option<&'a FfiPbClient> {
    unsafe { client.as_ref() }
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Which `Collection::parse_*` a `pb_parse_*` entry point forwards to.
#[derive(Clone, Copy)]
enum Operation {
    GetList,
    GetOne,
    Create,
}

fn parse(
    op: Operation,
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiPbResult {
    let Some(client) = client_ref(client) else {
        return FfiPbResult::null_arg("client");
    };
    let name = match opt_string(collection) {
        Ok(Some(name)) => name,
        Ok(None) => return FfiPbResult::null_arg("collection"),
        Err(_) => return FfiPbResult::from_core(Err(ApiError::InvalidArgument("collection is not UTF-8"))),
    };
    let Some(response) = (unsafe { response.as_ref() }) else {
        return FfiPbResult::null_arg("response");
    };
    let collection = client.inner.collection(&name);

    let result = response.to_core().and_then(|resp| match op {
        Operation::GetList => collection.parse_get_list(resp),
        Operation::GetOne => collection.parse_get_one(resp),
        Operation::Create => collection.parse_create(resp),
    });
    FfiPbResult::from_core(result)
}

/// Interpret the response to a `pb_build_get_list` request.
///
/// Any HTTP status yields `Ok` with the raw body; only transport errors
/// (`status <= 0`) fail.
#[unsafe(no_mangle)]
pub extern "C" fn pb_parse_get_list(
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiPbResult {
    catch_unwind(|| parse(Operation::GetList, client, collection, response))
        .unwrap_or_else(|_| FfiPbResult::panic("panic in pb_parse_get_list"))
}

/// Interpret the response to a `pb_build_get_one` request.
///
/// Bodies carrying `"code": 404` or `"code": 403` fail with `NotFound` /
/// `Forbidden`; non-JSON bodies fail with `MalformedResponse`.
#[unsafe(no_mangle)]
pub extern "C" fn pb_parse_get_one(
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiPbResult {
    catch_unwind(|| parse(Operation::GetOne, client, collection, response))
        .unwrap_or_else(|_| FfiPbResult::panic("panic in pb_parse_get_one"))
}

/// Interpret the response to a `pb_build_create` request.
///
/// Non-2xx statuses fail with `CreateFailed`.
#[unsafe(no_mangle)]
pub extern "C" fn pb_parse_create(
    client: *const FfiPbClient,
    collection: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiPbResult {
    catch_unwind(|| parse(Operation::Create, client, collection, response))
        .unwrap_or_else(|_| FfiPbResult::panic("panic in pb_parse_create"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `pb_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiPbResult` returned by any `pb_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_free_result(result: *mut FfiPbResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.body);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pb_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
