//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! instead of `String`, raw pointer plus length instead of `Vec`, explicit
//! enum discriminants. Conversions live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::str::Utf8Error;

use pocketbase_core::error::{ApiError, TransportError};
use pocketbase_core::http::{HttpMethod, HttpRequest, HttpResponse};

/// Opaque handle to a `PocketbaseClient`.
pub struct FfiPbClient {
    pub(crate) inner: pocketbase_core::PocketbaseClient,
}

/// Copy an optional C string. Null is `Ok(None)`; a non-null pointer must be
/// valid UTF-8.
pub(crate) fn opt_string(ptr: *const c_char) -> Result<Option<String>, Utf8Error> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().map(|s| Some(s.to_string()))
}

/// Copy a required C string. Null and invalid UTF-8 both give `None`.
pub(crate) fn req_string(ptr: *const c_char) -> Option<String> {
    opt_string(ptr).ok().flatten()
}

/// Hand a Rust string to C. Interior NULs yield an empty string.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request for the C caller to execute.
///
/// `body` is null for GET requests.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = into_c_string(req.url);
        let body = match req.body {
            Some(b) => into_c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// The outcome of executing an `FfiHttpRequest`, filled in by the C caller.
///
/// `status` follows the Arduino `HTTPClient` convention: a positive value is
/// the HTTP status, zero or negative is a transport error code. The FFI layer
/// reads but does not free `body`; null is treated as empty and a body that
/// is not UTF-8 is a `MalformedResponse`.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: i32,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    pub(crate) fn to_core(&self) -> Result<HttpResponse, ApiError> {
        if self.status <= 0 {
            return Err(TransportError::new(format!("transport error code {}", self.status)).into());
        }
        let status = u16::try_from(self.status)
            .map_err(|_| TransportError::new(format!("invalid HTTP status {}", self.status)))?;
        let body = opt_string(self.body)
            .map_err(|e| ApiError::MalformedResponse(format!("response body is not UTF-8: {e}")))?
            .unwrap_or_default();
        Ok(HttpResponse::new(status, body))
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiPbResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Offline = 1,
    Transport = 2,
    NotFound = 3,
    Forbidden = 4,
    CreateFailed = 5,
    MalformedResponse = 6,
    InvalidArgument = 7,
    InvalidPayload = 8,
    Serialization = 9,
    Panic = 10,
    NullArg = 11,
}

/// Result envelope for every parse operation.
///
/// `body` is never null. On success it holds the response body and
/// `error_code` is `Ok`; on failure it is the empty string, `error_code`
/// names the failure, `error_message` describes it and `api_code` carries the
/// PocketBase/HTTP code when one exists (0 otherwise).
#[repr(C)]
pub struct FfiPbResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub api_code: u16,
    pub body: *mut c_char,
}

impl FfiPbResult {
    pub(crate) fn from_core(result: Result<String, ApiError>) -> *mut Self {
        match result {
            Ok(body) => Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, body),
            Err(err) => {
                let error_code = match &err {
                    ApiError::Offline => FfiErrorCode::Offline,
                    ApiError::Transport(_) => FfiErrorCode::Transport,
                    ApiError::NotFound { .. } => FfiErrorCode::NotFound,
                    ApiError::Forbidden { .. } => FfiErrorCode::Forbidden,
                    ApiError::CreateFailed { .. } => FfiErrorCode::CreateFailed,
                    ApiError::MalformedResponse(_) => FfiErrorCode::MalformedResponse,
                    ApiError::InvalidArgument(_) => FfiErrorCode::InvalidArgument,
                    ApiError::InvalidPayload(_) => FfiErrorCode::InvalidPayload,
                    ApiError::Serialization(_) => FfiErrorCode::Serialization,
                };
                let api_code = err.code().unwrap_or(0);
                Self::boxed(error_code, into_c_string(err.to_string()), api_code, String::new())
            }
        }
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = into_c_string(format!("null argument: {name}"));
        Self::boxed(FfiErrorCode::NullArg, msg, 0, String::new())
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, into_c_string(msg.to_string()), 0, String::new())
    }

    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, api_code: u16, body: String) -> *mut Self {
        Box::into_raw(Box::new(FfiPbResult {
            error_code,
            error_message,
            api_code,
            body: into_c_string(body),
        }))
    }
}
