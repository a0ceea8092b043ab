//! Records operations bound to a single collection.
//!
//! # Design
//! `Collection` is a borrowed `(base_url, name)` pair and is `Copy`. Each
//! operation comes in three forms:
//! - `build_*` produces an `HttpRequest` without touching the network,
//! - `parse_*` inspects an `HttpResponse` the caller obtained,
//! - the plain method (`get_list`, `get_one`, `create`) runs build, link
//!   check, `Transport::send` and parse in one blocking call.
//!
//! Hosts that own their I/O use the first two; everyone else uses the third.
//! Failures are logged where they are detected and returned as `ApiError`.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::query::{encode_segment, Query};
use crate::types::{CreateParams, ListParams, RecordParams};

const NOT_FOUND_MESSAGE: &str = "The requested resource wasn't found.";
const FORBIDDEN_MESSAGE: &str = "Only admins can access this action.";

/// A handle on one PocketBase collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection<'a> {
    base_url: &'a str,
    name: &'a str,
}

impl<'a> Collection<'a> {
    pub fn new(base_url: &'a str, name: &'a str) -> Self {
        Self { base_url, name }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// `{base}/api/collections/{name}/records`
    pub fn records_url(&self) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.base_url,
            encode_segment(self.name)
        )
    }

    // -----------------------------------------------------------------------
    // Blocking operations
    // -----------------------------------------------------------------------

    /// Fetch one page of records and return the raw response body.
    ///
    /// Any HTTP status is treated as a response: a 400 for a bad filter comes
    /// back as `Ok` with PocketBase's error JSON in it.
    pub fn get_list<T: Transport + ?Sized>(
        &self,
        transport: &T,
        params: &ListParams,
    ) -> Result<String, ApiError> {
        let request = self.build_get_list(params)?;
        let response = self.send(transport, &request)?;
        self.parse_get_list(response)
    }

    /// Fetch a single record and return the raw response body.
    pub fn get_one<T: Transport + ?Sized>(
        &self,
        transport: &T,
        record_id: &str,
        params: &RecordParams,
    ) -> Result<String, ApiError> {
        let request = self.build_get_one(record_id, params)?;
        let response = self.send(transport, &request)?;
        self.parse_get_one(response)
    }

    /// Create a record from JSON text and return the created record's body.
    pub fn create<T: Transport + ?Sized>(
        &self,
        transport: &T,
        json_data: &str,
        params: &CreateParams,
    ) -> Result<String, ApiError> {
        let request = self.build_create(json_data, params)?;
        let response = self.send(transport, &request)?;
        self.parse_create(response)
    }

    /// Create a record from any serializable value.
    pub fn create_from<T: Transport + ?Sized, R: Serialize>(
        &self,
        transport: &T,
        record: &R,
        params: &CreateParams,
    ) -> Result<String, ApiError> {
        let json = serde_json::to_string(record).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.create(transport, &json, params)
    }

    fn send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: &HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        if !transport.is_connected() {
            warn!(collection = self.name, "network link is down, request not sent");
            return Err(ApiError::Offline);
        }
        debug!(collection = self.name, method = ?request.method, url = %request.url, "sending request");
        transport.send(request).map_err(|e| {
            warn!(collection = self.name, url = %request.url, error = %e, "transport failed");
            ApiError::Transport(e)
        })
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get_list(&self, params: &ListParams) -> Result<HttpRequest, ApiError> {
        if params.page == 0 {
            return Err(ApiError::InvalidArgument("page must be positive"));
        }
        if params.per_page == 0 {
            return Err(ApiError::InvalidArgument("perPage must be positive"));
        }

        let mut query = Query::new(self.records_url());
        query
            .push("page", &params.page.to_string())
            .push("perPage", &params.per_page.to_string())
            .push_opt("sort", params.sort.as_deref())
            .push_opt("filter", params.filter.as_deref())
            .push_opt("expand", params.expand.as_deref())
            .push_opt("fields", params.fields.as_deref());
        if params.skip_total {
            query.push("skipTotal", "1");
        }

        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: query.finish(),
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn build_get_one(
        &self,
        record_id: &str,
        params: &RecordParams,
    ) -> Result<HttpRequest, ApiError> {
        if record_id.is_empty() {
            return Err(ApiError::InvalidArgument("record id must not be empty"));
        }

        let url = format!("{}/{}", self.records_url(), encode_segment(record_id));
        let mut query = Query::new(url);
        query
            .push_opt("expand", params.expand.as_deref())
            .push_opt("fields", params.fields.as_deref());

        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: query.finish(),
            headers: Vec::new(),
            body: None,
        })
    }

    /// The id, when given, is written into the JSON body as `"id"`.
    pub fn build_create(
        &self,
        json_data: &str,
        params: &CreateParams,
    ) -> Result<HttpRequest, ApiError> {
        let mut record: Value =
            serde_json::from_str(json_data).map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
        let Some(fields) = record.as_object_mut() else {
            return Err(ApiError::InvalidPayload("expected a JSON object".to_string()));
        };

        let body = match &params.id {
            Some(id) => {
                fields.insert("id".to_string(), Value::String(id.clone()));
                serde_json::to_string(&record).map_err(|e| ApiError::Serialization(e.to_string()))?
            }
            None => json_data.to_string(),
        };

        let mut query = Query::new(self.records_url());
        query
            .push_opt("expand", params.expand.as_deref())
            .push_opt("fields", params.fields.as_deref());

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: query.finish(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_get_list(&self, response: HttpResponse) -> Result<String, ApiError> {
        debug!(collection = self.name, status = response.status, "list response");
        Ok(response.body)
    }

    /// Only `"code": 404` and `"code": 403` are failures. Any other body,
    /// including other PocketBase error codes such as 400, is returned as-is.
    pub fn parse_get_one(&self, response: HttpResponse) -> Result<String, ApiError> {
        debug!(collection = self.name, status = response.status, "record response");
        let doc: Value = serde_json::from_str(&response.body).map_err(|e| {
            warn!(collection = self.name, error = %e, "record response is not JSON");
            ApiError::MalformedResponse(e.to_string())
        })?;

        match doc.get("code").and_then(Value::as_i64) {
            Some(404) => {
                let message = error_message(&doc, NOT_FOUND_MESSAGE);
                warn!(collection = self.name, %message, "record not found");
                Err(ApiError::NotFound { message })
            }
            Some(403) => {
                let message = error_message(&doc, FORBIDDEN_MESSAGE);
                warn!(collection = self.name, %message, "record access forbidden");
                Err(ApiError::Forbidden { message })
            }
            _ => Ok(response.body),
        }
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<String, ApiError> {
        if !response.is_success() {
            warn!(collection = self.name, status = response.status, "failed to create record");
            return Err(ApiError::CreateFailed {
                status: response.status,
                body: response.body,
            });
        }
        debug!(collection = self.name, status = response.status, "record created");
        Ok(response.body)
    }
}

fn error_message(doc: &Value, fallback: &str) -> String {
    doc.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
