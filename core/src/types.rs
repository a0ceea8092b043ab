//! Request parameters and response DTOs for the records API.
//!
//! # Design
//! Optional query values are `Option<String>` and are only sent when `Some`.
//! Responses stay raw strings at the operation boundary; `ListPage` is an
//! opt-in typed view for callers that want to decode a list body.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ApiError;

/// Query parameters for listing records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
    /// Skip the total-count query; `totalItems`/`totalPages` come back as -1.
    pub skip_total: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 30,
            sort: None,
            filter: None,
            expand: None,
            fields: None,
            skip_total: false,
        }
    }
}

impl ListParams {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn skip_total(mut self, skip_total: bool) -> Self {
        self.skip_total = skip_total;
        self
    }
}

/// Query parameters for fetching a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordParams {
    pub expand: Option<String>,
    pub fields: Option<String>,
}

impl RecordParams {
    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// Options for creating a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateParams {
    /// Explicit record id; PocketBase generates one when absent.
    pub id: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
}

impl CreateParams {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// One page of a records listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T: DeserializeOwned> ListPage<T> {
    /// Decode a body returned by `Collection::get_list`.
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}
