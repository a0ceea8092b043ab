//! In-memory stand-in for the PocketBase records API.
//!
//! Serves list/view/create under `/api/collections/{collection}/records` with
//! PocketBase's query parameters and error envelope. Filtering understands
//! `field = value` and `field != value` clauses joined by `&&`; `expand` is
//! accepted and ignored since the mock has no relations.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub type Record = Map<String, Value>;

const DEFAULT_PER_PAGE: u32 = 30;
const MAX_PER_PAGE: u32 = 1000;
const ID_LEN: usize = 15;

/// Who may touch a collection's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    SuperuserOnly,
}

#[derive(Debug)]
struct CollectionState {
    access: Access,
    records: Vec<Record>,
}

type Db = Arc<RwLock<HashMap<String, CollectionState>>>;

/// Router seeded with a public `posts` and a superuser-only `secrets`
/// collection, both empty.
pub fn app() -> Router {
    app_with(&[("posts", Access::Public), ("secrets", Access::SuperuserOnly)])
}

pub fn app_with(collections: &[(&str, Access)]) -> Router {
    let db: Db = Arc::new(RwLock::new(
        collections
            .iter()
            .map(|(name, access)| {
                let state = CollectionState {
                    access: *access,
                    records: Vec::new(),
                };
                (name.to_string(), state)
            })
            .collect(),
    ));
    Router::new()
        .route(
            "/api/collections/{collection}/records",
            get(list_records).post(create_record),
        )
        .route("/api/collections/{collection}/records/{id}", get(view_record))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// PocketBase's `{"code", "message", "data"}` error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    data: Value,
}

impl ApiError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            data: json!({}),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "The requested resource wasn't found.")
    }

    fn missing_collection() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Missing collection context.")
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Only superusers can perform this action.")
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn invalid_field(field: &str, code: &str, message: &str) -> Self {
        Self {
            data: json!({ field: { "code": code, "message": message } }),
            ..Self::bad_request("Failed to create record.")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.status.as_u16(),
            "message": self.message,
            "data": self.data,
        });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
    pub skip_total: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub expand: Option<String>,
    pub fields: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub page: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<Record>,
}

async fn list_records(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let db = db.read().await;
    let state = readable(&db, &collection)?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    if let Some(expand) = &query.expand {
        debug!(%collection, %expand, "ignoring expand");
    }

    let clauses = match query.filter.as_deref() {
        Some(filter) => parse_filter(filter).ok_or_else(|| {
            ApiError::bad_request(
                "Something went wrong while processing your request. Invalid filter parameters.",
            )
        })?,
        None => Vec::new(),
    };
    let mut matching: Vec<&Record> = state
        .records
        .iter()
        .filter(|record| clauses.iter().all(|c| c.matches(record)))
        .collect();
    if let Some(sort) = query.sort.as_deref() {
        sort_records(&mut matching, sort);
    }

    let total = matching.len();
    let skip_total = matches!(query.skip_total.as_deref(), Some("1" | "true"));
    let (total_items, total_pages) = if skip_total {
        (-1, -1)
    } else {
        (total as i64, total.div_ceil(per_page as usize) as i64)
    };
    let items = matching
        .into_iter()
        .skip((page as usize - 1) * per_page as usize)
        .take(per_page as usize)
        .map(|record| project(record, query.fields.as_deref()))
        .collect();

    debug!(%collection, page, per_page, total, "listed records");
    Ok(Json(ListResponse {
        page,
        per_page,
        total_items,
        total_pages,
        items,
    }))
}

async fn view_record(
    State(db): State<Db>,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<Record>, ApiError> {
    let db = db.read().await;
    let state = readable(&db, &collection)?;
    if let Some(expand) = &query.expand {
        debug!(%collection, %expand, "ignoring expand");
    }
    state
        .records
        .iter()
        .find(|record| record.get("id").and_then(Value::as_str) == Some(id.as_str()))
        .map(|record| Json(project(record, query.fields.as_deref())))
        .ok_or_else(ApiError::not_found)
}

async fn create_record(
    State(db): State<Db>,
    Path(collection): Path<String>,
    Query(query): Query<RecordQuery>,
    body: Bytes,
) -> Result<Json<Record>, ApiError> {
    let mut record = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(record)) => record,
        _ => {
            return Err(ApiError::bad_request(
                "Failed to load the submitted data due to invalid formatting.",
            ))
        }
    };

    let mut db = db.write().await;
    let state = db.get_mut(&collection).ok_or_else(ApiError::missing_collection)?;
    if state.access == Access::SuperuserOnly {
        return Err(ApiError::forbidden());
    }

    let id = match record.remove("id") {
        Some(Value::String(id)) if is_valid_id(&id) => id,
        Some(_) => {
            return Err(ApiError::invalid_field(
                "id",
                "validation_invalid_format",
                "Invalid value format.",
            ))
        }
        None => generate_id(),
    };
    let taken = state
        .records
        .iter()
        .any(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()));
    if taken {
        return Err(ApiError::invalid_field(
            "id",
            "validation_not_unique",
            "Value must be unique.",
        ));
    }

    record.insert("id".to_string(), Value::String(id.clone()));
    record.insert("collectionName".to_string(), Value::String(collection.clone()));
    state.records.push(record.clone());
    info!(%collection, %id, "created record");

    Ok(Json(project(&record, query.fields.as_deref())))
}

fn readable<'a>(
    db: &'a HashMap<String, CollectionState>,
    collection: &str,
) -> Result<&'a CollectionState, ApiError> {
    let state = db.get(collection).ok_or_else(ApiError::missing_collection)?;
    if state.access == Access::SuperuserOnly {
        return Err(ApiError::forbidden());
    }
    Ok(state)
}

// ---------------------------------------------------------------------------
// Query helpers
// ---------------------------------------------------------------------------

fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()[..ID_LEN].to_string()
}

/// Keep only the comma-separated `fields`; `*` or no list keeps everything.
fn project(record: &Record, fields: Option<&str>) -> Record {
    let Some(fields) = fields else {
        return record.clone();
    };
    let names: Vec<&str> = fields.split(',').map(str::trim).collect();
    if names.contains(&"*") {
        return record.clone();
    }
    record
        .iter()
        .filter(|(key, _)| names.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[derive(Debug, PartialEq)]
struct Clause {
    field: String,
    negate: bool,
    value: Value,
}

impl Clause {
    fn matches(&self, record: &Record) -> bool {
        let equal = record.get(&self.field) == Some(&self.value);
        equal != self.negate
    }
}

fn parse_filter(filter: &str) -> Option<Vec<Clause>> {
    let filter = filter.trim();
    let filter = filter
        .strip_prefix('(')
        .and_then(|f| f.strip_suffix(')'))
        .unwrap_or(filter);
    filter.split("&&").map(parse_clause).collect()
}

fn parse_clause(clause: &str) -> Option<Clause> {
    let clause = clause.trim();
    let (field, negate, literal) = if let Some((field, literal)) = clause.split_once("!=") {
        (field, true, literal)
    } else {
        let (field, literal) = clause.split_once('=')?;
        (field, false, literal)
    };

    let field = field.trim();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.') {
        return None;
    }
    let literal = literal.trim();
    let value = match literal
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .or_else(|| literal.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
    {
        Some(text) => Value::String(text.to_string()),
        None => serde_json::from_str(literal).ok()?,
    };

    Some(Clause {
        field: field.to_string(),
        negate,
        value,
    })
}

/// Comma-separated keys; a leading `-` sorts that key descending.
fn sort_records(records: &mut [&Record], sort: &str) {
    let keys: Vec<(&str, bool)> = sort
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| match key.strip_prefix('-') {
            Some(key) => (key, true),
            None => (key.strip_prefix('+').unwrap_or(key), false),
        })
        .collect();

    records.sort_by(|a, b| {
        keys.iter()
            .map(|(key, descending)| {
                let ordering = compare_values(a.get(*key), b.get(*key));
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
