//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, the expected request, a simulated
//! response and either the expected body or the expected error kind. Request
//! bodies are compared as parsed JSON so key order does not matter.

use pocketbase_core::{
    ApiError, CreateParams, HttpMethod, HttpResponse, ListParams, PocketbaseClient, RecordParams,
};
use serde_json::Value;

const BASE_URL: &str = "http://127.0.0.1:8090";

fn client() -> PocketbaseClient {
    PocketbaseClient::new(BASE_URL)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn opt_str(input: &Value, key: &str) -> Option<String> {
    input.get(key).and_then(Value::as_str).map(str::to_string)
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn error_kind(err: &ApiError) -> &'static str {
    match err {
        ApiError::Offline => "Offline",
        ApiError::Transport(_) => "Transport",
        ApiError::NotFound { .. } => "NotFound",
        ApiError::Forbidden { .. } => "Forbidden",
        ApiError::CreateFailed { .. } => "CreateFailed",
        ApiError::MalformedResponse(_) => "MalformedResponse",
        ApiError::InvalidArgument(_) => "InvalidArgument",
        ApiError::InvalidPayload(_) => "InvalidPayload",
        ApiError::Serialization(_) => "Serialization",
    }
}

/// Check a parse result: an expected error kind, or the body passed through.
fn check_outcome(name: &str, case: &Value, result: Result<String, ApiError>) {
    match case.get("expected_error").and_then(Value::as_str) {
        Some(expected) => {
            let err = result.unwrap_err();
            assert_eq!(error_kind(&err), expected, "{name}: error kind");
        }
        None => {
            let body = result.unwrap();
            assert_eq!(
                body,
                case["simulated_response"]["body"].as_str().unwrap(),
                "{name}: body passed through"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let raw = include_str!("../../test-vectors/list.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let defaults = ListParams::default();
        let params = ListParams {
            page: input.get("page").and_then(Value::as_u64).map_or(defaults.page, |p| p as u32),
            per_page: input
                .get("perPage")
                .and_then(Value::as_u64)
                .map_or(defaults.per_page, |p| p as u32),
            sort: opt_str(input, "sort"),
            filter: opt_str(input, "filter"),
            expand: opt_str(input, "expand"),
            fields: opt_str(input, "fields"),
            skip_total: input.get("skipTotal").and_then(Value::as_bool).unwrap_or(false),
        };
        let collection = c.collection(case["collection"].as_str().unwrap());
        let expected_req = &case["expected_request"];

        // Verify build
        let req = collection.build_get_list(&params).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        check_outcome(name, case, collection.parse_get_list(simulated(case)));
    }
}

// ---------------------------------------------------------------------------
// Get one
// ---------------------------------------------------------------------------

#[test]
fn get_one_test_vectors() {
    let raw = include_str!("../../test-vectors/get_one.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    let posts = c.collection("posts");
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let record_id = case["record_id"].as_str().unwrap();
        let params = RecordParams {
            expand: opt_str(&case["input"], "expand"),
            fields: opt_str(&case["input"], "fields"),
        };
        let expected_req = &case["expected_request"];

        // Verify build
        let req = posts.build_get_one(record_id, &params).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        check_outcome(name, case, posts.parse_get_one(simulated(case)));
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let raw = include_str!("../../test-vectors/create.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    let posts = c.collection("posts");
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let params = CreateParams {
            id: opt_str(input, "id"),
            expand: opt_str(input, "expand"),
            fields: opt_str(input, "fields"),
        };
        let expected_req = &case["expected_request"];

        // Verify build
        let req = posts
            .build_create(case["json_data"].as_str().unwrap(), &params)
            .unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        // Verify parse
        check_outcome(name, case, posts.parse_create(simulated(case)));
    }
}
