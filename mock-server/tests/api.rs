use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_pocketbase::{app, ListResponse, Record};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- list ---

#[tokio::test]
async fn list_records_empty() {
    let resp = app()
        .oneshot(get("/api/collections/posts/records"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: ListResponse = body_json(resp).await;
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 30);
    assert_eq!(page.total_items, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn list_unknown_collection_returns_404_envelope() {
    let resp = app()
        .oneshot(get("/api/collections/nope/records"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 404);
    assert_eq!(body["message"], "Missing collection context.");
}

#[tokio::test]
async fn list_superuser_collection_returns_403() {
    let resp = app()
        .oneshot(get("/api/collections/secrets/records"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 403);
}

#[tokio::test]
async fn list_bad_filter_returns_400() {
    let resp = app()
        .oneshot(get("/api/collections/posts/records?filter=title%20~%20%27x%27"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 400);
}

// --- view ---

#[tokio::test]
async fn view_missing_record_returns_404() {
    let resp = app()
        .oneshot(get("/api/collections/posts/records/aaaaaaaaaaaaaaa"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 404);
    assert_eq!(body["message"], "The requested resource wasn't found.");
}

// --- create ---

#[tokio::test]
async fn create_generates_id() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/collections/posts/records",
            r#"{"title":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let record: Record = body_json(resp).await;
    assert_eq!(record["title"], "hello");
    assert_eq!(record["collectionName"], "posts");
    assert_eq!(record["id"].as_str().unwrap().len(), 15);
}

#[tokio::test]
async fn create_with_fields_projects_response() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/collections/posts/records?fields=id",
            r#"{"id":"abcdefghij12345","title":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let record: Value = body_json(resp).await;
    assert_eq!(record, serde_json::json!({"id": "abcdefghij12345"}));
}

#[tokio::test]
async fn create_invalid_id_returns_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/collections/posts/records",
            r#"{"id":"Bad Id","title":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"]["id"]["code"], "validation_invalid_format");
}

#[tokio::test]
async fn create_non_object_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/collections/posts/records", "[1,2,3]"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_in_superuser_collection_returns_403() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/collections/secrets/records",
            r#"{"title":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// --- full lifecycle ---

#[tokio::test]
async fn records_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    for (id, title, views) in [
        ("aaaaaaaaaaaaaa1", "first", 10),
        ("aaaaaaaaaaaaaa2", "second", 30),
        ("aaaaaaaaaaaaaa3", "third", 20),
    ] {
        let body = serde_json::json!({"id": id, "title": title, "views": views}).to_string();
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request("POST", "/api/collections/posts/records", &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // duplicate id is rejected
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/collections/posts/records",
            r#"{"id":"aaaaaaaaaaaaaa1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"]["id"]["code"], "validation_not_unique");

    // sorted, paginated
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/collections/posts/records?page=1&perPage=2&sort=-views"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: ListResponse = body_json(resp).await;
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    let titles: Vec<&str> = page.items.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["second", "third"]);

    // filtered, projected, skipTotal
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(
            "/api/collections/posts/records?filter=title%3D%27first%27&fields=id,views&skipTotal=1",
        ))
        .await
        .unwrap();
    let page: ListResponse = body_json(resp).await;
    assert_eq!(page.total_items, -1);
    assert_eq!(page.total_pages, -1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(
        Value::Object(page.items[0].clone()),
        serde_json::json!({"id": "aaaaaaaaaaaaaa1", "views": 10})
    );

    // view one
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/collections/posts/records/aaaaaaaaaaaaaa2?fields=title"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let record: Value = body_json(resp).await;
    assert_eq!(record, serde_json::json!({"title": "second"}));
}
