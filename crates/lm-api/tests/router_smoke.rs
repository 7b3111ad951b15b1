use axum::{body::Body, http::Request, http::StatusCode, Router};
use http_body_util::BodyExt;
use lm_common::store::MemoryCandidateStore;
use lm_common::{Job, Worker};
use serde_json::{json, Value};
use tower::ServiceExt;

fn seeded_app() -> Router {
    let workers = vec![
        Worker {
            id: "1".into(),
            name: Some("Ramesh".into()),
            skills: vec!["Plumbing".into()],
            wage_expectation: Some(500.0),
            location: Some("Indore, MP".into()),
            rating: Some(4.2),
            ..Worker::default()
        },
        Worker {
            id: "2".into(),
            name: Some("Suresh".into()),
            skills: vec!["Electrical".into()],
            wage_expectation: Some(800.0),
            location: Some("Bhopal, MP".into()),
            ..Worker::default()
        },
    ];
    let jobs = vec![Job {
        id: "job-1".into(),
        title: Some("Fix kitchen pipes".into()),
        skill: Some("Plumbing".into()),
        wage: Some(600.0),
        location: Some("Indore".into()),
        urgent: true,
        ..Job::default()
    }];

    lm_api::create_router(lm_api::test_state(MemoryCandidateStore::new(workers, jobs)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = seeded_app();

    let livez = app
        .clone()
        .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(livez.status(), StatusCode::OK);
    assert!(livez.headers().contains_key("x-request-id"));

    let readyz = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(readyz.status(), StatusCode::OK);
}

#[tokio::test]
async fn worker_search_ranks_matching_skill_first() {
    let response = seeded_app()
        .oneshot(post_json(
            "/api/workers/search",
            json!({ "query": { "skills_required": "Plumbing", "wage_offered": 600 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["path"], "fallback");
    assert_eq!(body["results"][0]["candidate"]["id"], "1");
    assert_eq!(body["results"][0]["candidate"]["kind"], "worker");
    assert_eq!(body["results"][0]["skill_match"], true);
    assert_eq!(body["results"][1]["candidate"]["id"], "2");
    assert!(body["search_id"].as_str().is_some_and(|id| id.len() == 26));
}

#[tokio::test]
async fn worker_search_applies_string_filters() {
    let response = seeded_app()
        .oneshot(post_json(
            "/api/workers/search",
            json!({
                "query": { "skills_required": "Plumbing" },
                "filters": { "min_wage": "700", "min_rating": "not-a-number" }
            }),
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["candidate"]["id"], "2");
}

#[tokio::test]
async fn job_search_scores_against_worker_profile() {
    let response = seeded_app()
        .oneshot(post_json(
            "/api/jobs/search",
            json!({ "query": { "skills": ["plumbing"], "wage_expectation": 550 }, "limit": 5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let first = &body["results"][0];
    assert_eq!(first["candidate"]["id"], "job-1");
    assert_eq!(first["score"], 80.0);
    assert_eq!(first["distance_match"], false);
}

#[tokio::test]
async fn score_endpoint_returns_breakdown() {
    let response = seeded_app()
        .oneshot(post_json(
            "/api/score",
            json!({
                "query": { "skills_required": "Plumbing", "wage_offered": 600 },
                "candidate": { "kind": "worker", "id": "x", "skills": ["Plumbing"], "wage_expectation": 500 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 70.0);
    assert_eq!(body["skills"]["status"], "MATCH");
    assert_eq!(body["distance"]["status"], "RESERVED");
}

#[tokio::test]
async fn embeddings_require_text() {
    let app = seeded_app();

    let empty = app
        .clone()
        .oneshot(post_json("/api/embeddings", json!({ "text": "  " })))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let body = json_body(empty).await;
    assert_eq!(body["code"], "bad_request");

    let ok = app
        .oneshot(post_json("/api/embeddings", json!({ "text": "Plumbing Indore" })))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = json_body(ok).await;
    assert_eq!(body["dimension"], 384);
    assert_eq!(body["embedding"].as_array().map(Vec::len), Some(384));
}

#[tokio::test]
async fn match_workers_uses_location_without_vectors() {
    let app = seeded_app();

    let found = app
        .clone()
        .oneshot(post_json("/api/jobs/job-1/match-workers", json!({})))
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let body = json_body(found).await;
    assert_eq!(body["worker_ids"], json!(["1"]));

    let missing = app
        .oneshot(post_json("/api/jobs/nope/match-workers", json!({})))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
