//! Integration tests: lookups, search, paths, stats, and the not-ready barrier.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use social_api::server::{self, AppState};
use social_engine::{BuildConfig, QueryEngine, RootSelector};
use social_loader::{BackgroundLoader, LoadError, Loader, LoaderConfig};
use social_types::{LoadStatus, QueryError};
use std::sync::Arc;
use tower::util::ServiceExt;

const DATASET: &str = "\
user_id,gender,age,eye_color,education,hobbies,languages,music,friends
0,Male,25,Blue,Bachelors,chess,English,rock,1
1,Female,30,Brown,Masters,reading,\"English, Spanish\",jazz,2;0
2,Female,25,Green,Bachelors,,Spanish,rock,3
3,Male,40,Blue,PhD,chess,English,,
4,,,,,,,,
";

async fn test_app() -> axum::Router {
    let config = LoaderConfig::new("in-memory")
        .with_build(BuildConfig::default().with_root(RootSelector::Fixed(3)));
    let loader = Arc::new(BackgroundLoader::from_reader(DATASET.as_bytes(), config));
    loader.wait_ready().await.unwrap();
    server::router(Arc::new(AppState { loader }))
}

async fn get(app: &axum::Router, uri: &str) -> Value {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> Value {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_and_status() {
    let app = test_app().await;
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let j = get(&app, "/status").await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["state"], "ready");
    assert_eq!(j["data"]["users"], 5);
    assert_eq!(j["data"]["root"], 3);
}

#[tokio::test]
async fn user_lookup_and_friends() {
    let app = test_app().await;
    let j = get(&app, "/users/1").await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["gender"], "female");
    assert_eq!(j["data"]["age"], 30);

    let j = get(&app, "/users/99").await;
    assert_eq!(j["code"], 404);

    let j = get(&app, "/users/1/friends").await;
    let ids: Vec<u64> = j["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["user_id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 0]);
}

#[tokio::test]
async fn path_to_root_and_between_users() {
    let app = test_app().await;
    let j = get(&app, "/users/0/path_to_root").await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["path"], json!([0, 1, 2, 3]));
    assert_eq!(j["data"]["hops"], 3);

    let j = get(&app, "/users/4/path_to_root").await;
    assert_eq!(j["code"], 404);

    let j = get(&app, "/users/0/path_to_root?max_hops=2").await;
    assert_eq!(j["code"], 404);

    let j = get(&app, "/path?from=2&to=0").await;
    assert_eq!(j["code"], 404);
    let j = get(&app, "/path?from=1&to=0").await;
    assert_eq!(j["data"]["path"], json!([1, 0]));
}

#[tokio::test]
async fn reachable_users_with_hops() {
    let app = test_app().await;
    let j = get(&app, "/users/1/reachable").await;
    assert_eq!(j["code"], 200);
    assert_eq!(
        j["data"],
        json!([
            { "user_id": 1, "hops": 0 },
            { "user_id": 2, "hops": 1 },
            { "user_id": 0, "hops": 1 },
            { "user_id": 3, "hops": 2 }
        ])
    );

    let j = get(&app, "/users/1/reachable?max_hops=1").await;
    assert_eq!(j["data"].as_array().unwrap().len(), 3);

    let j = get(&app, "/users/99/reachable").await;
    assert_eq!(j["code"], 404);
}

#[tokio::test]
async fn malformed_requests_get_an_envelope() {
    let app = test_app().await;
    let j = get(&app, "/users/abc").await;
    assert_eq!(j["code"], 400);
    assert!(j["data"].is_null());

    let j = get(&app, "/path?from=1").await;
    assert_eq!(j["code"], 400);

    let j = get(&app, "/users/0/path_to_root?max_hops=lots").await;
    assert_eq!(j["code"], 400);

    let j = post(&app, "/users/search", json!({ "attribute": "age" })).await;
    assert_eq!(j["code"], 400);
}

#[tokio::test]
async fn search_by_attribute() {
    let app = test_app().await;
    let j = post(
        &app,
        "/users/search",
        json!({ "attribute": "age", "predicate": { "op": "equals", "value": 25 } }),
    )
    .await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["total"], 2);
    assert_eq!(j["data"]["users"][0]["user_id"], 0);
    assert_eq!(j["data"]["users"][1]["user_id"], 2);

    let j = post(
        &app,
        "/users/search",
        json!({
            "attribute": "age",
            "predicate": { "op": "range", "low": 26 },
            "limit": 1
        }),
    )
    .await;
    assert_eq!(j["data"]["total"], 2);
    assert_eq!(j["data"]["users"].as_array().unwrap().len(), 1);

    let j = post(
        &app,
        "/users/search",
        json!({ "attribute": "languages", "predicate": { "op": "equals", "value": "Spanish" } }),
    )
    .await;
    assert_eq!(j["data"]["total"], 2);

    let j = post(
        &app,
        "/users/search",
        json!({ "attribute": "shoe_size", "predicate": { "op": "equals", "value": 9 } }),
    )
    .await;
    assert_eq!(j["code"], 400);

    let j = post(
        &app,
        "/users/search",
        json!({ "attribute": "age", "predicate": { "op": "equals", "value": "old" } }),
    )
    .await;
    assert_eq!(j["code"], 400);
}

#[tokio::test]
async fn distribution_and_stats() {
    let app = test_app().await;
    let j = get(&app, "/distribution/age").await;
    assert_eq!(
        j["data"],
        json!([
            { "value": 25, "count": 2 },
            { "value": 30, "count": 1 },
            { "value": 40, "count": 1 }
        ])
    );

    let j = get(&app, "/stats/top/education?k=1").await;
    assert_eq!(j["data"], json!([{ "value": "Bachelors", "count": 2 }]));

    let j = get(&app, "/stats/gender").await;
    assert_eq!(j["data"]["counts"][0], json!({ "gender": "male", "users": 2 }));
    assert_eq!(j["data"]["counts"][2], json!({ "gender": "unknown", "users": 1 }));

    let j = get(&app, "/stats/degrees?k=2").await;
    assert_eq!(j["data"]["summary"]["edges"], 4);
    assert_eq!(j["data"]["summary"]["max"], 2);
    assert_eq!(j["data"]["most_connected"][0]["user_id"], 1);

    let j = get(&app, "/distribution/shoe_size").await;
    assert_eq!(j["code"], 400);
}

struct StillLoading;

#[async_trait::async_trait]
impl Loader for StillLoading {
    fn status(&self) -> LoadStatus {
        LoadStatus::Loading {
            rows_processed: 42,
        }
    }

    fn engine(&self) -> Result<QueryEngine, QueryError> {
        Err(QueryError::NotReady)
    }

    async fn wait_ready(&self) -> Result<QueryEngine, LoadError> {
        Err(LoadError::Aborted)
    }
}

#[tokio::test]
async fn queries_wait_for_ready() {
    let app = server::router(Arc::new(AppState {
        loader: Arc::new(StillLoading),
    }));
    let j = get(&app, "/status").await;
    assert_eq!(j["data"]["state"], "loading");
    assert_eq!(j["data"]["rows_processed"], 42);

    let j = get(&app, "/users/0").await;
    assert_eq!(j["code"], 503);
    let j = get(&app, "/users/0/path_to_root").await;
    assert_eq!(j["code"], 503);
    let j = post(
        &app,
        "/users/search",
        json!({ "attribute": "age", "predicate": { "op": "equals", "value": 25 } }),
    )
    .await;
    assert_eq!(j["code"], 503);
}
