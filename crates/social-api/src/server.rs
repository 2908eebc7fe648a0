//! Axum server and routes.
//!
//! Every JSON route answers HTTP 200 with a `{code, message, data}` envelope;
//! `code` carries the outcome (404, 400, 503, ...). Malformed path segments,
//! query strings and bodies come back as a 400 envelope too.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use social_engine::{CancellationToken, QueryEngine, TraversalOptions};
use social_loader::Loader;
use social_types::{
    Attribute, BaseResponse, DegreeReport, GenderReport, LoadStatus, PathResponse, QueryError,
    ReachEntry, SearchRequest, SearchResponse, UserId, UserRecord, ValueCount,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const DEFAULT_TOP_K: usize = 10;

pub struct AppState {
    pub loader: Arc<dyn Loader>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/users/search", post(handle_search))
        .route("/users/:id", get(handle_get_user))
        .route("/users/:id/friends", get(handle_friends))
        .route("/users/:id/path_to_root", get(handle_path_to_root))
        .route("/users/:id/reachable", get(handle_reachable))
        .route("/path", get(handle_path))
        .route("/distribution/:attribute", get(handle_distribution))
        .route("/stats/top/:attribute", get(handle_top_values))
        .route("/stats/degrees", get(handle_degrees))
        .route("/stats/gender", get(handle_gender))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_code(err: &QueryError) -> i32 {
    match err {
        QueryError::NotFound(_) | QueryError::NotReachable { .. } => 404,
        QueryError::InvalidAttribute(_) | QueryError::TypeMismatch { .. } => 400,
        QueryError::NotReady => 503,
        QueryError::Cancelled => 499,
    }
}

fn respond<T>(result: Result<T, QueryError>) -> Json<BaseResponse<T>> {
    match result {
        Ok(data) => Json(BaseResponse::ok(data)),
        Err(e) => Json(BaseResponse::error(error_code(&e), e.to_string())),
    }
}

type Rejected = Json<BaseResponse<()>>;

fn bad_request(message: String) -> Rejected {
    Json(BaseResponse::error(400, message))
}

/// `axum::extract::Path` that rejects with a 400 envelope.
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Rejected;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(e) => Err(bad_request(e.body_text())),
        }
    }
}

/// `axum::extract::Query` that rejects with a 400 envelope.
pub struct Query<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Rejected;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(e) => Err(bad_request(e.body_text())),
        }
    }
}

/// JSON body that rejects with a 400 envelope.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Rejected;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(e) => Err(bad_request(e.body_text())),
        }
    }
}

/// Run a cheap query inline against the Ready engine.
fn query<T, F>(state: &AppState, f: F) -> Json<BaseResponse<T>>
where
    F: FnOnce(&QueryEngine) -> Result<T, QueryError>,
{
    respond(state.loader.engine().and_then(|engine| f(&engine)))
}

/// Run a traversal or scan on the blocking pool.
///
/// The token is cancelled if this handler is dropped (client went away)
/// before the work finishes.
async fn query_blocking<T, F>(state: &AppState, f: F) -> Json<BaseResponse<T>>
where
    T: Send + 'static,
    F: FnOnce(&QueryEngine, CancellationToken) -> Result<T, QueryError> + Send + 'static,
{
    let engine = match state.loader.engine() {
        Ok(engine) => engine,
        Err(e) => return respond(Err(e)),
    };
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    let joined = tokio::task::spawn_blocking(move || f(&engine, token)).await;
    guard.disarm();
    match joined {
        Ok(result) => respond(result),
        Err(e) => {
            tracing::error!(error = %e, "query task failed");
            Json(BaseResponse::error(500, e.to_string()))
        }
    }
}

async fn handle_health() -> &'static str {
    "ok"
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<BaseResponse<LoadStatus>> {
    Json(BaseResponse::ok(state.loader.status()))
}

async fn handle_get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Json<BaseResponse<UserRecord>> {
    query(&state, |engine| engine.get_record(id).cloned())
}

async fn handle_friends(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> Json<BaseResponse<Vec<UserRecord>>> {
    query(&state, |engine| {
        Ok(engine.friends(id)?.into_iter().cloned().collect())
    })
}

#[derive(Debug, Deserialize)]
pub struct HopsQuery {
    #[serde(default)]
    pub max_hops: Option<usize>,
}

async fn handle_path_to_root(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
    Query(q): Query<HopsQuery>,
) -> Json<BaseResponse<PathResponse>> {
    query_blocking(&state, move |engine, cancel| {
        let opts = TraversalOptions {
            max_hops: q.max_hops,
            cancel: Some(cancel),
        };
        let path = engine.path_to_root_with(id, &opts)?;
        PathResponse::new(path).ok_or(QueryError::NotFound(id))
    })
    .await
}

async fn handle_reachable(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
    Query(q): Query<HopsQuery>,
) -> Json<BaseResponse<Vec<ReachEntry>>> {
    query_blocking(&state, move |engine, cancel| {
        let opts = TraversalOptions {
            max_hops: q.max_hops,
            cancel: Some(cancel),
        };
        engine.reachable_from(id, &opts)
    })
    .await
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub from: UserId,
    pub to: UserId,
    #[serde(default)]
    pub max_hops: Option<usize>,
}

async fn handle_path(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PathQuery>,
) -> Json<BaseResponse<PathResponse>> {
    query_blocking(&state, move |engine, cancel| {
        let opts = TraversalOptions {
            max_hops: q.max_hops,
            cancel: Some(cancel),
        };
        let path = engine.shortest_path_with(q.from, q.to, &opts)?;
        PathResponse::new(path).ok_or(QueryError::NotFound(q.from))
    })
    .await
}

async fn handle_search(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SearchRequest>,
) -> Json<BaseResponse<SearchResponse>> {
    query_blocking(&state, move |engine, cancel| {
        let attr: Attribute = req.attribute.parse()?;
        let found = engine.find_by_attribute_with(attr, &req.predicate, Some(&cancel))?;
        let total = found.len();
        let limit = req.limit.unwrap_or(total);
        let users = found.into_iter().take(limit).cloned().collect();
        Ok(SearchResponse { total, users })
    })
    .await
}

async fn handle_distribution(
    State(state): State<Arc<AppState>>,
    Path(attribute): Path<String>,
) -> Json<BaseResponse<Vec<ValueCount>>> {
    query(&state, |engine| {
        let attr: Attribute = attribute.parse()?;
        Ok(engine
            .distribution(attr)?
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect())
    })
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default)]
    pub k: Option<usize>,
}

async fn handle_top_values(
    State(state): State<Arc<AppState>>,
    Path(attribute): Path<String>,
    Query(q): Query<TopQuery>,
) -> Json<BaseResponse<Vec<ValueCount>>> {
    query(&state, |engine| {
        let attr: Attribute = attribute.parse()?;
        engine.top_values(attr, q.k.unwrap_or(DEFAULT_TOP_K))
    })
}

async fn handle_degrees(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TopQuery>,
) -> Json<BaseResponse<DegreeReport>> {
    let k = q.k.unwrap_or(DEFAULT_TOP_K);
    query_blocking(&state, move |engine, _| {
        Ok(DegreeReport {
            summary: engine.degree_summary(),
            distribution: engine.degree_distribution().into_iter().collect(),
            most_connected: engine.most_connected(k),
            least_connected: engine.least_connected(k),
        })
    })
    .await
}

async fn handle_gender(State(state): State<Arc<AppState>>) -> Json<BaseResponse<GenderReport>> {
    query_blocking(&state, |engine, _| {
        Ok(GenderReport {
            counts: engine.gender_counts(),
            average_age: engine.average_age_by_gender(),
        })
    })
    .await
}
