use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use dog_publish::{AuthRequest, DraftInput, PublishError, PublishResult, PublishedDocument};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;

pub fn router(state: AppState, max_media_bytes: usize) -> Router<AppState> {
    let drafts = Router::new()
        .route("/drafts", post(create_draft))
        .route("/drafts/{id}", delete(cancel_draft))
        .route(
            "/drafts/{id}/media",
            post(stage_media).layer(DefaultBodyLimit::max(max_media_bytes)),
        )
        .route("/drafts/{id}/publish", post(publish_draft))
        .route_layer(middleware::from_fn_with_state(state, require_author));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/posts/{slug}", get(get_post))
        .route("/media/{*key}", get(get_media))
        .merge(drafts)
}

fn auth_request(headers: &HeaderMap) -> AuthRequest {
    AuthRequest::from_headers(
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string()))),
    )
}

/// Runs before any extractor touches the body.
async fn require_author(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth = auth_request(request.headers());
    state.service.authorize(&auth)?;
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

async fn create_draft(State(state): State<AppState>) -> Json<Value> {
    let id = state.open_draft().await;
    info!(draft = %id, "draft opened");
    Json(json!({ "draft_id": id }))
}

#[derive(Serialize)]
struct StagedResponse {
    key: String,
    mime: String,
    size: usize,
}

async fn stage_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthRequest>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StagedResponse>, ApiError> {
    let mime = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("A content-type header is required"))?;
    let draft = state.draft(&id).await?;
    let size = body.len();

    let key = state.service.stage_media(&auth, &draft, body, &mime).await?;
    Ok(Json(StagedResponse {
        key: key.to_string(),
        mime,
        size,
    }))
}

async fn publish_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthRequest>,
    payload: Result<Json<DraftInput>, JsonRejection>,
) -> Result<Json<PublishResult>, ApiError> {
    let Json(input) = payload.map_err(ApiError::from_json_rejection)?;
    let draft = state.draft(&id).await?;

    let result = state.service.submit_draft(&auth, &draft, input).await;
    match result.cause.clone() {
        None => {
            // Published: the session is done. Later edits go through a new draft carrying the post id.
            state.close_draft(&id).await;
            info!(draft = %id, "draft closed after publish");
            Ok(Json(result))
        }
        Some(err) => Err(ApiError::from(err).with_data(serde_json::to_value(&result).ok())),
    }
}

async fn cancel_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthRequest>,
) -> Result<Json<Value>, ApiError> {
    let draft = state.draft(&id).await?;
    let released = state.service.cancel_draft(&auth, &draft).await?;
    state.close_draft(&id).await;
    info!(draft = %id, released, "draft cancelled");
    Ok(Json(json!({ "draft_id": id, "released": released })))
}

async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublishedDocument>, ApiError> {
    match state.posts.find_by_slug(&slug).await.map_err(PublishError::from)? {
        Some(doc) if doc.published => Ok(Json(doc)),
        _ => Err(ApiError::not_found(format!("No post found for slug '{slug}'"))),
    }
}

async fn get_media(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response, ApiError> {
    let object = state
        .blobs
        .get(&key)
        .await
        .map_err(|_| ApiError::not_found(format!("No media found for key '{key}'")))?;
    Ok(([(CONTENT_TYPE, object.content_type)], object.body).into_response())
}
