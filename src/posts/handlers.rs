use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::PostRequest,
    repo_types::{Post, PostId},
    services::prepare_post,
};
use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    extract::{AppJson, AppPath},
    state::AppState,
    users::repo_types::UserId,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/publicacoes", get(list_feed))
        .route("/publicacoes/:id", get(get_post))
        .route("/usuario/:id/publicacoes", get(list_by_author))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/publicacoes", post(create_post))
        .route("/publicacoes/:id", put(update_post).delete(delete_post))
        .route("/publicacoes/:id/curtir", post(like_post))
        .route("/publicacoes/:id/descurtir", post(unlike_post))
}

#[instrument(skip(state, body))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<PostRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Post>), ApiError> {
    let input = prepare_post(&body)?;
    // the author is always the caller, whatever the body says
    let post = state.posts.create(user_id, &input).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/publicacoes/{}", post.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    info!(user_id, post_id = post.id, "post created");
    Ok((StatusCode::CREATED, headers, Json(post)))
}

#[instrument(skip(state))]
pub async fn list_feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list_feed(user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    AppPath(id): AppPath<PostId>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .posts
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;
    Ok(Json(post))
}

#[instrument(skip(state))]
pub async fn list_by_author(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    AppPath(author): AppPath<UserId>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list_by_author(author).await?))
}

#[instrument(skip(state, body))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<PostId>,
    AppJson(body): AppJson<PostRequest>,
) -> Result<StatusCode, ApiError> {
    let input = prepare_post(&body)?;
    state.posts.update(id, user_id, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<PostId>,
) -> Result<StatusCode, ApiError> {
    state.posts.delete(id, user_id).await?;
    info!(user_id, post_id = id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn like_post(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    AppPath(id): AppPath<PostId>,
) -> Result<StatusCode, ApiError> {
    state.posts.like(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn unlike_post(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    AppPath(id): AppPath<PostId>,
) -> Result<StatusCode, ApiError> {
    state.posts.unlike(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
