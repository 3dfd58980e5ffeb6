use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{PasswordChangeRequest, RegisterRequest, SearchQuery, UpdateUserRequest},
    repo_types::{NewUser, User, UserId},
    services::{check_password, prepare_profile},
};
use crate::{
    auth::{
        extractors::AuthUser,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/usuarios", post(create_user).get(search_users))
        .route(
            "/usuarios/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/usuarios/:id/seguir", post(follow_user))
        .route("/usuarios/:id/parar-de-seguir", post(unfollow_user))
        .route("/usuarios/:id/seguidores", get(list_followers))
        .route("/usuarios/:id/seguindo", get(list_following))
        .route("/usuarios/:id/atualizar-senha", post(update_password))
}

fn ensure_self(caller: UserId, target: UserId, action: &str) -> Result<(), ApiError> {
    if caller != target {
        warn!(caller, target, action, "rejected action on another user");
        return Err(ApiError::Forbidden(format!("cannot {action} another user")));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let profile = prepare_profile(&payload.nome, &payload.nick, &payload.email)?;
    check_password(&payload.senha)?;

    let password_hash = hash_password(&payload.senha).map_err(ApiError::internal)?;
    let user = state
        .users
        .create(&NewUser {
            profile,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.users.search(query.usuario.trim()).await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    AppPath(id): AppPath<UserId>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .users
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<UserId>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<StatusCode, ApiError> {
    ensure_self(caller, id, "update")?;
    let profile = prepare_profile(&payload.nome, &payload.nick, &payload.email)?;
    state.users.update(id, &profile).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<UserId>,
) -> Result<StatusCode, ApiError> {
    ensure_self(caller, id, "delete")?;
    state.users.delete(id).await?;
    info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn follow_user(
    State(state): State<AppState>,
    AuthUser(follower): AuthUser,
    AppPath(target): AppPath<UserId>,
) -> Result<StatusCode, ApiError> {
    if follower == target {
        return Err(ApiError::Forbidden("cannot follow yourself".into()));
    }
    state.users.follow(target, follower).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthUser(follower): AuthUser,
    AppPath(target): AppPath<UserId>,
) -> Result<StatusCode, ApiError> {
    if follower == target {
        return Err(ApiError::Forbidden("cannot unfollow yourself".into()));
    }
    state.users.unfollow(target, follower).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_followers(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    AppPath(id): AppPath<UserId>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list_followers(id).await?))
}

#[instrument(skip(state))]
pub async fn list_following(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    AppPath(id): AppPath<UserId>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list_following(id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppPath(id): AppPath<UserId>,
    AppJson(payload): AppJson<PasswordChangeRequest>,
) -> Result<StatusCode, ApiError> {
    ensure_self(caller, id, "change the password of")?;
    check_password(&payload.nova)?;

    let current_hash = state
        .users
        .get_password_hash(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let ok = verify_password(&payload.atual, &current_hash).map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = id, "password change with wrong current password");
        return Err(ApiError::Unauthorized(
            "current password does not match".into(),
        ));
    }

    let new_hash = hash_password(&payload.nova).map_err(ApiError::internal)?;
    state.users.update_password(id, &new_hash).await?;
    info!(user_id = id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
