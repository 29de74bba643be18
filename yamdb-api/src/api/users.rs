//! User management and the self-profile endpoint
//!
//! Everything under `/users/` is admin-only except `/users/me/`, which any
//! authenticated user may read and edit. The self-update body has no role
//! field, so a user can never change their own role.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use yamdb_common::api::types::{
    PageResponse, SelfUpdateRequest, UserCreateRequest, UserResponse, UserUpdateRequest,
};
use yamdb_common::db::users::{self, NewUser, UserChanges};
use yamdb_common::db::{AuthState, Role, User};
use yamdb_common::permissions::{Access, Policy};
use yamdb_common::validation::{self, PERSON_NAME_MAX_LEN};
use yamdb_common::{Error, MessageKey, Messages};

use super::auth::Actor;
use crate::error::ApiResult;
use crate::pagination::{page_response, PageParams};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
}

fn parse_role(messages: &Messages, raw: &str) -> Result<Role, Error> {
    raw.parse()
        .map_err(|_| Error::Validation(messages.render(MessageKey::InvalidRole, &[("role", raw)])))
}

fn validate_names(
    messages: &Messages,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<(), Error> {
    if let Some(first_name) = first_name {
        validation::max_len(messages, "first_name", first_name, PERSON_NAME_MAX_LEN)?;
    }
    if let Some(last_name) = last_name {
        validation::max_len(messages, "last_name", last_name, PERSON_NAME_MAX_LEN)?;
    }
    Ok(())
}

/// Reject a username/email already held by a user other than `current_id`
async fn ensure_unique(
    state: &AppState,
    username: Option<&str>,
    email: Option<&str>,
    current_id: Option<i64>,
) -> Result<(), Error> {
    if let Some(username) = username {
        if let Some(other) = users::find_by_username(&state.db, username).await? {
            if Some(other.id) != current_id {
                return Err(state.messages.validation(MessageKey::UsernameTaken));
            }
        }
    }
    if let Some(email) = email {
        if let Some(other) = users::find_by_email(&state.db, email).await? {
            if Some(other.id) != current_id {
                return Err(state.messages.validation(MessageKey::EmailTaken));
            }
        }
    }
    Ok(())
}

async fn find_user(state: &AppState, username: &str) -> Result<User, Error> {
    users::find_by_username(&state.db, username)
        .await?
        .ok_or_else(|| state.messages.not_found(MessageKey::UserNotFound))
}

async fn apply_update(state: &AppState, user: &User, request: UserUpdateRequest) -> Result<User, Error> {
    let messages = &state.messages;

    if let Some(username) = &request.username {
        validation::username(messages, username)?;
    }
    if let Some(email) = &request.email {
        validation::email(messages, email)?;
    }
    validate_names(messages, request.first_name.as_deref(), request.last_name.as_deref())?;
    let role = request
        .role
        .as_deref()
        .map(|raw| parse_role(messages, raw))
        .transpose()?;

    ensure_unique(state, request.username.as_deref(), request.email.as_deref(), Some(user.id)).await?;

    let changes = UserChanges {
        username: request.username,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        bio: request.bio,
        role,
    };

    users::update(&state.db, user.id, &changes)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                messages.validation(MessageKey::UsernameTaken)
            } else {
                e
            }
        })?
        .ok_or_else(|| messages.not_found(MessageKey::UserNotFound))
}

/// GET /v1/users/
pub async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<UserResponse>>> {
    actor.check(&state.messages, Policy::IsAdminOrSuperUser, Access::Read, None)?;
    let (Query(params), Query(query)) = (params?, query?);

    let limit = params.limit(state.settings.default_page_limit);
    let offset = params.offset();
    let page = users::list(&state.db, query.search.as_deref(), limit, offset).await?;

    Ok(Json(page_response(page, &uri, limit, offset)))
}

/// POST /v1/users/
///
/// Admin-created users have no live confirmation code until they sign up.
pub async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<UserCreateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    actor.check(&state.messages, Policy::IsAdminOrSuperUser, Access::Create, None)?;
    let Json(request) = payload?;
    let messages = &state.messages;

    validation::username(messages, &request.username)?;
    validation::email(messages, &request.email)?;
    validate_names(messages, Some(&request.first_name), Some(&request.last_name))?;
    let role = match request.role.as_deref() {
        Some(raw) => parse_role(messages, raw)?,
        None => Role::default(),
    };

    ensure_unique(&state, Some(&request.username), Some(&request.email), None).await?;

    let new = NewUser {
        username: request.username,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        bio: request.bio,
        role,
        is_superuser: false,
    };
    let user = users::insert(&state.db, &new, AuthState::Consumed, None)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                messages.validation(MessageKey::UsernameTaken)
            } else {
                e
            }
        })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /v1/users/{username}/
pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    actor.check(&state.messages, Policy::IsAdminOrSuperUser, Access::Read, None)?;
    let user = find_user(&state, &username).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PATCH /v1/users/{username}/
pub async fn update_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
    payload: Result<Json<UserUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    actor.check(&state.messages, Policy::IsAdminOrSuperUser, Access::Modify, None)?;
    let Json(request) = payload?;

    let user = find_user(&state, &username).await?;
    let updated = apply_update(&state, &user, request).await?;

    Ok(Json(UserResponse::from(&updated)))
}

/// DELETE /v1/users/{username}/
pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    actor.check(&state.messages, Policy::IsAdminOrSuperUser, Access::Modify, None)?;

    let user = find_user(&state, &username).await?;
    users::delete(&state.db, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/users/me/
pub async fn get_me(State(state): State<AppState>, actor: Actor) -> ApiResult<Json<UserResponse>> {
    let user = actor.require(&state.messages)?;
    Ok(Json(UserResponse::from(user)))
}

/// PATCH /v1/users/me/
pub async fn update_me(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<SelfUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let user = actor.require(&state.messages)?;
    let Json(request) = payload?;

    let updated = apply_update(&state, user, request.into()).await?;
    Ok(Json(UserResponse::from(&updated)))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users).post(create_user))
        .route("/users/me/", get(get_me).patch(update_me))
        .route(
            "/users/:username/",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
