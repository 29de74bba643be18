//! Signup and token endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use yamdb_common::api::types::{SignupRequest, SignupResponse, TokenRequest, TokenResponse};
use yamdb_common::auth_flow;
use yamdb_common::validation;

use crate::error::ApiResult;
use crate::AppState;

/// POST /v1/auth/signup/
///
/// Answers 200 with the submitted pair; the code only travels by mail.
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Json<SignupResponse>> {
    let Json(request) = payload?;

    let user = auth_flow::signup(
        &state.db,
        &state.messages,
        state.mailer.as_ref(),
        &request.username,
        &request.email,
    )
    .await?;

    Ok(Json(SignupResponse {
        username: user.username,
        email: user.email,
    }))
}

/// POST /v1/auth/token/
pub async fn token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(request) = payload?;

    let Some(code) = request.confirmation_code else {
        return Err(validation::missing(&state.messages, "confirmation_code").into());
    };

    let token = auth_flow::token(
        &state.db,
        &state.messages,
        &state.tokens,
        &request.username,
        code.as_code(),
    )
    .await?;

    Ok(Json(TokenResponse { token }))
}

pub fn signup_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", post(signup))
        .route("/auth/token/", post(token))
}
