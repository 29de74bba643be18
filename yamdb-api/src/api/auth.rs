//! Bearer token authentication
//!
//! `authenticate` runs on every `/v1` route. A request without an
//! `Authorization` header proceeds anonymously; a header that does not carry
//! a valid, unexpired token for an existing user is rejected with 401 before
//! the handler runs. Handlers read the result through the [`Actor`]
//! extractor and apply their own policy.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use yamdb_common::db::{users, User};
use yamdb_common::permissions::{self, Access, Policy};
use yamdb_common::{Error, MessageKey, Messages};

use crate::error::ApiError;
use crate::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// The authenticated user behind a request, if any
#[derive(Debug, Clone, Default)]
pub struct Actor(pub Option<User>);

impl Actor {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    /// The user, or `Unauthorized` for anonymous requests
    pub fn require(&self, messages: &Messages) -> Result<&User, Error> {
        self.user()
            .ok_or_else(|| Error::Unauthorized(messages.get(MessageKey::NotAuthenticated).to_string()))
    }

    /// Apply `policy` for this actor
    pub fn check(
        &self,
        messages: &Messages,
        policy: Policy,
        access: Access,
        author_id: Option<i64>,
    ) -> Result<(), Error> {
        permissions::enforce(messages, policy, self.user(), access, author_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Actor>().cloned().unwrap_or_default())
    }
}

/// Authentication middleware
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_user(&state, request.headers()).await?;
    request.extensions_mut().insert(Actor(user));
    Ok(next.run(request).await)
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let invalid = || Error::Unauthorized(state.messages.get(MessageKey::InvalidToken).to_string());

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or_else(invalid)?;

    let claims = state.tokens.verify(token).map_err(|e| {
        debug!("Rejected access token: {}", e);
        invalid()
    })?;

    let user = users::find_by_id(&state.db, claims.user_id)
        .await?
        .ok_or_else(invalid)?;

    Ok(Some(user))
}
