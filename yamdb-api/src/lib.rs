//! yamdb-api library - YaMDb review and rating service
//!
//! Exposes the `/v1` REST surface (signup, users, catalog, titles, reviews,
//! comments) plus `/health`.

use std::sync::Arc;

use axum::{middleware, Router};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use yamdb_common::api::TokenIssuer;
use yamdb_common::db::settings::RuntimeSettings;
use yamdb_common::mail::Mailer;
use yamdb_common::Messages;

pub mod api;
pub mod error;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub messages: Arc<Messages>,
    pub tokens: TokenIssuer,
    pub mailer: Arc<dyn Mailer>,
    pub settings: RuntimeSettings,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        messages: Messages,
        tokens: TokenIssuer,
        mailer: Arc<dyn Mailer>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            db,
            messages: Arc::new(messages),
            tokens,
            mailer,
            settings,
        }
    }
}

/// Build application router
///
/// Every `/v1` route passes through bearer-token authentication; `/health`
/// does not.
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(api::signup_routes())
        .merge(api::user_routes())
        .merge(api::catalog_routes())
        .merge(api::title_routes())
        .merge(api::review_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::authenticate,
        ));

    Router::new()
        .nest("/v1", v1)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
