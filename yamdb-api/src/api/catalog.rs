//! Genre and category endpoints
//!
//! Both catalogs support list, create and delete by slug. Reads are public;
//! writes need an admin.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::{StatusCode, Uri},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use yamdb_common::api::types::{CatalogRequest, PageResponse};
use yamdb_common::db::catalog::{self, CatalogKind};
use yamdb_common::db::CatalogEntry;
use yamdb_common::permissions::{Access, Policy};
use yamdb_common::validation::{self, CATALOG_NAME_MAX_LEN};
use yamdb_common::MessageKey;

use super::auth::Actor;
use crate::error::ApiResult;
use crate::pagination::{page_response, PageParams};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
}

async fn list_entries(
    state: &AppState,
    kind: CatalogKind,
    uri: &Uri,
    params: PageParams,
    query: CatalogQuery,
) -> ApiResult<Json<PageResponse<CatalogEntry>>> {
    let limit = params.limit(state.settings.default_page_limit);
    let offset = params.offset();
    let page = catalog::list(&state.db, kind, query.search.as_deref(), limit, offset).await?;

    Ok(Json(page_response(page, uri, limit, offset)))
}

async fn create_entry(
    state: &AppState,
    kind: CatalogKind,
    actor: &Actor,
    payload: Result<Json<CatalogRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CatalogEntry>)> {
    actor.check(&state.messages, Policy::IsAdminOrReadOnly, Access::Create, None)?;
    let Json(request) = payload?;
    let messages = &state.messages;

    validation::required(messages, "name", &request.name)?;
    validation::max_len(messages, "name", &request.name, CATALOG_NAME_MAX_LEN)?;
    validation::slug(messages, &request.slug)?;

    let entry = catalog::insert(&state.db, kind, &request.name, &request.slug)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                messages.validation(MessageKey::SlugTaken)
            } else {
                e
            }
        })?;

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_entry(
    state: &AppState,
    kind: CatalogKind,
    actor: &Actor,
    slug: &str,
) -> ApiResult<StatusCode> {
    actor.check(&state.messages, Policy::IsAdminOrReadOnly, Access::Modify, None)?;

    if !catalog::delete_by_slug(&state.db, kind, slug).await? {
        return Err(state.messages.not_found(kind.not_found_key()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/genres/
pub async fn list_genres(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<CatalogEntry>>> {
    let (Query(params), Query(query)) = (params?, query?);
    list_entries(&state, CatalogKind::Genre, &uri, params, query).await
}

/// POST /v1/genres/
pub async fn create_genre(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CatalogRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CatalogEntry>)> {
    create_entry(&state, CatalogKind::Genre, &actor, payload).await
}

/// DELETE /v1/genres/{slug}/
pub async fn delete_genre(
    State(state): State<AppState>,
    actor: Actor,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    delete_entry(&state, CatalogKind::Genre, &actor, &slug).await
}

/// GET /v1/categories/
pub async fn list_categories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<CatalogEntry>>> {
    let (Query(params), Query(query)) = (params?, query?);
    list_entries(&state, CatalogKind::Category, &uri, params, query).await
}

/// POST /v1/categories/
pub async fn create_category(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CatalogRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CatalogEntry>)> {
    create_entry(&state, CatalogKind::Category, &actor, payload).await
}

/// DELETE /v1/categories/{slug}/
pub async fn delete_category(
    State(state): State<AppState>,
    actor: Actor,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    delete_entry(&state, CatalogKind::Category, &actor, &slug).await
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/genres/", get(list_genres).post(create_genre))
        .route("/genres/:slug/", delete(delete_genre))
        .route("/categories/", get(list_categories).post(create_category))
        .route("/categories/:slug/", delete(delete_category))
}
