//! Title endpoints
//!
//! Writes reference genres and the category by slug; the response embeds
//! the full genre/category objects and the computed rating.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use yamdb_common::api::types::{PageResponse, TitleResponse, TitleWriteRequest};
use yamdb_common::db::catalog::{self, CatalogKind};
use yamdb_common::db::titles::{self, NewTitle, TitleChanges, TitleFilter};
use yamdb_common::permissions::{Access, Policy};
use yamdb_common::validation::{self, TITLE_NAME_MAX_LEN};
use yamdb_common::{Error, MessageKey, Messages};

use super::auth::Actor;
use crate::error::ApiResult;
use crate::pagination::{page_response, PageParams};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TitleQuery {
    pub genre: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub year: Option<i64>,
}

impl From<TitleQuery> for TitleFilter {
    fn from(query: TitleQuery) -> Self {
        Self {
            genre: query.genre,
            category: query.category,
            name: query.name,
            year: query.year,
        }
    }
}

fn validate_name(messages: &Messages, name: &str) -> Result<(), Error> {
    validation::required(messages, "name", name)?;
    validation::max_len(messages, "name", name, TITLE_NAME_MAX_LEN)
}

fn validate_year(messages: &Messages, year: i64) -> Result<(), Error> {
    validation::year(messages, year, i64::from(Utc::now().year()))
}

async fn resolve_category(state: &AppState, slug: &str) -> Result<i64, Error> {
    catalog::find_by_slug(&state.db, CatalogKind::Category, slug)
        .await?
        .map(|entry| entry.id)
        .ok_or_else(|| {
            Error::Validation(
                state
                    .messages
                    .render(MessageKey::UnknownCategory, &[("slug", slug)]),
            )
        })
}

async fn resolve_genres(state: &AppState, slugs: &[String]) -> Result<Vec<i64>, Error> {
    let mut ids = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let entry = catalog::find_by_slug(&state.db, CatalogKind::Genre, slug)
            .await?
            .ok_or_else(|| {
                Error::Validation(state.messages.render(MessageKey::UnknownGenre, &[("slug", slug)]))
            })?;
        ids.push(entry.id);
    }
    Ok(ids)
}

/// GET /v1/titles/
pub async fn list_titles(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<TitleQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<TitleResponse>>> {
    let (Query(params), Query(query)) = (params?, query?);
    let limit = params.limit(state.settings.default_page_limit);
    let offset = params.offset();
    let filter = TitleFilter::from(query);
    let page = titles::list(&state.db, &filter, limit, offset).await?;

    Ok(Json(page_response(page, &uri, limit, offset)))
}

/// POST /v1/titles/
pub async fn create_title(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<TitleWriteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TitleResponse>)> {
    actor.check(&state.messages, Policy::IsAdminOrReadOnly, Access::Create, None)?;
    let Json(request) = payload?;
    let messages = &state.messages;

    let name = request
        .name
        .ok_or_else(|| validation::missing(messages, "name"))?;
    validate_name(messages, &name)?;
    let year = request
        .year
        .ok_or_else(|| validation::missing(messages, "year"))?;
    validate_year(messages, year)?;

    let category_id = match request.category.flatten() {
        Some(slug) => Some(resolve_category(&state, &slug).await?),
        None => None,
    };
    let genre_ids = resolve_genres(&state, request.genre.as_deref().unwrap_or_default()).await?;

    let new = NewTitle {
        name,
        year,
        description: request.description.flatten(),
        category_id,
        genre_ids,
    };
    let detail = titles::insert(&state.db, &new).await?;

    Ok((StatusCode::CREATED, Json(TitleResponse::from(detail))))
}

/// GET /v1/titles/{id}/
pub async fn get_title(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TitleResponse>> {
    let detail = titles::get(&state.db, id)
        .await?
        .ok_or_else(|| state.messages.not_found(MessageKey::TitleNotFound))?;

    Ok(Json(TitleResponse::from(detail)))
}

/// PATCH /v1/titles/{id}/
pub async fn update_title(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<TitleWriteRequest>, JsonRejection>,
) -> ApiResult<Json<TitleResponse>> {
    actor.check(&state.messages, Policy::IsAdminOrReadOnly, Access::Modify, None)?;
    let Json(request) = payload?;
    let messages = &state.messages;

    if !titles::exists(&state.db, id).await? {
        return Err(messages.not_found(MessageKey::TitleNotFound).into());
    }

    if let Some(name) = &request.name {
        validate_name(messages, name)?;
    }
    if let Some(year) = request.year {
        validate_year(messages, year)?;
    }
    let category_id = match request.category {
        Some(Some(slug)) => Some(Some(resolve_category(&state, &slug).await?)),
        Some(None) => Some(None),
        None => None,
    };
    let genre_ids = match request.genre.as_deref() {
        Some(slugs) => Some(resolve_genres(&state, slugs).await?),
        None => None,
    };

    let changes = TitleChanges {
        name: request.name,
        year: request.year,
        description: request.description,
        category_id,
        genre_ids,
    };
    let detail = titles::update(&state.db, id, &changes)
        .await?
        .ok_or_else(|| messages.not_found(MessageKey::TitleNotFound))?;

    Ok(Json(TitleResponse::from(detail)))
}

/// DELETE /v1/titles/{id}/
pub async fn delete_title(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    actor.check(&state.messages, Policy::IsAdminOrReadOnly, Access::Modify, None)?;

    if !titles::delete(&state.db, id).await? {
        return Err(state.messages.not_found(MessageKey::TitleNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn title_routes() -> Router<AppState> {
    Router::new()
        .route("/titles/", get(list_titles).post(create_title))
        .route(
            "/titles/:title_id/",
            get(get_title).patch(update_title).delete(delete_title),
        )
}
