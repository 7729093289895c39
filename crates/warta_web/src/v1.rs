//! `/api/v1`: paginated article access for automation clients that poll for
//! new rows and push their own articles.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use warta_core::{Article, ArticleQuery, NewArticle, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const MAX_BULK_ARTICLES: usize = 100;
pub const DEFAULT_LATEST: i64 = 10;
pub const MAX_LATEST: i64 = 100;

/// Query values arrive as text and are read leniently: anything that is not a
/// positive number falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub search: Option<String>,
    pub from_id: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestParams {
    pub count: Option<String>,
}

fn positive(value: Option<&str>) -> Option<i64> {
    value?.trim().parse::<i64>().ok().filter(|n| *n > 0)
}

impl ListParams {
    fn to_query(&self) -> ArticleQuery {
        ArticleQuery {
            limit: positive(self.limit.as_deref())
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
            offset: positive(self.offset.as_deref()).unwrap_or(0),
            search: self.search.clone(),
            from_id: positive(self.from_id.as_deref()).unwrap_or(0),
        }
    }

    fn simple(&self) -> bool {
        self.format.as_deref() == Some("simple")
    }
}

#[derive(Debug, Serialize)]
struct SimpleArticle<'a> {
    id: i64,
    title: &'a str,
    url: &'a str,
    publish_date: &'a str,
}

impl<'a> From<&'a Article> for SimpleArticle<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            id: article.id,
            title: &article.title,
            url: &article.url,
            publish_date: &article.publish_date,
        }
    }
}

/// Article body as posted by clients; every field may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleInput {
    pub title: Option<String>,
    pub url: Option<String>,
    pub publish_date: Option<String>,
    pub content_snippet: Option<String>,
}

impl From<ArticleInput> for NewArticle {
    fn from(input: ArticleInput) -> Self {
        NewArticle {
            title: input.title.unwrap_or_default(),
            url: input.url.unwrap_or_default(),
            publish_date: input.publish_date,
            content_snippet: input.content_snippet,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkRequest {
    pub articles: Option<Vec<ArticleInput>>,
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid ID"))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let query = params.to_query();
    let page = state.storage.find_all(&query).await?;

    let returned = page.data.len() as i64;
    let data = if params.simple() {
        json!(page.data.iter().map(SimpleArticle::from).collect::<Vec<_>>())
    } else {
        json!(page.data)
    };

    Ok(Json(json!({
        "success": true,
        "meta": {
            "total": page.total,
            "limit": page.limit,
            "offset": page.offset,
            "returned": returned,
            "has_more": page.offset + returned < page.total,
        },
        "data": data,
    })))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let article = state
        .storage
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(Json(json!({ "success": true, "data": article })))
}

pub async fn latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LatestParams>,
) -> ApiResult<Json<Value>> {
    let count = positive(params.count.as_deref())
        .unwrap_or(DEFAULT_LATEST)
        .min(MAX_LATEST);
    let articles = state.storage.find_latest(count).await?;

    Ok(Json(json!({
        "success": true,
        "count": articles.len(),
        "last_id": articles.first().map(|a| a.id),
        "data": articles,
    })))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ArticleInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let article = NewArticle::from(input);
    if !article.is_valid() {
        return Err(ApiError::bad_request("title and url are required"));
    }

    if let Some(existing_id) = state.storage.check_url_exists(&article.url).await? {
        return Err(ApiError::duplicate(existing_id));
    }

    let created = state.storage.create(&article).await?;
    info!("📰 Article {} created: {}", created.id, created.url);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Article created",
            "data": created,
        })),
    ))
}

pub async fn create_bulk(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let articles: Vec<NewArticle> = match request.articles {
        Some(articles) if !articles.is_empty() => articles.into_iter().map(NewArticle::from).collect(),
        _ => return Err(ApiError::bad_request("articles array is required")),
    };
    if articles.len() > MAX_BULK_ARTICLES {
        return Err(ApiError::bad_request(format!(
            "Maximum {} articles per request",
            MAX_BULK_ARTICLES
        )));
    }

    let result = state.storage.create_bulk(&articles).await?;
    info!(
        "📦 Bulk insert: {} created, {} skipped",
        result.inserted_count, result.skipped_count
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!(
                "{} articles created, {} skipped (duplicates or invalid)",
                result.inserted_count, result.skipped_count
            ),
            "inserted": result.inserted_count,
            "skipped": result.skipped_count,
            "data": result.inserted,
        })),
    ))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let deleted = state
        .storage
        .delete_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Article deleted",
        "deleted": deleted,
    })))
}

pub async fn export(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let articles = state.storage.export_all().await?;
    Ok(Json(json!({
        "success": true,
        "exported_at": Utc::now().to_rfc3339(),
        "total": articles.len(),
        "data": articles,
    })))
}
