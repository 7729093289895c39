use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use warta_core::{regions, DateRange, Error, ScrapeResult};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Rows returned by the basic article list.
pub const BASIC_LIST_SIZE: i64 = 100;

pub const MISSING_SCRAPE_PARAMS: &str = "Missing required parameters (url, startDate, endDate)";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn scrape(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScrapeRequest>,
) -> ApiResult<Json<ScrapeResult>> {
    let (Some(url), Some(start), Some(end)) = (
        required(request.url),
        required(request.start_date),
        required(request.end_date),
    ) else {
        return Err(ApiError::bad_request(MISSING_SCRAPE_PARAMS));
    };

    let range = DateRange::parse(&start, &end).map_err(|e| ApiError::bad_request(e.to_string()))?;

    info!("🦗 Scrape requested for {} ({} to {})", url, range.start, range.end);
    match state.scraper.scrape_and_save(&url, &range).await {
        Ok(result) => Ok(Json(result)),
        Err(Error::InvalidUrl(reason)) => Err(ApiError::bad_request(format!("Invalid URL: {}", reason))),
        Err(e) => {
            error!("Scraping error: {}", e);
            Err(ApiError::internal(format!("Failed to scrape: {}", e)))
        }
    }
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let articles = state.storage.find_latest(BASIC_LIST_SIZE).await?;
    Ok(Json(json!({
        "success": true,
        "count": articles.len(),
        "data": articles,
    })))
}

pub async fn delete_articles(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let deleted = state.storage.delete_all().await?;
    info!("🗑️ Deleted {} articles", deleted);
    Ok(Json(json!({
        "success": true,
        "message": format!("{} articles deleted.", deleted),
    })))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let total = state.storage.count().await?;
    Ok(Json(json!({
        "success": true,
        "total_articles": total,
    })))
}

pub async fn provinces() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": regions::provinces(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
