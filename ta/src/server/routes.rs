//! REST handlers for tasks, steps, summaries and achievements

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use taskstore::{Achievement, Step, StepPatch, TaskWithSteps};
use tracing::debug;

use super::AppState;
use super::error::ApiError;
use crate::domain::DayKey;
use crate::service::MAX_PAGE_LIMIT;

const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct CreateTaskBody {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskBody {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStepBody {
    pub done: Option<bool>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SummaryBody {
    pub summary_markdown: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<CreateTaskBody>,
) -> Result<(StatusCode, Json<TaskWithSteps>), ApiError> {
    debug!(title = %body.title, "create_task: called");
    if body.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    let task = state.service.create_task(&body.title).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskWithSteps>>, ApiError> {
    Ok(Json(state.service.list_incomplete().await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskWithSteps>, ApiError> {
    state
        .service
        .get_task(&task_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("task", &task_id))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(body): Json<UpdateTaskBody>,
) -> Result<Json<TaskWithSteps>, ApiError> {
    debug!(%task_id, ?body, "update_task: called");
    let updated = match body.title {
        Some(title) if title.trim().is_empty() => return Err(ApiError::bad_request("title must not be empty")),
        Some(title) => state.service.update_title(&task_id, &title).await?,
        None => state.service.get_task(&task_id).await?,
    };
    updated
        .map(Json)
        .ok_or_else(|| ApiError::not_found("task", &task_id))
}

pub async fn update_step(
    State(state): State<AppState>,
    Path(step_id): Path<String>,
    Json(body): Json<UpdateStepBody>,
) -> Result<Json<Step>, ApiError> {
    debug!(%step_id, ?body, "update_step: called");
    let patch = StepPatch {
        done: body.done,
        content: body.content,
    };
    state
        .service
        .update_step(&step_id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("step", &step_id))
}

pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<SummaryBody>, ApiError> {
    let completion = state
        .service
        .complete_task(&task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("task", &task_id))?;
    Ok(Json(SummaryBody {
        summary_markdown: completion.summary,
    }))
}

pub async fn summary_today(State(state): State<AppState>) -> Result<Json<SummaryBody>, ApiError> {
    let summary_markdown = state.service.daily_summary(DayKey::today()).await?;
    Ok(Json(SummaryBody { summary_markdown }))
}

pub async fn summary_for_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<SummaryBody>, ApiError> {
    let day = DayKey::parse(&date).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let summary_markdown = state.service.daily_summary(day).await?;
    Ok(Json(SummaryBody { summary_markdown }))
}

pub async fn list_achievements(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    let (page, limit) = validate_page(&query)?;
    Ok(Json(state.service.list_achievements(page, limit).await?))
}

pub async fn get_achievement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Achievement>, ApiError> {
    state
        .service
        .get_achievement(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("achievement", &id))
}

fn validate_page(query: &PageQuery) -> Result<(u32, u32), ApiError> {
    let page = query.page.unwrap_or(1);
    if page < 1 || page > i64::from(u32::MAX) {
        return Err(ApiError::bad_request(format!("page must be at least 1, got {}", page)));
    }
    let limit = query.limit.unwrap_or(i64::from(DEFAULT_PAGE_LIMIT));
    if !(1..=i64::from(MAX_PAGE_LIMIT)).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {}, got {}",
            MAX_PAGE_LIMIT, limit
        )));
    }
    Ok((page as u32, limit as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, limit: Option<i64>) -> PageQuery {
        PageQuery { page, limit }
    }

    #[test]
    fn test_validate_page_defaults() {
        assert_eq!(validate_page(&query(None, None)).unwrap(), (1, 10));
        assert_eq!(validate_page(&query(Some(3), Some(100))).unwrap(), (3, 100));
    }

    #[test]
    fn test_validate_page_rejects_out_of_range() {
        assert!(validate_page(&query(Some(0), None)).is_err());
        assert!(validate_page(&query(Some(-2), None)).is_err());
        assert!(validate_page(&query(None, Some(0))).is_err());
        assert!(validate_page(&query(None, Some(101))).is_err());
    }
}
