use super::common::DateRangeParams;
use crate::{
    auth::AuthUser,
    services::dashboard::{DailyRegister, DashboardStats},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterParams {
    /// Defaults to today (UTC)
    pub date: Option<NaiveDate>,
}

async fn dashboard_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<DateRangeParams>,
) -> ApiResult<DashboardStats> {
    let today = Utc::now().date_naive();
    let stats = state
        .services
        .dashboard
        .stats(user.owner_id, today, range.from, range.to)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn daily_register(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<RegisterParams>,
) -> ApiResult<DailyRegister> {
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    let register = state
        .services
        .dashboard
        .daily_register(user.owner_id, date)
        .await?;
    Ok(Json(ApiResponse::success(register)))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/register/daily", get(daily_register))
}
