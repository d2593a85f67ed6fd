use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::sector::find_owned_sector;
use crate::auth::CurrentUser;
use crate::domain::ApiError;
use crate::models::statistic;

#[derive(Deserialize)]
pub struct AddStatisticRequest {
    pub metric_name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub recorded_at: Option<String>,
    pub extra_data: Option<Value>,
}

#[derive(Deserialize)]
pub struct StatisticsQuery {
    pub metric_name: Option<String>,
}

/// Loose body for the lightweight activity tracker; everything is optional.
#[derive(Deserialize)]
pub struct TrackActivityRequest {
    pub metric_name: Option<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub extra_data: Option<Value>,
}

pub async fn add_statistic(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<AddStatisticRequest>,
) -> Result<(StatusCode, Json<statistic::Model>), ApiError> {
    if payload.metric_name.trim().is_empty() {
        return Err(ApiError::validation("metric_name", "must not be empty"));
    }

    let sector = find_owned_sector(&db, user.id, id).await?;

    let extra_data = payload
        .extra_data
        .map(|v| serde_json::to_string(&v).unwrap_or_default());

    let new_stat = statistic::ActiveModel {
        sector_id: Set(sector.id),
        metric_name: Set(payload.metric_name),
        value: Set(payload.value),
        unit: Set(payload.unit),
        recorded_at: Set(payload
            .recorded_at
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339())),
        extra_data: Set(extra_data),
        ..Default::default()
    };
    let model = new_stat.insert(&db).await?;

    Ok((StatusCode::CREATED, Json(model)))
}

/// Newest first, optionally narrowed to one metric.
pub async fn list_statistics(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Vec<statistic::Model>>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;

    let mut find = statistic::Entity::find()
        .filter(statistic::Column::SectorId.eq(sector.id));
    if let Some(metric_name) = query.metric_name {
        find = find.filter(statistic::Column::MetricName.eq(metric_name));
    }

    let stats = find
        .order_by_desc(statistic::Column::RecordedAt)
        .all(&db)
        .await?;

    Ok(Json(stats))
}

pub async fn track_activity(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<TrackActivityRequest>,
) -> Result<Json<Value>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;

    let extra_data = payload
        .extra_data
        .map(|v| serde_json::to_string(&v).unwrap_or_default());

    let stat = statistic::ActiveModel {
        sector_id: Set(sector.id),
        metric_name: Set(payload
            .metric_name
            .unwrap_or_else(|| "activity".to_string())),
        value: Set(payload.value.unwrap_or(1.0)),
        unit: Set(payload.unit),
        recorded_at: Set(chrono::Utc::now().to_rfc3339()),
        extra_data: Set(extra_data),
        ..Default::default()
    };
    stat.insert(&db).await?;

    Ok(Json(json!({ "success": true, "message": "Activity tracked" })))
}
