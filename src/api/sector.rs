use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::auth::CurrentUser;
use crate::domain::ApiError;
use crate::models::{goal, message, sector, statistic, SectorType};

/// The ownership gate every child-resource handler goes through: load the
/// sector scoped to the requesting user, reporting a uniform "not found"
/// whether the row is missing or belongs to someone else.
pub(crate) async fn find_owned_sector(
    db: &DatabaseConnection,
    user_id: i32,
    sector_id: i32,
) -> Result<sector::Model, ApiError> {
    sector::Entity::find_by_id(sector_id)
        .filter(sector::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

#[derive(Deserialize)]
pub struct CreateSectorRequest {
    pub name: String,
    pub sector_type: SectorType,
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

#[derive(Deserialize)]
pub struct UpdateSectorRequest {
    pub name: Option<String>,
    pub sector_type: Option<SectorType>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

fn default_color() -> String {
    "#0df2f2".to_string()
}

fn default_icon() -> String {
    "📊".to_string()
}

#[utoipa::path(
    get,
    path = "/api/sectors",
    responses(
        (status = 200, description = "Active sectors of the current user")
    )
)]
pub async fn list_sectors(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<sector::Model>>, ApiError> {
    let sectors = sector::Entity::find()
        .filter(sector::Column::UserId.eq(user.id))
        .filter(sector::Column::IsActive.eq(true))
        .order_by_asc(sector::Column::Id)
        .all(&db)
        .await?;

    Ok(Json(sectors))
}

#[utoipa::path(
    post,
    path = "/api/sectors",
    responses(
        (status = 201, description = "Sector created"),
        (status = 400, description = "Unknown sector type")
    )
)]
pub async fn create_sector(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateSectorRequest>,
) -> Result<(StatusCode, Json<sector::Model>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name", "must not be empty"));
    }

    let new_sector = sector::ActiveModel {
        user_id: Set(user.id),
        name: Set(payload.name),
        sector_type: Set(payload.sector_type.as_str().to_owned()),
        description: Set(payload.description),
        color: Set(payload.color),
        icon: Set(payload.icon),
        is_active: Set(true),
        created_at: Set(Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let model = new_sector.insert(&db).await?;

    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn get_sector(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<sector::Model>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;
    Ok(Json(sector))
}

pub async fn update_sector(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSectorRequest>,
) -> Result<Json<sector::Model>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;

    let mut active: sector::ActiveModel = sector.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("name", "must not be empty"));
        }
        active.name = Set(name);
    }
    if let Some(sector_type) = payload.sector_type {
        active.sector_type = Set(sector_type.as_str().to_owned());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(color) = payload.color {
        active.color = Set(color);
    }
    if let Some(icon) = payload.icon {
        active.icon = Set(icon);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let model = active.update(&db).await?;
    Ok(Json(model))
}

/// Soft delete: the sector drops out of listings but its history stays.
pub async fn delete_sector(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;

    let mut active: sector::ActiveModel = sector.into();
    active.is_active = Set(false);
    active.update(&db).await?;

    Ok(Json(json!({ "message": "Sector deactivated" })))
}

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
}

fn default_timeframe() -> String {
    "week".to_string()
}

pub async fn get_analytics(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;

    let now = Utc::now();
    let start_date = match query.timeframe.as_str() {
        "week" => now - Duration::days(7),
        "month" => now - Duration::days(30),
        "year" => now - Duration::days(365),
        _ => chrono::DateTime::<Utc>::UNIX_EPOCH,
    };
    let start = start_date.to_rfc3339();

    let messages = message::Entity::find()
        .filter(message::Column::SectorId.eq(sector.id))
        .filter(message::Column::CreatedAt.gte(start.clone()))
        .all(&db)
        .await?;

    let total_goals = goal::Entity::find()
        .filter(goal::Column::SectorId.eq(sector.id))
        .count(&db)
        .await?;
    let completed_goals = goal::Entity::find()
        .filter(goal::Column::SectorId.eq(sector.id))
        .filter(goal::Column::IsCompleted.eq(true))
        .count(&db)
        .await?;

    // RFC 3339 sorts lexicographically, so the date is the first ten chars.
    let mut activity: BTreeMap<String, u64> = BTreeMap::new();
    for m in &messages {
        let day = m.created_at.chars().take(10).collect::<String>();
        *activity.entry(day).or_insert(0) += 1;
    }
    let activity_data: Vec<Value> = activity
        .into_iter()
        .map(|(date, count)| json!({ "date": date, "count": count }))
        .collect();

    let statistics = statistic::Entity::find()
        .filter(statistic::Column::SectorId.eq(sector.id))
        .filter(statistic::Column::RecordedAt.gte(start))
        .order_by_asc(statistic::Column::RecordedAt)
        .all(&db)
        .await?;

    let progress = if total_goals > 0 {
        (completed_goals * 100) / total_goals
    } else {
        0
    };

    Ok(Json(json!({
        "sector": sector,
        "message_count": messages.len(),
        "total_goals": total_goals,
        "completed_goals": completed_goals,
        "progress": progress,
        "activity_data": activity_data,
        "statistics": statistics,
        "timeframe": query.timeframe,
    })))
}
