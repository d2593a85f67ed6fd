use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::sector::find_owned_sector;
use crate::auth::CurrentUser;
use crate::domain::ApiError;
use crate::models::{goal, sector, user};

/// Points credited when a goal first completes.
const GOAL_COMPLETION_POINTS: i32 = 10;

/// Goals are owned through their sector; a goal whose sector belongs to
/// someone else is reported exactly like a missing one.
async fn find_owned_goal(
    db: &DatabaseConnection,
    user_id: i32,
    goal_id: i32,
) -> Result<goal::Model, ApiError> {
    let goal = goal::Entity::find_by_id(goal_id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)?;
    find_owned_sector(db, user_id, goal.sector_id).await?;
    Ok(goal)
}

#[derive(Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    #[serde(default)]
    pub current_value: f64,
    pub unit: Option<String>,
    pub deadline: Option<String>,
}

/// Completion state is deliberately absent: the only way to complete a goal
/// is the dedicated endpoint, which keeps the transition one-way.
#[derive(Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<String>,
}

pub async fn create_goal(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<goal::Model>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("title", "must not be empty"));
    }

    let sector = find_owned_sector(&db, user.id, id).await?;

    let new_goal = goal::ActiveModel {
        sector_id: Set(sector.id),
        title: Set(payload.title),
        description: Set(payload.description),
        target_value: Set(payload.target_value),
        current_value: Set(payload.current_value),
        unit: Set(payload.unit),
        deadline: Set(payload.deadline),
        is_completed: Set(false),
        completed_at: Set(None),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let model = new_goal.insert(&db).await?;

    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn list_sector_goals(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Vec<goal::Model>>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;

    let goals = goal::Entity::find()
        .filter(goal::Column::SectorId.eq(sector.id))
        .order_by_asc(goal::Column::Id)
        .all(&db)
        .await?;

    Ok(Json(goals))
}

/// All goals across the user's sectors, soft-deleted sectors included.
pub async fn list_goals(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<goal::Model>>, ApiError> {
    let sector_ids: Vec<i32> = sector::Entity::find()
        .filter(sector::Column::UserId.eq(user.id))
        .all(&db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    if sector_ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let goals = goal::Entity::find()
        .filter(goal::Column::SectorId.is_in(sector_ids))
        .order_by_asc(goal::Column::Id)
        .all(&db)
        .await?;

    Ok(Json(goals))
}

pub async fn update_goal(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateGoalRequest>,
) -> Result<Json<goal::Model>, ApiError> {
    let goal = find_owned_goal(&db, user.id, id).await?;

    let mut active: goal::ActiveModel = goal.into();
    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title", "must not be empty"));
        }
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(target_value) = payload.target_value {
        active.target_value = Set(Some(target_value));
    }
    if let Some(current_value) = payload.current_value {
        active.current_value = Set(current_value);
    }
    if let Some(unit) = payload.unit {
        active.unit = Set(Some(unit));
    }
    if let Some(deadline) = payload.deadline {
        active.deadline = Set(Some(deadline));
    }

    let model = active.update(&db).await?;
    Ok(Json(model))
}

/// Mark a goal completed and credit points for the first transition only.
///
/// The guard is the conditional UPDATE: two concurrent calls race to flip
/// `is_completed`, exactly one sees a changed row, and only that one credits
/// points — repeated calls succeed with nothing earned.
pub async fn complete_goal(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let goal = find_owned_goal(&db, user.id, id).await?;

    let result = goal::Entity::update_many()
        .col_expr(goal::Column::IsCompleted, Expr::value(true))
        .col_expr(
            goal::Column::CompletedAt,
            Expr::value(Some(chrono::Utc::now().to_rfc3339())),
        )
        .filter(goal::Column::Id.eq(goal.id))
        .filter(goal::Column::IsCompleted.eq(false))
        .exec(&db)
        .await?;

    let points_earned = if result.rows_affected == 1 {
        user::Entity::update_many()
            .col_expr(
                user::Column::TotalPoints,
                Expr::col(user::Column::TotalPoints).add(GOAL_COMPLETION_POINTS),
            )
            .filter(user::Column::Id.eq(user.id))
            .exec(&db)
            .await?;
        GOAL_COMPLETION_POINTS
    } else {
        0
    };

    Ok(Json(json!({
        "success": true,
        "points_earned": points_earned,
    })))
}

pub async fn delete_goal(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let goal = find_owned_goal(&db, user.id, id).await?;

    goal::Entity::delete_by_id(goal.id).exec(&db).await?;

    Ok(Json(json!({ "message": "Goal deleted" })))
}
