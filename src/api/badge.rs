use axum::{extract::State, Json};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::auth::CurrentUser;
use crate::domain::ApiError;
use crate::models::user_badge::UserBadgeDto;
use crate::models::{badge, user_badge};
use crate::services::progress;

#[utoipa::path(
    get,
    path = "/api/badges",
    responses(
        (status = 200, description = "Full badge catalog")
    )
)]
pub async fn list_badges(
    State(db): State<DatabaseConnection>,
) -> Result<Json<Vec<badge::Model>>, ApiError> {
    let badges = badge::Entity::find()
        .order_by_asc(badge::Column::Id)
        .all(&db)
        .await?;
    Ok(Json(badges))
}

pub async fn get_user_badges(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<UserBadgeDto>>, ApiError> {
    let earned = user_badge::Entity::find()
        .filter(user_badge::Column::UserId.eq(user.id))
        .find_also_related(badge::Entity)
        .all(&db)
        .await?;

    let out: Vec<UserBadgeDto> = earned
        .into_iter()
        .filter_map(|(ub, badge)| {
            badge.map(|badge| UserBadgeDto {
                id: ub.id,
                user_id: ub.user_id,
                badge_id: ub.badge_id,
                earned_at: ub.earned_at,
                badge,
            })
        })
        .collect();

    Ok(Json(out))
}

/// Recompute badge metrics, award anything newly qualified, and report
/// per-badge progress. Nothing computed here is persisted except the awards.
pub async fn check_progress(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let metrics = progress::collect_metrics(&db, &user).await?;
    let newly_earned = progress::award_earned(&db, user.id, &metrics).await?;

    let earned_ids: HashSet<i32> = user_badge::Entity::find()
        .filter(user_badge::Column::UserId.eq(user.id))
        .all(&db)
        .await?
        .into_iter()
        .map(|ub| ub.badge_id)
        .collect();

    let catalog = badge::Entity::find()
        .order_by_asc(badge::Column::Id)
        .all(&db)
        .await?;

    let badges: Vec<Value> = catalog
        .into_iter()
        .map(|b| {
            let earned = earned_ids.contains(&b.id);
            let fraction = match progress::parse_criteria(&b.criteria) {
                Some((metric, threshold)) if threshold > 0 => metrics
                    .value(metric)
                    .map(|v| (v as f64 / threshold as f64).min(1.0))
                    .unwrap_or(0.0),
                _ => 0.0,
            };
            json!({
                "badge": b,
                "earned": earned,
                "progress": if earned { 1.0 } else { fraction },
            })
        })
        .collect();

    Ok(Json(json!({
        "metrics": metrics,
        "badges": badges,
        "newly_earned": newly_earned,
    })))
}
