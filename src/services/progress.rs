//! Badge progress aggregation and awarding.
//!
//! Nothing here is persisted except the award itself: metrics are recomputed
//! from the live tables on every request, and the UNIQUE(user_id, badge_id)
//! constraint keeps an award single-shot under concurrent requests.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use serde::Serialize;
use std::collections::HashSet;

use crate::domain::ApiError;
use crate::models::{badge, conversation, conversation_message, goal, sector, user, user_badge};

/// Messages a conversation needs before it counts as "deep".
const DEEP_CONVERSATION_THRESHOLD: u64 = 5;

#[derive(Debug, Serialize)]
pub struct BadgeMetrics {
    pub sectors_created: i64,
    pub goals_created: i64,
    pub goals_completed: i64,
    pub streak_days: i64,
    pub conversations_deep: i64,
    pub human_level: i64,
}

impl BadgeMetrics {
    /// Resolve a criteria metric key to its current value.
    pub fn value(&self, key: &str) -> Option<i64> {
        match key {
            "sectors_created" => Some(self.sectors_created),
            "goals_created" => Some(self.goals_created),
            "goals_completed" => Some(self.goals_completed),
            "streak_days" => Some(self.streak_days),
            "conversations_deep" => Some(self.conversations_deep),
            "human_level" => Some(self.human_level),
            _ => None,
        }
    }
}

/// Parse a "metric:threshold" criteria string.
pub fn parse_criteria(criteria: &str) -> Option<(&str, i64)> {
    let (metric, threshold) = criteria.split_once(':')?;
    threshold.parse().ok().map(|t| (metric, t))
}

pub async fn collect_metrics(
    db: &DatabaseConnection,
    current: &user::Model,
) -> Result<BadgeMetrics, ApiError> {
    let sectors = sector::Entity::find()
        .filter(sector::Column::UserId.eq(current.id))
        .all(db)
        .await?;
    let sector_ids: Vec<i32> = sectors.iter().map(|s| s.id).collect();

    let (goals_created, goals_completed) = if sector_ids.is_empty() {
        (0, 0)
    } else {
        let created = goal::Entity::find()
            .filter(goal::Column::SectorId.is_in(sector_ids.clone()))
            .count(db)
            .await?;
        let completed = goal::Entity::find()
            .filter(goal::Column::SectorId.is_in(sector_ids))
            .filter(goal::Column::IsCompleted.eq(true))
            .count(db)
            .await?;
        (created as i64, completed as i64)
    };

    // The 5-conversation cap keeps this loop trivially small.
    let conversations = conversation::Entity::find()
        .filter(conversation::Column::UserId.eq(current.id))
        .all(db)
        .await?;
    let mut conversations_deep = 0;
    for conv in &conversations {
        let count = conversation_message::Entity::find()
            .filter(conversation_message::Column::ConversationId.eq(conv.id))
            .count(db)
            .await?;
        if count >= DEEP_CONVERSATION_THRESHOLD {
            conversations_deep += 1;
        }
    }

    Ok(BadgeMetrics {
        sectors_created: sectors.len() as i64,
        goals_created,
        goals_completed,
        streak_days: current.streak_days as i64,
        conversations_deep,
        human_level: current.human_level as i64,
    })
}

/// Award every catalog badge whose criteria the metrics now satisfy.
///
/// Returns the newly earned badges. Each award credits the badge's point
/// value exactly once; a concurrent duplicate insert is swallowed and
/// credits nothing.
pub async fn award_earned(
    db: &DatabaseConnection,
    user_id: i32,
    metrics: &BadgeMetrics,
) -> Result<Vec<badge::Model>, ApiError> {
    let catalog = badge::Entity::find().all(db).await?;

    let earned: HashSet<i32> = user_badge::Entity::find()
        .filter(user_badge::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|ub| ub.badge_id)
        .collect();

    let mut newly_earned = Vec::new();

    for badge in catalog {
        if earned.contains(&badge.id) {
            continue;
        }
        let Some((metric, threshold)) = parse_criteria(&badge.criteria) else {
            tracing::warn!("badge '{}' has unparseable criteria", badge.name);
            continue;
        };
        let Some(value) = metrics.value(metric) else {
            tracing::warn!("badge '{}' references unknown metric '{}'", badge.name, metric);
            continue;
        };
        if value < threshold {
            continue;
        }

        let award = user_badge::ActiveModel {
            user_id: Set(user_id),
            badge_id: Set(badge.id),
            earned_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };
        let insert = user_badge::Entity::insert(award)
            .on_conflict(
                OnConflict::columns([user_badge::Column::UserId, user_badge::Column::BadgeId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;

        match insert {
            Ok(_) => {
                if badge.points_value > 0 {
                    user::Entity::update_many()
                        .col_expr(
                            user::Column::TotalPoints,
                            Expr::col(user::Column::TotalPoints).add(badge.points_value),
                        )
                        .filter(user::Column::Id.eq(user_id))
                        .exec(db)
                        .await?;
                }
                tracing::info!("user {} earned badge '{}'", user_id, badge.name);
                newly_earned.push(badge);
            }
            // Another request got there first; it also took the points.
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(newly_earned)
}
