use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;

use crate::api::sector::find_owned_sector;
use crate::auth::CurrentUser;
use crate::domain::ApiError;
use crate::models::message;
use crate::services::advisor;

#[derive(Deserialize)]
pub struct MessagesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    50
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Last `limit` messages, oldest first.
pub async fn list_messages(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<message::Model>>, ApiError> {
    let sector = find_owned_sector(&db, user.id, id).await?;

    let mut messages = message::Entity::find()
        .filter(message::Column::SectorId.eq(sector.id))
        .order_by_desc(message::Column::CreatedAt)
        .limit(query.limit)
        .all(&db)
        .await?;
    messages.reverse();

    Ok(Json(messages))
}

/// Store the user's message and answer it with the canned advisor reply.
pub async fn send_message(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<message::Model>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::validation("content", "must not be empty"));
    }

    let sector = find_owned_sector(&db, user.id, id).await?;

    let user_message = message::ActiveModel {
        sector_id: Set(sector.id),
        content: Set(payload.content.clone()),
        is_user: Set(true),
        ai_model: Set(None),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    user_message.insert(&db).await?;

    let reply = advisor::sector_reply(sector.sector_type.parse().ok(), &payload.content);

    let ai_message = message::ActiveModel {
        sector_id: Set(sector.id),
        content: Set(reply),
        is_user: Set(false),
        ai_model: Set(Some(advisor::ADVISOR_MODEL.to_string())),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let ai_message = ai_message.insert(&db).await?;

    Ok((StatusCode::CREATED, Json(ai_message)))
}
