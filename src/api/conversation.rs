use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::domain::ApiError;
use crate::models::conversation::ConversationListDto;
use crate::models::{conversation, conversation_message, MessageRole};

/// Hard cap on advisor conversations per user.
const MAX_CONVERSATIONS_PER_USER: u64 = 5;

async fn find_owned_conversation(
    db: &DatabaseConnection,
    user_id: i32,
    conversation_id: i32,
) -> Result<conversation::Model, ApiError> {
    conversation::Entity::find_by_id(conversation_id)
        .filter(conversation::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    pub is_pinned: Option<bool>,
}

#[derive(Deserialize)]
pub struct AddConversationMessageRequest {
    pub role: MessageRole,
    pub content: String,
    pub model_used: Option<String>,
}

/// Pinned conversations first, then the most recently active.
pub async fn list_conversations(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ConversationListDto>>, ApiError> {
    let conversations = conversation::Entity::find()
        .filter(conversation::Column::UserId.eq(user.id))
        .order_by_desc(conversation::Column::IsPinned)
        .order_by_desc(conversation::Column::UpdatedAt)
        .all(&db)
        .await?;

    let mut out = Vec::with_capacity(conversations.len());
    for conv in conversations {
        let message_count = conversation_message::Entity::find()
            .filter(conversation_message::Column::ConversationId.eq(conv.id))
            .count(&db)
            .await?;
        out.push(ConversationListDto {
            id: conv.id,
            title: conv.title,
            is_pinned: conv.is_pinned,
            created_at: conv.created_at,
            updated_at: conv.updated_at,
            message_count,
        });
    }

    Ok(Json(out))
}

pub async fn create_conversation(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<conversation::Model>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("title", "must not be empty"));
    }

    let count = conversation::Entity::find()
        .filter(conversation::Column::UserId.eq(user.id))
        .count(&db)
        .await?;
    if count >= MAX_CONVERSATIONS_PER_USER {
        return Err(ApiError::Conflict(format!(
            "Conversation limit reached ({} max)",
            MAX_CONVERSATIONS_PER_USER
        )));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_conversation = conversation::ActiveModel {
        user_id: Set(user.id),
        title: Set(payload.title),
        is_pinned: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_conversation.insert(&db).await?;

    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn get_conversation(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<conversation::Model>, ApiError> {
    let conversation = find_owned_conversation(&db, user.id, id).await?;
    Ok(Json(conversation))
}

pub async fn update_conversation(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateConversationRequest>,
) -> Result<Json<conversation::Model>, ApiError> {
    let conversation = find_owned_conversation(&db, user.id, id).await?;

    let mut active: conversation::ActiveModel = conversation.into();
    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title", "must not be empty"));
        }
        active.title = Set(title);
    }
    if let Some(is_pinned) = payload.is_pinned {
        active.is_pinned = Set(is_pinned);
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let model = active.update(&db).await?;
    Ok(Json(model))
}

/// Child messages go first; no ORM cascade is relied on.
pub async fn delete_conversation(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let conversation = find_owned_conversation(&db, user.id, id).await?;

    conversation_message::Entity::delete_many()
        .filter(conversation_message::Column::ConversationId.eq(conversation.id))
        .exec(&db)
        .await?;
    conversation::Entity::delete_by_id(conversation.id)
        .exec(&db)
        .await?;

    Ok(Json(json!({ "message": "Conversation deleted" })))
}

pub async fn list_messages(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Vec<conversation_message::Model>>, ApiError> {
    let conversation = find_owned_conversation(&db, user.id, id).await?;

    let messages = conversation_message::Entity::find()
        .filter(conversation_message::Column::ConversationId.eq(conversation.id))
        .order_by_asc(conversation_message::Column::CreatedAt)
        .all(&db)
        .await?;

    Ok(Json(messages))
}

pub async fn add_message(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<AddConversationMessageRequest>,
) -> Result<(StatusCode, Json<conversation_message::Model>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::validation("content", "must not be empty"));
    }

    let conversation = find_owned_conversation(&db, user.id, id).await?;

    let new_message = conversation_message::ActiveModel {
        conversation_id: Set(conversation.id),
        role: Set(payload.role.as_str().to_owned()),
        content: Set(payload.content),
        model_used: Set(payload.model_used),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let model = new_message.insert(&db).await?;

    // Appending counts as activity for the recency ordering.
    let mut active: conversation::ActiveModel = conversation.into();
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    active.update(&db).await?;

    Ok((StatusCode::CREATED, Json(model)))
}
