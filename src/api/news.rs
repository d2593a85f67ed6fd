use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::domain::ApiError;
use crate::models::saved_news;

#[derive(Deserialize)]
pub struct SaveNewsRequest {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub source: Option<String>,
    pub published_at: Option<String>,
    pub category: Option<String>,
}

pub async fn list_saved_news(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<saved_news::Model>>, ApiError> {
    let articles = saved_news::Entity::find()
        .filter(saved_news::Column::UserId.eq(user.id))
        .order_by_desc(saved_news::Column::SavedAt)
        .all(&db)
        .await?;

    Ok(Json(articles))
}

/// Saving is per-user idempotent-rejecting: the same URL saved twice by one
/// user is a conflict, while another user saving it is unaffected. The
/// UNIQUE(user_id, url) constraint decides, so a concurrent double-save
/// cannot slip through between check and insert.
pub async fn save_news(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SaveNewsRequest>,
) -> Result<(StatusCode, Json<saved_news::Model>), ApiError> {
    if payload.url.trim().is_empty() {
        return Err(ApiError::validation("url", "must not be empty"));
    }
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("title", "must not be empty"));
    }

    let article = saved_news::ActiveModel {
        user_id: Set(user.id),
        url: Set(payload.url),
        title: Set(payload.title),
        description: Set(payload.description),
        image: Set(payload.image),
        source: Set(payload.source),
        published_at: Set(payload.published_at),
        category: Set(payload.category),
        saved_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    let insert = saved_news::Entity::insert(article)
        .on_conflict(
            OnConflict::columns([saved_news::Column::UserId, saved_news::Column::Url])
                .do_nothing()
                .to_owned(),
        )
        .exec(&db)
        .await;

    let inserted_id = match insert {
        Ok(res) => res.last_insert_id,
        Err(DbErr::RecordNotInserted) => {
            return Err(ApiError::Conflict("Article already saved".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let model = saved_news::Entity::find_by_id(inserted_id)
        .one(&db)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn delete_saved_news(
    State(db): State<DatabaseConnection>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let article = saved_news::Entity::find_by_id(id)
        .filter(saved_news::Column::UserId.eq(user.id))
        .one(&db)
        .await?
        .ok_or(ApiError::NotFound)?;

    saved_news::Entity::delete_by_id(article.id).exec(&db).await?;

    Ok(Json(json!({ "message": "Article removed" })))
}
