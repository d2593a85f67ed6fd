use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::auth::{create_jwt, hash_password, verify_password};
use crate::domain::ApiError;
use crate::models::{sector, user, SectorType, UserDto};
use crate::services::streak;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserDto,
}

struct DefaultSector {
    name: &'static str,
    sector_type: SectorType,
    description: &'static str,
    color: &'static str,
    icon: &'static str,
}

/// Every account starts with these five sectors.
const DEFAULT_SECTORS: [DefaultSector; 5] = [
    DefaultSector {
        name: "Health & Wellness",
        sector_type: SectorType::Health,
        description: "Track your physical health, nutrition, and wellness journey",
        color: "#10b981",
        icon: "💪",
    },
    DefaultSector {
        name: "Financial Growth",
        sector_type: SectorType::Finance,
        description: "Manage your finances, savings, and investments",
        color: "#f59e0b",
        icon: "💰",
    },
    DefaultSector {
        name: "Career Development",
        sector_type: SectorType::Career,
        description: "Advance your professional skills and career goals",
        color: "#8b5cf6",
        icon: "🚀",
    },
    DefaultSector {
        name: "Learning & Growth",
        sector_type: SectorType::Learning,
        description: "Expand your knowledge and learn new skills",
        color: "#06b6d4",
        icon: "📚",
    },
    DefaultSector {
        name: "Mental Wellness",
        sector_type: SectorType::MentalHealth,
        description: "Focus on mental health, mindfulness, and self-care",
        color: "#ec4899",
        icon: "🧘",
    },
];

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    responses(
        (status = 201, description = "Account created, token returned"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    if !payload.email.contains('@') {
        return Err(ApiError::validation("email", "must be a valid email address"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "password",
            "must be at least 8 characters",
        ));
    }
    if payload.full_name.trim().is_empty() {
        return Err(ApiError::validation("full_name", "must not be empty"));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash =
        hash_password(&payload.password).map_err(ApiError::Database)?;
    let now = chrono::Utc::now().to_rfc3339();

    let new_user = user::ActiveModel {
        email: Set(payload.email),
        full_name: Set(payload.full_name),
        password_hash: Set(password_hash),
        human_level: Set(1),
        total_points: Set(0),
        streak_days: Set(1),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };
    let new_user = new_user.insert(&db).await?;

    let default_sectors: Vec<sector::ActiveModel> = DEFAULT_SECTORS
        .iter()
        .map(|d| sector::ActiveModel {
            user_id: Set(new_user.id),
            name: Set(d.name.to_owned()),
            sector_type: Set(d.sector_type.as_str().to_owned()),
            description: Set(Some(d.description.to_owned())),
            color: Set(d.color.to_owned()),
            icon: Set(d.icon.to_owned()),
            is_active: Set(true),
            created_at: Set(now.clone()),
            ..Default::default()
        })
        .collect();
    sector::Entity::insert_many(default_sectors).exec(&db).await?;

    tracing::info!("new account created: user {}", new_user.id);

    let token = create_jwt(new_user.id).map_err(ApiError::Database)?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            user: new_user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    responses(
        (status = 200, description = "Token returned"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&payload.email))
        .one(&db)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        _ => {
            tracing::warn!("failed login attempt for user {}", user.id);
            return Err(ApiError::Unauthorized);
        }
    }

    // updated_at doubles as the last-activity timestamp the streak runs on.
    let now = chrono::Utc::now();
    let last_activity = chrono::DateTime::parse_from_rfc3339(&user.updated_at)
        .ok()
        .map(|dt| dt.date_naive());
    let new_streak = streak::next_streak(last_activity, now.date_naive(), user.streak_days);

    let mut active: user::ActiveModel = user.into();
    active.streak_days = Set(new_streak);
    active.updated_at = Set(now.to_rfc3339());
    let user = active.update(&db).await?;

    let token = create_jwt(user.id).map_err(ApiError::Database)?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: user.into(),
    }))
}
