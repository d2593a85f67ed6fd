pub mod auth;
pub mod badge;
pub mod conversation;
pub mod goal;
pub mod health;
pub mod message;
pub mod news;
pub mod sector;
pub mod statistic;
pub mod user;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;

pub fn api_router(db: DatabaseConnection) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/users/me", get(user::get_me))
        .route("/users/me/badges", get(badge::get_user_badges))
        // Sectors
        .route(
            "/sectors",
            get(sector::list_sectors).post(sector::create_sector),
        )
        .route(
            "/sectors/:id",
            get(sector::get_sector)
                .put(sector::update_sector)
                .delete(sector::delete_sector),
        )
        .route("/sectors/:id/analytics", get(sector::get_analytics))
        // Sector chat
        .route(
            "/sectors/:id/messages",
            get(message::list_messages).post(message::send_message),
        )
        // Goals
        .route(
            "/sectors/:id/goals",
            get(goal::list_sector_goals).post(goal::create_goal),
        )
        .route("/goals", get(goal::list_goals))
        .route(
            "/goals/:id",
            put(goal::update_goal).delete(goal::delete_goal),
        )
        .route("/goals/:id/complete", put(goal::complete_goal))
        // Statistics
        .route(
            "/sectors/:id/statistics",
            get(statistic::list_statistics).post(statistic::add_statistic),
        )
        .route("/sectors/:id/activity", post(statistic::track_activity))
        // Conversations
        .route(
            "/conversations",
            get(conversation::list_conversations).post(conversation::create_conversation),
        )
        .route(
            "/conversations/:id",
            get(conversation::get_conversation)
                .put(conversation::update_conversation)
                .delete(conversation::delete_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(conversation::list_messages).post(conversation::add_message),
        )
        // Badges
        .route("/badges", get(badge::list_badges))
        .route("/badges/check-progress", get(badge::check_progress))
        // Saved news
        .route(
            "/saved-news",
            get(news::list_saved_news).post(news::save_news),
        )
        .route("/saved-news/:id", delete(news::delete_saved_news))
        .with_state(db)
}
