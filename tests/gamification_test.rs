//! Streak, points and badge behavior.

use ascend::models::user;
use ascend::{db, seed, server};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn setup_app() -> (Router, DatabaseConnection) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    seed::seed_badges(&db).await.expect("Failed to seed badges");
    (server::build_router(db.clone()), db)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn signup(app: &Router, email: &str) -> String {
    let payload = json!({
        "email": email,
        "password": "super_secret_password",
        "full_name": "Test User"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/signup", None, Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    body["access_token"].as_str().unwrap().to_string()
}

async fn login(app: &Router, email: &str) -> Value {
    let payload = json!({ "email": email, "password": "super_secret_password" });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/login", None, Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

/// Rewrite the user's last-activity timestamp, as if the last login had
/// happened `days` days ago.
async fn backdate_activity(db: &DatabaseConnection, email: &str, days: i64) {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .expect("query failed")
        .expect("user not found");
    let mut active: user::ActiveModel = user.into();
    active.updated_at = Set((Utc::now() - Duration::days(days)).to_rfc3339());
    active.update(db).await.expect("backdate failed");
}

async fn first_sector_id(app: &Router, token: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/sectors", Some(token), None))
        .await
        .unwrap();
    let sectors = read_json(response).await;
    sectors[0]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_streak_same_day_unchanged() {
    let (app, _db) = setup_app().await;
    signup(&app, "streak0@example.com").await;

    let body = login(&app, "streak0@example.com").await;
    assert_eq!(body["user"]["streak_days"], 1);
}

#[tokio::test]
async fn test_streak_increments_after_one_day() {
    let (app, db) = setup_app().await;
    signup(&app, "streak1@example.com").await;
    backdate_activity(&db, "streak1@example.com", 1).await;

    let body = login(&app, "streak1@example.com").await;
    assert_eq!(body["user"]["streak_days"], 2);
}

#[tokio::test]
async fn test_streak_resets_after_gap() {
    let (app, db) = setup_app().await;
    signup(&app, "streak3@example.com").await;
    backdate_activity(&db, "streak3@example.com", 1).await;
    login(&app, "streak3@example.com").await; // streak 2
    backdate_activity(&db, "streak3@example.com", 3).await;

    let body = login(&app, "streak3@example.com").await;
    assert_eq!(body["user"]["streak_days"], 1);
}

#[tokio::test]
async fn test_goal_completion_awards_points_once() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "points@example.com").await;
    let sector_id = first_sector_id(&app, &token).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sectors/{}/goals", sector_id),
            Some(&token),
            Some(json!({ "title": "Read 12 books", "target_value": 12.0, "unit": "books" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let goal = read_json(response).await;
    let goal_id = goal["id"].as_i64().unwrap();
    assert_eq!(goal["is_completed"], false);

    // First completion pays out
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/goals/{}/complete", goal_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["points_earned"], 10);

    // Second completion succeeds but pays nothing
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/goals/{}/complete", goal_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["points_earned"], 0);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/users/me", Some(&token), None))
        .await
        .unwrap();
    let me = read_json(response).await;
    assert_eq!(me["total_points"], 10);

    // And the goal stays completed
    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}/goals", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let goals = read_json(response).await;
    assert_eq!(goals[0]["is_completed"], true);
    assert!(goals[0]["completed_at"].as_str().is_some());
}

#[tokio::test]
async fn test_badge_catalog_seeded() {
    let (app, _db) = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/badges", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let badges = read_json(response).await;
    let badges = badges.as_array().unwrap();
    assert_eq!(badges.len(), 7);
    assert!(badges.iter().any(|b| b["name"] == "First Step"));
    assert!(badges.iter().any(|b| b["badge_type"] == "gold"));
}

#[tokio::test]
async fn test_check_progress_awards_badge_once() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "badges@example.com").await;

    // The five default sectors already satisfy "First Step"
    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/badges/check-progress",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["metrics"]["sectors_created"], 5);
    let newly: Vec<&str> = body["newly_earned"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert!(newly.contains(&"First Step"));

    // Second call awards nothing new
    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/badges/check-progress",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["newly_earned"].as_array().unwrap().len(), 0);

    // Badge points were credited exactly once (First Step is worth 10)
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/users/me", Some(&token), None))
        .await
        .unwrap();
    let me = read_json(response).await;
    assert_eq!(me["total_points"], 10);

    // The earned badge shows up with its catalog entry embedded
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/users/me/badges", Some(&token), None))
        .await
        .unwrap();
    let earned = read_json(response).await;
    assert_eq!(earned.as_array().unwrap().len(), 1);
    assert_eq!(earned[0]["badge"]["name"], "First Step");
}

#[tokio::test]
async fn test_deep_conversation_badge() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "thinker@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/conversations",
            Some(&token),
            Some(json!({ "title": "Life direction" })),
        ))
        .await
        .unwrap();
    let conversation = read_json(response).await;
    let conversation_id = conversation["id"].as_i64().unwrap();

    for i in 0..5 {
        let role = if i % 2 == 0 { "user" } else { "assistant" };
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/conversations/{}/messages", conversation_id),
                Some(&token),
                Some(json!({ "role": role, "content": format!("message {}", i) })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/badges/check-progress",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["metrics"]["conversations_deep"], 1);
    let newly: Vec<&str> = body["newly_earned"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert!(newly.contains(&"Deep Thinker"));
}

#[tokio::test]
async fn test_goal_setter_progress_fraction() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "setter@example.com").await;
    let sector_id = first_sector_id(&app, &token).await;

    // 2 of the 5 goals "Goal Setter" wants
    for title in ["Goal one", "Goal two"] {
        app.clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/sectors/{}/goals", sector_id),
                Some(&token),
                Some(json!({ "title": title })),
            ))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/badges/check-progress",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = read_json(response).await;
    let entry = body["badges"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["badge"]["name"] == "Goal Setter")
        .unwrap();
    assert_eq!(entry["earned"], false);
    let progress = entry["progress"].as_f64().unwrap();
    assert!((progress - 0.4).abs() < 1e-9);
}
