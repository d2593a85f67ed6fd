use ascend::{db, seed, server};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::collections::HashSet;
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
async fn test_health_check() {
    let (app, _db) = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "ascend");
}

#[tokio::test]
async fn test_signup_creates_five_default_sectors() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "fresh@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/sectors", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sectors = read_json(response).await;
    let sectors = sectors.as_array().unwrap();
    assert_eq!(sectors.len(), 5);

    let types: HashSet<&str> = sectors
        .iter()
        .map(|s| s["sector_type"].as_str().unwrap())
        .collect();
    let expected: HashSet<&str> =
        ["health", "finance", "career", "learning", "mental_health"]
            .into_iter()
            .collect();
    assert_eq!(types, expected);
}

#[tokio::test]
async fn test_sector_crud_and_soft_delete() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "sectors@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/sectors",
            Some(&token),
            Some(json!({ "name": "Marathon Training", "sector_type": "fitness" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let sector = read_json(response).await;
    let sector_id = sector["id"].as_i64().unwrap();
    assert_eq!(sector["sector_type"], "fitness");
    assert_eq!(sector["is_active"], true);

    // Update
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/sectors/{}", sector_id),
            Some(&token),
            Some(json!({ "color": "#ff0000", "description": "Sub-4h goal" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["color"], "#ff0000");
    assert_eq!(updated["description"], "Sub-4h goal");

    // Soft delete: gone from the list, still fetchable by id
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/sectors/{}", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/sectors", Some(&token), None))
        .await
        .unwrap();
    let sectors = read_json(response).await;
    assert!(sectors
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["id"].as_i64() != Some(sector_id)));

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sector = read_json(response).await;
    assert_eq!(sector["is_active"], false);
}

#[tokio::test]
async fn test_sector_chat_returns_canned_reply() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "chat@example.com").await;
    let sector_id = first_sector_id(&app, &token).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sectors/{}/messages", sector_id),
            Some(&token),
            Some(json!({ "content": "I want to sleep better" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let reply = read_json(response).await;
    assert_eq!(reply["is_user"], false);
    assert!(reply["ai_model"].as_str().is_some());
    assert!(reply["content"]
        .as_str()
        .unwrap()
        .contains("I want to sleep better"));

    // Both sides of the exchange are in the log, oldest first
    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}/messages", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let messages = read_json(response).await;
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["is_user"], true);
    assert_eq!(messages[1]["is_user"], false);
}

#[tokio::test]
async fn test_statistics_roundtrip_and_filter() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "stats@example.com").await;
    let sector_id = first_sector_id(&app, &token).await;

    for (name, value) in [("weight", 82.5), ("weight", 82.1), ("sleep_hours", 7.5)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/sectors/{}/statistics", sector_id),
                Some(&token),
                Some(json!({ "metric_name": name, "value": value, "unit": "kg" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}/statistics", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let all = read_json(response).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}/statistics?metric_name=weight", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let weights = read_json(response).await;
    assert_eq!(weights.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_activity_tracking_records_statistic() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "activity@example.com").await;
    let sector_id = first_sector_id(&app, &token).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sectors/{}/activity", sector_id),
            Some(&token),
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}/statistics?metric_name=activity", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let stats = read_json(response).await;
    assert_eq!(stats.as_array().unwrap().len(), 1);
    assert_eq!(stats[0]["value"], 1.0);
}

#[tokio::test]
async fn test_sector_analytics() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "analytics@example.com").await;
    let sector_id = first_sector_id(&app, &token).await;

    // One chat exchange and one goal, completed
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sectors/{}/messages", sector_id),
            Some(&token),
            Some(json!({ "content": "hello" })),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/sectors/{}/goals", sector_id),
            Some(&token),
            Some(json!({ "title": "Meditate daily" })),
        ))
        .await
        .unwrap();
    let goal = read_json(response).await;
    app.clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/goals/{}/complete", goal["id"].as_i64().unwrap()),
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}/analytics?timeframe=week", sector_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let analytics = read_json(response).await;
    assert_eq!(analytics["message_count"], 2);
    assert_eq!(analytics["total_goals"], 1);
    assert_eq!(analytics["completed_goals"], 1);
    assert_eq!(analytics["progress"], 100);
    assert_eq!(analytics["activity_data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_goals_listing_across_sectors() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "goals@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/sectors", Some(&token), None))
        .await
        .unwrap();
    let sectors = read_json(response).await;
    let first = sectors[0]["id"].as_i64().unwrap();
    let second = sectors[1]["id"].as_i64().unwrap();

    for (sector_id, title) in [(first, "Drink more water"), (second, "Build an emergency fund")] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/sectors/{}/goals", sector_id),
                Some(&token),
                Some(json!({ "title": title })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/goals", Some(&token), None))
        .await
        .unwrap();
    let goals = read_json(response).await;
    assert_eq!(goals.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/sectors/{}/goals", first),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let first_goals = read_json(response).await;
    assert_eq!(first_goals.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_conversation_flow_and_cap() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "advisor@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/conversations",
            Some(&token),
            Some(json!({ "title": "Career advice" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let conversation = read_json(response).await;
    let conversation_id = conversation["id"].as_i64().unwrap();

    for (role, content) in [("user", "Should I switch teams?"), ("assistant", "What draws you to the other team?")] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/conversations/{}/messages", conversation_id),
                Some(&token),
                Some(json!({ "role": role, "content": content })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/conversations", Some(&token), None))
        .await
        .unwrap();
    let list = read_json(response).await;
    assert_eq!(list[0]["message_count"], 2);

    // Fill up to the cap of 5, then expect a conflict
    for i in 2..=5 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/conversations",
                Some(&token),
                Some(json!({ "title": format!("Conversation {}", i) })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/conversations",
            Some(&token),
            Some(json!({ "title": "One too many" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Deleting one frees a slot
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/conversations/{}", conversation_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/conversations",
            Some(&token),
            Some(json!({ "title": "Fits again" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_conversation_pinning_orders_list() {
    let (app, _db) = setup_app().await;
    let token = signup(&app, "pins@example.com").await;

    let mut ids = Vec::new();
    for title in ["First", "Second", "Third"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/conversations",
                Some(&token),
                Some(json!({ "title": title })),
            ))
            .await
            .unwrap();
        let conversation = read_json(response).await;
        ids.push(conversation["id"].as_i64().unwrap());
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/conversations/{}", ids[0]),
            Some(&token),
            Some(json!({ "is_pinned": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/conversations", Some(&token), None))
        .await
        .unwrap();
    let list = read_json(response).await;
    assert_eq!(list[0]["title"], "First");
    assert_eq!(list[0]["is_pinned"], true);
}

#[tokio::test]
async fn test_saved_news_duplicate_rules() {
    let (app, _db) = setup_app().await;
    let token_a = signup(&app, "reader-a@example.com").await;
    let token_b = signup(&app, "reader-b@example.com").await;

    let article = json!({
        "url": "https://example.com/habits",
        "title": "The science of habits",
        "source": "Example Journal",
        "category": "health"
    });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/saved-news",
            Some(&token_a),
            Some(article.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same URL, same user: conflict
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/saved-news",
            Some(&token_a),
            Some(article.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Same URL, different user: fine
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/saved-news",
            Some(&token_b),
            Some(article),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/saved-news", Some(&token_a), None))
        .await
        .unwrap();
    let saved = read_json(response).await;
    assert_eq!(saved.as_array().unwrap().len(), 1);
}
