use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use daily_planner::api::{create_router, AppState};
use daily_planner::client::{ClientError, PlannerClient, TASKS_PATH};
use daily_planner::models::{NewTask, TaskFilter};
use daily_planner::{Database, PlannerStore, SessionStore};

async fn spawn_server() -> (String, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
    let state = AppState::new(db.clone(), db.clone(), "planner.sid");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.expect("server");
    });
    (format!("http://{addr}"), db)
}

fn token(db: &Database, user: &str) -> String {
    db.create_session(user, Duration::from_secs(3600))
        .expect("session")
        .token
}

#[tokio::test]
async fn reads_are_cached_until_a_write_invalidates_them() {
    let (base, db) = spawn_server().await;
    let client = PlannerClient::new(&base, &token(&db, "alice"));

    assert!(client.list_tasks(&TaskFilter::default()).await.unwrap().is_empty());
    assert_eq!(client.cache().len(), 1);

    let created = client
        .create_task(&NewTask::new("2026-03-10", "Write report"))
        .await
        .unwrap();
    assert!(!created.completed);
    assert!(client.cache().is_empty());

    let tasks = client.list_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks.len(), 1);

    let toggled = client.toggle_task(&tasks[0]).await.unwrap();
    assert!(toggled.completed);
    assert!(client.cache().get::<serde_json::Value>(TASKS_PATH).is_none());

    let ranged = client
        .list_tasks(&TaskFilter::between("2026-03-11", "2026-03-31"))
        .await
        .unwrap();
    assert!(ranged.is_empty());

    client.delete_task(created.id).await.unwrap();
    assert!(matches!(
        client.delete_task(created.id).await,
        Err(ClientError::NotFound)
    ));
}

#[tokio::test]
async fn notes_rules_and_goals_round_trip() {
    let (base, db) = spawn_server().await;
    let client = PlannerClient::new(&base, &token(&db, "alice"));

    assert!(client.get_note("2026-03-10").await.unwrap().is_none());
    client.save_note("2026-03-10", "first").await.unwrap();
    client.save_note("2026-03-10", "second").await.unwrap();
    let note = client.get_note("2026-03-10").await.unwrap().unwrap();
    assert_eq!(note.content, "second");

    let rule = client.create_rule("Walk daily").await.unwrap();
    assert_eq!(client.list_rules().await.unwrap().len(), 1);
    client.delete_rule(rule.id).await.unwrap();
    assert!(client.list_rules().await.unwrap().is_empty());

    client.save_month_goal("2026-03", "Run 50km").await.unwrap();
    let goal = client.get_month_goal("2026-03").await.unwrap().unwrap();
    assert_eq!(goal.content, "Run 50km");

    let me = client.current_user().await.unwrap();
    assert_eq!(me.id, "alice");
}

#[tokio::test]
async fn invalid_input_is_rejected_before_sending() {
    let (base, db) = spawn_server().await;
    let client = PlannerClient::new(&base, &token(&db, "alice"));

    match client.create_task(&NewTask::new("2026-03-10", "   ")).await {
        Err(ClientError::Validation { field, .. }) => assert_eq!(field, "content"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(db.list_tasks("alice", &TaskFilter::default()).unwrap().is_empty());
}

#[tokio::test]
async fn foreign_rows_and_bad_tokens_surface_as_errors() {
    let (base, db) = spawn_server().await;
    let alice = PlannerClient::new(&base, &token(&db, "alice"));
    let bob = PlannerClient::new(&base, &token(&db, "bob"));

    let task = alice
        .create_task(&NewTask::new("2026-03-10", "mine"))
        .await
        .unwrap();
    assert!(matches!(bob.delete_task(task.id).await, Err(ClientError::Forbidden)));

    let stranger = PlannerClient::new(&base, "nope");
    assert!(matches!(
        stranger.list_rules().await,
        Err(ClientError::Unauthorized)
    ));
}

async fn spawn_stub(status: StatusCode, body: serde_json::Value) -> String {
    let app: Router = Router::new().fallback(move || {
        let body = body.clone();
        async move { (status, Json(body)) }
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn server_validation_messages_reach_the_caller() {
    let base = spawn_stub(
        StatusCode::BAD_REQUEST,
        json!({"message": "Date is outside the planner", "field": "date"}),
    )
    .await;
    let client = PlannerClient::new(&base, "t");

    let err = client.create_rule("Walk daily").await.unwrap_err();
    match &err {
        ClientError::Validation { field, message } => {
            assert_eq!(field, "date");
            assert_eq!(message, "Date is outside the planner");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(err.notification("Failed to save rule"), "Date is outside the planner");
}

#[tokio::test]
async fn other_server_failures_get_the_fallback_text() {
    let base = spawn_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"message": "Internal server error"}),
    )
    .await;
    let client = PlannerClient::new(&base, "t");

    let err = client.list_rules().await.unwrap_err();
    assert!(matches!(err, ClientError::Status(500)));
    assert_eq!(err.notification("Failed to fetch rules"), "Failed to fetch rules");
}

#[tokio::test]
async fn server_rejections_carry_message_and_field() {
    let (base, db) = spawn_server().await;
    let http = reqwest::Client::new();
    let token = token(&db, "alice");

    let response = http
        .post(format!("{base}/api/rules"))
        .bearer_auth(&token)
        .json(&json!({"content": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["field"], "content");
    assert!(body["message"].as_str().is_some());

    let response = http
        .get(format!("{base}/api/tasks?start=2026-03-01&start=2026-03-02&end=2026-03-31"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["field"], "query");
}
