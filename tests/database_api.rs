//! Database routes and the response envelope, end to end.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use db_gateway::database::{Backends, Engine};

mod common;
use common::{json_body, spawn_gateway, test_config, MemoryAdmin, UnreachableAdmin};

fn assert_success(body: &Value, action: &str, message: &str) {
    assert_eq!(body["error"], json!(false), "{body}");
    assert!(!body["data"].is_null(), "{body}");
    assert_eq!(body["action"], json!(action));
    assert_eq!(body["message"], json!(message));
    assert!(body["timestamp"].is_string());
    assert!(body["action_duration"].as_u64().is_some());
}

fn assert_failure(body: &Value, action: &str) {
    assert_eq!(body["error"], json!(true), "{body}");
    assert!(body["data"].is_null(), "{body}");
    assert_eq!(body["action"], json!(action));
    assert!(body["message"].is_string());
    assert!(body["action_duration"].as_u64().is_some());
}

#[tokio::test]
async fn test_database_lifecycle() {
    let memory = Arc::new(MemoryAdmin::default());
    let gw = spawn_gateway(
        test_config(),
        Backends::new().with(Engine::MySql, memory.clone()),
    )
    .await;

    // Create
    let res = gw
        .post("/mysql/databases")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_success(&body, "mysql-create-database", "Database Created");
    assert_eq!(body["data"]["database_name"], json!("shop"));
    let username = body["data"]["username"].as_str().unwrap().to_string();
    assert_eq!(username.len(), 12);
    assert_eq!(body["data"]["password"].as_str().unwrap().len(), 16);
    assert_eq!(memory.credentials("shop").unwrap().username, username);

    // Reset credentials
    let res = gw
        .patch("/mysql/databases/shop/credentials")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_success(&body, "mysql-reset-credentials", "Database Credentials Reset");
    assert_ne!(body["data"]["username"], json!(username));

    // Stats
    let res = gw.get("/mysql/databases/shop/stats").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_success(&body, "mysql-view-database-stats", "Database Statistics Retrieved");
    assert_eq!(body["data"]["database_name"], json!("shop"));
    assert_eq!(body["data"]["stats"][0]["table"], json!("users"));

    // Rename
    let res = gw
        .patch("/mysql/databases/shop")
        .json(&json!({ "new_database_name": "store" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_success(&body, "mysql-rename-database", "Database Renamed");
    assert_eq!(
        body["data"],
        json!({ "old_database_name": "shop", "new_database_name": "store" })
    );
    assert!(memory.contains("store"));
    assert!(!memory.contains("shop"));

    // Delete
    let res = gw.delete("/mysql/databases/store").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_success(&body, "mysql-delete-database", "Database Deleted");
    assert_eq!(body["data"], json!({ "database_name": "store" }));
    assert!(!memory.contains("store"));
}

#[tokio::test]
async fn test_invalid_name_is_a_validation_error() {
    let memory = Arc::new(MemoryAdmin::default());
    let gw = spawn_gateway(
        test_config(),
        Backends::new().with(Engine::Postgres, memory.clone()),
    )
    .await;

    let res = gw
        .post("/postgres/databases")
        .json(&json!({ "database_name": "shop; DROP TABLE users" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_failure(&body, "postgres-validation");
    assert_eq!(body["message"], json!("database_name must be alphanumeric"));

    let res = gw
        .post("/postgres/databases")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_failure(&body, "postgres-validation");
    assert_eq!(body["message"], json!("database_name is required"));

    let res = gw
        .patch("/postgres/databases/shop")
        .json(&json!({ "new_database_name": "bad-name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_failure(&json_body(res).await, "postgres-validation");
}

#[tokio::test]
async fn test_malformed_json_is_a_bind_error() {
    let gw = spawn_gateway(
        test_config(),
        Backends::new().with(Engine::MySql, Arc::new(MemoryAdmin::default())),
    )
    .await;

    let res = gw
        .post("/mysql/databases")
        .header("content-type", "application/json")
        .body("{\"database_name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_failure(&json_body(res).await, "mysql-bind-json");

    let res = gw
        .post("/mysql/databases")
        .body("database_name=shop")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_failure(&json_body(res).await, "mysql-bind-json");
}

#[tokio::test]
async fn test_unconfigured_engine_reports_error_envelope() {
    let gw = spawn_gateway(test_config(), Backends::new()).await;

    let res = gw
        .post("/mongo/databases")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_failure(&body, "mongo-not-configured");
    assert_eq!(body["message"], json!("mongo backend is not configured"));
}

#[tokio::test]
async fn test_backend_failure_is_reported_verbatim() {
    let gw = spawn_gateway(
        test_config(),
        Backends::new()
            .with(Engine::Postgres, Arc::new(UnreachableAdmin))
            .with(Engine::MySql, Arc::new(MemoryAdmin::default())),
    )
    .await;

    let res = gw.delete("/postgres/databases/shop").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_failure(&body, "postgres-delete-database");
    assert_eq!(body["message"], json!("connection failed: connection refused"));

    // A failing request leaves the gateway healthy for the next one.
    let res = gw
        .post("/mysql/databases")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = gw
        .post("/mysql/databases")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_failure(&body, "mysql-create-database");
    assert_eq!(body["message"], json!("database shop already exists"));
}

#[tokio::test]
async fn test_query_activity_is_postgres_only() {
    let memory = Arc::new(MemoryAdmin::default());
    let gw = spawn_gateway(
        test_config(),
        Backends::new()
            .with(Engine::Postgres, memory.clone())
            .with(Engine::MySql, memory),
    )
    .await;

    gw.post("/postgres/databases")
        .json(&json!({ "database_name": "analytics" }))
        .send()
        .await
        .unwrap();

    let res = gw.get("/postgres/databases/queries").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_success(
        &body,
        "postgres-get-total-queries",
        "Database Query retrieved successfully",
    );
    assert_eq!(body["data"]["user_activities"][0]["database_name"], json!("analytics"));

    let res = gw.get("/mysql/databases/queries").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_server_info_envelope() {
    let gw = spawn_gateway(test_config(), Backends::new()).await;

    let res = gw.get("/server-info").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_success(&body, "server-info", "Server Info");
    let cpus = body["data"]["cpu_info"].as_array().unwrap();
    assert_eq!(cpus.len() as u64, body["data"]["num_cpu"].as_u64().unwrap());
    for cpu in cpus {
        assert!(cpu["usage_percent"].as_f64().unwrap() >= 0.0, "{cpu}");
    }
    assert!(body["data"]["mem_info"]["total_bytes"].is_u64());
    assert_eq!(body["data"]["os"], json!(std::env::consts::OS));
}

#[tokio::test]
async fn test_body_names_must_match_the_path() {
    let memory = Arc::new(MemoryAdmin::default());
    let gw = spawn_gateway(
        test_config(),
        Backends::new().with(Engine::MySql, memory.clone()),
    )
    .await;

    gw.post("/mysql/databases")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();

    // A body naming another database is refused before anything is dropped.
    let res = gw
        .delete("/mysql/databases/other")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_failure(&body, "mysql-validation");
    assert_eq!(
        body["message"],
        json!("database_name does not match the database in the path")
    );
    assert!(memory.contains("shop"));

    let res = gw
        .patch("/mysql/databases/other")
        .json(&json!({ "old_database_name": "shop", "new_database_name": "store" }))
        .send()
        .await
        .unwrap();
    assert_failure(&json_body(res).await, "mysql-validation");
    assert!(memory.contains("shop"));

    let res = gw
        .delete("/mysql/databases/shop")
        .body("{\"database_name\": ")
        .send()
        .await
        .unwrap();
    assert_failure(&json_body(res).await, "mysql-bind-json");

    // Matching bodies are accepted.
    let res = gw
        .get("/mysql/databases/shop/stats")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = gw
        .delete("/mysql/databases/shop")
        .json(&json!({ "database_name": "shop" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!memory.contains("shop"));
}
