mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{TestApp, TEST_PASSWORD};
use fleet_portal::models::user::UserRole;
use fleet_portal::routes::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router(app: &TestApp) -> Router {
    create_router(app.state.clone())
}

async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = send(router(&app), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_a_bearer_token() {
    let app = TestApp::new().await;
    let (status, body) = send(router(&app), Method::GET, "/api/vehicles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(
        router(&app),
        Method::GET,
        "/api/vehicles",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_then_manage_vehicles() {
    let app = TestApp::new().await;
    let (status, body) = send(
        router(&app),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let token = body["data"]["token"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        router(&app),
        Method::POST,
        "/api/vehicles",
        Some(&token),
        Some(json!({
            "registration_number": "ka05mn7788",
            "type": "compactor",
            "make": "Ashok Leyland",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["registration_number"], "KA05MN7788");
    assert_eq!(body["data"]["status"], "available");

    let (status, body) = send(router(&app), Method::GET, "/api/vehicles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (status, body) = send(
        router(&app),
        Method::POST,
        "/api/vehicles",
        Some(&token),
        Some(json!({ "registration_number": "KA05MN7788", "type": "compactor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn successful_mutations_are_audited_without_passwords() {
    let app = TestApp::new().await;
    let token = app.login_token("admin@example.com").await;

    let (status, _) = send(
        router(&app),
        Method::POST,
        "/api/users",
        Some(&token),
        Some(json!({
            "email": "hr@example.com",
            "password": TEST_PASSWORD,
            "full_name": "Meena HR",
            "role": "swachh_hr",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Los fallos no se auditan
    let (status, _) = send(
        router(&app),
        Method::POST,
        "/api/users",
        Some(&token),
        Some(json!({ "email": "bad" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let entries = app.repos().audit.recent(10).await.unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.action, "POST /api/users");
    assert_eq!(entry.status_code, 201);
    assert_eq!(entry.actor_id, Some(app.admin.user_id));
    assert_eq!(entry.ip.as_deref(), Some("203.0.113.7"));
    let body = entry.body.as_ref().unwrap();
    assert_eq!(body["email"], "hr@example.com");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn verify_is_reserved_for_active_admins() {
    let app = TestApp::new().await;
    app.create_user("driver@example.com", UserRole::Driver).await;
    let driver_token = app.login_token("driver@example.com").await;

    let (status, body) = send(
        router(&app),
        Method::POST,
        "/api/auth/verify",
        None,
        Some(json!({ "token": driver_token })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // El driver sí puede leer su perfil
    let (status, body) = send(
        router(&app),
        Method::GET,
        "/api/auth/profile",
        Some(&driver_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "driver");

    let (status, _) = send(
        router(&app),
        Method::GET,
        "/api/users",
        Some(&driver_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deactivated_users_are_locked_out() {
    let app = TestApp::new().await;
    let user = app.create_user("temp@example.com", UserRole::SwachhHr).await;
    let token = app.login_token("temp@example.com").await;
    let admin_token = app.login_token("admin@example.com").await;

    let (status, _) = send(
        router(&app),
        Method::PUT,
        &format!("/api/users/{}/status", user.id),
        Some(&admin_token),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // El token emitido antes sigue siendo válido pero el documento está inactivo
    let (status, _) = send(
        router(&app),
        Method::GET,
        "/api/auth/profile",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn assignment_lifecycle_over_http() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let vehicle = app.create_vehicle("HR26DK8337", None).await;
    let token = app.login_token("admin@example.com").await;

    let (status, body) = send(
        router(&app),
        Method::POST,
        "/api/assignments/vehicles",
        Some(&token),
        Some(json!({
            "vehicle_id": vehicle.id,
            "assigned_to": driver.id,
            "assignment_type": "primary",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let assignment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        router(&app),
        Method::PUT,
        &format!("/api/assignments/{}/status", assignment_id),
        Some(&token),
        Some(json!({ "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATUS");

    let (status, body) = send(
        router(&app),
        Method::PUT,
        &format!("/api/assignments/{}/status", assignment_id),
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let (status, body) = send(
        router(&app),
        Method::GET,
        &format!("/api/vehicles/{}", vehicle.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "available");
}

#[tokio::test]
async fn csv_export_is_an_attachment() {
    let app = TestApp::new().await;
    app.create_vehicle("PB10GH4455", None).await;
    let token = app.login_token("admin@example.com").await;

    let request = Request::builder()
        .uri("/api/reports/export?type=vehicles&format=csv")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"vehicles_report_"));
    assert!(disposition.ends_with(".csv\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("PB10GH4455"));
}

#[tokio::test]
async fn malformed_path_and_body_use_the_error_envelope() {
    let app = TestApp::new().await;
    let token = app.login_token("admin@example.com").await;

    let (status, body) = send(
        router(&app),
        Method::PUT,
        "/api/assignments/not-a-uuid/status",
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].is_string());

    let (status, body) = send(
        router(&app),
        Method::POST,
        "/api/assignments/vehicles",
        Some(&token),
        Some(json!({ "vehicle_id": "garbage", "assignment_type": "primary" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        router(&app),
        Method::GET,
        "/api/vehicles?page=minus-one",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn large_bodies_reach_the_handler_without_audit_copy() {
    let app = TestApp::new().await;
    let token = app.login_token("admin@example.com").await;

    // ~1.5 MiB: por encima de la copia auditada, por debajo del límite de axum
    let padding = "x".repeat(1536 * 1024);
    let (status, body) = send(
        router(&app),
        Method::PUT,
        "/api/settings/system",
        Some(&token),
        Some(json!({ "maintenance_mode": true, "attachment_blob": padding })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["maintenance_mode"], true);

    let entries = app.repos().audit.recent(10).await.unwrap();
    let entry = entries
        .iter()
        .find(|e| e.action == "PUT /api/settings/system")
        .unwrap();
    assert_eq!(entry.status_code, 200);
    assert!(entry.body.is_none());
}

#[tokio::test]
async fn backups_over_http() {
    let app = TestApp::new().await;
    let token = app.login_token("admin@example.com").await;

    let (status, body) = send(
        router(&app),
        Method::POST,
        "/api/settings/backup",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["collections"], json!(["users", "vehicles", "assignments"]));
    let backup_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        router(&app),
        Method::GET,
        "/api/settings/backups",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], backup_id.as_str());
}
