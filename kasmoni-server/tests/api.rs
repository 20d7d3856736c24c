//! End-to-end tests through the full router (auth middleware included)

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Method, Request, StatusCode, header};
use kasmoni_server::core::build_app;
use kasmoni_server::db::DbService;
use kasmoni_server::db::repository::user;
use kasmoni_server::{Config, JwtService, ServerState};
use serde_json::{Value, json};
use shared::models::{Role, UserCreate, UserUpdate};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-at-least-32-chars";

struct TestApp {
    app: Router,
    state: ServerState,
}

impl TestApp {
    async fn new() -> Self {
        let config = Config::for_tests(SECRET);
        let db = DbService::in_memory().await.unwrap();
        let state = ServerState::new(config, db.pool);
        Self {
            app: build_app(state.clone()),
            state,
        }
    }

    /// Insert a dashboard account and mint a token for it
    async fn login(&self, id: i64, role: Role, member_id: Option<i64>) -> String {
        let email = format!("user{id}@kasmoni.sr");
        user::create_with_id(
            &self.state.pool,
            id,
            UserCreate {
                email: email.clone(),
                display_name: format!("User {id}"),
                role,
                member_id,
            },
        )
        .await
        .unwrap();
        JwtService::with_config(self.state.config.jwt.clone())
            .generate_token(id, Some(&email))
            .unwrap()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, bytes) = self.send(req).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_member(&self, token: &str, first: &str, national_id: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/members",
                Some(token),
                Some(json!({
                    "first_name": first,
                    "last_name": "Doelwijt",
                    "national_id": national_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_missing_and_invalid_tokens_are_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, body) = app
        .call(Method::GET, "/api/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);

    // Valid signature, but no such account
    let stranger = JwtService::with_config(app.state.config.jwt.clone())
        .generate_token(999, None)
        .unwrap();
    let (status, _) = app.call(Method::GET, "/api/me", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = app.login(1, Role::Admin, None).await;
    let (status, logs) = app
        .call(Method::GET, "/api/auth-logs?limit=10", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let events: Vec<&str> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["event"].as_str().unwrap())
        .collect();
    assert!(events.contains(&"token_invalid"));
    assert!(events.contains(&"user_unknown"));
    assert!(events.contains(&"token_accepted"));
}

#[tokio::test]
async fn test_session_logged_once_and_disabled_account_refused() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;

    for _ in 0..3 {
        let (status, me) = app.call(Method::GET, "/api/me", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["role"], "admin");
    }
    let (_, logs) = app
        .call(Method::GET, "/api/auth-logs", Some(&admin), None)
        .await;
    let accepted = logs
        .as_array()
        .unwrap()
        .iter()
        .filter(|l| l["event"] == "token_accepted")
        .count();
    assert_eq!(accepted, 1);

    let member = app.login(2, Role::Member, None).await;
    user::update(
        &app.state.pool,
        2,
        UserUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let (status, body) = app.call(Method::GET, "/api/me", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 1007);
}

#[tokio::test]
async fn test_non_admin_cannot_create_or_delete_members() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;
    let member_id = app.create_member(&admin, "Ruth", "SR-0001").await;
    let viewer = app.login(2, Role::Member, Some(member_id)).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/members",
            Some(&viewer),
            Some(json!({"first_name": "X", "last_name": "Y", "national_id": "SR-0002"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);
    assert_eq!(body["message"], "Only administrators can perform this action");

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/members/{member_id}"),
            Some(&viewer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, members) = app.call(Method::GET, "/api/members", Some(&admin), None).await;
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["is_active"], true);
}

#[tokio::test]
async fn test_duplicate_national_id_is_conflict() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;
    app.create_member(&admin, "Ruth", "SR-0100").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/members",
            Some(&admin),
            Some(json!({"first_name": "Anna", "last_name": "B", "national_id": "SR-0100"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 3002);
    assert_eq!(body["details"]["field"], "national_id");
}

#[tokio::test]
async fn test_member_sees_only_own_status() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;
    let own = app.create_member(&admin, "Ruth", "SR-0200").await;
    let other = app.create_member(&admin, "Anna", "SR-0201").await;
    let viewer = app.login(2, Role::Member, Some(own)).await;

    let (status, body) = app
        .call(Method::GET, &format!("/api/members/{own}/status"), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_slots"], 0);
    assert_eq!(body["is_active"], false);
    assert_eq!(body["next_receive_month"], Value::Null);

    let (status, body) = app
        .call(Method::GET, &format!("/api/members/{other}/status"), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);

    let (status, _) = app
        .call(Method::GET, "/api/members/status", Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, all) = app
        .call(Method::GET, "/api/members/status", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_group_slot_payment_flow() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;
    let member_id = app.create_member(&admin, "Ruth", "SR-0300").await;

    let (status, group) = app
        .call(
            Method::POST,
            "/api/groups",
            Some(&admin),
            Some(json!({
                "name": "Kasmoni Noord",
                "monthly_amount": 250.0,
                "start_month": "2024-01",
                "end_month": "2024-10",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{group}");
    let group_id = group["id"].as_i64().unwrap();

    let slot_body = json!({"member_id": member_id, "assigned_month": "2024-04"});
    let (status, slot) = app
        .call(
            Method::POST,
            &format!("/api/groups/{group_id}/slots"),
            Some(&admin),
            Some(slot_body.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{slot}");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/groups/{group_id}/slots"),
            Some(&admin),
            Some(slot_body),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4102);

    let (status, detail) = app
        .call(Method::GET, &format!("/api/groups/{group_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["monthly_pot"], 250.0);
    assert_eq!(detail["slots"][0]["first_name"], "Ruth");

    let slot_id = slot["id"].as_i64().unwrap();
    let (status, payment) = app
        .call(
            Method::POST,
            "/api/payments",
            Some(&admin),
            Some(json!({
                "member_id": member_id,
                "group_id": group_id,
                "slot_id": slot_id,
                "amount": 250.0,
                "kind": "contribution",
                "payment_month": "2024-04",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{payment}");
    assert_eq!(payment["status"], "pending");
    let payment_id = payment["id"].as_i64().unwrap();

    let status_uri = format!("/api/payments/{payment_id}/status");
    let (status, updated) = app
        .call(
            Method::PUT,
            &status_uri,
            Some(&admin),
            Some(json!({"status": "received", "payment_date": "2024-04-05"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "received");

    let (status, body) = app
        .call(Method::PUT, &status_uri, Some(&admin), Some(json!({"status": "pending"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 5003);

    let (status, list) = app
        .call(
            Method::GET,
            &format!("/api/payments?group_id={group_id}&from=2024-01&to=2024-12"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Slot with payments and group with slots cannot be removed
    let (status, body) = app
        .call(Method::DELETE, &format!("/api/slots/{slot_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4104);
    let (status, body) = app
        .call(Method::DELETE, &format!("/api/groups/{group_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4002);
}

#[tokio::test]
async fn test_csv_import_then_export() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;

    let csv = "first_name,last_name,national_id,phone\n\
               Ruth,Doelwijt,SR-1,+597 123\n\
               ,Missing,SR-2,\n\
               Anna,Karg,SR-3,\n";
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/members/import")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .unwrap();
    let (status, bytes) = app.send(req).await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report["success"], 2);
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);

    let req = Request::builder()
        .uri("/api/members/export")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("\"SR-1\""));
    assert!(text.contains("\"SR-3\""));
}

#[tokio::test]
async fn test_password_reset_requests() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/password-reset-requests",
            None,
            Some(json!({"email": "User1@Kasmoni.sr"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);

    let (status, list) = app
        .call(Method::GET, "/api/password-reset-requests", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["user_id"], 1);
    let id = list[0]["id"].as_i64().unwrap();

    let resolve = format!("/api/password-reset-requests/{id}/resolve");
    let (status, resolved) = app.call(Method::POST, &resolve, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "resolved");
    assert_eq!(resolved["resolved_by"], 1);

    let reject = format!("/api/password-reset-requests/{id}/reject");
    let (status, body) = app.call(Method::POST, &reject, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7202);

    // Listing is not public
    let (status, _) = app
        .call(Method::GET, "/api/password-reset-requests", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_management_roles() {
    let app = TestApp::new().await;
    let root = app.login(1, Role::SuperUser, None).await;
    let admin = app.login(2, Role::Admin, None).await;

    let new_user = json!({"email": "kassier@kasmoni.sr", "display_name": "Kassier", "role": "admin", "member_id": null});
    let (status, body) = app
        .call(Method::POST, "/api/users", Some(&admin), Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2006);

    let (status, _) = app
        .call(Method::POST, "/api/users", Some(&root), Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .call(Method::POST, "/api/users", Some(&root), Some(new_user))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7002);

    let (status, body) = app
        .call(Method::PUT, "/api/users/1", Some(&root), Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2007);

    let (status, demoted) = app
        .call(Method::PUT, "/api/users/2", Some(&root), Some(json!({"role": "member"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(demoted["role"], "member");

    // Role changes apply on the next request
    let (status, _) = app.call(Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_banks_and_messages() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;

    let (status, bank) = app
        .call(Method::POST, "/api/banks", Some(&admin), Some(json!({"name": "Hakrinbank", "short_name": "HKB"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let bank_id = bank["id"].as_i64().unwrap();
    let (status, body) = app
        .call(Method::POST, "/api/banks", Some(&admin), Some(json!({"name": "Hakrinbank"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6002);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/members",
            Some(&admin),
            Some(json!({"first_name": "Ruth", "last_name": "D", "national_id": "SR-9", "bank_id": bank_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .call(Method::DELETE, &format!("/api/banks/{bank_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6003);

    let (status, members) = app.call(Method::GET, "/api/members", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let member_id = members[0]["id"].as_i64().unwrap();
    let viewer = app.login(2, Role::Member, Some(member_id)).await;
    let outsider = app.login(3, Role::Member, None).await;

    let (status, direct) = app
        .call(
            Method::POST,
            "/api/messages",
            Some(&admin),
            Some(json!({"member_id": member_id, "subject": "Uitbetaling", "body": "April is uw maand"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.call(
        Method::POST,
        "/api/messages",
        Some(&admin),
        Some(json!({"member_id": null, "subject": "Vergadering", "body": "Zaterdag 10:00"})),
    )
    .await;

    let (_, inbox) = app.call(Method::GET, "/api/messages", Some(&viewer), None).await;
    assert_eq!(inbox.as_array().unwrap().len(), 2);
    let (_, inbox) = app.call(Method::GET, "/api/messages", Some(&outsider), None).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);

    let read_uri = format!("/api/messages/{}/read", direct["id"]);
    let (status, _) = app.call(Method::POST, &read_uri, Some(&outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.call(Method::POST, &read_uri, Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, true);
}

#[tokio::test]
async fn test_analytics_endpoints() {
    let app = TestApp::new().await;
    let admin = app.login(1, Role::Admin, None).await;

    let (status, overview) = app
        .call(Method::GET, "/api/analytics/overview", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["total_members"], 0);

    let (status, trend) = app
        .call(Method::GET, "/api/analytics/trend", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trend.as_array().unwrap().len(), 6);

    let (status, body) = app
        .call(Method::GET, "/api/analytics/trend?months=25", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "months");

    let (status, banks) = app
        .call(Method::GET, "/api/analytics/banks", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(banks["by_receiver_bank"].as_array().unwrap().is_empty());

    let member = app.login(2, Role::Member, None).await;
    let (status, _) = app
        .call(Method::GET, "/api/analytics/overview", Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
