//! Drives `RestBackend` against a local stub of the hosted REST, auth and
//! storage surfaces.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use uuid::Uuid;

use cleanify_client::lifecycle::{self, PickupRequest};
use cleanify_client::{CleanifyClient, ClientConfig, ClientError};
use cleanify_client::guard::{GuardOutcome, Screen, guard};
use cleanify_types::models::{AppRole, RequestStatus};

const ANON_KEY: &str = "anon-test-key";

#[derive(Clone)]
struct Stub {
    user_id: Uuid,
    token: String,
    /// `METHOD path?query` of every request that reached the stub.
    seen: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    fn new() -> Self {
        let user_id = Uuid::new_v4();
        let claims = json!({
            "sub": user_id,
            "email": "rafay@example.pk",
            "exp": chrono::Utc::now().timestamp() + 3600,
            "role": "authenticated",
        });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"stub")).unwrap();
        Self {
            user_id,
            token,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, line: String) {
        self.seen.lock().unwrap().push(line);
    }

    fn user(&self) -> Value {
        json!({"id": self.user_id, "email": "rafay@example.pk", "user_metadata": {"full_name": "Rafay"}})
    }

    /// Every call must carry the anon key; data calls must carry the user token.
    fn authorize(&self, headers: &HeaderMap, needs_user: bool) -> Result<(), Response> {
        if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(ANON_KEY) {
            return Err(error(StatusCode::UNAUTHORIZED, "No API key found in request"));
        }
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if needs_user && bearer != Some(self.token.as_str()) {
            return Err(error(StatusCode::UNAUTHORIZED, "JWT expired"));
        }
        Ok(())
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"message": message, "code": "PGRST301"}))).into_response()
}

fn query_string(params: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort();
    pairs.join("&")
}

async fn token(
    State(stub): State<Stub>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    stub.record(format!("POST /auth/v1/token?{}", query_string(&params)));
    if let Err(resp) = stub.authorize(&headers, false) {
        return resp;
    }
    if params.get("grant_type").map(String::as_str) != Some("password") || body["password"] != "secret123" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        )
            .into_response();
    }
    Json(json!({
        "access_token": stub.token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": stub.user(),
    }))
    .into_response()
}

async fn user(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if let Err(resp) = stub.authorize(&headers, true) {
        return resp;
    }
    Json(stub.user()).into_response()
}

async fn select_rows(
    State(stub): State<Stub>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    stub.record(format!("GET {}?{}", table, query_string(&params)));
    if let Err(resp) = stub.authorize(&headers, false) {
        return resp;
    }
    match table.as_str() {
        "user_roles" => {
            let wanted = params.get("role").map(String::as_str);
            if matches!(wanted, None | Some("eq.team_leader")) {
                Json(json!([{
                    "id": Uuid::new_v4(),
                    "user_id": stub.user_id,
                    "role": "team_leader",
                    "created_at": null
                }]))
                .into_response()
            } else {
                Json(json!([])).into_response()
            }
        }
        _ => Json(json!([])).into_response(),
    }
}

async fn insert_row(
    State(stub): State<Stub>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Response {
    stub.record(format!("POST {}", table));
    if let Err(resp) = stub.authorize(&headers, true) {
        return resp;
    }
    if headers.get("prefer").and_then(|v| v.to_str().ok()) != Some("return=representation") {
        return error(StatusCode::BAD_REQUEST, "missing Prefer header");
    }
    if table == "kiosks" {
        return error(StatusCode::FORBIDDEN, "new row violates row-level security policy");
    }
    row["id"] = json!(Uuid::new_v4());
    row["status"] = json!("pending");
    row["verification_status"] = json!("pending");
    row["created_at"] = json!("2025-05-01T08:00:00+00:00");
    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

async fn upload(
    State(stub): State<Stub>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    stub.record(format!("UPLOAD {}/{} {}", bucket, path, body.len()));
    if let Err(resp) = stub.authorize(&headers, true) {
        return resp;
    }
    if headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) != Some("image/jpeg") {
        return error(StatusCode::BAD_REQUEST, "unexpected content type");
    }
    Json(json!({"Key": format!("{}/{}", bucket, path)})).into_response()
}

async fn start() -> (String, Stub) {
    let stub = Stub::new();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user))
        .route("/rest/v1/{table}", get(select_rows).post(insert_row))
        .route("/storage/v1/object/{bucket}/{*path}", post(upload))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/", addr), stub)
}

async fn signed_in(base_url: &str) -> CleanifyClient {
    let config = ClientConfig::new(base_url, ANON_KEY);
    let mut client = CleanifyClient::from_config(&config).unwrap();
    client.sign_in("rafay@example.pk", "secret123").await.unwrap();
    client
}

#[tokio::test]
async fn sign_in_and_guard_over_http() {
    let (base_url, stub) = start().await;
    let client = signed_in(&base_url).await;
    assert_eq!(client.session().unwrap().user.id, stub.user_id);

    match guard(&client, Screen::TeamLeader).await {
        GuardOutcome::Granted(ctx) => assert_eq!(ctx.roles, vec![AppRole::TeamLeader]),
        other => panic!("expected access, got {:?}", other),
    }
    assert_eq!(guard(&client, Screen::Admin).await, GuardOutcome::RedirectDashboard);

    let seen = stub.seen.lock().unwrap().clone();
    assert_eq!(seen[0], "POST /auth/v1/token?grant_type=password");
    assert!(seen.contains(&format!(
        "GET user_roles?limit=2&role=eq.team_leader&select=*&user_id=eq.{}",
        stub.user_id
    )));
}

#[tokio::test]
async fn bad_credentials_surface_service_message() {
    let (base_url, _stub) = start().await;
    let mut client = CleanifyClient::from_config(&ClientConfig::new(base_url, ANON_KEY)).unwrap();
    let err = client.sign_in("rafay@example.pk", "wrong").await.unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid login credentials");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(client.session().is_none());
}

#[tokio::test]
async fn pickup_uploads_then_inserts() {
    let (base_url, stub) = start().await;
    let client = signed_in(&base_url).await;
    let ctx = match guard(&client, Screen::Dashboard).await {
        GuardOutcome::Granted(ctx) => ctx,
        other => panic!("expected access, got {:?}", other),
    };

    let created = lifecycle::request_pickup(
        &client,
        &ctx,
        PickupRequest {
            bags: 1,
            photo: Some(vec![0xff, 0xd8, 0xff]),
            location: Some((24.9, 67.1)),
            address: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(created.status, RequestStatus::Pending);
    let url = created.photo_url.unwrap();
    let expected_prefix = format!(
        "{}storage/v1/object/public/waste-photos/{}/",
        base_url, stub.user_id
    );
    assert!(url.starts_with(&expected_prefix), "{}", url);

    let seen = stub.seen.lock().unwrap().clone();
    let upload_at = seen.iter().position(|l| l.starts_with("UPLOAD waste-photos/")).unwrap();
    let insert_at = seen.iter().position(|l| l == "POST waste_requests").unwrap();
    assert!(upload_at < insert_at);
    assert!(seen[upload_at].ends_with(" 3"));
}

#[tokio::test]
async fn row_level_denials_map_to_api_errors() {
    let (base_url, _stub) = start().await;
    let client = signed_in(&base_url).await;
    let err = client
        .insert::<_, Value>("kiosks", &json!({"name": "Clifton"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 403, ref message } if message.contains("row-level security")));
}
