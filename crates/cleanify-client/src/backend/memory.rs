use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value, json};
use tracing::debug;
use uuid::Uuid;

use cleanify_types::api::{
    AuthUser, Claims, Session, SignInRequest, SignUpRequest, SignUpResponse,
};
use cleanify_types::schema;

use super::Backend;
use crate::error::{ClientError, ClientResult};
use crate::query::Query;

const TOKEN_SECRET: &[u8] = b"cleanify-memory-backend";
const TOKEN_TTL_SECS: i64 = 3600;
const BASE_URL: &str = "http://memory.local";

struct StoredUser {
    user: AuthUser,
    password: String,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    users: Vec<StoredUser>,
    revoked: HashSet<Uuid>,
    objects: HashMap<String, Vec<u8>>,
}

/// In-process stand-in for the hosted service.
///
/// Applies the schema's column defaults and creates a `profiles` row on
/// sign-up like the hosted project does. It has no triggers: rewards, earnings
/// and wallet rows only appear if a test seeds them.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> ClientResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| ClientError::api(500, format!("memory backend lock poisoned: {}", e)))
    }

    /// Insert rows as-is, bypassing auth. Defaults are still applied.
    pub fn seed(&self, table: &str, rows: Vec<Value>) -> ClientResult<()> {
        let mut state = self.state()?;
        for row in rows {
            let row = with_defaults(table, row)?;
            state.tables.entry(table.to_string()).or_default().push(row);
        }
        Ok(())
    }

    pub fn rows(&self, table: &str) -> ClientResult<Vec<Value>> {
        Ok(self.state()?.tables.get(table).cloned().unwrap_or_default())
    }

    pub fn object(&self, bucket: &str, path: &str) -> ClientResult<Option<Vec<u8>>> {
        Ok(self.state()?.objects.get(&object_key(bucket, path)).cloned())
    }

    fn mint_token(user: &AuthUser) -> ClientResult<String> {
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: (Utc::now().timestamp() + TOKEN_TTL_SECS) as usize,
            role: Some("authenticated".into()),
            session_id: Some(Uuid::new_v4()),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(TOKEN_SECRET))
            .map_err(|e| ClientError::api(500, format!("token signing failed: {}", e)))
    }

    fn verify(token: &str) -> ClientResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(TOKEN_SECRET),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| ClientError::api(401, format!("invalid JWT: {}", e)))
    }

    fn session_for(user: &AuthUser) -> ClientResult<Session> {
        Ok(Session {
            access_token: Self::mint_token(user)?,
            token_type: "bearer".into(),
            expires_in: Some(TOKEN_TTL_SECS as u64),
            refresh_token: None,
            user: user.clone(),
        })
    }

    /// Resolve a bearer token to its user, as the service does for every call.
    fn authenticate(state: &MemoryState, token: &str) -> ClientResult<AuthUser> {
        let claims = Self::verify(token)?;
        if claims.session_id.is_some_and(|sid| state.revoked.contains(&sid)) {
            return Err(ClientError::api(401, "session has been revoked"));
        }

        state
            .users
            .iter()
            .find(|u| u.user.id == claims.sub)
            .map(|u| u.user.clone())
            .ok_or_else(|| ClientError::api(401, "user from token no longer exists"))
    }
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path)
}

/// Column defaults and generated columns of the hosted schema.
fn with_defaults(table: &str, row: Value) -> ClientResult<Value> {
    let Value::Object(mut row) = row else {
        return Err(ClientError::api(400, "row must be a JSON object"));
    };

    row.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
    row.entry("created_at").or_insert_with(|| json!(Utc::now()));

    match table {
        schema::WASTE_REQUESTS => {
            row.entry("status").or_insert_with(|| json!("pending"));
            row.entry("verification_status").or_insert_with(|| json!("pending"));
            row.entry("reward_pkr").or_insert_with(|| json!(0));
        }
        schema::RECYCLING_TRANSACTIONS => {
            row.entry("reward_pkr").or_insert_with(|| json!(0));
            let total = count(&row, "bottles") + count(&row, "cans");
            row.insert("total_items".into(), json!(total));
        }
        schema::PROFILES => {
            row.entry("wallet_balance").or_insert_with(|| json!(0));
        }
        schema::TEAM_EARNINGS => {
            row.entry("payment_amount").or_insert_with(|| json!(0));
        }
        _ => {}
    }

    Ok(Value::Object(row))
}

fn count(row: &Map<String, Value>, col: &str) -> i64 {
    row.get(col).and_then(Value::as_i64).unwrap_or(0)
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_up(&self, req: &SignUpRequest) -> ClientResult<SignUpResponse> {
        let mut state = self.state()?;
        if state
            .users
            .iter()
            .any(|u| u.user.email.as_deref() == Some(req.email.as_str()))
        {
            return Err(ClientError::api(422, "User already registered"));
        }

        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(req.email.clone()),
            user_metadata: serde_json::to_value(&req.data)?,
        };

        let profile = with_defaults(
            schema::PROFILES,
            json!({
                "id": user.id,
                "full_name": req.data.full_name,
                "email": req.email,
            }),
        )?;
        state
            .tables
            .entry(schema::PROFILES.to_string())
            .or_default()
            .push(profile);
        state.users.push(StoredUser {
            user: user.clone(),
            password: req.password.clone(),
        });

        debug!("memory sign-up for {}", req.email);
        Ok(SignUpResponse::Session(Self::session_for(&user)?))
    }

    async fn sign_in(&self, req: &SignInRequest) -> ClientResult<Session> {
        let state = self.state()?;
        let stored = state
            .users
            .iter()
            .find(|u| u.user.email.as_deref() == Some(req.email.as_str()) && u.password == req.password)
            .ok_or_else(|| ClientError::api(400, "Invalid login credentials"))?;
        Self::session_for(&stored.user)
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let mut state = self.state()?;
        Self::authenticate(&state, access_token)?;
        if let Some(sid) = Self::verify(access_token)?.session_id {
            state.revoked.insert(sid);
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> ClientResult<AuthUser> {
        let state = self.state()?;
        Self::authenticate(&state, access_token)
    }

    async fn select(&self, token: Option<&str>, query: &Query) -> ClientResult<Vec<Value>> {
        let state = self.state()?;
        if let Some(token) = token {
            Self::authenticate(&state, token)?;
        }
        let rows = state
            .tables
            .get(query.table_name())
            .map(|rows| query.apply(rows))
            .unwrap_or_default();
        Ok(rows)
    }

    async fn insert(&self, token: &str, table: &str, row: Value) -> ClientResult<Vec<Value>> {
        let mut state = self.state()?;
        Self::authenticate(&state, token)?;
        let row = with_defaults(table, row)?;
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(vec![row])
    }

    async fn update(&self, token: &str, query: &Query, patch: Value) -> ClientResult<Vec<Value>> {
        let mut state = self.state()?;
        Self::authenticate(&state, token)?;
        let Value::Object(patch) = patch else {
            return Err(ClientError::api(400, "patch must be a JSON object"));
        };

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(query.table_name()) {
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                if let Value::Object(cells) = row {
                    for (k, v) in &patch {
                        cells.insert(k.clone(), v.clone());
                    }
                    cells.insert("updated_at".into(), json!(Utc::now()));
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> ClientResult<()> {
        let mut state = self.state()?;
        Self::authenticate(&state, token)?;
        let key = object_key(bucket, path);
        if state.objects.contains_key(&key) {
            return Err(ClientError::api(409, "The resource already exists"));
        }
        state.objects.insert(key, bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", BASE_URL, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanify_types::api::SignUpMetadata;
    use cleanify_types::models::AppRole;

    fn signup(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.into(),
            password: "secret123".into(),
            data: SignUpMetadata {
                full_name: "Bilal Ahmed".into(),
                role: AppRole::Citizen,
            },
        }
    }

    #[tokio::test]
    async fn sign_up_creates_profile_and_rejects_duplicates() {
        let backend = MemoryBackend::new();
        let resp = backend.sign_up(&signup("bilal@example.pk")).await.unwrap();
        let uid = resp.user().id;

        let profiles = backend.rows(schema::PROFILES).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0]["id"], json!(uid));
        assert_eq!(profiles[0]["wallet_balance"], json!(0));

        let err = backend.sign_up(&signup("bilal@example.pk")).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 422, .. }));
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let backend = MemoryBackend::new();
        let session = backend
            .sign_up(&signup("sana@example.pk"))
            .await
            .unwrap()
            .into_session()
            .unwrap();

        backend.get_user(&session.access_token).await.unwrap();
        backend.sign_out(&session.access_token).await.unwrap();
        let err = backend.get_user(&session.access_token).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn sign_in_after_sign_out_gets_a_fresh_session() {
        let backend = MemoryBackend::new();
        let first = backend
            .sign_up(&signup("zara@example.pk"))
            .await
            .unwrap()
            .into_session()
            .unwrap();
        backend.sign_out(&first.access_token).await.unwrap();

        let second = backend
            .sign_in(&SignInRequest {
                email: "zara@example.pk".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert_eq!(
            backend.get_user(&second.access_token).await.unwrap().id,
            first.user.id
        );
        assert!(backend.get_user(&first.access_token).await.is_err());
    }

    #[tokio::test]
    async fn insert_applies_schema_defaults() {
        let backend = MemoryBackend::new();
        let session = backend
            .sign_up(&signup("omar@example.pk"))
            .await
            .unwrap()
            .into_session()
            .unwrap();

        let rows = backend
            .insert(
                &session.access_token,
                schema::RECYCLING_TRANSACTIONS,
                json!({"citizen_id": session.user.id, "bottles": 3, "cans": 2}),
            )
            .await
            .unwrap();
        assert_eq!(rows[0]["total_items"], json!(5));
        assert_eq!(rows[0]["reward_pkr"], json!(0));
        assert!(rows[0]["id"].is_string());
    }

    #[tokio::test]
    async fn upload_refuses_to_overwrite() {
        let backend = MemoryBackend::new();
        let session = backend
            .sign_up(&signup("zara@example.pk"))
            .await
            .unwrap()
            .into_session()
            .unwrap();
        let token = session.access_token.as_str();

        backend.upload(token, "waste-photos", "a/1.jpg", vec![1, 2], "image/jpeg").await.unwrap();
        let err = backend
            .upload(token, "waste-photos", "a/1.jpg", vec![3], "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 409, .. }));
        assert_eq!(backend.object("waste-photos", "a/1.jpg").unwrap(), Some(vec![1, 2]));
    }
}
