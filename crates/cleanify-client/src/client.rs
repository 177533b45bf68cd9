use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cleanify_types::api::{
    AuthUser, NewUserRole, Session, SignInRequest, SignUpMetadata, SignUpRequest,
};
use cleanify_types::models::{AppRole, Profile, UserRole};
use cleanify_types::schema;

use crate::auth;
use crate::backend::{Backend, RestBackend};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::query::Query;

/// Typed access to the hosted backend plus the current session.
pub struct CleanifyClient {
    backend: Arc<dyn Backend>,
    session: Option<Session>,
}

impl CleanifyClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            session: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::new(Arc::new(RestBackend::new(config)?)))
    }

    pub fn with_session(mut self, session: Option<Session>) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Access token of a live session. Expired tokens count as signed out.
    pub fn token(&self) -> ClientResult<&str> {
        let session = self.session.as_ref().ok_or(ClientError::Unauthenticated)?;
        let claims = auth::peek_claims(&session.access_token)?;
        if auth::is_expired(&claims) {
            return Err(ClientError::Unauthenticated);
        }
        Ok(&session.access_token)
    }

    // -- Auth --

    /// Create an account and record the chosen role in `user_roles`.
    ///
    /// A failed role insert is logged and otherwise ignored; the account
    /// exists either way.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
        role: AppRole,
    ) -> ClientResult<AuthUser> {
        auth::validate_signup(email, password, full_name)?;

        let resp = self
            .backend
            .sign_up(&SignUpRequest {
                email: email.to_string(),
                password: password.to_string(),
                data: SignUpMetadata {
                    full_name: full_name.to_string(),
                    role,
                },
            })
            .await?;
        let user = resp.user().clone();
        self.session = resp.into_session();

        if self.session.is_some() {
            let role_row = NewUserRole {
                user_id: user.id,
                role,
            };
            if let Err(e) = self.insert::<_, UserRole>(schema::USER_ROLES, &role_row).await {
                warn!("Role assignment for {} failed: {}", user.id, e);
            }
        }

        info!("Signed up {} as {}", user.id, role);
        Ok(user)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> ClientResult<Session> {
        let session = self
            .backend
            .sign_in(&SignInRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        info!("Signed in {}", session.user.id);
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Drop the local session. The remote revoke is best effort.
    pub async fn sign_out(&mut self) -> ClientResult<()> {
        if let Some(session) = self.session.take() {
            if let Err(e) = self.backend.sign_out(&session.access_token).await {
                warn!("Remote sign-out failed: {}", e);
            }
        }
        Ok(())
    }

    /// The authenticated user as the auth service sees it right now.
    pub async fn current_user(&self) -> ClientResult<AuthUser> {
        let token = self.token()?;
        self.backend.get_user(token).await
    }

    // -- Rows --

    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> ClientResult<Vec<T>> {
        debug!("select {:?}", query.to_pairs());
        // Anonymous reads use the anon key; a stale session is not silently downgraded.
        let token = match self.session {
            Some(_) => Some(self.token()?),
            None => None,
        };
        let rows = self.backend.select(token, query).await?;
        decode_rows(rows)
    }

    /// Exactly one row, or `NotFound`.
    pub async fn select_one<T: DeserializeOwned>(&self, query: &Query) -> ClientResult<T> {
        self.maybe_one(query)
            .await?
            .ok_or_else(|| ClientError::not_found(query.table_name()))
    }

    /// Zero or one row; more than one is an error.
    pub async fn maybe_one<T: DeserializeOwned>(&self, query: &Query) -> ClientResult<Option<T>> {
        let mut rows: Vec<T> = self.select(&query.clone().limit(2)).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(ClientError::api(
                406,
                format!("expected at most one {} row, got {}", query.table_name(), n),
            )),
        }
    }

    pub async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> ClientResult<T> {
        let token = self.token()?;
        let rows = self
            .backend
            .insert(token, table, serde_json::to_value(row)?)
            .await?;
        decode_rows::<T>(rows)?
            .pop()
            .ok_or_else(|| ClientError::api(500, format!("insert into {} returned no row", table)))
    }

    /// Unconditional patch of the rows matched by `query`.
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        query: &Query,
        patch: &B,
    ) -> ClientResult<Vec<T>> {
        let token = self.token()?;
        let rows = self
            .backend
            .update(token, query, serde_json::to_value(patch)?)
            .await?;
        decode_rows(rows)
    }

    // -- Storage --

    /// Upload an object and return its public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ClientResult<String> {
        let token = self.token()?;
        self.backend
            .upload(token, bucket, path, bytes, content_type)
            .await?;
        Ok(self.backend.public_url(bucket, path))
    }

    // -- Common lookups --

    pub async fn profile(&self, user_id: Uuid) -> ClientResult<Profile> {
        self.select_one(&Query::table(schema::PROFILES).eq("id", user_id))
            .await
    }

    pub async fn profiles_by_id(&self, ids: &[Uuid]) -> ClientResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(&Query::table(schema::PROFILES).in_list("id", ids.iter()))
            .await
    }

    pub async fn roles_of(&self, user_id: Uuid) -> ClientResult<Vec<AppRole>> {
        let rows: Vec<UserRole> = self
            .select(&Query::table(schema::USER_ROLES).eq("user_id", user_id))
            .await?;
        Ok(rows.into_iter().map(|r| r.role).collect())
    }

    pub async fn has_role(&self, user_id: Uuid, role: AppRole) -> ClientResult<bool> {
        let row: Option<UserRole> = self
            .maybe_one(
                &Query::table(schema::USER_ROLES)
                    .eq("user_id", user_id)
                    .eq("role", role),
            )
            .await?;
        Ok(row.is_some())
    }

    /// Profiles of every user holding `role`.
    pub async fn users_with_role(&self, role: AppRole) -> ClientResult<Vec<Profile>> {
        let rows: Vec<UserRole> = self
            .select(&Query::table(schema::USER_ROLES).eq("role", role))
            .await?;
        let ids: Vec<Uuid> = rows.into_iter().map(|r| r.user_id).collect();
        self.profiles_by_id(&ids).await
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> ClientResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ClientError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[tokio::test]
    async fn sign_up_records_role_and_session() {
        let mut client = CleanifyClient::new(Arc::new(MemoryBackend::new()));
        let user = client
            .sign_up("hina@example.pk", "secret123", "Hina Baig", AppRole::TeamLeader)
            .await
            .unwrap();

        assert!(client.token().is_ok());
        assert_eq!(client.roles_of(user.id).await.unwrap(), vec![AppRole::TeamLeader]);
        assert_eq!(client.profile(user.id).await.unwrap().full_name, "Hina Baig");
    }

    #[tokio::test]
    async fn writes_require_a_session() {
        let client = CleanifyClient::new(Arc::new(MemoryBackend::new()));
        let err = client
            .insert::<_, Value>(schema::KIOSKS, &serde_json::json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_token() {
        let mut client = CleanifyClient::new(Arc::new(MemoryBackend::new()));
        client
            .sign_up("imran@example.pk", "secret123", "Imran", AppRole::Citizen)
            .await
            .unwrap();
        client.sign_out().await.unwrap();
        assert!(client.session().is_none());
        assert!(matches!(client.current_user().await, Err(ClientError::Unauthenticated)));

        client.sign_in("imran@example.pk", "secret123").await.unwrap();
        assert_eq!(
            client.current_user().await.unwrap().email.as_deref(),
            Some("imran@example.pk")
        );
    }

    #[tokio::test]
    async fn expired_session_is_unauthenticated_not_anonymous() {
        use cleanify_types::api::Claims;
        use jsonwebtoken::{EncodingKey, Header, encode};

        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some("old@example.pk".into()),
            user_metadata: Value::Null,
        };
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: 1,
            role: None,
            session_id: None,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap();
        let stale = Session {
            access_token: token,
            token_type: "bearer".into(),
            expires_in: None,
            refresh_token: None,
            user,
        };

        let backend = Arc::new(MemoryBackend::new());
        let q = Query::table(schema::KIOSKS);
        let client = CleanifyClient::new(backend.clone()).with_session(Some(stale));
        let err = client.select::<Value>(&q).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));

        let anonymous = CleanifyClient::new(backend);
        assert!(anonymous.select::<Value>(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn maybe_one_rejects_duplicates() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .seed(
                schema::KIOSKS,
                vec![
                    serde_json::json!({"name": "Saddar", "address": "a", "latitude": 1.0, "longitude": 2.0}),
                    serde_json::json!({"name": "Saddar", "address": "b", "latitude": 1.0, "longitude": 2.0}),
                ],
            )
            .unwrap();
        let client = CleanifyClient::new(backend);
        let q = Query::table(schema::KIOSKS).eq("name", "Saddar");
        assert!(client.maybe_one::<Value>(&q).await.is_err());
        let none = Query::table(schema::KIOSKS).eq("name", "Lyari");
        assert!(client.maybe_one::<Value>(&none).await.unwrap().is_none());
    }
}
