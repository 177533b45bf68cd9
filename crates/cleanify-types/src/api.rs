use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AppRole, RequestStatus, VerificationStatus};

// -- JWT Claims --

/// Claims carried by the auth service's access token. The client decodes them
/// only to learn the user id and expiry; it never holds the signing secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub role: Option<String>,
    /// Identifies the sign-in that minted the token; revocation is per session.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpMetadata {
    pub full_name: String,
    pub role: AppRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub data: SignUpMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Session returned by sign-in and persisted between CLI invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".into()
}

/// Sign-up returns either a full session or, when email confirmation is
/// enabled, just the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(Session),
    User(AuthUser),
}

impl SignUpResponse {
    pub fn user(&self) -> &AuthUser {
        match self {
            Self::Session(s) => &s.user,
            Self::User(u) => u,
        }
    }

    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::Session(s) => Some(s),
            Self::User(_) => None,
        }
    }
}

/// Error body shapes emitted by the REST, auth and storage services.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub msg: Option<String>,
    pub error_description: Option<String>,
    pub error: Option<String>,
    pub code: Option<serde_json::Value>,
    pub hint: Option<String>,
}

impl ApiErrorBody {
    pub fn best_message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
    }
}

// -- Inserts --

#[derive(Debug, Clone, Serialize)]
pub struct NewUserRole {
    pub user_id: Uuid,
    pub role: AppRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWasteRequest {
    pub citizen_id: Uuid,
    pub number_of_bags: i32,
    pub photo_url: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Reward is left to the backend trigger.
#[derive(Debug, Clone, Serialize)]
pub struct NewRecyclingTransaction {
    pub citizen_id: Uuid,
    pub bottles: i32,
    pub cans: i32,
}

// -- Updates --

/// Partial update of a waste request. Only populated fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WasteRequestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_team_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_member_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}
