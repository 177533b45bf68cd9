//! The hosted service seen through the handful of calls this client makes.
//!
//! Rows cross this seam as untyped JSON so the trait stays object safe; the
//! typed layer lives in [`crate::client::CleanifyClient`].

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use cleanify_types::api::{AuthUser, Session, SignInRequest, SignUpRequest, SignUpResponse};

use crate::error::ClientResult;
use crate::query::Query;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    // -- Auth --

    async fn sign_up(&self, req: &SignUpRequest) -> ClientResult<SignUpResponse>;

    async fn sign_in(&self, req: &SignInRequest) -> ClientResult<Session>;

    async fn sign_out(&self, access_token: &str) -> ClientResult<()>;

    async fn get_user(&self, access_token: &str) -> ClientResult<AuthUser>;

    // -- Rows --

    async fn select(&self, token: Option<&str>, query: &Query) -> ClientResult<Vec<Value>>;

    /// Insert one row and return the stored representation.
    async fn insert(&self, token: &str, table: &str, row: Value) -> ClientResult<Vec<Value>>;

    /// Patch every row matched by `query`; no precondition on current values.
    async fn update(&self, token: &str, query: &Query, patch: Value) -> ClientResult<Vec<Value>>;

    // -- Storage --

    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ClientResult<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}
