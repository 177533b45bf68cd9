use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use cleanify_types::api::{
    ApiErrorBody, AuthUser, Session, SignInRequest, SignUpRequest, SignUpResponse,
};

use super::Backend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::query::Query;

/// HTTP backend speaking to the hosted REST, auth and storage services.
pub struct RestBackend {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl RestBackend {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    fn rest_path(table: &str) -> String {
        format!("/rest/v1/{}", table)
    }
}

/// Turn a non-2xx response into [`ClientError::Api`] carrying the service's
/// own message when it sent one.
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|b| b.best_message())
        .unwrap_or(text);

    Err(ClientError::api(status.as_u16(), message))
}

#[async_trait]
impl Backend for RestBackend {
    async fn sign_up(&self, req: &SignUpRequest) -> ClientResult<SignUpResponse> {
        let resp = self
            .request(Method::POST, "/auth/v1/signup", None)
            .json(req)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn sign_in(&self, req: &SignInRequest) -> ClientResult<Session> {
        let resp = self
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(req)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let resp = self
            .request(Method::POST, "/auth/v1/logout", Some(access_token))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> ClientResult<AuthUser> {
        let resp = self
            .request(Method::GET, "/auth/v1/user", Some(access_token))
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn select(&self, token: Option<&str>, query: &Query) -> ClientResult<Vec<Value>> {
        let resp = self
            .request(Method::GET, &Self::rest_path(query.table_name()), token)
            .query(&query.to_pairs())
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn insert(&self, token: &str, table: &str, row: Value) -> ClientResult<Vec<Value>> {
        let resp = self
            .request(Method::POST, &Self::rest_path(table), Some(token))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn update(&self, token: &str, query: &Query, patch: Value) -> ClientResult<Vec<Value>> {
        let resp = self
            .request(Method::PATCH, &Self::rest_path(query.table_name()), Some(token))
            .header("Prefer", "return=representation")
            .query(&query.filter_pairs())
            .json(&patch)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ClientResult<()> {
        let resp = self
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", bucket, path),
                Some(token),
            )
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}
