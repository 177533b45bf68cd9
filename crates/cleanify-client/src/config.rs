use std::path::PathBuf;

use crate::error::{ClientError, ClientResult};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_PATH: &str = ".cleanify-session.json";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project URL, e.g. `https://abc.example.co`. No trailing slash.
    pub base_url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    pub timeout_secs: u64,
    pub session_path: PathBuf,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::config(format!(
                "backend URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ClientError::config("anon key is empty"));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::config("timeout must be at least one second"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_trailing_slash() {
        let config = ClientConfig::new("https://demo.example.co/", "anon");
        assert_eq!(config.base_url, "https://demo.example.co");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_scheme_and_empty_key() {
        assert!(ClientConfig::new("demo.example.co", "anon").validate().is_err());
        assert!(ClientConfig::new("https://demo.example.co", " ").validate().is_err());
    }
}
