pub mod analytics;
pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod lifecycle;
pub mod map;
pub mod query;

pub use client::CleanifyClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use query::{Direction, Query};
