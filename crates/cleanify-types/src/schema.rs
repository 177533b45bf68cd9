//! Table, bucket and path names of the hosted backend. These are fixed by the
//! backend's schema; the client only consumes them.

use uuid::Uuid;

pub const PROFILES: &str = "profiles";
pub const USER_ROLES: &str = "user_roles";
pub const WASTE_REQUESTS: &str = "waste_requests";
pub const RECYCLING_TRANSACTIONS: &str = "recycling_transactions";
pub const TEAM_EARNINGS: &str = "team_earnings";
pub const WALLET_TRANSACTIONS: &str = "wallet_transactions";
pub const DONATIONS: &str = "donations";
pub const KIOSKS: &str = "kiosks";

pub const PHOTO_BUCKET: &str = "waste-photos";
pub const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Object path inside [`PHOTO_BUCKET`]: `{userId}/{timestamp}.jpg`.
pub fn photo_object_path(user_id: Uuid, timestamp_ms: i64) -> String {
    format!("{}/{}.jpg", user_id, timestamp_ms)
}

/// Crew photographs live at the bucket root: `{prefix}_{requestId}_{timestamp}.jpg`.
pub fn crew_photo_object_path(prefix: &str, request_id: Uuid, timestamp_ms: i64) -> String {
    format!("{}_{}_{}.jpg", prefix, request_id, timestamp_ms)
}
