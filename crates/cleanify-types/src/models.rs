use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles stored in `user_roles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    Admin,
    TeamLeader,
    TeamMember,
    Citizen,
}

impl AppRole {
    pub const ALL: [AppRole; 4] = [
        AppRole::Admin,
        AppRole::TeamLeader,
        AppRole::TeamMember,
        AppRole::Citizen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::TeamLeader => "team_leader",
            Self::TeamMember => "team_member",
            Self::Citizen => "citizen",
        }
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// `waste_requests.status` (the `request_status` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `waste_requests.verification_status`. A null column reads as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three photographs a request can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Citizen,
    Before,
    After,
}

impl PhotoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    /// Maintained by backend triggers; never written by this client.
    #[serde(default)]
    pub wallet_balance: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: AppRole,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRequest {
    pub id: Uuid,
    pub citizen_id: Uuid,
    pub number_of_bags: i32,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    pub before_photo_url: Option<String>,
    pub after_photo_url: Option<String>,
    pub status: RequestStatus,
    pub verification_status: Option<VerificationStatus>,
    pub assigned_team_id: Option<Uuid>,
    pub assigned_member_id: Option<Uuid>,
    #[serde(default)]
    pub reward_pkr: f64,
    pub completed_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WasteRequest {
    pub fn verification(&self) -> VerificationStatus {
        self.verification_status.unwrap_or(VerificationStatus::Pending)
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn has_crew_photos(&self) -> bool {
        self.before_photo_url.is_some() && self.after_photo_url.is_some()
    }

    /// True when `user_id` is the leader or member currently holding the task.
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assigned_team_id == Some(user_id) || self.assigned_member_id == Some(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecyclingTransaction {
    pub id: Uuid,
    pub citizen_id: Uuid,
    pub bottles: Option<i32>,
    pub cans: Option<i32>,
    pub total_items: Option<i32>,
    /// Computed server-side.
    #[serde(default)]
    pub reward_pkr: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl RecyclingTransaction {
    pub fn item_count(&self) -> i64 {
        i64::from(self.bottles.unwrap_or(0)) + i64::from(self.cans.unwrap_or(0))
    }
}

/// Append-only, written by backend triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEarning {
    pub id: Uuid,
    pub team_member_id: Uuid,
    pub waste_request_id: Uuid,
    pub amount_pkr: f64,
    #[serde(default)]
    pub payment_amount: f64,
    pub is_leader: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Append-only, written by backend triggers. Debits carry negative amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_pkr: f64,
    pub transaction_type: String,
    pub description: Option<String>,
    pub related_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: String,
    pub donor_email: Option<String>,
    pub amount_pkr: f64,
    pub donation_type: Option<String>,
    pub allocated_to: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kiosk {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in AppRole::ALL {
            assert_eq!(role.as_str().parse::<AppRole>().unwrap(), role);
        }
        assert!("cleaning_team".parse::<AppRole>().is_err());
    }

    #[test]
    fn waste_request_decodes_backend_row() {
        let row = serde_json::json!({
            "id": "6f1c1f5e-7d0c-4a4e-9d55-0a5f5d1b2c3d",
            "citizen_id": "0b9c8a7e-1111-4222-8333-944455556666",
            "number_of_bags": 3,
            "address": "Block 5, Clifton",
            "latitude": 24.81,
            "longitude": 67.03,
            "photo_url": null,
            "before_photo_url": null,
            "after_photo_url": null,
            "status": "in_progress",
            "verification_status": null,
            "assigned_team_id": null,
            "assigned_member_id": null,
            "reward_pkr": 60,
            "completed_at": null,
            "verified_at": null,
            "verified_by": null,
            "created_at": "2025-03-02T09:15:00.123456+00:00",
            "updated_at": null
        });

        let req: WasteRequest = serde_json::from_value(row).unwrap();
        assert_eq!(req.status, RequestStatus::InProgress);
        assert_eq!(req.verification(), VerificationStatus::Pending);
        assert_eq!(req.location(), Some((24.81, 67.03)));
        assert_eq!(req.reward_pkr, 60.0);
        assert!(!req.has_crew_photos());
    }

    #[test]
    fn recycling_item_count_treats_null_as_zero() {
        let tx = RecyclingTransaction {
            id: Uuid::new_v4(),
            citizen_id: Uuid::new_v4(),
            bottles: Some(4),
            cans: None,
            total_items: None,
            reward_pkr: 20.0,
            created_at: None,
        };
        assert_eq!(tx.item_count(), 4);
    }
}
