//! Waste-request lifecycle.
//!
//! `pending -> assigned -> in_progress -> completed`, then a one-way
//! verification verdict. Every write is a single unconditional update by id.
//! Actions are checked against the row as last fetched, so two concurrent
//! writers can still race; the last write wins.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use cleanify_types::api::{NewRecyclingTransaction, NewWasteRequest, WasteRequestPatch};
use cleanify_types::models::{
    AppRole, PhotoKind, RecyclingTransaction, RequestStatus, VerificationStatus, WasteRequest,
};
use cleanify_types::schema;

use crate::client::CleanifyClient;
use crate::error::{ClientError, ClientResult};
use crate::guard::AuthContext;
use crate::query::Query;

/// Pickup price shown to the citizen before submitting.
pub const PICKUP_COST_PER_BAG_PKR: f64 = 20.0;
/// Recycling reward shown before submitting. The backend computes the real one.
pub const RECYCLING_REWARD_PER_ITEM_PKR: f64 = 5.0;

pub fn pickup_cost_preview(bags: i32) -> f64 {
    f64::from(bags.max(0)) * PICKUP_COST_PER_BAG_PKR
}

pub fn recycling_reward_preview(bottles: i32, cans: i32) -> f64 {
    recycled_items(bottles, cans) as f64 * RECYCLING_REWARD_PER_ITEM_PKR
}

/// Item total of one drop-off, widened so large counts cannot overflow.
fn recycled_items(bottles: i32, cans: i32) -> i64 {
    i64::from(bottles.max(0)) + i64::from(cans.max(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AssignToTeam,
    AssignToMember,
    StartWork,
    UploadBeforePhoto,
    UploadAfterPhoto,
    Complete,
    Approve,
    Reject,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::AssignToTeam,
        Action::AssignToMember,
        Action::StartWork,
        Action::UploadBeforePhoto,
        Action::UploadAfterPhoto,
        Action::Complete,
        Action::Approve,
        Action::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignToTeam => "assign to team",
            Self::AssignToMember => "assign to member",
            Self::StartWork => "start work",
            Self::UploadBeforePhoto => "upload before photo",
            Self::UploadAfterPhoto => "upload after photo",
            Self::Complete => "complete",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// Whether the request's current state admits this action at all.
    fn state_allows(&self, req: &WasteRequest) -> bool {
        use RequestStatus::*;
        let working = matches!(req.status, Assigned | InProgress);
        match self {
            Self::AssignToTeam => req.status == Pending,
            Self::AssignToMember => {
                matches!(req.status, Pending | Assigned) && req.assigned_member_id.is_none()
            }
            Self::StartWork => req.status == Assigned,
            Self::UploadBeforePhoto => working && req.before_photo_url.is_none(),
            Self::UploadAfterPhoto => working && req.after_photo_url.is_none(),
            Self::Complete => working && req.has_crew_photos(),
            Self::Approve | Self::Reject => {
                req.status == Completed && req.verification() == VerificationStatus::Pending
            }
        }
    }

    /// Whether the caller's roles and relation to the request admit this action.
    fn role_allows(&self, req: &WasteRequest, ctx: &AuthContext) -> bool {
        let leads_it = ctx.has_role(AppRole::TeamLeader) && req.assigned_team_id == Some(ctx.user_id);
        match self {
            Self::AssignToTeam | Self::Reject => ctx.has_role(AppRole::Admin),
            Self::AssignToMember => leads_it,
            Self::StartWork | Self::UploadBeforePhoto | Self::UploadAfterPhoto | Self::Complete => {
                req.is_assigned_to(ctx.user_id)
            }
            Self::Approve => ctx.has_role(AppRole::Admin) || leads_it,
        }
    }
}

/// Actions the caller may take on `req` in its current state.
pub fn available_actions(req: &WasteRequest, ctx: &AuthContext) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|a| a.state_allows(req) && a.role_allows(req, ctx))
        .collect()
}

fn describe_state(req: &WasteRequest) -> String {
    if req.status == RequestStatus::Completed {
        format!("completed ({})", req.verification())
    } else {
        req.status.to_string()
    }
}

/// Who receives an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignee {
    /// A team leader, chosen by an admin.
    Team(Uuid),
    /// A team member, chosen by the leader holding the request.
    Member(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    fn status(&self) -> VerificationStatus {
        match self {
            Self::Approve => VerificationStatus::Approved,
            Self::Reject => VerificationStatus::Rejected,
        }
    }

    fn action(&self) -> Action {
        match self {
            Self::Approve => Action::Approve,
            Self::Reject => Action::Reject,
        }
    }
}

/// Citizen's pickup form.
#[derive(Debug, Clone, Default)]
pub struct PickupRequest {
    pub bags: i32,
    pub photo: Option<Vec<u8>>,
    /// `(latitude, longitude)`
    pub location: Option<(f64, f64)>,
    pub address: Option<String>,
}

impl PickupRequest {
    pub fn validate(&self) -> ClientResult<()> {
        if self.bags < 1 {
            return Err(ClientError::validation("Number of bags must be at least 1"));
        }
        if self.photo.as_ref().is_none_or(|p| p.is_empty()) {
            return Err(ClientError::validation("Please take a photo of the waste"));
        }
        let Some((lat, lon)) = self.location else {
            return Err(ClientError::validation("Please enable location to request a pickup"));
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ClientError::validation("Location is out of range"));
        }
        Ok(())
    }

    pub fn cost_preview(&self) -> f64 {
        pickup_cost_preview(self.bags)
    }
}

pub async fn fetch_request(client: &CleanifyClient, id: Uuid) -> ClientResult<WasteRequest> {
    client
        .maybe_one(&Query::table(schema::WASTE_REQUESTS).eq("id", id))
        .await?
        .ok_or_else(|| ClientError::not_found(format!("waste request {}", id)))
}

/// Fetch the request and confirm `action` is currently open to the caller.
async fn checked(
    client: &CleanifyClient,
    ctx: &AuthContext,
    id: Uuid,
    action: Action,
) -> ClientResult<WasteRequest> {
    let req = fetch_request(client, id).await?;
    let denied = || {
        ClientError::access_denied(format!(
            "{} is not allowed to {} request {}",
            ctx.user_id,
            action.as_str(),
            id
        ))
    };

    if action == Action::Complete && req.status.is_active() && !req.has_crew_photos() {
        if !action.role_allows(&req, ctx) {
            return Err(denied());
        }
        return Err(ClientError::validation(
            "Please upload both before and after photos first",
        ));
    }
    if !action.state_allows(&req) {
        return Err(ClientError::invalid_transition(action.as_str(), describe_state(&req)));
    }
    if !action.role_allows(&req, ctx) {
        return Err(denied());
    }
    Ok(req)
}

async fn write(
    client: &CleanifyClient,
    id: Uuid,
    patch: &WasteRequestPatch,
) -> ClientResult<WasteRequest> {
    let mut rows: Vec<WasteRequest> = client
        .update(&Query::table(schema::WASTE_REQUESTS).eq("id", id), patch)
        .await?;
    rows.pop()
        .ok_or_else(|| ClientError::not_found(format!("waste request {}", id)))
}

/// Upload the citizen's photo, then insert a pending request.
pub async fn request_pickup(
    client: &CleanifyClient,
    ctx: &AuthContext,
    form: PickupRequest,
) -> ClientResult<WasteRequest> {
    form.validate()?;
    let PickupRequest {
        bags,
        photo,
        location,
        address,
    } = form;
    let (Some(photo), Some((latitude, longitude))) = (photo, location) else {
        return Err(ClientError::validation("Photo and location are required"));
    };

    let path = schema::photo_object_path(ctx.user_id, Utc::now().timestamp_millis());
    let photo_url = client
        .upload(schema::PHOTO_BUCKET, &path, photo, schema::PHOTO_CONTENT_TYPE)
        .await?;

    let row = NewWasteRequest {
        citizen_id: ctx.user_id,
        number_of_bags: bags,
        photo_url,
        latitude,
        longitude,
        address: address.filter(|a| !a.trim().is_empty()),
    };
    let created: WasteRequest = client.insert(schema::WASTE_REQUESTS, &row).await?;
    info!(
        "Pickup {} requested by {} ({} bags, preview {} PKR)",
        created.id,
        ctx.user_id,
        bags,
        pickup_cost_preview(bags)
    );
    Ok(created)
}

/// Record counts only; the reward is computed by the backend.
pub async fn record_recycling(
    client: &CleanifyClient,
    ctx: &AuthContext,
    bottles: i32,
    cans: i32,
) -> ClientResult<RecyclingTransaction> {
    if bottles < 0 || cans < 0 {
        return Err(ClientError::validation("Item counts cannot be negative"));
    }
    if bottles == 0 && cans == 0 {
        return Err(ClientError::validation("Please add at least one item to recycle"));
    }

    let row = NewRecyclingTransaction {
        citizen_id: ctx.user_id,
        bottles,
        cans,
    };
    let tx: RecyclingTransaction = client.insert(schema::RECYCLING_TRANSACTIONS, &row).await?;
    info!(
        "Recycling {} recorded for {} ({} items)",
        tx.id,
        ctx.user_id,
        recycled_items(bottles, cans)
    );
    Ok(tx)
}

pub async fn assign(
    client: &CleanifyClient,
    ctx: &AuthContext,
    id: Uuid,
    assignee: Assignee,
) -> ClientResult<WasteRequest> {
    let (action, target, role) = match assignee {
        Assignee::Team(uid) => (Action::AssignToTeam, uid, AppRole::TeamLeader),
        Assignee::Member(uid) => (Action::AssignToMember, uid, AppRole::TeamMember),
    };
    checked(client, ctx, id, action).await?;

    if !client.has_role(target, role).await? {
        return Err(ClientError::validation(format!("{} is not a {}", target, role)));
    }

    let mut patch = WasteRequestPatch {
        status: Some(RequestStatus::Assigned),
        ..Default::default()
    };
    match assignee {
        Assignee::Team(uid) => patch.assigned_team_id = Some(uid),
        Assignee::Member(uid) => patch.assigned_member_id = Some(uid),
    }

    let updated = write(client, id, &patch).await?;
    info!("Request {} assigned to {} {}", id, role, target);
    Ok(updated)
}

pub async fn start_work(
    client: &CleanifyClient,
    ctx: &AuthContext,
    id: Uuid,
) -> ClientResult<WasteRequest> {
    checked(client, ctx, id, Action::StartWork).await?;
    let patch = WasteRequestPatch {
        status: Some(RequestStatus::InProgress),
        ..Default::default()
    };
    let updated = write(client, id, &patch).await?;
    info!("Request {} in progress ({})", id, ctx.user_id);
    Ok(updated)
}

/// Upload a crew photo and store its public URL on the request.
pub async fn attach_photo(
    client: &CleanifyClient,
    ctx: &AuthContext,
    id: Uuid,
    kind: PhotoKind,
    bytes: Vec<u8>,
) -> ClientResult<WasteRequest> {
    let action = match kind {
        PhotoKind::Before => Action::UploadBeforePhoto,
        PhotoKind::After => Action::UploadAfterPhoto,
        PhotoKind::Citizen => {
            return Err(ClientError::validation(
                "The citizen photo is attached when the pickup is requested",
            ));
        }
    };
    if bytes.is_empty() {
        return Err(ClientError::validation("No photo captured"));
    }
    checked(client, ctx, id, action).await?;

    let path = schema::crew_photo_object_path(kind.as_str(), id, Utc::now().timestamp_millis());
    let url = client
        .upload(schema::PHOTO_BUCKET, &path, bytes, schema::PHOTO_CONTENT_TYPE)
        .await?;

    let mut patch = WasteRequestPatch::default();
    match kind {
        PhotoKind::Before => patch.before_photo_url = Some(url),
        _ => patch.after_photo_url = Some(url),
    }
    let updated = write(client, id, &patch).await?;
    info!("{} photo attached to request {}", kind.as_str(), id);
    Ok(updated)
}

pub async fn complete(
    client: &CleanifyClient,
    ctx: &AuthContext,
    id: Uuid,
) -> ClientResult<WasteRequest> {
    checked(client, ctx, id, Action::Complete).await?;
    let patch = WasteRequestPatch {
        status: Some(RequestStatus::Completed),
        completed_at: Some(Utc::now()),
        ..Default::default()
    };
    let updated = write(client, id, &patch).await?;
    info!("Request {} completed, awaiting verification", id);
    Ok(updated)
}

/// Record the verdict. Rewards follow from backend triggers on approval.
pub async fn verify(
    client: &CleanifyClient,
    ctx: &AuthContext,
    id: Uuid,
    verdict: Verdict,
) -> ClientResult<WasteRequest> {
    checked(client, ctx, id, verdict.action()).await?;
    let patch = WasteRequestPatch {
        verification_status: Some(verdict.status()),
        verified_by: Some(ctx.user_id),
        verified_at: Some(Utc::now()),
        ..Default::default()
    };
    let updated = write(client, id, &patch).await?;
    info!("Request {} {} by {}", id, verdict.status(), ctx.user_id);
    Ok(updated)
}
