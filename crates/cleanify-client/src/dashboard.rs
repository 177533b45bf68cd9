//! Per-role screen models. Each loader runs its independent fetches
//! concurrently and returns a serializable snapshot.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use cleanify_types::models::{
    AppRole, Profile, RecyclingTransaction, RequestStatus, VerificationStatus, WasteRequest,
};
use cleanify_types::schema;

use crate::client::CleanifyClient;
use crate::error::ClientResult;
use crate::guard::AuthContext;
use crate::ledger::{self, CitizenStats};
use crate::lifecycle::{self, Action};
use crate::map::{self, MapView};
use crate::query::{Direction, Query};

const UNKNOWN_CITIZEN: &str = "Unknown";

/// A request as shown in a task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub request: WasteRequest,
    pub citizen_name: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn of<'a>(requests: impl IntoIterator<Item = &'a WasteRequest>) -> Self {
        requests.into_iter().fold(Self::default(), |mut c, r| {
            if r.status == RequestStatus::Completed {
                c.completed += 1;
            } else {
                c.active += 1;
            }
            c
        })
    }
}

fn newest_first() -> impl Fn(&str) -> Query {
    |table: &str| Query::table(table).order("created_at", Direction::Desc)
}

/// Attach citizen names and the caller's available actions.
async fn task_views(
    client: &CleanifyClient,
    ctx: &AuthContext,
    requests: Vec<WasteRequest>,
) -> ClientResult<Vec<TaskView>> {
    let citizen_ids: Vec<Uuid> = requests
        .iter()
        .map(|r| r.citizen_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let names: HashMap<Uuid, String> = client
        .profiles_by_id(&citizen_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.full_name))
        .collect();

    Ok(requests
        .into_iter()
        .map(|request| TaskView {
            citizen_name: names
                .get(&request.citizen_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_CITIZEN.to_string()),
            actions: lifecycle::available_actions(&request, ctx),
            request,
        })
        .collect())
}

// -- Citizen --

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitizenDashboard {
    pub profile: Profile,
    pub stats: CitizenStats,
    pub requests: Vec<WasteRequest>,
    pub recycling: Vec<RecyclingTransaction>,
}

pub async fn citizen(client: &CleanifyClient, ctx: &AuthContext) -> ClientResult<CitizenDashboard> {
    let q = newest_first();
    let requests_q = q(schema::WASTE_REQUESTS).eq("citizen_id", ctx.user_id);
    let recycling_q = q(schema::RECYCLING_TRANSACTIONS).eq("citizen_id", ctx.user_id);

    let (profile, requests, recycling) = tokio::try_join!(
        client.profile(ctx.user_id),
        client.select::<WasteRequest>(&requests_q),
        client.select::<RecyclingTransaction>(&recycling_q),
    )?;

    Ok(CitizenDashboard {
        stats: CitizenStats::from_rows(&requests, &recycling),
        profile,
        requests,
        recycling,
    })
}

// -- Team (combined crew screen) --

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDashboard {
    pub profile: Profile,
    pub tasks: Vec<TaskView>,
    pub counts: TaskCounts,
    pub total_earnings: f64,
}

pub async fn team(client: &CleanifyClient, ctx: &AuthContext) -> ClientResult<TeamDashboard> {
    let tasks_q = newest_first()(schema::WASTE_REQUESTS).eq("assigned_team_id", ctx.user_id);
    let (profile, requests, earnings) = tokio::try_join!(
        client.profile(ctx.user_id),
        client.select::<WasteRequest>(&tasks_q),
        ledger::load_team_earnings(client, ctx.user_id),
    )?;

    let counts = TaskCounts::of(&requests);
    Ok(TeamDashboard {
        profile,
        tasks: task_views(client, ctx, requests).await?,
        counts,
        total_earnings: ledger::team_earnings_total(&earnings),
    })
}

// -- Team leader --

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamLeaderDashboard {
    pub profile: Profile,
    pub tasks: Vec<TaskView>,
    /// Every user holding the team_member role.
    pub team_members: Vec<Profile>,
    pub counts: TaskCounts,
    pub wallet_balance: f64,
    pub map: MapView,
}

pub async fn team_leader(
    client: &CleanifyClient,
    ctx: &AuthContext,
) -> ClientResult<TeamLeaderDashboard> {
    let tasks_q = newest_first()(schema::WASTE_REQUESTS).eq("assigned_team_id", ctx.user_id);
    let (profile, requests, team_members) = tokio::try_join!(
        client.profile(ctx.user_id),
        client.select::<WasteRequest>(&tasks_q),
        client.users_with_role(AppRole::TeamMember),
    )?;

    let counts = TaskCounts::of(&requests);
    let map = MapView::new(map::request_markers(&requests));
    Ok(TeamLeaderDashboard {
        wallet_balance: profile.wallet_balance,
        profile,
        tasks: task_views(client, ctx, requests).await?,
        team_members,
        counts,
        map,
    })
}

// -- Team member --

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMemberDashboard {
    pub profile: Profile,
    pub tasks: Vec<TaskView>,
    pub counts: TaskCounts,
    pub wallet_balance: f64,
    pub map: MapView,
}

/// Requests held by `user_id` either as member or directly as team.
pub async fn tasks_of(client: &CleanifyClient, user_id: Uuid) -> ClientResult<Vec<WasteRequest>> {
    let q = newest_first();
    let as_member = q(schema::WASTE_REQUESTS).eq("assigned_member_id", user_id);
    let as_team = q(schema::WASTE_REQUESTS).eq("assigned_team_id", user_id);
    let (mut tasks, direct) = tokio::try_join!(
        client.select::<WasteRequest>(&as_member),
        client.select::<WasteRequest>(&as_team),
    )?;

    let seen: HashSet<Uuid> = tasks.iter().map(|r| r.id).collect();
    tasks.extend(direct.into_iter().filter(|r| !seen.contains(&r.id)));
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(tasks)
}

pub async fn team_member(
    client: &CleanifyClient,
    ctx: &AuthContext,
) -> ClientResult<TeamMemberDashboard> {
    let (profile, requests) =
        tokio::try_join!(client.profile(ctx.user_id), tasks_of(client, ctx.user_id))?;

    let counts = TaskCounts::of(&requests);
    let map = MapView::new(map::request_markers(&requests));
    Ok(TeamMemberDashboard {
        wallet_balance: profile.wallet_balance,
        profile,
        tasks: task_views(client, ctx, requests).await?,
        counts,
        map,
    })
}

// -- Admin --

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminTotals {
    pub users: usize,
    pub requests: usize,
    pub recycled_items: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminPanel {
    pub profile: Profile,
    pub totals: AdminTotals,
    pub pending: Vec<TaskView>,
    /// Completed and still awaiting a verdict, latest completion first.
    pub awaiting_verification: Vec<TaskView>,
    pub team_leaders: Vec<Profile>,
}

pub async fn admin(client: &CleanifyClient, ctx: &AuthContext) -> ClientResult<AdminPanel> {
    let users_q = Query::table(schema::PROFILES).select("id");
    let requests_q = Query::table(schema::WASTE_REQUESTS);
    let recycling_q = Query::table(schema::RECYCLING_TRANSACTIONS);
    let pending_q = newest_first()(schema::WASTE_REQUESTS).eq("status", RequestStatus::Pending);
    // A null verification_status counts as pending, which `eq` cannot match.
    let completed_q = Query::table(schema::WASTE_REQUESTS)
        .eq("status", RequestStatus::Completed)
        .order("completed_at", Direction::Desc);

    let (profile, users, requests, recycling, pending, completed, team_leaders) = tokio::try_join!(
        client.profile(ctx.user_id),
        client.select::<serde_json::Value>(&users_q),
        client.select::<WasteRequest>(&requests_q),
        client.select::<RecyclingTransaction>(&recycling_q),
        client.select::<WasteRequest>(&pending_q),
        client.select::<WasteRequest>(&completed_q),
        client.users_with_role(AppRole::TeamLeader),
    )?;
    let awaiting: Vec<WasteRequest> = completed
        .into_iter()
        .filter(|r| r.verification() == VerificationStatus::Pending)
        .collect();

    let totals = AdminTotals {
        users: users.len(),
        requests: requests.len(),
        recycled_items: recycling.iter().map(RecyclingTransaction::item_count).sum(),
    };
    let (pending, awaiting_verification) = tokio::try_join!(
        task_views(client, ctx, pending),
        task_views(client, ctx, awaiting),
    )?;

    Ok(AdminPanel {
        profile,
        totals,
        pending,
        awaiting_verification,
        team_leaders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_split_on_completion() {
        let base = WasteRequest {
            id: Uuid::nil(),
            citizen_id: Uuid::nil(),
            number_of_bags: 1,
            address: None,
            latitude: None,
            longitude: None,
            photo_url: None,
            before_photo_url: None,
            after_photo_url: None,
            status: RequestStatus::Pending,
            verification_status: None,
            assigned_team_id: None,
            assigned_member_id: None,
            reward_pkr: 0.0,
            completed_at: None,
            verified_at: None,
            verified_by: None,
            created_at: None,
            updated_at: None,
        };
        let rows: Vec<WasteRequest> = [
            RequestStatus::Pending,
            RequestStatus::InProgress,
            RequestStatus::Completed,
        ]
        .into_iter()
        .map(|status| WasteRequest {
            status,
            ..base.clone()
        })
        .collect();

        assert_eq!(
            TaskCounts::of(&rows),
            TaskCounts {
                active: 2,
                completed: 1
            }
        );
    }
}
