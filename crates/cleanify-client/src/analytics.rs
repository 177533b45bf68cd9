//! Admin analytics over full-table fetches.
//!
//! Week buckets are `YYYY-W{n}` with `n = ceil(day_of_month / 7)`, so the same
//! week number of different months shares a bucket. Dashboards built on this
//! report have always grouped that way.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use cleanify_types::models::{Donation, Profile, RecyclingTransaction, RequestStatus, WasteRequest};
use cleanify_types::schema;

use crate::client::CleanifyClient;
use crate::error::ClientResult;
use crate::query::{Direction, Query};

pub const WEEKS_SHOWN: usize = 8;
pub const MONTHS_SHOWN: usize = 6;
pub const TOP_TEAMS: usize = 10;

pub fn week_key(at: &DateTime<Utc>) -> String {
    format!("{}-W{}", at.year(), at.day().div_ceil(7))
}

pub fn month_key(at: &DateTime<Utc>) -> String {
    format!("{}-{:02}", at.year(), at.month())
}

/// Keep the last `n` entries of a key-sorted map.
fn last_n<V>(buckets: BTreeMap<String, V>, n: usize) -> Vec<(String, V)> {
    let skip = buckets.len().saturating_sub(n);
    buckets.into_iter().skip(skip).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCount {
    pub week: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyRecycling {
    pub week: String,
    pub bottles: i64,
    pub cans: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSlice {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPerformance {
    pub team_id: Uuid,
    pub name: String,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAmount {
    pub month: String,
    pub amount: f64,
}

pub fn weekly_pickups(requests: &[WasteRequest]) -> Vec<WeeklyCount> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for at in requests.iter().filter_map(|r| r.created_at.as_ref()) {
        *buckets.entry(week_key(at)).or_default() += 1;
    }
    last_n(buckets, WEEKS_SHOWN)
        .into_iter()
        .map(|(week, count)| WeeklyCount { week, count })
        .collect()
}

pub fn weekly_recycling(transactions: &[RecyclingTransaction]) -> Vec<WeeklyRecycling> {
    let mut buckets: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for tx in transactions {
        let Some(at) = tx.created_at.as_ref() else {
            continue;
        };
        let bucket = buckets.entry(week_key(at)).or_default();
        bucket.0 += i64::from(tx.bottles.unwrap_or(0));
        bucket.1 += i64::from(tx.cans.unwrap_or(0));
    }
    last_n(buckets, WEEKS_SHOWN)
        .into_iter()
        .map(|(week, (bottles, cans))| WeeklyRecycling {
            week,
            bottles,
            cans,
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Count per status, in order of first appearance.
pub fn status_breakdown(requests: &[WasteRequest]) -> Vec<StatusSlice> {
    let mut slices: Vec<(RequestStatus, usize)> = Vec::new();
    for req in requests {
        match slices.iter_mut().find(|(s, _)| *s == req.status) {
            Some((_, n)) => *n += 1,
            None => slices.push((req.status, 1)),
        }
    }
    slices
        .into_iter()
        .map(|(status, value)| StatusSlice {
            name: capitalize(status.as_str()),
            value,
        })
        .collect()
}

/// Completed requests per assigned team, best first.
pub fn team_performance(requests: &[WasteRequest], profiles: &[Profile]) -> Vec<TeamPerformance> {
    let names: HashMap<Uuid, &str> = profiles
        .iter()
        .map(|p| (p.id, p.full_name.as_str()))
        .collect();

    let mut teams: Vec<TeamPerformance> = Vec::new();
    for req in requests.iter().filter(|r| r.status == RequestStatus::Completed) {
        let Some(team_id) = req.assigned_team_id else {
            continue;
        };
        match teams.iter_mut().find(|t| t.team_id == team_id) {
            Some(t) => t.completed += 1,
            None => teams.push(TeamPerformance {
                team_id,
                name: names.get(&team_id).copied().unwrap_or("Unknown").to_string(),
                completed: 1,
            }),
        }
    }

    teams.sort_by(|a, b| b.completed.cmp(&a.completed));
    teams.truncate(TOP_TEAMS);
    teams
}

pub fn monthly_donations(donations: &[Donation]) -> Vec<MonthlyAmount> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for d in donations {
        if let Some(at) = d.created_at.as_ref() {
            *buckets.entry(month_key(at)).or_default() += d.amount_pkr;
        }
    }
    last_n(buckets, MONTHS_SHOWN)
        .into_iter()
        .map(|(month, amount)| MonthlyAmount { month, amount })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsTotals {
    pub users: usize,
    pub requests: usize,
    pub recycled_items: i64,
    pub donations_pkr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub totals: AnalyticsTotals,
    pub pickup_trend: Vec<WeeklyCount>,
    pub recycling_trend: Vec<WeeklyRecycling>,
    pub status_breakdown: Vec<StatusSlice>,
    pub team_performance: Vec<TeamPerformance>,
    pub monthly_donations: Vec<MonthlyAmount>,
}

impl Analytics {
    pub fn compute(
        profiles: &[Profile],
        requests: &[WasteRequest],
        recycling: &[RecyclingTransaction],
        donations: &[Donation],
    ) -> Self {
        let totals = AnalyticsTotals {
            users: profiles.len(),
            requests: requests.len(),
            recycled_items: recycling
                .iter()
                .map(|r| r.total_items.map(i64::from).unwrap_or_else(|| r.item_count()))
                .sum(),
            donations_pkr: donations.iter().map(|d| d.amount_pkr).sum(),
        };

        Self {
            totals,
            pickup_trend: weekly_pickups(requests),
            recycling_trend: weekly_recycling(recycling),
            status_breakdown: status_breakdown(requests),
            team_performance: team_performance(requests, profiles),
            monthly_donations: monthly_donations(donations),
        }
    }
}

pub async fn load_analytics(client: &CleanifyClient) -> ClientResult<Analytics> {
    let by_age = |table: &str| Query::table(table).order("created_at", Direction::Asc);
    let profiles_q = Query::table(schema::PROFILES);
    let requests_q = by_age(schema::WASTE_REQUESTS);
    let recycling_q = by_age(schema::RECYCLING_TRANSACTIONS);
    let donations_q = by_age(schema::DONATIONS);

    let (profiles, requests, recycling, donations) = tokio::try_join!(
        client.select::<Profile>(&profiles_q),
        client.select::<WasteRequest>(&requests_q),
        client.select::<RecyclingTransaction>(&recycling_q),
        client.select::<Donation>(&donations_q),
    )?;
    Ok(Analytics::compute(&profiles, &requests, &recycling, &donations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn request(status: RequestStatus, team: Option<Uuid>, created: DateTime<Utc>) -> WasteRequest {
        WasteRequest {
            id: Uuid::new_v4(),
            citizen_id: Uuid::new_v4(),
            number_of_bags: 1,
            address: None,
            latitude: None,
            longitude: None,
            photo_url: None,
            before_photo_url: None,
            after_photo_url: None,
            status,
            verification_status: None,
            assigned_team_id: team,
            assigned_member_id: None,
            reward_pkr: 0.0,
            completed_at: None,
            verified_at: None,
            verified_by: None,
            created_at: Some(created),
            updated_at: None,
        }
    }

    #[test]
    fn week_key_uses_day_of_month() {
        assert_eq!(week_key(&at(2025, 3, 1)), "2025-W1");
        assert_eq!(week_key(&at(2025, 3, 7)), "2025-W1");
        assert_eq!(week_key(&at(2025, 3, 8)), "2025-W2");
        assert_eq!(week_key(&at(2025, 3, 31)), "2025-W5");
        assert_eq!(month_key(&at(2025, 3, 31)), "2025-03");
    }

    #[test]
    fn weekly_trend_merges_months_and_keeps_last_eight() {
        let reqs = vec![
            request(RequestStatus::Pending, None, at(2025, 1, 2)),
            request(RequestStatus::Pending, None, at(2025, 2, 3)),
            request(RequestStatus::Pending, None, at(2025, 2, 20)),
        ];
        let trend = weekly_pickups(&reqs);
        assert_eq!(
            trend,
            vec![
                WeeklyCount { week: "2025-W1".into(), count: 2 },
                WeeklyCount { week: "2025-W3".into(), count: 1 },
            ]
        );

        let many: Vec<WasteRequest> = (2018..2028)
            .map(|y| request(RequestStatus::Pending, None, at(y, 1, 1)))
            .collect();
        let trend = weekly_pickups(&many);
        assert_eq!(trend.len(), WEEKS_SHOWN);
        assert_eq!(trend[0].week, "2020-W1");
    }

    #[test]
    fn status_names_are_capitalized_in_first_seen_order() {
        let t = at(2025, 1, 1);
        let reqs = vec![
            request(RequestStatus::InProgress, None, t),
            request(RequestStatus::Pending, None, t),
            request(RequestStatus::InProgress, None, t),
        ];
        assert_eq!(
            status_breakdown(&reqs),
            vec![
                StatusSlice { name: "In_progress".into(), value: 2 },
                StatusSlice { name: "Pending".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn team_performance_ranks_completed_work() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let t = at(2025, 1, 1);
        let reqs = vec![
            request(RequestStatus::Completed, Some(a), t),
            request(RequestStatus::Completed, Some(b), t),
            request(RequestStatus::Completed, Some(b), t),
            request(RequestStatus::Assigned, Some(a), t),
            request(RequestStatus::Completed, None, t),
        ];
        let profiles = vec![Profile {
            id: b,
            full_name: "Team Gulshan".into(),
            email: "g@example.pk".into(),
            wallet_balance: 0.0,
            created_at: None,
            updated_at: None,
        }];

        let ranking = team_performance(&reqs, &profiles);
        assert_eq!(ranking.len(), 2);
        assert_eq!((ranking[0].name.as_str(), ranking[0].completed), ("Team Gulshan", 2));
        assert_eq!((ranking[1].name.as_str(), ranking[1].completed), ("Unknown", 1));
    }

    #[test]
    fn donations_bucket_by_month() {
        let donation = |m: u32, amount: f64| Donation {
            id: Uuid::new_v4(),
            donor_name: "Anon".into(),
            donor_email: None,
            amount_pkr: amount,
            donation_type: None,
            allocated_to: None,
            created_at: Some(at(2024, m, 5)),
        };
        let months: Vec<Donation> = (1..=8).map(|m| donation(m, 100.0)).chain([donation(8, 50.0)]).collect();
        let trend = monthly_donations(&months);
        assert_eq!(trend.len(), MONTHS_SHOWN);
        assert_eq!(trend[0].month, "2024-03");
        assert_eq!(trend[5], MonthlyAmount { month: "2024-08".into(), amount: 150.0 });

        let totals = Analytics::compute(&[], &[], &[], &months).totals;
        assert_eq!(totals.donations_pkr, 850.0);
    }
}
