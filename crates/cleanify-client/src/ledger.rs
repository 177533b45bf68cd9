//! Read-only views over backend-maintained balances and ledgers.
//!
//! Balances and rewards are written by backend triggers. Sums computed here
//! are for display and never written back.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use cleanify_types::models::{
    RecyclingTransaction, TeamEarning, WalletTransaction, WasteRequest,
};
use cleanify_types::schema;

use crate::client::CleanifyClient;
use crate::error::ClientResult;
use crate::query::{Direction, Query};

/// Differences below half a paisa are rounding noise.
const RECONCILE_TOLERANCE_PKR: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletView {
    /// As stored on the profile.
    pub balance: f64,
    /// Newest first.
    pub transactions: Vec<WalletTransaction>,
    pub credited: f64,
    pub debited: f64,
    /// Sum of signed transaction amounts.
    pub ledger_sum: f64,
    /// `balance - ledger_sum`, when the two disagree.
    pub discrepancy: Option<f64>,
}

impl WalletView {
    pub fn from_rows(balance: f64, mut transactions: Vec<WalletTransaction>) -> Self {
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let credited = transactions
            .iter()
            .filter(|t| t.amount_pkr > 0.0)
            .map(|t| t.amount_pkr)
            .sum();
        let debited = transactions
            .iter()
            .filter(|t| t.amount_pkr < 0.0)
            .map(|t| -t.amount_pkr)
            .sum();
        let ledger_sum: f64 = transactions.iter().map(|t| t.amount_pkr).sum();

        let diff = balance - ledger_sum;
        let discrepancy = (diff.abs() > RECONCILE_TOLERANCE_PKR).then_some(diff);

        Self {
            balance,
            transactions,
            credited,
            debited,
            ledger_sum,
            discrepancy,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.discrepancy.is_none()
    }
}

pub async fn load_wallet(client: &CleanifyClient, user_id: Uuid) -> ClientResult<WalletView> {
    let tx_query = Query::table(schema::WALLET_TRANSACTIONS)
        .eq("user_id", user_id)
        .order("created_at", Direction::Desc);
    let (profile, transactions) = tokio::try_join!(
        client.profile(user_id),
        client.select::<WalletTransaction>(&tx_query),
    )?;

    let view = WalletView::from_rows(profile.wallet_balance, transactions);
    if let Some(diff) = view.discrepancy {
        warn!(
            "Wallet of {} differs from its ledger by {:.2} PKR",
            user_id, diff
        );
    }
    Ok(view)
}

pub fn team_earnings_total(earnings: &[TeamEarning]) -> f64 {
    earnings.iter().map(|e| e.amount_pkr).sum()
}

pub async fn load_team_earnings(
    client: &CleanifyClient,
    user_id: Uuid,
) -> ClientResult<Vec<TeamEarning>> {
    client
        .select(
            &Query::table(schema::TEAM_EARNINGS)
                .eq("team_member_id", user_id)
                .order("created_at", Direction::Desc),
        )
        .await
}

/// Totals on the citizen dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitizenStats {
    pub total_pickups: usize,
    pub items_recycled: i64,
    pub recycling_rewards: f64,
}

impl CitizenStats {
    pub fn from_rows(requests: &[WasteRequest], recycling: &[RecyclingTransaction]) -> Self {
        Self {
            total_pickups: requests.len(),
            items_recycled: recycling.iter().map(RecyclingTransaction::item_count).sum(),
            recycling_rewards: recycling.iter().map(|r| r.reward_pkr).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tx(amount: f64, day: u32) -> WalletTransaction {
        WalletTransaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            amount_pkr: amount,
            transaction_type: if amount >= 0.0 { "credit" } else { "debit" }.into(),
            description: None,
            related_id: None,
            created_at: Some(Utc.with_ymd_and_hms(2025, 4, day, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn wallet_totals_and_order() {
        let view = WalletView::from_rows(75.0, vec![tx(100.0, 1), tx(-25.0, 3), tx(0.0, 2)]);
        assert_eq!(view.credited, 100.0);
        assert_eq!(view.debited, 25.0);
        assert_eq!(view.ledger_sum, 75.0);
        assert!(view.is_reconciled());
        assert_eq!(view.transactions[0].amount_pkr, -25.0);
        assert_eq!(view.transactions[2].amount_pkr, 100.0);
    }

    #[test]
    fn wallet_reports_mismatch_without_correcting() {
        let view = WalletView::from_rows(90.0, vec![tx(100.0, 1), tx(-25.0, 2)]);
        assert_eq!(view.balance, 90.0);
        assert_eq!(view.discrepancy, Some(15.0));
    }

    #[test]
    fn citizen_stats_sum_items_and_rewards() {
        let recycling = vec![
            RecyclingTransaction {
                id: Uuid::new_v4(),
                citizen_id: Uuid::nil(),
                bottles: Some(3),
                cans: Some(2),
                total_items: Some(5),
                reward_pkr: 25.0,
                created_at: None,
            },
            RecyclingTransaction {
                id: Uuid::new_v4(),
                citizen_id: Uuid::nil(),
                bottles: None,
                cans: Some(4),
                total_items: None,
                reward_pkr: 20.0,
                created_at: None,
            },
        ];
        let stats = CitizenStats::from_rows(&[], &recycling);
        assert_eq!(stats.total_pickups, 0);
        assert_eq!(stats.items_recycled, 9);
        assert_eq!(stats.recycling_rewards, 45.0);
    }
}
