//! Output formatting.

use serde::Serialize;
use serde_json::json;

use cleanify_client::analytics::Analytics;
use cleanify_client::dashboard::{
    AdminPanel, CitizenDashboard, TaskView, TeamDashboard, TeamLeaderDashboard,
    TeamMemberDashboard,
};
use cleanify_client::guard::{AuthContext, Screen};
use cleanify_client::ledger::WalletView;
use cleanify_client::lifecycle::Action;
use cleanify_client::map::MapView;
use cleanify_types::api::AuthUser;
use cleanify_types::models::{Profile, WasteRequest};

use crate::commands::OutputFormat;

/// Format and print data based on output format
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(data),
        // No dedicated table layout; fall back to JSON
        OutputFormat::Table => print_json(data),
    }
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error formatting JSON: {}", e),
    }
}

/// Status lines go to stderr in JSON mode so stdout stays parseable.
pub fn print_message(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => eprintln!("{}", message),
        OutputFormat::Table => println!("{}", message),
    }
}

fn short(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn money(pkr: f64) -> String {
    format!("{:.2} PKR", pkr)
}

fn heading(title: &str) {
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
}

pub fn print_signed_in(user: &AuthUser, home: Screen, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&json!({"user": user, "home": home.path()})),
        OutputFormat::Table => {
            println!("Signed in as {}", user.email.as_deref().unwrap_or("(no email)"));
            println!("User ID: {}", user.id);
            println!("Home:    {}", home.path());
        }
    }
}

pub fn print_identity(ctx: &AuthContext, home: Screen, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&json!({"identity": ctx, "home": home.path()})),
        OutputFormat::Table => {
            let roles: Vec<&str> = ctx.roles.iter().map(|r| r.as_str()).collect();
            println!("User ID: {}", ctx.user_id);
            println!("Email:   {}", ctx.email.as_deref().unwrap_or("-"));
            println!("Roles:   {}", if roles.is_empty() { "-".to_string() } else { roles.join(", ") });
            println!("Home:    {}", home.path());
        }
    }
}

pub fn print_request(req: &WasteRequest, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(req),
        OutputFormat::Table => {
            println!("Request {}", req.id);
            println!("  Status:       {}", req.status);
            println!("  Verification: {}", req.verification());
            println!("  Bags:         {}", req.number_of_bags);
            if let Some(addr) = &req.address {
                println!("  Address:      {}", addr);
            }
            if let Some((lat, lon)) = req.location() {
                println!("  Location:     {:.5}, {:.5}", lat, lon);
            }
            if let Some(team) = req.assigned_team_id {
                println!("  Team:         {}", team);
            }
            if let Some(member) = req.assigned_member_id {
                println!("  Member:       {}", member);
            }
            println!(
                "  Photos:       before {} / after {}",
                if req.before_photo_url.is_some() { "yes" } else { "no" },
                if req.after_photo_url.is_some() { "yes" } else { "no" }
            );
        }
    }
}

fn print_task_table(tasks: &[TaskView]) {
    if tasks.is_empty() {
        println!("  (no tasks)");
        return;
    }
    println!(
        "  {:<8}  {:<11}  {:<9}  {:>4}  {:<20}  ACTIONS",
        "ID", "STATUS", "VERIFY", "BAGS", "CITIZEN"
    );
    for t in tasks {
        let actions: Vec<&str> = t.actions.iter().map(Action::as_str).collect();
        println!(
            "  {:<8}  {:<11}  {:<9}  {:>4}  {:<20}  {}",
            short(&t.request.id),
            t.request.status.as_str(),
            t.request.verification().as_str(),
            t.request.number_of_bags,
            t.citizen_name,
            actions.join(", ")
        );
    }
}

fn print_people(title: &str, people: &[Profile]) {
    println!("{}:", title);
    if people.is_empty() {
        println!("  (none)");
    }
    for p in people {
        println!("  {}  {} <{}>", p.id, p.full_name, p.email);
    }
}

pub fn print_citizen(board: &CitizenDashboard, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(board),
        OutputFormat::Table => {
            heading(&format!("Welcome, {}", board.profile.full_name));
            println!("Wallet:          {}", money(board.profile.wallet_balance));
            println!("Pickups:         {}", board.stats.total_pickups);
            println!("Items recycled:  {}", board.stats.items_recycled);
            println!("Recycling earned {}", money(board.stats.recycling_rewards));
            println!();
            println!("Recent pickups:");
            for r in board.requests.iter().take(10) {
                println!(
                    "  {}  {:<11}  {} bags",
                    short(&r.id),
                    r.status.as_str(),
                    r.number_of_bags
                );
            }
        }
    }
}

pub fn print_team(board: &TeamDashboard, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(board),
        OutputFormat::Table => {
            heading(&format!("Team: {}", board.profile.full_name));
            println!("Active tasks:    {}", board.counts.active);
            println!("Completed tasks: {}", board.counts.completed);
            println!("Total earnings:  {}", money(board.total_earnings));
            println!();
            print_task_table(&board.tasks);
        }
    }
}

pub fn print_team_leader(board: &TeamLeaderDashboard, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(board),
        OutputFormat::Table => {
            heading(&format!("Team leader: {}", board.profile.full_name));
            println!("Wallet:          {}", money(board.wallet_balance));
            println!("Active tasks:    {}", board.counts.active);
            println!("Completed tasks: {}", board.counts.completed);
            println!("Map markers:     {}", board.map.markers.len());
            println!();
            print_task_table(&board.tasks);
            println!();
            print_people("Team members", &board.team_members);
        }
    }
}

pub fn print_team_member(board: &TeamMemberDashboard, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(board),
        OutputFormat::Table => {
            heading(&format!("Team member: {}", board.profile.full_name));
            println!("Wallet:          {}", money(board.wallet_balance));
            println!("Active tasks:    {}", board.counts.active);
            println!("Completed tasks: {}", board.counts.completed);
            println!();
            print_task_table(&board.tasks);
        }
    }
}

pub fn print_admin_panel(panel: &AdminPanel, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(panel),
        OutputFormat::Table => {
            heading("Admin panel");
            println!("Users:          {}", panel.totals.users);
            println!("Requests:       {}", panel.totals.requests);
            println!("Items recycled: {}", panel.totals.recycled_items);
            println!();
            println!("Pending requests:");
            print_task_table(&panel.pending);
            println!();
            println!("Awaiting verification:");
            print_task_table(&panel.awaiting_verification);
            println!();
            print_people("Team leaders", &panel.team_leaders);
        }
    }
}

pub fn print_wallet(wallet: &WalletView, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(wallet),
        OutputFormat::Table => {
            heading("Wallet");
            println!("Balance:  {}", money(wallet.balance));
            println!("Credited: {}", money(wallet.credited));
            println!("Debited:  {}", money(wallet.debited));
            if let Some(diff) = wallet.discrepancy {
                println!(
                    "Note: balance differs from transaction history by {}",
                    money(diff)
                );
            }
            println!();
            for tx in &wallet.transactions {
                let when = tx
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "  {:<16}  {:>14}  {:<12}  {}",
                    when,
                    money(tx.amount_pkr),
                    tx.transaction_type,
                    tx.description.as_deref().unwrap_or("")
                );
            }
        }
    }
}

pub fn print_analytics(report: &Analytics, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            heading("Analytics");
            println!("Users:          {}", report.totals.users);
            println!("Requests:       {}", report.totals.requests);
            println!("Items recycled: {}", report.totals.recycled_items);
            println!("Donations:      {}", money(report.totals.donations_pkr));

            println!();
            println!("Pickups per week:");
            for w in &report.pickup_trend {
                println!("  {:<10} {}", w.week, w.count);
            }
            println!();
            println!("Recycling per week (bottles / cans):");
            for w in &report.recycling_trend {
                println!("  {:<10} {} / {}", w.week, w.bottles, w.cans);
            }
            println!();
            println!("Request status:");
            for s in &report.status_breakdown {
                println!("  {:<12} {}", s.name, s.value);
            }
            println!();
            println!("Team performance:");
            for t in &report.team_performance {
                println!("  {:<24} {}", t.name, t.completed);
            }
            println!();
            println!("Donations per month:");
            for m in &report.monthly_donations {
                println!("  {:<8} {}", m.month, money(m.amount));
            }
        }
    }
}

pub fn print_map(view: &MapView, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(view),
        OutputFormat::Table => {
            println!(
                "Center {:.4}, {:.4} zoom {}",
                view.center.0, view.center.1, view.zoom
            );
            for m in &view.markers {
                println!(
                    "  {:>9.5} {:>9.5}  {}  {}",
                    m.latitude, m.longitude, m.color, m.label
                );
            }
        }
    }
}

pub fn print_actions(req: &WasteRequest, actions: &[Action], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&json!({"request": req.id, "actions": actions})),
        OutputFormat::Table => {
            println!("Request {} ({})", req.id, req.status);
            if actions.is_empty() {
                println!("  No actions available");
            }
            for a in actions {
                println!("  - {}", a.as_str());
            }
        }
    }
}
