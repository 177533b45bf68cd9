//! Command handlers.

use anyhow::Context;
use tracing::info;

use cleanify_client::guard::{AuthContext, GuardOutcome, Screen, guard};
use cleanify_client::lifecycle::{self, Assignee, PickupRequest};
use cleanify_client::map::{self, MapView};
use cleanify_client::{
    CleanifyClient, ClientConfig, ClientError, ClientResult, Query, analytics, auth, dashboard,
    ledger,
};
use cleanify_types::models::{AppRole, Kiosk, WasteRequest};
use cleanify_types::schema;

use crate::commands::admin::AdminCommands;
use crate::commands::citizen::CitizenCommands;
use crate::commands::crew::{LeaderCommands, MemberCommands};
use crate::commands::{Cli, Commands, OutputFormat};
use crate::output;

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::new(cli.url, cli.anon_key);
    config.timeout_secs = cli.timeout;
    config.session_path = cli.session_file;

    let session = auth::load_session(&config.session_path)
        .await
        .with_context(|| format!("reading session from {}", config.session_path.display()))?;
    let mut client = CleanifyClient::from_config(&config)?.with_session(session);
    let format = cli.format;

    match cli.command {
        Commands::Signup {
            email,
            password,
            full_name,
            role,
        } => {
            let user = client.sign_up(&email, &password, &full_name, role).await?;
            match client.session() {
                Some(session) => auth::save_session(&config.session_path, session).await?,
                None => info!("Confirm {} before signing in", email),
            }
            output::print_signed_in(&user, Screen::home_for(role), format);
        }
        Commands::Login { email, password } => {
            let session = client.sign_in(&email, &password).await?;
            auth::save_session(&config.session_path, &session).await?;
            let ctx = require(&client, Screen::Dashboard).await?;
            output::print_signed_in(&session.user, Screen::home_for_roles(&ctx.roles), format);
        }
        Commands::Logout => {
            client.sign_out().await?;
            auth::clear_session(&config.session_path).await?;
            output::print_message("Signed out", format);
        }
        Commands::Whoami => {
            let ctx = require(&client, Screen::Dashboard).await?;
            output::print_identity(&ctx, Screen::home_for_roles(&ctx.roles), format);
        }
        Commands::Citizen(cmd) => handle_citizen(&client, cmd, format).await?,
        Commands::Team => {
            let ctx = require(&client, Screen::Team).await?;
            let board = dashboard::team(&client, &ctx).await?;
            output::print_team(&board, format);
        }
        Commands::Leader(cmd) => handle_leader(&client, cmd, format).await?,
        Commands::Member(cmd) => handle_member(&client, cmd, format).await?,
        Commands::Admin(cmd) => handle_admin(&client, cmd, format).await?,
        Commands::Map { geojson } => {
            let ctx = require(&client, Screen::Dashboard).await?;
            let view = visible_map(&client, &ctx).await?;
            if geojson {
                output::print_json(&view.to_geojson());
            } else {
                output::print_map(&view, format);
            }
        }
        Commands::Actions { request } => {
            let ctx = require(&client, Screen::Dashboard).await?;
            let req = lifecycle::fetch_request(&client, request).await?;
            output::print_actions(&req, &lifecycle::available_actions(&req, &ctx), format);
        }
    }

    Ok(())
}

/// Turn a guard redirect into the error the user sees.
async fn require(client: &CleanifyClient, screen: Screen) -> ClientResult<AuthContext> {
    match guard(client, screen).await {
        GuardOutcome::Granted(ctx) => Ok(ctx),
        GuardOutcome::RedirectLogin => Err(ClientError::Unauthenticated),
        GuardOutcome::RedirectDashboard => Err(ClientError::access_denied(format!(
            "{} requires the {} role",
            screen.path(),
            screen
                .required_role()
                .map(|r| r.to_string())
                .unwrap_or_default()
        ))),
    }
}

async fn handle_citizen(
    client: &CleanifyClient,
    cmd: CitizenCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ctx = require(client, Screen::Dashboard).await?;

    match cmd {
        CitizenCommands::Dashboard => {
            let board = dashboard::citizen(client, &ctx).await?;
            output::print_citizen(&board, format);
        }
        CitizenCommands::Pickup {
            bags,
            photo,
            lat,
            lon,
            address,
        } => {
            let bytes = tokio::fs::read(&photo)
                .await
                .with_context(|| format!("reading photo {}", photo.display()))?;
            let form = PickupRequest {
                bags,
                photo: Some(bytes),
                location: Some((lat, lon)),
                address,
            };
            let cost = form.cost_preview();
            let created = lifecycle::request_pickup(client, &ctx, form).await?;
            output::print_message(&format!("Pickup requested! Cost: {} PKR", cost), format);
            output::print_request(&created, format);
        }
        CitizenCommands::Recycle { bottles, cans } => {
            let reward = lifecycle::recycling_reward_preview(bottles, cans);
            let tx = lifecycle::record_recycling(client, &ctx, bottles, cans).await?;
            output::print_message(
                &format!("Recycling recorded! Estimated reward: {} PKR", reward),
                format,
            );
            output::print_output(&tx, format);
        }
        CitizenCommands::Wallet => {
            let wallet = ledger::load_wallet(client, ctx.user_id).await?;
            output::print_wallet(&wallet, format);
        }
    }
    Ok(())
}

async fn handle_leader(
    client: &CleanifyClient,
    cmd: LeaderCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ctx = require(client, Screen::TeamLeader).await?;

    match cmd {
        LeaderCommands::Dashboard => {
            let board = dashboard::team_leader(client, &ctx).await?;
            output::print_team_leader(&board, format);
        }
        LeaderCommands::Assign { request, member } => {
            let updated = lifecycle::assign(client, &ctx, request, Assignee::Member(member)).await?;
            output::print_message("Task assigned to team member", format);
            output::print_request(&updated, format);
        }
        LeaderCommands::Approve { request } => {
            let updated =
                lifecycle::verify(client, &ctx, request, lifecycle::Verdict::Approve).await?;
            output::print_message("Task approved and reward processed", format);
            output::print_request(&updated, format);
        }
    }
    Ok(())
}

async fn handle_member(
    client: &CleanifyClient,
    cmd: MemberCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ctx = require(client, Screen::TeamMember).await?;

    match cmd {
        MemberCommands::Dashboard => {
            let board = dashboard::team_member(client, &ctx).await?;
            output::print_team_member(&board, format);
        }
        MemberCommands::Start { request } => {
            let updated = lifecycle::start_work(client, &ctx, request).await?;
            output::print_request(&updated, format);
        }
        MemberCommands::Photo {
            request,
            kind,
            file,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading photo {}", file.display()))?;
            let updated = lifecycle::attach_photo(client, &ctx, request, kind.into(), bytes).await?;
            output::print_request(&updated, format);
        }
        MemberCommands::Complete { request } => {
            let updated = lifecycle::complete(client, &ctx, request).await?;
            output::print_message("Task marked as completed! Awaiting verification.", format);
            output::print_request(&updated, format);
        }
    }
    Ok(())
}

async fn handle_admin(
    client: &CleanifyClient,
    cmd: AdminCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let screen = match cmd {
        AdminCommands::Analytics => Screen::AdminAnalytics,
        _ => Screen::Admin,
    };
    let ctx = require(client, screen).await?;

    match cmd {
        AdminCommands::Panel => {
            let panel = dashboard::admin(client, &ctx).await?;
            output::print_admin_panel(&panel, format);
        }
        AdminCommands::Analytics => {
            let report = analytics::load_analytics(client).await?;
            output::print_analytics(&report, format);
        }
        AdminCommands::Assign { request, leader } => {
            let updated = lifecycle::assign(client, &ctx, request, Assignee::Team(leader)).await?;
            output::print_message("Task assigned successfully!", format);
            output::print_request(&updated, format);
        }
        AdminCommands::Verify { request, verdict } => {
            let updated = lifecycle::verify(client, &ctx, request, verdict.into()).await?;
            output::print_request(&updated, format);
        }
    }
    Ok(())
}

/// Requests the caller can see on a map, by their most privileged role.
async fn visible_map(client: &CleanifyClient, ctx: &AuthContext) -> ClientResult<MapView> {
    let requests: Vec<WasteRequest> = if ctx.has_role(AppRole::Admin) {
        client.select(&Query::table(schema::WASTE_REQUESTS)).await?
    } else if ctx.has_role(AppRole::TeamLeader) {
        client
            .select(&Query::table(schema::WASTE_REQUESTS).eq("assigned_team_id", ctx.user_id))
            .await?
    } else if ctx.has_role(AppRole::TeamMember) {
        dashboard::tasks_of(client, ctx.user_id).await?
    } else {
        client
            .select(&Query::table(schema::WASTE_REQUESTS).eq("citizen_id", ctx.user_id))
            .await?
    };
    let kiosks: Vec<Kiosk> = client.select(&Query::table(schema::KIOSKS)).await?;

    let mut markers = map::request_markers(&requests);
    markers.extend(map::kiosk_markers(&kiosks));
    Ok(MapView::new(markers))
}
