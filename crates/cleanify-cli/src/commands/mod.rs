//! Command-line definitions.

pub mod admin;
pub mod citizen;
pub mod crew;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use cleanify_types::models::AppRole;

/// Cleanify waste-collection client
#[derive(Parser, Debug)]
#[command(name = "cleanify")]
#[command(version)]
#[command(about = "Request pickups, run crews and verify collections against a Cleanify backend")]
pub struct Cli {
    /// Backend project URL
    #[arg(long, env = "CLEANIFY_URL")]
    pub url: String,

    /// Public API key sent with every request
    #[arg(long, env = "CLEANIFY_ANON_KEY", hide_env_values = true)]
    pub anon_key: String,

    /// Request timeout in seconds
    #[arg(long, env = "CLEANIFY_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Where the signed-in session is kept between runs
    #[arg(long, env = "CLEANIFY_SESSION_PATH", default_value = ".cleanify-session.json")]
    pub session_file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        /// admin, team_leader, team_member or citizen
        #[arg(long, default_value = "citizen")]
        role: AppRole,
    },

    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user, roles and home screen
    Whoami,

    /// Citizen dashboard and actions
    #[command(subcommand)]
    Citizen(citizen::CitizenCommands),

    /// Combined crew screen: assigned tasks and earnings
    Team,

    /// Team leader dashboard and actions
    #[command(subcommand)]
    Leader(crew::LeaderCommands),

    /// Team member dashboard and actions
    #[command(subcommand)]
    Member(crew::MemberCommands),

    /// Administration
    #[command(subcommand)]
    Admin(admin::AdminCommands),

    /// Markers for the requests visible to you, plus kiosks
    Map {
        /// Emit a GeoJSON FeatureCollection
        #[arg(long)]
        geojson: bool,
    },

    /// Actions you may take on a request right now
    Actions {
        request: Uuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["cleanify", "--url", "http://localhost:54321", "--anon-key", "k"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn signup_parses_role() {
        let cli = parse(&[
            "signup",
            "--email",
            "a@b.pk",
            "--password",
            "secret1",
            "--full-name",
            "Ali",
            "--role",
            "team_leader",
        ])
        .unwrap();
        match cli.command {
            Commands::Signup { role, .. } => assert_eq!(role, AppRole::TeamLeader),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(parse(&["signup", "--email", "a", "--password", "b", "--full-name", "c", "--role", "mayor"]).is_err());
    }

    #[test]
    fn nested_subcommands() {
        let id = Uuid::new_v4().to_string();
        let cli = parse(&["-f", "json", "admin", "verify", &id, "reject"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Admin(admin::AdminCommands::Verify { verdict: admin::VerdictArg::Reject, .. })
        ));
    }
}
