use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum CitizenCommands {
    /// Profile, pickups and recycling totals
    Dashboard,

    /// Request a pickup. Photo and location are required.
    Pickup {
        /// Number of bags (20 PKR each)
        #[arg(long, default_value_t = 1)]
        bags: i32,
        /// JPEG photo of the waste
        #[arg(long)]
        photo: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long)]
        address: Option<String>,
    },

    /// Record bottles and cans dropped at a kiosk
    Recycle {
        #[arg(long, default_value_t = 0)]
        bottles: i32,
        #[arg(long, default_value_t = 0)]
        cans: i32,
    },

    /// Wallet balance and transaction history
    Wallet,
}
