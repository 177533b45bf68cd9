use clap::Subcommand;
use uuid::Uuid;

use cleanify_client::lifecycle::Verdict;

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Totals, pending requests, verification queue and team leaders
    Panel,

    /// Trends, status breakdown, team ranking and donations
    Analytics,

    /// Assign a pending request to a team leader
    Assign {
        request: Uuid,
        leader: Uuid,
    },

    /// Approve or reject a completed request
    Verify {
        request: Uuid,
        #[arg(value_enum)]
        verdict: VerdictArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VerdictArg {
    Approve,
    Reject,
}

impl From<VerdictArg> for Verdict {
    fn from(arg: VerdictArg) -> Self {
        match arg {
            VerdictArg::Approve => Verdict::Approve,
            VerdictArg::Reject => Verdict::Reject,
        }
    }
}
