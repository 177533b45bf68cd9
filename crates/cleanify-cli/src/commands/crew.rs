use std::path::PathBuf;

use clap::Subcommand;
use uuid::Uuid;

use cleanify_types::models::PhotoKind;

#[derive(Subcommand, Debug)]
pub enum LeaderCommands {
    /// Team tasks, members and map
    Dashboard,

    /// Hand a request to one of the team members
    Assign {
        request: Uuid,
        member: Uuid,
    },

    /// Approve a completed request
    Approve {
        request: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemberCommands {
    /// Assigned tasks and map
    Dashboard,

    /// Mark an assigned request as in progress
    Start {
        request: Uuid,
    },

    /// Attach the before or after photo
    Photo {
        request: Uuid,
        #[arg(value_enum)]
        kind: PhotoArg,
        file: PathBuf,
    },

    /// Mark the request completed once both photos are attached
    Complete {
        request: Uuid,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PhotoArg {
    Before,
    After,
}

impl From<PhotoArg> for PhotoKind {
    fn from(arg: PhotoArg) -> Self {
        match arg {
            PhotoArg::Before => PhotoKind::Before,
            PhotoArg::After => PhotoKind::After,
        }
    }
}
