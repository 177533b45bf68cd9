//! Screen-level access control.
//!
//! Every screen load resolves the session to an identity and its roles. The
//! outcome is a redirect decision; lookup failures of any kind deny access.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use cleanify_types::models::AppRole;

use crate::client::CleanifyClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Login,
    /// Citizen dashboard, also the fallback for denied users.
    Dashboard,
    /// Combined crew screen predating the leader/member split.
    Team,
    TeamLeader,
    TeamMember,
    Admin,
    AdminAnalytics,
}

impl Screen {
    pub fn required_role(&self) -> Option<AppRole> {
        match self {
            Self::Login | Self::Dashboard | Self::Team => None,
            Self::TeamLeader => Some(AppRole::TeamLeader),
            Self::TeamMember => Some(AppRole::TeamMember),
            Self::Admin | Self::AdminAnalytics => Some(AppRole::Admin),
        }
    }

    /// Landing screen after sign-up or sign-in for a role.
    pub fn home_for(role: AppRole) -> Screen {
        match role {
            AppRole::Admin => Self::Admin,
            AppRole::TeamLeader => Self::TeamLeader,
            AppRole::TeamMember => Self::TeamMember,
            AppRole::Citizen => Self::Dashboard,
        }
    }

    /// Home screen for a set of roles, most privileged first.
    pub fn home_for_roles(roles: &[AppRole]) -> Screen {
        [AppRole::Admin, AppRole::TeamLeader, AppRole::TeamMember]
            .into_iter()
            .find(|r| roles.contains(r))
            .map(Self::home_for)
            .unwrap_or(Self::Dashboard)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Team => "/team",
            Self::TeamLeader => "/team-leader",
            Self::TeamMember => "/team-member",
            Self::Admin => "/admin",
            Self::AdminAnalytics => "/admin/analytics",
        }
    }
}

/// Identity of the signed-in user for the duration of one screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub roles: Vec<AppRole>,
}

impl AuthContext {
    pub fn has_role(&self, role: AppRole) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Granted(AuthContext),
    /// No usable session.
    RedirectLogin,
    /// Signed in, but without the role the screen needs.
    RedirectDashboard,
}

impl GuardOutcome {
    pub fn redirect(&self) -> Option<Screen> {
        match self {
            Self::Granted(_) => None,
            Self::RedirectLogin => Some(Screen::Login),
            Self::RedirectDashboard => Some(Screen::Dashboard),
        }
    }
}

/// Resolve the current session for `screen`.
pub async fn guard(client: &CleanifyClient, screen: Screen) -> GuardOutcome {
    let user = match client.current_user().await {
        Ok(user) => user,
        Err(e) => {
            warn!("No session for {}: {}", screen.path(), e);
            return GuardOutcome::RedirectLogin;
        }
    };

    if let Some(required) = screen.required_role() {
        match client.has_role(user.id, required).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Access denied - {} role required for {}", required, screen.path());
                return GuardOutcome::RedirectDashboard;
            }
            Err(e) => {
                warn!("Role check for {} failed: {}", user.id, e);
                return GuardOutcome::RedirectDashboard;
            }
        }
    }

    let roles = match client.roles_of(user.id).await {
        Ok(roles) => roles,
        Err(e) => {
            warn!("Role lookup for {} failed: {}", user.id, e);
            if screen.required_role().is_some() {
                return GuardOutcome::RedirectDashboard;
            }
            Vec::new()
        }
    };

    GuardOutcome::Granted(AuthContext {
        user_id: user.id,
        email: user.email,
        roles,
    })
}
