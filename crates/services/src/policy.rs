//! # Access Policy Engine
//!
//! Every authorization rule in the system lives here, as pure decision
//! logic with no transport or storage attached. Handlers never inspect
//! roles ad hoc; they describe the attempted [`Action`] and take the
//! [`Decision`].
//!
//! Rules are evaluated in a fixed order, first match wins:
//! 1. anonymous principals may only read public settings;
//! 2. admins may do everything;
//! 3. moderators may delete any message and edit their own display
//!    preferences, but mutate nothing else;
//! 4. users may chat, like events, delete their own fresh messages, and
//!    edit their own display preferences;
//! 5. anything unmatched is denied.

use chrono::{DateTime, Duration, Utc};
use domains::{AppError, Principal, Result, Role};

/// How long an author may delete their own message, from `created_at`.
/// The check is strict: at exactly the boundary the window has closed.
pub const SELF_DELETE_WINDOW_SECS: i64 = 15 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// An attempted operation, carrying just enough resource context for the
/// rules that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Reading a public setting; the only action open to anonymous callers.
    ReadPublicSetting,
    /// Any session-gated read (users, messages, pages, events, battles,
    /// announcements).
    Read,
    CreateMessage,
    DeleteMessage {
        author_id: i32,
        created_at: DateTime<Utc>,
    },
    LikeEvent,
    CreateUser,
    UpdateUser {
        target_id: i32,
        /// True when the patch reaches beyond display preferences
        /// (role, tag, employee-of-month, credentials).
        privileged: bool,
    },
    DeleteUser,
    ManagePages,
    ManageEvents,
    ManageBattles,
    ManageAnnouncements,
    WriteSetting,
}

/// The single authorization decision point. Fail-closed: every
/// combination not explicitly allowed below is denied.
pub fn authorize(principal: Option<&Principal>, action: Action, now: DateTime<Utc>) -> Decision {
    let Some(principal) = principal else {
        return match action {
            Action::ReadPublicSetting => Decision::Allow,
            _ => Decision::Deny,
        };
    };

    match principal.role {
        Role::Admin => Decision::Allow,
        Role::Moderator => match action {
            Action::ReadPublicSetting
            | Action::Read
            | Action::CreateMessage
            | Action::LikeEvent => Decision::Allow,
            // Moderators clean up chat regardless of author or age.
            Action::DeleteMessage { .. } => Decision::Allow,
            Action::UpdateUser {
                target_id,
                privileged,
            } if target_id == principal.id && !privileged => Decision::Allow,
            _ => Decision::Deny,
        },
        Role::User => match action {
            Action::ReadPublicSetting
            | Action::Read
            | Action::CreateMessage
            | Action::LikeEvent => Decision::Allow,
            Action::DeleteMessage {
                author_id,
                created_at,
            } if author_id == principal.id
                && now.signed_duration_since(created_at)
                    < Duration::seconds(SELF_DELETE_WINDOW_SECS) =>
            {
                Decision::Allow
            }
            Action::UpdateUser {
                target_id,
                privileged,
            } if target_id == principal.id && !privileged => Decision::Allow,
            _ => Decision::Deny,
        },
    }
}

/// Convenience wrapper mapping a denial to the error taxonomy: missing
/// session yields `Unauthenticated` (401), a denied principal `Forbidden`
/// (403).
pub fn check(principal: Option<&Principal>, action: Action, now: DateTime<Utc>) -> Result<()> {
    match authorize(principal, action, now) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(match principal {
            None => AppError::Unauthenticated,
            Some(_) => AppError::Forbidden,
        }),
    }
}
