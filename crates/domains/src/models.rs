//! # Domain Models
//!
//! These structs represent the core entities of Clubhouse. Wire names are
//! camelCase to match the public API contract; ids are the serial integers
//! the relational schema hands out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three roles a principal can hold. There is no fourth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    /// Parse the role column as stored in the database.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "moderator" => Some(Self::Moderator),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::User => "user",
        }
    }
}

/// An authenticated identity attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
}

/// A registered account. The password hash never leaves the server:
/// it is skipped on serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub display_name: Option<String>,
    /// Short badge text shown next to the name ("MOD", "VIP", ...).
    pub tag: Option<String>,
    pub tag_color: Option<String>,
    pub avatar_url: Option<String>,
    pub is_employee_of_month: bool,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
        }
    }
}

/// Admin-supplied payload for creating a user. Carries the plaintext
/// password exactly once, on the way in; the service hashes it before
/// anything is persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertUser {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
    pub display_name: Option<String>,
    pub tag: Option<String>,
    pub tag_color: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_employee_of_month: bool,
}

fn default_role() -> Role {
    Role::User
}

/// Partial patch for a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub tag: Option<String>,
    pub tag_color: Option<String>,
    pub avatar_url: Option<String>,
    pub is_employee_of_month: Option<bool>,
}

impl UpdateUser {
    /// True when the patch touches anything outside the self-service
    /// subset (display name and avatar). Everything else is admin-only,
    /// even on one's own record.
    pub fn touches_privileged_fields(&self) -> bool {
        self.username.is_some()
            || self.password.is_some()
            || self.role.is_some()
            || self.tag.is_some()
            || self.tag_color.is_some()
            || self.is_employee_of_month.is_some()
    }
}

/// Repository-level user patch: same shape as [`UpdateUser`] but with the
/// password already hashed.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub tag: Option<String>,
    pub tag_color: Option<String>,
    pub avatar_url: Option<String>,
    pub is_employee_of_month: Option<bool>,
}

/// Repository-level user row to insert (password already hashed).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub tag: Option<String>,
    pub tag_color: Option<String>,
    pub avatar_url: Option<String>,
    pub is_employee_of_month: bool,
}

/// A chat message. `reply_to_id` is a soft reference: the target may have
/// been deleted since, and readers render such replies as a placeholder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub reply_to_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: i32,
    pub content: String,
    pub reply_to_id: Option<i32>,
}

/// A message joined with its author for the chat read path. `author` is
/// `None` when the account has since been deleted; clients show the
/// "deleted user" state instead of failing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub author: Option<User>,
}

/// Result of the author's own windowed delete, decided atomically against
/// the store's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfDeleteOutcome {
    Deleted,
    /// No such message (already gone).
    Missing,
    /// Message exists but is not the caller's or the window has closed.
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Game,
    Movie,
    Custom,
}

impl PageKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "game" => Some(Self::Game),
            "movie" => Some(Self::Movie),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Movie => "movie",
            Self::Custom => "custom",
        }
    }
}

/// A custom content page. `is_visible` gates navigation listings only,
/// not direct access.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: PageKind,
    pub is_visible: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPage {
    pub slug: String,
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: PageKind,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub order: i32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePage {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<PageKind>,
    pub is_visible: Option<bool>,
    pub order: Option<i32>,
}

/// A community event. `likes` always equals `liked_by.len()`, and a user
/// id appears in `liked_by` at most once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub date: DateTime<Utc>,
    pub likes: i32,
    pub liked_by: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertEvent {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub date: DateTime<Utc>,
}

/// A PK battle room. Read-only after creation in the current scope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PkBattle {
    pub id: i32,
    pub title: String,
    pub image_url: Option<String>,
    pub room_id: String,
    pub player_count: i32,
    pub max_players: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPkBattle {
    pub title: String,
    pub image_url: Option<String>,
    pub room_id: String,
    #[serde(default = "default_player_count")]
    pub player_count: i32,
    #[serde(default = "default_max_players")]
    pub max_players: i32,
}

fn default_player_count() -> i32 {
    2
}

fn default_max_players() -> i32 {
    10
}

/// A site-wide banner. At most one row is active at a time; activating a
/// new one deactivates the rest in the same write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i32,
    pub content: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAnnouncement {
    pub content: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A single key/value setting, last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}
