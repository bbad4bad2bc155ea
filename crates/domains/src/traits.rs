//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Repositories own the persisted state exclusively; compound
//! read-modify-write operations (event like, windowed self-delete,
//! unique-username create) must be atomic from the caller's point of view.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Announcement, Event, InsertAnnouncement, InsertEvent, InsertPage, InsertPkBattle, Message,
    NewMessage, NewUser, Page, PkBattle, Principal, SelfDeleteOutcome, Setting, UpdatePage, User,
    UserPatch,
};

/// Account persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get(&self, id: i32) -> Result<Option<User>>;
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    /// Fails with `Conflict` when the username is already taken, including
    /// under concurrent creation attempts.
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn update(&self, id: i32, patch: UserPatch) -> Result<User>;
    /// Removing a user leaves their old messages in place; readers resolve
    /// the missing author to a sentinel.
    async fn delete(&self, id: i32) -> Result<()>;
}

/// Chat message persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    /// All messages, most recent first. The chat client reverses this for
    /// display; the repository contract is descending `created_at`.
    async fn list(&self) -> Result<Vec<Message>>;
    async fn get(&self, id: i32) -> Result<Option<Message>>;
    /// `reply_to_id` is stored as given; existence of the target is not a
    /// precondition (soft reference).
    async fn create(&self, message: NewMessage) -> Result<Message>;
    /// Unconditional hard delete (moderator/admin path). `NotFound` when
    /// the id is already gone.
    async fn delete(&self, id: i32) -> Result<()>;
    /// The author's own delete: removes the message only if `author_id`
    /// wrote it and it is strictly younger than `window_secs`, judged by
    /// the store's clock inside the same atomic step as the delete.
    async fn delete_own(
        &self,
        id: i32,
        author_id: i32,
        window_secs: i64,
    ) -> Result<SelfDeleteOutcome>;
}

/// Custom page persistence. Slugs are unique.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PageRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<Page>>;
    async fn create(&self, page: InsertPage) -> Result<Page>;
    async fn update(&self, id: i32, patch: UpdatePage) -> Result<Page>;
    async fn delete(&self, id: i32) -> Result<()>;
}

/// Event persistence, including the idempotent like.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventRepo: Send + Sync {
    /// Upcoming-first: ordered by event date descending.
    async fn list(&self) -> Result<Vec<Event>>;
    async fn create(&self, event: InsertEvent) -> Result<Event>;
    /// Records the like once per user: appending to `liked_by` and
    /// incrementing `likes` happen in one atomic step, and a repeat like
    /// returns the event unchanged.
    async fn like(&self, id: i32, user_id: i32) -> Result<Event>;
}

/// PK battle room persistence (create and list only in this scope).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BattleRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<PkBattle>>;
    async fn create(&self, battle: InsertPkBattle) -> Result<PkBattle>;
}

/// Announcement persistence with the single-active write rule.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AnnouncementRepo: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Announcement>>;
    /// When the new row is active, every other row is deactivated in the
    /// same atomic step, keeping at most one active announcement.
    async fn create(&self, announcement: InsertAnnouncement) -> Result<Announcement>;
}

/// Key/value settings, last write wins.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Setting>>;
    async fn set(&self, key: &str, value: &str) -> Result<Setting>;
}

/// Hashes and verifies passwords. Stateless; hashes are salted PHC
/// strings and plaintext is never stored.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

/// Server-side session state keyed by an opaque token.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mints a fresh token bound to the principal.
    async fn create(&self, principal: Principal) -> Result<String>;
    async fn get(&self, token: &str) -> Result<Option<Principal>>;
    /// Invalidates the token immediately; unknown tokens are a no-op.
    async fn remove(&self, token: &str) -> Result<()>;
}
