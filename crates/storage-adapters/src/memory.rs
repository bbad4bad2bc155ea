//! In-memory repositories over one shared state map. Every compound
//! read-modify-write runs under the single write lock, which is what
//! makes the like, the unique-username create, and the windowed
//! self-delete atomic here.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use domains::{
    Announcement, AnnouncementRepo, AppError, BattleRepo, Event, EventRepo, InsertAnnouncement,
    InsertEvent, InsertPage, InsertPkBattle, Message, MessageRepo, NewMessage, NewUser, Page,
    PageRepo, PkBattle, Result, SelfDeleteOutcome, Setting, SettingsRepo, UpdatePage, User,
    UserPatch, UserRepo,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    users: BTreeMap<i32, User>,
    messages: BTreeMap<i32, Message>,
    pages: BTreeMap<i32, Page>,
    events: BTreeMap<i32, Event>,
    battles: BTreeMap<i32, PkBattle>,
    announcements: BTreeMap<i32, Announcement>,
    settings: BTreeMap<String, String>,
    next_user: i32,
    next_message: i32,
    next_page: i32,
    next_event: i32,
    next_battle: i32,
    next_announcement: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// One store implements all the repository ports; clone the `Arc` per
/// port when wiring.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shifts a message's creation time into the past. Window tests need
    /// messages older than anything `create` can produce.
    #[cfg(test)]
    async fn backdate_message(&self, id: i32, secs: i64) {
        let mut state = self.inner.write().await;
        if let Some(message) = state.messages.get_mut(&id) {
            message.created_at -= Duration::seconds(secs);
        }
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn get(&self, id: i32) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut state = self.inner.write().await;
        // Check-and-insert under the write lock stands in for the
        // database unique constraint.
        if state.users.values().any(|u| u.username == user.username) {
            return Err(AppError::conflict("username already exists", Some("username")));
        }
        let id = next(&mut state.next_user);
        let user = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            display_name: user.display_name,
            tag: user.tag,
            tag_color: user.tag_color,
            avatar_url: user.avatar_url,
            is_employee_of_month: user.is_employee_of_month,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> Result<User> {
        let mut state = self.inner.write().await;
        if let Some(username) = &patch.username {
            if state
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(AppError::conflict("username already exists", Some("username")));
            }
        }
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("user", id))?;
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(display_name) = patch.display_name {
            user.display_name = Some(display_name);
        }
        if let Some(tag) = patch.tag {
            user.tag = Some(tag);
        }
        if let Some(tag_color) = patch.tag_color {
            user.tag_color = Some(tag_color);
        }
        if let Some(avatar_url) = patch.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        if let Some(flag) = patch.is_employee_of_month {
            user.is_employee_of_month = flag;
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let mut state = self.inner.write().await;
        // Messages by this author stay; readers resolve the gap.
        state
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("user", id))
    }
}

#[async_trait]
impl MessageRepo for MemoryStore {
    async fn list(&self) -> Result<Vec<Message>> {
        let state = self.inner.read().await;
        let mut messages: Vec<Message> = state.messages.values().cloned().collect();
        // Most recent first; id breaks ties for messages in the same tick.
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn get(&self, id: i32) -> Result<Option<Message>> {
        Ok(self.inner.read().await.messages.get(&id).cloned())
    }

    async fn create(&self, message: NewMessage) -> Result<Message> {
        let mut state = self.inner.write().await;
        let id = next(&mut state.next_message);
        let message = Message {
            id,
            user_id: message.user_id,
            content: message.content,
            reply_to_id: message.reply_to_id,
            created_at: Utc::now(),
        };
        state.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn delete(&self, id: i32) -> Result<()> {
        self.inner
            .write()
            .await
            .messages
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("message", id))
    }

    async fn delete_own(
        &self,
        id: i32,
        author_id: i32,
        window_secs: i64,
    ) -> Result<SelfDeleteOutcome> {
        let mut state = self.inner.write().await;
        let Some(message) = state.messages.get(&id) else {
            return Ok(SelfDeleteOutcome::Missing);
        };
        // Clock read and delete happen under the same lock, so the
        // window cannot be raced past.
        let fresh = Utc::now().signed_duration_since(message.created_at)
            < Duration::seconds(window_secs);
        if message.user_id != author_id || !fresh {
            return Ok(SelfDeleteOutcome::Denied);
        }
        state.messages.remove(&id);
        Ok(SelfDeleteOutcome::Deleted)
    }
}

#[async_trait]
impl PageRepo for MemoryStore {
    async fn list(&self) -> Result<Vec<Page>> {
        Ok(self.inner.read().await.pages.values().cloned().collect())
    }

    async fn create(&self, page: InsertPage) -> Result<Page> {
        let mut state = self.inner.write().await;
        if state.pages.values().any(|p| p.slug == page.slug) {
            return Err(AppError::conflict("slug already exists", Some("slug")));
        }
        let id = next(&mut state.next_page);
        let page = Page {
            id,
            slug: page.slug,
            title: page.title,
            content: page.content,
            kind: page.kind,
            is_visible: page.is_visible,
            order: page.order,
        };
        state.pages.insert(id, page.clone());
        Ok(page)
    }

    async fn update(&self, id: i32, patch: UpdatePage) -> Result<Page> {
        let mut state = self.inner.write().await;
        if let Some(slug) = &patch.slug {
            if state.pages.values().any(|p| p.id != id && &p.slug == slug) {
                return Err(AppError::conflict("slug already exists", Some("slug")));
            }
        }
        let page = state
            .pages
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("page", id))?;
        if let Some(slug) = patch.slug {
            page.slug = slug;
        }
        if let Some(title) = patch.title {
            page.title = title;
        }
        if let Some(content) = patch.content {
            page.content = Some(content);
        }
        if let Some(kind) = patch.kind {
            page.kind = kind;
        }
        if let Some(is_visible) = patch.is_visible {
            page.is_visible = is_visible;
        }
        if let Some(order) = patch.order {
            page.order = order;
        }
        Ok(page.clone())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        self.inner
            .write()
            .await
            .pages
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("page", id))
    }
}

#[async_trait]
impl EventRepo for MemoryStore {
    async fn list(&self) -> Result<Vec<Event>> {
        let state = self.inner.read().await;
        let mut events: Vec<Event> = state.events.values().cloned().collect();
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(events)
    }

    async fn create(&self, event: InsertEvent) -> Result<Event> {
        let mut state = self.inner.write().await;
        let id = next(&mut state.next_event);
        let event = Event {
            id,
            title: event.title,
            description: event.description,
            image_url: event.image_url,
            date: event.date,
            likes: 0,
            liked_by: vec![],
        };
        state.events.insert(id, event.clone());
        Ok(event)
    }

    async fn like(&self, id: i32, user_id: i32) -> Result<Event> {
        let mut state = self.inner.write().await;
        let event = state
            .events
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("event", id))?;
        // Membership check, append and increment are one step under the
        // write lock; a repeat like falls through unchanged.
        if !event.liked_by.contains(&user_id) {
            event.liked_by.push(user_id);
            event.likes += 1;
        }
        Ok(event.clone())
    }
}

#[async_trait]
impl BattleRepo for MemoryStore {
    async fn list(&self) -> Result<Vec<PkBattle>> {
        Ok(self.inner.read().await.battles.values().cloned().collect())
    }

    async fn create(&self, battle: InsertPkBattle) -> Result<PkBattle> {
        let mut state = self.inner.write().await;
        let id = next(&mut state.next_battle);
        let battle = PkBattle {
            id,
            title: battle.title,
            image_url: battle.image_url,
            room_id: battle.room_id,
            player_count: battle.player_count,
            max_players: battle.max_players,
        };
        state.battles.insert(id, battle.clone());
        Ok(battle)
    }
}

#[async_trait]
impl AnnouncementRepo for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Announcement>> {
        Ok(self
            .inner
            .read()
            .await
            .announcements
            .values()
            .filter(|a| a.active)
            .cloned()
            .collect())
    }

    async fn create(&self, announcement: InsertAnnouncement) -> Result<Announcement> {
        let mut state = self.inner.write().await;
        if announcement.active {
            // Single-active invariant: the newcomer displaces the rest.
            for existing in state.announcements.values_mut() {
                existing.active = false;
            }
        }
        let id = next(&mut state.next_announcement);
        let announcement = Announcement {
            id,
            content: announcement.content,
            active: announcement.active,
        };
        state.announcements.insert(id, announcement.clone());
        Ok(announcement)
    }
}

#[async_trait]
impl SettingsRepo for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Setting>> {
        Ok(self
            .inner
            .read()
            .await
            .settings
            .get(key)
            .map(|value| Setting {
                key: key.to_string(),
                value: value.clone(),
            }))
    }

    async fn set(&self, key: &str, value: &str) -> Result<Setting> {
        self.inner
            .write()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(Setting {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}
