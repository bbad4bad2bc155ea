//! Postgres repositories. The compound operations lean on the database
//! for their atomicity: the unique username constraint, a conditional
//! single-statement like, and a windowed conditional delete judged by
//! the server's clock.

use async_trait::async_trait;
use domains::{
    Announcement, AnnouncementRepo, AppError, BattleRepo, Event, EventRepo, InsertAnnouncement,
    InsertEvent, InsertPage, InsertPkBattle, Message, MessageRepo, NewMessage, NewUser, Page,
    PageKind, PageRepo, PkBattle, Result, Role, SelfDeleteOutcome, Setting, SettingsRepo,
    UpdatePage, User, UserPatch, UserRepo,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(AppError::internal)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(AppError::internal)?;
        info!("database migrations applied");
        Ok(())
    }
}

fn internal(err: sqlx::Error) -> AppError {
    AppError::internal(err)
}

/// Maps a unique-constraint violation onto `Conflict` with field detail;
/// anything else stays internal.
fn conflict_on_unique(field: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict(format!("{field} already exists"), Some(field))
        }
        _ => AppError::internal(err),
    }
}

fn map_user(row: &PgRow) -> Result<User> {
    let role: String = row.try_get("role").map_err(internal)?;
    Ok(User {
        id: row.try_get("id").map_err(internal)?,
        username: row.try_get("username").map_err(internal)?,
        password_hash: row.try_get("password_hash").map_err(internal)?,
        role: Role::parse(&role)
            .ok_or_else(|| AppError::Internal(format!("unknown role in store: {role}")))?,
        display_name: row.try_get("display_name").map_err(internal)?,
        tag: row.try_get("tag").map_err(internal)?,
        tag_color: row.try_get("tag_color").map_err(internal)?,
        avatar_url: row.try_get("avatar_url").map_err(internal)?,
        is_employee_of_month: row.try_get("is_employee_of_month").map_err(internal)?,
    })
}

fn map_message(row: &PgRow) -> Result<Message> {
    Ok(Message {
        id: row.try_get("id").map_err(internal)?,
        user_id: row.try_get("user_id").map_err(internal)?,
        content: row.try_get("content").map_err(internal)?,
        reply_to_id: row.try_get("reply_to_id").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
    })
}

fn map_page(row: &PgRow) -> Result<Page> {
    let kind: String = row.try_get("kind").map_err(internal)?;
    Ok(Page {
        id: row.try_get("id").map_err(internal)?,
        slug: row.try_get("slug").map_err(internal)?,
        title: row.try_get("title").map_err(internal)?,
        content: row.try_get("content").map_err(internal)?,
        kind: PageKind::parse(&kind)
            .ok_or_else(|| AppError::Internal(format!("unknown page kind in store: {kind}")))?,
        is_visible: row.try_get("is_visible").map_err(internal)?,
        order: row.try_get("order").map_err(internal)?,
    })
}

fn map_event(row: &PgRow) -> Result<Event> {
    let liked_by: Json<Vec<i32>> = row.try_get("liked_by").map_err(internal)?;
    Ok(Event {
        id: row.try_get("id").map_err(internal)?,
        title: row.try_get("title").map_err(internal)?,
        description: row.try_get("description").map_err(internal)?,
        image_url: row.try_get("image_url").map_err(internal)?,
        date: row.try_get("date").map_err(internal)?,
        likes: row.try_get("likes").map_err(internal)?,
        liked_by: liked_by.0,
    })
}

fn map_battle(row: &PgRow) -> Result<PkBattle> {
    Ok(PkBattle {
        id: row.try_get("id").map_err(internal)?,
        title: row.try_get("title").map_err(internal)?,
        image_url: row.try_get("image_url").map_err(internal)?,
        room_id: row.try_get("room_id").map_err(internal)?,
        player_count: row.try_get("player_count").map_err(internal)?,
        max_players: row.try_get("max_players").map_err(internal)?,
    })
}

fn map_announcement(row: &PgRow) -> Result<Announcement> {
    Ok(Announcement {
        id: row.try_get("id").map_err(internal)?,
        content: row.try_get("content").map_err(internal)?,
        active: row.try_get("active").map_err(internal)?,
    })
}

const USER_COLUMNS: &str = "id, username, password_hash, role, display_name, tag, tag_color, \
                            avatar_url, is_employee_of_month";

#[async_trait]
impl UserRepo for PgStore {
    async fn get(&self, id: i32) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(map_user).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        row.as_ref().map(map_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.iter().map(map_user).collect()
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, password_hash, role, display_name, tag, tag_color, \
             avatar_url, is_employee_of_month) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.display_name)
        .bind(&user.tag)
        .bind(&user.tag_color)
        .bind(&user.avatar_url)
        .bind(user.is_employee_of_month)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("username"))?;
        map_user(&row)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> Result<User> {
        // COALESCE keeps the stored value wherever the patch is absent.
        let row = sqlx::query(&format!(
            "UPDATE users SET \
             username = COALESCE($2, username), \
             password_hash = COALESCE($3, password_hash), \
             role = COALESCE($4, role), \
             display_name = COALESCE($5, display_name), \
             tag = COALESCE($6, tag), \
             tag_color = COALESCE($7, tag_color), \
             avatar_url = COALESCE($8, avatar_url), \
             is_employee_of_month = COALESCE($9, is_employee_of_month) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.username)
        .bind(&patch.password_hash)
        .bind(patch.role.map(|role| role.as_str()))
        .bind(&patch.display_name)
        .bind(&patch.tag)
        .bind(&patch.tag_color)
        .bind(&patch.avatar_url)
        .bind(patch.is_employee_of_month)
        .fetch_optional(&self.pool)
        .await
        .map_err(conflict_on_unique("username"))?;
        match row {
            Some(row) => map_user(&row),
            None => Err(AppError::not_found("user", id)),
        }
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user", id));
        }
        Ok(())
    }
}

const MESSAGE_COLUMNS: &str = "id, user_id, content, reply_to_id, created_at";

#[async_trait]
impl MessageRepo for PgStore {
    async fn list(&self) -> Result<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(map_message).collect()
    }

    async fn get(&self, id: i32) -> Result<Option<Message>> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        row.as_ref().map(map_message).transpose()
    }

    async fn create(&self, message: NewMessage) -> Result<Message> {
        let row = sqlx::query(&format!(
            "INSERT INTO messages (user_id, content, reply_to_id) \
             VALUES ($1, $2, $3) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.user_id)
        .bind(&message.content)
        .bind(message.reply_to_id)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        map_message(&row)
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("message", id));
        }
        Ok(())
    }

    async fn delete_own(
        &self,
        id: i32,
        author_id: i32,
        window_secs: i64,
    ) -> Result<SelfDeleteOutcome> {
        // Ownership and freshness are conditions of the delete itself,
        // judged by the database clock, so the check cannot race the act.
        let result = sqlx::query(
            "DELETE FROM messages \
             WHERE id = $1 AND user_id = $2 \
               AND created_at > now() - make_interval(secs => $3)",
        )
        .bind(id)
        .bind(author_id)
        .bind(window_secs as f64)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        if result.rows_affected() == 1 {
            return Ok(SelfDeleteOutcome::Deleted);
        }
        let exists = sqlx::query("SELECT 1 FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?
            .is_some();
        Ok(if exists {
            SelfDeleteOutcome::Denied
        } else {
            SelfDeleteOutcome::Missing
        })
    }
}

const PAGE_COLUMNS: &str = "id, slug, title, content, kind, is_visible, \"order\"";

#[async_trait]
impl PageRepo for PgStore {
    async fn list(&self) -> Result<Vec<Page>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAGE_COLUMNS} FROM pages ORDER BY \"order\", id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(map_page).collect()
    }

    async fn create(&self, page: InsertPage) -> Result<Page> {
        let row = sqlx::query(&format!(
            "INSERT INTO pages (slug, title, content, kind, is_visible, \"order\") \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PAGE_COLUMNS}"
        ))
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&page.content)
        .bind(page.kind.as_str())
        .bind(page.is_visible)
        .bind(page.order)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("slug"))?;
        map_page(&row)
    }

    async fn update(&self, id: i32, patch: UpdatePage) -> Result<Page> {
        let row = sqlx::query(&format!(
            "UPDATE pages SET \
             slug = COALESCE($2, slug), \
             title = COALESCE($3, title), \
             content = COALESCE($4, content), \
             kind = COALESCE($5, kind), \
             is_visible = COALESCE($6, is_visible), \
             \"order\" = COALESCE($7, \"order\") \
             WHERE id = $1 RETURNING {PAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.slug)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(patch.kind.map(|kind| kind.as_str()))
        .bind(patch.is_visible)
        .bind(patch.order)
        .fetch_optional(&self.pool)
        .await
        .map_err(conflict_on_unique("slug"))?;
        match row {
            Some(row) => map_page(&row),
            None => Err(AppError::not_found("page", id)),
        }
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("page", id));
        }
        Ok(())
    }
}

const EVENT_COLUMNS: &str = "id, title, description, image_url, date, likes, liked_by";

#[async_trait]
impl EventRepo for PgStore {
    async fn list(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(map_event).collect()
    }

    async fn create(&self, event: InsertEvent) -> Result<Event> {
        let row = sqlx::query(&format!(
            "INSERT INTO events (title, description, image_url, date) \
             VALUES ($1, $2, $3, $4) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.image_url)
        .bind(event.date)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        map_event(&row)
    }

    async fn like(&self, id: i32, user_id: i32) -> Result<Event> {
        // Membership check, append and increment are one conditional
        // statement; concurrent likes serialize on the row.
        let row = sqlx::query(&format!(
            "UPDATE events \
             SET likes = likes + 1, liked_by = liked_by || to_jsonb($2::int) \
             WHERE id = $1 AND NOT liked_by @> to_jsonb($2::int) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        if let Some(row) = row {
            return map_event(&row);
        }
        // No row touched: either the user already liked it, or the event
        // is missing. Re-read to tell the two apart.
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        match row {
            Some(row) => map_event(&row),
            None => Err(AppError::not_found("event", id)),
        }
    }
}

const BATTLE_COLUMNS: &str = "id, title, image_url, room_id, player_count, max_players";

#[async_trait]
impl BattleRepo for PgStore {
    async fn list(&self) -> Result<Vec<PkBattle>> {
        let rows = sqlx::query(&format!(
            "SELECT {BATTLE_COLUMNS} FROM pk_battles ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(map_battle).collect()
    }

    async fn create(&self, battle: InsertPkBattle) -> Result<PkBattle> {
        let row = sqlx::query(&format!(
            "INSERT INTO pk_battles (title, image_url, room_id, player_count, max_players) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {BATTLE_COLUMNS}"
        ))
        .bind(&battle.title)
        .bind(&battle.image_url)
        .bind(&battle.room_id)
        .bind(battle.player_count)
        .bind(battle.max_players)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        map_battle(&row)
    }
}

#[async_trait]
impl AnnouncementRepo for PgStore {
    async fn list_active(&self) -> Result<Vec<Announcement>> {
        let rows = sqlx::query(
            "SELECT id, content, active FROM announcements WHERE active ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(map_announcement).collect()
    }

    async fn create(&self, announcement: InsertAnnouncement) -> Result<Announcement> {
        // Deactivating the others and inserting the newcomer commit
        // together, keeping at most one active row.
        let mut tx = self.pool.begin().await.map_err(internal)?;
        if announcement.active {
            sqlx::query("UPDATE announcements SET active = FALSE WHERE active")
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
        }
        let row = sqlx::query(
            "INSERT INTO announcements (content, active) VALUES ($1, $2) \
             RETURNING id, content, active",
        )
        .bind(&announcement.content)
        .bind(announcement.active)
        .fetch_one(&mut *tx)
        .await
        .map_err(internal)?;
        tx.commit().await.map_err(internal)?;
        map_announcement(&row)
    }
}

#[async_trait]
impl SettingsRepo for PgStore {
    async fn get(&self, key: &str) -> Result<Option<Setting>> {
        let row = sqlx::query("SELECT key, value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.map(|row| {
            Ok(Setting {
                key: row.try_get("key").map_err(internal)?,
                value: row.try_get("value").map_err(internal)?,
            })
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: &str) -> Result<Setting> {
        let row = sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value \
             RETURNING key, value",
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        Ok(Setting {
            key: row.try_get("key").map_err(internal)?,
            value: row.try_get("value").map_err(internal)?,
        })
    }
}
