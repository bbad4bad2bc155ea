//! Chat messages: polled reads with the author joined in, policy-gated
//! sends, and the role-dependent delete paths.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use domains::{
    AppError, Message, MessageRepo, MessageView, NewMessage, Principal, Result, Role,
    SelfDeleteOutcome, UserRepo,
};
use tracing::info;

use crate::policy::{self, Action, SELF_DELETE_WINDOW_SECS};

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepo>,
    users: Arc<dyn UserRepo>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { messages, users }
    }

    /// Messages most recent first, each joined with its author. A deleted
    /// author resolves to `None` instead of failing the read.
    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<MessageView>> {
        policy::check(principal, Action::Read, Utc::now())?;
        let messages = self.messages.list().await?;
        let authors: HashMap<i32, _> = self
            .users
            .list()
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();
        Ok(messages
            .into_iter()
            .map(|message| {
                let author = authors.get(&message.user_id).cloned();
                MessageView { message, author }
            })
            .collect())
    }

    /// Sends a message. The reply target is a soft reference and is not
    /// required to exist.
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        content: &str,
        reply_to_id: Option<i32>,
    ) -> Result<Message> {
        policy::check(principal, Action::CreateMessage, Utc::now())?;
        let Some(principal) = principal else {
            return Err(AppError::Unauthenticated);
        };
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("content must not be empty", Some("content")));
        }
        self.messages
            .create(NewMessage {
                user_id: principal.id,
                content: content.to_string(),
                reply_to_id,
            })
            .await
    }

    /// Deletes a message. Moderators and admins delete unconditionally;
    /// an author's own delete is re-checked atomically in the repository
    /// so the 15-minute window cannot be raced past.
    pub async fn delete(&self, principal: Option<&Principal>, id: i32) -> Result<()> {
        let Some(message) = self.messages.get(id).await? else {
            // Deleting an already-deleted id is 404, never a crash.
            return match principal {
                None => Err(AppError::Unauthenticated),
                Some(_) => Err(AppError::not_found("message", id)),
            };
        };
        policy::check(
            principal,
            Action::DeleteMessage {
                author_id: message.user_id,
                created_at: message.created_at,
            },
            Utc::now(),
        )?;
        let Some(principal) = principal else {
            return Err(AppError::Unauthenticated);
        };
        match principal.role {
            Role::Admin | Role::Moderator => self.messages.delete(id).await?,
            Role::User => {
                match self
                    .messages
                    .delete_own(id, principal.id, SELF_DELETE_WINDOW_SECS)
                    .await?
                {
                    SelfDeleteOutcome::Deleted => {}
                    SelfDeleteOutcome::Missing => return Err(AppError::not_found("message", id)),
                    SelfDeleteOutcome::Denied => return Err(AppError::Forbidden),
                }
            }
        }
        info!(message_id = id, deleted_by = principal.id, "message deleted");
        Ok(())
    }
}
