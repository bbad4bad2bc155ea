//! Community events: admin-created, likeable once per user.

use std::sync::Arc;

use chrono::Utc;
use domains::{AppError, Event, EventRepo, InsertEvent, Principal, Result};
use tracing::info;

use crate::policy::{self, Action};

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventRepo>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepo>) -> Self {
        Self { events }
    }

    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<Event>> {
        policy::check(principal, Action::Read, Utc::now())?;
        self.events.list().await
    }

    pub async fn create(&self, principal: Option<&Principal>, input: InsertEvent) -> Result<Event> {
        policy::check(principal, Action::ManageEvents, Utc::now())?;
        if input.title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty", Some("title")));
        }
        if input.description.trim().is_empty() {
            return Err(AppError::validation(
                "description must not be empty",
                Some("description"),
            ));
        }
        let event = self.events.create(input).await?;
        info!(event_id = event.id, "event created");
        Ok(event)
    }

    /// Likes are monotonic and idempotent: repeating the call changes
    /// nothing after the first success.
    pub async fn like(&self, principal: Option<&Principal>, id: i32) -> Result<Event> {
        policy::check(principal, Action::LikeEvent, Utc::now())?;
        let Some(principal) = principal else {
            return Err(AppError::Unauthenticated);
        };
        self.events.like(id, principal.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockEventRepo, Role};

    fn event(id: i32) -> Event {
        Event {
            id,
            title: "Launch party".to_string(),
            description: "Be there".to_string(),
            image_url: None,
            date: Utc::now(),
            likes: 0,
            liked_by: vec![],
        }
    }

    fn principal(id: i32, role: Role) -> Principal {
        Principal { id, role }
    }

    #[tokio::test]
    async fn like_requires_a_session_and_passes_the_caller_id() {
        let mut repo = MockEventRepo::new();
        repo.expect_like()
            .withf(|id, user_id| *id == 3 && *user_id == 9)
            .returning(|id, _| Ok(event(id)));
        let service = EventService::new(Arc::new(repo));

        let err = service.like(None, 3).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        service.like(Some(&principal(9, Role::User)), 3).await.unwrap();
    }

    #[tokio::test]
    async fn create_is_admin_only() {
        let service = EventService::new(Arc::new(MockEventRepo::new()));
        let input = InsertEvent {
            title: "Launch".to_string(),
            description: "Party".to_string(),
            image_url: None,
            date: Utc::now(),
        };
        let err = service
            .create(Some(&principal(9, Role::User)), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn create_validates_title_and_description() {
        let mut repo = MockEventRepo::new();
        repo.expect_create().never();
        let service = EventService::new(Arc::new(repo));
        let input = InsertEvent {
            title: " ".to_string(),
            description: "x".to_string(),
            image_url: None,
            date: Utc::now(),
        };
        let err = service
            .create(Some(&principal(1, Role::Admin)), input)
            .await
            .unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("title")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
