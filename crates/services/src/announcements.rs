//! Site-wide announcements with the single-active write rule.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Announcement, AnnouncementRepo, AppError, InsertAnnouncement, Principal, Result,
};
use tracing::info;

use crate::policy::{self, Action};

#[derive(Clone)]
pub struct AnnouncementService {
    announcements: Arc<dyn AnnouncementRepo>,
}

impl AnnouncementService {
    pub fn new(announcements: Arc<dyn AnnouncementRepo>) -> Self {
        Self { announcements }
    }

    /// Active announcements only. The write rule keeps at most one row
    /// active, so clients that show "the" announcement take the first.
    pub async fn list_active(&self, principal: Option<&Principal>) -> Result<Vec<Announcement>> {
        policy::check(principal, Action::Read, Utc::now())?;
        self.announcements.list_active().await
    }

    pub async fn create(
        &self,
        principal: Option<&Principal>,
        input: InsertAnnouncement,
    ) -> Result<Announcement> {
        policy::check(principal, Action::ManageAnnouncements, Utc::now())?;
        if input.content.trim().is_empty() {
            return Err(AppError::validation("content must not be empty", Some("content")));
        }
        let announcement = self.announcements.create(input).await?;
        info!(
            announcement_id = announcement.id,
            active = announcement.active,
            "announcement created"
        );
        Ok(announcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockAnnouncementRepo, Role};

    #[tokio::test]
    async fn create_is_admin_only_and_validates_content() {
        let service = AnnouncementService::new(Arc::new(MockAnnouncementRepo::new()));
        let user = Principal {
            id: 4,
            role: Role::User,
        };
        let input = InsertAnnouncement {
            content: "Maintenance tonight".to_string(),
            active: true,
        };
        let err = service.create(Some(&user), input).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let admin = Principal {
            id: 1,
            role: Role::Admin,
        };
        let blank = InsertAnnouncement {
            content: "  ".to_string(),
            active: true,
        };
        let err = service.create(Some(&admin), blank).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
