//! Custom content pages: admin-managed, read by any session.

use std::sync::Arc;

use chrono::Utc;
use domains::{AppError, InsertPage, Page, PageRepo, Principal, Result, UpdatePage};
use tracing::info;

use crate::policy::{self, Action};

#[derive(Clone)]
pub struct PageService {
    pages: Arc<dyn PageRepo>,
}

impl PageService {
    pub fn new(pages: Arc<dyn PageRepo>) -> Self {
        Self { pages }
    }

    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<Page>> {
        policy::check(principal, Action::Read, Utc::now())?;
        self.pages.list().await
    }

    pub async fn create(&self, principal: Option<&Principal>, input: InsertPage) -> Result<Page> {
        policy::check(principal, Action::ManagePages, Utc::now())?;
        validate_slug(&input.slug)?;
        if input.title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty", Some("title")));
        }
        let page = self.pages.create(input).await?;
        info!(page_id = page.id, slug = %page.slug, "page created");
        Ok(page)
    }

    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: i32,
        patch: UpdatePage,
    ) -> Result<Page> {
        policy::check(principal, Action::ManagePages, Utc::now())?;
        if let Some(slug) = &patch.slug {
            validate_slug(slug)?;
        }
        self.pages.update(id, patch).await
    }

    pub async fn delete(&self, principal: Option<&Principal>, id: i32) -> Result<()> {
        policy::check(principal, Action::ManagePages, Utc::now())?;
        self.pages.delete(id).await
    }
}

/// Slugs must be non-empty and URL-safe: lowercase ASCII, digits,
/// hyphens.
fn validate_slug(slug: &str) -> Result<()> {
    let ok = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(AppError::validation(
            "slug must be non-empty lowercase letters, digits and hyphens",
            Some("slug"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockPageRepo, PageKind, Role};

    fn principal(id: i32, role: Role) -> Principal {
        Principal { id, role }
    }

    fn insert(slug: &str) -> InsertPage {
        InsertPage {
            slug: slug.to_string(),
            title: "Games".to_string(),
            content: None,
            kind: PageKind::Game,
            is_visible: true,
            order: 0,
        }
    }

    #[tokio::test]
    async fn create_rejects_unsafe_slugs() {
        let mut repo = MockPageRepo::new();
        repo.expect_create().never();
        let service = PageService::new(Arc::new(repo));
        for slug in ["", "Games", "a b", "a/b", "café", "-leading", "trailing-"] {
            let err = service
                .create(Some(&principal(1, Role::Admin)), insert(slug))
                .await
                .unwrap_err();
            match err {
                AppError::Validation { field, .. } => {
                    assert_eq!(field.as_deref(), Some("slug"), "slug {slug:?}");
                }
                other => panic!("expected validation error for {slug:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn mutation_is_admin_only() {
        let service = PageService::new(Arc::new(MockPageRepo::new()));
        for role in [Role::User, Role::Moderator] {
            let err = service
                .create(Some(&principal(5, role)), insert("games"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
            let err = service.delete(Some(&principal(5, role)), 1).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
        }
    }
}
