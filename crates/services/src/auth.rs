//! # Session Authority
//!
//! Establishes an authenticated identity from stored credentials and
//! tracks it for the lifetime of a session token.

use std::sync::Arc;

use domains::{AppError, CredentialVerifier, Principal, Result, SessionStore, User, UserRepo};
use tracing::info;

#[derive(Clone)]
pub struct SessionAuthority {
    users: Arc<dyn UserRepo>,
    verifier: Arc<dyn CredentialVerifier>,
    sessions: Arc<dyn SessionStore>,
}

impl SessionAuthority {
    pub fn new(
        users: Arc<dyn UserRepo>,
        verifier: Arc<dyn CredentialVerifier>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            users,
            verifier,
            sessions,
        }
    }

    /// Verifies the submitted credentials and opens a session. Unknown
    /// username and wrong password take the same exit so the response
    /// cannot be used to enumerate accounts.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String)> {
        let Some(user) = self.users.get_by_username(username).await? else {
            return Err(AppError::Unauthenticated);
        };
        if !self
            .verifier
            .verify_password(password, &user.password_hash)
        {
            return Err(AppError::Unauthenticated);
        }
        let token = self.sessions.create(user.principal()).await?;
        info!(user_id = user.id, "session opened");
        Ok((user, token))
    }

    /// Invalidates the token immediately; there is no grace period.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.remove(token).await
    }

    /// Resolves the request's principal, or `None` for anonymous callers.
    pub async fn principal(&self, token: Option<&str>) -> Result<Option<Principal>> {
        match token {
            Some(token) => self.sessions.get(token).await,
            None => Ok(None),
        }
    }

    /// Resolves the full user row behind the session, for `GET /api/user`.
    /// A session whose account has been deleted resolves to `None`.
    pub async fn current_user(&self, token: Option<&str>) -> Result<Option<User>> {
        match self.principal(token).await? {
            Some(principal) => self.users.get(principal.id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockCredentialVerifier, MockSessionStore, MockUserRepo, Role};

    fn user(id: i32, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            password_hash: "$argon2id$stored".to_string(),
            role: Role::User,
            display_name: None,
            tag: None,
            tag_color: None,
            avatar_url: None,
            is_employee_of_month: false,
        }
    }

    #[tokio::test]
    async fn unknown_username_and_bad_password_are_indistinguishable() {
        let mut users = MockUserRepo::new();
        users
            .expect_get_by_username()
            .withf(|u| u == "ghost")
            .returning(|_| Ok(None));
        users
            .expect_get_by_username()
            .withf(|u| u == "alice")
            .returning(|_| Ok(Some(user(1, "alice"))));
        let mut verifier = MockCredentialVerifier::new();
        verifier.expect_verify_password().return_const(false);
        let sessions = MockSessionStore::new();

        let authority = SessionAuthority::new(
            Arc::new(users),
            Arc::new(verifier),
            Arc::new(sessions),
        );

        let unknown = authority.login("ghost", "pw").await.unwrap_err();
        let wrong = authority.login("alice", "pw").await.unwrap_err();
        assert!(matches!(unknown, AppError::Unauthenticated));
        assert!(matches!(wrong, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn successful_login_binds_the_principal_to_a_token() {
        let mut users = MockUserRepo::new();
        users
            .expect_get_by_username()
            .returning(|_| Ok(Some(user(7, "alice"))));
        let mut verifier = MockCredentialVerifier::new();
        verifier.expect_verify_password().return_const(true);
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_create()
            .withf(|p| p.id == 7 && p.role == Role::User)
            .returning(|_| Ok("tok-1".to_string()));

        let authority = SessionAuthority::new(
            Arc::new(users),
            Arc::new(verifier),
            Arc::new(sessions),
        );
        let (logged_in, token) = authority.login("alice", "pw").await.unwrap();
        assert_eq!(logged_in.id, 7);
        assert_eq!(token, "tok-1");
    }

    #[tokio::test]
    async fn missing_token_resolves_to_anonymous() {
        let authority = SessionAuthority::new(
            Arc::new(MockUserRepo::new()),
            Arc::new(MockCredentialVerifier::new()),
            Arc::new(MockSessionStore::new()),
        );
        assert!(authority.principal(None).await.unwrap().is_none());
        assert!(authority.current_user(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_drops_the_session() {
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_remove()
            .withf(|t| t == "tok-1")
            .returning(|_| Ok(()));
        let authority = SessionAuthority::new(
            Arc::new(MockUserRepo::new()),
            Arc::new(MockCredentialVerifier::new()),
            Arc::new(sessions),
        );
        authority.logout("tok-1").await.unwrap();
    }
}
