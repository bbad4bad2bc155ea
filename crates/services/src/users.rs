//! User administration: admin-managed CRUD plus the policy-gated
//! self-service patch.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    AppError, CredentialVerifier, InsertUser, NewUser, Principal, Result, Role, UpdateUser, User,
    UserPatch, UserRepo,
};
use tracing::info;

use crate::policy::{self, Action};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepo>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepo>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { users, verifier }
    }

    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<User>> {
        policy::check(principal, Action::Read, Utc::now())?;
        self.users.list().await
    }

    pub async fn create(&self, principal: Option<&Principal>, input: InsertUser) -> Result<User> {
        policy::check(principal, Action::CreateUser, Utc::now())?;
        let username = input.username.trim();
        if username.is_empty() {
            return Err(AppError::validation("username must not be empty", Some("username")));
        }
        if input.password.is_empty() {
            return Err(AppError::validation("password must not be empty", Some("password")));
        }
        let password_hash = self.verifier.hash_password(&input.password)?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                password_hash,
                role: input.role,
                display_name: input.display_name,
                tag: input.tag,
                tag_color: input.tag_color,
                avatar_url: input.avatar_url,
                is_employee_of_month: input.is_employee_of_month,
            })
            .await?;
        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: i32,
        patch: UpdateUser,
    ) -> Result<User> {
        policy::check(
            principal,
            Action::UpdateUser {
                target_id: id,
                privileged: patch.touches_privileged_fields(),
            },
            Utc::now(),
        )?;
        if let Some(username) = &patch.username {
            if username.trim().is_empty() {
                return Err(AppError::validation("username must not be empty", Some("username")));
            }
        }
        let password_hash = match &patch.password {
            Some(password) if password.is_empty() => {
                return Err(AppError::validation("password must not be empty", Some("password")));
            }
            Some(password) => Some(self.verifier.hash_password(password)?),
            None => None,
        };
        self.users
            .update(
                id,
                UserPatch {
                    username: patch.username,
                    password_hash,
                    role: patch.role,
                    display_name: patch.display_name,
                    tag: patch.tag,
                    tag_color: patch.tag_color,
                    avatar_url: patch.avatar_url,
                    is_employee_of_month: patch.is_employee_of_month,
                },
            )
            .await
    }

    pub async fn delete(&self, principal: Option<&Principal>, id: i32) -> Result<()> {
        policy::check(principal, Action::DeleteUser, Utc::now())?;
        self.users.delete(id).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    /// First-run seed: when no users exist yet, create the bootstrap
    /// admin. Runs before any session exists and does not consult the
    /// policy engine.
    pub async fn seed_admin_if_empty(&self, password: &str) -> Result<Option<User>> {
        if !self.users.list().await?.is_empty() {
            return Ok(None);
        }
        let password_hash = self.verifier.hash_password(password)?;
        let admin = self
            .users
            .create(NewUser {
                username: "admin".to_string(),
                password_hash,
                role: Role::Admin,
                display_name: Some("Super Admin".to_string()),
                tag: Some("OWNER".to_string()),
                tag_color: Some("gold".to_string()),
                avatar_url: Some(
                    "https://api.dicebear.com/7.x/avataaars/svg?seed=admin".to_string(),
                ),
                is_employee_of_month: false,
            })
            .await?;
        info!(user_id = admin.id, "seeded bootstrap admin");
        Ok(Some(admin))
    }
}
