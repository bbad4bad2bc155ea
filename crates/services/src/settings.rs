//! Key/value settings: public reads, admin writes, last write wins.

use std::sync::Arc;

use chrono::Utc;
use domains::{AppError, Principal, Result, Setting, SettingsRepo};
use tracing::info;

use crate::policy::{self, Action};

#[derive(Clone)]
pub struct SettingService {
    settings: Arc<dyn SettingsRepo>,
}

impl SettingService {
    pub fn new(settings: Arc<dyn SettingsRepo>) -> Self {
        Self { settings }
    }

    /// Settings reads are the one action open to anonymous callers.
    pub async fn get(&self, principal: Option<&Principal>, key: &str) -> Result<Setting> {
        policy::check(principal, Action::ReadPublicSetting, Utc::now())?;
        self.settings
            .get(key)
            .await?
            .ok_or_else(|| AppError::not_found("setting", key))
    }

    pub async fn set(
        &self,
        principal: Option<&Principal>,
        key: &str,
        value: &str,
    ) -> Result<Setting> {
        policy::check(principal, Action::WriteSetting, Utc::now())?;
        if key.trim().is_empty() {
            return Err(AppError::validation("key must not be empty", Some("key")));
        }
        let setting = self.settings.set(key, value).await?;
        info!(key = %setting.key, "setting updated");
        Ok(setting)
    }
}
