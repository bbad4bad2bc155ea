//! PK battle rooms: admin-created, read-only afterwards in this scope.

use std::sync::Arc;

use chrono::Utc;
use domains::{AppError, BattleRepo, InsertPkBattle, PkBattle, Principal, Result};
use tracing::info;

use crate::policy::{self, Action};

#[derive(Clone)]
pub struct BattleService {
    battles: Arc<dyn BattleRepo>,
}

impl BattleService {
    pub fn new(battles: Arc<dyn BattleRepo>) -> Self {
        Self { battles }
    }

    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<PkBattle>> {
        policy::check(principal, Action::Read, Utc::now())?;
        self.battles.list().await
    }

    pub async fn create(
        &self,
        principal: Option<&Principal>,
        input: InsertPkBattle,
    ) -> Result<PkBattle> {
        policy::check(principal, Action::ManageBattles, Utc::now())?;
        if input.title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty", Some("title")));
        }
        if input.room_id.trim().is_empty() {
            return Err(AppError::validation("roomId must not be empty", Some("roomId")));
        }
        if input.max_players < 1 {
            return Err(AppError::validation(
                "maxPlayers must be at least 1",
                Some("maxPlayers"),
            ));
        }
        if input.player_count < 0 || input.player_count > input.max_players {
            return Err(AppError::validation(
                "playerCount must be between 0 and maxPlayers",
                Some("playerCount"),
            ));
        }
        let battle = self.battles.create(input).await?;
        info!(battle_id = battle.id, room_id = %battle.room_id, "battle created");
        Ok(battle)
    }
}
