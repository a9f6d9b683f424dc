use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db, require_active_guild};
use guild_core::{MemberInput, RosterMember};
use guild_db::Db;

#[derive(Clone)]
pub struct RosterService {
    config: SharedConfig,
}

impl RosterService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn list(&self) -> Result<Vec<RosterMember>> {
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        Ok(db.list_members(guild.id)?)
    }

    /// Inserts when no id is supplied, updates the existing member
    /// otherwise.
    pub fn upsert(&self, id: Option<i64>, input: &MemberInput) -> Result<RosterMember> {
        if input.name.trim().is_empty() {
            return Err(AppError::InvalidInput("member name is required".to_string()));
        }
        if input.combat_power < 0 {
            return Err(AppError::InvalidInput(
                "combat power must be non-negative".to_string(),
            ));
        }
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        match id {
            Some(member_id) => db
                .update_member(guild.id, member_id, input)?
                .ok_or_else(|| AppError::NotFound(format!("member {} not found", member_id))),
            None => Ok(db.insert_member(guild.id, input)?),
        }
    }

    pub fn delete(&self, member_id: i64) -> Result<()> {
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        db.delete_member(guild.id, member_id)?;
        Ok(())
    }
}
