use crate::error::Result;
use crate::services::{SharedConfig, open_db, require_active_guild};
use guild_core::MatchPolicy;
use guild_db::Db;

/// Snapshot of user-configurable settings stored in the DB.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    pub guild: String,
    pub active_guild_id: i64,
    pub match_policy: MatchPolicy,
}

#[derive(Clone)]
pub struct SettingsService {
    config: SharedConfig,
}

impl SettingsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn get(&self) -> Result<SettingsSnapshot> {
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        let match_policy = db.get_match_policy()?;
        Ok(SettingsSnapshot {
            guild: guild.name,
            active_guild_id: guild.id,
            match_policy,
        })
    }

    pub fn update(&self, guild: Option<&str>, match_policy: Option<MatchPolicy>) -> Result<()> {
        let db = self.db()?;
        if let Some(guild) = guild {
            let guild = db.get_or_create_guild(guild.trim())?;
            db.set_active_guild(guild.id)?;
        }
        if let Some(policy) = match_policy {
            db.set_match_policy(policy)?;
        }
        Ok(())
    }
}
