use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db, require_active_guild};
use guild_core::Guild;
use guild_db::Db;

#[derive(Clone)]
pub struct GuildsService {
    config: SharedConfig,
}

impl GuildsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn list(&self) -> Result<Vec<Guild>> {
        let db = self.db()?;
        Ok(db.list_guilds()?)
    }

    pub fn active(&self) -> Result<Guild> {
        let mut db = self.db()?;
        require_active_guild(&mut db)
    }

    /// Registers (or looks up) a guild by name and makes it the active one.
    pub fn create(&self, name: &str) -> Result<Guild> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("guild name is required".to_string()));
        }
        let db = self.db()?;
        let guild = db.get_or_create_guild(name)?;
        db.set_active_guild(guild.id)?;
        db.update_guild_last_seen(guild.id)?;
        Ok(guild)
    }

    pub fn set_active(&self, guild_id: i64) -> Result<Guild> {
        let db = self.db()?;
        let guild = db
            .get_guild_by_id(guild_id)?
            .ok_or_else(|| AppError::NotFound("guild not found".to_string()))?;
        db.set_active_guild(guild.id)?;
        db.update_guild_last_seen(guild.id)?;
        Ok(guild)
    }

    /// Deletes a guild and everything scoped to it. The active guild can
    /// only be deleted when another guild exists to take its place.
    pub fn delete(&self, guild_id: i64) -> Result<()> {
        let mut db = self.db()?;
        let active = require_active_guild(&mut db)?;
        if active.id == guild_id {
            let replacement = db
                .list_guilds()?
                .into_iter()
                .find(|guild| guild.id != guild_id)
                .ok_or_else(|| {
                    AppError::InvalidInput("cannot delete the last guild".to_string())
                })?;
            db.set_active_guild(replacement.id)?;
        }
        db.delete_guild(guild_id)?;
        Ok(())
    }
}
