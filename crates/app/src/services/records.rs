use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db, require_active_guild};
use guild_core::DailyRecord;
use guild_db::Db;

#[derive(Clone)]
pub struct RecordsService {
    config: SharedConfig,
}

impl RecordsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    pub fn get(&self, date: &str) -> Result<DailyRecord> {
        let date = require_date(date)?;
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        Ok(db.get_daily_record(guild.id, date)?)
    }

    /// Merge-write: entries for members not present in `record` are left
    /// untouched.
    pub fn merge(&self, date: &str, record: &DailyRecord) -> Result<usize> {
        let date = require_date(date)?;
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        Ok(db.merge_daily_record(guild.id, date, record)?)
    }

    pub fn dates(&self) -> Result<Vec<String>> {
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        Ok(db.list_record_dates(guild.id)?)
    }
}

// The date key is caller-supplied and stored verbatim; only emptiness is
// rejected.
fn require_date(date: &str) -> Result<&str> {
    if date.trim().is_empty() {
        return Err(AppError::InvalidInput("date is required".to_string()));
    }
    Ok(date)
}
