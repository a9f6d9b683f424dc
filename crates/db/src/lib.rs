mod error;
mod migrations;

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use guild_core::{ActivityCounters, DailyRecord, Guild, MatchPolicy, MemberInput, RosterMember};

pub use error::{DbError, Result};

const ACTIVE_GUILD_KEY: &str = "active_guild_id";
const MATCH_POLICY_KEY: &str = "match_policy";

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM app_setting WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get::<_, String>(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO app_setting (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_match_policy(&self) -> Result<MatchPolicy> {
        let value = self.get_setting(MATCH_POLICY_KEY)?;
        Ok(value
            .as_deref()
            .and_then(MatchPolicy::parse)
            .unwrap_or_default())
    }

    pub fn set_match_policy(&self, policy: MatchPolicy) -> Result<()> {
        self.set_setting(MATCH_POLICY_KEY, policy.as_str())
    }

    pub fn list_guilds(&self) -> Result<Vec<Guild>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, created_at, last_seen_at
            FROM guild
            ORDER BY created_at ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], row_to_guild)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_guild_by_id(&self, id: i64) -> Result<Option<Guild>> {
        self.conn
            .query_row(
                "SELECT id, name, created_at, last_seen_at FROM guild WHERE id = ?1",
                params![id],
                row_to_guild,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn get_guild_by_name(&self, name: &str) -> Result<Option<Guild>> {
        self.conn
            .query_row(
                "SELECT id, name, created_at, last_seen_at FROM guild WHERE name = ?1",
                params![name],
                row_to_guild,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn add_guild(&self, name: &str) -> Result<Guild> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO guild (name, created_at, last_seen_at) VALUES (?1, ?2, ?3)",
            params![name, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_guild_by_id(id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_or_create_guild(&self, name: &str) -> Result<Guild> {
        if let Some(guild) = self.get_guild_by_name(name)? {
            return Ok(guild);
        }
        let inserted = self.add_guild(name);
        if let Ok(guild) = inserted {
            return Ok(guild);
        }
        if let Some(guild) = self.get_guild_by_name(name)? {
            return Ok(guild);
        }
        Err(inserted
            .err()
            .unwrap_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)))
    }

    pub fn set_active_guild(&self, guild_id: i64) -> Result<()> {
        self.set_setting(ACTIVE_GUILD_KEY, &guild_id.to_string())
    }

    pub fn get_active_guild(&self) -> Result<Option<Guild>> {
        let value = self.get_setting(ACTIVE_GUILD_KEY)?;
        let Some(value) = value else {
            return Ok(None);
        };
        let Some(id) = value.parse::<i64>().ok() else {
            return Ok(None);
        };
        self.get_guild_by_id(id)
    }

    pub fn ensure_active_guild(&mut self) -> Result<Guild> {
        if let Some(guild) = self.get_active_guild()? {
            return Ok(guild);
        }
        let guild = self.get_or_create_guild("Default")?;
        self.set_active_guild(guild.id)?;
        Ok(guild)
    }

    pub fn update_guild_last_seen(&self, guild_id: i64) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE guild SET last_seen_at = ?1 WHERE id = ?2",
            params![now, guild_id],
        )?;
        Ok(())
    }

    pub fn delete_guild(&mut self, guild_id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM daily_record WHERE guild_id = ?1",
            params![guild_id],
        )?;
        tx.execute("DELETE FROM member WHERE guild_id = ?1", params![guild_id])?;
        tx.execute("DELETE FROM guild WHERE id = ?1", params![guild_id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn list_members(&self, guild_id: i64) -> Result<Vec<RosterMember>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, combat_power, role
            FROM member
            WHERE guild_id = ?1
            ORDER BY name ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![guild_id], row_to_member)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_member(&self, guild_id: i64, member_id: i64) -> Result<Option<RosterMember>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, combat_power, role
                FROM member
                WHERE guild_id = ?1 AND id = ?2
                "#,
                params![guild_id, member_id],
                row_to_member,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn insert_member(&self, guild_id: i64, input: &MemberInput) -> Result<RosterMember> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO member (guild_id, name, combat_power, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![guild_id, input.name, input.combat_power, input.role, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_member(guild_id, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn update_member(
        &self,
        guild_id: i64,
        member_id: i64,
        input: &MemberInput,
    ) -> Result<Option<RosterMember>> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            r#"
            UPDATE member
            SET name = ?1, combat_power = ?2, role = ?3, updated_at = ?4
            WHERE guild_id = ?5 AND id = ?6
            "#,
            params![input.name, input.combat_power, input.role, now, guild_id, member_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_member(guild_id, member_id)
    }

    pub fn delete_member(&mut self, guild_id: i64, member_id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM daily_record WHERE guild_id = ?1 AND member_id = ?2",
            params![guild_id, member_id],
        )?;
        tx.execute(
            "DELETE FROM member WHERE guild_id = ?1 AND id = ?2",
            params![guild_id, member_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_daily_record(&self, guild_id: i64, date: &str) -> Result<DailyRecord> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT member_id, basic, intermediate, advanced, item, boss_damage, boss_kills
            FROM daily_record
            WHERE guild_id = ?1 AND record_date = ?2
            "#,
        )?;
        let mut rows = stmt.query(params![guild_id, date])?;
        let mut record = DailyRecord::new();
        while let Some(row) = rows.next()? {
            let member_id: i64 = row.get(0)?;
            record.insert(member_id, row_to_counters(row)?);
        }
        Ok(record)
    }

    /// Merge-write: each supplied member entry is upserted and every other
    /// entry for the guild and date stays untouched.
    pub fn merge_daily_record(
        &mut self,
        guild_id: i64,
        date: &str,
        record: &DailyRecord,
    ) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO daily_record (
                  guild_id, record_date, member_id, basic, intermediate, advanced,
                  item, boss_damage, boss_kills, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(guild_id, record_date, member_id) DO UPDATE SET
                  basic = excluded.basic,
                  intermediate = excluded.intermediate,
                  advanced = excluded.advanced,
                  item = excluded.item,
                  boss_damage = excluded.boss_damage,
                  boss_kills = excluded.boss_kills,
                  updated_at = excluded.updated_at
                "#,
            )?;
            for (member_id, counters) in record {
                stmt.execute(params![
                    guild_id,
                    date,
                    member_id,
                    counters.basic as i64,
                    counters.intermediate as i64,
                    counters.advanced as i64,
                    counters.item as i64,
                    counters.boss_damage,
                    counters.boss_kills as i64,
                    now,
                ])?;
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    pub fn list_record_dates(&self, guild_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT DISTINCT record_date
            FROM daily_record
            WHERE guild_id = ?1
            ORDER BY record_date DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![guild_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_guild(row: &Row<'_>) -> std::result::Result<Guild, rusqlite::Error> {
    Ok(Guild {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        last_seen_at: row.get(3)?,
    })
}

fn row_to_member(row: &Row<'_>) -> std::result::Result<RosterMember, rusqlite::Error> {
    Ok(RosterMember {
        id: row.get(0)?,
        name: row.get(1)?,
        combat_power: row.get(2)?,
        role: row.get(3)?,
    })
}

fn row_to_counters(row: &Row<'_>) -> std::result::Result<ActivityCounters, rusqlite::Error> {
    Ok(ActivityCounters {
        basic: row.get::<_, i64>(1)? as u32,
        intermediate: row.get::<_, i64>(2)? as u32,
        advanced: row.get::<_, i64>(3)? as u32,
        item: row.get::<_, i64>(4)? as u32,
        boss_damage: row.get(5)?,
        boss_kills: row.get::<_, i64>(6)? as u32,
    })
}
