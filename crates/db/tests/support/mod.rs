#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use guild_core::{Guild, MemberInput, RosterMember};
use guild_db::Db;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn setup_guild(db: &mut Db) -> Guild {
    let guild = db.get_or_create_guild("이세계 원정대").expect("guild");
    db.set_active_guild(guild.id).expect("active");
    guild
}

pub fn insert_member(db: &Db, guild_id: i64, name: &str, combat_power: i64) -> RosterMember {
    db.insert_member(
        guild_id,
        &MemberInput {
            name: name.to_string(),
            combat_power,
            role: "전사".to_string(),
        },
    )
    .expect("insert member")
}
