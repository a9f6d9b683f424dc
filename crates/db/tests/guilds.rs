mod support;

use guild_core::MatchPolicy;
use support::{insert_member, setup_db, setup_guild};

#[test]
fn set_active_guild_returns_expected_guild() {
    let mut test_db = setup_db();
    let db = &mut test_db.db;
    let guild = db.add_guild("별빛기사단").expect("add guild");
    db.set_active_guild(guild.id).expect("set active");

    let active = db.get_active_guild().expect("active guild").expect("guild");
    assert_eq!(active.id, guild.id);
    assert_eq!(active.name, "별빛기사단");
}

#[test]
fn ensure_active_guild_creates_a_default_on_first_run() {
    let mut test_db = setup_db();
    let guild = test_db.db.ensure_active_guild().expect("ensure");
    assert_eq!(guild.name, "Default");

    let again = test_db.db.ensure_active_guild().expect("ensure again");
    assert_eq!(again.id, guild.id);
}

#[test]
fn get_or_create_guild_is_idempotent() {
    let test_db = setup_db();
    let first = test_db.db.get_or_create_guild("이세계 원정대").expect("first");
    let second = test_db.db.get_or_create_guild("이세계 원정대").expect("second");
    assert_eq!(first.id, second.id);
    assert_eq!(test_db.db.list_guilds().expect("list").len(), 1);
}

#[test]
fn delete_guild_cascades_members_and_records() {
    let mut test_db = setup_db();
    let guild = setup_guild(&mut test_db.db);
    let member = insert_member(&test_db.db, guild.id, "Alice", 1_000_000);

    let mut record = guild_core::DailyRecord::new();
    record.insert(
        member.id,
        guild_core::ActivityCounters {
            basic: 1,
            ..Default::default()
        },
    );
    test_db
        .db
        .merge_daily_record(guild.id, "2025-08-06", &record)
        .expect("merge");

    test_db.db.delete_guild(guild.id).expect("delete");

    assert!(test_db.db.get_guild_by_id(guild.id).expect("get").is_none());
    assert!(test_db.db.list_members(guild.id).expect("list").is_empty());
    assert!(
        test_db
            .db
            .get_daily_record(guild.id, "2025-08-06")
            .expect("record")
            .is_empty()
    );
}

#[test]
fn match_policy_defaults_to_exact_and_round_trips() {
    let test_db = setup_db();
    assert_eq!(
        test_db.db.get_match_policy().expect("policy"),
        MatchPolicy::Exact
    );

    test_db
        .db
        .set_match_policy(MatchPolicy::Folded)
        .expect("set");
    assert_eq!(
        test_db.db.get_match_policy().expect("policy"),
        MatchPolicy::Folded
    );
}

#[test]
fn migrate_twice_is_a_no_op() {
    let mut test_db = setup_db();
    test_db.db.migrate().expect("second migrate");
    let guild = test_db.db.ensure_active_guild().expect("ensure");
    assert!(guild.id > 0);
}
