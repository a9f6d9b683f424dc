mod support;

use guild_core::MemberInput;
use support::{insert_member, setup_db, setup_guild};

#[test]
fn insert_and_list_members() {
    let mut test_db = setup_db();
    let guild = setup_guild(&mut test_db.db);

    insert_member(&test_db.db, guild.id, "용맹한곰", 15_000_000);
    insert_member(&test_db.db, guild.id, "달빛궁수", 12_400_000);

    let members = test_db.db.list_members(guild.id).expect("list");
    assert_eq!(members.len(), 2);
    assert!(members.iter().any(|member| member.name == "용맹한곰"));
}

#[test]
fn update_member_changes_fields_in_place() {
    let mut test_db = setup_db();
    let guild = setup_guild(&mut test_db.db);
    let member = insert_member(&test_db.db, guild.id, "용맹한곰", 15_000_000);

    let updated = test_db
        .db
        .update_member(
            guild.id,
            member.id,
            &MemberInput {
                name: "용맹한곰".to_string(),
                combat_power: 15_500_000,
                role: "성직자".to_string(),
            },
        )
        .expect("update")
        .expect("member");

    assert_eq!(updated.id, member.id);
    assert_eq!(updated.combat_power, 15_500_000);
    assert_eq!(updated.role, "성직자");
}

#[test]
fn update_missing_member_returns_none() {
    let mut test_db = setup_db();
    let guild = setup_guild(&mut test_db.db);

    let updated = test_db
        .db
        .update_member(
            guild.id,
            999,
            &MemberInput {
                name: "아무도".to_string(),
                combat_power: 0,
                role: "기타".to_string(),
            },
        )
        .expect("update");
    assert!(updated.is_none());
}

#[test]
fn delete_member_removes_member_and_their_records() {
    let mut test_db = setup_db();
    let guild = setup_guild(&mut test_db.db);
    let member = insert_member(&test_db.db, guild.id, "용맹한곰", 15_000_000);

    let mut record = guild_core::DailyRecord::new();
    record.insert(
        member.id,
        guild_core::ActivityCounters {
            basic: 2,
            ..Default::default()
        },
    );
    test_db
        .db
        .merge_daily_record(guild.id, "2025-08-06", &record)
        .expect("merge");

    test_db
        .db
        .delete_member(guild.id, member.id)
        .expect("delete");

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
fn members_are_scoped_to_their_guild() {
    let mut test_db = setup_db();
    let guild = setup_guild(&mut test_db.db);
    let other = test_db.db.get_or_create_guild("다른길드").expect("guild");

    insert_member(&test_db.db, guild.id, "용맹한곰", 15_000_000);

    assert_eq!(test_db.db.list_members(guild.id).expect("list").len(), 1);
    assert!(test_db.db.list_members(other.id).expect("list").is_empty());
}
