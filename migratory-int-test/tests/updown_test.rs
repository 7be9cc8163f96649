use migratory::common::{ReadExecutor, WriteExecutor};
use migratory::errors::{ErrorKind, MigratoryError};
use migratory::migration::{MigrationRecord, OpOptions, RawAction};
use migratory::storage::JsonStorageModule;
use migratory::{atomic, Atomic, Migratory};
use migratory_int_test::test_util::{cleanup, random_path};
use std::path::PathBuf;

fn tracked_record(name: &str, order: Atomic<Vec<String>>) -> MigrationRecord {
    let up_order = order.clone();
    let up_label = format!("up:{}", name);
    let down_order = order.clone();
    let down_label = format!("down:{}", name);
    MigrationRecord::new(name)
        .up(RawAction::ready(move |_params| {
            up_order.write_with(|o| o.push(up_label.clone()));
            Ok(())
        }))
        .down(RawAction::ready(move |_params| {
            down_order.write_with(|o| o.push(down_label.clone()));
            Ok(())
        }))
}

fn three_migration_engine(order: Atomic<Vec<String>>) -> (Migratory, PathBuf) {
    let storage_path = random_path();
    let migratory = Migratory::builder()
        .migrations(vec![
            tracked_record("2024-02-create-index.js", order.clone()),
            tracked_record("2024-01-create-users.js", order.clone()),
            tracked_record("2024-03-backfill.js", order.clone()),
        ])
        .storage_module(JsonStorageModule::new(&storage_path))
        .build()
        .expect("Failed to build engine");
    (migratory, storage_path)
}

#[test]
fn test_up_runs_all_pending_in_ascending_order() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order.clone());

    let applied = migratory.up(OpOptions::default()).expect("Failed to run up");

    assert_eq!(
        applied,
        vec![
            "2024-01-create-users",
            "2024-02-create-index",
            "2024-03-backfill"
        ]
    );
    assert_eq!(
        order.read_with(|o| o.clone()),
        vec![
            "up:2024-01-create-users.js",
            "up:2024-02-create-index.js",
            "up:2024-03-backfill.js"
        ]
    );
    cleanup(&path);
}

#[test]
fn test_up_is_idempotent() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order.clone());

    migratory.up(OpOptions::default()).expect("Failed to run up");
    let second = migratory.up(OpOptions::default()).expect("Failed to run up again");

    assert!(second.is_empty());
    assert_eq!(order.read_with(|o| o.len()), 3);
    cleanup(&path);
}

#[test]
fn test_up_to_stops_at_target_inclusive() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order);

    let applied = migratory
        .up(OpOptions::default().to("2024-02-create-index"))
        .expect("Failed to run up");

    assert_eq!(applied, vec!["2024-01-create-users", "2024-02-create-index"]);
    assert_eq!(migratory.pending().unwrap(), vec!["2024-03-backfill"]);
    cleanup(&path);
}

#[test]
fn test_up_unknown_target_fails_before_running_anything() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order.clone());

    let result = migratory.up(OpOptions::default().to("2030-01-later"));

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), &ErrorKind::TargetNotFound);
    assert!(order.read_with(|o| o.is_empty()));
    cleanup(&path);
}

#[test]
fn test_down_reverts_only_the_most_recent_by_default() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order);
    migratory.up(OpOptions::default()).expect("Failed to run up");

    let reverted = migratory.down(OpOptions::default()).expect("Failed to run down");

    assert_eq!(reverted, vec!["2024-03-backfill"]);
    assert_eq!(
        migratory.executed().unwrap(),
        vec!["2024-01-create-users", "2024-02-create-index"]
    );
    cleanup(&path);
}

#[test]
fn test_down_all_reverts_full_history_latest_first() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order.clone());
    migratory.up(OpOptions::default()).expect("Failed to run up");

    let reverted = migratory
        .down(OpOptions::default().all())
        .expect("Failed to run down");

    assert_eq!(
        reverted,
        vec![
            "2024-03-backfill",
            "2024-02-create-index",
            "2024-01-create-users"
        ]
    );
    assert!(migratory.executed().unwrap().is_empty());

    let downs = order.read_with(|o| {
        o.iter().filter(|e| e.starts_with("down:")).cloned().collect::<Vec<_>>()
    });
    assert_eq!(
        downs,
        vec![
            "down:2024-03-backfill.js",
            "down:2024-02-create-index.js",
            "down:2024-01-create-users.js"
        ]
    );
    cleanup(&path);
}

#[test]
fn test_down_limit_reverts_the_last_n() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order);
    migratory.up(OpOptions::default()).expect("Failed to run up");

    let reverted = migratory
        .down(OpOptions::default().limit(2))
        .expect("Failed to run down");

    assert_eq!(reverted, vec!["2024-03-backfill", "2024-02-create-index"]);
    assert_eq!(migratory.executed().unwrap(), vec!["2024-01-create-users"]);
    cleanup(&path);
}

#[test]
fn test_down_to_reverts_down_to_target_inclusive() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order);
    migratory.up(OpOptions::default()).expect("Failed to run up");

    let reverted = migratory
        .down(OpOptions::default().to("2024-02-create-index"))
        .expect("Failed to run down");

    assert_eq!(reverted, vec!["2024-03-backfill", "2024-02-create-index"]);
    assert_eq!(migratory.executed().unwrap(), vec!["2024-01-create-users"]);
    cleanup(&path);
}

#[test]
fn test_up_only_rejects_an_already_applied_name() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order);
    migratory.up(OpOptions::default()).expect("Failed to run up");

    let result = migratory.up(OpOptions::default().only(["2024-01-create-users"]));

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ValidationError);
    assert_eq!(
        err.message(),
        "Migration is not pending: 2024-01-create-users.js"
    );
    cleanup(&path);
}

#[test]
fn test_down_only_rejects_a_never_applied_name() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order);

    let result = migratory.down(OpOptions::default().only(["2024-01-create-users"]));

    assert!(result.is_err());
    assert_eq!(
        result.unwrap_err().message(),
        "Migration is not executed: 2024-01-create-users.js"
    );
    cleanup(&path);
}

#[test]
fn test_round_trip_restores_pending_state() {
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let (migratory, path) = three_migration_engine(order);

    let before = migratory.pending().unwrap();
    migratory.up(OpOptions::default()).expect("Failed to run up");
    migratory.down(OpOptions::default().all()).expect("Failed to run down");
    let after = migratory.pending().unwrap();

    assert_eq!(before, after);
    cleanup(&path);
}

#[test]
fn test_failing_action_halts_the_plan_and_keeps_progress() {
    let storage_path = random_path();
    let order: Atomic<Vec<String>> = atomic(Vec::new());
    let migratory = Migratory::builder()
        .migrations(vec![
            tracked_record("001-first.js", order.clone()),
            MigrationRecord::new("002-broken.js")
                .up(RawAction::ready(|_params| {
                    Err(MigratoryError::new(
                        "relation already exists",
                        ErrorKind::ActionFailure,
                    ))
                }))
                .down(RawAction::ready(|_params| Ok(()))),
            tracked_record("003-third.js", order.clone()),
        ])
        .storage_module(JsonStorageModule::new(&storage_path))
        .build()
        .expect("Failed to build engine");

    let result = migratory.up(OpOptions::default());

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().message(), "relation already exists");
    assert_eq!(migratory.executed().unwrap(), vec!["001-first"]);
    assert_eq!(
        migratory.pending().unwrap(),
        vec!["002-broken", "003-third"]
    );
    cleanup(&storage_path);
}
