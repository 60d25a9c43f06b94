//! End-to-end flows through the `App` facade over real snapshot files and argon2.

use app_lib::adapters::{Argon2Hasher, JsonFileStore};
use app_lib::validation::{SignupForm, TaskForm};
use app_lib::{App, AppError, Config};
use chrono::{DateTime, Duration, TimeZone, Utc};
use questlog_core::{Engine, FixedClock, LedgerError, Priority, QuestSettings, Rollover, TaskView};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
}

fn open_app(dir: &Path, clock: Arc<FixedClock>) -> App {
    let config = Arc::new(Config {
        storage_dir: dir.to_path_buf(),
        bonus_probability: 0.0,
        ..Config::default()
    });
    let store = Arc::new(JsonFileStore::open(dir).unwrap());
    let engine = Engine::open(
        store.clone(),
        store,
        Arc::new(Argon2Hasher::new()),
        clock,
        QuestSettings {
            bonus_probability: 0.0,
            ..QuestSettings::default()
        },
    )
    .unwrap();
    App::from_engine(config, engine)
}

fn signup(username: &str, password: &str) -> SignupForm {
    SignupForm {
        username: username.to_string(),
        password: password.to_string(),
        confirm_password: password.to_string(),
    }
}

fn task_form(title: &str, deadline: DateTime<Utc>, xp_reward: u64) -> TaskForm {
    TaskForm {
        title: title.to_string(),
        description: None,
        priority: Priority::Medium,
        deadline,
        xp_reward,
    }
}

fn assert_ledger_error(result: Result<impl std::fmt::Debug, AppError>, expected: fn(&LedgerError) -> bool) {
    match result {
        Err(AppError::Ledger(e)) if expected(&e) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn signup_validation_rejects_bad_forms() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(dir.path(), Arc::new(FixedClock::utc(morning())));

    let mismatch = SignupForm {
        confirm_password: "other-secret".to_string(),
        ..signup("alice", "secret1")
    };
    assert_ledger_error(app.sign_up(&mismatch), |e| {
        matches!(e, LedgerError::ValidationFailed(_))
    });
    assert_ledger_error(app.sign_up(&signup("alice", "abc")), |e| {
        matches!(e, LedgerError::ValidationFailed(_))
    });
    assert_ledger_error(app.sign_up(&signup("   ", "secret1")), |e| {
        matches!(e, LedgerError::ValidationFailed(_))
    });
    assert!(app.current_user().is_none());

    app.sign_up(&signup("alice", "secret1")).unwrap();
    app.log_out();
    assert_ledger_error(app.sign_up(&signup("alice", "secret2")), |e| {
        matches!(e, LedgerError::UsernameTaken(_))
    });

    // The stored username is exactly what was typed.
    let padded = app.sign_up(&signup(" alice", "secret2")).unwrap();
    assert_eq!(padded.username, " alice");
}

#[test]
fn alice_signs_up_logs_out_and_back_in() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(dir.path(), Arc::new(FixedClock::utc(morning())));

    let alice = app.sign_up(&signup("alice", "secret1")).unwrap();
    assert_eq!((alice.level, alice.xp), (0, 0));
    assert_ne!(alice.secret_hash, "secret1");
    assert_eq!(app.current_user().map(|i| i.id), Some(alice.id));
    assert_eq!(app.tasks(TaskView::ActiveDailyQuests).len(), 3);

    app.log_out();
    assert!(app.current_user().is_none());
    assert_ledger_error(app.log_in("alice", "wrong"), |e| {
        matches!(e, LedgerError::InvalidCredentials)
    });
    assert_ledger_error(app.log_in("bob", "secret1"), |e| {
        matches!(e, LedgerError::InvalidCredentials)
    });

    // Usernames are matched exactly, surrounding spaces included.
    assert_ledger_error(app.log_in(" alice ", "secret1"), |e| {
        matches!(e, LedgerError::InvalidCredentials)
    });

    let again = app.log_in("alice", "secret1").unwrap();
    assert_eq!(again.id, alice.id);
    // Same day: no second batch of quests.
    assert_eq!(app.tasks(TaskView::ActiveDailyQuests).len(), 3);
    assert!(matches!(
        app.refresh_daily_quests().unwrap(),
        Some(Rollover::AlreadyAssigned { .. })
    ));
}

#[test]
fn anonymous_callers_see_nothing_and_cannot_write() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(dir.path(), Arc::new(FixedClock::utc(morning())));

    assert_ledger_error(app.add_task(task_form("Read", morning() + Duration::hours(2), 10)), |e| {
        matches!(e, LedgerError::NotAuthenticated)
    });
    assert!(app.tasks(TaskView::All).is_empty());
    assert!(app.dashboard().is_none());
    assert!(app.history().is_none());
    assert!(app.progress().is_none());
    assert!(app.refresh_daily_quests().unwrap().is_none());
}

#[test]
fn task_forms_are_validated_against_the_clock() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(dir.path(), Arc::new(FixedClock::utc(morning())));
    app.sign_up(&signup("alice", "secret1")).unwrap();

    assert_ledger_error(app.add_task(task_form("  ", morning() + Duration::hours(1), 10)), |e| {
        matches!(e, LedgerError::ValidationFailed(_))
    });
    assert_ledger_error(app.add_task(task_form("Late", morning() - Duration::hours(1), 10)), |e| {
        matches!(e, LedgerError::ValidationFailed(_))
    });
    assert_ledger_error(app.add_task(task_form("Free", morning() + Duration::hours(1), 0)), |e| {
        matches!(e, LedgerError::ValidationFailed(_))
    });
    assert_ledger_error(app.add_task(task_form("Jackpot", morning() + Duration::hours(1), u64::MAX)), |e| {
        matches!(e, LedgerError::ValidationFailed(_))
    });

    let task = app
        .add_task(task_form("  Write report  ", morning() + Duration::hours(3), 40))
        .unwrap();
    assert_eq!(task.title, "Write report");

    let edited = app
        .edit_task(task.id, task_form("Write the report", morning() + Duration::hours(4), 60))
        .unwrap();
    assert_eq!(edited.xp_reward, 60);
    assert!(!edited.completed);
}

#[test]
fn completion_awards_xp_once_and_levels_up() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(dir.path(), Arc::new(FixedClock::utc(morning())));
    app.sign_up(&signup("alice", "secret1")).unwrap();

    let warmup = app
        .add_task(task_form("Warm up", morning() + Duration::hours(4), 50))
        .unwrap();
    let task = app
        .add_task(task_form("Big push", morning() + Duration::hours(5), 100))
        .unwrap();
    app.complete_task(warmup.id).unwrap();
    let completion = app.complete_task(task.id).unwrap().unwrap();
    assert_eq!(completion.xp_awarded, 100);
    let change = completion.level_change.unwrap();
    assert_eq!((change.new_level, change.xp), (1, 50));

    assert!(app.complete_task(task.id).unwrap().is_none());
    let progress = app.progress().unwrap();
    assert_eq!((progress.level, progress.xp, progress.next_level_xp), (1, 50, 150));

    let history = app.history().unwrap();
    assert_eq!(history.total_xp_earned, 150);
    assert_eq!(history.days.len(), 1);
    assert_eq!(history.days[0].tasks.len(), 2);
}

#[test]
fn snapshots_survive_reopening() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::utc(morning()));

    let (alice_id, task_id) = {
        let mut app = open_app(dir.path(), clock.clone());
        let alice = app.sign_up(&signup("alice", "secret1")).unwrap();
        let task = app
            .add_task(task_form("Groceries", morning() + Duration::hours(6), 20))
            .unwrap();
        app.complete_task(task.id).unwrap();
        (alice.id, task.id)
    };
    assert!(dir.path().join("users.json").exists());
    assert!(dir.path().join("tasks-storage.json").exists());

    let mut app = open_app(dir.path(), clock);
    assert!(app.current_user().is_none());
    let alice = app.log_in("alice", "secret1").unwrap();
    assert_eq!(alice.id, alice_id);
    assert_eq!(alice.xp, 20);

    let completed = app.tasks(TaskView::Completed);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, task_id);
    // The daily marker was persisted too.
    assert_eq!(app.tasks(TaskView::ActiveDailyQuests).len(), 3);
}

#[test]
fn users_cannot_touch_each_others_tasks() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(dir.path(), Arc::new(FixedClock::utc(morning())));

    app.sign_up(&signup("alice", "secret1")).unwrap();
    let alices = app
        .add_task(task_form("Alice's errand", morning() + Duration::hours(2), 10))
        .unwrap();
    app.log_out();

    app.sign_up(&signup("bob", "secret2")).unwrap();
    // Bob gets his own quests on the same day.
    assert_eq!(app.tasks(TaskView::ActiveDailyQuests).len(), 3);
    assert!(app.tasks(TaskView::All).iter().all(|t| t.id != alices.id));

    assert_ledger_error(app.complete_task(alices.id), |e| matches!(e, LedgerError::NotFound(_)));
    assert_ledger_error(app.delete_task(alices.id), |e| matches!(e, LedgerError::NotFound(_)));
    assert_ledger_error(
        app.edit_task(alices.id, task_form("Mine now", morning() + Duration::hours(2), 90)),
        |e| matches!(e, LedgerError::NotFound(_)),
    );

    app.log_out();
    app.log_in("alice", "secret1").unwrap();
    let still_there = app.tasks(TaskView::Pending);
    assert!(still_there.iter().any(|t| t.id == alices.id && t.xp_reward == 10));
}

#[test]
fn deleting_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(dir.path(), Arc::new(FixedClock::utc(morning())));
    app.sign_up(&signup("alice", "secret1")).unwrap();

    let task = app
        .add_task(task_form("Throwaway", morning() + Duration::hours(1), 15))
        .unwrap();
    assert!(app.delete_task(task.id).unwrap());
    assert!(!app.delete_task(task.id).unwrap());
}

#[test]
fn the_next_day_brings_new_quests() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::utc(morning()));
    let mut app = open_app(dir.path(), clock.clone());
    app.sign_up(&signup("alice", "secret1")).unwrap();

    let quests = app.tasks(TaskView::ActiveDailyQuests);
    let done = app.complete_task(quests[0].id).unwrap().unwrap();
    assert_eq!(done.xp_awarded, 30);
    app.log_out();

    clock.advance(Duration::days(1));
    app.log_in("alice", "secret1").unwrap();

    let fresh = app.tasks(TaskView::ActiveDailyQuests);
    assert_eq!(fresh.len(), 3);
    assert!(fresh.iter().all(|t| quests.iter().all(|old| old.id != t.id)));

    // The completed quest stays as history, the two lapsed ones are gone.
    let all = app.tasks(TaskView::All);
    assert_eq!(all.len(), 4);
    assert!(all.iter().any(|t| t.id == quests[0].id && t.completed));
}

#[test]
fn open_reads_the_configured_directory() {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(Config {
        storage_dir: dir.path().join("nested"),
        ..Config::default()
    });
    let mut app = App::open(config).unwrap();
    app.sign_up(&signup("alice", "secret1")).unwrap();
    assert!(dir.path().join("nested").join("users.json").exists());
}
