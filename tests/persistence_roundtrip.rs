use keyrace::config::{Config, Mode};
use keyrace::persist::{PersistHandle, PersistRequest};
use keyrace::session::{Keystroke, Session};
use keyrace::storage::{AggregateStats, SessionDb};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

fn completed_session() -> keyrace::session::SessionRecord {
    let config = Config {
        mode: Mode::Words,
        words_test_size: 4,
        words_per_line: 2,
        ..Config::default()
    };
    let words = vec!["cat".to_string(), "dog".to_string()];
    let mut rng = StdRng::seed_from_u64(23);
    let mut session = Session::new(&config, &words, &mut rng).unwrap();
    session.start();
    let target = session.target().to_string();
    for b in target.bytes() {
        session.handle_keystroke(Keystroke::Byte(b));
    }
    assert!(session.has_finished());
    session.finalize()
}

#[test]
fn record_survives_the_worker_and_reads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.db");
    let record = completed_session();

    let mut handle = PersistHandle::spawn(SessionDb::open(&path).unwrap());
    handle.enqueue(PersistRequest::InsertSession(record.clone()));
    handle.shutdown();

    let db = SessionDb::open(&path).unwrap();
    let rows = db.recent_sessions(10).unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.word_list, record.word_list);
    assert_eq!(row.mode, record.mode);
    assert_eq!(row.target, record.target);
    assert_eq!(row.input, record.input);
    assert_eq!(row.rle, record.rle);
    assert_eq!(row.accuracy, record.accuracy);
    assert_eq!(row.cps_samples, record.cps_samples);
    assert_eq!(row.accuracy_samples, record.accuracy_samples);
    assert_eq!(row.sample_rate, record.sample_rate);
}

#[test]
fn stats_and_session_commit_together() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.db");

    let stats = AggregateStats {
        total: 3,
        total_attempted: 3,
        total_completed: 2,
        last_test_id: 2,
    };

    let mut handle = PersistHandle::spawn(SessionDb::open(&path).unwrap());
    handle.enqueue(PersistRequest::StatsAndSession(stats, completed_session()));
    handle.shutdown();

    let db = SessionDb::open(&path).unwrap();
    assert_eq!(db.aggregate_stats().unwrap(), stats);
    assert_eq!(db.session_count().unwrap(), 1);
}

#[test]
fn history_comes_back_newest_first_and_capped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.db");

    let mut handle = PersistHandle::spawn(SessionDb::open(&path).unwrap());
    for _ in 0..5 {
        handle.enqueue(PersistRequest::InsertSession(completed_session()));
    }
    handle.shutdown();

    let db = SessionDb::open(&path).unwrap();
    let rows = db.recent_sessions(3).unwrap();
    assert_eq!(rows.len(), 3);
    for pair in rows.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[test]
fn reopening_the_database_keeps_everything() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.db");

    {
        let mut handle = PersistHandle::spawn(SessionDb::open(&path).unwrap());
        handle.enqueue(PersistRequest::UpdateStats(AggregateStats {
            total: 1,
            total_attempted: 1,
            total_completed: 1,
            last_test_id: 1,
        }));
        handle.enqueue(PersistRequest::InsertSession(completed_session()));
        handle.shutdown();
    }

    let db = SessionDb::open(&path).unwrap();
    assert_eq!(db.aggregate_stats().unwrap().total, 1);
    assert_eq!(db.session_count().unwrap(), 1);
}

// Pre-creates a sessions table with an extra NOT NULL column. Schema setup
// leaves it alone, so every session insert afterwards fails.
fn poison_sessions_table(path: &std::path::Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute(
        r#"
        CREATE TABLE sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            word_list TEXT NOT NULL,
            mode TEXT NOT NULL,
            duration_secs INTEGER NOT NULL,
            test_size INTEGER NOT NULL,
            allow_backspace BOOLEAN NOT NULL,
            target TEXT NOT NULL,
            input TEXT NOT NULL,
            accuracy REAL NOT NULL,
            cps REAL NOT NULL,
            wpm REAL NOT NULL,
            rle TEXT NOT NULL,
            cps_samples TEXT NOT NULL,
            accuracy_samples TEXT NOT NULL,
            sample_rate INTEGER NOT NULL,
            poison TEXT NOT NULL
        )
        "#,
        [],
    )
    .unwrap();
}

#[test]
fn failed_insert_surfaces_on_the_error_channel() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.db");
    poison_sessions_table(&path);

    let mut handle = PersistHandle::spawn(SessionDb::open(&path).unwrap());
    handle.enqueue(PersistRequest::InsertSession(completed_session()));
    handle.shutdown();

    assert!(handle.poll_error().is_some());
    let db = SessionDb::open(&path).unwrap();
    assert_eq!(db.session_count().unwrap(), 0);
}

#[test]
fn failed_combined_write_rolls_back_the_stats_update() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.db");
    poison_sessions_table(&path);

    let read_db = SessionDb::open(&path).unwrap();
    let before = read_db.aggregate_stats().unwrap();

    let stats = AggregateStats {
        total: 9,
        total_attempted: 9,
        total_completed: 9,
        last_test_id: 9,
    };
    let mut handle = PersistHandle::spawn(SessionDb::open(&path).unwrap());
    handle.enqueue(PersistRequest::StatsAndSession(stats, completed_session()));
    handle.shutdown();

    assert!(handle.poll_error().is_some());
    assert_eq!(read_db.aggregate_stats().unwrap(), before);
    assert_eq!(read_db.session_count().unwrap(), 0);
}

#[test]
fn worker_keeps_serving_after_a_failed_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("race.db");
    poison_sessions_table(&path);

    let stats = AggregateStats {
        total: 1,
        total_attempted: 1,
        total_completed: 0,
        last_test_id: 1,
    };
    let mut handle = PersistHandle::spawn(SessionDb::open(&path).unwrap());
    handle.enqueue(PersistRequest::InsertSession(completed_session()));
    handle.enqueue(PersistRequest::UpdateStats(stats));
    handle.shutdown();

    assert!(handle.poll_error().is_some());
    let db = SessionDb::open(&path).unwrap();
    assert_eq!(db.aggregate_stats().unwrap(), stats);
}
