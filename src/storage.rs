//! Durable storage for aggregate stats and completed sessions.
//!
//! One `SessionDb` wraps one sqlite connection. Writes go through the
//! persistence worker, which owns its own connection; the event loop may
//! hold a second connection for reads (history/mining).

use crate::config::Mode;
use crate::session::SessionRecord;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("could not create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
    #[error("corrupt session column: {0}")]
    Corrupt(String),
}

/// Lifetime counters, kept as a single row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub total: i64,
    pub total_attempted: i64,
    pub total_completed: i64,
    pub last_test_id: i64,
}

#[derive(Debug)]
pub struct SessionDb {
    conn: Connection,
}

impl SessionDb {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS aggregate_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total INTEGER NOT NULL,
                total_attempted INTEGER NOT NULL,
                total_completed INTEGER NOT NULL,
                last_test_id INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
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
                sample_rate INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Reads the single stats row, inserting a zeroed one on first use.
    pub fn aggregate_stats(&self) -> Result<AggregateStats, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT total, total_attempted, total_completed, last_test_id
                 FROM aggregate_stats WHERE id = 1",
                [],
                |row| {
                    Ok(AggregateStats {
                        total: row.get(0)?,
                        total_attempted: row.get(1)?,
                        total_completed: row.get(2)?,
                        last_test_id: row.get(3)?,
                    })
                },
            )
            .optional()?;

        match row {
            Some(stats) => Ok(stats),
            None => {
                let stats = AggregateStats::default();
                self.conn.execute(
                    "INSERT INTO aggregate_stats VALUES (1, ?1, ?2, ?3, ?4)",
                    params![
                        stats.total,
                        stats.total_attempted,
                        stats.total_completed,
                        stats.last_test_id
                    ],
                )?;
                Ok(stats)
            }
        }
    }

    pub fn update_aggregate_stats(&self, stats: &AggregateStats) -> Result<(), StorageError> {
        // make sure the row exists before updating it
        self.aggregate_stats()?;
        self.conn.execute(
            "UPDATE aggregate_stats
             SET total = ?1, total_attempted = ?2, total_completed = ?3, last_test_id = ?4
             WHERE id = 1",
            params![
                stats.total,
                stats.total_attempted,
                stats.total_completed,
                stats.last_test_id
            ],
        )?;
        Ok(())
    }

    pub fn insert_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        insert_session_inner(&self.conn, record)
    }

    /// Updates the stats row and inserts the session as a single
    /// transaction; any failure rolls both back.
    pub fn save_stats_and_session(
        &mut self,
        stats: &AggregateStats,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        self.aggregate_stats()?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE aggregate_stats
             SET total = ?1, total_attempted = ?2, total_completed = ?3, last_test_id = ?4
             WHERE id = 1",
            params![
                stats.total,
                stats.total_attempted,
                stats.total_completed,
                stats.last_test_id
            ],
        )?;
        insert_session_inner(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// The most recent `limit` session records, newest first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT created_at, word_list, mode, duration_secs, test_size, allow_backspace,
                    target, input, accuracy, cps, wpm, rle, cps_samples, accuracy_samples,
                    sample_rate
             FROM sessions ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let created_at: String = row.get(0)?;
            let mode: String = row.get(2)?;
            let cps_samples: String = row.get(12)?;
            let accuracy_samples: String = row.get(13)?;

            Ok(SessionRecord {
                created_at: parse_created_at(&created_at).map_err(|_| bad_column(0, "created_at"))?,
                word_list: row.get(1)?,
                mode: parse_mode(&mode).map_err(|_| bad_column(2, "mode"))?,
                duration_secs: row.get::<_, i64>(3)? as u64,
                test_size: row.get::<_, i64>(4)? as usize,
                allow_backspace: row.get(5)?,
                target: row.get(6)?,
                input: row.get(7)?,
                accuracy: row.get(8)?,
                cps: row.get(9)?,
                wpm: row.get(10)?,
                rle: row.get(11)?,
                cps_samples: parse_samples(&cps_samples).map_err(|_| bad_column(12, "cps_samples"))?,
                accuracy_samples: parse_samples(&accuracy_samples)
                    .map_err(|_| bad_column(13, "accuracy_samples"))?,
                sample_rate: row.get::<_, i64>(14)? as u32,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn session_count(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM sessions", [], |row| row.get(0))?)
    }
}

fn insert_session_inner(conn: &Connection, record: &SessionRecord) -> Result<(), StorageError> {
    let cps_samples = serde_json::to_string(&record.cps_samples)
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;
    let accuracy_samples = serde_json::to_string(&record.accuracy_samples)
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;

    conn.execute(
        r#"
        INSERT INTO sessions
            (created_at, word_list, mode, duration_secs, test_size, allow_backspace,
             target, input, accuracy, cps, wpm, rle, cps_samples, accuracy_samples,
             sample_rate)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            record.created_at.to_rfc3339(),
            record.word_list,
            record.mode.to_string(),
            record.duration_secs as i64,
            record.test_size as i64,
            record.allow_backspace,
            record.target,
            record.input,
            record.accuracy,
            record.cps,
            record.wpm,
            record.rle,
            cps_samples,
            accuracy_samples,
            record.sample_rate as i64,
        ],
    )?;
    Ok(())
}

fn bad_column(idx: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, name.to_string(), rusqlite::types::Type::Text)
}

fn parse_created_at(s: &str) -> Result<DateTime<Local>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| StorageError::Corrupt(format!("bad timestamp {s}")))
}

fn parse_mode(s: &str) -> Result<Mode, StorageError> {
    match s {
        "time" => Ok(Mode::Time),
        "words" => Ok(Mode::Words),
        other => Err(StorageError::Corrupt(format!("bad mode {other}"))),
    }
}

fn parse_samples(s: &str) -> Result<Vec<f64>, StorageError> {
    serde_json::from_str(s).map_err(|_| StorageError::Corrupt(format!("bad samples {s}")))
}
