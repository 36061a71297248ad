// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! SQLite access layer that traces every statement through a `DbLogger`.

use crate::clocks::{Clock, SystemClock};
use crate::context::Context;
use crate::db::{DbError, DbLogger, DbResult, map_sqlx_error};
use log::warn;
use sqlx::Sqlite;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use std::error::Error;
use std::sync::Arc;
use time::OffsetDateTime;

/// Number of rows reported to the logger when a statement fails.
const UNKNOWN_ROWS: i64 = -1;

/// A database instance backed by SQLite whose statements are traced.
pub struct SqliteDb {
    /// SQLite connection pool.  Limited to a single connection so that in-memory databases are
    /// visible to all statements.
    pool: SqlitePool,

    /// Logger that receives a trace for every statement.
    logger: Arc<dyn DbLogger>,

    /// Clock used to timestamp the start of statements.
    clock: Arc<dyn Clock>,
}

impl SqliteDb {
    /// Opens a connection to the database at `conn_str` and traces statements via `logger`.
    pub async fn connect(conn_str: &str, logger: Arc<dyn DbLogger>) -> DbResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(conn_str)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self { pool, logger, clock: Arc::new(SystemClock::default()) })
    }

    /// Replaces the clock used to timestamp statements.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.pool.close().await
    }

    /// Reports the outcome of running `sql` since `begin` to the logger.
    fn trace(
        &self,
        ctx: &Context,
        begin: OffsetDateTime,
        sql: &str,
        rows: i64,
        err: Option<&DbError>,
    ) {
        let err = err.map(|e| e as &(dyn Error + 'static));
        self.logger.trace(ctx, begin, &|| (sql.to_owned(), rows), err);
    }

    /// Runs `sql` and returns the number of affected rows.
    pub async fn execute(&self, ctx: &Context, sql: &str) -> DbResult<u64> {
        let begin = self.clock.now_utc();
        let result = sqlx::query::<Sqlite>(sql)
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(map_sqlx_error);
        let rows = match &result {
            Ok(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            Err(_) => UNKNOWN_ROWS,
        };
        self.trace(ctx, begin, sql, rows, result.as_ref().err());
        result
    }

    /// Runs `sql` and returns all rows it yields.
    pub async fn fetch_all(&self, ctx: &Context, sql: &str) -> DbResult<Vec<SqliteRow>> {
        let begin = self.clock.now_utc();
        let result = sqlx::query::<Sqlite>(sql).fetch_all(&self.pool).await.map_err(map_sqlx_error);
        let rows = match &result {
            Ok(rows) => i64::try_from(rows.len()).unwrap_or(i64::MAX),
            Err(_) => UNKNOWN_ROWS,
        };
        self.trace(ctx, begin, sql, rows, result.as_ref().err());
        result
    }

    /// Runs `sql` and returns the first row it yields, or `DbError::NotFound` if there is none.
    pub async fn fetch_one(&self, ctx: &Context, sql: &str) -> DbResult<SqliteRow> {
        let begin = self.clock.now_utc();
        let result = sqlx::query::<Sqlite>(sql).fetch_one(&self.pool).await.map_err(map_sqlx_error);
        let rows = match &result {
            Ok(_) => 1,
            Err(DbError::NotFound) => 0,
            Err(_) => UNKNOWN_ROWS,
        };
        self.trace(ctx, begin, sql, rows, result.as_ref().err());
        result
    }
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{LogBridge, TRACE_ERROR_MESSAGE, TRACE_MESSAGE, TRACE_NOT_FOUND_MESSAGE};
    use crate::clocks::testutils::SettableClock;
    use crate::fields::FieldValue;
    use crate::level::Level;
    use crate::logger::testutils::RecordingLogger;
    use sqlx::Row;
    use time::macros::datetime;

    /// Opens an in-memory database that traces statements at `level_name` into a new logger.
    async fn setup(level_name: &str) -> (Arc<RecordingLogger>, SqliteDb) {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let logger = Arc::new(RecordingLogger::with_context());
        let clock = Arc::new(SettableClock::new(datetime!(2023-12-01 10:00:00 UTC)));
        let bridge = LogBridge::new(logger.clone(), level_name).with_clock(clock.clone());
        let db = SqliteDb::connect(":memory:", Arc::new(bridge)).await.unwrap().with_clock(clock);
        (logger, db)
    }

    #[tokio::test]
    async fn test_execute_traces_statement() {
        let (logger, db) = setup("info").await;
        let ctx = Context::background().with_field("request_id", "r-1");

        db.execute(&ctx, "CREATE TABLE test (i INTEGER)").await.unwrap();
        assert_eq!(2, db.execute(&ctx, "INSERT INTO test (i) VALUES (3), (4)").await.unwrap());

        let records = logger.take();
        assert_eq!(2, records.len());
        for record in &records {
            assert_eq!(Level::Info, record.level);
            assert_eq!(TRACE_MESSAGE, record.message);
            assert_eq!(Some(&ctx), record.ctx.as_ref());
            assert_eq!(Some(&FieldValue::Duration(time::Duration::ZERO)), record.field("elapsed"));
        }
        assert_eq!(
            Some(&FieldValue::Str("INSERT INTO test (i) VALUES (3), (4)".to_owned())),
            records[1].field("sql")
        );
        assert_eq!(Some(&FieldValue::I64(2)), records[1].field("rows"));

        db.close().await;
    }

    #[tokio::test]
    async fn test_fetch_all_counts_rows() {
        let (logger, db) = setup("warn").await;
        let ctx = Context::background();

        db.execute(&ctx, "CREATE TABLE test (i INTEGER)").await.unwrap();
        db.execute(&ctx, "INSERT INTO test (i) VALUES (1), (2), (3)").await.unwrap();
        let _ = logger.take();

        let rows = db.fetch_all(&ctx, "SELECT i FROM test ORDER BY i").await.unwrap();
        assert_eq!(vec![1, 2, 3], rows.iter().map(|r| r.get::<i64, _>("i")).collect::<Vec<_>>());

        let records = logger.take();
        assert_eq!(1, records.len());
        assert_eq!(Some(&FieldValue::I64(3)), records[0].field("rows"));

        db.close().await;
    }

    #[tokio::test]
    async fn test_fetch_one_not_found_is_info() {
        let (logger, db) = setup("info").await;
        let ctx = Context::background();

        db.execute(&ctx, "CREATE TABLE test (i INTEGER)").await.unwrap();
        let _ = logger.take();

        assert_eq!(
            Some(DbError::NotFound),
            db.fetch_one(&ctx, "SELECT i FROM test WHERE i = 5").await.err()
        );

        let records = logger.take();
        assert_eq!(1, records.len());
        assert_eq!(Level::Info, records[0].level);
        assert_eq!(TRACE_NOT_FOUND_MESSAGE, records[0].message);
        assert_eq!(Some(&FieldValue::I64(0)), records[0].field("rows"));

        db.close().await;
    }

    #[tokio::test]
    async fn test_fetch_one_ok() {
        let (logger, db) = setup("info").await;
        let ctx = Context::background();

        db.execute(&ctx, "CREATE TABLE test (i INTEGER)").await.unwrap();
        db.execute(&ctx, "INSERT INTO test (i) VALUES (5)").await.unwrap();
        let _ = logger.take();

        let row = db.fetch_one(&ctx, "SELECT i FROM test WHERE i = 5").await.unwrap();
        assert_eq!(5, row.get::<i64, _>("i"));

        let records = logger.take();
        assert_eq!(1, records.len());
        assert_eq!(Some(&FieldValue::I64(1)), records[0].field("rows"));

        db.close().await;
    }

    #[tokio::test]
    async fn test_execute_error_is_error() {
        let (logger, db) = setup("warn").await;
        let ctx = Context::background();

        match db.execute(&ctx, "INSERT INTO missing (i) VALUES (1)").await {
            Err(DbError::BackendError(_)) => (),
            e => panic!("Unexpected result {:?}", e),
        }

        let records = logger.take();
        assert_eq!(1, records.len());
        assert_eq!(Level::Error, records[0].level);
        assert_eq!(TRACE_ERROR_MESSAGE, records[0].message);
        assert_eq!(Some(&FieldValue::I64(-1)), records[0].field("rows"));
        match records[0].field("error") {
            Some(FieldValue::Error(_)) => (),
            f => panic!("Unexpected error field {:?}", f),
        }

        db.close().await;
    }

    #[tokio::test]
    async fn test_unique_violation_is_already_exists() {
        let (logger, db) = setup("error").await;
        let ctx = Context::background();

        db.execute(&ctx, "CREATE TABLE test (i INTEGER PRIMARY KEY)").await.unwrap();
        db.execute(&ctx, "INSERT INTO test (i) VALUES (1)").await.unwrap();
        assert_eq!(
            DbError::AlreadyExists,
            db.execute(&ctx, "INSERT INTO test (i) VALUES (1)").await.unwrap_err()
        );

        // Traces are disabled at the error level, even for failed statements.
        assert!(logger.take().is_empty());

        db.close().await;
    }

    #[tokio::test]
    async fn test_foreign_key_violation_is_error() {
        let (logger, db) = setup("info").await;
        let ctx = Context::background();

        db.execute(&ctx, "PRAGMA foreign_keys = ON").await.unwrap();
        db.execute(&ctx, "CREATE TABLE parent (id INTEGER PRIMARY KEY)").await.unwrap();
        db.execute(&ctx, "CREATE TABLE child (pid INTEGER REFERENCES parent (id))").await.unwrap();
        let _ = logger.take();

        match db.execute(&ctx, "INSERT INTO child (pid) VALUES (42)").await {
            Err(DbError::DataIntegrityError(e)) => {
                assert!(e.contains("FOREIGN KEY constraint failed"), "{}", e)
            }
            e => panic!("Unexpected result {:?}", e),
        }

        let records = logger.take();
        assert_eq!(1, records.len());
        assert_eq!(Level::Error, records[0].level);
        assert_eq!(TRACE_ERROR_MESSAGE, records[0].message);

        db.close().await;
    }

    #[tokio::test]
    async fn test_silent_logs_nothing() {
        let (logger, db) = setup("silent").await;
        let ctx = Context::background();

        db.execute(&ctx, "CREATE TABLE test (i INTEGER)").await.unwrap();
        assert!(db.fetch_one(&ctx, "SELECT i FROM test").await.is_err());
        db.execute(&ctx, "SELECT * FROM missing").await.unwrap_err();
        assert!(logger.take().is_empty());

        db.close().await;
    }
}
