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

//! Logging contract consumed by the database layer.
//!
//! The database layer never talks to application loggers directly.  Instead, it holds a
//! `DbLogger`, which knows how to filter messages by verbosity and how to trace individual
//! statements.  `crate::bridge::LogBridge` is the canonical implementation.

use crate::context::Context;
use crate::level::Level;
use std::error::Error;
use std::fmt;
use time::OffsetDateTime;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("FOREIGN KEY constraint failed") => {
            DbError::DataIntegrityError(e.to_string())
        }
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Returns true if `err` reports that a query matched no records.
///
/// This recognizes both our own `DbError::NotFound` and the raw `sqlx::Error::RowNotFound`, so
/// callers can pass errors before or after mapping them with `map_sqlx_error`.
pub fn is_not_found(err: &(dyn Error + 'static)) -> bool {
    if let Some(e) = err.downcast_ref::<DbError>() {
        return matches!(e, DbError::NotFound);
    }
    matches!(err.downcast_ref::<sqlx::Error>(), Some(sqlx::Error::RowNotFound))
}

/// Computes the result of a statement for tracing purposes: its text and the number of rows it
/// affected or returned, or -1 if unknown.
pub type TraceResult<'a> = &'a dyn Fn() -> (String, i64);

/// Logging contract that the database layer relies on.
pub trait DbLogger: Send + Sync {
    /// Returns a new logger that filters messages at `level`.  The receiver is left untouched.
    fn with_level(&self, level: Level) -> Box<dyn DbLogger>;

    /// Emits an informational message on behalf of `ctx`.
    fn info(&self, ctx: &Context, args: fmt::Arguments<'_>);

    /// Emits a warning on behalf of `ctx`.
    fn warn(&self, ctx: &Context, args: fmt::Arguments<'_>);

    /// Emits an error on behalf of `ctx`.
    fn error(&self, ctx: &Context, args: fmt::Arguments<'_>);

    /// Traces the execution of a single statement that started at `begin` and that finished with
    /// `err`.  `result` is only evaluated if tracing is enabled.
    fn trace(
        &self,
        ctx: &Context,
        begin: OffsetDateTime,
        result: TraceResult<'_>,
        err: Option<&(dyn Error + 'static)>,
    );
}
