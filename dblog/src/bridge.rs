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

//! Adapter from application loggers to the logging contract of the database layer.

use crate::clocks::{Clock, SystemClock};
use crate::context::Context;
use crate::db::{DbLogger, TraceResult, is_not_found};
use crate::fields::{Field, FieldValue};
use crate::level::Level;
use crate::logger::LeveledLogger;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;

/// Message for statements that completed successfully.
pub const TRACE_MESSAGE: &str = "GORM SQL";

/// Message for statements that matched no records.
pub const TRACE_NOT_FOUND_MESSAGE: &str = "GORM SQL - Record not found";

/// Message for statements that failed.
pub const TRACE_ERROR_MESSAGE: &str = "GORM SQL ERROR";

/// Wraps a `LeveledLogger` to offer the `DbLogger` contract.
///
/// The bridge filters messages by its verbosity threshold before doing any formatting work and
/// then hands them to the wrapped logger, preferring its context-aware extension when available.
///
/// The bridge is immutable.  Changing the threshold via `with_level` returns a new bridge that
/// shares the wrapped logger with the original one.
#[derive(Clone)]
pub struct LogBridge {
    /// The application logger that receives all messages.
    underlying: Arc<dyn LeveledLogger>,

    /// Clock used to compute how long statements took.
    clock: Arc<dyn Clock>,

    /// Verbosity threshold.
    level: Level,

    /// Whether statement traces are emitted.  Derived from `level`.
    trace_enabled: bool,
}

impl fmt::Debug for LogBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBridge")
            .field("level", &self.level)
            .field("trace_enabled", &self.trace_enabled)
            .finish_non_exhaustive()
    }
}

impl LogBridge {
    /// Creates a new bridge around `underlying` with the threshold named by `level_name`.
    ///
    /// Unknown level names silence the bridge instead of raising an error.
    pub fn new(underlying: Arc<dyn LeveledLogger>, level_name: &str) -> Self {
        let level = Level::parse_lossy(level_name);
        Self {
            underlying,
            clock: Arc::new(SystemClock::default()),
            level,
            trace_enabled: level.traces(),
        }
    }

    /// Replaces the clock used to time statements.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self { clock, ..self }
    }

    /// Returns a copy of this bridge that filters messages at `level`.
    pub fn with_level(&self, level: Level) -> Self {
        Self {
            underlying: self.underlying.clone(),
            clock: self.clock.clone(),
            level,
            trace_enabled: level.traces(),
        }
    }

    /// Returns the verbosity threshold of this bridge.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns whether statement traces are emitted by this bridge.
    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    /// Hands a message to the underlying logger at `level`.
    fn dispatch(&self, level: Level, ctx: &Context, message: &str, fields: &[Field]) {
        match self.underlying.as_context_logger() {
            Some(logger) => match level {
                Level::Error => logger.error_ctx(ctx, message, fields),
                Level::Warn => logger.warn_ctx(ctx, message, fields),
                Level::Info => logger.info_ctx(ctx, message, fields),
                Level::Silent => (),
            },
            None => match level {
                Level::Error => self.underlying.error(message, fields),
                Level::Warn => self.underlying.warn(message, fields),
                Level::Info => self.underlying.info(message, fields),
                Level::Silent => (),
            },
        }
    }

    /// Formats `args` and emits them at `level` if the threshold allows it.
    fn emit(&self, level: Level, ctx: &Context, args: fmt::Arguments<'_>) {
        if !self.level.allows(level) {
            return;
        }
        self.dispatch(level, ctx, &args.to_string(), &[]);
    }

    /// Emits an informational message on behalf of `ctx`.
    pub fn info(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, ctx, args)
    }

    /// Emits a warning on behalf of `ctx`.
    pub fn warn(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, ctx, args)
    }

    /// Emits an error on behalf of `ctx`.
    pub fn error(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, ctx, args)
    }

    /// Traces a statement that started at `begin` and finished with `err`.
    ///
    /// `result` may be expensive to compute so it is only invoked, once, when tracing is enabled.
    /// Errors that report a missing record are logged as information, not as errors.
    pub fn trace(
        &self,
        ctx: &Context,
        begin: OffsetDateTime,
        result: TraceResult<'_>,
        err: Option<&(dyn Error + 'static)>,
    ) {
        if !self.trace_enabled {
            return;
        }

        let elapsed = self.clock.now_utc() - begin;
        let (sql, rows) = result();
        let mut fields = vec![
            Field::new("sql", sql),
            Field::new("elapsed", elapsed),
            Field::new("rows", rows),
        ];

        match err {
            None => self.dispatch(Level::Info, ctx, TRACE_MESSAGE, &fields),
            Some(err) => {
                fields.push(Field::new("error", FieldValue::from_error(err)));
                if is_not_found(err) {
                    self.dispatch(Level::Info, ctx, TRACE_NOT_FOUND_MESSAGE, &fields)
                } else {
                    self.dispatch(Level::Error, ctx, TRACE_ERROR_MESSAGE, &fields)
                }
            }
        }
    }
}

impl DbLogger for LogBridge {
    fn with_level(&self, level: Level) -> Box<dyn DbLogger> {
        Box::new(LogBridge::with_level(self, level))
    }

    fn info(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        LogBridge::info(self, ctx, args)
    }

    fn warn(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        LogBridge::warn(self, ctx, args)
    }

    fn error(&self, ctx: &Context, args: fmt::Arguments<'_>) {
        LogBridge::error(self, ctx, args)
    }

    fn trace(
        &self,
        ctx: &Context,
        begin: OffsetDateTime,
        result: TraceResult<'_>,
        err: Option<&(dyn Error + 'static)>,
    ) {
        LogBridge::trace(self, ctx, begin, result, err)
    }
}
