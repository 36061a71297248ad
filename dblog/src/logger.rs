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

//! Capabilities that application loggers provide to the bridge.
//!
//! Every logger must implement `LeveledLogger`.  Loggers that know how to make use of the
//! caller's execution context can additionally implement `ContextLogger` and advertise it via
//! `LeveledLogger::as_context_logger`, which the bridge queries on every call.

use crate::context::Context;
use crate::fields::{Field, display_fields};
use std::fmt;

/// Minimal logging capability that every application logger provides.
pub trait LeveledLogger: Send + Sync {
    /// Emits `message` with `fields` at the info level.
    fn info(&self, message: &str, fields: &[Field]);

    /// Emits `message` with `fields` at the warning level.
    fn warn(&self, message: &str, fields: &[Field]);

    /// Emits `message` with `fields` at the error level.
    fn error(&self, message: &str, fields: &[Field]);

    /// Returns this logger as a context-aware logger if it supports that extension.
    fn as_context_logger(&self) -> Option<&dyn ContextLogger> {
        None
    }
}

/// Optional extension for loggers that consume the caller's execution context.
pub trait ContextLogger: Send + Sync {
    /// Emits `message` with `fields` at the info level on behalf of `ctx`.
    fn info_ctx(&self, ctx: &Context, message: &str, fields: &[Field]);

    /// Emits `message` with `fields` at the warning level on behalf of `ctx`.
    fn warn_ctx(&self, ctx: &Context, message: &str, fields: &[Field]);

    /// Emits `message` with `fields` at the error level on behalf of `ctx`.
    fn error_ctx(&self, ctx: &Context, message: &str, fields: &[Field]);
}

/// Default log target used by `StdLogger`.
pub const DEFAULT_TARGET: &str = "sql";

/// Logger that forwards all messages to the `log` facade.
#[derive(Clone)]
pub struct StdLogger {
    /// Target to attach to every record.
    target: String,

    /// Backend that receives the records.  `None` means the globally-installed logger, resolved
    /// on every call so that loggers installed after construction are honored.
    backend: Option<&'static dyn log::Log>,
}

impl fmt::Debug for StdLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdLogger").field("target", &self.target).finish_non_exhaustive()
    }
}

impl Default for StdLogger {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl StdLogger {
    /// Creates a new logger that emits records under `target`.
    pub fn new<S: Into<String>>(target: S) -> Self {
        Self { target: target.into(), backend: None }
    }

    /// Sends records to `backend` instead of the globally-installed logger.
    pub fn with_backend(self, backend: &'static dyn log::Log) -> Self {
        Self { backend: Some(backend), ..self }
    }

    /// Sends `message` and `fields` to the backend at `level`.
    fn emit(&self, level: log::Level, message: &str, fields: &[Field]) {
        let backend = match self.backend {
            Some(backend) => backend,
            None if level <= log::max_level() => log::logger(),
            None => return,
        };

        let metadata = log::Metadata::builder().level(level).target(&self.target).build();
        if backend.enabled(&metadata) {
            let line = format_line(message, fields);
            backend.log(
                &log::Record::builder().metadata(metadata).args(format_args!("{}", line)).build(),
            );
        }
    }
}

/// Returns the fields to log for a message issued on behalf of `ctx`: the call `fields` first,
/// followed by those carried by the context.
pub(crate) fn with_context_fields(ctx: &Context, fields: &[Field]) -> Vec<Field> {
    [fields, ctx.fields()].concat()
}

/// Formats a log line out of a `message` and its `fields`.
pub(crate) fn format_line(message: &str, fields: &[Field]) -> String {
    if fields.is_empty() {
        message.to_owned()
    } else {
        format!("{} {}", message, display_fields(fields))
    }
}

impl LeveledLogger for StdLogger {
    fn info(&self, message: &str, fields: &[Field]) {
        self.emit(log::Level::Info, message, fields)
    }

    fn warn(&self, message: &str, fields: &[Field]) {
        self.emit(log::Level::Warn, message, fields)
    }

    fn error(&self, message: &str, fields: &[Field]) {
        self.emit(log::Level::Error, message, fields)
    }

    fn as_context_logger(&self) -> Option<&dyn ContextLogger> {
        Some(self)
    }
}

impl ContextLogger for StdLogger {
    fn info_ctx(&self, ctx: &Context, message: &str, fields: &[Field]) {
        self.emit(log::Level::Info, message, &with_context_fields(ctx, fields))
    }

    fn warn_ctx(&self, ctx: &Context, message: &str, fields: &[Field]) {
        self.emit(log::Level::Warn, message, &with_context_fields(ctx, fields))
    }

    fn error_ctx(&self, ctx: &Context, message: &str, fields: &[Field]) {
        self.emit(log::Level::Error, message, &with_context_fields(ctx, fields))
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use crate::level::Level;
    use std::sync::Mutex;

    /// A message captured by `RecordingLogger`.
    #[derive(Clone, Debug, PartialEq)]
    pub struct Record {
        /// Severity of the message.
        pub level: Level,

        /// Text of the message.
        pub message: String,

        /// Fields attached to the message.
        pub fields: Vec<Field>,

        /// Context received with the message, if it went through the context extension.
        pub ctx: Option<Context>,
    }

    impl Record {
        /// Returns the value of the field named `key`, if present.
        pub fn field(&self, key: &str) -> Option<&crate::fields::FieldValue> {
            self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
        }
    }

    /// A logger that keeps every message in memory for later inspection.
    #[derive(Debug, Default)]
    pub struct RecordingLogger {
        /// Whether this logger advertises the context extension.
        context_aware: bool,

        /// Messages captured so far.
        records: Mutex<Vec<Record>>,
    }

    impl RecordingLogger {
        /// Creates a logger that only implements the minimal capability.
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a logger that also implements the context extension.
        pub fn with_context() -> Self {
            Self { context_aware: true, ..Default::default() }
        }

        /// Returns and clears the messages captured so far.
        pub fn take(&self) -> Vec<Record> {
            let mut records = self.records.lock().unwrap();
            std::mem::take(&mut *records)
        }

        /// Captures a message.
        fn push(&self, level: Level, ctx: Option<&Context>, message: &str, fields: &[Field]) {
            let record = Record {
                level,
                message: message.to_owned(),
                fields: fields.to_vec(),
                ctx: ctx.cloned(),
            };
            self.records.lock().unwrap().push(record);
        }
    }

    impl LeveledLogger for RecordingLogger {
        fn info(&self, message: &str, fields: &[Field]) {
            self.push(Level::Info, None, message, fields)
        }

        fn warn(&self, message: &str, fields: &[Field]) {
            self.push(Level::Warn, None, message, fields)
        }

        fn error(&self, message: &str, fields: &[Field]) {
            self.push(Level::Error, None, message, fields)
        }

        fn as_context_logger(&self) -> Option<&dyn ContextLogger> {
            if self.context_aware { Some(self) } else { None }
        }
    }

    impl ContextLogger for RecordingLogger {
        fn info_ctx(&self, ctx: &Context, message: &str, fields: &[Field]) {
            self.push(Level::Info, Some(ctx), message, fields)
        }

        fn warn_ctx(&self, ctx: &Context, message: &str, fields: &[Field]) {
            self.push(Level::Warn, Some(ctx), message, fields)
        }

        fn error_ctx(&self, ctx: &Context, message: &str, fields: &[Field]) {
            self.push(Level::Error, Some(ctx), message, fields)
        }
    }
}
