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

//! Logging bridge between applications and the database layer.
//!
//! Applications built on III-IV usually own a minimal logger that knows how to emit a message at
//! a given severity along with some structured fields.  The database layer, on the other hand,
//! wants a richer contract: it needs to filter messages by a verbosity level, to attach the
//! execution context of the caller, and to emit one trace line per executed statement.  This
//! crate provides the `bridge::LogBridge` type to adapt the former into the latter.
//!
//! The crate is organized as follows:
//!
//! 1.  `level`: The verbosity levels understood by the database layer.
//!
//! 1.  `fields` and `context`: The structured data that travels with every message.
//!
//! 1.  `logger`: The capabilities that an application logger must (and may) provide, plus a
//!     default implementation backed by the `log` facade.
//!
//! 1.  `bridge`: The adapter itself.
//!
//! 1.  `db`: The logging contract consumed by the database layer and a SQLite access layer that
//!     traces every statement through it.
//!
//! 1.  `env`: Helpers to configure the bridge from environment variables.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod bridge;
pub mod clocks;
pub mod context;
pub mod db;
pub mod env;
pub mod fields;
pub mod level;
pub mod logger;
