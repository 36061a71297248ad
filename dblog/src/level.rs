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

//! Verbosity levels for database logging.

use std::fmt;
use std::str::FromStr;

/// Errors raised when parsing a level name strictly.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LevelError {
    /// Indicates that the given name does not match any known level.
    #[error("Unknown log level '{0}'; must be one of error, warn, info or silent")]
    Unknown(String),
}

/// Verbosity threshold for the messages emitted by the database layer.
///
/// Levels are ordered from the least verbose to the most verbose so that a message at level `L`
/// is emitted only when the configured threshold is greater than or equal to `L`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Level {
    /// Nothing is emitted.
    Silent,

    /// Only errors are emitted.
    Error,

    /// Errors and warnings are emitted, and so are statement traces.
    Warn,

    /// Everything is emitted.
    Info,
}

impl Level {
    /// Maps a level `name` to a level, falling back to `Silent` for any unknown name.
    ///
    /// Names are case-sensitive.
    pub fn parse_lossy(name: &str) -> Level {
        name.parse().unwrap_or(Level::Silent)
    }

    /// Returns the canonical name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Silent => "silent",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
        }
    }

    /// Returns true if a message at `level` passes this threshold.
    pub fn allows(self, level: Level) -> bool {
        level != Level::Silent && level <= self
    }

    /// Returns true if statement traces are emitted under this threshold.
    pub fn traces(self) -> bool {
        matches!(self, Level::Info | Level::Warn)
    }
}

impl FromStr for Level {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(Level::Silent),
            "error" => Ok(Level::Error),
            "warn" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            s => Err(LevelError::Unknown(s.to_owned())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `name` is one of the recognized level names.
pub fn is_valid_level(name: &str) -> bool {
    name.parse::<Level>().is_ok()
}
