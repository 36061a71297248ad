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

//! Utilities to configure database logging from environment variables.

use crate::bridge::LogBridge;
use crate::level::{Level, is_valid_level};
use crate::logger::LeveledLogger;
use std::env;
use std::sync::Arc;

/// Result type for environment errors.
type Result<T> = std::result::Result<T, String>;

/// Wrapper around an environment variable's value to support conversions to other types.
pub struct Value(String);

impl TryFrom<Value> for String {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        Ok(value.0)
    }
}

/// Reads the variable `name` and converts it to `T`, returning `None` if it is not set.
fn get_var<T: TryFrom<Value, Error = String>>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => match Value(value).try_into() {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(format!("Invalid type in environment variable {}: {}", name, e)),
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    }
}

/// Gets an optional environment variable whose name is `<prefix>_<suffix>` with a conversion to
/// a target type `T`.
pub fn get_optional_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<Option<T>> {
    get_var(&format!("{}_{}", prefix, suffix))
}

/// Configuration for database logging.
#[derive(Clone, Debug, PartialEq)]
pub struct LogConfig {
    /// Verbosity threshold for the bridge.
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::Silent }
    }
}

impl LogConfig {
    /// Creates a new configuration from environment variables whose names start with `prefix`.
    ///
    /// The level is read from `<prefix>_LOG_LEVEL` and defaults to `silent` when unset.  Unlike
    /// the bridge, which silences itself on unknown names, this rejects them so that typos in the
    /// deployment configuration are noticed early.
    pub fn from_env(prefix: &str) -> Result<Self> {
        match get_optional_var::<String>(prefix, "LOG_LEVEL")? {
            Some(name) if is_valid_level(&name) => Ok(Self { level: Level::parse_lossy(&name) }),
            Some(name) => Err(format!(
                "Invalid log level '{}' in {}_LOG_LEVEL; must be one of error, warn, info or silent",
                name, prefix
            )),
            None => Ok(Self::default()),
        }
    }

    /// Creates a bridge around `underlying` that honors this configuration.
    pub fn bridge(&self, underlying: Arc<dyn LeveledLogger>) -> LogBridge {
        LogBridge::new(underlying, self.level.as_str())
    }
}
