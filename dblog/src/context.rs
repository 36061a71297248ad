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

//! Execution context propagated alongside log messages.

use crate::fields::{Field, FieldValue};
use std::sync::Arc;

/// Execution context of a caller, such as the identifier of the request being served.
///
/// Contexts are immutable: adding a field yields a new context and leaves the original intact, so
/// a single context can be shared by any number of concurrent operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    /// Fields carried by this context, in insertion order.
    fields: Arc<[Field]>,
}

impl Context {
    /// Returns an empty context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a copy of this context with an extra field named `key` set to `value`.
    pub fn with_field<V: Into<FieldValue>>(&self, key: &'static str, value: V) -> Self {
        let mut fields = self.fields.to_vec();
        fields.push(Field::new(key, value));
        Self { fields: fields.into() }
    }

    /// Returns the fields carried by this context.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}
