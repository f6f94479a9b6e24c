// Copyright 2025 Logtree Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Filters for log records.

use std::fmt;

use crate::Record;
use crate::record::LevelFilter;

mod custom;
mod name;

pub use self::custom::CustomFilter;
pub use self::name::NameFilter;

/// The result of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// The record will be processed without further filtering.
    Accept,
    /// The record should not be processed.
    Deny,
    /// No decision could be made, further filtering should occur.
    Neutral,
}

/// A predicate applied to log records before an appender writes them.
///
/// Filters are evaluated in order: the first [`Deny`](FilterResult::Deny)
/// aborts, the first [`Accept`](FilterResult::Accept) short-circuits to
/// output, and a chain exhausted with only
/// [`Neutral`](FilterResult::Neutral) answers is treated as accepted.
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Decide the fate of a log record.
    fn decide(&self, record: &Record) -> FilterResult;
}

impl<T: Filter> From<T> for Box<dyn Filter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

impl Filter for LevelFilter {
    fn decide(&self, record: &Record) -> FilterResult {
        if self.enables(record.level()) {
            FilterResult::Neutral
        } else {
            FilterResult::Deny
        }
    }
}
