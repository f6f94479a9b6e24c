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

use std::fmt;

use crate::Record;
use crate::filter::Filter;
use crate::filter::FilterResult;

/// A filter backed by a custom function.
///
/// The function receives the [`Record`] and returns a [`FilterResult`]. For
/// example:
///
/// ```
/// use logtree::Record;
/// use logtree::filter::CustomFilter;
/// use logtree::filter::FilterResult;
///
/// let filter = CustomFilter::new(|record: &Record| {
///     if record.mdc_value("tenant") == Some("internal") {
///         FilterResult::Deny
///     } else {
///         FilterResult::Neutral
///     }
/// });
/// ```
pub struct CustomFilter {
    f: Box<dyn Fn(&Record) -> FilterResult + Send + Sync + 'static>,
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomFilter {{ ... }}")
    }
}

impl CustomFilter {
    /// Create a new `CustomFilter` from the given function.
    pub fn new(filter: impl Fn(&Record) -> FilterResult + Send + Sync + 'static) -> Self {
        CustomFilter {
            f: Box::new(filter),
        }
    }
}

impl Filter for CustomFilter {
    fn decide(&self, record: &Record) -> FilterResult {
        (self.f)(record)
    }
}
