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

use crate::Record;
use crate::filter::Filter;
use crate::filter::FilterResult;

/// A filter that matches records by logger-name subtree.
///
/// A record matches when its logger name equals the configured name or lives
/// below it in the dotted hierarchy. Matching records yield the configured
/// result (default [`Accept`](FilterResult::Accept)); everything else is
/// [`Neutral`](FilterResult::Neutral).
///
/// # Examples
///
/// ```
/// use logtree::filter::FilterResult;
/// use logtree::filter::NameFilter;
///
/// // deny everything under "app.noisy"
/// let filter = NameFilter::new("app.noisy").on_match(FilterResult::Deny);
/// ```
#[derive(Debug)]
pub struct NameFilter {
    name: String,
    on_match: FilterResult,
}

impl NameFilter {
    /// Create a filter matching the given logger subtree.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_match: FilterResult::Accept,
        }
    }

    /// Set the result returned for matching records.
    pub fn on_match(mut self, result: FilterResult) -> Self {
        self.on_match = result;
        self
    }

    fn matches(&self, logger: &str) -> bool {
        logger == self.name
            || (logger.len() > self.name.len()
                && logger.starts_with(&self.name)
                && logger.as_bytes()[self.name.len()] == b'.')
    }
}

impl Filter for NameFilter {
    fn decide(&self, record: &Record) -> FilterResult {
        if self.matches(record.logger()) {
            self.on_match
        } else {
            FilterResult::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn matches_subtree_not_prefix() {
        let filter = NameFilter::new("app.db").on_match(FilterResult::Deny);
        let decide = |name: &str| {
            let record = Record::builder().logger(name).build();
            filter.decide(&record)
        };
        assert_eq!(decide("app.db"), FilterResult::Deny);
        assert_eq!(decide("app.db.pool"), FilterResult::Deny);
        assert_eq!(decide("app.dbx"), FilterResult::Neutral);
        assert_eq!(decide("app"), FilterResult::Neutral);
    }
}
