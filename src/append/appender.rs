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

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::Record;
use crate::append::Append;
use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::LevelFilter;
use crate::trap::StderrTrap;
use crate::trap::Trap;

/// A named dispatch unit: one destination plus its filter chain, threshold,
/// and error trap.
///
/// The same `Appender` instance may be attached to any number of loggers;
/// within one event walk it runs at most once. [`dispatch`](Appender::dispatch)
/// never returns or raises an error; failures go to the appender's trap.
///
/// # Examples
///
/// ```
/// use logtree::Appender;
/// use logtree::LevelFilter;
/// use logtree::append::Stderr;
///
/// let appender = Appender::builder("alerts")
///     .threshold(LevelFilter::Error)
///     .target(Stderr::default())
///     .build();
/// ```
#[derive(Debug)]
pub struct Appender {
    name: String,
    filters: Vec<Box<dyn Filter>>,
    threshold: Option<LevelFilter>,
    target: Box<dyn Append>,
    trap: Box<dyn Trap>,
    closed: AtomicBool,
    closed_reported: AtomicBool,
}

impl Appender {
    /// Create a new builder for an appender with the given name.
    pub fn builder(name: impl Into<String>) -> AppenderBuilder<false> {
        AppenderBuilder {
            name: name.into(),
            filters: vec![],
            threshold: None,
            target: None,
            trap: Box::new(StderrTrap::default()),
        }
    }

    /// The appender's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`close`](Appender::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run one record through the filter chain, the threshold, and the
    /// destination. Infallible: every error is delivered to the trap.
    pub fn dispatch(&self, record: &Record) {
        if self.is_closed() {
            if !self.closed_reported.swap(true, Ordering::Relaxed) {
                self.trap.trap(
                    &Error::new("append to a closed appender").with_context("appender", &self.name),
                );
            }
            return;
        }

        // an explicit Accept skips the threshold as well
        let mut accepted = false;
        for filter in &self.filters {
            match filter.decide(record) {
                FilterResult::Deny => return,
                FilterResult::Accept => {
                    accepted = true;
                    break;
                }
                FilterResult::Neutral => {}
            }
        }

        if !accepted {
            if let Some(threshold) = self.threshold {
                if !threshold.enables(record.level()) {
                    return;
                }
            }
        }

        if let Err(err) = self.target.append(record) {
            self.trap
                .trap(&err.with_context("appender", &self.name));
        }
    }

    /// Flush the destination. Errors go to the trap.
    pub fn flush(&self) {
        if let Err(err) = self.target.flush() {
            self.trap.trap(&err.with_context("appender", &self.name));
        }
    }

    /// Close the destination and mark the appender closed. Idempotent;
    /// errors go to the trap.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(err) = self.target.close() {
            self.trap.trap(&err.with_context("appender", &self.name));
        }
    }
}

/// A builder for [`Appender`]. A target must be set before `build` is
/// available.
#[derive(Debug)]
pub struct AppenderBuilder<const TARGET: bool> {
    name: String,
    filters: Vec<Box<dyn Filter>>,
    threshold: Option<LevelFilter>,
    target: Option<Box<dyn Append>>,
    trap: Box<dyn Trap>,
}

impl<const TARGET: bool> AppenderBuilder<TARGET> {
    /// Add a filter to the appender's chain. Filters run in insertion order.
    pub fn filter(mut self, filter: impl Into<Box<dyn Filter>>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Set the severity floor. Records below it are denied after the filter
    /// chain runs.
    pub fn threshold(mut self, threshold: LevelFilter) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Replace the error trap. Default to [`StderrTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Set the destination.
    pub fn target(self, target: impl Into<Box<dyn Append>>) -> AppenderBuilder<true> {
        AppenderBuilder {
            name: self.name,
            filters: self.filters,
            threshold: self.threshold,
            target: Some(target.into()),
            trap: self.trap,
        }
    }
}

impl AppenderBuilder<true> {
    /// Build the [`Appender`].
    pub fn build(self) -> Arc<Appender> {
        let target = self.target.expect("target is set by the typestate");
        Arc::new(Appender {
            name: self.name,
            filters: self.filters,
            threshold: self.threshold,
            target,
            trap: self.trap,
            closed: AtomicBool::new(false),
            closed_reported: AtomicBool::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::append::Testing;
    use crate::record::Level;

    #[derive(Debug, Default)]
    struct Failing;

    impl Append for Failing {
        fn append(&self, _record: &Record) -> Result<(), Error> {
            Err(Error::new("target broken"))
        }
    }

    #[derive(Debug, Default, Clone)]
    struct CollectingTrap(std::sync::Arc<Mutex<Vec<String>>>);

    impl Trap for CollectingTrap {
        fn trap(&self, err: &Error) {
            self.0.lock().unwrap().push(err.to_string());
        }
    }

    fn record(level: Level) -> Record {
        Record::builder()
            .logger("test")
            .level(level)
            .payload("x")
            .build()
    }

    #[test]
    fn threshold_denies_below_floor() {
        let testing = Testing::default();
        let lines = testing.buffer();
        let appender = Appender::builder("t")
            .threshold(LevelFilter::Warn)
            .target(testing)
            .build();

        appender.dispatch(&record(Level::Info));
        appender.dispatch(&record(Level::Error));
        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn accept_short_circuits_past_threshold() {
        let testing = Testing::default();
        let lines = testing.buffer();
        let appender = Appender::builder("t")
            .filter(crate::filter::CustomFilter::new(|_| FilterResult::Accept))
            .threshold(LevelFilter::Off)
            .target(testing)
            .build();

        appender.dispatch(&record(Level::Debug));
        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn neutral_chain_defaults_to_accept() {
        let testing = Testing::default();
        let lines = testing.buffer();
        let appender = Appender::builder("t")
            .filter(crate::filter::CustomFilter::new(|_| FilterResult::Neutral))
            .filter(crate::filter::CustomFilter::new(|_| FilterResult::Neutral))
            .target(testing)
            .build();

        appender.dispatch(&record(Level::Debug));
        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn closed_appender_is_silent_and_reports_once() {
        let trap = CollectingTrap::default();
        let appender = Appender::builder("t")
            .trap(trap.clone())
            .target(Testing::default())
            .build();
        appender.close();
        appender.close();
        appender.dispatch(&record(Level::Info));
        appender.dispatch(&record(Level::Info));
        assert_eq!(trap.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn target_errors_reach_the_trap_not_the_caller() {
        let trap = CollectingTrap::default();
        let appender = Appender::builder("t")
            .trap(trap.clone())
            .target(Failing)
            .build();
        appender.dispatch(&record(Level::Info));
        appender.dispatch(&record(Level::Info));
        assert_eq!(trap.0.lock().unwrap().len(), 2);
    }
}
