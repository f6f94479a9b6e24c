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

//! Log record, severity levels, and level filters.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use jiff::Timestamp;

use crate::Error;
use crate::diagnostic::Mdc;
use crate::diagnostic::Ndc;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// An enum representing the available verbosity levels of a log event.
///
/// Levels are totally ordered by severity: `Trace < Debug < Info < Warn <
/// Error < Fatal`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Designates very low priority, often extremely verbose, information.
    Trace,
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warn,
    /// Designates serious errors.
    Error,
    /// Designates critical errors after which the application likely cannot
    /// continue.
    Fatal,
}

impl Level {
    /// All levels, in ascending severity order.
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for level in Level::ALL {
            if s.eq_ignore_ascii_case(level.as_str()) {
                return Ok(level);
            }
        }
        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

/// A severity floor with `All` and `Off` sentinels.
///
/// Logger levels, effective levels, the hierarchy-wide threshold, and
/// per-appender thresholds are all `LevelFilter`s. The check is a single
/// integer comparison.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum LevelFilter {
    /// Enables all levels.
    All,
    /// Enables `Trace` and above.
    Trace,
    /// Enables `Debug` and above.
    Debug,
    /// Enables `Info` and above.
    Info,
    /// Enables `Warn` and above.
    Warn,
    /// Enables `Error` and above.
    Error,
    /// Enables `Fatal` only.
    Fatal,
    /// Disables all levels.
    Off,
}

impl LevelFilter {
    /// Check whether an event of the given level passes this floor.
    ///
    /// # Examples
    ///
    /// ```
    /// use logtree::Level;
    /// use logtree::LevelFilter;
    ///
    /// assert!(LevelFilter::Warn.enables(Level::Error));
    /// assert!(!LevelFilter::Warn.enables(Level::Info));
    /// assert!(!LevelFilter::Off.enables(Level::Fatal));
    /// assert!(LevelFilter::All.enables(Level::Trace));
    /// ```
    pub fn enables(self, level: Level) -> bool {
        level as u8 + 1 >= self as u8
    }

    /// Return the string representation of the `LevelFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelFilter::All => "ALL",
            LevelFilter::Trace => "TRACE",
            LevelFilter::Debug => "DEBUG",
            LevelFilter::Info => "INFO",
            LevelFilter::Warn => "WARN",
            LevelFilter::Error => "ERROR",
            LevelFilter::Fatal => "FATAL",
            LevelFilter::Off => "OFF",
        }
    }

    pub(crate) fn from_u8(value: u8) -> LevelFilter {
        match value {
            0 => LevelFilter::All,
            1 => LevelFilter::Trace,
            2 => LevelFilter::Debug,
            3 => LevelFilter::Info,
            4 => LevelFilter::Warn,
            5 => LevelFilter::Error,
            6 => LevelFilter::Fatal,
            _ => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LevelFilter::Trace,
            Level::Debug => LevelFilter::Debug,
            Level::Info => LevelFilter::Info,
            Level::Warn => LevelFilter::Warn,
            Level::Error => LevelFilter::Error,
            Level::Fatal => LevelFilter::Fatal,
        }
    }
}

impl FromStr for LevelFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<LevelFilter, Self::Err> {
        if s.eq_ignore_ascii_case("ALL") {
            return Ok(LevelFilter::All);
        }
        if s.eq_ignore_ascii_case("OFF") {
            return Ok(LevelFilter::Off);
        }
        Level::from_str(s).map(LevelFilter::from)
    }
}

/// The payload of a log event.
///
/// A `Record` is constructed once per accepted log call and is immutable
/// afterwards. The diagnostic context is snapshotted (copied) at construction
/// time, so later mutation of the calling thread's MDC/NDC does not race with
/// appenders holding the record.
#[derive(Clone, Debug)]
pub struct Record {
    logger: Arc<str>,
    level: Level,
    timestamp: Timestamp,
    thread: String,
    payload: String,
    error_chain: Vec<String>,
    mdc: BTreeMap<String, String>,
    ndc: Vec<String>,
    sequence: u64,
    file: Option<Cow<'static, str>>,
    line: Option<u32>,
}

impl Record {
    /// Returns a new builder.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The name of the logger this record was emitted through.
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// The verbosity level of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The observed time.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The name of the emitting thread.
    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// The message body.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The captured error cause chain, outermost first. Empty when the record
    /// carries no error.
    pub fn error_chain(&self) -> &[String] {
        &self.error_chain
    }

    /// The mapped diagnostic context snapshot.
    pub fn mdc(&self) -> &BTreeMap<String, String> {
        &self.mdc
    }

    /// Look up a single mapped diagnostic context value.
    pub fn mdc_value(&self, key: &str) -> Option<&str> {
        self.mdc.get(key).map(String::as_str)
    }

    /// The nested diagnostic context snapshot, outermost first.
    pub fn ndc(&self) -> &[String] {
        &self.ndc
    }

    /// The process-wide monotonically increasing sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The source file of the log call, if captured.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The source line of the log call, if captured.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

/// Builder for [`Record`].
///
/// Fields left unset are captured from the environment on
/// [`build`](RecordBuilder::build): current time, current thread, the calling
/// thread's MDC/NDC snapshot, and the next sequence number.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    logger: Option<Arc<str>>,
    level: Option<Level>,
    timestamp: Option<Timestamp>,
    thread: Option<String>,
    payload: String,
    error_chain: Vec<String>,
    mdc: Option<BTreeMap<String, String>>,
    ndc: Option<Vec<String>>,
    file: Option<Cow<'static, str>>,
    line: Option<u32>,
}

impl RecordBuilder {
    /// Set the logger name.
    pub fn logger(mut self, logger: impl Into<Arc<str>>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    /// Set the level. Defaults to [`Level::Info`].
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Override the observed time. Defaults to now.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Override the thread name. Defaults to the current thread.
    pub fn thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = Some(thread.into());
        self
    }

    /// Set the message body.
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Capture an error's cause chain by walking
    /// [`source`](std::error::Error::source) links.
    pub fn error(mut self, err: &dyn std::error::Error) -> Self {
        let mut chain = vec![err.to_string()];
        let mut cursor = err.source();
        while let Some(cause) = cursor {
            chain.push(cause.to_string());
            cursor = cause.source();
        }
        self.error_chain = chain;
        self
    }

    /// Set a pre-rendered error cause chain, outermost first.
    pub fn error_chain(mut self, chain: Vec<String>) -> Self {
        self.error_chain = chain;
        self
    }

    /// Override the mapped diagnostic context snapshot.
    pub fn mdc(mut self, mdc: BTreeMap<String, String>) -> Self {
        self.mdc = Some(mdc);
        self
    }

    /// Override the nested diagnostic context snapshot.
    pub fn ndc(mut self, ndc: Vec<String>) -> Self {
        self.ndc = Some(ndc);
        self
    }

    /// Set the source file of the log call.
    pub fn file(mut self, file: impl Into<Cow<'static, str>>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the source line of the log call.
    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Invoke the builder and return a `Record`.
    pub fn build(self) -> Record {
        Record {
            logger: self.logger.unwrap_or_else(|| Arc::from("")),
            level: self.level.unwrap_or(Level::Info),
            timestamp: self.timestamp.unwrap_or_else(Timestamp::now),
            thread: self.thread.unwrap_or_else(current_thread_name),
            payload: self.payload,
            error_chain: self.error_chain,
            mdc: self.mdc.unwrap_or_else(Mdc::snapshot),
            ndc: self.ndc.unwrap_or_else(Ndc::snapshot),
            sequence: SEQUENCE.fetch_add(1, Ordering::Relaxed),
            file: self.file,
            line: self.line,
        }
    }
}

fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering_is_total_and_ascending() {
        for window in Level::ALL.windows(2) {
            assert!(window[0] < window[1]);
        }
        assert!(Level::Fatal >= Level::Trace);
    }

    #[test]
    fn filter_enables_consistent_with_ordering() {
        for level in Level::ALL {
            assert!(LevelFilter::All.enables(level));
            assert!(!LevelFilter::Off.enables(level));
            for floor in Level::ALL {
                assert_eq!(LevelFilter::from(floor).enables(level), level >= floor);
            }
        }
    }

    #[test]
    fn filter_round_trips_through_u8() {
        for filter in [
            LevelFilter::All,
            LevelFilter::Trace,
            LevelFilter::Debug,
            LevelFilter::Info,
            LevelFilter::Warn,
            LevelFilter::Error,
            LevelFilter::Fatal,
            LevelFilter::Off,
        ] {
            assert_eq!(LevelFilter::from_u8(filter as u8), filter);
        }
    }

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("FATAL".parse::<Level>().unwrap(), Level::Fatal);
        assert_eq!("off".parse::<LevelFilter>().unwrap(), LevelFilter::Off);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn sequence_numbers_increase() {
        let first = Record::builder().payload("a").build();
        let second = Record::builder().payload("b").build();
        assert!(second.sequence() > first.sequence());
    }

    #[test]
    fn error_chain_walks_sources() {
        let inner = std::io::Error::other("disk gone");
        let outer = Error::new("write failed").with_source(inner);
        let record = Record::builder().error(&outer).build();
        assert_eq!(record.error_chain().len(), 2);
        assert!(record.error_chain()[1].contains("disk gone"));
    }
}
