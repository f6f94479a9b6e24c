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
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;

use crate::Hierarchy;
use crate::Record;
use crate::append::Appender;
use crate::record::Level;
use crate::record::LevelFilter;

/// A named entry point into a [`Hierarchy`].
///
/// `Logger` is a thin handle into the hierarchy's node arena; it is cheap to
/// clone and handles for the same name refer to the same node.
///
/// The per-level methods evaluate their message lazily: when the level is
/// disabled no [`Record`] is constructed and the message is never formatted.
/// A `Display` argument is only rendered after the enablement check, and
/// [`log_with`](Logger::log_with) defers arbitrary computation the same way.
#[derive(Clone)]
pub struct Logger {
    hierarchy: Arc<Hierarchy>,
    node: usize,
    name: Arc<str>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("additive", &self.additive())
            .finish()
    }
}

impl Logger {
    pub(crate) fn new(hierarchy: Arc<Hierarchy>, node: usize, name: Arc<str>) -> Logger {
        Logger {
            hierarchy,
            node,
            name,
        }
    }

    /// The logger's dotted name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The hierarchy this logger belongs to.
    pub fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.hierarchy
    }

    /// The explicit level of this logger, if one is set.
    pub fn level(&self) -> Option<LevelFilter> {
        self.hierarchy.node_level(self.node)
    }

    /// Set or clear this logger's explicit level. Clearing the root's level
    /// restores its default.
    pub fn set_level(&self, level: Option<LevelFilter>) {
        self.hierarchy.set_node_level(self.node, level);
    }

    /// The level actually enforced: the explicit level if set, else the
    /// nearest ancestor's, terminating at the root.
    pub fn effective_level(&self) -> LevelFilter {
        self.hierarchy.effective_level(self.node)
    }

    /// Whether this logger's events also propagate to ancestor appenders.
    pub fn additive(&self) -> bool {
        self.hierarchy.node_additive(self.node)
    }

    /// Set the additivity flag. Default `true`.
    pub fn set_additive(&self, additive: bool) {
        self.hierarchy.set_node_additive(self.node, additive);
    }

    /// Attach an appender to this logger. Attaching the same instance twice
    /// keeps it once.
    pub fn add_appender(&self, appender: impl Into<Arc<Appender>>) {
        self.hierarchy
            .add_node_appender(self.node, appender.into());
    }

    /// Detach an appender by name. The appender is not closed.
    pub fn remove_appender(&self, name: &str) -> Option<Arc<Appender>> {
        self.hierarchy.remove_node_appender(self.node, name)
    }

    /// The names of the appenders attached directly to this logger.
    pub fn appender_names(&self) -> Vec<String> {
        self.hierarchy.node_appender_names(self.node)
    }

    /// Whether an event of the given level would be dispatched: the hierarchy
    /// is live, its threshold admits the level, and the effective level
    /// admits it.
    pub fn enabled(&self, level: Level) -> bool {
        self.hierarchy.enabled(self.node, level)
    }

    /// Log a message at the given level. The `Display` implementation runs
    /// only if the level is enabled.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if !self.enabled(level) {
            return;
        }
        let payload = evaluate(|| message.to_string());
        self.emit(level, payload, None, None);
    }

    /// Log a lazily computed message. The closure runs only if the level is
    /// enabled; a panicking closure is contained and the event goes out with
    /// an empty payload.
    pub fn log_with(&self, level: Level, message: impl FnOnce() -> String) {
        if !self.enabled(level) {
            return;
        }
        let payload = evaluate(message);
        self.emit(level, payload, None, None);
    }

    /// Log a message together with an error's cause chain.
    pub fn log_error(&self, level: Level, message: impl fmt::Display, err: &dyn std::error::Error) {
        if !self.enabled(level) {
            return;
        }
        let payload = evaluate(|| message.to_string());
        let record = Record::builder()
            .logger(self.name.clone())
            .level(level)
            .payload(payload)
            .error(err)
            .build();
        self.dispatch(&record);
    }

    /// Log at [`Level::Trace`].
    pub fn trace(&self, message: impl fmt::Display) {
        self.log(Level::Trace, message);
    }

    /// Log at [`Level::Debug`].
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    /// Log at [`Level::Info`].
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    /// Log at [`Level::Warn`].
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    /// Log at [`Level::Error`].
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Log at [`Level::Fatal`].
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(Level::Fatal, message);
    }

    /// Construct and dispatch a record without re-checking enablement. The
    /// logging macros and the `log` bridge call this after their own check.
    #[doc(hidden)]
    pub fn emit(
        &self,
        level: Level,
        payload: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        let mut builder = Record::builder()
            .logger(self.name.clone())
            .level(level)
            .payload(payload);
        if let Some(file) = file {
            builder = builder.file(file);
        }
        if let Some(line) = line {
            builder = builder.line(line);
        }
        self.dispatch(&builder.build());
    }

    /// Walk from this logger toward the root, invoking each attached appender
    /// exactly once, stopping early where additivity is off.
    fn dispatch(&self, record: &Record) {
        let appenders = self.hierarchy.appenders_for(self.node);
        if appenders.is_empty() {
            self.hierarchy.report_unconfigured(&self.name);
            return;
        }
        for appender in &appenders {
            appender.dispatch(record);
        }
    }
}

/// Run a message thunk, containing panics: logging must never crash the
/// application it instruments.
fn evaluate(message: impl FnOnce() -> String) -> String {
    match catch_unwind(AssertUnwindSafe(message)) {
        Ok(payload) => payload,
        Err(panic) => {
            let reason = panic_message(&panic);
            let _ = std::io::Write::write_fmt(
                &mut std::io::stderr(),
                format_args!("logtree: message evaluation panicked: {reason}\n"),
            );
            String::new()
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "opaque panic payload"
    }
}
