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

use crate::Hierarchy;
use crate::record::Level;

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// An adapter that routes [`log`] records into a [`Hierarchy`] by target
/// name.
///
/// # Examples
///
/// ```no_run
/// use logtree::bridge::LogBridge;
///
/// LogBridge::new(logtree::hierarchy())
///     .install(log::LevelFilter::Trace)
///     .unwrap();
///
/// log::info!("routed through the hierarchy");
/// ```
#[derive(Debug)]
pub struct LogBridge {
    hierarchy: Arc<Hierarchy>,
}

impl LogBridge {
    /// Create a bridge over the given hierarchy.
    pub fn new(hierarchy: Arc<Hierarchy>) -> LogBridge {
        LogBridge { hierarchy }
    }

    /// Install this bridge as the global [`log`] logger.
    ///
    /// `max_level` is handed to [`log::set_max_level`]; per-logger levels
    /// still apply underneath it.
    ///
    /// # Errors
    ///
    /// Returns an error if a global logger has already been set.
    pub fn install(self, max_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.hierarchy
            .get_logger(metadata.target())
            .enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let logger = self.hierarchy.get_logger(record.target());
        let level = Level::from(record.level());
        if !logger.enabled(level) {
            return;
        }
        logger.emit(
            level,
            record.args().to_string(),
            record.file_static(),
            record.line(),
        );
    }

    fn flush(&self) {
        self.hierarchy.flush();
    }
}
