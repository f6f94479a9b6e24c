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

//! Appenders: destinations for log records.
//!
//! The [`Append`] trait is the raw destination contract. An [`Appender`]
//! wraps one destination with a name, a filter chain, an optional threshold,
//! and a [`Trap`](crate::Trap), and is what loggers attach.

use std::fmt;

use crate::Error;
use crate::Record;

mod appender;
mod file;
mod routing;
mod stdio;
mod testing;

pub use self::appender::Appender;
pub use self::appender::AppenderBuilder;
pub use self::file::File;
pub use self::file::FileBuilder;
pub use self::routing::AppenderFactory;
pub use self::routing::Routing;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;
pub use self::testing::Testing;

/// A destination that can process log records.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Dispatch a log record to the append target.
    ///
    /// A single instance may be invoked concurrently from multiple threads;
    /// implementations with non-thread-safe I/O must serialize internally.
    fn append(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Release any resources held by the target.
    ///
    /// Default to a no-op.
    fn close(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
