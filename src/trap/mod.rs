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

//! Traps receive the errors the logging pipeline swallows.
//!
//! Nothing on a log-call path propagates errors back into application code;
//! every failure is delivered to the owning appender's trap instead.

use std::fmt;

use crate::Error;

mod default;
mod quiet;

pub use self::default::StderrTrap;
pub use self::quiet::QuietTrap;

/// A sink for errors raised while dispatching log records.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Receive an error.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
