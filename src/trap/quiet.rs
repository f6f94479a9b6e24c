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

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::trap::StderrTrap;
use crate::trap::Trap;

/// A trap that forwards at most a fixed number of errors, then goes silent.
///
/// A broken appender on a hot path would otherwise flood the diagnostic
/// channel with one report per event.
///
/// # Examples
///
/// ```
/// use logtree::trap::QuietTrap;
/// use logtree::trap::StderrTrap;
///
/// let trap = QuietTrap::new(StderrTrap::default(), 3);
/// ```
#[derive(Debug)]
pub struct QuietTrap<T> {
    inner: T,
    remaining: AtomicUsize,
}

impl Default for QuietTrap<StderrTrap> {
    /// A stderr trap reporting the first error only.
    fn default() -> Self {
        QuietTrap::new(StderrTrap::default(), 1)
    }
}

impl<T: Trap> QuietTrap<T> {
    /// Create a trap that forwards the first `limit` errors to `inner`.
    pub fn new(inner: T, limit: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(limit),
        }
    }
}

impl<T: Trap> Trap for QuietTrap<T> {
    fn trap(&self, err: &Error) {
        let mut remaining = self.remaining.load(Ordering::Relaxed);
        loop {
            if remaining == 0 {
                return;
            }
            match self.remaining.compare_exchange_weak(
                remaining,
                remaining - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => remaining = observed,
            }
        }
        self.inner.trap(err);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default, Clone)]
    struct Counting(Arc<Mutex<Vec<String>>>);

    impl Trap for Counting {
        fn trap(&self, err: &Error) {
            self.0.lock().unwrap().push(err.to_string());
        }
    }

    #[test]
    fn stops_after_limit() {
        let seen = Counting::default();
        let trap = QuietTrap::new(seen.clone(), 2);
        for _ in 0..5 {
            trap.trap(&Error::new("boom"));
        }
        assert_eq!(seen.0.lock().unwrap().len(), 2);
    }
}
