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

//! Per-thread diagnostic context: a mapped context (MDC) and a nested context
//! stack (NDC).
//!
//! Both are snapshotted into every [`Record`](crate::Record) at construction
//! time, so appenders always observe the context as it was at the moment of
//! the log call.

use std::cell::RefCell;
use std::collections::BTreeMap;

thread_local! {
    static MDC: RefCell<BTreeMap<String, String>> = const { RefCell::new(BTreeMap::new()) };
    static NDC: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// The mapped diagnostic context: thread-local key-value pairs stamped onto
/// every record emitted by this thread.
///
/// # Examples
///
/// ```
/// use logtree::diagnostic::Mdc;
///
/// Mdc::insert("request_id", "42");
/// assert_eq!(Mdc::get("request_id").as_deref(), Some("42"));
/// Mdc::remove("request_id");
/// ```
#[derive(Default, Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Mdc {}

impl Mdc {
    /// Inserts a key-value pair into the current thread's context.
    pub fn insert(key: impl Into<String>, value: impl Into<String>) {
        MDC.with(|map| {
            map.borrow_mut().insert(key.into(), value.into());
        });
    }

    /// Removes a key from the current thread's context.
    pub fn remove(key: &str) {
        MDC.with(|map| {
            map.borrow_mut().remove(key);
        });
    }

    /// Looks up a value in the current thread's context.
    pub fn get(key: &str) -> Option<String> {
        MDC.with(|map| map.borrow().get(key).cloned())
    }

    /// Clears the current thread's context.
    pub fn clear() {
        MDC.with(|map| map.borrow_mut().clear());
    }

    /// Copies the current thread's context.
    pub fn snapshot() -> BTreeMap<String, String> {
        MDC.with(|map| map.borrow().clone())
    }
}

/// The nested diagnostic context: a thread-local stack of strings, typically
/// pushed on entry to a unit of work and popped on exit.
///
/// [`Ndc::push`] returns a guard that pops on drop, so a context entry cannot
/// outlive its scope on early return or panic.
///
/// # Examples
///
/// ```
/// use logtree::diagnostic::Ndc;
///
/// {
///     let _ctx = Ndc::push("request 42");
///     assert_eq!(Ndc::depth(), 1);
/// }
/// assert_eq!(Ndc::depth(), 0);
/// ```
#[derive(Default, Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Ndc {}

impl Ndc {
    /// Pushes a context entry, returning a guard that pops it on drop.
    #[must_use = "the entry is popped when the returned guard drops"]
    pub fn push(entry: impl Into<String>) -> NdcGuard {
        NDC.with(|stack| stack.borrow_mut().push(entry.into()));
        NdcGuard { _private: () }
    }

    /// Pops the most recent entry, if any.
    pub fn pop() -> Option<String> {
        NDC.with(|stack| stack.borrow_mut().pop())
    }

    /// The current stack depth.
    pub fn depth() -> usize {
        NDC.with(|stack| stack.borrow().len())
    }

    /// Clears the current thread's stack.
    pub fn clear() {
        NDC.with(|stack| stack.borrow_mut().clear());
    }

    /// Copies the current thread's stack, outermost first.
    pub fn snapshot() -> Vec<String> {
        NDC.with(|stack| stack.borrow().clone())
    }
}

/// Guard returned by [`Ndc::push`]; pops the pushed entry on drop.
#[derive(Debug)]
pub struct NdcGuard {
    _private: (),
}

impl Drop for NdcGuard {
    fn drop(&mut self) {
        Ndc::pop();
    }
}
