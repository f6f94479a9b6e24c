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
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Error;
use crate::Record;
use crate::append::Append;
use crate::layout::Layout;
use crate::layout::PlainTextLayout;

/// An appender that captures formatted records into shared memory, so test
/// harnesses can assert on what was logged.
///
/// # Examples
///
/// ```
/// use logtree::append::Testing;
///
/// let testing = Testing::default();
/// let lines = testing.buffer();
/// // attach `testing` to an appender, log, then inspect `lines`
/// ```
#[derive(Debug)]
pub struct Testing {
    layout: Box<dyn Layout>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl Default for Testing {
    fn default() -> Self {
        Self {
            layout: Box::new(PlainTextLayout::default()),
            lines: Arc::default(),
        }
    }
}

impl Testing {
    /// Set the layout. Default to [`PlainTextLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// A handle on the capture buffer, valid after the appender is moved into
    /// the pipeline.
    pub fn buffer(&self) -> Arc<Mutex<Vec<String>>> {
        self.lines.clone()
    }
}

impl Append for Testing {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let bytes = self.layout.format(record)?;
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(String::from_utf8_lossy(&bytes).into_owned());
        Ok(())
    }
}
