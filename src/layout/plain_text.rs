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

use std::fmt::Write;

use crate::Error;
use crate::Record;
use crate::layout::Layout;

/// A layout that formats log records as plain text.
///
/// Output format:
///
/// ```text
/// 2025-08-07T09:14:05.123Z  WARN [main] app.server: connection dropped
/// ```
///
/// The diagnostic context, call site, and error chain are appended when
/// present. For full control over the line format use
/// [`PatternLayout`](crate::layout::PatternLayout).
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct PlainTextLayout {}

impl Layout for PlainTextLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut text = String::new();

        let timestamp = record.timestamp();
        let level = record.level();
        let thread = record.thread();
        let logger = record.logger();
        let payload = record.payload();
        write!(text, "{timestamp} {level:>5} [{thread}] {logger}: {payload}")?;

        for (key, value) in record.mdc() {
            write!(text, " {key}={value}")?;
        }
        if let (Some(file), Some(line)) = (record.file(), record.line()) {
            write!(text, " ({file}:{line})")?;
        }
        for (depth, cause) in record.error_chain().iter().enumerate() {
            if depth == 0 {
                write!(text, "\n  error: {cause}")?;
            } else {
                write!(text, "\n  caused by: {cause}")?;
            }
        }

        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn renders_core_fields() {
        let record = Record::builder()
            .logger("app.server")
            .level(Level::Warn)
            .payload("connection dropped")
            .thread("main")
            .mdc(Default::default())
            .ndc(Default::default())
            .build();
        let text = String::from_utf8(PlainTextLayout::default().format(&record).unwrap()).unwrap();
        assert!(text.contains(" WARN [main] app.server: connection dropped"));
    }
}
