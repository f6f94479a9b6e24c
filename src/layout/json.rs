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

use serde::Serialize;

use crate::Error;
use crate::Record;
use crate::layout::Layout;

/// A layout that formats log records as one JSON object per line.
///
/// Output format:
///
/// ```text
/// {"timestamp":"2025-08-07T09:14:05.123Z","level":"INFO","logger":"app","thread":"main","message":"started","sequence":7}
/// ```
///
/// Empty context fields are omitted.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct JsonLayout {}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    level: &'a str,
    logger: &'a str,
    thread: &'a str,
    message: &'a str,
    sequence: u64,
    #[serde(skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    mdc: &'a std::collections::BTreeMap<String, String>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    ndc: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    error: &'a [String],
}

impl Layout for JsonLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let json = JsonRecord {
            timestamp: record.timestamp().to_string(),
            level: record.level().as_str(),
            logger: record.logger(),
            thread: record.thread(),
            message: record.payload(),
            sequence: record.sequence(),
            mdc: record.mdc(),
            ndc: record.ndc(),
            file: record.file(),
            line: record.line(),
            error: record.error_chain(),
        };
        serde_json::to_vec(&json)
            .map_err(|err| Error::new("failed to serialize log record").with_source(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn renders_json_object() {
        let record = Record::builder()
            .logger("app")
            .level(Level::Info)
            .payload("started")
            .mdc(Default::default())
            .ndc(Default::default())
            .build();
        let bytes = JsonLayout::default().format(&record).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["logger"], "app");
        assert_eq!(value["message"], "started");
        assert!(value.get("mdc").is_none());
    }
}
