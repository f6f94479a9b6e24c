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

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Context;

use crate::Error;
use crate::Record;
use crate::append::Append;
use crate::layout::Layout;
use crate::layout::PlainTextLayout;

/// A builder to configure and create a [`File`] appender.
#[derive(Debug)]
pub struct FileBuilder {
    path: PathBuf,
    layout: Box<dyn Layout>,
}

impl FileBuilder {
    /// Create a new builder for the given log file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: Box::new(PlainTextLayout::default()),
        }
    }

    /// Set the layout. Default to [`PlainTextLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Build the [`File`] appender.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory or file cannot be created.
    pub fn build(self) -> Result<File, Error> {
        let open = || -> anyhow::Result<fs::File> {
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir).context("failed to create log directory")?;
            }
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.path)
                .context("failed to open log file")
        };
        let writer = open().map_err(|err| {
            Error::new("failed to create file appender")
                .with_context("path", self.path.display())
                .with_source(err)
        })?;
        Ok(File {
            layout: self.layout,
            writer: Mutex::new(writer),
        })
    }
}

/// An appender that writes log records to a single file.
///
/// Writes from concurrent threads are serialized internally. Rotation and
/// compression are out of scope; pair this with external log rotation if the
/// file must be bounded.
#[derive(Debug)]
pub struct File {
    layout: Box<dyn Layout>,
    writer: Mutex<fs::File>,
}

impl Append for File {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&bytes)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    use super::*;
    use crate::record::Level;

    #[test]
    fn writes_lines_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = FileBuilder::new(&path).build().unwrap();

        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        let record = Record::builder()
            .logger("app")
            .level(Level::Info)
            .payload(token.clone())
            .build();
        file.append(&record).unwrap();
        file.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(&token));
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let file = FileBuilder::new(&path).build().unwrap();
        drop(file);
        assert!(path.exists());
    }
}
