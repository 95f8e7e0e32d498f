// Copyright 2024 FastLabs Developers
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

use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::append::Append;
use crate::append::rolling_file::RollingFileWriter;
use crate::layout::Layout;
use crate::record::Entry;

/// An appender that writes log entries to a [`RollingFileWriter`].
///
/// Writes and flushes are serialized on the writer, so a flush never interleaves with a
/// record being written.
#[derive(Debug)]
pub struct RollingFile {
    layout: Layout,
    writer: Mutex<RollingFileWriter>,
}

impl RollingFile {
    /// Creates a new [`RollingFile`] appender.
    ///
    /// This appender by default uses [`TextLayout`](crate::layout::TextLayout) to format log
    /// entries.
    pub fn new(writer: RollingFileWriter) -> Self {
        Self {
            layout: Layout::default(),
            writer: Mutex::new(writer),
        }
    }

    /// Sets the layout used to format log entries.
    pub fn with_layout(mut self, layout: impl Into<Layout>) -> Self {
        self.layout = layout.into();
        self
    }
}

impl Append for RollingFile {
    fn append(&self, entry: &Entry) -> anyhow::Result<()> {
        let mut bytes = self.layout.format(entry)?;
        bytes.push(b'\n');
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&bytes)?;
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }
}
