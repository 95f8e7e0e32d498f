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

use crate::append::Append;
use crate::layout::Layout;
use crate::record::Entry;

/// An appender that prints log entries to stdout.
#[derive(Debug, Default)]
pub struct Stdout {
    layout: Layout,
}

impl Stdout {
    /// Sets the layout used to format log entries.
    pub fn with_layout(mut self, layout: impl Into<Layout>) -> Self {
        self.layout = layout.into();
        self
    }
}

impl Append for Stdout {
    fn append(&self, entry: &Entry) -> anyhow::Result<()> {
        let mut bytes = self.layout.format(entry)?;
        bytes.push(b'\n');
        std::io::stdout().lock().write_all(&bytes)?;
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }
}
