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

//! Various appenders for log entries.

use std::fmt;

pub mod rolling_file;
mod stdio;
mod tee;

pub use self::rolling_file::RollingFile;
pub use self::stdio::Stdout;
pub use self::tee::Tee;
use crate::record::Entry;

/// A trait representing an appender that can process log entries.
///
/// Implementors of this trait can handle log entries in custom ways.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Processes a log entry.
    fn append(&self, entry: &Entry) -> anyhow::Result<()>;

    /// Flushes any buffered records.
    fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Append for Box<dyn Append> {
    fn append(&self, entry: &Entry) -> anyhow::Result<()> {
        (**self).append(entry)
    }

    fn flush(&self) -> anyhow::Result<()> {
        (**self).flush()
    }
}
