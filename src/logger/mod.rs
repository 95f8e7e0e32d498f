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

//! The logger handle: a filter, an appender and what is captured per record.

use std::backtrace::Backtrace;
use std::io::Write;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use log::Level;
use log::Metadata;
use log::Record;

pub use self::builder::LoggerBuilder;
use crate::append::Append;
use crate::record::Entry;

mod builder;

/// A structured logger bound to one appender.
///
/// A logger is built once and never reconfigured; rotation replaces the whole logger.
/// It implements [`log::Log`], so it can also be used directly.
#[derive(Debug)]
pub struct Logger {
    name: String,
    filter: env_filter::Filter,
    append: Box<dyn Append>,
    stacktrace_level: Option<Level>,
    tz: TimeZone,
}

impl Logger {
    /// Creates a [`LoggerBuilder`] writing to `append`.
    pub fn builder(append: impl Append) -> LoggerBuilder {
        LoggerBuilder::new(append)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a record with this metadata would be emitted.
    pub fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    /// Emits `record` if it passes the filter.
    ///
    /// Failures are reported on stderr and never reach the caller.
    pub fn log(&self, record: &Record) {
        if !self.filter.matches(record) {
            return;
        }

        let stacktrace = self
            .stacktrace_level
            .filter(|level| record.level() <= *level)
            .map(|_| Backtrace::force_capture().to_string());
        let time = Timestamp::now().to_zoned(self.tz.clone());
        let entry = Entry::new(record, time, &self.name, stacktrace);

        if let Err(err) = self.append.append(&entry) {
            handle_error(record, err);
        }
    }

    /// Flushes the appender.
    pub fn flush(&self) -> anyhow::Result<()> {
        self.append.flush()
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        Logger::enabled(self, metadata)
    }

    fn log(&self, record: &Record) {
        Logger::log(self, record);
    }

    fn flush(&self) {
        if let Err(err) = Logger::flush(self) {
            let _ = writeln!(std::io::stderr(), "failed to flush logger: {err}");
        }
    }
}

fn handle_error(record: &Record, error: anyhow::Error) {
    let _ = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error}
"###,
        args = record.args(),
        record = record,
        error = error,
    );
}
