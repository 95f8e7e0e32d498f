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

use std::fmt::Arguments;

use jiff::Zoned;
use log::Level;
use log::Record;

/// A log record enriched with what the logger captured when it accepted it.
///
/// Every appender of one logger sees the same entry, so a record mirrored to several sinks
/// carries the same timestamp and stack trace in each of them.
#[derive(Debug)]
pub struct Entry<'a> {
    record: &'a Record<'a>,
    time: Zoned,
    logger: &'a str,
    stacktrace: Option<String>,
}

impl<'a> Entry<'a> {
    pub(crate) fn new(
        record: &'a Record<'a>,
        time: Zoned,
        logger: &'a str,
        stacktrace: Option<String>,
    ) -> Self {
        Self {
            record,
            time,
            logger,
            stacktrace,
        }
    }

    /// The underlying `log` record.
    pub fn record(&self) -> &Record<'a> {
        self.record
    }

    /// When the logger accepted the record.
    pub fn time(&self) -> &Zoned {
        &self.time
    }

    pub fn level(&self) -> Level {
        self.record.level()
    }

    /// Lowercase level name.
    pub fn level_name(&self) -> &'static str {
        match self.record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Name of the logger that accepted the record; empty if unnamed.
    pub fn logger(&self) -> &str {
        self.logger
    }

    /// The call site as `dir/file.rs:line`, keeping only the last directory of the path.
    pub fn caller(&self) -> Option<String> {
        let file = self.record.file()?;
        let line = self.record.line().unwrap_or_default();
        let file = file.replace('\\', "/");
        let short = match file.rfind('/') {
            Some(last) => match file[..last].rfind('/') {
                Some(prev) => &file[prev + 1..],
                None => file.as_str(),
            },
            None => file.as_str(),
        };
        Some(format!("{short}:{line}"))
    }

    pub fn message(&self) -> &Arguments<'a> {
        self.record.args()
    }

    pub fn key_values(&self) -> &dyn log::kv::Source {
        self.record.key_values()
    }

    /// The stack trace captured for records at or above the logger's stack trace level.
    pub fn stacktrace(&self) -> Option<&str> {
        self.stacktrace.as_deref()
    }
}
