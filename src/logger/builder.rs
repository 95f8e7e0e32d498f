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

use jiff::tz::TimeZone;
use log::Level;
use log::LevelFilter;

use crate::append::Append;
use crate::logger::Logger;

/// A builder for configuring a [`Logger`].
///
/// # Examples
///
/// ```
/// use log::Level;
/// use log::LevelFilter;
/// use rotalog::Logger;
/// use rotalog::append::Stdout;
///
/// let logger = Logger::builder(Stdout::default())
///     .level(LevelFilter::Info)
///     .stacktrace_level(Level::Warn)
///     .build();
/// ```
#[must_use = "call `build` to construct the logger"]
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    directives: Option<String>,
    stacktrace_level: Option<Level>,
    tz: Option<TimeZone>,
    append: Box<dyn Append>,
}

impl LoggerBuilder {
    pub(crate) fn new(append: impl Append) -> Self {
        Self {
            name: String::new(),
            level: LevelFilter::Info,
            directives: None,
            stacktrace_level: None,
            tz: None,
            append: Box::new(append),
        }
    }

    /// Sets the name rendered in the `logger` field.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the minimum level of emitted records.
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Sets `RUST_LOG` style directives, e.g. `info,hyper=warn`, applied on top of the level.
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Captures a stack trace for records at or above `level`.
    pub fn stacktrace_level(mut self, level: Level) -> Self {
        self.stacktrace_level = Some(level);
        self
    }

    /// Sets the time zone of record timestamps; the system time zone otherwise.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    pub fn build(self) -> Logger {
        let mut filter = env_filter::Builder::new();
        filter.filter_level(self.level);
        if let Some(directives) = &self.directives {
            filter.parse(directives);
        }

        Logger {
            name: self.name,
            filter: filter.build(),
            append: self.append,
            stacktrace_level: self.stacktrace_level,
            tz: self.tz.unwrap_or_else(TimeZone::system),
        }
    }
}
