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

use std::fmt::Write;

use crate::layout::Layout;
use crate::layout::format_time;
use crate::layout::kv::KvDisplay;
use crate::record::Entry;

/// A layout that formats log entries as tab separated text.
///
/// Output format:
///
/// ```text
/// 2024-08-11T22:44:57.172+0800	info	server/main.rs:53	listening	port=8080
/// 2024-08-11T22:44:57.172+0800	warn	api	server/conn.rs:12	slow request	elapsed=1.5
/// <stack trace of the warn record>
/// ```
///
/// The logger name column is only present for named loggers. Fields follow the message as
/// `key=value` pairs, and records at or above the stack trace level are followed by the
/// captured stack trace on the next lines.
#[derive(Default, Debug, Clone)]
pub struct TextLayout {}

impl TextLayout {
    pub(crate) fn format(&self, entry: &Entry) -> anyhow::Result<Vec<u8>> {
        let mut line = String::new();

        let time = format_time(entry.time());
        let level = entry.level_name();
        write!(line, "{time}\t{level}")?;
        if !entry.logger().is_empty() {
            write!(line, "\t{}", entry.logger())?;
        }
        if let Some(caller) = entry.caller() {
            write!(line, "\t{caller}")?;
        }
        let message = entry.message();
        let kvs = KvDisplay::new(entry.key_values());
        write!(line, "\t{message}{kvs}")?;
        if let Some(stacktrace) = entry.stacktrace() {
            write!(line, "\n{}", stacktrace.trim_end())?;
        }

        Ok(line.into_bytes())
    }
}

impl From<TextLayout> for Layout {
    fn from(layout: TextLayout) -> Self {
        Layout::Text(layout)
    }
}
