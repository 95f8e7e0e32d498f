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

//! Layouts for encoding log entries into lines.
//!
//! Both layouts use the same fixed key set: `time`, `level`, `logger`, `caller`, `msg` and
//! `stacktrace`.

#[cfg(feature = "layout-json")]
pub use json::JsonLayout;
pub use kv::Seconds;
pub use text::TextLayout;

use jiff::Zoned;
use jiff::tz::Offset;

use crate::record::Entry;

#[cfg(feature = "layout-json")]
mod json;
mod kv;
mod text;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%3f";

/// ISO-8601 with milliseconds and the UTC offset, `Z` for UTC.
pub(crate) fn format_time(time: &Zoned) -> String {
    let local = time.strftime(TIME_FORMAT);
    if time.offset() == Offset::UTC {
        format!("{local}Z")
    } else {
        format!("{local}{}", time.strftime("%z"))
    }
}

/// Represents a layout for formatting log entries.
#[derive(Debug, Clone)]
pub enum Layout {
    Text(TextLayout),
    #[cfg(feature = "layout-json")]
    Json(JsonLayout),
}

impl Layout {
    /// Encodes `entry` into a single record, without the trailing line ending.
    pub fn format(&self, entry: &Entry) -> anyhow::Result<Vec<u8>> {
        match self {
            Layout::Text(layout) => layout.format(entry),
            #[cfg(feature = "layout-json")]
            Layout::Json(layout) => layout.format(entry),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Text(TextLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_format_time() {
        let utc = Zoned::from_str("2024-08-11T22:44:57.172105+00:00[UTC]").unwrap();
        assert_eq!(format_time(&utc), "2024-08-11T22:44:57.172Z");

        let east = Zoned::from_str("2024-08-11T22:44:57.172105+08:00[+08:00]").unwrap();
        assert_eq!(format_time(&east), "2024-08-11T22:44:57.172+0800");

        let west = Zoned::from_str("2024-08-11T17:14:57-05:30[-05:30]").unwrap();
        assert_eq!(format_time(&west), "2024-08-11T17:14:57.000-0530");
    }
}
