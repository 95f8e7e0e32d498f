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

use jiff::Timestamp;
use jiff::Zoned;
use jiff::tz::TimeZone;

/// Where a writer reads the time used to name and expire its backups.
#[derive(Debug, Clone, Default)]
pub(crate) enum Clock {
    #[default]
    System,
    /// A shared instant, advanced by hand.
    #[cfg(test)]
    Manual(std::sync::Arc<std::sync::Mutex<Timestamp>>),
}

impl Clock {
    pub(crate) fn now(&self, tz: &TimeZone) -> Zoned {
        let now = match self {
            Clock::System => Timestamp::now(),
            #[cfg(test)]
            Clock::Manual(now) => *now.lock().unwrap(),
        };
        now.to_zoned(tz.clone())
    }

    #[cfg(test)]
    pub(crate) fn manual(now: Timestamp) -> Clock {
        Clock::Manual(std::sync::Arc::new(std::sync::Mutex::new(now)))
    }

    #[cfg(test)]
    pub(crate) fn advance(&self, span: jiff::SignedDuration) {
        if let Clock::Manual(now) = self {
            let mut now = now.lock().unwrap();
            *now = now.checked_add(span).unwrap();
        }
    }
}
