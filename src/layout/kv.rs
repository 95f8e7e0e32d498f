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

use std::time::Duration;

use log::kv::ToValue;
use log::kv::Value;

/// A duration field rendered as fractional seconds.
///
/// ```
/// use std::time::Duration;
///
/// use rotalog::layout::Seconds;
///
/// log::info!(elapsed = Seconds(Duration::from_millis(1500)); "request served");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seconds(pub Duration);

impl ToValue for Seconds {
    fn to_value(&self) -> Value<'_> {
        Value::from(self.0.as_secs_f64())
    }
}

pub(crate) struct KvDisplay<'kvs> {
    kv: &'kvs dyn log::kv::Source,
}

impl<'kvs> KvDisplay<'kvs> {
    pub(crate) fn new(kv: &'kvs dyn log::kv::Source) -> Self {
        Self { kv }
    }
}

impl std::fmt::Display for KvDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut visitor = KvWriter {
            writer: f,
            first: true,
        };
        self.kv.visit(&mut visitor).ok();
        Ok(())
    }
}

struct KvWriter<'a, 'b> {
    writer: &'b mut std::fmt::Formatter<'a>,
    first: bool,
}

impl<'kvs> log::kv::VisitSource<'kvs> for KvWriter<'_, '_> {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        let sep = if self.first { "\t" } else { " " };
        self.first = false;
        write!(self.writer, "{sep}{key}={value}")?;
        Ok(())
    }
}
