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

use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::anyhow;

use crate::append::Append;
use crate::record::Entry;

/// An appender that forwards every entry to each of its appenders, in order.
///
/// A failing appender does not stop the others from receiving the entry; the failures are
/// reported together once all appenders have been tried.
///
/// # Examples
///
/// ```
/// use rotalog::append::Stdout;
/// use rotalog::append::Tee;
///
/// let tee = Tee::default().append(Stdout::default()).append(Stdout::default());
/// assert_eq!(tee.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Tee {
    appends: Vec<Box<dyn Append>>,
    // every appender sees concurrent entries in the same order
    order: Mutex<()>,
}

impl Tee {
    /// Adds an appender behind the ones already present.
    #[must_use]
    pub fn append(mut self, append: impl Append) -> Self {
        self.appends.push(Box::new(append));
        self
    }

    pub fn len(&self) -> usize {
        self.appends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appends.is_empty()
    }

    fn for_each(
        &self,
        what: &str,
        f: impl Fn(&dyn Append) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        let _order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        let errors = self
            .appends
            .iter()
            .filter_map(|append| f(append.as_ref()).err())
            .map(|err| err.to_string())
            .collect::<Vec<_>>();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} of {} appenders failed to {what}: {}",
                errors.len(),
                self.appends.len(),
                errors.join("; ")
            ))
        }
    }
}

impl Append for Tee {
    fn append(&self, entry: &Entry) -> anyhow::Result<()> {
        self.for_each("append", |append| append.append(entry))
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.for_each("flush", |append| append.flush())
    }
}
