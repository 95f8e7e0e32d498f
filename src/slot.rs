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

//! The single-value register holding the installed logger.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::sync::LazyLock;

use arc_swap::ArcSwapOption;
use log::Level;
use log::Record;

use crate::Logger;

/// A shared register holding the currently installed [`Logger`].
///
/// Loads are lock-free and never block on a rotation. A caller that loaded a logger keeps it
/// alive until it is done with it, even if a rotation installs a new one in the meantime.
///
/// Clones share the same register.
#[derive(Debug, Clone, Default)]
pub struct LoggerSlot(Arc<ArcSwapOption<Logger>>);

static GLOBAL: LazyLock<LoggerSlot> = LazyLock::new(LoggerSlot::new);

/// The process-wide slot read by the [`log` bridge](crate::bridge).
pub fn global() -> &'static LoggerSlot {
    &GLOBAL
}

impl LoggerSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the installed logger, if any.
    pub fn load(&self) -> Option<Arc<Logger>> {
        self.0.load_full()
    }

    /// Runs `f` against the installed logger without bumping its reference count.
    pub fn with<R>(&self, f: impl FnOnce(&Logger) -> R) -> Option<R> {
        let guard = self.0.load();
        guard.as_deref().map(f)
    }

    /// Logs `args` at error level, flushes the installed logger and panics with the same
    /// message.
    #[track_caller]
    pub fn panic(&self, args: fmt::Arguments) -> ! {
        let message = args.to_string();
        self.log_and_flush(Location::caller(), &message);
        panic!("{message}")
    }

    /// Logs `args` at error level, flushes the installed logger and exits the process with
    /// status 1.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments) -> ! {
        self.log_and_flush(Location::caller(), &args.to_string());
        std::process::exit(1)
    }

    fn log_and_flush(&self, location: &'static Location<'static>, message: &str) {
        self.with(|logger| {
            logger.log(
                &Record::builder()
                    .level(Level::Error)
                    .file_static(Some(location.file()))
                    .line(Some(location.line()))
                    .args(format_args!("{message}"))
                    .build(),
            );
            if let Err(err) = logger.flush() {
                eprintln!("failed to flush logger: {err}");
            }
        });
    }

    /// Installs `logger`, returning the one it replaces.
    pub(crate) fn install(&self, logger: Arc<Logger>) -> Option<Arc<Logger>> {
        self.0.swap(Some(logger))
    }
}
