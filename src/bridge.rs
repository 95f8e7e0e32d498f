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

//! Forwarding the `log` crate macros to the logger in the global slot, plus logging
//! variants of `panic!` and `process::exit`.

use crate::slot;

struct LogCrateLogger(());

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        slot::global()
            .with(|logger| logger.enabled(metadata))
            .unwrap_or(false)
    }

    fn log(&self, record: &log::Record) {
        slot::global().with(|logger| logger.log(record));
    }

    fn flush(&self) {
        slot::global().with(|logger| log::Log::flush(logger));
    }
}

/// Sets up the `log` crate global logger to forward to [`slot::global`].
///
/// Records emitted while no logger is installed are dropped. The slot is read on every
/// call, so a rotation takes effect for the next record without reinstalling anything.
///
/// # Errors
///
/// Returns an error if the `log` crate global logger has already been set.
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    static LOGGER: LogCrateLogger = LogCrateLogger(());
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Sets up the `log` crate global logger to forward to [`slot::global`].
///
/// # Panics
///
/// Panics if the `log` crate global logger has already been set.
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "rotalog::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}

/// Logs `args` at error level through [`slot::global`], flushes it and panics.
///
/// ```should_panic
/// rotalog::bridge::panic(format_args!("invariant broken: {}", 42));
/// ```
#[track_caller]
pub fn panic(args: std::fmt::Arguments) -> ! {
    slot::global().panic(args)
}

/// Logs `args` at error level through [`slot::global`], flushes it and exits the process
/// with status 1.
#[track_caller]
pub fn fatal(args: std::fmt::Arguments) -> ! {
    slot::global().fatal(args)
}
