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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use jiff::Timestamp;
use log::Level;
use log::Record;

use super::schedule;
use crate::Config;
use crate::Error;
use crate::Logger;
use crate::factory::Factory;
use crate::factory::StandardFactory;
use crate::slot;
use crate::slot::LoggerSlot;

/// Lifecycle of a [`RotationManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The schedule is active and rotations replace the logger.
    Running,
    /// The schedule has terminated and the final logger has been flushed.
    Stopped,
}

/// Owns the installed logger and replaces it with a freshly built one on every rotation.
///
/// Rotations land on multiples of [`Config::rotation_interval`], see
/// [`next_rotation`](super::next_rotation). A rotation builds the new logger, installs it in
/// the slot, and only then flushes the previous one, so a record emitted concurrently reaches
/// either logger but never a discarded one.
///
/// If a scheduled rotation fails to build its logger, the current logger stays installed,
/// the failure is logged through it, and the next attempt happens at the next boundary.
///
/// Dropping a running manager stops it.
///
/// # Examples
///
/// ```
/// use rotalog::Config;
/// use rotalog::RotationManager;
/// use rotalog::slot::LoggerSlot;
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = Config {
///     directory: dir.path().to_path_buf(),
///     ..Config::default()
/// };
///
/// let slot = LoggerSlot::new();
/// let manager = RotationManager::builder(config)
///     .slot(slot.clone())
///     .start()
///     .unwrap();
///
/// slot.with(|logger| {
///     logger.log(&log::Record::builder().args(format_args!("hello")).build())
/// });
/// manager.stop().unwrap();
/// ```
#[derive(Debug)]
pub struct RotationManager {
    inner: Arc<Inner>,
    schedule: Mutex<Option<Schedule>>,
}

pub(super) struct Inner {
    config: Config,
    factory: Box<dyn Factory>,
    slot: LoggerSlot,
    state: Mutex<State>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("config", &self.config)
            .field("slot", &self.slot)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct State {
    current: Arc<Logger>,
    status: Status,
}

#[derive(Debug)]
struct Schedule {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// A builder for configuring and starting a [`RotationManager`].
#[must_use = "call `start` to build the first logger and start the schedule"]
pub struct RotationManagerBuilder {
    config: Config,
    factory: Box<dyn Factory>,
    slot: LoggerSlot,
}

impl std::fmt::Debug for RotationManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationManagerBuilder")
            .field("config", &self.config)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl RotationManagerBuilder {
    /// Builds loggers with `factory` instead of [`StandardFactory`].
    pub fn factory(mut self, factory: impl Factory) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Installs loggers in `slot` instead of [`slot::global`].
    pub fn slot(mut self, slot: LoggerSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Validates the configuration, installs the first logger and starts the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration, [`Error::SinkCreation`] if the
    /// first logger cannot be built, and [`Error::Spawn`] if the schedule thread cannot be
    /// started. Nothing is installed on error.
    pub fn start(self) -> Result<RotationManager, Error> {
        let Self {
            config,
            factory,
            slot,
        } = self;

        config.validate()?;
        let now = Timestamp::now().to_zoned(config.timezone.clone());
        let current = Arc::new(factory.build(&config, &now)?);

        let inner = Arc::new(Inner {
            config,
            factory,
            slot,
            state: Mutex::new(State {
                current,
                status: Status::Running,
            }),
        });

        // hold the state lock so no rotation runs before the first logger is installed
        let state = inner.lock_state();
        let (shutdown, signal) = crossbeam_channel::bounded(0);
        let handle = schedule::spawn(inner.clone(), signal).map_err(Error::Spawn)?;
        inner.slot.install(state.current.clone());
        drop(state);

        Ok(RotationManager {
            inner,
            schedule: Mutex::new(Some(Schedule { shutdown, handle })),
        })
    }
}

impl RotationManager {
    /// Creates a [`RotationManagerBuilder`] for `config`.
    pub fn builder(config: Config) -> RotationManagerBuilder {
        RotationManagerBuilder {
            config,
            factory: Box::new(StandardFactory),
            slot: slot::global().clone(),
        }
    }

    /// Starts a manager installing its loggers in [`slot::global`].
    ///
    /// See [`RotationManagerBuilder::start`] for the errors.
    pub fn start(config: Config) -> Result<RotationManager, Error> {
        RotationManager::builder(config).start()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The slot the loggers are installed in.
    pub fn slot(&self) -> &LoggerSlot {
        &self.inner.slot
    }

    /// The logger currently owned by the manager.
    pub fn logger(&self) -> Arc<Logger> {
        self.inner.lock_state().current.clone()
    }

    pub fn status(&self) -> Status {
        self.inner.lock_state().status
    }

    /// Rotates right away, without waiting for the next boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] after [`RotationManager::stop`], or the factory's error; the
    /// current logger stays installed in the latter case.
    pub fn rotate(&self) -> Result<(), Error> {
        self.inner.rotate_at(Timestamp::now())
    }

    /// Terminates the schedule and flushes the final logger.
    ///
    /// The schedule is woken up immediately rather than at the next boundary. A rotation in
    /// progress completes first. The final logger remains installed, so late records still
    /// reach a valid sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStopped`] if the manager was stopped before; nothing is flushed
    /// in that case.
    pub fn stop(&self) -> Result<(), Error> {
        {
            let mut state = self.inner.lock_state();
            if state.status == Status::Stopped {
                return Err(Error::AlreadyStopped);
            }
            state.status = Status::Stopped;
        }

        let schedule = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Schedule { shutdown, handle }) = schedule {
            drop(shutdown);
            if handle.join().is_err() {
                eprintln!("rotation scheduler thread panicked");
            }
        }

        let state = self.inner.lock_state();
        if let Err(err) = state.current.flush() {
            eprintln!("failed to flush the final logger: {err}");
        }
        Ok(())
    }
}

impl Drop for RotationManager {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl Inner {
    pub(super) fn config(&self) -> &Config {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swaps in a logger built as of `at`.
    pub(super) fn rotate_at(&self, at: Timestamp) -> Result<(), Error> {
        let previous = {
            let mut state = self.lock_state();
            if state.status == Status::Stopped {
                return Err(Error::Stopped);
            }

            let at = at.to_zoned(self.config.timezone.clone());
            let logger = Arc::new(self.factory.build(&self.config, &at)?);
            self.slot.install(logger.clone());
            std::mem::replace(&mut state.current, logger)
        };

        // unreachable as current from here on; emitters still holding it finish first
        if let Err(err) = previous.flush() {
            eprintln!("failed to flush the rotated logger: {err}");
        }
        Ok(())
    }

    pub(super) fn report_failure(&self, err: &Error) {
        let current = self.lock_state().current.clone();
        current.log(
            &Record::builder()
                .level(Level::Error)
                .target("rotalog::rotate")
                .module_path_static(Some(module_path!()))
                .file_static(Some(file!()))
                .line(Some(line!()))
                .args(format_args!(
                    "failed to rotate log file, keeping the current one until the next boundary: {err}"
                ))
                .build(),
        );
    }
}
