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

//! Configuration of the dated log files and their rotation schedule.

use std::path::PathBuf;
use std::time::Duration;

use jiff::Zoned;
use jiff::fmt::strtime;
use jiff::tz::TimeZone;
use log::LevelFilter;

use crate::Error;

/// How records are encoded into lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Tab separated text, see [`TextLayout`](crate::layout::TextLayout).
    #[default]
    Console,
    /// One JSON object per line, see [`JsonLayout`](crate::layout::JsonLayout).
    #[cfg(feature = "layout-json")]
    Json,
}

/// Everything needed to build a logger and schedule its rotation.
///
/// The file name is a [strftime] template formatted against the build time, so
/// `app_%Y-%m-%d.log` produces one file per calendar day. The retention fields follow the
/// convention that `0` means unbounded.
///
/// Nothing is checked on construction; [`RotationManager`](crate::RotationManager) calls
/// [`Config::validate`] before starting.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rotalog::Config;
///
/// let config = Config {
///     directory: "logs".into(),
///     console: true,
///     rotation_interval: Duration::from_secs(3600),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
///
/// [strftime]: jiff::fmt::strtime
#[derive(Debug, Clone)]
pub struct Config {
    /// File name template, formatted with strftime tokens.
    pub file_name: String,
    /// Directory the log files are written to.
    pub directory: PathBuf,
    /// Size in megabytes after which the active file is moved to a backup.
    pub max_size: u64,
    /// Number of backups kept per log file.
    pub max_backups: usize,
    /// Age in days after which backups are removed.
    pub max_age: u32,
    /// Whether backups are gzipped.
    pub compress: bool,
    /// Whether records are mirrored to stdout.
    pub console: bool,
    /// Time between two rotations; rotations land on multiples of it.
    pub rotation_interval: Duration,
    /// Minimum level of emitted records.
    pub level: LevelFilter,
    /// Optional `RUST_LOG` style directives refining `level` per target.
    pub directives: Option<String>,
    /// Line encoding.
    pub encoding: Encoding,
    /// Time zone of file names, timestamps and rotation boundaries.
    pub timezone: TimeZone,
    /// Rendered in the `logger` field when non-empty.
    pub name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_name: "app_%Y-%m-%d.log".to_string(),
            directory: PathBuf::from("./log"),
            max_size: 100,
            max_backups: 10,
            max_age: 7,
            compress: true,
            console: false,
            rotation_interval: Duration::from_secs(24 * 60 * 60),
            level: LevelFilter::Info,
            directives: None,
            encoding: Encoding::default(),
            timezone: TimeZone::system(),
            name: String::new(),
        }
    }
}

impl Config {
    /// Reads filter directives from the environment variable `name`, e.g. `RUST_LOG`.
    ///
    /// The directives are left untouched if the variable is not set.
    #[must_use]
    pub fn env_directives(mut self, name: &str) -> Self {
        if let Ok(directives) = std::env::var(name) {
            self.directives = Some(directives);
        }
        self
    }

    /// Checks the values that would otherwise only fail once the manager is running.
    pub fn validate(&self) -> Result<(), Error> {
        if self.rotation_interval.is_zero() {
            return Err(Error::Config(
                "rotation interval must be greater than zero".to_string(),
            ));
        }
        if self.file_name.is_empty() {
            return Err(Error::Config("file name must not be empty".to_string()));
        }
        self.file_path(&Zoned::now())?;
        if self.directory.exists() && !self.directory.is_dir() {
            return Err(Error::Config(format!(
                "log directory {} is not a directory",
                self.directory.display()
            )));
        }
        Ok(())
    }

    /// Formats the file name template against `now`, in the configured time zone.
    pub fn file_path(&self, now: &Zoned) -> Result<PathBuf, Error> {
        let now = now.with_time_zone(self.timezone.clone());
        let name = strtime::format(&self.file_name, &now).map_err(|err| {
            Error::Config(format!("invalid file name template {:?}: {err}", self.file_name))
        })?;
        Ok(self.directory.join(name))
    }

    pub(crate) fn max_size_bytes(&self) -> u64 {
        self.max_size.saturating_mul(1024 * 1024)
    }
}
