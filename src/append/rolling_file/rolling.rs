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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use flate2::Compression;
use flate2::write::GzEncoder;
use jiff::SignedDuration;
use jiff::Timestamp;
use jiff::Zoned;
use jiff::tz::TimeZone;

use crate::append::rolling_file::clock::Clock;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S.%3f";
const BACKUP_TIME_PARSE_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";
const COMPRESS_SUFFIX: &str = ".gz";
const MILL_THREAD_NAME: &str = "rotalog-backup-mill";

/// A file writer that moves its file aside once it grows past a size limit.
///
/// A backup is named after the active file with the rollover time inserted before the
/// extension, so `app.log` rolls over into `app-2024-08-10T17-12-52.123.log`. After every
/// rollover, backups past the age limit or beyond the backup count are removed, oldest
/// first, and the remaining ones are gzipped if compression is on.
///
/// Every write goes straight to the file. Backup cleanup runs on a background thread, so a
/// rollover never waits for compression; dropping the writer waits for pending cleanup.
#[derive(Debug)]
pub struct RollingFileWriter {
    state: State,
    writer: File,
    mill: Option<Mill>,
}

impl RollingFileWriter {
    /// Creates a new [`RollingFileWriterBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rotalog::append::rolling_file::RollingFileWriter;
    ///
    /// let builder = RollingFileWriter::builder();
    /// ```
    #[must_use]
    pub fn builder() -> RollingFileWriterBuilder {
        RollingFileWriterBuilder::new()
    }

    /// Path of the active file.
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    fn rollover(&mut self) {
        let now = self.state.clock.now(&self.state.retention.tz);
        match self.state.move_to_backup(&now) {
            Ok(file) => {
                self.writer = file;
                self.state.current_size = 0;
                self.clean_backups(now);
            }
            Err(err) => eprintln!(
                "failed to roll over log file {}: {err}",
                self.state.path.display()
            ),
        }
    }

    fn clean_backups(&mut self, now: Zoned) {
        let retention = &self.state.retention;
        if !retention.is_bounded() {
            return;
        }

        if self.mill.is_none() {
            match Mill::spawn(retention.clone()) {
                Ok(mill) => self.mill = Some(mill),
                Err(err) => eprintln!("failed to spawn backup cleanup thread: {err}"),
            }
        }

        match &self.mill {
            Some(mill) => mill.submit(now),
            None => retention.clean_or_report(&now),
        }
    }

    /// Blocks until the cleanups submitted so far are done.
    #[cfg(test)]
    fn wait_for_cleanup(&mut self) {
        self.mill = None;
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.state.should_rollover(buf.len()) {
            self.rollover();
        }

        self.writer
            .write(buf)
            .inspect(|&n| self.state.current_size += n as u64)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A builder for configuring [`RollingFileWriter`].
///
/// Every limit defaults to `0`, meaning unbounded.
#[derive(Debug)]
pub struct RollingFileWriterBuilder {
    max_size: u64,
    max_backups: usize,
    max_age: u32,
    compress: bool,
    tz: TimeZone,
    clock: Clock,
}

impl Default for RollingFileWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingFileWriterBuilder {
    /// Creates a new [`RollingFileWriterBuilder`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_size: 0,
            max_backups: 0,
            max_age: 0,
            compress: false,
            tz: TimeZone::system(),
            clock: Clock::default(),
        }
    }

    /// Sets the size in bytes after which the file is moved to a backup.
    #[must_use]
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    /// Sets the number of backups to keep.
    #[must_use]
    pub fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    /// Sets the number of days a backup is kept.
    #[must_use]
    pub fn max_age(mut self, days: u32) -> Self {
        self.max_age = days;
        self
    }

    /// Sets whether backups are gzipped.
    #[must_use]
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Sets the time zone of the time embedded in backup names.
    #[must_use]
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = tz;
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Opens the file at `path` in append mode, creating missing parent directories.
    pub fn build(self, path: impl Into<PathBuf>) -> io::Result<RollingFileWriter> {
        let Self {
            max_size,
            max_backups,
            max_age,
            compress,
            tz,
            clock,
        } = self;

        let path = path.into();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("log file path {} has no file name", path.display()),
                )
            })?;
        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (name[..dot].to_string(), name[dot..].to_string()),
            _ => (name.to_string(), String::new()),
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let file = open_file(&path)?;
        let current_size = file.metadata()?.len();
        let state = State {
            path,
            max_size,
            current_size,
            clock,
            retention: Retention {
                dir,
                stem,
                ext,
                max_backups,
                max_age,
                compress,
                tz,
            },
        };
        Ok(RollingFileWriter {
            state,
            writer: file,
            mill: None,
        })
    }
}

fn open_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().append(true).create(true).open(path)
}

/// Runs backup cleanups one after another, off the write path.
#[derive(Debug)]
struct Mill {
    sender: Option<Sender<Zoned>>,
    handle: Option<JoinHandle<()>>,
}

impl Mill {
    fn spawn(retention: Retention) -> io::Result<Mill> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Zoned>();
        let handle = std::thread::Builder::new()
            .name(MILL_THREAD_NAME.to_string())
            .spawn(move || {
                for now in receiver {
                    retention.clean_or_report(&now);
                }
            })?;

        Ok(Mill {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    fn submit(&self, now: Zoned) {
        if let Some(sender) = &self.sender {
            if sender.send(now).is_err() {
                eprintln!("backup cleanup thread is gone, backups are left as they are");
            }
        }
    }
}

impl Drop for Mill {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                eprintln!("backup cleanup thread panicked");
            }
        }
    }
}

#[derive(Debug)]
struct Backup {
    path: PathBuf,
    name: String,
    time: Timestamp,
    compressed: bool,
}

#[derive(Debug)]
struct State {
    path: PathBuf,
    max_size: u64,
    current_size: u64,
    clock: Clock,
    retention: Retention,
}

impl State {
    fn should_rollover(&self, incoming: usize) -> bool {
        self.max_size > 0
            && self.current_size > 0
            && self.current_size.saturating_add(incoming as u64) > self.max_size
    }

    fn move_to_backup(&self, now: &Zoned) -> io::Result<File> {
        let backup = self.retention.backup_path(now);
        fs::rename(&self.path, backup)?;
        open_file(&self.path)
    }
}

/// Where the backups of one file live and how long they are kept.
#[derive(Debug, Clone)]
struct Retention {
    dir: PathBuf,
    stem: String,
    ext: String,
    max_backups: usize,
    max_age: u32,
    compress: bool,
    tz: TimeZone,
}

impl Retention {
    fn is_bounded(&self) -> bool {
        self.max_backups > 0 || self.max_age > 0 || self.compress
    }

    fn backup_path(&self, now: &Zoned) -> PathBuf {
        let stamp = now.strftime(BACKUP_TIME_FORMAT).to_string();
        let taken = |path: &Path| {
            path.exists() || path.with_file_name(compressed_name(path)).exists()
        };

        let mut candidate = self.dir.join(format!("{}-{stamp}{}", self.stem, self.ext));
        let mut n = 1;
        while taken(&candidate) {
            candidate = self
                .dir
                .join(format!("{}-{stamp}-{n}{}", self.stem, self.ext));
            n += 1;
        }
        candidate
    }

    fn backups(&self) -> io::Result<Vec<Backup>> {
        let prefix = format!("{}-", self.stem);
        let mut backups = vec![];

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            // never touch directories or symlinks
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            let (rest, compressed) = match rest.strip_suffix(COMPRESS_SUFFIX) {
                Some(rest) => (rest, true),
                None => (rest, false),
            };
            let Some(stamp) = rest.strip_suffix(self.ext.as_str()) else {
                continue;
            };
            let Some(time) = self.parse_stamp(stamp) else {
                continue;
            };

            backups.push(Backup {
                path: entry.path(),
                name,
                time,
                compressed,
            });
        }

        Ok(backups)
    }

    fn parse_stamp(&self, stamp: &str) -> Option<Timestamp> {
        let stamp = stamp.get(..19)?;
        let datetime = jiff::civil::DateTime::strptime(BACKUP_TIME_PARSE_FORMAT, stamp).ok()?;
        let zoned = datetime.to_zoned(self.tz.clone()).ok()?;
        Some(zoned.timestamp())
    }

    fn clean_or_report(&self, now: &Zoned) {
        if let Err(err) = self.clean_backups(now) {
            eprintln!(
                "failed to clean up backups of {}: {err}",
                self.dir.join(format!("{}{}", self.stem, self.ext)).display()
            );
        }
    }

    fn clean_backups(&self, now: &Zoned) -> io::Result<()> {
        let mut backups = self.backups()?;
        // newest first
        backups.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| b.name.cmp(&a.name)));

        let mut removals = vec![];
        if self.max_backups > 0 && backups.len() > self.max_backups {
            removals.extend(backups.split_off(self.max_backups));
        }
        if self.max_age > 0 {
            let max_age = SignedDuration::from_hours(24 * i64::from(self.max_age));
            let cutoff = now
                .timestamp()
                .checked_sub(max_age)
                .unwrap_or(Timestamp::MIN);
            let (expired, kept): (Vec<_>, Vec<_>) =
                backups.into_iter().partition(|backup| backup.time < cutoff);
            removals.extend(expired);
            backups = kept;
        }

        for backup in &removals {
            fs::remove_file(&backup.path)?;
        }

        if self.compress {
            for backup in backups.iter().filter(|backup| !backup.compressed) {
                compress_file(&backup.path)?;
            }
        }

        Ok(())
    }
}

fn compressed_name(path: &Path) -> String {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    format!("{name}{COMPRESS_SUFFIX}")
}

fn compress_file(path: &Path) -> io::Result<()> {
    let target = path.with_file_name(compressed_name(path));
    let mut input = File::open(path)?;
    let output = File::create(&target)?;

    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;

    fs::remove_file(path)
}
