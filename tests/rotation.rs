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
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use jiff::Zoned;
use log::Level;
use log::Record;
use rotalog::Append;
use rotalog::Config;
use rotalog::Entry;
use rotalog::Error;
use rotalog::Logger;
use rotalog::RotationManager;
use rotalog::Status;
use rotalog::slot::LoggerSlot;
use tempfile::TempDir;

#[derive(Debug, Default)]
struct Journal {
    lines: Mutex<Vec<(usize, Level, String, String)>>,
    flushes: Mutex<Vec<usize>>,
}

#[derive(Debug)]
struct Recording {
    id: usize,
    journal: Arc<Journal>,
}

impl Append for Recording {
    fn append(&self, entry: &Entry) -> anyhow::Result<()> {
        self.journal.lines.lock().unwrap().push((
            self.id,
            entry.level(),
            entry.record().target().to_string(),
            entry.message().to_string(),
        ));
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.journal.flushes.lock().unwrap().push(self.id);
        Ok(())
    }
}

/// Builds loggers recording into a shared journal, failing every build after `fail_after`.
#[derive(Clone)]
struct RecordingFactory {
    builds: Arc<AtomicUsize>,
    journal: Arc<Journal>,
    fail_after: usize,
}

impl RecordingFactory {
    fn new() -> Self {
        Self {
            builds: Arc::default(),
            journal: Arc::default(),
            fail_after: usize::MAX,
        }
    }

    fn failing_after(fail_after: usize) -> Self {
        Self {
            fail_after,
            ..Self::new()
        }
    }

    fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    fn flushes(&self) -> Vec<usize> {
        self.journal.flushes.lock().unwrap().clone()
    }
}

impl rotalog::Factory for RecordingFactory {
    fn build(&self, config: &Config, _: &Zoned) -> Result<Logger, Error> {
        let id = self.builds.fetch_add(1, Ordering::SeqCst);
        if id >= self.fail_after {
            return Err(Error::SinkCreation {
                path: config.directory.clone(),
                source: std::io::Error::other("disk full"),
            });
        }

        let append = Recording {
            id,
            journal: self.journal.clone(),
        };
        Ok(Logger::builder(append).level(config.level).build())
    }
}

fn config(dir: &TempDir) -> Config {
    Config {
        directory: dir.path().to_path_buf(),
        ..Config::default()
    }
}

fn emit(slot: &LoggerSlot, message: &str) {
    slot.with(|logger| {
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("{message}"))
                .build(),
        )
    });
}

#[test]
fn test_start_then_stop_flushes_once() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let slot = LoggerSlot::new();
    let manager = RotationManager::builder(config(&dir))
        .factory(factory.clone())
        .slot(slot.clone())
        .start()
        .unwrap();

    emit(&slot, "hello");
    let started = Instant::now();
    manager.stop().unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(manager.status(), Status::Stopped);
    assert_eq!(factory.builds(), 1);
    assert_eq!(factory.flushes(), vec![0]);

    // late records still reach the final logger
    emit(&slot, "late");
    let messages = factory
        .journal
        .lines
        .lock()
        .unwrap()
        .iter()
        .map(|(_, _, _, message)| message.clone())
        .collect::<Vec<_>>();
    assert_eq!(messages, vec!["hello", "late"]);
}

#[test]
fn test_double_stop_does_not_flush_again() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let manager = RotationManager::builder(config(&dir))
        .factory(factory.clone())
        .slot(LoggerSlot::new())
        .start()
        .unwrap();

    manager.stop().unwrap();
    assert!(matches!(manager.stop(), Err(Error::AlreadyStopped)));
    drop(manager);
    assert_eq!(factory.flushes(), vec![0]);
}

#[test]
fn test_drop_stops_running_manager() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let manager = RotationManager::builder(config(&dir))
        .factory(factory.clone())
        .slot(LoggerSlot::new())
        .start()
        .unwrap();

    manager.rotate().unwrap();
    drop(manager);
    assert_eq!(factory.flushes(), vec![0, 1]);
}

#[test]
fn test_forced_rotations_lose_no_records() {
    const EMITTERS: usize = 4;
    const RECORDS: usize = 2500;
    const ROTATIONS: usize = 1000;

    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let slot = LoggerSlot::new();
    let manager = RotationManager::builder(config(&dir))
        .factory(factory.clone())
        .slot(slot.clone())
        .start()
        .unwrap();

    thread::scope(|s| {
        for emitter in 0..EMITTERS {
            let slot = &slot;
            s.spawn(move || {
                for i in 0..RECORDS {
                    emit(slot, &format!("{emitter}-{i}"));
                }
            });
        }
        for _ in 0..ROTATIONS {
            manager.rotate().unwrap();
        }
    });
    manager.stop().unwrap();

    assert_eq!(factory.builds(), ROTATIONS + 1);
    let mut flushes = factory.flushes();
    flushes.sort_unstable();
    assert_eq!(flushes, (0..=ROTATIONS).collect::<Vec<_>>());

    let lines = factory.journal.lines.lock().unwrap();
    assert_eq!(lines.len(), EMITTERS * RECORDS);
    for emitter in 0..EMITTERS {
        // each emitter observes its own records in order
        let sequence = lines
            .iter()
            .filter_map(|(_, _, _, message)| message.strip_prefix(&format!("{emitter}-")))
            .map(|i| i.parse::<usize>().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(sequence, (0..RECORDS).collect::<Vec<_>>());
    }
}

#[test]
fn test_scheduled_rotations_replace_logger() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let slot = LoggerSlot::new();
    let manager = RotationManager::builder(Config {
        rotation_interval: Duration::from_millis(100),
        ..config(&dir)
    })
    .factory(factory.clone())
    .slot(slot.clone())
    .start()
    .unwrap();

    thread::sleep(Duration::from_millis(550));
    manager.stop().unwrap();

    let builds = factory.builds();
    assert!(builds >= 3, "only {builds} loggers built");
    assert_eq!(factory.flushes().len(), builds);
    assert!(Arc::ptr_eq(&manager.logger(), &slot.load().unwrap()));
}

#[test]
fn test_failed_scheduled_rotation_keeps_logger() {
    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::failing_after(1);
    let slot = LoggerSlot::new();
    let manager = RotationManager::builder(Config {
        rotation_interval: Duration::from_millis(100),
        ..config(&dir)
    })
    .factory(factory.clone())
    .slot(slot.clone())
    .start()
    .unwrap();
    let first = manager.logger();

    thread::sleep(Duration::from_millis(350));
    assert_eq!(manager.status(), Status::Running);
    assert!(Arc::ptr_eq(&first, &slot.load().unwrap()));
    assert!(matches!(manager.rotate(), Err(Error::SinkCreation { .. })));
    manager.stop().unwrap();

    assert!(factory.builds() >= 2);
    assert_eq!(factory.flushes(), vec![0]);
    let lines = factory.journal.lines.lock().unwrap();
    assert!(!lines.is_empty());
    for (id, level, target, message) in lines.iter() {
        assert_eq!(*id, 0);
        assert_eq!(*level, Level::Error);
        assert_eq!(target, "rotalog::rotate");
        assert!(message.contains("disk full"), "{message}");
    }
}

#[test]
fn test_sink_failure_fails_start() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let slot = LoggerSlot::new();
    let err = RotationManager::builder(Config {
        directory: blocker.join("logs"),
        ..Config::default()
    })
    .slot(slot.clone())
    .start()
    .unwrap_err();

    assert!(matches!(err, Error::SinkCreation { .. }), "{err}");
    assert!(slot.load().is_none());
}

#[test]
fn test_rotations_write_dated_files() {
    let dir = TempDir::new().unwrap();
    let slot = LoggerSlot::new();
    let manager = RotationManager::builder(Config {
        file_name: "app.log".to_string(),
        ..config(&dir)
    })
    .slot(slot.clone())
    .start()
    .unwrap();

    emit(&slot, "before");
    manager.rotate().unwrap();
    emit(&slot, "after");
    manager.stop().unwrap();

    let content = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("\tbefore"), "{}", lines[0]);
    assert!(lines[1].ends_with("\tafter"), "{}", lines[1]);
}

#[test]
fn test_records_reach_disk_before_and_after_stop() {
    let dir = TempDir::new().unwrap();
    let slot = LoggerSlot::new();
    let manager = RotationManager::builder(Config {
        file_name: "app.log".to_string(),
        ..config(&dir)
    })
    .slot(slot.clone())
    .start()
    .unwrap();
    let read_lines = || {
        std::fs::read_to_string(dir.path().join("app.log"))
            .unwrap()
            .lines()
            .map(|line| line.rsplit('\t').next().unwrap().to_string())
            .collect::<Vec<_>>()
    };

    for i in 0..20 {
        emit(&slot, &format!("running {i}"));
    }
    assert_eq!(read_lines().len(), 20);

    emit(&slot, "before");
    manager.stop().unwrap();
    emit(&slot, "late");
    drop(manager);

    let lines = read_lines();
    assert_eq!(lines.len(), 22);
    assert_eq!(lines[20..], ["before", "late"]);
}

#[test]
fn test_stop_waits_for_concurrent_rotations() {
    const ROTATORS: usize = 4;

    let dir = TempDir::new().unwrap();
    let factory = RecordingFactory::new();
    let slot = LoggerSlot::new();
    let manager = RotationManager::builder(config(&dir))
        .factory(factory.clone())
        .slot(slot.clone())
        .start()
        .unwrap();
    let rotated = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..ROTATORS {
            s.spawn(|| {
                loop {
                    match manager.rotate() {
                        Ok(()) => {
                            rotated.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(err) => {
                            assert!(matches!(err, Error::Stopped), "{err}");
                            break;
                        }
                    }
                }
                // once stopped, every further rotation is refused
                assert!(matches!(manager.rotate(), Err(Error::Stopped)));
            });
        }
        while rotated.load(Ordering::SeqCst) < 100 {
            thread::yield_now();
        }
        manager.stop().unwrap();
    });

    let builds = factory.builds();
    assert_eq!(builds, rotated.load(Ordering::SeqCst) + 1);
    let mut flushes = factory.flushes();
    flushes.sort_unstable();
    assert_eq!(flushes, (0..builds).collect::<Vec<_>>());
    assert!(Arc::ptr_eq(&manager.logger(), &slot.load().unwrap()));
}
