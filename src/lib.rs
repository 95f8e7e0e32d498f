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

//! Rotalog is a `log` crate backend writing dated log files that are replaced on an aligned
//! rotation schedule.
//!
//! # Overview
//!
//! A [`RotationManager`] builds a [`Logger`] from a [`Config`], installs it in a
//! [`LoggerSlot`](slot::LoggerSlot), and rebuilds it on every multiple of the rotation
//! interval, so a daily interval opens a new file at local midnight. The old logger is flushed
//! only after the new one is installed; records emitted during a rotation are never lost.
//!
//! Each file is a [`RollingFileWriter`](append::rolling_file::RollingFileWriter), which also
//! rolls over by size and keeps a bounded set of (optionally gzipped) backups.
//!
//! # Examples
//!
//! ```
//! use rotalog::Config;
//! use rotalog::RotationManager;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let manager = RotationManager::start(Config {
//!     directory: dir.path().to_path_buf(),
//!     file_name: "app_%Y-%m-%d.log".to_string(),
//!     ..Config::default()
//! })
//! .unwrap();
//! rotalog::bridge::setup_log_crate();
//!
//! log::info!(user = "alice", attempt = 3; "signed in");
//! log::warn!(elapsed = rotalog::layout::Seconds(std::time::Duration::from_millis(1500)); "slow");
//!
//! manager.stop().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod bridge;
pub mod config;
pub mod factory;
pub mod layout;
pub mod record;
pub mod rotate;
pub mod slot;

mod error;
mod logger;

pub use append::Append;
pub use config::Config;
pub use config::Encoding;
pub use error::Error;
pub use factory::Factory;
pub use factory::StandardFactory;
pub use factory::build_logger;
pub use layout::Layout;
pub use logger::Logger;
pub use logger::LoggerBuilder;
pub use record::Entry;
pub use rotate::RotationManager;
pub use rotate::RotationManagerBuilder;
pub use rotate::Status;
