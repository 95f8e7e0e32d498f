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

//! Appender for writing log entries to size bounded files with retained backups.
//!
//! # Example
//!
//!```
//! use rotalog::append::rolling_file::RollingFile;
//! use rotalog::append::rolling_file::RollingFileWriter;
//! use rotalog::layout::TextLayout;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let writer = RollingFileWriter::builder()
//!     .max_size(10 * 1024 * 1024)
//!     .max_backups(5)
//!     .max_age(7)
//!     .compress(true)
//!     .build(dir.path().join("app.log"))
//!     .unwrap();
//!
//! let append = RollingFile::new(writer).with_layout(TextLayout::default());
//! ```

pub use append::RollingFile;
pub use rolling::RollingFileWriter;
pub use rolling::RollingFileWriterBuilder;

mod append;
mod clock;
mod rolling;
