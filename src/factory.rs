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

//! Building complete loggers out of a configuration snapshot.

use jiff::Zoned;
use log::Level;

use crate::Config;
use crate::Error;
use crate::Logger;
use crate::append::RollingFile;
use crate::append::Stdout;
use crate::append::Tee;
use crate::append::rolling_file::RollingFileWriter;
use crate::config::Encoding;
use crate::layout::Layout;
use crate::layout::TextLayout;

/// Builds the logger installed by a [`RotationManager`](crate::RotationManager) at start and
/// on every rotation.
pub trait Factory: Send + Sync + 'static {
    /// Builds a logger for `config` as of `now`.
    fn build(&self, config: &Config, now: &Zoned) -> Result<Logger, Error>;
}

/// The factory used unless another one is given, see [`build_logger`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFactory;

impl Factory for StandardFactory {
    fn build(&self, config: &Config, now: &Zoned) -> Result<Logger, Error> {
        build_logger(config, now)
    }
}

impl<F> Factory for F
where
    F: Fn(&Config, &Zoned) -> Result<Logger, Error> + Send + Sync + 'static,
{
    fn build(&self, config: &Config, now: &Zoned) -> Result<Logger, Error> {
        self(config, now)
    }
}

/// Builds a logger writing to the dated file of `now`.
///
/// The file lives at `config.directory` joined with `config.file_name` formatted against
/// `now`, and is bounded by the configured retention. With `config.console` on, every record
/// is mirrored to stdout. Records below `config.level` are dropped, and records at `warn` or
/// above carry a stack trace.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file name template cannot be formatted, and
/// [`Error::SinkCreation`] if the file cannot be opened.
pub fn build_logger(config: &Config, now: &Zoned) -> Result<Logger, Error> {
    let path = config.file_path(now)?;
    let writer = RollingFileWriter::builder()
        .max_size(config.max_size_bytes())
        .max_backups(config.max_backups)
        .max_age(config.max_age)
        .compress(config.compress)
        .timezone(config.timezone.clone())
        .build(&path)
        .map_err(|source| Error::SinkCreation { path, source })?;

    let layout = layout(config.encoding);
    let file = RollingFile::new(writer).with_layout(layout.clone());

    let builder = if config.console {
        let tee = Tee::default()
            .append(file)
            .append(Stdout::default().with_layout(layout));
        Logger::builder(tee)
    } else {
        Logger::builder(file)
    };

    let mut builder = builder
        .name(config.name.clone())
        .level(config.level)
        .stacktrace_level(Level::Warn)
        .timezone(config.timezone.clone());
    if let Some(directives) = &config.directives {
        builder = builder.directives(directives.clone());
    }
    Ok(builder.build())
}

fn layout(encoding: Encoding) -> Layout {
    match encoding {
        Encoding::Console => TextLayout::default().into(),
        #[cfg(feature = "layout-json")]
        Encoding::Json => crate::layout::JsonLayout::default().into(),
    }
}
