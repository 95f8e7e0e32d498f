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

use std::io;
use std::path::PathBuf;

/// Errors surfaced by the rotation manager and the logger factory.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration was rejected before anything was built.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The file system refused to provide a log sink.
    #[error("failed to create log sink at {}: {source}", path.display())]
    SinkCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The background scheduler thread could not be spawned.
    #[error("failed to spawn rotation scheduler: {0}")]
    Spawn(#[source] io::Error),
    /// `stop` was called on a manager that is already stopped.
    #[error("rotation manager has already been stopped")]
    AlreadyStopped,
    /// A rotation was requested after the manager stopped.
    #[error("rotation manager is stopped")]
    Stopped,
}
