// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `asteroids`.
//
// `asteroids` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `asteroids` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `asteroids`. If not, see <https://www.gnu.org/licenses/>.

//! Loading shader source text from disk.

use crate::gpu_backend::Stage;
use crate::Error;

use std::fs;
use std::path::Path;

/// The source text of a single shader stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    text: String,
    stage: Stage,
}

impl ShaderSource {
    /// Wrap source text that is already in memory.
    pub fn new(text: impl Into<String>, stage: Stage) -> Self {
        Self {
            text: text.into(),
            stage,
        }
    }

    /// An empty source, which never compiles.
    pub fn empty(stage: Stage) -> Self {
        Self::new(String::new(), stage)
    }

    /// The source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The stage this source targets.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Whether there is anything to compile at all.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Read the whole file at `path` as shader source.
pub fn load(path: impl AsRef<Path>, stage: Stage) -> Result<ShaderSource, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "loaded {stage} shader from {} ({} bytes)",
        path.display(),
        text.len()
    );
    Ok(ShaderSource::new(text, stage))
}

/// Read the file at `path`, logging the failure and falling back to an empty source.
///
/// The empty source is rejected by the compiler, so a missing file always surfaces as a
/// compile failure for that stage.
pub fn load_or_empty(path: impl AsRef<Path>, stage: Stage) -> ShaderSource {
    load(path, stage).unwrap_or_else(|err| {
        match &err {
            Error::Io { source, .. } => tracing::error!("{err}: {source}"),
            _ => tracing::error!("{err}"),
        }

        ShaderSource::empty(stage)
    })
}
