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

//! The error type for the shader pipeline and the frame loop.

use crate::gpu_backend::Stage;

use std::io;
use std::path::PathBuf;

/// An error produced while building or running the render pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A shader source file could not be read.
    #[error("failed to read shader source {}", path.display())]
    Io {
        /// The path that was being read.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A shader failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    Compile {
        /// The stage of the shader.
        stage: Stage,

        /// The compiler's diagnostic log.
        log: String,
    },

    /// A program failed to link, or the shaders handed to the linker were unusable.
    #[error("program failed to link: {0}")]
    Link(String),

    /// A GPU object could not be created.
    #[error("failed to allocate {what}: {reason}")]
    GpuAllocation {
        /// The kind of object being created.
        what: &'static str,

        /// The backend's description of the failure.
        reason: String,
    },

    /// A uniform could not be found in the linked program.
    #[error("uniform `{0}` is not active in the program")]
    UniformNotFound(String),

    /// The geometry handed to the uploader cannot be drawn safely.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The presentation surface failed to present a frame.
    #[error("failed to present frame: {0}")]
    Present(String),
}

impl Error {
    pub(crate) fn allocation(what: &'static str, reason: impl std::fmt::Display) -> Self {
        Error::GpuAllocation {
            what,
            reason: reason.to_string(),
        }
    }
}
