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

//! Shader compilation.

use crate::gpu_backend::{GpuContext, Stage};
use crate::resources::ShaderObject;
use crate::source::ShaderSource;
use crate::Error;

use std::fmt;
use std::rc::Rc;

const EMPTY_SOURCE: &str = "shader source is empty";
const NO_DIAGNOSTIC: &str = "the driver reported a failure without a diagnostic log";

/// The outcome of compiling a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStatus {
    /// The shader compiled and can be linked.
    Success,

    /// The shader failed to compile, with the driver's diagnostic log.
    Failed(String),
}

/// A shader object that has been through the compiler.
///
/// The GPU object is kept whether or not compilation succeeded; it is deleted when this
/// value is dropped or consumed by [`link`](crate::program::link).
pub struct CompiledShader<C: GpuContext + ?Sized> {
    object: ShaderObject<C>,
    stage: Stage,
    status: CompileStatus,
}

impl<C: GpuContext + ?Sized> fmt::Debug for CompiledShader<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShader")
            .field("object", &self.object)
            .field("stage", &self.stage)
            .field("status", &self.status)
            .finish()
    }
}

impl<C: GpuContext + ?Sized> CompiledShader<C> {
    /// The stage this shader targets.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The compile status.
    pub fn status(&self) -> &CompileStatus {
        &self.status
    }

    /// Whether the shader compiled.
    pub fn is_success(&self) -> bool {
        matches!(self.status, CompileStatus::Success)
    }

    /// The diagnostic log, if compilation failed.
    pub fn diagnostic(&self) -> Option<&str> {
        match &self.status {
            CompileStatus::Success => None,
            CompileStatus::Failed(log) => Some(log),
        }
    }

    /// The compile failure as an [`Error`], if there is one.
    pub fn error(&self) -> Option<Error> {
        self.diagnostic().map(|log| Error::Compile {
            stage: self.stage,
            log: log.to_owned(),
        })
    }

    pub(crate) fn handle(&self) -> C::Shader {
        self.object.resource()
    }
}

/// Compile a single shader stage.
///
/// Only failing to allocate the shader object is an error here. A source that does not
/// compile still produces a [`CompiledShader`], with [`CompileStatus::Failed`] carrying the
/// driver's log.
pub fn compile<C: GpuContext + ?Sized>(
    context: &Rc<C>,
    source: ShaderSource,
) -> Result<CompiledShader<C>, Error> {
    let stage = source.stage();
    let object = ShaderObject::new(context, stage)?;

    if source.is_blank() {
        tracing::warn!("refusing to compile an empty {stage} shader");
        return Ok(CompiledShader {
            object,
            stage,
            status: CompileStatus::Failed(EMPTY_SOURCE.to_owned()),
        });
    }

    let shader = object.resource();
    context.shader_source(shader, source.text());
    context.compile_shader(shader);

    let status = if context.shader_compile_status(shader) {
        tracing::debug!("compiled {stage} shader {shader:?}");
        CompileStatus::Success
    } else {
        let length = context.shader_info_log_length(shader);
        let log = fetch_log(length, |length| context.shader_info_log(shader, length));
        CompileStatus::Failed(log)
    };

    Ok(CompiledShader {
        object,
        stage,
        status,
    })
}

/// Fetch an info log whose length has already been queried from the driver.
pub(crate) fn fetch_log(length: usize, fetch: impl FnOnce(usize) -> String) -> String {
    let log = if length == 0 {
        String::new()
    } else {
        fetch(length)
    };

    let trimmed = log.trim_end_matches(['\0', '\n', ' ']);
    if trimmed.is_empty() {
        NO_DIAGNOSTIC.to_owned()
    } else {
        trimmed.to_owned()
    }
}
