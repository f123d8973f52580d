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

//! Builds a shader program and draws animated geometry with it, one frame at a time.
//!
//! The pipeline is split into small stages that each own the GPU objects they create:
//!
//! 1. [`source::load`] reads the shader text for a stage.
//! 2. [`shader::compile`] turns it into a [`CompiledShader`], keeping the driver's log on
//!    failure.
//! 3. [`program::link`] combines a vertex and a fragment shader into a [`Program`],
//!    deleting both shaders on the way out.
//! 4. [`geometry::upload`] moves vertices and indices into a [`GeometryBuffer`].
//! 5. [`FrameLoop`] owns the program and the geometry and draws them until its
//!    [`Surface`] closes.
//!
//! All GPU calls go through the [`GpuContext`] trait. The [`GlContext`] type implements it
//! on top of OpenGL 3.3, and [`window::GlutinSurface`] provides the matching window.
//!
//! Note that this crate uses thread-unsafe primitives. A GL context is current on exactly one
//! thread, and every object here is tied to that context.

#![deny(rust_2018_idioms)]

mod error;
mod gl_backend;
mod gpu_backend;
mod resources;

pub mod animation;
pub mod frame;
pub mod geometry;
pub mod program;
pub mod shader;
pub mod source;
pub mod window;

pub use self::animation::AnimationState;
pub use self::error::Error;
pub use self::frame::{FrameLoop, FrameLoopConfig, Key, LoopState, RunSummary, Surface};
pub use self::geometry::GeometryBuffer;
pub use self::gl_backend::{GlContext, GlError};
pub use self::gpu_backend::{
    BufferType, BufferUsage, GpuContext, Stage, Vertex, VertexAttribute,
};
pub use self::program::{Program, UniformBinding};
pub use self::shader::{CompileStatus, CompiledShader};
pub use self::source::ShaderSource;

use std::path::Path;
use std::rc::Rc;

/// Compile both stages and link them.
///
/// A compile failure is logged with its stage and log, and the failed shader is still handed
/// to the linker, which rejects it. Only a successfully linked program is returned.
pub fn build_program<C: GpuContext + ?Sized>(
    context: &Rc<C>,
    vertex: ShaderSource,
    fragment: ShaderSource,
) -> Result<Program<C>, Error> {
    let vertex = compile_logged(context, vertex)?;
    let fragment = compile_logged(context, fragment)?;

    program::link(context, vertex, fragment)
}

/// Load both stages from disk, then [`build_program`].
///
/// An unreadable file is logged and treated as an empty source, which fails to compile.
pub fn build_program_from_files<C: GpuContext + ?Sized>(
    context: &Rc<C>,
    vertex_path: impl AsRef<Path>,
    fragment_path: impl AsRef<Path>,
) -> Result<Program<C>, Error> {
    let vertex = source::load_or_empty(vertex_path, Stage::Vertex);
    let fragment = source::load_or_empty(fragment_path, Stage::Fragment);

    build_program(context, vertex, fragment)
}

fn compile_logged<C: GpuContext + ?Sized>(
    context: &Rc<C>,
    source: ShaderSource,
) -> Result<CompiledShader<C>, Error> {
    let shader = shader::compile(context, source)?;

    if let Some(err) = shader.error() {
        tracing::error!("{err}");
    }

    Ok(shader)
}
