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

//! Defines the GPU backend that the pipeline drives.

use std::error::Error;
use std::fmt;

/// The GPU API surface used by the shader pipeline and the frame loop.
///
/// Every method assumes that the underlying context is current on the calling thread. The
/// object handles are plain copyable names; ownership of the GPU-side object is tracked by
/// the wrappers in this crate, not by the handles themselves.
pub trait GpuContext {
    /// A shader object.
    type Shader: Copy + PartialEq + fmt::Debug;

    /// A program object.
    type Program: Copy + PartialEq + fmt::Debug;

    /// A buffer object, used for both vertices and indices.
    type Buffer: Copy + PartialEq + fmt::Debug;

    /// A vertex array object.
    type VertexArray: Copy + PartialEq + fmt::Debug;

    /// The location of a uniform inside of a linked program.
    type UniformLocation: Clone + fmt::Debug;

    /// The error type associated with this GPU context.
    type Error: Error + 'static;

    /// Create a new shader object for the given stage.
    fn create_shader(&self, stage: Stage) -> Result<Self::Shader, Self::Error>;

    /// Delete a shader object.
    fn delete_shader(&self, shader: Self::Shader);

    /// Replace the source code of a shader object.
    fn shader_source(&self, shader: Self::Shader, source: &str);

    /// Compile a shader object.
    fn compile_shader(&self, shader: Self::Shader);

    /// Whether the last compilation of this shader succeeded.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;

    /// The length of the shader's info log, as reported by the driver.
    ///
    /// Like `GL_INFO_LOG_LENGTH`, this includes the null terminator and is zero when there is
    /// no log at all.
    fn shader_info_log_length(&self, shader: Self::Shader) -> usize;

    /// Fetch the shader's info log into a buffer of `length` bytes.
    fn shader_info_log(&self, shader: Self::Shader, length: usize) -> String;

    /// Create a new program object.
    fn create_program(&self) -> Result<Self::Program, Self::Error>;

    /// Delete a program object.
    fn delete_program(&self, program: Self::Program);

    /// Attach a shader to a program.
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Detach a shader from a program.
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Link a program.
    fn link_program(&self, program: Self::Program);

    /// Validate a program against the current pipeline state.
    fn validate_program(&self, program: Self::Program);

    /// Whether the last link of this program succeeded.
    fn program_link_status(&self, program: Self::Program) -> bool;

    /// Whether the last validation of this program succeeded.
    fn program_validate_status(&self, program: Self::Program) -> bool;

    /// The length of the program's info log, including the null terminator.
    fn program_info_log_length(&self, program: Self::Program) -> usize;

    /// Fetch the program's info log into a buffer of `length` bytes.
    fn program_info_log(&self, program: Self::Program, length: usize) -> String;

    /// Make a program current, or unbind the current one.
    fn use_program(&self, program: Option<Self::Program>);

    /// Look up the location of a named uniform.
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Set a `vec4` uniform on the current program.
    fn uniform_4_f32(&self, location: &Self::UniformLocation, value: [f32; 4]);

    /// Create a new vertex array object.
    fn create_vertex_array(&self) -> Result<Self::VertexArray, Self::Error>;

    /// Delete a vertex array object.
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    /// Bind a vertex array object, or unbind the current one.
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);

    /// Create a new buffer object.
    fn create_buffer(&self) -> Result<Self::Buffer, Self::Error>;

    /// Delete a buffer object.
    fn delete_buffer(&self, buffer: Self::Buffer);

    /// Bind a buffer to the given target, or unbind it.
    fn bind_buffer(&self, target: BufferType, buffer: Option<Self::Buffer>);

    /// Upload data into the buffer bound to `target`.
    fn buffer_data(&self, target: BufferType, data: &[u8], usage: BufferUsage);

    /// Describe and enable a floating-point vertex attribute for the bound vertex array.
    fn vertex_attrib_pointer(&self, attribute: VertexAttribute);

    /// Clear the color buffer with the given color.
    fn clear(&self, color: [f32; 4]);

    /// Set the viewport transform.
    fn viewport(&self, x: i32, y: i32, width: u32, height: u32);

    /// Draw `count` indices from the bound element buffer as triangles.
    fn draw_elements(&self, count: usize);
}

/// The programmable stage that a shader targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The vertex processing stage.
    Vertex,

    /// The fragment processing stage.
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

/// The type of the buffer to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BufferType {
    /// The buffer is used for vertices.
    Vertex,

    /// The buffer is used for indices.
    Index,
}

/// A hint for how often the contents of a buffer change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    Static,

    /// Rewritten often, drawn many times.
    Dynamic,
}

/// The layout of a single floating-point vertex attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The attribute location in the vertex shader.
    pub location: u32,

    /// The number of `f32` components.
    pub components: i32,

    /// The distance in bytes between consecutive vertices.
    pub stride: usize,

    /// The offset in bytes of the attribute inside of a vertex.
    pub offset: usize,
}

/// The vertex type used by the geometry uploader.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// The position of the vertex, in normalized device coordinates.
    pub position: [f32; 2],
}

impl Vertex {
    /// Create a vertex at the given position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }

    /// The attribute layout for the position.
    pub fn position_attribute() -> VertexAttribute {
        VertexAttribute {
            location: 0,
            components: 2,
            stride: std::mem::size_of::<Vertex>(),
            offset: bytemuck::offset_of!(Vertex, position),
        }
    }
}
