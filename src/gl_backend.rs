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

//! An implementation of [`GpuContext`] on top of the [`gl`] crate.
//!
//! [`gl`]: https://crates.io/crates/gl

use crate::gpu_backend::{BufferType, BufferUsage, GpuContext, Stage, VertexAttribute};

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};

use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/// An error from the OpenGL backend.
#[derive(Debug)]
pub struct GlError(String);

impl From<String> for GlError {
    fn from(s: String) -> Self {
        GlError(s)
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gl error: {}", self.0)
    }
}

impl std::error::Error for GlError {}

/// The OpenGL functions for the current context.
///
/// The `gl` crate keeps its function pointers in globals, so this type carries no state of its
/// own. It is neither `Send` nor `Sync`, since the context it was loaded for is only current
/// on one thread.
pub struct GlContext {
    _current_thread: PhantomData<*mut ()>,
}

impl fmt::Debug for GlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlContext").finish_non_exhaustive()
    }
}

impl GlContext {
    /// Load the OpenGL functions through `loader`.
    ///
    /// Fails if the functions the pipeline needs are missing, which usually means that the
    /// context is older than OpenGL 3.3.
    ///
    /// # Safety
    ///
    /// The context that `loader` belongs to must be current while calling this function and
    /// for as long as the returned value or anything created from it is alive.
    pub unsafe fn load(mut loader: impl FnMut(&CStr) -> *const c_void) -> Result<Self, GlError> {
        gl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => loader(&symbol),
            Err(_) => ptr::null(),
        });

        let missing = [
            ("glCreateShader", gl::CreateShader::is_loaded()),
            ("glCreateProgram", gl::CreateProgram::is_loaded()),
            ("glGenVertexArrays", gl::GenVertexArrays::is_loaded()),
            ("glGenBuffers", gl::GenBuffers::is_loaded()),
            ("glUniform4f", gl::Uniform4f::is_loaded()),
            ("glDrawElements", gl::DrawElements::is_loaded()),
        ]
        .into_iter()
        .filter(|(_, loaded)| !loaded)
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(GlError(format!(
                "OpenGL 3.3 functions are unavailable: {}",
                missing.join(", ")
            )));
        }

        let context = Self {
            _current_thread: PhantomData,
        };

        tracing::info!(
            "OpenGL {} on {}",
            context.get_string(gl::VERSION),
            context.get_string(gl::RENDERER)
        );

        #[cfg(not(target_vendor = "apple"))]
        if gl::DebugMessageCallback::is_loaded() {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::DebugMessageCallback(Some(debug_message_callback), ptr::null());
        }

        Ok(context)
    }

    fn get_string(&self, name: GLenum) -> String {
        unsafe {
            let string = gl::GetString(name);
            if string.is_null() {
                return "<unknown>".to_owned();
            }

            CStr::from_ptr(string.cast()).to_string_lossy().into_owned()
        }
    }
}

impl GpuContext for GlContext {
    type Shader = GLuint;
    type Program = GLuint;
    type Buffer = GLuint;
    type VertexArray = GLuint;
    type UniformLocation = GLint;
    type Error = GlError;

    fn create_shader(&self, stage: Stage) -> Result<Self::Shader, Self::Error> {
        let kind = match stage {
            Stage::Vertex => gl::VERTEX_SHADER,
            Stage::Fragment => gl::FRAGMENT_SHADER,
        };

        let shader = unsafe { gl::CreateShader(kind) };
        gl_error();

        if shader == 0 {
            return Err(GlError(format!("glCreateShader returned 0 for a {stage} shader")));
        }

        Ok(shader)
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe {
            gl::DeleteShader(shader);
        }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        let pointer = source.as_ptr() as *const GLchar;
        let length = source.len() as GLint;

        unsafe {
            gl::ShaderSource(shader, 1, &pointer, &length);
        }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe {
            gl::CompileShader(shader);
        }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        let mut status = gl::FALSE as GLint;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        }

        status == gl::TRUE as GLint
    }

    fn shader_info_log_length(&self, shader: Self::Shader) -> usize {
        let mut length = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut length);
        }

        length.max(0) as usize
    }

    fn shader_info_log(&self, shader: Self::Shader, length: usize) -> String {
        read_info_log(length, |capacity, written, buffer| unsafe {
            gl::GetShaderInfoLog(shader, capacity, written, buffer);
        })
    }

    fn create_program(&self) -> Result<Self::Program, Self::Error> {
        let program = unsafe { gl::CreateProgram() };
        gl_error();

        if program == 0 {
            return Err(GlError("glCreateProgram returned 0".into()));
        }

        Ok(program)
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe {
            gl::DeleteProgram(program);
        }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            gl::AttachShader(program, shader);
        }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            gl::DetachShader(program, shader);
        }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe {
            gl::LinkProgram(program);
        }
    }

    fn validate_program(&self, program: Self::Program) {
        unsafe {
            gl::ValidateProgram(program);
        }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        program_parameter(program, gl::LINK_STATUS) == gl::TRUE as GLint
    }

    fn program_validate_status(&self, program: Self::Program) -> bool {
        program_parameter(program, gl::VALIDATE_STATUS) == gl::TRUE as GLint
    }

    fn program_info_log_length(&self, program: Self::Program) -> usize {
        program_parameter(program, gl::INFO_LOG_LENGTH).max(0) as usize
    }

    fn program_info_log(&self, program: Self::Program, length: usize) -> String {
        read_info_log(length, |capacity, written, buffer| unsafe {
            gl::GetProgramInfoLog(program, capacity, written, buffer);
        })
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe {
            gl::UseProgram(program.unwrap_or(0));
        }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };

        (location >= 0).then_some(location)
    }

    fn uniform_4_f32(&self, location: &Self::UniformLocation, [x, y, z, w]: [f32; 4]) {
        unsafe {
            gl::Uniform4f(*location, x, y, z, w);
        }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, Self::Error> {
        let mut vertex_array = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vertex_array);
        }
        gl_error();

        if vertex_array == 0 {
            return Err(GlError("glGenVertexArrays returned no name".into()));
        }

        Ok(vertex_array)
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe {
            gl::DeleteVertexArrays(1, &vertex_array);
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe {
            gl::BindVertexArray(vertex_array.unwrap_or(0));
        }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, Self::Error> {
        let mut buffer = 0;
        unsafe {
            gl::GenBuffers(1, &mut buffer);
        }
        gl_error();

        if buffer == 0 {
            return Err(GlError("glGenBuffers returned no name".into()));
        }

        Ok(buffer)
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe {
            gl::DeleteBuffers(1, &buffer);
        }
    }

    fn bind_buffer(&self, target: BufferType, buffer: Option<Self::Buffer>) {
        unsafe {
            gl::BindBuffer(buffer_target(target), buffer.unwrap_or(0));
        }
    }

    fn buffer_data(&self, target: BufferType, data: &[u8], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::Static => gl::STATIC_DRAW,
            BufferUsage::Dynamic => gl::DYNAMIC_DRAW,
        };

        unsafe {
            gl::BufferData(
                buffer_target(target),
                data.len() as GLsizeiptr,
                data.as_ptr().cast(),
                usage,
            );
        }

        gl_error();
    }

    fn vertex_attrib_pointer(&self, attribute: VertexAttribute) {
        unsafe {
            gl::VertexAttribPointer(
                attribute.location,
                attribute.components,
                gl::FLOAT,
                gl::FALSE,
                attribute.stride as GLsizei,
                attribute.offset as *const c_void,
            );
            gl::EnableVertexAttribArray(attribute.location);
        }

        gl_error();
    }

    fn clear(&self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            gl::ClearColor(r, g, b, a);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        unsafe {
            gl::Viewport(x, y, width as GLsizei, height as GLsizei);
        }
    }

    fn draw_elements(&self, count: usize) {
        unsafe {
            gl::DrawElements(
                gl::TRIANGLES,
                count as GLsizei,
                gl::UNSIGNED_INT,
                ptr::null(),
            );
        }

        gl_error();
    }
}

fn buffer_target(target: BufferType) -> GLenum {
    match target {
        BufferType::Vertex => gl::ARRAY_BUFFER,
        BufferType::Index => gl::ELEMENT_ARRAY_BUFFER,
    }
}

fn program_parameter(program: GLuint, parameter: GLenum) -> GLint {
    let mut value = 0;
    unsafe {
        gl::GetProgramiv(program, parameter, &mut value);
    }
    value
}

/// Read an info log into a buffer of exactly the length the driver reported.
fn read_info_log(
    length: usize,
    read: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar),
) -> String {
    if length == 0 {
        return String::new();
    }

    let mut buffer = vec![0u8; length];
    let mut written: GLsizei = 0;
    read(length as GLsizei, &mut written, buffer.as_mut_ptr().cast());

    buffer.truncate((written.max(0) as usize).min(length));
    String::from_utf8_lossy(&buffer).into_owned()
}

fn gl_error() {
    let err = unsafe { gl::GetError() };

    if err != gl::NO_ERROR {
        let error_str = match err {
            gl::INVALID_ENUM => "GL_INVALID_ENUM",
            gl::INVALID_VALUE => "GL_INVALID_VALUE",
            gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
            gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
            gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
            gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
            gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
            gl::CONTEXT_LOST => "GL_CONTEXT_LOST",
            _ => "Unknown GL error",
        };

        tracing::error!("GL error: {}", error_str)
    }
}

#[cfg(not(target_vendor = "apple"))]
extern "system" fn debug_message_callback(
    source: GLenum,
    ty: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user_param: *mut c_void,
) {
    let source = match source {
        gl::DEBUG_SOURCE_API => "API",
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => "Window System",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "Shader Compiler",
        gl::DEBUG_SOURCE_THIRD_PARTY => "Third Party",
        gl::DEBUG_SOURCE_APPLICATION => "Application",
        gl::DEBUG_SOURCE_OTHER => "Other",
        _ => "Unknown",
    };

    let ty = match ty {
        gl::DEBUG_TYPE_ERROR => "Error",
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "Deprecated Behavior",
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "Undefined Behavior",
        gl::DEBUG_TYPE_PORTABILITY => "Portability",
        gl::DEBUG_TYPE_PERFORMANCE => "Performance",
        gl::DEBUG_TYPE_MARKER => "Marker",
        gl::DEBUG_TYPE_OTHER => "Other",
        _ => "Unknown",
    };

    if message.is_null() || length < 0 {
        return;
    }

    let message = {
        let slice = unsafe { std::slice::from_raw_parts(message.cast::<u8>(), length as usize) };
        String::from_utf8_lossy(slice)
    };

    match severity {
        gl::DEBUG_SEVERITY_HIGH => {
            tracing::error!("{ty}-{id} ({source}): {message}");
        }
        gl::DEBUG_SEVERITY_MEDIUM => {
            tracing::warn!("{ty}-{id} ({source}): {message}");
        }
        gl::DEBUG_SEVERITY_LOW => {
            tracing::info!("{ty}-{id} ({source}): {message}");
        }
        gl::DEBUG_SEVERITY_NOTIFICATION => {
            tracing::debug!("{ty}-{id} ({source}): {message}");
        }
        _ => (),
    };
}
