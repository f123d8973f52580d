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

//! A recording GPU context and a scripted surface for driving the pipeline without a GPU.

#![allow(dead_code)]

use asteroids::frame::SurfaceEvent;
use asteroids::{
    BufferType, BufferUsage, GpuContext, Key, Stage, Surface, Vertex, VertexAttribute,
};

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

pub const VERTEX_SOURCE: &str = "#version 330 core
layout(location = 0) in vec2 position;
void main() { gl_Position = vec4(position, 0.0, 1.0); }
";

pub const FRAGMENT_SOURCE: &str = "#version 330 core
out vec4 color;
uniform vec4 u_Color;
void main() { color = u_Color; }
";

pub const BROKEN_SOURCE: &str = "#version 330 core
void main() { gl_Position = vec4(0.0 }
";

pub const SYNTAX_ERROR_LOG: &str = "0:2(36): error: syntax error, unexpected '}'";

/// Every call made on a [`MockContext`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(Stage, u32),
    DeleteShader(u32),
    ShaderSource(u32),
    CompileShader(u32),
    ShaderInfoLogLength(u32, usize),
    ShaderInfoLog(u32, usize),
    CreateProgram(u32),
    DeleteProgram(u32),
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    LinkProgram(u32),
    ValidateProgram(u32),
    ProgramInfoLogLength(u32, usize),
    ProgramInfoLog(u32, usize),
    UseProgram(Option<u32>),
    Uniform4f(i32, [f32; 4]),
    CreateVertexArray(u32),
    DeleteVertexArray(u32),
    BindVertexArray(Option<u32>),
    CreateBuffer(u32),
    DeleteBuffer(u32),
    BindBuffer(BufferType, Option<u32>),
    BufferData(BufferType, usize, BufferUsage),
    VertexAttribPointer(VertexAttribute),
    Clear([f32; 4]),
    Viewport(u32, u32),
    DrawElements(usize),
}

/// The kinds of object whose allocation can be made to fail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Allocation {
    Shader,
    Program,
    VertexArray,
    Buffer,
}

#[derive(Debug)]
pub struct MockError(pub String);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock error: {}", self.0)
    }
}

impl std::error::Error for MockError {}

#[derive(Default)]
struct MockShader {
    stage: Option<Stage>,
    source: String,
    log: Option<String>,
    compiled: bool,
}

#[derive(Default)]
struct MockProgram {
    attached: Vec<u32>,
    uniforms: Vec<String>,
    linked: bool,
    validated: bool,
    log: Option<String>,
}

#[derive(Default)]
struct MockVertexArray {
    element_buffer: Option<u32>,
    vertex_buffer: Option<u32>,
}

/// A GPU context that records calls and fakes compilation, linking and drawing.
#[derive(Default)]
pub struct MockContext {
    next_name: Cell<u32>,
    calls: RefCell<Vec<Call>>,
    live: RefCell<HashSet<u32>>,
    shaders: RefCell<HashMap<u32, MockShader>>,
    programs: RefCell<HashMap<u32, MockProgram>>,
    vertex_arrays: RefCell<HashMap<u32, MockVertexArray>>,
    buffers: RefCell<HashMap<u32, Vec<u8>>>,
    bound_vertex_array: Cell<Option<u32>>,
    bound_array_buffer: Cell<Option<u32>>,
    bound_element_buffer: Cell<Option<u32>>,
    current_program: Cell<Option<u32>>,

    /// Fail the next allocation of this kind.
    pub fail_allocation: Cell<Option<Allocation>>,

    /// Fail linking with this log.
    pub link_error: RefCell<Option<String>>,

    /// Fail validation with this log.
    pub validation_error: RefCell<Option<String>>,
}

impl MockContext {
    pub fn new() -> Self {
        Self {
            next_name: Cell::new(1),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| matches(call)).count()
    }

    /// The number of objects that have been created but not deleted.
    pub fn live_objects(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, name: u32) -> bool {
        self.live.borrow().contains(&name)
    }

    pub fn bound_vertex_array(&self) -> Option<u32> {
        self.bound_vertex_array.get()
    }

    pub fn bound_array_buffer(&self) -> Option<u32> {
        self.bound_array_buffer.get()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self, kind: Allocation) -> Result<u32, MockError> {
        if self.fail_allocation.get() == Some(kind) {
            self.fail_allocation.set(None);
            return Err(MockError(format!("out of {kind:?} names")));
        }

        let name = self.next_name.get();
        self.next_name.set(name + 1);
        self.live.borrow_mut().insert(name);
        Ok(name)
    }

    fn release(&self, name: u32) {
        assert!(
            self.live.borrow_mut().remove(&name),
            "object {name} deleted twice or never created"
        );
    }

    fn indices_of(&self, vertex_array: u32) -> (Vec<u32>, usize) {
        let arrays = self.vertex_arrays.borrow();
        let array = &arrays[&vertex_array];
        let buffers = self.buffers.borrow();

        let indices = array
            .element_buffer
            .map(|buffer| {
                buffers[&buffer]
                    .chunks_exact(4)
                    .map(|bytes| u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                    .collect()
            })
            .unwrap_or_default();
        let vertex_count = array
            .vertex_buffer
            .map(|buffer| buffers[&buffer].len() / std::mem::size_of::<Vertex>())
            .unwrap_or(0);

        (indices, vertex_count)
    }
}

fn compiles(source: &str) -> bool {
    let opened = source.matches('(').count() + source.matches('{').count();
    let closed = source.matches(')').count() + source.matches('}').count();
    source.contains("void main") && opened == closed
}

fn uniforms_in(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| line.trim().strip_prefix("uniform vec4 "))
        .filter_map(|rest| rest.strip_suffix(';'))
        .map(str::to_owned)
        .collect()
}

impl GpuContext for MockContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = i32;
    type Error = MockError;

    fn create_shader(&self, stage: Stage) -> Result<u32, MockError> {
        let name = self.allocate(Allocation::Shader)?;
        self.shaders.borrow_mut().insert(
            name,
            MockShader {
                stage: Some(stage),
                ..Default::default()
            },
        );
        self.record(Call::CreateShader(stage, name));
        Ok(name)
    }

    fn delete_shader(&self, shader: u32) {
        self.record(Call::DeleteShader(shader));
        self.release(shader);
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.record(Call::ShaderSource(shader));
        self.shaders.borrow_mut().get_mut(&shader).unwrap().source = source.to_owned();
    }

    fn compile_shader(&self, shader: u32) {
        self.record(Call::CompileShader(shader));
        let mut shaders = self.shaders.borrow_mut();
        let shader = shaders.get_mut(&shader).unwrap();

        shader.compiled = compiles(&shader.source);
        shader.log = (!shader.compiled).then(|| SYNTAX_ERROR_LOG.to_owned());
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.shaders.borrow()[&shader].compiled
    }

    fn shader_info_log_length(&self, shader: u32) -> usize {
        let length = self.shaders.borrow()[&shader]
            .log
            .as_ref()
            .map_or(0, |log| log.len() + 1);
        self.record(Call::ShaderInfoLogLength(shader, length));
        length
    }

    fn shader_info_log(&self, shader: u32, length: usize) -> String {
        self.record(Call::ShaderInfoLog(shader, length));
        let log = self.shaders.borrow()[&shader].log.clone().unwrap_or_default();
        log.chars().take(length.saturating_sub(1)).collect()
    }

    fn create_program(&self) -> Result<u32, MockError> {
        let name = self.allocate(Allocation::Program)?;
        self.programs.borrow_mut().insert(name, MockProgram::default());
        self.record(Call::CreateProgram(name));
        Ok(name)
    }

    fn delete_program(&self, program: u32) {
        self.record(Call::DeleteProgram(program));
        self.release(program);
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(Call::AttachShader(program, shader));
        self.programs
            .borrow_mut()
            .get_mut(&program)
            .unwrap()
            .attached
            .push(shader);
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(Call::DetachShader(program, shader));
        self.programs
            .borrow_mut()
            .get_mut(&program)
            .unwrap()
            .attached
            .retain(|&attached| attached != shader);
    }

    fn link_program(&self, program: u32) {
        self.record(Call::LinkProgram(program));
        let shaders = self.shaders.borrow();
        let mut programs = self.programs.borrow_mut();
        let program = programs.get_mut(&program).unwrap();

        let stages = program
            .attached
            .iter()
            .filter(|shader| shaders[shader].compiled)
            .filter_map(|shader| shaders[shader].stage)
            .collect::<HashSet<_>>();

        let log = if let Some(log) = self.link_error.borrow().clone() {
            Some(log)
        } else if stages.len() != 2 {
            Some("error: program needs a compiled vertex and fragment shader".to_owned())
        } else {
            None
        };

        program.linked = log.is_none();
        program.log = log;
        program.uniforms = program
            .attached
            .iter()
            .flat_map(|shader| uniforms_in(&shaders[shader].source))
            .collect();
    }

    fn validate_program(&self, program: u32) {
        self.record(Call::ValidateProgram(program));
        let mut programs = self.programs.borrow_mut();
        let program = programs.get_mut(&program).unwrap();

        match self.validation_error.borrow().clone() {
            Some(log) => {
                program.validated = false;
                program.log = Some(log);
            }
            None => program.validated = program.linked,
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.programs.borrow()[&program].linked
    }

    fn program_validate_status(&self, program: u32) -> bool {
        self.programs.borrow()[&program].validated
    }

    fn program_info_log_length(&self, program: u32) -> usize {
        let length = self.programs.borrow()[&program]
            .log
            .as_ref()
            .map_or(0, |log| log.len() + 1);
        self.record(Call::ProgramInfoLogLength(program, length));
        length
    }

    fn program_info_log(&self, program: u32, length: usize) -> String {
        self.record(Call::ProgramInfoLog(program, length));
        let log = self.programs.borrow()[&program].log.clone().unwrap_or_default();
        log.chars().take(length.saturating_sub(1)).collect()
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
        if let Some(program) = program {
            assert!(self.programs.borrow()[&program].linked, "bound an unlinked program");
        }
        self.current_program.set(program);
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<i32> {
        let programs = self.programs.borrow();
        let program = &programs[&program];
        if !program.linked {
            return None;
        }

        program
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| index as i32)
    }

    fn uniform_4_f32(&self, location: &i32, value: [f32; 4]) {
        assert!(self.current_program.get().is_some(), "no program bound");
        self.record(Call::Uniform4f(*location, value));
    }

    fn create_vertex_array(&self) -> Result<u32, MockError> {
        let name = self.allocate(Allocation::VertexArray)?;
        self.vertex_arrays
            .borrow_mut()
            .insert(name, MockVertexArray::default());
        self.record(Call::CreateVertexArray(name));
        Ok(name)
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.record(Call::DeleteVertexArray(vertex_array));
        self.release(vertex_array);
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
        self.bound_vertex_array.set(vertex_array);
        self.bound_element_buffer.set(
            vertex_array.and_then(|array| self.vertex_arrays.borrow()[&array].element_buffer),
        );
    }

    fn create_buffer(&self) -> Result<u32, MockError> {
        let name = self.allocate(Allocation::Buffer)?;
        self.buffers.borrow_mut().insert(name, Vec::new());
        self.record(Call::CreateBuffer(name));
        Ok(name)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
        self.release(buffer);
    }

    fn bind_buffer(&self, target: BufferType, buffer: Option<u32>) {
        self.record(Call::BindBuffer(target, buffer));
        match target {
            BufferType::Vertex => self.bound_array_buffer.set(buffer),
            BufferType::Index => {
                self.bound_element_buffer.set(buffer);
                if let Some(array) = self.bound_vertex_array.get() {
                    self.vertex_arrays
                        .borrow_mut()
                        .get_mut(&array)
                        .unwrap()
                        .element_buffer = buffer;
                }
            }
        }
    }

    fn buffer_data(&self, target: BufferType, data: &[u8], usage: BufferUsage) {
        self.record(Call::BufferData(target, data.len(), usage));
        let buffer = match target {
            BufferType::Vertex => self.bound_array_buffer.get(),
            BufferType::Index => self.bound_element_buffer.get(),
        }
        .expect("no buffer bound for upload");

        self.buffers.borrow_mut().insert(buffer, data.to_vec());
    }

    fn vertex_attrib_pointer(&self, attribute: VertexAttribute) {
        self.record(Call::VertexAttribPointer(attribute));
        let array = self.bound_vertex_array.get().expect("no vertex array bound");
        self.vertex_arrays
            .borrow_mut()
            .get_mut(&array)
            .unwrap()
            .vertex_buffer = self.bound_array_buffer.get();
    }

    fn clear(&self, color: [f32; 4]) {
        self.record(Call::Clear(color));
    }

    fn viewport(&self, _x: i32, _y: i32, width: u32, height: u32) {
        self.record(Call::Viewport(width, height));
    }

    fn draw_elements(&self, count: usize) {
        self.record(Call::DrawElements(count));
        assert!(self.current_program.get().is_some(), "drew without a program");

        let array = self.bound_vertex_array.get().expect("drew without a vertex array");
        let (indices, vertex_count) = self.indices_of(array);
        assert!(count <= indices.len(), "drew past the end of the index buffer");
        assert!(
            indices[..count]
                .iter()
                .all(|&index| (index as usize) < vertex_count),
            "drew an index outside of the vertex buffer"
        );
    }
}

/// A surface that closes according to a script.
pub struct ScriptedSurface {
    /// Request a close once this many frames have been presented.
    pub close_after: Option<u64>,

    /// Hold escape once this many frames have been presented.
    pub escape_after: Option<u64>,

    /// Events to report from successive polls.
    pub events: VecDeque<Vec<SurfaceEvent>>,

    /// Fail to present this frame.
    pub fail_swap_at: Option<u64>,

    pub should_close: bool,
    pub swaps: u64,
    pub polls: u64,
    pub size: (u32, u32),
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self {
            close_after: None,
            escape_after: None,
            events: VecDeque::new(),
            fail_swap_at: None,
            should_close: false,
            swaps: 0,
            polls: 0,
            size: (800, 600),
        }
    }
}

impl ScriptedSurface {
    pub fn closing_after(frames: u64) -> Self {
        Self {
            close_after: Some(frames),
            ..Default::default()
        }
    }
}

impl Surface for ScriptedSurface {
    type Error = MockError;

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn request_close(&mut self) {
        self.should_close = true;
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        key == Key::Escape && self.escape_after == Some(self.swaps)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn swap_buffers(&mut self) -> Result<(), MockError> {
        if self.fail_swap_at == Some(self.swaps + 1) {
            return Err(MockError("surface lost".into()));
        }

        self.swaps += 1;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.polls += 1;

        let mut events = self.events.pop_front().unwrap_or_default();
        if self.close_after == Some(self.swaps) {
            events.push(SurfaceEvent::CloseRequested);
        }

        events
    }
}
