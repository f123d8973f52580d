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

//! The per-frame render loop.

use crate::animation::AnimationState;
use crate::geometry::GeometryBuffer;
use crate::gpu_backend::GpuContext;
use crate::program::{Program, UniformBinding};
use crate::Error;

use std::error::Error as StdError;
use std::rc::Rc;

/// The uniform the animated color is pushed into.
pub const DEFAULT_COLOR_UNIFORM: &str = "u_Color";

/// The color the frame is cleared to.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// The window that frames are presented to.
///
/// This is the only view the loop has of the windowing system.
pub trait Surface {
    /// The error type for presenting a frame.
    type Error: StdError + 'static;

    /// Whether closing the surface has been requested.
    fn should_close(&self) -> bool;

    /// Ask for the surface to close at the start of the next frame.
    fn request_close(&mut self);

    /// Whether the key is currently held down.
    fn is_key_pressed(&self, key: Key) -> bool;

    /// The current size of the framebuffer, in pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Present the frame that was just drawn.
    fn swap_buffers(&mut self) -> Result<(), Self::Error>;

    /// Dispatch pending window events, returning the ones the loop cares about.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;
}

/// A key the loop reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Key {
    /// Closes the surface.
    Escape,
}

/// An event reported by [`Surface::poll_events`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The framebuffer changed size.
    Resized {
        /// The new width.
        width: u32,

        /// The new height.
        height: u32,
    },

    /// The user asked for the surface to close.
    CloseRequested,
}

/// Where the loop is in its lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Built, but no frame has been started.
    Uninitialized,

    /// Drawing frames.
    Running,

    /// A close was observed; resources are being released.
    Terminating,

    /// Everything has been released.
    Shutdown,
}

/// Settings for the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLoopConfig {
    /// The name of the `vec4` uniform that receives the animated color.
    pub color_uniform: String,

    /// The per-frame change of the red channel.
    pub step: f32,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            color_uniform: DEFAULT_COLOR_UNIFORM.to_owned(),
            step: crate::animation::DEFAULT_STEP,
        }
    }
}

/// What happened over the course of [`FrameLoop::run`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The number of frames that were drawn and presented.
    pub frames: u64,

    /// The state the loop ended in.
    pub state: LoopState,
}

/// Owns everything needed to draw, and draws it until the surface closes.
pub struct FrameLoop<C: GpuContext + ?Sized, S: Surface> {
    // Declared before `surface` so that GPU objects go away while its context is alive.
    program: Program<C>,
    geometry: GeometryBuffer<C>,
    color: UniformBinding<C>,
    context: Rc<C>,
    surface: S,
    animation: AnimationState,
    state: LoopState,
    frames: u64,
}

impl<C: GpuContext + ?Sized, S: Surface> FrameLoop<C, S> {
    /// Set up a loop for a linked program and uploaded geometry.
    ///
    /// Fails if the color uniform is not active in `program`.
    pub fn new(
        context: Rc<C>,
        surface: S,
        program: Program<C>,
        geometry: GeometryBuffer<C>,
        config: &FrameLoopConfig,
    ) -> Result<Self, Error> {
        let color = program.uniform(&config.color_uniform)?;

        Ok(Self {
            program,
            geometry,
            color,
            context,
            surface,
            animation: AnimationState::new(config.step),
            state: LoopState::Uninitialized,
            frames: 0,
        })
    }

    /// The current state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The animation driving the color uniform.
    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    /// The number of frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The surface being drawn to.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Run a single iteration.
    ///
    /// Returns `false` without drawing once a close has been requested.
    pub fn step(&mut self) -> Result<bool, Error> {
        match self.state {
            LoopState::Uninitialized => self.start(),
            LoopState::Running => {}
            LoopState::Terminating | LoopState::Shutdown => return Ok(false),
        }

        if self.surface.is_key_pressed(Key::Escape) {
            tracing::debug!("escape pressed, requesting close");
            self.surface.request_close();
        }

        if self.surface.should_close() {
            tracing::info!("close requested after {} frames", self.frames);
            self.state = LoopState::Terminating;
            return Ok(false);
        }

        self.context.clear(CLEAR_COLOR);

        self.animation.advance();
        self.program.bind();
        self.program.set_uniform_4f(&self.color, self.animation.color());

        self.geometry.draw();

        self.surface
            .swap_buffers()
            .map_err(|e| Error::Present(e.to_string()))?;
        self.frames += 1;

        for event in self.surface.poll_events() {
            self.handle_event(event);
        }

        Ok(true)
    }

    /// Draw frames until the surface closes, then release every GPU object.
    pub fn run(mut self) -> Result<RunSummary, Error> {
        let result = loop {
            match self.step() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        let frames = self.frames;
        self.shutdown();
        result.map(|()| RunSummary {
            frames,
            state: LoopState::Shutdown,
        })
    }

    fn start(&mut self) {
        let (width, height) = self.surface.framebuffer_size();
        self.context.viewport(0, 0, width, height);

        tracing::info!("starting frame loop at {width}x{height}");
        self.state = LoopState::Running;
    }

    fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Resized { width, height } => {
                tracing::debug!("resized to {width}x{height}");
                self.context.viewport(0, 0, width, height);
            }
            SurfaceEvent::CloseRequested => self.surface.request_close(),
        }
    }

    fn shutdown(self) {
        let Self {
            program,
            geometry,
            color,
            context,
            surface,
            ..
        } = self;

        context.use_program(None);
        drop(color);
        drop(geometry);
        drop(program);

        drop(surface);
        tracing::info!("frame loop shut down");
    }
}
