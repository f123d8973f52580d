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

//! A [`Surface`] backed by a `winit` window and a `glutin` OpenGL context.
//!
//! Events are pumped once per frame with `run_return`, so the frame loop stays in charge of
//! control flow instead of handing it to the event loop.

use crate::frame::{Key, Surface, SurfaceEvent};

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{self, SwapInterval, WindowSurface};

use glutin_winit::GlWindow;

use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, VirtualKeyCode, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{Fullscreen, Window, WindowBuilder};

use std::collections::HashSet;
use std::ffi::{c_void, CStr};
use std::fmt;
use std::num::NonZeroU32;

/// Whether to open a window or take over the primary monitor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WindowMode {
    /// A regular window of the configured size.
    Windowed,

    /// Borderless fullscreen on the primary monitor, at the monitor's resolution.
    Fullscreen,
}

/// How buffer swaps are paced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FramePacing {
    /// Swap as soon as the frame is done.
    Immediate,

    /// Wait for this many vertical blanks per swap.
    Wait(NonZeroU32),
}

impl FramePacing {
    /// Build a pacing from a swap interval, where zero means "don't wait".
    pub fn from_interval(interval: u32) -> Self {
        match NonZeroU32::new(interval) {
            Some(interval) => FramePacing::Wait(interval),
            None => FramePacing::Immediate,
        }
    }
}

impl Default for FramePacing {
    fn default() -> Self {
        FramePacing::from_interval(1)
    }
}

/// Settings for the window and its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    /// The window title.
    pub title: String,

    /// The width used in windowed mode.
    pub width: u32,

    /// The height used in windowed mode.
    pub height: u32,

    /// Windowed or fullscreen.
    pub mode: WindowMode,

    /// The swap interval.
    pub pacing: FramePacing,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Asteroids".to_owned(),
            width: 800,
            height: 600,
            mode: WindowMode::Fullscreen,
            pacing: FramePacing::default(),
        }
    }
}

/// An error while creating or presenting to the window.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The window or its display could not be created.
    #[error("failed to create window: {0}")]
    Window(String),

    /// The display offered no framebuffer configuration.
    #[error("no OpenGL framebuffer configuration is available")]
    NoConfig,

    /// A `glutin` call failed.
    #[error(transparent)]
    Gl(#[from] glutin::error::Error),
}

/// A window with a current OpenGL 3.3 core context.
pub struct GlutinSurface {
    surface: surface::Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    display: Display,
    window: Window,
    event_loop: EventLoop<()>,
    size: PhysicalSize<u32>,
    pressed: HashSet<Key>,
    should_close: bool,
}

impl fmt::Debug for GlutinSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlutinSurface")
            .field("size", &self.size)
            .field("pressed", &self.pressed)
            .field("should_close", &self.should_close)
            .finish_non_exhaustive()
    }
}

impl GlutinSurface {
    /// Open the window, create a context for it and make that context current.
    pub fn new(config: &WindowConfig) -> Result<Self, WindowError> {
        let event_loop = EventLoop::new();

        let mut window_builder = WindowBuilder::new().with_title(&config.title);
        let windowed_size = PhysicalSize::new(config.width, config.height);

        let size = match config.mode {
            WindowMode::Windowed => windowed_size,
            WindowMode::Fullscreen => match event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
            {
                Some(monitor) => {
                    let size = monitor.size();
                    window_builder =
                        window_builder.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))));
                    size
                }
                None => {
                    tracing::warn!("no monitor to go fullscreen on, opening a window instead");
                    windowed_size
                }
            },
        };
        window_builder = window_builder.with_inner_size(size);

        let (display, window, gl_config) = create_window(&event_loop, window_builder)?;
        tracing::debug!("config: {gl_config:?}");

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(window.raw_window_handle()));
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes)? };

        let surface_attributes = window.build_surface_attributes(Default::default());
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes)? };
        let context = not_current.make_current(&surface)?;

        let interval = match config.pacing {
            FramePacing::Immediate => SwapInterval::DontWait,
            FramePacing::Wait(interval) => SwapInterval::Wait(interval),
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            tracing::warn!("failed to set swap interval {interval:?}: {err}");
        }

        let size = window.inner_size();
        tracing::info!(
            "opened {:?} window of {}x{}",
            config.mode,
            size.width,
            size.height
        );

        Ok(Self {
            surface,
            context,
            display,
            window,
            event_loop,
            size,
            pressed: HashSet::new(),
            should_close: false,
        })
    }

    /// Look up an OpenGL function for the current context.
    pub fn get_proc_address(&self, symbol: &CStr) -> *const c_void {
        self.display.get_proc_address(symbol)
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        // Some platforms like EGL require resizing the GL surface to update its size.
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        {
            self.surface.resize(&self.context, width, height);
        }

        self.size = size;
    }
}

impl Surface for GlutinSurface {
    type Error = WindowError;

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn request_close(&mut self) {
        self.should_close = true;
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }

    fn swap_buffers(&mut self) -> Result<(), Self::Error> {
        self.surface.swap_buffers(&self.context)?;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        let window_id = self.window.id();
        let pressed = &mut self.pressed;
        let mut events = Vec::new();

        self.event_loop
            .run_return(|event, _target, control_flow| {
                control_flow.set_poll();

                match event {
                    Event::WindowEvent { window_id: id, event } if id == window_id => match event {
                        WindowEvent::CloseRequested => events.push(SurfaceEvent::CloseRequested),
                        WindowEvent::Resized(size) => events.push(SurfaceEvent::Resized {
                            width: size.width,
                            height: size.height,
                        }),
                        WindowEvent::KeyboardInput { input, .. } => {
                            if let Some(key) = input.virtual_keycode.and_then(map_key) {
                                match input.state {
                                    ElementState::Pressed => pressed.insert(key),
                                    ElementState::Released => pressed.remove(&key),
                                };
                            }
                        }
                        _ => {}
                    },
                    Event::MainEventsCleared => control_flow.set_exit(),
                    _ => {}
                }
            });

        for event in &events {
            match *event {
                SurfaceEvent::Resized { width, height } => {
                    self.resize(PhysicalSize::new(width, height))
                }
                SurfaceEvent::CloseRequested => self.should_close = true,
            }
        }

        events
    }
}

/// Create the display, pick a config and open the window that matches it.
#[cfg(not(target_os = "windows"))]
fn create_window(
    event_loop: &EventLoop<()>,
    window_builder: WindowBuilder,
) -> Result<(Display, Window, Config), WindowError> {
    let display = unsafe { Display::new(event_loop.raw_display_handle(), display_preference())? };

    let configs = unsafe { display.find_configs(ConfigTemplateBuilder::new().build())? };
    let gl_config =
        most_samples(configs, |config| config.num_samples()).ok_or(WindowError::NoConfig)?;

    let window = glutin_winit::finalize_window(event_loop, window_builder, &gl_config)
        .map_err(|e| WindowError::Window(e.to_string()))?;

    Ok((display, window, gl_config))
}

/// WGL needs the window before the display, so the config is matched against it.
#[cfg(target_os = "windows")]
fn create_window(
    event_loop: &EventLoop<()>,
    window_builder: WindowBuilder,
) -> Result<(Display, Window, Config), WindowError> {
    let window = window_builder
        .build(event_loop)
        .map_err(|e| WindowError::Window(e.to_string()))?;
    let handle = window.raw_window_handle();

    let display = unsafe {
        Display::new(
            event_loop.raw_display_handle(),
            DisplayApiPreference::Wgl(Some(handle)),
        )?
    };

    let template = ConfigTemplateBuilder::new()
        .compatible_with_native_window(handle)
        .build();
    let configs = unsafe { display.find_configs(template)? };
    let gl_config =
        most_samples(configs, |config| config.num_samples()).ok_or(WindowError::NoConfig)?;

    Ok((display, window, gl_config))
}

#[cfg(target_os = "macos")]
fn display_preference() -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(all(unix, not(target_os = "macos")))]
fn display_preference() -> DisplayApiPreference {
    DisplayApiPreference::EglThenGlx(Box::new(winit::platform::x11::register_xlib_error_hook))
}

/// The candidate with the most samples, keeping the first one on ties.
fn most_samples<T>(
    candidates: impl Iterator<Item = T>,
    samples: impl Fn(&T) -> u8,
) -> Option<T> {
    candidates.reduce(|best, candidate| {
        if samples(&candidate) > samples(&best) {
            candidate
        } else {
            best
        }
    })
}

fn map_key(key: VirtualKeyCode) -> Option<Key> {
    match key {
        VirtualKeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}
