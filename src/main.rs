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

//! Opens a window and draws the animated quad until it is closed.

use asteroids::geometry::{self, QUAD_INDICES, QUAD_VERTICES};
use asteroids::window::{FramePacing, GlutinSurface, WindowConfig, WindowError, WindowMode};
use asteroids::{Error, FrameLoop, FrameLoopConfig, GlContext, GlError};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(name = "asteroids", version, about = "Draws an animated shader on a quad")]
struct Cli {
    /// Path to the vertex shader source.
    #[arg(long, value_name = "PATH", default_value = "res/shaders/vertex.glsl")]
    vertex_shader: PathBuf,

    /// Path to the fragment shader source.
    #[arg(long, value_name = "PATH", default_value = "res/shaders/fragment.glsl")]
    fragment_shader: PathBuf,

    /// Open a window instead of going fullscreen on the primary monitor.
    #[arg(long)]
    windowed: bool,

    /// Window width in windowed mode.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Window height in windowed mode.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Vertical blanks to wait per buffer swap (0 disables vsync).
    #[arg(long, value_name = "N", default_value_t = 1, env = "ASTEROIDS_SWAP_INTERVAL")]
    swap_interval: u32,

    /// Per-frame change of the animated red channel.
    #[arg(long, default_value_t = asteroids::animation::DEFAULT_STEP)]
    step: f32,

    /// Name of the `vec4` uniform that receives the animated color.
    #[arg(long, default_value = asteroids::frame::DEFAULT_COLOR_UNIFORM)]
    uniform: String,

    /// Window title.
    #[arg(long, default_value = "Asteroids")]
    title: String,
}

/// Everything that can stop the program, mapped to an exit code.
#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("failed to load OpenGL: {0}")]
    Loader(#[from] GlError),

    #[error(transparent)]
    Setup(Error),

    #[error(transparent)]
    Frame(Error),
}

impl Failure {
    fn code(&self) -> u8 {
        match self {
            Failure::Window(_) => 1,
            Failure::Loader(_) => 2,
            Failure::Setup(_) => 3,
            Failure::Frame(_) => 4,
        }
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialise_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            tracing::error!("{failure}");
            failure.exit_code()
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Failure> {
    let window_config = WindowConfig {
        title: cli.title,
        width: cli.width,
        height: cli.height,
        mode: if cli.windowed {
            WindowMode::Windowed
        } else {
            WindowMode::Fullscreen
        },
        pacing: FramePacing::from_interval(cli.swap_interval),
    };

    let surface = GlutinSurface::new(&window_config)?;

    // SAFETY: `surface` keeps the context current, and it outlives every GPU object because
    // the frame loop drops them first.
    let context = Rc::new(unsafe { GlContext::load(|symbol| surface.get_proc_address(symbol))? });

    let program =
        asteroids::build_program_from_files(&context, &cli.vertex_shader, &cli.fragment_shader)
            .map_err(Failure::Setup)?;
    let geometry =
        geometry::upload(&context, &QUAD_VERTICES, &QUAD_INDICES).map_err(Failure::Setup)?;

    let frame_config = FrameLoopConfig {
        color_uniform: cli.uniform,
        step: cli.step,
    };
    let frame_loop = FrameLoop::new(context, surface, program, geometry, &frame_config)
        .map_err(Failure::Setup)?;

    let summary = frame_loop.run().map_err(Failure::Frame)?;
    tracing::info!("drew {} frames", summary.frames);

    Ok(())
}
