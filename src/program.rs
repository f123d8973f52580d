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

//! Program linking and uniform lookup.

use crate::gpu_backend::{GpuContext, Stage};
use crate::resources::{CallOnDrop, ProgramObject};
use crate::shader::{fetch_log, CompiledShader};
use crate::Error;

use std::fmt;
use std::rc::Rc;

/// A linked shader program.
///
/// A `Program` only exists once linking has succeeded, so any `Program` may be bound for
/// drawing. The GPU object is deleted on drop.
pub struct Program<C: GpuContext + ?Sized> {
    object: ProgramObject<C>,
    validated: bool,
}

impl<C: GpuContext + ?Sized> fmt::Debug for Program<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("object", &self.object)
            .field("validated", &self.validated)
            .finish()
    }
}

/// A uniform location resolved against a specific [`Program`].
pub struct UniformBinding<C: GpuContext + ?Sized> {
    name: String,
    program: C::Program,
    location: C::UniformLocation,
}

impl<C: GpuContext + ?Sized> fmt::Debug for UniformBinding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformBinding")
            .field("name", &self.name)
            .field("location", &self.location)
            .finish()
    }
}

impl<C: GpuContext + ?Sized> UniformBinding<C> {
    /// The name of the uniform.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C: GpuContext + ?Sized> Program<C> {
    /// Whether the driver accepted the program during validation.
    ///
    /// Validation is advisory; a program that failed validation can still be drawn with.
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Make this program current.
    pub fn bind(&self) {
        self.object.context().use_program(Some(self.object.resource()));
    }

    /// Resolve a uniform by name.
    pub fn uniform(&self, name: &str) -> Result<UniformBinding<C>, Error> {
        let program = self.object.resource();
        let location = self
            .object
            .context()
            .uniform_location(program, name)
            .ok_or_else(|| Error::UniformNotFound(name.to_owned()))?;

        tracing::debug!("resolved uniform `{name}` to {location:?}");
        Ok(UniformBinding {
            name: name.to_owned(),
            program,
            location,
        })
    }

    /// Push a `vec4` into a uniform of this program.
    ///
    /// The program must be bound.
    pub fn set_uniform_4f(&self, binding: &UniformBinding<C>, value: [f32; 4]) {
        debug_assert_eq!(
            binding.program,
            self.object.resource(),
            "uniform `{}` belongs to another program",
            binding.name
        );

        self.object
            .context()
            .uniform_4_f32(&binding.location, value);
    }
}

/// Link a vertex and a fragment shader into a program.
///
/// Both shaders are consumed. Whatever the outcome, they are detached and deleted before
/// this function returns.
pub fn link<C: GpuContext + ?Sized>(
    context: &Rc<C>,
    vertex: CompiledShader<C>,
    fragment: CompiledShader<C>,
) -> Result<Program<C>, Error> {
    check_stage(&vertex, Stage::Vertex)?;
    check_stage(&fragment, Stage::Fragment)?;

    let object = ProgramObject::new(context)?;
    let program = object.resource();

    context.attach_shader(program, vertex.handle());
    context.attach_shader(program, fragment.handle());
    let _detach_shaders = CallOnDrop(|| {
        context.detach_shader(program, vertex.handle());
        context.detach_shader(program, fragment.handle());
    });

    context.link_program(program);

    if !context.program_link_status(program) {
        let length = context.program_info_log_length(program);
        let log = fetch_log(length, |length| context.program_info_log(program, length));
        return Err(Error::Link(log));
    }

    context.validate_program(program);
    let validated = context.program_validate_status(program);
    if !validated {
        let length = context.program_info_log_length(program);
        let log = fetch_log(length, |length| context.program_info_log(program, length));
        tracing::warn!("program {program:?} failed validation: {log}");
    }

    tracing::info!("linked program {program:?}");
    Ok(Program { object, validated })
}

fn check_stage<C: GpuContext + ?Sized>(
    shader: &CompiledShader<C>,
    expected: Stage,
) -> Result<(), Error> {
    if shader.stage() != expected {
        return Err(Error::Link(format!(
            "expected a {expected} shader, got a {} shader",
            shader.stage()
        )));
    }

    if let Some(log) = shader.diagnostic() {
        return Err(Error::Link(format!(
            "the {expected} shader did not compile: {log}"
        )));
    }

    Ok(())
}
