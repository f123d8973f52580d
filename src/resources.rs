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

//! Defines owning wrappers around GPU objects.

use crate::gpu_backend::{GpuContext, Stage};
use crate::Error;

use std::fmt;
use std::rc::Rc;

macro_rules! define_resource_wrappers {
    ($($name:ident($res:ident, $delete:ident)),* $(,)?) => {
        $(
            /// Deletes the underlying object when dropped.
            pub(crate) struct $name<C: GpuContext + ?Sized> {
                context: Rc<C>,
                resource: C::$res,
            }

            impl<C: GpuContext + ?Sized> fmt::Debug for $name<C> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_tuple(stringify!($name))
                        .field(&self.resource)
                        .finish()
                }
            }

            impl<C: GpuContext + ?Sized> $name<C> {
                pub(crate) fn from_raw(context: &Rc<C>, resource: C::$res) -> Self {
                    Self {
                        context: context.clone(),
                        resource,
                    }
                }

                pub(crate) fn resource(&self) -> C::$res {
                    self.resource
                }
            }

            impl<C: GpuContext + ?Sized> Drop for $name<C> {
                fn drop(&mut self) {
                    tracing::trace!("deleting {:?}", self.resource);
                    self.context.$delete(self.resource);
                }
            }
        )*
    };
}

define_resource_wrappers! {
    ShaderObject(Shader, delete_shader),
    ProgramObject(Program, delete_program),
    BufferObject(Buffer, delete_buffer),
    VertexArrayObject(VertexArray, delete_vertex_array),
}

impl<C: GpuContext + ?Sized> ShaderObject<C> {
    pub(crate) fn new(context: &Rc<C>, stage: Stage) -> Result<Self, Error> {
        let shader = context
            .create_shader(stage)
            .map_err(|e| Error::allocation("shader object", e))?;
        Ok(Self::from_raw(context, shader))
    }
}

impl<C: GpuContext + ?Sized> ProgramObject<C> {
    pub(crate) fn context(&self) -> &C {
        &self.context
    }

    pub(crate) fn new(context: &Rc<C>) -> Result<Self, Error> {
        let program = context
            .create_program()
            .map_err(|e| Error::allocation("program object", e))?;
        Ok(Self::from_raw(context, program))
    }
}

impl<C: GpuContext + ?Sized> BufferObject<C> {
    pub(crate) fn new(context: &Rc<C>) -> Result<Self, Error> {
        let buffer = context
            .create_buffer()
            .map_err(|e| Error::allocation("buffer object", e))?;
        Ok(Self::from_raw(context, buffer))
    }
}

impl<C: GpuContext + ?Sized> VertexArrayObject<C> {
    pub(crate) fn context(&self) -> &C {
        &self.context
    }

    pub(crate) fn new(context: &Rc<C>) -> Result<Self, Error> {
        let vertex_array = context
            .create_vertex_array()
            .map_err(|e| Error::allocation("vertex array object", e))?;
        Ok(Self::from_raw(context, vertex_array))
    }
}

/// Runs a closure when dropped.
pub(crate) struct CallOnDrop<F: FnMut()>(pub(crate) F);

impl<F: FnMut()> Drop for CallOnDrop<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}
