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

//! Uploading indexed geometry to the GPU.

use crate::gpu_backend::{BufferType, BufferUsage, GpuContext, Vertex};
use crate::resources::{BufferObject, CallOnDrop, VertexArrayObject};
use crate::Error;

use std::fmt;
use std::rc::Rc;

/// The corners of a quad centered on the origin.
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex::new(-0.5, -0.5),
    Vertex::new(0.5, -0.5),
    Vertex::new(0.5, 0.5),
    Vertex::new(-0.5, 0.5),
];

/// Two triangles covering [`QUAD_VERTICES`].
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Vertices and indices living in GPU memory, bound to a vertex array.
///
/// The buffers are never written again after [`upload`]. All three objects are deleted on
/// drop.
pub struct GeometryBuffer<C: GpuContext + ?Sized> {
    vao: VertexArrayObject<C>,
    vbo: BufferObject<C>,
    ebo: BufferObject<C>,
    vertex_count: usize,
    index_count: usize,
}

impl<C: GpuContext + ?Sized> fmt::Debug for GeometryBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryBuffer")
            .field("vao", &self.vao)
            .field("vbo", &self.vbo)
            .field("ebo", &self.ebo)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .finish()
    }
}

impl<C: GpuContext + ?Sized> GeometryBuffer<C> {
    /// The number of vertices in the vertex buffer.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// The number of indices in the index buffer.
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Draw every index as triangles.
    ///
    /// The program that consumes the geometry must already be bound.
    pub fn draw(&self) {
        let context = self.vao.context();

        context.bind_vertex_array(Some(self.vao.resource()));
        let _unbind_vao = CallOnDrop(|| {
            context.bind_vertex_array(None);
        });

        context.draw_elements(self.index_count);
    }
}

/// Check that every index refers to one of `vertex_count` vertices.
pub fn check_indices(vertex_count: usize, indices: &[u32]) -> Result<(), Error> {
    if indices.is_empty() {
        return Err(Error::InvalidGeometry("there are no indices to draw".into()));
    }

    match indices
        .iter()
        .enumerate()
        .find(|&(_, &index)| index as usize >= vertex_count)
    {
        Some((position, index)) => Err(Error::InvalidGeometry(format!(
            "index {index} at position {position} is out of range for {vertex_count} vertices"
        ))),
        None => Ok(()),
    }
}

/// Upload `vertices` and `indices` into new GPU buffers.
///
/// Indices are checked against the vertex count before anything is allocated. If any
/// allocation fails, the objects created so far are deleted and nothing stays bound.
pub fn upload<C: GpuContext + ?Sized>(
    context: &Rc<C>,
    vertices: &[Vertex],
    indices: &[u32],
) -> Result<GeometryBuffer<C>, Error> {
    check_indices(vertices.len(), indices)?;

    let vao = VertexArrayObject::new(context)?;
    let vbo = BufferObject::new(context)?;
    let ebo = BufferObject::new(context)?;

    {
        context.bind_vertex_array(Some(vao.resource()));
        let _unbind = CallOnDrop(|| {
            // The element buffer binding is part of the vertex array state, so only the
            // array buffer needs to be released once the array is unbound.
            context.bind_vertex_array(None);
            context.bind_buffer(BufferType::Vertex, None);
        });

        context.bind_buffer(BufferType::Vertex, Some(vbo.resource()));
        context.buffer_data(
            BufferType::Vertex,
            bytemuck::cast_slice(vertices),
            BufferUsage::Static,
        );

        context.bind_buffer(BufferType::Index, Some(ebo.resource()));
        context.buffer_data(
            BufferType::Index,
            bytemuck::cast_slice(indices),
            BufferUsage::Static,
        );

        context.vertex_attrib_pointer(Vertex::position_attribute());
    }

    tracing::debug!(
        "uploaded {} vertices and {} indices",
        vertices.len(),
        indices.len()
    );

    Ok(GeometryBuffer {
        vao,
        vbo,
        ebo,
        vertex_count: vertices.len(),
        index_count: indices.len(),
    })
}
