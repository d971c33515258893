//! Draw batches.
//!
//! A batch pairs a vertex buffer with an optional index buffer. It refers to
//! both by [`ResourceId`], so a buffer rebuilt in place keeps its batches
//! while a replaced buffer leaves them stale.

use crate::index_buffer::IndexBuffer;
use crate::types::{PrimType, ResourceId};
use crate::vertex_buffer::VertexBuffer;

/// A cached vertex/index buffer pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    prim: PrimType,
    vertex: ResourceId,
    index: Option<ResourceId>,
}

impl Batch {
    pub(crate) fn new(prim: PrimType, vbo: &VertexBuffer, ibo: Option<&IndexBuffer>) -> Self {
        Self {
            prim,
            vertex: vbo.id(),
            index: ibo.map(IndexBuffer::id),
        }
    }

    pub fn prim_type(&self) -> PrimType {
        self.prim
    }

    pub fn vertex_id(&self) -> ResourceId {
        self.vertex
    }

    pub fn index_id(&self) -> Option<ResourceId> {
        self.index
    }

    /// Whether the batch still refers to exactly these buffers.
    pub(crate) fn matches(&self, vbo: &VertexBuffer, ibo: Option<&IndexBuffer>) -> bool {
        self.vertex == vbo.id() && self.index == ibo.map(IndexBuffer::id)
    }
}

/// What the render layer draws for one node.
///
/// Returned by [`NodeBuffers::get_batch`](crate::NodeBuffers::get_batch);
/// nodes without visible primitives yield an empty draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawBatch {
    pub prim: PrimType,
    pub vertex: Option<ResourceId>,
    pub index: Option<ResourceId>,
    pub prim_count: usize,
}

impl DrawBatch {
    pub fn empty(prim: PrimType) -> Self {
        Self {
            prim,
            vertex: None,
            index: None,
            prim_count: 0,
        }
    }

    pub(crate) fn resolve(batch: &Batch, vbo: &VertexBuffer, ibo: Option<&IndexBuffer>) -> Self {
        let prim_count = match ibo {
            Some(ibo) => ibo.prim_count(),
            None => vbo.vertex_len() / batch.prim.vertices_per_primitive(),
        };
        Self {
            prim: batch.prim,
            vertex: Some(batch.vertex),
            index: batch.index,
            prim_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prim_count == 0
    }
}
