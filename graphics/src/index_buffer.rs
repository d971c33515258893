//! Host-side index buffers.

use crate::types::{PrimType, ResourceId};

/// Index list of one primitive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBuffer {
    id: ResourceId,
    prim: PrimType,
    indices: Vec<u32>,
    dirty: bool,
}

impl IndexBuffer {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn prim_type(&self) -> PrimType {
        self.prim
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of complete primitives.
    pub fn prim_count(&self) -> usize {
        self.indices.len() / self.prim.vertices_per_primitive()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether the indices changed since the last upload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_uploaded(&mut self) {
        self.dirty = false;
    }
}

/// Accumulates primitives for an [`IndexBuffer`].
///
/// Indices are checked against `vertex_len` in debug builds.
#[derive(Debug)]
pub struct IndexBufferBuilder {
    prim: PrimType,
    vertex_len: u32,
    indices: Vec<u32>,
}

impl IndexBufferBuilder {
    /// Start a builder with room for `prim_count` primitives.
    pub fn new(prim: PrimType, prim_count: usize, vertex_len: u32) -> Self {
        Self {
            prim,
            vertex_len,
            indices: Vec::with_capacity(prim_count * prim.vertices_per_primitive()),
        }
    }

    pub fn add_tri(&mut self, v1: u32, v2: u32, v3: u32) {
        debug_assert_eq!(self.prim, PrimType::Triangles);
        debug_assert!(v1 < self.vertex_len && v2 < self.vertex_len && v3 < self.vertex_len);
        self.indices.extend_from_slice(&[v1, v2, v3]);
    }

    pub fn add_line(&mut self, v1: u32, v2: u32) {
        debug_assert_eq!(self.prim, PrimType::Lines);
        debug_assert!(v1 < self.vertex_len && v2 < self.vertex_len);
        self.indices.extend_from_slice(&[v1, v2]);
    }

    /// Number of primitives added so far.
    pub fn prim_count(&self) -> usize {
        self.indices.len() / self.prim.vertices_per_primitive()
    }

    /// Finish into a new index buffer with a fresh id.
    pub fn build(self) -> IndexBuffer {
        IndexBuffer {
            id: ResourceId::next(),
            prim: self.prim,
            indices: self.indices,
            dirty: true,
        }
    }

    /// Finish into an existing index buffer, keeping its id.
    pub fn build_in_place(self, buffer: &mut IndexBuffer) {
        buffer.prim = self.prim;
        buffer.indices = self.indices;
        buffer.dirty = true;
    }

    /// Finish into `slot`, reusing the buffer already there.
    pub fn build_into(self, slot: &mut Option<IndexBuffer>) {
        match slot {
            Some(buffer) => self.build_in_place(buffer),
            None => *slot = Some(self.build()),
        }
    }
}
