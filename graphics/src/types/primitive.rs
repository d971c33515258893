//! Primitive topology and resource identity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Primitive topology of a batch or index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimType {
    Triangles,
    Lines,
}

impl PrimType {
    /// Vertices per primitive.
    pub fn vertices_per_primitive(&self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Lines => 2,
        }
    }
}

/// Process-unique identity of a host buffer object.
///
/// Batches reference buffers by id; a rebuilt-in-place buffer keeps its id,
/// a newly built one gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}
