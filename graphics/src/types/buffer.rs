//! Device buffer descriptors.

use bitflags::bitflags;

bitflags! {
    /// How a device buffer is bound and filled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u8 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        /// Rewritten from host memory on every flush that finds it dirty
        const UPLOAD = 1 << 2;
    }
}

/// Size, binding and debug label of a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    pub label: &'static str,
    pub size: u64,
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Device copy of a node's interleaved vertex data.
    pub fn for_vertices(data: &[u8]) -> Self {
        Self {
            label: "pbvh vertices",
            size: data.len() as u64,
            usage: BufferUsage::VERTEX | BufferUsage::UPLOAD,
        }
    }

    /// Device copy of a node's 32-bit index list.
    pub fn for_indices(indices: &[u32]) -> Self {
        Self {
            label: "pbvh indices",
            size: std::mem::size_of_val(indices) as u64,
            usage: BufferUsage::INDEX | BufferUsage::UPLOAD,
        }
    }

    /// Whether an existing buffer of `other` can take this upload.
    pub fn fits(&self, other: &BufferDescriptor) -> bool {
        self.size == other.size && self.usage == other.usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        let desc = BufferDescriptor::for_indices(&[0, 1, 2]);
        assert_eq!(desc.size, 12);
        assert!(desc.usage.contains(BufferUsage::INDEX | BufferUsage::UPLOAD));

        let vertices = BufferDescriptor::for_vertices(&[0; 12]);
        assert!(!vertices.fits(&desc));
        assert!(desc.fits(&BufferDescriptor::for_indices(&[3, 4, 5])));
    }
}
