//! Device-side copies of a node's buffers.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::index_buffer::IndexBuffer;
use crate::resources::Buffer;
use crate::types::BufferDescriptor;
use crate::vertex_buffer::VertexBuffer;

/// Buffer objects holding the uploaded data of one node.
///
/// Index slots follow the order triangles, triangles fast, lines, lines fast.
#[derive(Debug, Default)]
pub(crate) struct DeviceBuffers {
    vertex: Option<Arc<Buffer>>,
    index: [Option<Arc<Buffer>>; 4],
}

impl DeviceBuffers {
    pub fn vertex(&self) -> Option<&Arc<Buffer>> {
        self.vertex.as_ref()
    }

    /// Upload every dirty host buffer.
    ///
    /// Device buffers are created on first use and recreated when the size
    /// changes. A host buffer stays dirty if its upload fails.
    pub fn upload(
        &mut self,
        device: &Arc<GraphicsDevice>,
        vbo: Option<&mut VertexBuffer>,
        ibos: [Option<&mut IndexBuffer>; 4],
    ) -> Result<(), GraphicsError> {
        let mut result = Ok(());

        if let Some(vbo) = vbo.filter(|vbo| vbo.is_dirty()) {
            if let Some(data) = vbo.data() {
                let descriptor = BufferDescriptor::for_vertices(data);
                match write(device, &mut self.vertex, descriptor, data) {
                    Ok(()) => vbo.mark_uploaded(),
                    Err(err) => result = Err(err),
                }
            }
        }

        for (slot, ibo) in self.index.iter_mut().zip(ibos) {
            let Some(ibo) = ibo else {
                *slot = None;
                continue;
            };
            if !ibo.is_dirty() {
                continue;
            }
            if ibo.is_empty() {
                *slot = None;
                ibo.mark_uploaded();
                continue;
            }
            let descriptor = BufferDescriptor::for_indices(ibo.indices());
            match write(device, slot, descriptor, bytemuck::cast_slice(ibo.indices())) {
                Ok(()) => ibo.mark_uploaded(),
                Err(err) => result = Err(err),
            }
        }

        result
    }

    pub fn release(&mut self) {
        self.vertex = None;
        self.index = Default::default();
    }
}

fn write(
    device: &Arc<GraphicsDevice>,
    slot: &mut Option<Arc<Buffer>>,
    descriptor: BufferDescriptor,
    data: &[u8],
) -> Result<(), GraphicsError> {
    if !slot
        .as_ref()
        .is_some_and(|buffer| descriptor.fits(buffer.descriptor()))
    {
        log::debug!(
            "DeviceBuffers: creating '{}' of {} bytes",
            descriptor.label,
            descriptor.size
        );
        *slot = Some(device.create_buffer(&descriptor)?);
    }
    slot.as_ref()
        .map_or(Ok(()), |buffer| device.write_buffer(buffer, 0, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceCapabilities;
    use crate::index_buffer::IndexBufferBuilder;
    use crate::types::PrimType;

    #[test]
    fn test_upload_and_reuse() {
        let device = GraphicsDevice::new("test");
        let mut buffers = DeviceBuffers::default();

        let mut builder = IndexBufferBuilder::new(PrimType::Lines, 1, 2);
        builder.add_line(0, 1);
        let mut ibo = builder.build();

        buffers
            .upload(&device, None, [None, None, Some(&mut ibo), None])
            .unwrap();
        assert!(!ibo.is_dirty());
        let uploaded = Arc::clone(buffers.index[2].as_ref().unwrap());
        assert_eq!(uploaded.read_contents(), vec![0, 0, 0, 0, 1, 0, 0, 0]);

        // Same size rebuilds reuse the device buffer.
        let mut builder = IndexBufferBuilder::new(PrimType::Lines, 1, 3);
        builder.add_line(1, 2);
        builder.build_in_place(&mut ibo);
        buffers
            .upload(&device, None, [None, None, Some(&mut ibo), None])
            .unwrap();
        assert!(Arc::ptr_eq(&uploaded, buffers.index[2].as_ref().unwrap()));
        assert_eq!(uploaded.upload_count(), 2);

        buffers.release();
        drop(uploaded);
        device.cleanup_dead_resources();
        assert_eq!(device.buffer_count(), 0);
    }

    #[test]
    fn test_failed_upload_stays_dirty() {
        let device = GraphicsDevice::with_capabilities(
            "tiny",
            DeviceCapabilities { max_buffer_size: 4 },
        );
        let mut buffers = DeviceBuffers::default();
        let mut builder = IndexBufferBuilder::new(PrimType::Lines, 1, 2);
        builder.add_line(0, 1);
        let mut ibo = builder.build();
        assert!(buffers
            .upload(&device, None, [None, None, Some(&mut ibo), None])
            .is_err());
        assert!(ibo.is_dirty());
    }
}
