//! Device-side buffer objects.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::device::GraphicsDevice;
use crate::types::BufferDescriptor;

/// Uploaded copy of one node buffer.
///
/// Created by [`GraphicsDevice::create_buffer`] and filled through
/// [`GraphicsDevice::write_buffer`] from the thread that owns the device.
/// Dropping the last `Arc` frees the storage; the device only keeps a weak
/// reference for leak checks.
pub struct Buffer {
    device: Weak<GraphicsDevice>,
    descriptor: BufferDescriptor,
    contents: Mutex<Vec<u8>>,
    uploads: AtomicU32,
}

impl Buffer {
    pub(crate) fn new(device: Weak<GraphicsDevice>, descriptor: BufferDescriptor) -> Self {
        Self {
            device,
            descriptor,
            contents: Mutex::new(vec![0; descriptor.size as usize]),
            uploads: AtomicU32::new(0),
        }
    }

    /// The device that created the buffer, while it is alive.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    pub fn label(&self) -> &'static str {
        self.descriptor.label
    }

    /// Number of uploads written into this buffer object.
    pub fn upload_count(&self) -> u32 {
        self.uploads.load(Ordering::Relaxed)
    }

    /// Copy of the uploaded bytes.
    pub fn read_contents(&self) -> Vec<u8> {
        self.contents.lock().clone()
    }

    /// Bounds are checked by the device.
    pub(crate) fn write(&self, offset: usize, data: &[u8]) {
        let mut contents = self.contents.lock();
        if let Some(dst) = contents.get_mut(offset..offset + data.len()) {
            dst.copy_from_slice(data);
            self.uploads.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("label", &self.descriptor.label)
            .field("size", &self.descriptor.size)
            .field("uploads", &self.upload_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(Buffer: Send, Sync);
