//! Graphics device.
//!
//! The [`GraphicsDevice`] owns device-side buffer objects and the shared
//! vertex format registry. Buffer population happens on worker threads
//! without touching the device; only [`NodeBuffers::update_flush`] uploads
//! through it.
//!
//! [`NodeBuffers::update_flush`]: crate::NodeBuffers::update_flush

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use pbvh_core::custom_data::CustomData;

use crate::error::GraphicsError;
use crate::pbvh::BuildContext;
use crate::registry::{FormatConfig, FormatRegistry, PbvhVertexFormat};
use crate::resources::Buffer;
use crate::types::BufferDescriptor;

/// Limits that node builds and uploads are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Largest host or device buffer, in bytes. Node builds that would
    /// exceed it report [`BuildOutcome::MapFailed`](crate::BuildOutcome).
    pub max_buffer_size: u64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_buffer_size: 1 << 30,
        }
    }
}

/// Owner of uploaded node buffers and the shared vertex format.
///
/// The device is shared between threads, but the format registry must be brought up to date with
/// [`update_attribute_names`](Self::update_attribute_names) before node
/// builds fan out. Builders read the format through a [`BuildContext`]
/// snapshot and never take the registry lock.
///
/// # Example
///
/// ```ignore
/// let device = GraphicsDevice::new("sculpt");
/// device.update_attribute_names(Some(&mesh.vdata), Some(&mesh.ldata), false);
/// let ctx = device.build_context()?;
/// node.update(&ctx, &geometry, &settings);
/// node.update_flush(&device);
/// ```
pub struct GraphicsDevice {
    name: String,
    capabilities: DeviceCapabilities,
    // live allocations, for leak checks
    buffers: RwLock<Vec<Weak<Buffer>>>,
    registry: RwLock<FormatRegistry>,
}

impl GraphicsDevice {
    /// Create a device with default capabilities.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_capabilities(name, DeviceCapabilities::default())
    }

    /// Create a device with explicit capabilities.
    pub fn with_capabilities(
        name: impl Into<String>,
        capabilities: DeviceCapabilities,
    ) -> Arc<Self> {
        let name = name.into();
        log::debug!(
            "GraphicsDevice: created '{}' (max buffer size {})",
            name,
            capabilities.max_buffer_size
        );
        Arc::new(Self {
            name,
            capabilities,
            buffers: RwLock::new(Vec::new()),
            registry: RwLock::new(FormatRegistry::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Allocate a zero-filled buffer object for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ZeroSizedBuffer`] or
    /// [`GraphicsError::BufferTooLarge`] when the size is out of range.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        let max = self.capabilities.max_buffer_size;
        match descriptor.size {
            0 => return Err(GraphicsError::ZeroSizedBuffer),
            size if size > max => return Err(GraphicsError::BufferTooLarge { size, max }),
            _ => {}
        }

        let buffer = Arc::new(Buffer::new(Arc::downgrade(self), *descriptor));
        self.buffers.write().push(Arc::downgrade(&buffer));
        log::trace!(
            "GraphicsDevice '{}': allocated '{}' ({} bytes)",
            self.name,
            descriptor.label,
            descriptor.size
        );
        Ok(buffer)
    }

    /// Upload `data` into `buffer` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::WriteOutOfBounds`] if the range does not fit
    /// and [`GraphicsError::DeviceLost`] if the buffer's device is gone.
    pub fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if buffer.device().is_none() {
            return Err(GraphicsError::DeviceLost);
        }
        let len = data.len() as u64;
        let size = buffer.size();
        if offset.checked_add(len).is_none_or(|end| end > size) {
            return Err(GraphicsError::WriteOutOfBounds { offset, len, size });
        }
        buffer.write(offset as usize, data);
        Ok(())
    }

    /// Number of allocations still referenced by a node.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Forget allocations whose last reference was dropped.
    pub fn cleanup_dead_resources(&self) {
        self.buffers.write().retain(|w| w.strong_count() > 0);
    }

    // --- Vertex format registry ---

    /// Bring the shared vertex format in line with the given attribute layers.
    ///
    /// Returns the current format unchanged when the layer configuration did
    /// not change. Keeps the quantized setting of the current format.
    pub fn update_attribute_names(
        &self,
        vdata: Option<&CustomData>,
        ldata: Option<&CustomData>,
        active_only: bool,
    ) -> Arc<PbvhVertexFormat> {
        let mut registry = self.registry.write();
        let quantized = registry
            .current()
            .is_some_and(|format| format.is_quantized());
        registry.ensure(
            FormatConfig::from_custom_data(vdata, ldata, active_only).with_quantized(quantized),
        )
    }

    /// Make `config` the shared vertex format configuration.
    pub fn ensure_format(&self, config: FormatConfig) -> Arc<PbvhVertexFormat> {
        self.registry.write().ensure(config)
    }

    /// Drop the shared format. Builds fail to start until it is rebuilt.
    pub fn invalidate_format(&self) {
        self.registry.write().invalidate();
    }

    /// The current shared format, if one was built.
    pub fn vertex_format(&self) -> Option<Arc<PbvhVertexFormat>> {
        self.registry.read().current()
    }

    /// Number of times the shared format was rebuilt.
    pub fn format_rebuild_count(&self) -> u64 {
        self.registry.read().rebuild_count()
    }

    /// Snapshot the state node builds need before fanning out.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::FormatMissing`] if no vertex format has
    /// been built yet.
    pub fn build_context(&self) -> Result<BuildContext, GraphicsError> {
        let format = self.vertex_format().ok_or(GraphicsError::FormatMissing)?;
        Ok(BuildContext::new(format, self.capabilities.max_buffer_size))
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
