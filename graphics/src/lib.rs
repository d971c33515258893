//! Draw-buffer builders for sculpt-mode bounding volume hierarchies.
//!
//! Each leaf of the hierarchy owns a [`NodeBuffers`] that turns its slice of
//! a static mesh, a set of multiresolution grids or a dynamic-topology table
//! into interleaved vertices, index lists and draw batches. Builds run on
//! worker threads ([`update_nodes_parallel`]); uploads to the
//! [`GraphicsDevice`] happen afterwards on the owning thread.
//!
//! ```ignore
//! use pbvh_gpu::{GraphicsDevice, NodeBuffers, NodeGeometry, UpdateSettings};
//!
//! let device = GraphicsDevice::new("sculpt");
//! device.update_attribute_names(Some(&mesh.vdata), Some(&mesh.ldata), false);
//! let ctx = device.build_context()?;
//!
//! let mut node = NodeBuffers::for_mesh(&mesh.view(), &faces);
//! let geometry = NodeGeometry::Mesh { mesh: mesh.view(), faces: &faces };
//! node.update(&ctx, &geometry, &UpdateSettings::new());
//! node.update_flush(&device);
//! let batch = node.get_batch(false, false);
//! ```

pub mod batch;
pub mod device;
pub mod error;
pub mod index_buffer;
pub mod pbvh;
pub mod registry;
pub mod resources;
pub mod types;
pub mod vertex_buffer;

pub use batch::{Batch, DrawBatch};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use index_buffer::{IndexBuffer, IndexBufferBuilder};
pub use pbvh::{
    BuildContext, BuildOutcome, NodeBuffers, NodeGeometry, NodeJob, UpdateFlags, UpdateSettings,
    update_nodes_parallel,
};
pub use registry::{FormatConfig, PbvhVertexFormat, UvLayerInfo};
pub use resources::Buffer;
pub use types::{BufferDescriptor, BufferUsage, PrimType, ResourceId};
pub use vertex_buffer::{AttrCursor, VertexBuffer, VertexWriter};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
