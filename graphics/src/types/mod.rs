//! Plain value types shared by node buffers, device buffers and batches.

mod buffer;
mod primitive;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use primitive::{PrimType, ResourceId};
