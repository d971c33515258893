//! Objects allocated by a [`GraphicsDevice`](crate::GraphicsDevice).

mod buffer;

pub use buffer::Buffer;
