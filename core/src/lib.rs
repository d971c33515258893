//! # PBVH Core
//!
//! GPU-agnostic building blocks for sculpt-mode draw buffers:
//!
//! - [`format`] - Interleaved vertex format descriptions
//! - [`custom_data`] - Per-element attribute layers (colors, masks, UVs, face sets)
//! - [`geometry`] - Read-only views over static meshes, multires grids and
//!   dynamic-topology tables
//! - [`sampling`] - Visibility tests and per-vertex attribute conversion
//!
//! Nothing in this crate touches a graphics device. The buffer builders in
//! `pbvh-gpu` consume these types from worker threads.

pub mod color;
pub mod custom_data;
pub mod format;
pub mod geometry;
pub mod math;
pub mod sampling;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
