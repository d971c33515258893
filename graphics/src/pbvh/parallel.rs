//! Multi-node updates on the rayon thread pool.

use rayon::prelude::*;

use super::{BuildOutcome, NodeBuffers, NodeGeometry, UpdateSettings};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

/// One node to update.
pub struct NodeJob<'a> {
    pub buffers: &'a mut NodeBuffers,
    pub geometry: NodeGeometry<'a>,
}

impl<'a> NodeJob<'a> {
    pub fn new(buffers: &'a mut NodeBuffers, geometry: NodeGeometry<'a>) -> Self {
        Self { buffers, geometry }
    }
}

/// Update many nodes in parallel.
///
/// The vertex format is read from `device` once, before the fan-out; bring
/// it up to date with [`GraphicsDevice::update_attribute_names`] first.
/// Outcomes are returned in job order. Nothing is uploaded; call
/// [`NodeBuffers::update_flush`] on each node afterwards.
///
/// # Errors
///
/// Returns [`GraphicsError::FormatMissing`] if the device has no vertex
/// format.
pub fn update_nodes_parallel(
    device: &GraphicsDevice,
    jobs: &mut [NodeJob<'_>],
    settings: &UpdateSettings,
) -> Result<Vec<BuildOutcome>, GraphicsError> {
    let ctx = device.build_context()?;
    log::trace!("update_nodes_parallel: {} nodes", jobs.len());

    Ok(jobs
        .par_iter_mut()
        .map(|job| job.buffers.update(&ctx, &job.geometry, settings))
        .collect())
}
