//! Per-node draw buffers of a sculpt bounding volume hierarchy.
//!
//! Each hierarchy node owns one [`NodeBuffers`]. An update streams the
//! node's visible geometry into host-side vertex and index buffers without
//! touching the device, so nodes can be rebuilt on worker threads (see
//! [`update_nodes_parallel`]). [`NodeBuffers::update_flush`] later uploads
//! the result from the thread that owns the [`GraphicsDevice`].
//!
//! Three geometry sources are supported, selected by [`NodeGeometry`]:
//!
//! - static meshes, one vertex per visible triangle corner
//! - multiresolution grids, shared (smooth) or per-subface (flat) vertices
//!   plus coarse "fast" corner buffers
//! - dynamic topology, indexed or flat, with an optional fan encoding of
//!   vertex colors

mod dyntopo;
mod grids;
mod mesh;
mod parallel;
mod residency;
mod settings;

use std::sync::Arc;

use pbvh_core::custom_data::CustomData;
use pbvh_core::geometry::{DyntopoView, GridsView, MeshView};
use pbvh_core::math::{Bounds, Mat4};
use pbvh_core::sampling::{WHITE_COLOR, loop_color_to_u16, prop_color_to_u16};

use crate::batch::{Batch, DrawBatch};
use crate::device::GraphicsDevice;
use crate::index_buffer::IndexBuffer;
use crate::registry::PbvhVertexFormat;
use crate::types::PrimType;
use crate::vertex_buffer::{VertexBuffer, VertexWriter};

pub use parallel::{NodeJob, update_nodes_parallel};
use residency::DeviceBuffers;
pub use settings::{UpdateFlags, UpdateSettings};

/// Shared state a node build reads.
///
/// Taken from [`GraphicsDevice::build_context`] once per update pass, before
/// builds fan out to worker threads.
#[derive(Debug, Clone)]
pub struct BuildContext {
    format: Arc<PbvhVertexFormat>,
    max_buffer_size: u64,
}

impl BuildContext {
    pub(crate) fn new(format: Arc<PbvhVertexFormat>, max_buffer_size: u64) -> Self {
        Self {
            format,
            max_buffer_size,
        }
    }

    pub fn format(&self) -> &Arc<PbvhVertexFormat> {
        &self.format
    }

    pub fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }
}

/// Result of a node update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Buffers were rewritten.
    Updated,
    /// Nothing visible; the node draws nothing.
    Empty,
    /// Storage could not be allocated; previous contents were kept.
    MapFailed,
}

/// Borrowed geometry of one node.
#[derive(Debug, Clone, Copy)]
pub enum NodeGeometry<'a> {
    Mesh {
        mesh: MeshView<'a>,
        /// Loop triangle indices of the node
        faces: &'a [u32],
    },
    Grids {
        grids: GridsView<'a>,
        /// Grid indices of the node
        grid_indices: &'a [u32],
    },
    Dyntopo {
        view: DyntopoView<'a>,
        smooth: bool,
    },
}

/// Draw buffers of one hierarchy node.
#[derive(Debug, Default)]
pub struct NodeBuffers {
    vert_buf: Option<VertexBuffer>,
    index_buf: Option<IndexBuffer>,
    index_buf_fast: Option<IndexBuffer>,
    index_lines_buf: Option<IndexBuffer>,
    index_lines_buf_fast: Option<IndexBuffer>,

    triangles: Option<Batch>,
    triangles_fast: Option<Batch>,
    lines: Option<Batch>,
    lines_fast: Option<Batch>,

    tot_tri: usize,
    tot_quad: usize,
    material_index: u16,
    smooth: bool,
    show_overlay: bool,
    use_bmesh: bool,
    clear_on_flush: bool,
    extra_matrix: Option<Mat4>,

    device: DeviceBuffers,
}

impl NodeBuffers {
    /// Buffers for a static mesh node.
    ///
    /// Counts the visible triangles and builds the wireframe right away;
    /// vertex data is written by [`update`](Self::update).
    pub fn for_mesh(mesh: &MeshView<'_>, faces: &[u32]) -> Self {
        let mut buffers = Self::default();
        buffers.build_mesh_topology(mesh, faces);
        buffers
    }

    /// Buffers for a multiresolution grid node.
    pub fn for_grids() -> Self {
        Self::default()
    }

    /// Buffers for a dynamic-topology node.
    pub fn for_dyntopo(smooth: bool) -> Self {
        Self {
            smooth,
            show_overlay: true,
            use_bmesh: true,
            ..Self::default()
        }
    }

    /// Rewrite the buffers from `geometry`.
    ///
    /// Never touches the device. Safe to call from a worker thread as long as
    /// each node is updated by one thread at a time.
    pub fn update(
        &mut self,
        ctx: &BuildContext,
        geometry: &NodeGeometry<'_>,
        settings: &UpdateSettings,
    ) -> BuildOutcome {
        let outcome = match geometry {
            NodeGeometry::Mesh { mesh, faces } => self.update_mesh(ctx, mesh, faces, settings),
            NodeGeometry::Grids {
                grids,
                grid_indices,
            } => self.update_grids(ctx, grids, grid_indices, settings),
            NodeGeometry::Dyntopo { view, smooth } => {
                self.update_dyntopo(ctx, view, *smooth, settings)
            }
        };

        match outcome {
            BuildOutcome::Updated => self.update_batches(),
            BuildOutcome::Empty => self.show_overlay = false,
            BuildOutcome::MapFailed => {
                log::warn!("NodeBuffers: vertex buffer allocation failed, keeping previous data")
            }
        }
        outcome
    }

    /// Batch to draw.
    ///
    /// Falls back to the full-resolution batch when no fast batch exists.
    /// Nodes without visible primitives return an empty draw.
    pub fn get_batch(&self, fast: bool, wires: bool) -> DrawBatch {
        let prim = if wires {
            PrimType::Lines
        } else {
            PrimType::Triangles
        };

        let (batch, ibo) = match (fast, wires) {
            (true, false) if self.triangles_fast.is_some() => {
                (&self.triangles_fast, &self.index_buf_fast)
            }
            (_, false) => (&self.triangles, &self.index_buf),
            (true, true) if self.lines_fast.is_some() => {
                (&self.lines_fast, &self.index_lines_buf_fast)
            }
            (_, true) => (&self.lines, &self.index_lines_buf),
        };

        match (batch, &self.vert_buf) {
            (Some(batch), Some(vbo)) if self.tot_tri > 0 => {
                DrawBatch::resolve(batch, vbo, ibo.as_ref())
            }
            _ => DrawBatch::empty(prim),
        }
    }

    /// Upload written data, or release everything if the node went empty.
    ///
    /// Must run on the thread that owns `device`. Upload errors are logged
    /// and the data stays dirty so the next flush retries.
    pub fn update_flush(&mut self, device: &Arc<GraphicsDevice>) {
        if self.clear_on_flush {
            log::debug!("NodeBuffers: clear on flush");
            self.clear_all();
            self.clear_on_flush = false;
            return;
        }

        if let Err(err) = self.device.upload(
            device,
            self.vert_buf.as_mut(),
            [
                self.index_buf.as_mut(),
                self.index_buf_fast.as_mut(),
                self.index_lines_buf.as_mut(),
                self.index_lines_buf_fast.as_mut(),
            ],
        ) {
            log::warn!("NodeBuffers: upload failed: {err}");
        }
    }

    /// Release all buffers and batches.
    pub fn free(mut self) {
        self.clear_all();
    }

    fn clear_all(&mut self) {
        self.discard_batches();
        self.discard_index_buffers();
        self.vert_buf = None;
        self.device.release();
    }

    pub(crate) fn discard_batches(&mut self) {
        self.triangles = None;
        self.triangles_fast = None;
        self.lines = None;
        self.lines_fast = None;
    }

    pub(crate) fn discard_index_buffers(&mut self) {
        self.index_buf = None;
        self.index_buf_fast = None;
        self.index_lines_buf = None;
        self.index_lines_buf_fast = None;
    }

    /// Rebuild batches whose buffers were replaced; drop batches whose index
    /// buffer is gone. The triangle batch draws non-indexed without one.
    fn update_batches(&mut self) {
        let Some(vbo) = &self.vert_buf else {
            self.discard_batches();
            return;
        };
        ensure_batch(
            &mut self.triangles,
            PrimType::Triangles,
            vbo,
            self.index_buf.as_ref(),
            false,
        );
        ensure_batch(
            &mut self.triangles_fast,
            PrimType::Triangles,
            vbo,
            self.index_buf_fast.as_ref(),
            true,
        );
        ensure_batch(
            &mut self.lines,
            PrimType::Lines,
            vbo,
            self.index_lines_buf.as_ref(),
            true,
        );
        ensure_batch(
            &mut self.lines_fast,
            PrimType::Lines,
            vbo,
            self.index_lines_buf_fast.as_ref(),
            true,
        );
    }

    /// Size the vertex buffer, keeping the current one on failure.
    fn alloc_vertices(&mut self, ctx: &BuildContext, vertex_len: usize) -> bool {
        let vbo = self
            .vert_buf
            .get_or_insert_with(|| VertexBuffer::new(Arc::clone(&ctx.format)));
        vbo.data_alloc(&ctx.format, vertex_len, ctx.max_buffer_size)
    }

    /// Start writing the vertex buffer, quantizing positions into `bounds`
    /// when the format asks for it.
    fn vertex_writer(
        &mut self,
        ctx: &BuildContext,
        bounds: Option<Bounds>,
    ) -> Option<VertexWriter<'_>> {
        let bounds = bounds.filter(|_| ctx.format.is_quantized());
        self.extra_matrix = bounds.map(|b| b.from_unit_matrix());
        self.vert_buf
            .as_mut()?
            .writer(bounds.map(|b| b.to_unit_matrix()))
    }

    // --- Accessors ---

    pub fn tot_tri(&self) -> usize {
        self.tot_tri
    }

    /// Visible grid subfaces; zero for other sources.
    pub fn tot_quad(&self) -> usize {
        self.tot_quad
    }

    pub fn material_index(&self) -> u16 {
        self.material_index
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    /// Whether a mask or face set overlay needs drawing.
    pub fn show_overlay(&self) -> bool {
        self.show_overlay
    }

    pub fn use_bmesh(&self) -> bool {
        self.use_bmesh
    }

    pub fn clear_on_flush(&self) -> bool {
        self.clear_on_flush
    }

    /// Maps quantized positions back to object space; `None` for float
    /// positions.
    pub fn extra_matrix(&self) -> Option<&Mat4> {
        self.extra_matrix.as_ref()
    }

    pub fn vertex_buffer(&self) -> Option<&VertexBuffer> {
        self.vert_buf.as_ref()
    }

    pub fn triangle_index_buffer(&self, fast: bool) -> Option<&IndexBuffer> {
        if fast {
            self.index_buf_fast.as_ref()
        } else {
            self.index_buf.as_ref()
        }
    }

    pub fn line_index_buffer(&self, fast: bool) -> Option<&IndexBuffer> {
        if fast {
            self.index_lines_buf_fast.as_ref()
        } else {
            self.index_lines_buf.as_ref()
        }
    }

    /// Whether any batch is cached.
    pub fn has_batches(&self) -> bool {
        self.triangles.is_some()
            || self.triangles_fast.is_some()
            || self.lines.is_some()
            || self.lines_fast.is_some()
    }

    /// Device-side vertex buffer, after a successful flush.
    pub fn device_vertex_buffer(&self) -> Option<&Arc<crate::resources::Buffer>> {
        self.device.vertex()
    }
}

fn ensure_batch(
    slot: &mut Option<Batch>,
    prim: PrimType,
    vbo: &VertexBuffer,
    ibo: Option<&IndexBuffer>,
    needs_index: bool,
) {
    if needs_index && ibo.is_none() {
        *slot = None;
        return;
    }
    if !slot.is_some_and(|batch| batch.matches(vbo, ibo)) {
        *slot = Some(Batch::new(prim, vbo, ibo));
    }
}

/// Write one color per slot of `writer`.
///
/// Slots backed by a float color layer of `vdata` sample vertex `v`. When no
/// float layer is sampled, slot 0 falls back to the legacy corner color of
/// `ldata` at `loop_index`. Everything else is white.
pub(crate) fn write_vertex_colors(
    writer: &mut VertexWriter<'_>,
    format: &PbvhVertexFormat,
    vdata: Option<&CustomData>,
    ldata: Option<(&CustomData, usize)>,
    v: usize,
) {
    let mut sampled = false;
    let mut colors = [WHITE_COLOR; pbvh_core::custom_data::MAX_MCOL];
    for (slot, color) in colors.iter_mut().enumerate().take(writer.color_slots()) {
        let value = vdata.and_then(|vdata| {
            let layer = format.color_layer_index(slot)?;
            vdata.prop_color(layer)?.get(v).copied()
        });
        if let Some(value) = value {
            *color = prop_color_to_u16(value);
            sampled = true;
        }
    }

    if !sampled {
        if let Some(value) =
            ldata.and_then(|(ldata, l)| ldata.loop_colors().and_then(|c| c.get(l).copied()))
        {
            colors[0] = loop_color_to_u16(value);
        }
    }

    for (slot, color) in colors.iter().enumerate().take(writer.color_slots()) {
        writer.color(slot, *color);
    }
}

// Ensure NodeBuffers can be built on worker threads
static_assertions::assert_impl_all!(NodeBuffers: Send, Sync);
static_assertions::assert_impl_all!(BuildContext: Send, Sync);
