//! Common utilities for node buffer integration tests.
//!
//! Fixtures build small meshes, grid sets and dynamic-topology strips, and
//! [`TestContext`] bundles a device with a ready vertex format.

#![allow(dead_code)]

use std::sync::Arc;

use pbvh_core::custom_data::CustomData;
use pbvh_core::geometry::{
    FaceHandle, GridKey, GridSet, Mesh, TopologyTable, TriBuffer,
};
use pbvh_gpu::{BuildContext, FormatConfig, GraphicsDevice, VertexBuffer};
use rustc_hash::FxHashSet;

// ============================================================================
// Test Context
// ============================================================================

/// A device with an initialized vertex format.
pub struct TestContext {
    pub device: Arc<GraphicsDevice>,
    pub ctx: BuildContext,
}

impl TestContext {
    /// Device with the format derived from the given layers.
    pub fn new(vdata: Option<&CustomData>, ldata: Option<&CustomData>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let device = GraphicsDevice::new("test");
        device.update_attribute_names(vdata, ldata, false);
        let ctx = device.build_context().unwrap();
        Self { device, ctx }
    }

    /// Device with the default format.
    pub fn plain() -> Self {
        Self::new(None, None)
    }

    /// Device with the quantized format.
    pub fn quantized() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let device = GraphicsDevice::new("test");
        device.ensure_format(FormatConfig::new().with_quantized(true));
        let ctx = device.build_context().unwrap();
        Self { device, ctx }
    }
}

// ============================================================================
// Mesh Fixtures
// ============================================================================

/// Two triangles sharing the edge 1-2.
pub fn two_triangles() -> Mesh {
    Mesh::from_polygons(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ],
        &[vec![0, 1, 2], vec![1, 3, 2]],
    )
}

/// An `n`×`n` quad plane in the XY plane.
pub fn plane(n: u32) -> Mesh {
    let mut positions = Vec::new();
    for y in 0..=n {
        for x in 0..=n {
            positions.push([x as f32, y as f32, 0.0]);
        }
    }
    let row = n + 1;
    let mut polys = Vec::new();
    for y in 0..n {
        for x in 0..n {
            let v = y * row + x;
            polys.push(vec![v, v + 1, v + row + 1, v + row]);
        }
    }
    Mesh::from_polygons(&positions, &polys)
}

/// All loop triangle indices of a mesh.
pub fn all_faces(mesh: &Mesh) -> Vec<u32> {
    (0..mesh.looptris.len() as u32).collect()
}

// ============================================================================
// Grid Fixtures
// ============================================================================

/// `count` visible grids of `size`×`size` elements.
pub fn grids(size: u32, count: usize) -> GridSet {
    GridSet::planar(GridKey::new(size).with_mask(true), count)
}

// ============================================================================
// Dynamic Topology Fixtures
// ============================================================================

/// Topology table, node face set and flattened triangles of one node.
pub struct DyntopoFixture {
    pub table: TopologyTable,
    pub faces: FxHashSet<FaceHandle>,
    pub tribuf: TriBuffer,
}

impl DyntopoFixture {
    /// A quad strip of `quads` quads split into triangles.
    pub fn strip(quads: u32) -> Self {
        let mut positions = Vec::new();
        for x in 0..=quads {
            positions.push([x as f32, 0.0, 0.0]);
            positions.push([x as f32, 1.0, 0.0]);
        }
        let mut tris = Vec::new();
        for q in 0..quads {
            let v = q * 2;
            tris.push([v, v + 2, v + 3]);
            tris.push([v, v + 3, v + 1]);
        }
        let table = TopologyTable::from_triangles(&positions, &tris);
        let faces = (0..table.faces.len() as u32).map(FaceHandle).collect();
        let mut fixture = Self {
            table,
            faces,
            tribuf: TriBuffer::default(),
        };
        fixture.retriangulate();
        fixture
    }

    /// Rebuild the flattened triangles after editing the table.
    pub fn retriangulate(&mut self) {
        self.tribuf = TriBuffer::from_faces(&self.table, &self.faces, 0);
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Unique undirected vertex-position edges drawn by a line index list.
pub fn unique_line_positions(vbo: &VertexBuffer, indices: &[u32]) -> usize {
    let pos = vbo.format().pos;
    let mut edges: Vec<([u32; 3], [u32; 3])> = indices
        .chunks(2)
        .map(|line| {
            let a = vbo.read::<[f32; 3]>(pos, line[0] as usize).unwrap().map(f32::to_bits);
            let b = vbo.read::<[f32; 3]>(pos, line[1] as usize).unwrap().map(f32::to_bits);
            if a <= b { (a, b) } else { (b, a) }
        })
        .collect();
    edges.sort_unstable();
    edges.dedup();
    edges.len()
}
