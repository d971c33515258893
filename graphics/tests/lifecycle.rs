//! Upload, release and multi-node update tests.

mod common;

use std::sync::Arc;

use common::{DyntopoFixture, TestContext, all_faces, grids, plane};
use pbvh_core::custom_data::{CustomData, CustomDataLayer, LayerData};
use pbvh_core::geometry::DyntopoView;
use pbvh_gpu::{
    BuildOutcome, GraphicsDevice, GraphicsError, NodeBuffers, NodeGeometry, NodeJob, PrimType,
    UpdateSettings, update_nodes_parallel,
};

// ============================================================================
// Flush
// ============================================================================

#[test]
fn test_flush_uploads_dirty_buffers() {
    let mesh = plane(2);
    let faces = all_faces(&mesh);
    let tc = TestContext::plain();
    let mut node = NodeBuffers::for_mesh(&mesh.view(), &faces);
    node.update(
        &tc.ctx,
        &NodeGeometry::Mesh {
            mesh: mesh.view(),
            faces: &faces,
        },
        &UpdateSettings::new(),
    );
    assert!(node.vertex_buffer().unwrap().is_dirty());
    assert!(node.device_vertex_buffer().is_none());

    node.update_flush(&tc.device);
    // Vertices and wireframe lines; triangles draw without indices.
    assert_eq!(tc.device.buffer_count(), 2);
    let vbo = node.vertex_buffer().unwrap();
    assert!(!vbo.is_dirty());
    assert!(!node.line_index_buffer(false).unwrap().is_dirty());

    let uploaded = node.device_vertex_buffer().unwrap();
    assert_eq!(uploaded.read_contents(), vbo.data().unwrap());
}

#[test]
fn test_flush_reuses_device_buffers() {
    let set = grids(3, 2);
    let tc = TestContext::plain();
    let mut node = NodeBuffers::for_grids();
    let geometry = NodeGeometry::Grids {
        grids: set.view(),
        grid_indices: &[0, 1],
    };

    node.update(&tc.ctx, &geometry, &UpdateSettings::new());
    node.update_flush(&tc.device);
    assert_eq!(tc.device.buffer_count(), 5);
    let first = Arc::clone(node.device_vertex_buffer().unwrap());

    node.update(&tc.ctx, &geometry, &UpdateSettings::new());
    node.update_flush(&tc.device);
    assert!(Arc::ptr_eq(&first, node.device_vertex_buffer().unwrap()));
    assert_eq!(tc.device.buffer_count(), 5);
}

#[test]
fn test_clear_on_flush_releases_everything() {
    let mut fixture = DyntopoFixture::strip(2);
    let tc = TestContext::plain();
    let mut node = NodeBuffers::for_dyntopo(true);
    let settings = UpdateSettings::new();

    let view = DyntopoView {
        table: &fixture.table,
        faces: &fixture.faces,
        tribuf: &fixture.tribuf,
    };
    node.update(&tc.ctx, &NodeGeometry::Dyntopo { view, smooth: true }, &settings);
    node.update_flush(&tc.device);
    assert!(tc.device.buffer_count() > 0);

    fixture.faces.clear();
    fixture.retriangulate();
    let view = DyntopoView {
        table: &fixture.table,
        faces: &fixture.faces,
        tribuf: &fixture.tribuf,
    };
    node.update(&tc.ctx, &NodeGeometry::Dyntopo { view, smooth: true }, &settings);
    assert!(node.clear_on_flush());

    node.update_flush(&tc.device);
    assert!(!node.clear_on_flush());
    assert!(node.vertex_buffer().is_none());
    assert!(node.device_vertex_buffer().is_none());
    assert!(!node.has_batches());
    assert_eq!(tc.device.buffer_count(), 0);
}

#[test]
fn test_free_releases_device_buffers() {
    let set = grids(3, 1);
    let tc = TestContext::plain();
    let mut node = NodeBuffers::for_grids();
    node.update(
        &tc.ctx,
        &NodeGeometry::Grids {
            grids: set.view(),
            grid_indices: &[0],
        },
        &UpdateSettings::new(),
    );
    node.update_flush(&tc.device);
    assert_eq!(tc.device.buffer_count(), 5);

    node.free();
    assert_eq!(tc.device.buffer_count(), 0);
    tc.device.cleanup_dead_resources();
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_fast_batch_falls_back_to_full() {
    let mesh = plane(2);
    let faces = all_faces(&mesh);
    let tc = TestContext::plain();
    let mut node = NodeBuffers::for_mesh(&mesh.view(), &faces);
    node.update(
        &tc.ctx,
        &NodeGeometry::Mesh {
            mesh: mesh.view(),
            faces: &faces,
        },
        &UpdateSettings::new(),
    );

    assert_eq!(node.get_batch(true, false), node.get_batch(false, false));
    assert_eq!(node.get_batch(true, true), node.get_batch(false, true));
    assert_eq!(node.get_batch(true, true).prim, PrimType::Lines);
}

#[test]
fn test_grid_fast_batch_is_coarser() {
    let set = grids(5, 1);
    let tc = TestContext::plain();
    let mut node = NodeBuffers::for_grids();
    node.update(
        &tc.ctx,
        &NodeGeometry::Grids {
            grids: set.view(),
            grid_indices: &[0],
        },
        &UpdateSettings::new(),
    );

    assert_eq!(node.get_batch(false, false).prim_count, 32);
    assert_eq!(node.get_batch(true, false).prim_count, 2);
    assert_eq!(node.get_batch(true, true).prim_count, 4);
    assert_eq!(
        node.get_batch(true, false).vertex,
        node.get_batch(false, false).vertex
    );
}

// ============================================================================
// Format Registry
// ============================================================================

#[test]
fn test_build_needs_a_format() {
    let device = GraphicsDevice::new("uninitialized");
    assert_eq!(
        device.build_context().err(),
        Some(GraphicsError::FormatMissing)
    );
    assert_eq!(
        update_nodes_parallel(&device, &mut [], &UpdateSettings::new()),
        Err(GraphicsError::FormatMissing)
    );
}

#[test]
fn test_unchanged_layers_keep_format() {
    let mut vdata = CustomData::new();
    vdata.add_layer(CustomDataLayer::new(
        "Col",
        LayerData::PropColor(vec![[1.0; 4]; 4]),
    ));
    let device = GraphicsDevice::new("test");

    let first = device.update_attribute_names(Some(&vdata), None, false);
    let second = device.update_attribute_names(Some(&vdata), None, false);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(device.format_rebuild_count(), 1);

    vdata.add_layer(CustomDataLayer::new(
        "Col.001",
        LayerData::PropColor(vec![[1.0; 4]; 4]),
    ));
    let third = device.update_attribute_names(Some(&vdata), None, false);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.color_slot_count(), 2);
    assert_eq!(device.format_rebuild_count(), 2);
}

#[test]
fn test_format_change_reallocates_vertices() {
    let mesh = plane(1);
    let faces = all_faces(&mesh);
    let device = GraphicsDevice::new("test");
    device.update_attribute_names(None, None, false);
    let geometry = NodeGeometry::Mesh {
        mesh: mesh.view(),
        faces: &faces,
    };
    let mut node = NodeBuffers::for_mesh(&mesh.view(), &faces);

    let ctx = device.build_context().unwrap();
    node.update(&ctx, &geometry, &UpdateSettings::new());
    let plain_stride = node.vertex_buffer().unwrap().format().stride();
    let id = node.vertex_buffer().unwrap().id();

    let mut vdata = CustomData::new();
    for name in ["A", "B"] {
        vdata.add_layer(CustomDataLayer::new(
            name,
            LayerData::PropColor(vec![[1.0; 4]; 4]),
        ));
    }
    device.update_attribute_names(Some(&vdata), None, false);
    let ctx = device.build_context().unwrap();
    node.update(&ctx, &geometry, &UpdateSettings::new());

    let vbo = node.vertex_buffer().unwrap();
    assert!(vbo.format().stride() > plain_stride);
    assert_eq!(vbo.data().unwrap().len(), vbo.format().stride() * 6);
    // Same buffer object, new storage; batches still match.
    assert_eq!(vbo.id(), id);
    assert_eq!(node.get_batch(false, false).vertex, Some(id));
}

// ============================================================================
// Parallel Updates
// ============================================================================

#[test]
fn test_parallel_updates() {
    let mut set = grids(3, 4);
    set.hide_grid(3);
    let tc = TestContext::plain();
    let mut nodes: Vec<NodeBuffers> = (0..4).map(|_| NodeBuffers::for_grids()).collect();
    let grid_indices: Vec<[u32; 1]> = (0..4).map(|g| [g]).collect();

    let mut jobs: Vec<NodeJob<'_>> = nodes
        .iter_mut()
        .zip(&grid_indices)
        .map(|(node, indices)| {
            NodeJob::new(
                node,
                NodeGeometry::Grids {
                    grids: set.view(),
                    grid_indices: indices,
                },
            )
        })
        .collect();

    let outcomes = update_nodes_parallel(&tc.device, &mut jobs, &UpdateSettings::new()).unwrap();
    assert_eq!(
        outcomes,
        vec![
            BuildOutcome::Updated,
            BuildOutcome::Updated,
            BuildOutcome::Updated,
            BuildOutcome::Empty,
        ]
    );
    drop(jobs);

    for node in &mut nodes {
        node.update_flush(&tc.device);
    }
    assert_eq!(nodes[0].tot_tri(), 8);
    assert!(nodes[3].get_batch(false, false).is_empty());
    // Three nodes with a vertex buffer and four index buffers each.
    assert_eq!(tc.device.buffer_count(), 15);
}
