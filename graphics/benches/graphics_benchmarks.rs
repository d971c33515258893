use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pbvh_core::custom_data::{CustomDataLayer, LayerData};
use pbvh_core::geometry::{
    DyntopoView, FaceHandle, GridKey, GridSet, Mesh, TopologyTable, TriBuffer,
};
use pbvh_gpu::{
    GraphicsDevice, NodeBuffers, NodeGeometry, NodeJob, UpdateFlags, UpdateSettings,
    update_nodes_parallel,
};
use rustc_hash::FxHashSet;

fn plane(n: u32) -> (Vec<[f32; 3]>, Vec<Vec<u32>>) {
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
    (positions, polys)
}

fn settings() -> UpdateSettings {
    UpdateSettings::new()
        .with_flags(UpdateFlags::SHOW_MASK | UpdateFlags::SHOW_FACE_SETS | UpdateFlags::SHOW_VCOL)
        .with_vertex_colors(true)
}

// ---------------------------------------------------------------------------
// Mesh nodes
// ---------------------------------------------------------------------------

fn bench_mesh_node(c: &mut Criterion) {
    let (positions, polys) = plane(64);
    let mut mesh = Mesh::from_polygons(&positions, &polys);
    let nverts = mesh.verts.len();
    mesh.vdata.add_layer(CustomDataLayer::new(
        "mask",
        LayerData::PaintMask(vec![0.5; nverts]),
    ));
    mesh.vdata.add_layer(CustomDataLayer::new(
        "Col",
        LayerData::PropColor(vec![[0.2, 0.4, 0.6, 1.0]; nverts]),
    ));

    let device = GraphicsDevice::new("bench");
    device.update_attribute_names(Some(&mesh.vdata), Some(&mesh.ldata), false);
    let ctx = device.build_context().unwrap();
    let faces: Vec<u32> = (0..mesh.looptris.len() as u32).collect();
    let mut node = NodeBuffers::for_mesh(&mesh.view(), &faces);
    let settings = settings();

    c.bench_function("mesh_node_update_8k_tris", |b| {
        b.iter(|| {
            let geometry = NodeGeometry::Mesh {
                mesh: mesh.view(),
                faces: black_box(&faces),
            };
            black_box(node.update(&ctx, &geometry, &settings));
        });
    });
}

// ---------------------------------------------------------------------------
// Grid nodes
// ---------------------------------------------------------------------------

fn bench_grid_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_node_update_64x17");
    for smooth in [true, false] {
        let mut grids = GridSet::planar(GridKey::new(17).with_mask(true), 64);
        grids.set_smooth(smooth);
        let device = GraphicsDevice::new("bench");
        device.update_attribute_names(None, None, false);
        let ctx = device.build_context().unwrap();
        let indices: Vec<u32> = (0..64).collect();
        let mut node = NodeBuffers::for_grids();
        let settings = settings();

        let name = if smooth { "smooth" } else { "flat" };
        group.bench_function(name, |b| {
            b.iter(|| {
                let geometry = NodeGeometry::Grids {
                    grids: grids.view(),
                    grid_indices: black_box(&indices),
                };
                black_box(node.update(&ctx, &geometry, &settings));
            });
        });
    }
    group.finish();
}

fn bench_grid_nodes_parallel(c: &mut Criterion) {
    let grids = GridSet::planar(GridKey::new(17).with_mask(true), 256);
    let device = GraphicsDevice::new("bench");
    device.update_attribute_names(None, None, false);
    let indices: Vec<Vec<u32>> = (0..16u32)
        .map(|n| (n * 16..(n + 1) * 16).collect())
        .collect();
    let mut nodes: Vec<NodeBuffers> = (0..16).map(|_| NodeBuffers::for_grids()).collect();
    let settings = settings();

    c.bench_function("grid_nodes_parallel_16x16", |b| {
        b.iter(|| {
            let mut jobs: Vec<NodeJob<'_>> = nodes
                .iter_mut()
                .zip(&indices)
                .map(|(node, grid_indices)| {
                    NodeJob::new(
                        node,
                        NodeGeometry::Grids {
                            grids: grids.view(),
                            grid_indices,
                        },
                    )
                })
                .collect();
            black_box(update_nodes_parallel(&device, &mut jobs, &settings).unwrap());
        });
    });
}

// ---------------------------------------------------------------------------
// Dynamic-topology nodes
// ---------------------------------------------------------------------------

fn bench_dyntopo_node(c: &mut Criterion) {
    let (positions, polys) = plane(64);
    let tris: Vec<[u32; 3]> = polys
        .iter()
        .flat_map(|p| [[p[0], p[1], p[2]], [p[0], p[2], p[3]]])
        .collect();
    let table = TopologyTable::from_triangles(&positions, &tris);
    let faces: FxHashSet<FaceHandle> = (0..table.faces.len() as u32).map(FaceHandle).collect();
    let tribuf = TriBuffer::from_faces(&table, &faces, 0);
    let view = DyntopoView {
        table: &table,
        faces: &faces,
        tribuf: &tribuf,
    };

    let device = GraphicsDevice::new("bench");
    device.update_attribute_names(Some(&table.vdata), Some(&table.ldata), false);
    let ctx = device.build_context().unwrap();
    let settings = settings();

    let mut group = c.benchmark_group("dyntopo_node_update_8k_tris");
    for smooth in [true, false] {
        let mut node = NodeBuffers::for_dyntopo(smooth);
        let name = if smooth { "indexed" } else { "unindexed" };
        group.bench_function(name, |b| {
            b.iter(|| {
                let geometry = NodeGeometry::Dyntopo { view, smooth };
                black_box(node.update(&ctx, &geometry, &settings));
            });
        });
    }
    group.finish();
}

criterion_group!(mesh_benches, bench_mesh_node);

criterion_group!(grid_benches, bench_grid_node, bench_grid_nodes_parallel);

criterion_group!(dyntopo_benches, bench_dyntopo_node);

criterion_main!(mesh_benches, grid_benches, dyntopo_benches);
