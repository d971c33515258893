//! Static mesh representation.
//!
//! Faces are n-gons described by a run of corners ("loops"). For drawing,
//! every polygon is split into loop triangles ([`LoopTri`]) that reference
//! corners, not vertices, so per-corner data (UVs, colors) stays reachable.

use rustc_hash::FxHashMap;

use super::error::{GeometryError, check_index, check_layers};
use crate::custom_data::CustomData;
use crate::math::{normal_float_to_short, normal_poly, to_array, vec3, Vec3};

/// A mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub co: [f32; 3],
    /// Smooth normal, as signed 16-bit unit components
    pub no: [i16; 3],
    pub hidden: bool,
}

/// An edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshEdge {
    pub v: [u32; 2],
}

/// A face corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshLoop {
    /// Vertex index
    pub v: u32,
    /// Edge from this corner's vertex to the next corner's vertex
    pub e: u32,
}

/// A polygon as a run of corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPoly {
    pub loop_start: u32,
    pub len: u32,
    pub mat_nr: u16,
    pub smooth: bool,
}

impl MeshPoly {
    pub fn loops(&self) -> std::ops::Range<usize> {
        self.loop_start as usize..(self.loop_start + self.len) as usize
    }
}

/// A triangle of a tessellated polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTri {
    /// Corner indices
    pub tri: [u32; 3],
    /// Polygon the triangle belongs to
    pub poly: u32,
}

/// Read-only view over a mesh.
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    pub verts: &'a [MeshVertex],
    pub edges: &'a [MeshEdge],
    pub loops: &'a [MeshLoop],
    pub polys: &'a [MeshPoly],
    pub looptris: &'a [LoopTri],
    /// Per-vertex layers (masks, float colors)
    pub vdata: &'a CustomData,
    /// Per-corner layers (UVs, legacy colors)
    pub ldata: &'a CustomData,
    /// Per-polygon layers (face sets)
    pub pdata: &'a CustomData,
}

impl<'a> MeshView<'a> {
    /// Vertex indices of a loop triangle.
    #[inline]
    pub fn looptri_verts(&self, lt: &LoopTri) -> [u32; 3] {
        lt.tri.map(|l| self.loops[l as usize].v)
    }

    /// Whether any vertex of the triangle is hidden.
    pub fn is_looptri_hidden(&self, lt: &LoopTri) -> bool {
        self.looptri_verts(lt)
            .iter()
            .any(|&v| self.verts[v as usize].hidden)
    }

    /// Mesh edges along the triangle's sides.
    ///
    /// Side `i` runs from corner `i` to corner `(i + 1) % 3`. It maps to a
    /// real edge only when it follows the polygon boundary; tessellation
    /// diagonals yield `None`.
    pub fn looptri_real_edges(&self, lt: &LoopTri) -> [Option<u32>; 3] {
        let mut edges = [None; 3];
        for (i, edge) in edges.iter_mut().enumerate() {
            let l1 = &self.loops[lt.tri[i] as usize];
            let l2 = &self.loops[lt.tri[(i + 1) % 3] as usize];
            let e = &self.edges[l1.e as usize];
            let is_real = (l1.v == e.v[0] && l2.v == e.v[1]) || (l1.v == e.v[1] && l2.v == e.v[0]);
            if is_real {
                *edge = Some(l1.e);
            }
        }
        edges
    }

    /// Flat normal of a polygon.
    pub fn poly_normal(&self, poly: usize) -> [f32; 3] {
        let p = &self.polys[poly];
        normal_poly(
            p.loops()
                .map(|l| &self.verts[self.loops[l].v as usize].co),
        )
    }

    /// Check every index in the view is in range.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let nverts = self.verts.len();
        for e in self.edges {
            for &v in &e.v {
                check_index("vertex", v as usize, nverts)?;
            }
        }
        for l in self.loops {
            check_index("vertex", l.v as usize, nverts)?;
            check_index("edge", l.e as usize, self.edges.len())?;
        }
        for (i, p) in self.polys.iter().enumerate() {
            if p.len < 3 {
                return Err(GeometryError::DegeneratePolygon(i));
            }
            check_index("loop", p.loops().end - 1, self.loops.len())?;
        }
        for lt in self.looptris {
            check_index("polygon", lt.poly as usize, self.polys.len())?;
            for &l in &lt.tri {
                check_index("loop", l as usize, self.loops.len())?;
            }
        }
        check_layers(self.vdata, nverts)?;
        check_layers(self.ldata, self.loops.len())?;
        check_layers(self.pdata, self.polys.len())?;
        Ok(())
    }
}

/// Owned mesh storage with fan tessellation.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub verts: Vec<MeshVertex>,
    pub edges: Vec<MeshEdge>,
    pub loops: Vec<MeshLoop>,
    pub polys: Vec<MeshPoly>,
    pub looptris: Vec<LoopTri>,
    pub vdata: CustomData,
    pub ldata: CustomData,
    pub pdata: CustomData,
}

impl Mesh {
    /// Build a mesh from positions and polygons given as vertex index lists.
    ///
    /// Edges are deduplicated, polygons are fan-triangulated and vertex
    /// normals are the normalized sum of adjacent polygon normals. All
    /// polygons start smooth with material 0.
    pub fn from_polygons(positions: &[[f32; 3]], polygons: &[Vec<u32>]) -> Self {
        let mut mesh = Self {
            verts: positions
                .iter()
                .map(|&co| MeshVertex {
                    co,
                    no: [0; 3],
                    hidden: false,
                })
                .collect(),
            ..Self::default()
        };

        let mut edge_map: FxHashMap<(u32, u32), u32> = FxHashMap::default();
        for poly in polygons {
            let loop_start = mesh.loops.len() as u32;
            for (i, &v) in poly.iter().enumerate() {
                let next = poly[(i + 1) % poly.len()];
                let key = (v.min(next), v.max(next));
                let e = *edge_map.entry(key).or_insert_with(|| {
                    mesh.edges.push(MeshEdge { v: [v, next] });
                    (mesh.edges.len() - 1) as u32
                });
                mesh.loops.push(MeshLoop { v, e });
            }
            mesh.polys.push(MeshPoly {
                loop_start,
                len: poly.len() as u32,
                mat_nr: 0,
                smooth: true,
            });
        }

        mesh.retessellate();
        mesh.recompute_normals();
        mesh
    }

    /// Rebuild the loop triangles from the polygons.
    pub fn retessellate(&mut self) {
        self.looptris.clear();
        for (pi, p) in self.polys.iter().enumerate() {
            let first = p.loop_start;
            for i in 1..p.len.saturating_sub(1) {
                self.looptris.push(LoopTri {
                    tri: [first, first + i, first + i + 1],
                    poly: pi as u32,
                });
            }
        }
    }

    /// Recompute smooth vertex normals.
    pub fn recompute_normals(&mut self) {
        let mut acc = vec![Vec3::zeros(); self.verts.len()];
        for p in &self.polys {
            let n = vec3(&normal_poly(
                p.loops()
                    .map(|l| &self.verts[self.loops[l].v as usize].co),
            ));
            for l in p.loops() {
                acc[self.loops[l].v as usize] += n;
            }
        }
        for (vert, n) in self.verts.iter_mut().zip(acc) {
            let len = n.norm();
            let n = if len > 0.0 { n / len } else { n };
            vert.no = normal_float_to_short(&to_array(&n));
        }
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        for p in &mut self.polys {
            p.smooth = smooth;
        }
    }

    pub fn view(&self) -> MeshView<'_> {
        MeshView {
            verts: &self.verts,
            edges: &self.edges,
            loops: &self.loops,
            polys: &self.polys,
            looptris: &self.looptris,
            vdata: &self.vdata,
            ldata: &self.ldata,
            pdata: &self.pdata,
        }
    }
}
