//! Dynamic-topology mesh tables.
//!
//! Dynamic topology keeps one mutable table of triangles for the whole mesh.
//! Hierarchy nodes own sets of face and vertex handles into it. Because the
//! sets are unordered, the topology owner also maintains a flattened
//! [`TriBuffer`] per node with a stable vertex order, which indexed drawing
//! relies on.

use rustc_hash::{FxHashMap, FxHashSet};

use super::error::{GeometryError, check_index, check_layers};
use crate::custom_data::CustomData;
use crate::math::{centroid3, interp, normal_tri};

/// Handle of a vertex in a [`TopologyTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertHandle(pub u32);

/// Handle of a face in a [`TopologyTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmVert {
    pub co: [f32; 3],
    pub no: [f32; 3],
    pub hidden: bool,
}

/// A triangle of the topology table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmFace {
    pub verts: [VertHandle; 3],
    pub no: [f32; 3],
    pub mat_nr: u16,
    pub hidden: bool,
}

/// The mesh-wide vertex and face table.
///
/// Corner data in `ldata` is addressed as `face * 3 + corner`.
#[derive(Debug, Clone, Default)]
pub struct TopologyTable {
    pub verts: Vec<BmVert>,
    pub faces: Vec<BmFace>,
    pub vdata: CustomData,
    pub ldata: CustomData,
    pub pdata: CustomData,
}

impl TopologyTable {
    /// Build a table from positions and triangles, computing face normals
    /// and smooth vertex normals.
    pub fn from_triangles(positions: &[[f32; 3]], tris: &[[u32; 3]]) -> Self {
        let mut table = Self {
            verts: positions
                .iter()
                .map(|&co| BmVert {
                    co,
                    no: [0.0; 3],
                    hidden: false,
                })
                .collect(),
            ..Self::default()
        };
        for tri in tris {
            let [a, b, c] = tri.map(|v| positions[v as usize]);
            table.faces.push(BmFace {
                verts: tri.map(VertHandle),
                no: normal_tri(&a, &b, &c),
                mat_nr: 0,
                hidden: false,
            });
        }
        table.recompute_vert_normals();
        table
    }

    /// Recompute smooth vertex normals from face normals.
    pub fn recompute_vert_normals(&mut self) {
        let mut acc = vec![[0.0f32; 3]; self.verts.len()];
        for f in &self.faces {
            for v in f.verts {
                for i in 0..3 {
                    acc[v.0 as usize][i] += f.no[i];
                }
            }
        }
        for (vert, n) in self.verts.iter_mut().zip(acc) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            vert.no = if len > 0.0 { n.map(|c| c / len) } else { n };
        }
    }

    #[inline]
    pub fn vert(&self, v: VertHandle) -> &BmVert {
        &self.verts[v.0 as usize]
    }

    #[inline]
    pub fn face(&self, f: FaceHandle) -> &BmFace {
        &self.faces[f.0 as usize]
    }

    /// Corner-data index of `corner` of face `f`.
    #[inline]
    pub fn loop_index(f: FaceHandle, corner: usize) -> usize {
        f.0 as usize * 3 + corner
    }

    /// Corner positions, edge midpoints and centroid of a face.
    ///
    /// Returned as `[v0, v1, v2, mid01, mid12, mid20, centroid]`.
    pub fn face_fan_points(&self, f: FaceHandle) -> [[f32; 3]; 7] {
        let [a, b, c] = self.face(f).verts.map(|v| self.vert(v).co);
        [
            a,
            b,
            c,
            interp(&a, &b, 0.5),
            interp(&b, &c, 0.5),
            interp(&c, &a, 0.5),
            centroid3(&a, &b, &c),
        ]
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        for f in &self.faces {
            for v in f.verts {
                check_index("vertex", v.0 as usize, self.verts.len())?;
            }
        }
        check_layers(&self.vdata, self.verts.len())?;
        check_layers(&self.ldata, self.faces.len() * 3)?;
        check_layers(&self.pdata, self.faces.len())?;
        Ok(())
    }
}

/// One triangle of a flattened buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriBufTri {
    /// Indices into [`TriBuffer::verts`]
    pub v: [u32; 3],
    pub face: FaceHandle,
}

/// Flattened, stably ordered triangles of one node and material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriBuffer {
    pub verts: Vec<VertHandle>,
    pub tris: Vec<TriBufTri>,
    pub mat_nr: u16,
}

impl TriBuffer {
    /// Flatten the visible faces of `mat_nr`, numbering vertices in order of
    /// first use.
    pub fn from_faces<'a>(
        table: &TopologyTable,
        faces: impl IntoIterator<Item = &'a FaceHandle>,
        mat_nr: u16,
    ) -> Self {
        let mut faces: Vec<FaceHandle> = faces
            .into_iter()
            .copied()
            .filter(|&f| {
                let face = table.face(f);
                !face.hidden && face.mat_nr == mat_nr
            })
            .collect();
        faces.sort_unstable();

        let mut buf = Self {
            mat_nr,
            ..Self::default()
        };
        let mut index: FxHashMap<VertHandle, u32> = FxHashMap::default();
        for f in faces {
            let v = table.face(f).verts.map(|vh| {
                *index.entry(vh).or_insert_with(|| {
                    buf.verts.push(vh);
                    (buf.verts.len() - 1) as u32
                })
            });
            buf.tris.push(TriBufTri { v, face: f });
        }
        buf
    }

    pub fn tri_count(&self) -> usize {
        self.tris.len()
    }

    pub fn vert_count(&self) -> usize {
        self.verts.len()
    }
}

/// The part of the topology table owned by one hierarchy node.
#[derive(Debug, Clone, Copy)]
pub struct DyntopoView<'a> {
    pub table: &'a TopologyTable,
    /// Faces of the node, including hidden ones
    pub faces: &'a FxHashSet<FaceHandle>,
    /// Flattened triangles of the node for the buffer's material
    pub tribuf: &'a TriBuffer,
}

impl<'a> DyntopoView<'a> {
    /// Faces that would be drawn for `mat_nr`, in handle order.
    pub fn visible_faces(&self, mat_nr: u16) -> Vec<FaceHandle> {
        let mut faces: Vec<FaceHandle> = self
            .faces
            .iter()
            .copied()
            .filter(|&f| {
                let face = self.table.face(f);
                !face.hidden && face.mat_nr == mat_nr
            })
            .collect();
        faces.sort_unstable();
        faces
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.table.validate()?;
        for f in self.faces {
            check_index("face", f.0 as usize, self.table.faces.len())?;
        }
        for v in &self.tribuf.verts {
            check_index("vertex", v.0 as usize, self.table.verts.len())?;
        }
        for t in &self.tribuf.tris {
            check_index("face", t.face.0 as usize, self.table.faces.len())?;
            for &i in &t.v {
                check_index("tri-buffer vertex", i as usize, self.tribuf.verts.len())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> TopologyTable {
        TopologyTable::from_triangles(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_tribuf_shares_vertices() {
        let table = strip();
        let faces: FxHashSet<FaceHandle> = [FaceHandle(0), FaceHandle(1)].into_iter().collect();
        let buf = TriBuffer::from_faces(&table, &faces, 0);
        assert_eq!(buf.tri_count(), 2);
        assert_eq!(buf.vert_count(), 4);
        assert_eq!(buf.tris[1].v, [0, 2, 3]);

        let view = DyntopoView {
            table: &table,
            faces: &faces,
            tribuf: &buf,
        };
        assert!(view.validate().is_ok());
    }

    #[test]
    fn test_hidden_and_material_filtered() {
        let mut table = strip();
        table.faces[0].hidden = true;
        table.faces[1].mat_nr = 1;
        let faces: FxHashSet<FaceHandle> = [FaceHandle(0), FaceHandle(1)].into_iter().collect();
        assert_eq!(TriBuffer::from_faces(&table, &faces, 0).tri_count(), 0);
        assert_eq!(TriBuffer::from_faces(&table, &faces, 1).tri_count(), 1);
    }

    #[test]
    fn test_fan_points() {
        let table = strip();
        let p = table.face_fan_points(FaceHandle(0));
        assert_eq!(p[3], [0.5, 0.0, 0.0]);
        assert_eq!(p[4], [1.0, 0.5, 0.0]);
        assert!((p[6][0] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_face_normals() {
        let table = strip();
        assert_eq!(table.faces[0].no, [0.0, 0.0, 1.0]);
        assert_eq!(table.verts[0].no, [0.0, 0.0, 1.0]);
    }
}
