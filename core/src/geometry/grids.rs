//! Multiresolution grids.
//!
//! Every base-mesh face corner owns one square grid of `grid_size²`
//! elements, stored row-major (`y * grid_size + x`). Hidden state is a
//! per-element bitmap; a subface is hidden when any of its corners is.

use bit_vec::BitVec;

use super::error::{GeometryError, check_index, check_layers};
use crate::custom_data::CustomData;

/// Grid dimensions shared by all grids of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridKey {
    /// Elements per grid side
    pub grid_size: u32,
    /// Whether elements carry a mask value
    pub has_mask: bool,
}

impl GridKey {
    pub fn new(grid_size: u32) -> Self {
        Self {
            grid_size,
            has_mask: false,
        }
    }

    pub fn with_mask(mut self, has_mask: bool) -> Self {
        self.has_mask = has_mask;
        self
    }

    /// Elements per grid.
    #[inline]
    pub fn grid_area(&self) -> usize {
        (self.grid_size * self.grid_size) as usize
    }

    /// Subfaces per grid.
    #[inline]
    pub fn quads_per_grid(&self) -> usize {
        let n = self.grid_size.saturating_sub(1) as usize;
        n * n
    }

    /// Element index of `(x, y)`.
    #[inline]
    pub fn elem_index(&self, x: u32, y: u32) -> usize {
        (y * self.grid_size + x) as usize
    }
}

/// One grid element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridElem {
    pub co: [f32; 3],
    pub no: [f32; 3],
    pub mask: f32,
}

/// Shading flags of the face a grid belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridFlagMat {
    pub smooth: bool,
    pub mat_nr: u16,
}

/// Read-only view over a mesh's grids.
#[derive(Debug, Clone, Copy)]
pub struct GridsView<'a> {
    pub key: GridKey,
    pub grids: &'a [Vec<GridElem>],
    /// Shading flags per grid
    pub flag_mats: &'a [GridFlagMat],
    /// Per-grid hidden bitmaps; `None` means fully visible
    pub hidden: &'a [Option<BitVec>],
    /// Base-mesh face each grid belongs to
    pub grid_to_face: &'a [u32],
    /// Per-face layers of the base mesh (face sets)
    pub pdata: &'a CustomData,
}

impl<'a> GridsView<'a> {
    #[inline]
    pub fn elem(&self, grid: usize, x: u32, y: u32) -> &'a GridElem {
        &self.grids[grid][self.key.elem_index(x, y)]
    }

    /// Hidden bitmap of a grid, if any element of it can be hidden.
    #[inline]
    pub fn grid_hidden(&self, grid: usize) -> Option<&'a BitVec> {
        self.hidden.get(grid).and_then(Option::as_ref)
    }

    /// Face set of the base face a grid belongs to.
    pub fn face_set(&self, grid: usize) -> Option<i32> {
        let face = *self.grid_to_face.get(grid)? as usize;
        self.pdata.face_sets()?.get(face).copied()
    }

    /// Check grid sizes and per-grid tables.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let area = self.key.grid_area();
        for (i, grid) in self.grids.iter().enumerate() {
            if grid.len() != area {
                return Err(GeometryError::InvalidGrid {
                    grid: i,
                    reason: format!("{} elements, expected {area}", grid.len()),
                });
            }
            if let Some(hidden) = self.grid_hidden(i) {
                if hidden.len() != area {
                    return Err(GeometryError::InvalidGrid {
                        grid: i,
                        reason: format!("hidden bitmap of {} bits", hidden.len()),
                    });
                }
            }
        }
        let ngrids = self.grids.len();
        for (kind, len) in [
            ("flag", self.flag_mats.len()),
            ("grid-to-face", self.grid_to_face.len()),
        ] {
            if len != ngrids {
                return Err(GeometryError::IndexOutOfRange {
                    kind,
                    index: len,
                    len: ngrids,
                });
            }
        }
        if let Some(fsets) = self.pdata.face_sets() {
            for &face in self.grid_to_face {
                check_index("face", face as usize, fsets.len())?;
            }
        }
        if let Some(first) = self.pdata.layers().first() {
            check_layers(self.pdata, first.data.len())?;
        }
        Ok(())
    }
}

/// Owned grid storage.
#[derive(Debug, Clone)]
pub struct GridSet {
    pub key: GridKey,
    pub grids: Vec<Vec<GridElem>>,
    pub flag_mats: Vec<GridFlagMat>,
    pub hidden: Vec<Option<BitVec>>,
    pub grid_to_face: Vec<u32>,
    pub pdata: CustomData,
}

impl GridSet {
    /// `count` flat unit grids laid out side by side along X, one face each.
    ///
    /// Grid quads wind clockwise seen from +Z, so element normals point
    /// down -Z.
    pub fn planar(key: GridKey, count: usize) -> Self {
        let step = 1.0 / key.grid_size.saturating_sub(1).max(1) as f32;
        let grids = (0..count)
            .map(|g| {
                (0..key.grid_area())
                    .map(|i| {
                        let x = (i % key.grid_size as usize) as f32 * step;
                        let y = (i / key.grid_size as usize) as f32 * step;
                        GridElem {
                            co: [g as f32 + x, y, 0.0],
                            no: [0.0, 0.0, -1.0],
                            mask: 0.0,
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            key,
            grids,
            flag_mats: vec![
                GridFlagMat {
                    smooth: true,
                    mat_nr: 0
                };
                count
            ],
            hidden: vec![None; count],
            grid_to_face: (0..count as u32).collect(),
            pdata: CustomData::new(),
        }
    }

    /// Hide or unhide one element.
    pub fn set_hidden(&mut self, grid: usize, x: u32, y: u32, hidden: bool) {
        let area = self.key.grid_area();
        let index = self.key.elem_index(x, y);
        let bits = self.hidden[grid].get_or_insert_with(|| BitVec::from_elem(area, false));
        bits.set(index, hidden);
    }

    /// Hide every element of a grid.
    pub fn hide_grid(&mut self, grid: usize) {
        self.hidden[grid] = Some(BitVec::from_elem(self.key.grid_area(), true));
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        for fm in &mut self.flag_mats {
            fm.smooth = smooth;
        }
    }

    pub fn view(&self) -> GridsView<'_> {
        GridsView {
            key: self.key,
            grids: &self.grids,
            flag_mats: &self.flag_mats,
            hidden: &self.hidden,
            grid_to_face: &self.grid_to_face,
            pdata: &self.pdata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_data::{CustomDataLayer, LayerData};

    #[test]
    fn test_planar_grids() {
        let grids = GridSet::planar(GridKey::new(3), 2);
        let view = grids.view();
        assert!(view.validate().is_ok());
        assert_eq!(view.elem(1, 2, 2).co, [2.0, 1.0, 0.0]);
        assert_eq!(grids.key.quads_per_grid(), 4);
    }

    #[test]
    fn test_face_set_lookup() {
        let mut grids = GridSet::planar(GridKey::new(2), 2);
        grids.grid_to_face = vec![0, 0];
        grids
            .pdata
            .add_layer(CustomDataLayer::new("fs", LayerData::FaceSets(vec![5])));
        assert_eq!(grids.view().face_set(1), Some(5));
        assert!(grids.view().validate().is_ok());
    }

    #[test]
    fn test_hidden_bitmap_size_checked() {
        let mut grids = GridSet::planar(GridKey::new(3), 1);
        grids.hidden[0] = Some(BitVec::from_elem(4, false));
        assert!(matches!(
            grids.view().validate(),
            Err(GeometryError::InvalidGrid { grid: 0, .. })
        ));
    }
}
