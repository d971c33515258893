//! Visibility tests and per-vertex attribute conversion shared by the
//! buffer builders.

use bit_vec::BitVec;

use crate::color::{face_set_overlay_color, linear_float_to_u16, srgb_bytes_to_linear_u16};
use crate::geometry::{GridsView, LoopTri, MeshView};

/// Face set id meaning "no face set"; faces at or below it are not drawn.
pub const FACE_SET_NONE: i32 = 0;

/// Vertex color written when no color layer is sampled.
pub const WHITE_COLOR: [u16; 4] = [u16::MAX; 4];

/// Face set color of the default face set and of meshes without face sets.
pub const WHITE_FACE_SET: [u8; 3] = [u8::MAX; 3];

/// Whether a loop triangle is drawn.
///
/// Triangles touching a hidden vertex are skipped, as are triangles whose
/// face set is not above [`FACE_SET_NONE`]. Meshes without a face set layer
/// only use the vertex test.
pub fn is_looptri_visible(mesh: &MeshView<'_>, lt: &LoopTri) -> bool {
    if mesh.is_looptri_hidden(lt) {
        return false;
    }
    match mesh.pdata.face_sets() {
        Some(face_sets) => face_sets[lt.poly as usize] > FACE_SET_NONE,
        None => true,
    }
}

/// Number of visible triangles among `faces` (indices into the loop triangles).
pub fn count_visible_looptris(mesh: &MeshView<'_>, faces: &[u32]) -> usize {
    faces
        .iter()
        .filter(|&&f| is_looptri_visible(mesh, &mesh.looptris[f as usize]))
        .count()
}

/// Whether the subface with lower-left corner `(x, y)` is hidden.
pub fn is_grid_face_hidden(hidden: &BitVec, grid_size: u32, x: u32, y: u32) -> bool {
    let test = |x: u32, y: u32| hidden.get((y * grid_size + x) as usize).unwrap_or(false);
    test(x, y) || test(x + 1, y) || test(x + 1, y + 1) || test(x, y + 1)
}

/// Number of visible subfaces in one grid.
pub fn count_grid_quads_in(view: &GridsView<'_>, grid: usize) -> usize {
    let size = view.key.grid_size;
    match view.grid_hidden(grid) {
        None => view.key.quads_per_grid(),
        Some(hidden) => {
            let mut count = 0;
            for y in 0..size.saturating_sub(1) {
                for x in 0..size - 1 {
                    if !is_grid_face_hidden(hidden, size, x, y) {
                        count += 1;
                    }
                }
            }
            count
        }
    }
}

/// Number of visible subfaces over a node's grids.
pub fn count_grid_quads(view: &GridsView<'_>, grid_indices: &[u32]) -> usize {
    grid_indices
        .iter()
        .map(|&g| count_grid_quads_in(view, g as usize))
        .sum()
}

/// Overlay color of a face set, or `None` when the face renders white.
///
/// `None` is returned for the default face set so callers can tell whether
/// any face actually needs the overlay.
pub fn face_set_color(face_set: Option<i32>, seed: i32, default_id: i32) -> Option<[u8; 3]> {
    match face_set {
        Some(id) if id != default_id => Some(face_set_overlay_color(id, seed)),
        _ => None,
    }
}

/// Mask value as stored in the vertex buffer.
#[inline]
pub fn mask_to_u8(mask: f32) -> u8 {
    (mask * 255.0) as u8
}

#[inline]
pub fn average<const N: usize>(values: [f32; N]) -> f32 {
    values.iter().sum::<f32>() / N as f32
}

/// Float color layer value in vertex buffer encoding.
#[inline]
pub fn prop_color_to_u16(c: [f32; 4]) -> [u16; 4] {
    linear_float_to_u16(c)
}

/// Legacy 8-bit sRGB corner color in vertex buffer encoding.
#[inline]
pub fn loop_color_to_u16(c: [u8; 4]) -> [u16; 4] {
    srgb_bytes_to_linear_u16(c)
}
