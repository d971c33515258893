//! Multiresolution grid nodes.
//!
//! Smooth grids share vertices between neighboring subfaces
//! (`grid_size²` per grid). Flat grids give each subface its own four
//! corners so it can carry a face normal. Alongside the full-resolution
//! buffers, grid nodes build "fast" buffers that only use the corners of
//! each grid.

use pbvh_core::geometry::{GridKey, GridsView};
use pbvh_core::math::{Bounds, normal_quad};
use pbvh_core::sampling::{
    WHITE_COLOR, WHITE_FACE_SET, count_grid_quads, face_set_color, is_grid_face_hidden, mask_to_u8,
};

use super::{BuildContext, BuildOutcome, NodeBuffers, UpdateSettings};
use crate::index_buffer::IndexBufferBuilder;
use crate::types::PrimType;

/// Vertices of one grid in the vertex buffer.
#[inline]
fn grid_vert_len(key: &GridKey, smooth: bool) -> usize {
    if smooth {
        key.grid_area()
    } else {
        key.quads_per_grid() * 4
    }
}

/// Vertex indices of the four corners of the grid starting at `offset`.
///
/// Depends only on the offset, the shading mode and the grid size.
fn grid_corners(offset: u32, smooth: bool, grid_size: u32) -> [u32; 4] {
    if smooth {
        let area = grid_size * grid_size;
        [
            offset,
            offset + grid_size - 1,
            offset + area - 1,
            offset + area - grid_size,
        ]
    } else {
        let row = (grid_size - 1) * 4;
        let len = row * (grid_size - 1);
        [offset, offset + row - 3, offset + len - 2, offset + len - row + 3]
    }
}

impl NodeBuffers {
    /// Drop batches and index buffers if the grids switched between smooth
    /// and flat shading, since the vertex layout changes with it.
    pub(super) fn grid_update_free(&mut self, grids: &GridsView<'_>, grid_indices: &[u32]) {
        let Some(&first) = grid_indices.first() else {
            return;
        };
        let smooth = grids.flag_mats[first as usize].smooth;
        if self.smooth != smooth {
            log::debug!("NodeBuffers: grid shading changed (smooth: {smooth}), discarding indices");
            self.discard_batches();
            self.discard_index_buffers();
        }
    }

    fn fill_grid_index_buffers(
        &mut self,
        grids: &GridsView<'_>,
        grid_indices: &[u32],
        visible_quads: usize,
        vertex_len: u32,
    ) {
        let size = grids.key.grid_size;
        let totgrid = grid_indices.len();
        let smooth = self.smooth;

        let mut tris = IndexBufferBuilder::new(PrimType::Triangles, 2 * visible_quads, vertex_len);
        let mut tris_fast = IndexBufferBuilder::new(PrimType::Triangles, 2 * totgrid, vertex_len);
        let mut lines = IndexBufferBuilder::new(
            PrimType::Lines,
            2 * totgrid * (size * (size - 1)) as usize,
            vertex_len,
        );
        let mut lines_fast = IndexBufferBuilder::new(PrimType::Lines, 4 * totgrid, vertex_len);

        let grid_len = grid_vert_len(&grids.key, smooth) as u32;
        let mut offset = 0;
        for &grid in grid_indices {
            let hidden = grids.grid_hidden(grid as usize);
            let mut grid_visible = false;
            // Right side of the last drawn subface, closed at each row end.
            let mut row_end = None;

            for y in 0..size - 1 {
                for x in 0..size - 1 {
                    if hidden.is_some_and(|h| is_grid_face_hidden(h, size, x, y)) {
                        continue;
                    }
                    // Clockwise quad.
                    let [v0, v1, v2, v3] = if smooth {
                        let v0 = offset + y * size + x;
                        [v0, v0 + 1, v0 + 1 + size, v0 + size]
                    } else {
                        let v0 = offset + (y * (size - 1) + x) * 4;
                        [v0, v0 + 1, v0 + 2, v0 + 3]
                    };

                    tris.add_tri(v0, v2, v1);
                    tris.add_tri(v0, v3, v2);

                    lines.add_line(v0, v1);
                    lines.add_line(v0, v3);
                    if y + 2 == size {
                        lines.add_line(v2, v3);
                    }
                    row_end = Some((v1, v2));
                    grid_visible = true;
                }

                if grid_visible {
                    if let Some((v1, v2)) = row_end {
                        lines.add_line(v1, v2);
                    }
                }
            }

            if grid_visible {
                let [v0, v1, v2, v3] = grid_corners(offset, smooth, size);
                tris_fast.add_tri(v0, v2, v1);
                tris_fast.add_tri(v0, v3, v2);

                lines_fast.add_line(v0, v1);
                lines_fast.add_line(v1, v2);
                lines_fast.add_line(v2, v3);
                lines_fast.add_line(v3, v0);
            }

            offset += grid_len;
        }

        tris.build_into(&mut self.index_buf);
        tris_fast.build_into(&mut self.index_buf_fast);
        lines.build_into(&mut self.index_lines_buf);
        lines_fast.build_into(&mut self.index_lines_buf_fast);
    }

    pub(super) fn update_grids(
        &mut self,
        ctx: &BuildContext,
        grids: &GridsView<'_>,
        grid_indices: &[u32],
        settings: &UpdateSettings,
    ) -> BuildOutcome {
        let Some(&first) = grid_indices.first() else {
            self.tot_quad = 0;
            self.tot_tri = 0;
            return BuildOutcome::Empty;
        };

        self.grid_update_free(grids, grid_indices);
        let first_flags = grids.flag_mats[first as usize];
        self.smooth = first_flags.smooth;
        self.use_bmesh = false;

        let visible_quads = count_grid_quads(grids, grid_indices);
        if visible_quads == 0 {
            log::trace!("NodeBuffers: all {} grids hidden", grid_indices.len());
            self.tot_quad = 0;
            self.tot_tri = 0;
            return BuildOutcome::Empty;
        }

        let key = grids.key;
        let size = key.grid_size;
        let smooth = self.smooth;
        let vertex_len = grid_vert_len(&key, smooth) * grid_indices.len();
        if !self.alloc_vertices(ctx, vertex_len) {
            return BuildOutcome::MapFailed;
        }

        self.fill_grid_index_buffers(grids, grid_indices, visible_quads, vertex_len as u32);
        self.tot_quad = visible_quads;
        self.tot_tri = visible_quads * 2;
        self.material_index = first_flags.mat_nr;

        let show_mask = key.has_mask && settings.show_mask();
        let bounds = Bounds::from_points(
            grid_indices
                .iter()
                .flat_map(|&g| grids.grids[g as usize].iter().map(|e| &e.co)),
        );
        let Some(mut writer) = self.vertex_writer(ctx, bounds) else {
            return BuildOutcome::MapFailed;
        };

        let mut empty_mask = true;
        let mut default_face_set = true;

        for &grid in grid_indices {
            let g = grid as usize;
            let fset = if settings.show_face_sets() {
                face_set_color(
                    grids.face_set(g).map(i32::abs),
                    settings.face_sets_color_seed,
                    settings.face_sets_default_id,
                )
            } else {
                None
            };
            if fset.is_some() {
                default_face_set = false;
            }
            let fset = fset.unwrap_or(WHITE_FACE_SET);

            if smooth {
                for y in 0..size {
                    for x in 0..size {
                        let elem = grids.elem(g, x, y);
                        writer.position(&elem.co);
                        writer.normal(&elem.no);

                        let cmask = if show_mask { mask_to_u8(elem.mask) } else { 0 };
                        empty_mask &= cmask == 0;
                        writer.mask(cmask);

                        writer.color_all(WHITE_COLOR);
                        writer.face_set(fset);
                        writer.uv([0.0; 2]);
                    }
                }
            } else {
                for y in 0..size - 1 {
                    for x in 0..size - 1 {
                        // Same corner order as the smooth quad indices.
                        let elems = [
                            grids.elem(g, x, y),
                            grids.elem(g, x + 1, y),
                            grids.elem(g, x + 1, y + 1),
                            grids.elem(g, x, y + 1),
                        ];
                        let fno = normal_quad(
                            &elems[3].co,
                            &elems[2].co,
                            &elems[1].co,
                            &elems[0].co,
                        );
                        let cmask = if show_mask {
                            mask_to_u8(elems.iter().map(|e| e.mask).sum::<f32>() * 0.25)
                        } else {
                            0
                        };
                        empty_mask &= cmask == 0;

                        for elem in elems {
                            writer.position(&elem.co);
                            writer.normal(&fno);
                            writer.mask(cmask);
                            writer.color_all(WHITE_COLOR);
                            writer.face_set(fset);
                            writer.uv([0.0; 2]);
                        }
                    }
                }
            }
        }

        let written = writer.finish();
        debug_assert_eq!(written, vertex_len);

        self.show_overlay = !empty_mask || !default_face_set;
        log::trace!(
            "NodeBuffers: wrote {} grid vertices, {} visible quads (smooth: {})",
            written,
            visible_quads,
            smooth
        );
        BuildOutcome::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_corners() {
        // 3x3 grid: corners are elements 0, 2, 8 and 6.
        assert_eq!(grid_corners(0, true, 3), [0, 2, 8, 6]);
        assert_eq!(grid_corners(9, true, 3), [9, 11, 17, 15]);
    }

    #[test]
    fn test_flat_corners() {
        // 3x3 grid: four subfaces of four vertices, corners (0,0), (2,0),
        // (2,2) and (0,2) are the first, second, third and fourth element of
        // the subfaces that touch them.
        assert_eq!(grid_corners(0, false, 3), [0, 5, 14, 11]);
    }

    #[test]
    fn test_grid_vert_len() {
        let key = GridKey::new(3);
        assert_eq!(grid_vert_len(&key, true), 9);
        assert_eq!(grid_vert_len(&key, false), 16);
    }
}
