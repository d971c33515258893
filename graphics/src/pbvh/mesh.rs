//! Static mesh nodes.
//!
//! Every visible loop triangle gets its own three vertices, so flat and
//! smooth shading share one layout. The wireframe only draws triangle sides
//! that follow a real mesh edge.

use pbvh_core::geometry::MeshView;
use pbvh_core::math::{Bounds, FALLBACK_NORMAL};
use pbvh_core::sampling::{
    WHITE_COLOR, WHITE_FACE_SET, average, face_set_color, is_looptri_visible, mask_to_u8,
};

use super::{BuildContext, BuildOutcome, NodeBuffers, UpdateSettings, write_vertex_colors};
use crate::index_buffer::IndexBufferBuilder;
use crate::types::PrimType;

impl NodeBuffers {
    /// Recount visible triangles, pick the shading mode and rebuild the
    /// wireframe. Returns the visible triangles in node order.
    pub(super) fn build_mesh_topology(&mut self, mesh: &MeshView<'_>, faces: &[u32]) -> Vec<u32> {
        let visible: Vec<u32> = faces
            .iter()
            .copied()
            .filter(|&f| is_looptri_visible(mesh, &mesh.looptris[f as usize]))
            .collect();

        self.tot_tri = visible.len();
        let Some(&first) = visible.first() else {
            return visible;
        };
        let first_poly = &mesh.polys[mesh.looptris[first as usize].poly as usize];
        self.smooth = first_poly.smooth;
        self.material_index = first_poly.mat_nr;

        let edges: Vec<[Option<u32>; 3]> = visible
            .iter()
            .map(|&f| mesh.looptri_real_edges(&mesh.looptris[f as usize]))
            .collect();
        let tot_real_edges = edges.iter().flatten().filter(|e| e.is_some()).count();

        let vertex_len = (visible.len() * 3) as u32;
        let mut lines = IndexBufferBuilder::new(PrimType::Lines, tot_real_edges, vertex_len);
        for (t, real) in edges.iter().enumerate() {
            let v_index = t as u32 * 3;
            for (side, edge) in real.iter().enumerate() {
                if edge.is_some() {
                    lines.add_line(v_index + side as u32, v_index + (side as u32 + 1) % 3);
                }
            }
        }
        lines.build_into(&mut self.index_lines_buf);

        log::trace!(
            "NodeBuffers: mesh node has {} visible triangles, {} wire edges",
            visible.len(),
            tot_real_edges
        );
        visible
    }

    pub(super) fn update_mesh(
        &mut self,
        ctx: &BuildContext,
        mesh: &MeshView<'_>,
        faces: &[u32],
        settings: &UpdateSettings,
    ) -> BuildOutcome {
        let visible_len = faces
            .iter()
            .filter(|&&f| is_looptri_visible(mesh, &mesh.looptris[f as usize]))
            .count();
        if visible_len == 0 {
            self.tot_tri = 0;
            return BuildOutcome::Empty;
        }
        if !self.alloc_vertices(ctx, visible_len * 3) {
            return BuildOutcome::MapFailed;
        }

        let visible = self.build_mesh_topology(mesh, faces);
        let smooth = self.smooth;

        let vmask = mesh.vdata.paint_mask().filter(|_| settings.show_mask());
        let face_sets = mesh.pdata.face_sets().filter(|_| settings.show_face_sets());
        let show_vcol = settings.show_vcol();
        let color_vdata = Some(mesh.vdata).filter(|_| show_vcol && settings.use_vertex_colors);
        let color_ldata = mesh.ldata;
        let uvs = mesh.ldata.active_uv();

        let bounds = Bounds::from_points(visible.iter().flat_map(|&f| {
            mesh.looptri_verts(&mesh.looptris[f as usize])
                .map(|v| &mesh.verts[v as usize].co)
        }));

        let format = ctx.format();
        let Some(mut writer) = self.vertex_writer(ctx, bounds) else {
            return BuildOutcome::MapFailed;
        };

        let mut empty_mask = true;
        let mut default_face_set = true;
        let mut cached_poly = None;
        let mut fno = FALLBACK_NORMAL;

        for &f in &visible {
            let lt = &mesh.looptris[f as usize];
            let vtri = mesh.looptri_verts(lt);

            let fset = face_sets
                .and_then(|fs| {
                    face_set_color(
                        Some(fs[lt.poly as usize].abs()),
                        settings.face_sets_color_seed,
                        settings.face_sets_default_id,
                    )
                })
                .inspect(|_| default_face_set = false)
                .unwrap_or(WHITE_FACE_SET);

            let fmask = vmask.map(|m| average(vtri.map(|v| m[v as usize])));

            if !smooth && cached_poly != Some(lt.poly) {
                fno = mesh.poly_normal(lt.poly as usize);
                cached_poly = Some(lt.poly);
            }

            for (j, &v) in vtri.iter().enumerate() {
                let vert = &mesh.verts[v as usize];
                let l = lt.tri[j] as usize;

                writer.position(&vert.co);
                if smooth {
                    writer.normal_short(&vert.no);
                } else {
                    writer.normal(&fno);
                }

                let cmask = match (vmask, fmask) {
                    (Some(m), _) if smooth => mask_to_u8(m[v as usize]),
                    (_, Some(fmask)) => mask_to_u8(fmask),
                    _ => 0,
                };
                empty_mask &= cmask == 0;
                writer.mask(cmask);

                if show_vcol {
                    write_vertex_colors(
                        &mut writer,
                        format,
                        color_vdata,
                        Some((color_ldata, l)),
                        v as usize,
                    );
                } else {
                    writer.color_all(WHITE_COLOR);
                }

                writer.face_set(fset);
                writer.uv(uvs.and_then(|uv| uv.get(l).copied()).unwrap_or_default());
            }
        }

        let written = writer.finish();
        debug_assert_eq!(written, visible.len() * 3);

        self.show_overlay = !empty_mask || !default_face_set;
        self.use_bmesh = false;
        log::trace!(
            "NodeBuffers: wrote {} mesh vertices (smooth: {})",
            written,
            smooth
        );
        BuildOutcome::Updated
    }
}
