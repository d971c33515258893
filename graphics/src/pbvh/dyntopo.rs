//! Dynamic-topology nodes.
//!
//! Smooth nodes without UVs draw indexed from the node's flattened triangle
//! buffer, one vertex per topology vertex. Everything else draws three
//! vertices per triangle. With `flat_vcol` each triangle is split into a
//! six-triangle fan per corner so vertex colors stay visible on flat faces.

use pbvh_core::custom_data::{CustomData, LayerType};
use pbvh_core::geometry::{DyntopoView, FaceHandle, TopologyTable, VertHandle};
use pbvh_core::math::Bounds;
use pbvh_core::sampling::{WHITE_COLOR, WHITE_FACE_SET, average, face_set_color, mask_to_u8};

use super::{BuildContext, BuildOutcome, NodeBuffers, UpdateSettings, write_vertex_colors};
use crate::index_buffer::IndexBufferBuilder;
use crate::registry::PbvhVertexFormat;
use crate::types::PrimType;
use crate::vertex_buffer::VertexWriter;

/// Per-update sampling state shared by the three paths.
struct Sampler<'a> {
    table: &'a TopologyTable,
    format: &'a PbvhVertexFormat,
    settings: &'a UpdateSettings,
    mask: Option<&'a [f32]>,
    empty_mask: bool,
    default_face_set: bool,
}

impl<'a> Sampler<'a> {
    fn new(
        table: &'a TopologyTable,
        format: &'a PbvhVertexFormat,
        settings: &'a UpdateSettings,
    ) -> Self {
        Self {
            table,
            format,
            settings,
            mask: table.vdata.paint_mask().filter(|_| settings.show_mask()),
            empty_mask: true,
            default_face_set: true,
        }
    }

    fn vert_mask(&self, v: VertHandle) -> f32 {
        self.mask
            .and_then(|m| m.get(v.0 as usize).copied())
            .unwrap_or(0.0)
    }

    fn face_set(&mut self, f: FaceHandle) -> [u8; 3] {
        if !self.settings.show_face_sets() {
            return WHITE_FACE_SET;
        }
        let id = self
            .table
            .pdata
            .face_sets()
            .and_then(|fs| fs.get(f.0 as usize).copied())
            .map(i32::abs);
        match face_set_color(
            id,
            self.settings.face_sets_color_seed,
            self.settings.face_sets_default_id,
        ) {
            Some(color) => {
                self.default_face_set = false;
                color
            }
            None => WHITE_FACE_SET,
        }
    }

    fn mask(&mut self, writer: &mut VertexWriter<'_>, mask: f32) {
        let cmask = mask_to_u8(mask);
        self.empty_mask &= cmask == 0;
        writer.mask(cmask);
    }

    /// Colors of vertex `v`, with the legacy corner color of `l` as fallback.
    fn colors(&self, writer: &mut VertexWriter<'_>, v: VertHandle, l: Option<usize>) {
        if !self.settings.show_vcol() {
            writer.color_all(WHITE_COLOR);
            return;
        }
        let ldata: Option<(&CustomData, usize)> = l.map(|l| (&self.table.ldata, l));
        write_vertex_colors(writer, self.format, Some(&self.table.vdata), ldata, v.0 as usize);
    }

    fn show_overlay(&self) -> bool {
        !self.empty_mask || !self.default_face_set
    }
}

impl NodeBuffers {
    /// Drop what the next dynamic-topology update rebuilds.
    ///
    /// Smooth nodes keep their triangle index buffer so it can be rebuilt in
    /// place. A change of shading mode drops everything.
    pub(super) fn dyntopo_update_free(&mut self, smooth: bool) {
        if self.smooth != smooth {
            log::debug!("NodeBuffers: dyntopo shading changed (smooth: {smooth})");
            self.discard_batches();
            self.discard_index_buffers();
        } else if self.smooth {
            self.triangles = None;
            self.lines = None;
            self.index_lines_buf = None;
        } else {
            self.lines = None;
            self.index_lines_buf = None;
        }
        self.smooth = smooth;
    }

    /// Record an update without visible faces.
    ///
    /// A node without any face asks the next flush to release its storage; a
    /// node whose faces are only hidden keeps it.
    fn dyntopo_mark_empty(&mut self, view: &DyntopoView<'_>) -> BuildOutcome {
        if view.faces.is_empty() {
            log::debug!("NodeBuffers: dyntopo node has no faces, clearing on flush");
            self.clear_on_flush = true;
        }
        self.tot_tri = 0;
        BuildOutcome::Empty
    }

    pub(super) fn update_dyntopo(
        &mut self,
        ctx: &BuildContext,
        view: &DyntopoView<'_>,
        smooth: bool,
        settings: &UpdateSettings,
    ) -> BuildOutcome {
        self.use_bmesh = true;
        self.dyntopo_update_free(smooth);
        self.material_index = view.tribuf.mat_nr;

        let table = view.table;
        let have_uv = table.ldata.has_layer(LayerType::LoopUv);

        if settings.flat_vcol && table.vdata.has_layer(LayerType::PropColor) {
            self.update_dyntopo_flat_vcol(ctx, view, settings)
        } else if smooth && !have_uv {
            self.update_dyntopo_indexed(ctx, view, settings)
        } else {
            self.update_dyntopo_unindexed(ctx, view, settings)
        }
    }

    fn update_dyntopo_indexed(
        &mut self,
        ctx: &BuildContext,
        view: &DyntopoView<'_>,
        settings: &UpdateSettings,
    ) -> BuildOutcome {
        let tribuf = view.tribuf;
        let table = view.table;
        if tribuf.tri_count() == 0 {
            return self.dyntopo_mark_empty(view);
        }

        let vertex_len = tribuf.vert_count();
        if !self.alloc_vertices(ctx, vertex_len) {
            return BuildOutcome::MapFailed;
        }

        let bounds = Bounds::from_points(tribuf.verts.iter().map(|&v| &table.vert(v).co));
        let mut sampler = Sampler::new(table, ctx.format(), settings);
        let Some(mut writer) = self.vertex_writer(ctx, bounds) else {
            return BuildOutcome::MapFailed;
        };

        for &v in &tribuf.verts {
            let vert = table.vert(v);
            writer.position(&vert.co);
            writer.normal(&vert.no);
            let mask = sampler.vert_mask(v);
            sampler.mask(&mut writer, mask);
            sampler.colors(&mut writer, v, None);
            writer.face_set(WHITE_FACE_SET);
            writer.uv([0.0; 2]);
        }
        writer.finish();

        let vertex_len = vertex_len as u32;
        let mut tris = IndexBufferBuilder::new(PrimType::Triangles, tribuf.tri_count(), vertex_len);
        let mut lines =
            IndexBufferBuilder::new(PrimType::Lines, tribuf.tri_count() * 3, vertex_len);
        for tri in &tribuf.tris {
            let [v0, v1, v2] = tri.v;
            tris.add_tri(v0, v1, v2);
            lines.add_line(v0, v1);
            lines.add_line(v1, v2);
            lines.add_line(v2, v0);
        }
        tris.build_into(&mut self.index_buf);
        lines.build_into(&mut self.index_lines_buf);

        self.tot_tri = tribuf.tri_count();
        self.show_overlay = sampler.show_overlay();
        log::trace!(
            "NodeBuffers: dyntopo indexed update, {} vertices, {} triangles",
            vertex_len,
            self.tot_tri
        );
        BuildOutcome::Updated
    }

    fn update_dyntopo_unindexed(
        &mut self,
        ctx: &BuildContext,
        view: &DyntopoView<'_>,
        settings: &UpdateSettings,
    ) -> BuildOutcome {
        let table = view.table;
        let faces = view.visible_faces(view.tribuf.mat_nr);
        if faces.is_empty() {
            return self.dyntopo_mark_empty(view);
        }

        let vertex_len = faces.len() * 3;
        if !self.alloc_vertices(ctx, vertex_len) {
            return BuildOutcome::MapFailed;
        }
        // Drawn without indices.
        self.index_buf = None;
        self.triangles = None;

        let smooth = self.smooth;
        let uvs = table.ldata.active_uv();
        let bounds = Bounds::from_points(
            faces
                .iter()
                .flat_map(|&f| table.face(f).verts.map(|v| &table.vert(v).co)),
        );
        let mut sampler = Sampler::new(table, ctx.format(), settings);
        let Some(mut writer) = self.vertex_writer(ctx, bounds) else {
            return BuildOutcome::MapFailed;
        };

        let mut lines =
            IndexBufferBuilder::new(PrimType::Lines, faces.len() * 3, vertex_len as u32);
        for (i, &f) in faces.iter().enumerate() {
            let face = table.face(f);
            let fmask = average(face.verts.map(|v| sampler.vert_mask(v)));
            let fset = sampler.face_set(f);

            for (corner, &v) in face.verts.iter().enumerate() {
                let vert = table.vert(v);
                let l = TopologyTable::loop_index(f, corner);
                writer.position(&vert.co);
                writer.normal(if smooth { &vert.no } else { &face.no });
                sampler.mask(&mut writer, fmask);
                sampler.colors(&mut writer, v, Some(l));
                writer.face_set(fset);
                writer.uv(uvs.and_then(|uv| uv.get(l).copied()).unwrap_or_default());
            }

            let v_index = i as u32 * 3;
            lines.add_line(v_index, v_index + 1);
            lines.add_line(v_index + 1, v_index + 2);
            lines.add_line(v_index + 2, v_index);
        }
        writer.finish();
        lines.build_into(&mut self.index_lines_buf);

        self.tot_tri = faces.len();
        self.show_overlay = sampler.show_overlay();
        log::trace!(
            "NodeBuffers: dyntopo update, {} triangles (smooth: {})",
            self.tot_tri,
            smooth
        );
        BuildOutcome::Updated
    }

    /// Six triangles per corner: two per half edge around the centroid.
    /// Only the outer triangle edges are drawn in the wireframe.
    fn update_dyntopo_flat_vcol(
        &mut self,
        ctx: &BuildContext,
        view: &DyntopoView<'_>,
        settings: &UpdateSettings,
    ) -> BuildOutcome {
        let table = view.table;
        let faces = view.visible_faces(view.tribuf.mat_nr);
        if faces.is_empty() {
            return self.dyntopo_mark_empty(view);
        }

        let tot_tri = faces.len() * 6;
        let vertex_len = tot_tri * 3;
        if !self.alloc_vertices(ctx, vertex_len) {
            return BuildOutcome::MapFailed;
        }
        self.index_buf = None;
        self.triangles = None;

        let uvs = table.ldata.active_uv();
        let bounds = Bounds::from_points(
            faces
                .iter()
                .flat_map(|&f| table.face(f).verts.map(|v| &table.vert(v).co)),
        );
        let mut sampler = Sampler::new(table, ctx.format(), settings);
        let Some(mut writer) = self.vertex_writer(ctx, bounds) else {
            return BuildOutcome::MapFailed;
        };

        let mut lines =
            IndexBufferBuilder::new(PrimType::Lines, faces.len() * 3, vertex_len as u32);
        let mut v_index = 0u32;
        for &f in &faces {
            let face = table.face(f);
            let cos = table.face_fan_points(f);
            let fset = sampler.face_set(f);
            let v_start = v_index;

            for (j, &v) in face.verts.iter().enumerate() {
                let l = TopologyTable::loop_index(f, j);
                let uv = uvs.and_then(|uv| uv.get(l).copied()).unwrap_or_default();
                let mask = sampler.vert_mask(v);
                let fan = [
                    &cos[j],
                    &cos[3 + j],
                    &cos[6],
                    &cos[j],
                    &cos[6],
                    &cos[3 + (j + 2) % 3],
                ];
                for co in fan {
                    writer.position(co);
                    writer.normal(&face.no);
                    sampler.mask(&mut writer, mask);
                    sampler.colors(&mut writer, v, Some(l));
                    writer.face_set(fset);
                    writer.uv(uv);
                }

                let next = if j == 2 { v_start } else { v_index + 6 };
                lines.add_line(v_index, next);
                v_index += 6;
            }
        }
        writer.finish();
        lines.build_into(&mut self.index_lines_buf);

        self.tot_tri = tot_tri;
        self.show_overlay = sampler.show_overlay();
        log::trace!(
            "NodeBuffers: dyntopo flat vcol update, {} source triangles",
            faces.len()
        );
        BuildOutcome::Updated
    }
}
