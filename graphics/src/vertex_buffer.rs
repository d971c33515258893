//! Host-side interleaved vertex buffers.
//!
//! A [`VertexBuffer`] owns one byte allocation laid out by the shared
//! [`PbvhVertexFormat`]. Builders stream vertices into it through a
//! [`VertexWriter`], which keeps one [`AttrCursor`] per attribute. Each
//! cursor starts at its attribute's offset and advances by the stride, so a
//! build is a single linear pass without per-vertex offset math.

use std::sync::Arc;

use bytemuck::Pod;
use pbvh_core::format::AttrId;
use pbvh_core::math::{
    Mat4, nalgebra::Vector4, normal_float_to_byte, normal_float_to_short, normal_short_to_float,
    unit_float_to_u16_clamp,
};

use crate::registry::PbvhVertexFormat;
use crate::types::ResourceId;

/// Interleaved vertex storage of one node.
#[derive(Debug)]
pub struct VertexBuffer {
    id: ResourceId,
    format: Arc<PbvhVertexFormat>,
    data: Option<Vec<u8>>,
    vertex_len: usize,
    dirty: bool,
}

impl VertexBuffer {
    /// Create an empty buffer for `format`. No storage is allocated.
    pub fn new(format: Arc<PbvhVertexFormat>) -> Self {
        Self {
            id: ResourceId::next(),
            format,
            data: None,
            vertex_len: 0,
            dirty: false,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn format(&self) -> &Arc<PbvhVertexFormat> {
        &self.format
    }

    /// Number of vertices the storage holds.
    pub fn vertex_len(&self) -> usize {
        self.vertex_len
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Raw interleaved bytes.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Whether the storage was written since the last upload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_uploaded(&mut self) {
        self.dirty = false;
    }

    /// Size the storage for `vertex_len` vertices of `format`.
    ///
    /// Storage is only reallocated when the vertex count or the format
    /// changed. Returns `false` without touching the current contents when
    /// the allocation would exceed `max_bytes` or cannot be reserved.
    pub fn data_alloc(
        &mut self,
        format: &Arc<PbvhVertexFormat>,
        vertex_len: usize,
        max_bytes: u64,
    ) -> bool {
        let same_format = Arc::ptr_eq(&self.format, format) || *self.format == **format;
        if same_format && self.vertex_len == vertex_len && self.data.is_some() {
            return true;
        }

        let Some(bytes) = vertex_len.checked_mul(format.stride()) else {
            log::warn!("VertexBuffer: {vertex_len} vertices overflow the address space");
            return false;
        };
        if bytes as u64 > max_bytes {
            log::warn!("VertexBuffer: {bytes} bytes exceed the device limit of {max_bytes}");
            return false;
        }

        let mut data = Vec::new();
        if data.try_reserve_exact(bytes).is_err() {
            log::warn!("VertexBuffer: failed to reserve {bytes} bytes");
            return false;
        }
        data.resize(bytes, 0);

        log::debug!(
            "VertexBuffer {:?}: allocated {} vertices ({} bytes)",
            self.id,
            vertex_len,
            bytes
        );
        self.format = Arc::clone(format);
        self.data = Some(data);
        self.vertex_len = vertex_len;
        true
    }

    /// Start writing vertices from the beginning of the storage.
    ///
    /// `to_unit` maps positions into the unit cube for the quantized
    /// position encoding; it is ignored for float positions. Returns `None`
    /// if no storage was allocated.
    pub fn writer(&mut self, to_unit: Option<Mat4>) -> Option<VertexWriter<'_>> {
        let data = self.data.as_mut()?;
        self.dirty = true;
        Some(VertexWriter::new(&self.format, data, to_unit))
    }

    /// Read one attribute value of one vertex.
    pub fn read<T: Pod>(&self, attr: AttrId, vertex: usize) -> Option<T> {
        let data = self.data.as_ref()?;
        let attribute = self.format.format().attribute(attr)?;
        let start = vertex * self.format.stride() + attribute.offset as usize;
        let bytes = data.get(start..start + std::mem::size_of::<T>())?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}

/// Sequential write position of one attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttrCursor {
    next: usize,
    stride: usize,
}

impl AttrCursor {
    fn new(format: &PbvhVertexFormat, attr: AttrId) -> Option<Self> {
        let attribute = format.format().attribute(attr)?;
        Some(Self {
            next: attribute.offset as usize,
            stride: format.stride(),
        })
    }

    /// Write `value` for the current vertex and advance to the next one.
    #[inline]
    fn write<T: Pod>(&mut self, data: &mut [u8], value: &T) {
        let bytes = bytemuck::bytes_of(value);
        let end = self.next + bytes.len();
        debug_assert!(end <= data.len(), "vertex write past the allocation");
        if let Some(dst) = data.get_mut(self.next..end) {
            dst.copy_from_slice(bytes);
        }
        self.next += self.stride;
    }
}

/// Streams vertices into a [`VertexBuffer`].
///
/// Every attribute advances on its own; callers write each attribute once
/// per vertex. Attributes missing from the format (mask, colors, face sets
/// and UVs in quantized mode, extra color slots) are skipped.
pub struct VertexWriter<'a> {
    data: &'a mut [u8],
    /// Position transform of the quantized encoding, `None` for floats
    to_unit: Option<Mat4>,
    pos: Option<AttrCursor>,
    nor: Option<AttrCursor>,
    msk: Option<AttrCursor>,
    col: Vec<AttrCursor>,
    fset: Option<AttrCursor>,
    uv: Option<AttrCursor>,
    written: usize,
}

impl<'a> VertexWriter<'a> {
    fn new(format: &PbvhVertexFormat, data: &'a mut [u8], to_unit: Option<Mat4>) -> Self {
        let cursor = |attr: Option<AttrId>| attr.and_then(|a| AttrCursor::new(format, a));
        Self {
            data,
            to_unit: format
                .is_quantized()
                .then(|| to_unit.unwrap_or_else(Mat4::identity)),
            pos: cursor(Some(format.pos)),
            nor: cursor(Some(format.nor)),
            msk: cursor(format.msk),
            col: format
                .col
                .iter()
                .filter_map(|&a| AttrCursor::new(format, a))
                .collect(),
            fset: cursor(format.fset),
            uv: cursor(format.uv),
            written: 0,
        }
    }

    /// Number of color slots in the format.
    pub fn color_slots(&self) -> usize {
        self.col.len()
    }

    pub fn position(&mut self, co: &[f32; 3]) {
        let Some(cursor) = self.pos.as_mut() else {
            return;
        };
        match &self.to_unit {
            Some(m) => {
                let p = m * Vector4::new(co[0], co[1], co[2], 1.0);
                let q = [p.x, p.y, p.z].map(unit_float_to_u16_clamp);
                cursor.write(self.data, &q);
            }
            None => cursor.write(self.data, co),
        }
        self.written += 1;
    }

    /// Write a unit float normal.
    pub fn normal(&mut self, no: &[f32; 3]) {
        let Some(cursor) = self.nor.as_mut() else {
            return;
        };
        if self.to_unit.is_some() {
            cursor.write(self.data, &normal_float_to_byte(no));
        } else {
            cursor.write(self.data, &normal_float_to_short(no));
        }
    }

    /// Write a normal already in the signed 16-bit encoding.
    pub fn normal_short(&mut self, no: &[i16; 3]) {
        if self.to_unit.is_some() {
            self.normal(&normal_short_to_float(no));
        } else if let Some(cursor) = self.nor.as_mut() {
            cursor.write(self.data, no);
        }
    }

    pub fn mask(&mut self, mask: u8) {
        if let Some(cursor) = self.msk.as_mut() {
            cursor.write(self.data, &mask);
        }
    }

    pub fn color(&mut self, slot: usize, color: [u16; 4]) {
        if let Some(cursor) = self.col.get_mut(slot) {
            cursor.write(self.data, &color);
        }
    }

    /// Write the same color into every slot.
    pub fn color_all(&mut self, color: [u16; 4]) {
        for cursor in &mut self.col {
            cursor.write(self.data, &color);
        }
    }

    pub fn face_set(&mut self, color: [u8; 3]) {
        if let Some(cursor) = self.fset.as_mut() {
            cursor.write(self.data, &color);
        }
    }

    pub fn uv(&mut self, uv: [f32; 2]) {
        if let Some(cursor) = self.uv.as_mut() {
            cursor.write(self.data, &uv);
        }
    }

    /// Number of vertices written so far, counted by positions.
    pub fn finish(self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FormatConfig;
    use pbvh_core::math::Bounds;

    fn format(quantized: bool) -> Arc<PbvhVertexFormat> {
        Arc::new(PbvhVertexFormat::build(
            FormatConfig::new().with_quantized(quantized),
        ))
    }

    #[test]
    fn test_cursors_advance_independently() {
        let format = format(false);
        let mut vbo = VertexBuffer::new(Arc::clone(&format));
        assert!(vbo.data_alloc(&format, 2, u64::MAX));

        let mut w = vbo.writer(None).unwrap();
        w.position(&[1.0, 2.0, 3.0]);
        w.position(&[4.0, 5.0, 6.0]);
        w.normal(&[0.0, 0.0, 1.0]);
        w.normal(&[0.0, 1.0, 0.0]);
        w.mask(10);
        w.mask(20);
        assert_eq!(w.finish(), 2);

        assert_eq!(vbo.read::<[f32; 3]>(format.pos, 1), Some([4.0, 5.0, 6.0]));
        assert_eq!(vbo.read::<[i16; 3]>(format.nor, 0), Some([0, 0, 32767]));
        assert_eq!(vbo.read::<u8>(format.msk.unwrap(), 1), Some(20));
        assert!(vbo.is_dirty());
    }

    #[test]
    fn test_alloc_reuses_storage() {
        let format = format(false);
        let mut vbo = VertexBuffer::new(Arc::clone(&format));
        assert!(vbo.writer(None).is_none());
        assert!(vbo.data_alloc(&format, 3, u64::MAX));
        vbo.writer(None).unwrap().position(&[7.0, 7.0, 7.0]);
        // Same size and format keeps the contents.
        assert!(vbo.data_alloc(&format, 3, u64::MAX));
        assert_eq!(vbo.read::<[f32; 3]>(format.pos, 0), Some([7.0; 3]));
        assert!(vbo.data_alloc(&format, 4, u64::MAX));
        assert_eq!(vbo.vertex_len(), 4);
        assert_eq!(vbo.data().unwrap().len(), 4 * format.stride());
    }

    #[test]
    fn test_alloc_over_limit_keeps_previous_data() {
        let format = format(false);
        let mut vbo = VertexBuffer::new(Arc::clone(&format));
        assert!(vbo.data_alloc(&format, 1, u64::MAX));
        let limit = (format.stride() * 2) as u64;
        assert!(!vbo.data_alloc(&format, 3, limit));
        assert_eq!(vbo.vertex_len(), 1);
        assert!(vbo.has_data());
    }

    #[test]
    fn test_quantized_positions() {
        let format = format(true);
        let bounds = Bounds {
            min: [0.0; 3],
            max: [2.0, 4.0, 0.0],
        };
        let mut vbo = VertexBuffer::new(Arc::clone(&format));
        assert!(vbo.data_alloc(&format, 1, u64::MAX));
        let mut w = vbo.writer(Some(bounds.to_unit_matrix())).unwrap();
        w.position(&[1.0, 4.0, 0.0]);
        w.normal(&[0.0, 0.0, 1.0]);
        // Absent attributes are skipped.
        w.mask(255);
        w.color(0, [1; 4]);
        w.finish();
        assert_eq!(
            vbo.read::<[u16; 3]>(format.pos, 0),
            Some([32768, u16::MAX, 0])
        );
        assert_eq!(vbo.read::<[i8; 3]>(format.nor, 0), Some([0, 0, 127]));
    }
}
