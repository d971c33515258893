//! Vertex format registry.
//!
//! All node buffers share one interleaved vertex format, derived from the
//! attribute layers of the mesh being sculpted. The registry lives on the
//! [`GraphicsDevice`](crate::GraphicsDevice) and is rebuilt from the owning
//! thread before node builds fan out; builders only read an `Arc` snapshot.

use std::sync::Arc;

use pbvh_core::custom_data::{
    ColorLayerSlot, CustomData, LayerType, MAX_MCOL, vertex_color_layer_slots,
};
use pbvh_core::format::{
    AttrId, VertexAttributeFormat, VertexAttributeSemantic, VertexFormat, layer_attr_aliases,
};

/// The active UV layer a format was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UvLayerInfo {
    pub name: String,
    pub is_active: bool,
    pub is_render: bool,
}

/// Attribute-layer configuration a vertex format is derived from.
///
/// Two equal configurations always produce the same format, which is what
/// makes [`FormatRegistry::ensure`] idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatConfig {
    /// Float color layers with a slot, render layer last
    pub color_layers: Vec<ColorLayerSlot>,
    /// Active UV layer, if the corner data has one
    pub uv_layer: Option<UvLayerInfo>,
    /// Store positions as normalized 16-bit values inside the node bounds
    pub quantized: bool,
}

impl FormatConfig {
    /// Configuration without any custom layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the configuration from vertex and corner layers.
    pub fn from_custom_data(
        vdata: Option<&CustomData>,
        ldata: Option<&CustomData>,
        active_only: bool,
    ) -> Self {
        let color_layers = vdata
            .map(|vdata| vertex_color_layer_slots(vdata, active_only))
            .unwrap_or_default();

        let uv_layer = ldata.and_then(|ldata| {
            let active = ldata.active_layer_index(LayerType::LoopUv)?;
            let render = ldata.render_layer_index(LayerType::LoopUv);
            let layer = ldata.layer(active)?;
            Some(UvLayerInfo {
                name: layer.name.clone(),
                is_active: true,
                is_render: render == Some(active),
            })
        });

        Self {
            color_layers,
            uv_layer,
            quantized: false,
        }
    }

    /// Enable the quantized position encoding.
    pub fn with_quantized(mut self, quantized: bool) -> Self {
        self.quantized = quantized;
        self
    }
}

/// The shared node vertex format and its attribute handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbvhVertexFormat {
    format: VertexFormat,
    config: FormatConfig,
    pub pos: AttrId,
    pub nor: AttrId,
    pub msk: Option<AttrId>,
    /// One attribute per color slot; never empty outside quantized mode
    pub col: Vec<AttrId>,
    pub fset: Option<AttrId>,
    pub uv: Option<AttrId>,
}

impl PbvhVertexFormat {
    /// Build the format for a configuration.
    ///
    /// Standard layout: `pos` (3×f32), `nor` (3×i16 normalized), `msk`
    /// (u8 normalized), one `c` slot per color layer (4×u16 normalized, at
    /// least one), `fset` (3×u8 normalized) and `uvs` (2×f32). Quantized
    /// layout: `pos` (3×u16 normalized) and `nor` (3×i8 normalized) only.
    pub fn build(config: FormatConfig) -> Self {
        let mut format = VertexFormat::new().with_label("pbvh");

        if config.quantized {
            let pos = format.add_attribute(
                "pos",
                VertexAttributeSemantic::Position,
                VertexAttributeFormat::Unorm16x3,
            );
            let nor = format.add_attribute(
                "nor",
                VertexAttributeSemantic::Normal,
                VertexAttributeFormat::Snorm8x3,
            );
            return Self {
                format,
                config,
                pos,
                nor,
                msk: None,
                col: Vec::new(),
                fset: None,
                uv: None,
            };
        }

        let pos = format.add_attribute(
            "pos",
            VertexAttributeSemantic::Position,
            VertexAttributeFormat::Float3,
        );
        let nor = format.add_attribute(
            "nor",
            VertexAttributeSemantic::Normal,
            VertexAttributeFormat::Snorm16x3,
        );
        let msk = format.add_attribute(
            "msk",
            VertexAttributeSemantic::Mask,
            VertexAttributeFormat::Unorm8,
        );

        let mut col = Vec::with_capacity(config.color_layers.len().max(1));
        for (slot, layer) in config.color_layers.iter().take(MAX_MCOL).enumerate() {
            let id = format.add_attribute(
                format!("c{slot}"),
                VertexAttributeSemantic::Color(slot as u8),
                VertexAttributeFormat::Unorm16x4,
            );
            for alias in layer_attr_aliases("c", &layer.name, layer.is_active, layer.is_render) {
                format.add_alias(id, alias);
            }
            col.push(id);
        }
        // Shaders always bind a color, even without color layers.
        if col.is_empty() {
            let id = format.add_attribute(
                "c",
                VertexAttributeSemantic::Color(0),
                VertexAttributeFormat::Unorm16x4,
            );
            format.add_alias(id, "ac");
            col.push(id);
        }

        let fset = format.add_attribute(
            "fset",
            VertexAttributeSemantic::FaceSetColor,
            VertexAttributeFormat::Unorm8x3,
        );

        let uv = format.add_attribute(
            "uvs",
            VertexAttributeSemantic::TexCoord,
            VertexAttributeFormat::Float2,
        );
        format.add_alias(uv, "u");
        if let Some(layer) = &config.uv_layer {
            for alias in layer_attr_aliases("u", &layer.name, layer.is_active, layer.is_render) {
                format.add_alias(uv, alias);
            }
        }

        Self {
            format,
            config,
            pos,
            nor,
            msk: Some(msk),
            col,
            fset: Some(fset),
            uv: Some(uv),
        }
    }

    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    pub fn stride(&self) -> usize {
        self.format.stride()
    }

    pub fn is_quantized(&self) -> bool {
        self.config.quantized
    }

    /// Number of color attributes.
    pub fn color_slot_count(&self) -> usize {
        self.col.len()
    }

    /// Vertex layer feeding a color slot; `None` for the placeholder slot.
    pub fn color_layer_index(&self, slot: usize) -> Option<usize> {
        self.config.color_layers.get(slot).map(|l| l.layer_index)
    }
}

/// Process-wide format state owned by the device.
#[derive(Debug, Default)]
pub(crate) struct FormatRegistry {
    current: Option<Arc<PbvhVertexFormat>>,
    rebuilds: u64,
}

impl FormatRegistry {
    /// Return the format for `config`, rebuilding only if it changed.
    pub fn ensure(&mut self, config: FormatConfig) -> Arc<PbvhVertexFormat> {
        if let Some(current) = &self.current {
            if current.config == config {
                return Arc::clone(current);
            }
        }

        let format = Arc::new(PbvhVertexFormat::build(config));
        self.rebuilds += 1;
        log::debug!(
            "FormatRegistry: rebuilt vertex format #{} ({} attributes, stride {})",
            self.rebuilds,
            format.format().attribute_count(),
            format.stride()
        );
        self.current = Some(Arc::clone(&format));
        format
    }

    pub fn invalidate(&mut self) {
        if self.current.take().is_some() {
            log::debug!("FormatRegistry: invalidated");
        }
    }

    pub fn current(&self) -> Option<Arc<PbvhVertexFormat>> {
        self.current.clone()
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}
