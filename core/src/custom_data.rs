//! Per-element attribute layers.
//!
//! A [`CustomData`] block holds the optional attribute layers attached to
//! one element domain (vertices, face corners or faces). Layers are stored in
//! insertion order; within a layer type one layer may be flagged active (the
//! one being edited) and one flagged render (the one used for display).

/// Maximum number of vertex-color layers exposed to the vertex format.
pub const MAX_MCOL: usize = 8;

/// Layer type tag, used to query layers without matching on their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    /// Linear float RGBA color per element
    PropColor,
    /// Sculpt mask value per vertex
    PaintMask,
    /// sRGB 8-bit RGBA color per face corner
    LoopColor,
    /// UV coordinates per face corner
    LoopUv,
    /// Face set id per face
    FaceSets,
}

/// Typed layer contents.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
    PropColor(Vec<[f32; 4]>),
    PaintMask(Vec<f32>),
    LoopColor(Vec<[u8; 4]>),
    LoopUv(Vec<[f32; 2]>),
    FaceSets(Vec<i32>),
}

impl LayerData {
    pub fn layer_type(&self) -> LayerType {
        match self {
            Self::PropColor(_) => LayerType::PropColor,
            Self::PaintMask(_) => LayerType::PaintMask,
            Self::LoopColor(_) => LayerType::LoopColor,
            Self::LoopUv(_) => LayerType::LoopUv,
            Self::FaceSets(_) => LayerType::FaceSets,
        }
    }

    /// Number of elements stored in the layer.
    pub fn len(&self) -> usize {
        match self {
            Self::PropColor(v) => v.len(),
            Self::PaintMask(v) => v.len(),
            Self::LoopColor(v) => v.len(),
            Self::LoopUv(v) => v.len(),
            Self::FaceSets(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named attribute layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomDataLayer {
    pub name: String,
    pub data: LayerData,
    /// Internal layers (e.g. paint scratch data) that are never displayed
    pub temporary: bool,
    pub active: bool,
    pub render: bool,
}

impl CustomDataLayer {
    pub fn new(name: impl Into<String>, data: LayerData) -> Self {
        Self {
            name: name.into(),
            data,
            temporary: false,
            active: false,
            render: false,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    #[inline]
    pub fn layer_type(&self) -> LayerType {
        self.data.layer_type()
    }
}

/// Attribute layers of one element domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomData {
    layers: Vec<CustomDataLayer>,
}

impl CustomData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer (builder style).
    pub fn with_layer(mut self, layer: CustomDataLayer) -> Self {
        self.add_layer(layer);
        self
    }

    /// Add a layer and return its index.
    pub fn add_layer(&mut self, layer: CustomDataLayer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[CustomDataLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&CustomDataLayer> {
        self.layers.get(index)
    }

    pub fn has_layer(&self, ty: LayerType) -> bool {
        self.layers.iter().any(|l| l.layer_type() == ty)
    }

    /// Indices of all layers of a type, in storage order.
    pub fn layer_indices(&self, ty: LayerType) -> impl Iterator<Item = usize> + '_ {
        self.layers
            .iter()
            .enumerate()
            .filter(move |(_, l)| l.layer_type() == ty)
            .map(|(i, _)| i)
    }

    /// Index of the active layer of a type. Falls back to the first layer.
    pub fn active_layer_index(&self, ty: LayerType) -> Option<usize> {
        self.flagged_or_first(ty, |l| l.active)
    }

    /// Index of the render layer of a type. Falls back to the first layer.
    pub fn render_layer_index(&self, ty: LayerType) -> Option<usize> {
        self.flagged_or_first(ty, |l| l.render)
    }

    fn flagged_or_first(
        &self,
        ty: LayerType,
        flag: impl Fn(&CustomDataLayer) -> bool,
    ) -> Option<usize> {
        let mut first = None;
        for i in self.layer_indices(ty) {
            if flag(&self.layers[i]) {
                return Some(i);
            }
            first.get_or_insert(i);
        }
        first
    }

    pub fn active_layer(&self, ty: LayerType) -> Option<&CustomDataLayer> {
        self.active_layer_index(ty).map(|i| &self.layers[i])
    }

    /// Float color data of the layer at `index`, if it is a color layer.
    pub fn prop_color(&self, index: usize) -> Option<&[[f32; 4]]> {
        match self.layers.get(index).map(|l| &l.data) {
            Some(LayerData::PropColor(v)) => Some(v),
            _ => None,
        }
    }

    /// Sculpt mask values of the active mask layer.
    pub fn paint_mask(&self) -> Option<&[f32]> {
        match self.active_layer(LayerType::PaintMask).map(|l| &l.data) {
            Some(LayerData::PaintMask(v)) => Some(v),
            _ => None,
        }
    }

    /// Face set ids of the active face set layer.
    pub fn face_sets(&self) -> Option<&[i32]> {
        match self.active_layer(LayerType::FaceSets).map(|l| &l.data) {
            Some(LayerData::FaceSets(v)) => Some(v),
            _ => None,
        }
    }

    /// Corner colors of the active legacy color layer.
    pub fn loop_colors(&self) -> Option<&[[u8; 4]]> {
        match self.active_layer(LayerType::LoopColor).map(|l| &l.data) {
            Some(LayerData::LoopColor(v)) => Some(v),
            _ => None,
        }
    }

    /// UV coordinates of the active UV layer.
    pub fn active_uv(&self) -> Option<&[[f32; 2]]> {
        match self.active_layer(LayerType::LoopUv).map(|l| &l.data) {
            Some(LayerData::LoopUv(v)) => Some(v),
            _ => None,
        }
    }
}

/// A vertex-color layer selected for a vertex format slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLayerSlot {
    /// Index into [`CustomData::layers`]
    pub layer_index: usize,
    pub name: String,
    pub is_active: bool,
    pub is_render: bool,
}

/// Select the float color layers that get a vertex format slot.
///
/// Temporary layers are skipped and at most [`MAX_MCOL`] layers are taken.
/// When `active_only` is set only the active layer is returned. The render
/// layer always ends up in the last slot.
pub fn vertex_color_layer_slots(vdata: &CustomData, active_only: bool) -> Vec<ColorLayerSlot> {
    let active = vdata.active_layer_index(LayerType::PropColor);
    let render = vdata.render_layer_index(LayerType::PropColor);

    let make_slot = |i: usize| ColorLayerSlot {
        layer_index: i,
        name: vdata.layers[i].name.clone(),
        is_active: Some(i) == active,
        is_render: Some(i) == render,
    };

    if active_only {
        return active.into_iter().map(make_slot).collect();
    }

    let candidates: Vec<usize> = vdata
        .layer_indices(LayerType::PropColor)
        .filter(|&i| !vdata.layers[i].temporary)
        .collect();
    if candidates.len() > MAX_MCOL {
        log::warn!(
            "{} color layers, only the first {MAX_MCOL} are drawn",
            candidates.len()
        );
    }

    let mut slots: Vec<ColorLayerSlot> = candidates
        .into_iter()
        .take(MAX_MCOL)
        .map(make_slot)
        .collect();

    if let Some(pos) = slots.iter().position(|s| s.is_render) {
        let last = slots.len() - 1;
        slots.swap(pos, last);
    }

    slots
}
