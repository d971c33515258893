//! Per-update display settings.

use bitflags::bitflags;

bitflags! {
    /// Optional overlays computed during an update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: u32 {
        /// Write mask values.
        const SHOW_MASK = 1 << 0;
        /// Write face set overlay colors.
        const SHOW_FACE_SETS = 1 << 1;
        /// Write vertex colors.
        const SHOW_VCOL = 1 << 2;
    }
}

impl Default for UpdateFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Settings shared by every node of one update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSettings {
    pub flags: UpdateFlags,
    /// Seed of the face set palette
    pub face_sets_color_seed: i32,
    /// Face set drawn white
    pub face_sets_default_id: i32,
    /// Draw float vertex color layers of static meshes
    pub use_vertex_colors: bool,
    /// Fan-encode vertex colors of flat dynamic-topology nodes
    pub flat_vcol: bool,
    /// Only the active color layer gets a slot
    pub active_vcol_only: bool,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            flags: UpdateFlags::empty(),
            face_sets_color_seed: 0,
            face_sets_default_id: 1,
            use_vertex_colors: false,
            flat_vcol: false,
            active_vcol_only: false,
        }
    }
}

impl UpdateSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: UpdateFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_face_sets(mut self, seed: i32, default_id: i32) -> Self {
        self.face_sets_color_seed = seed;
        self.face_sets_default_id = default_id;
        self
    }

    pub fn with_vertex_colors(mut self, use_vertex_colors: bool) -> Self {
        self.use_vertex_colors = use_vertex_colors;
        self
    }

    pub fn with_flat_vcol(mut self, flat_vcol: bool) -> Self {
        self.flat_vcol = flat_vcol;
        self
    }

    pub fn with_active_vcol_only(mut self, active_only: bool) -> Self {
        self.active_vcol_only = active_only;
        self
    }

    #[inline]
    pub fn show_mask(&self) -> bool {
        self.flags.contains(UpdateFlags::SHOW_MASK)
    }

    #[inline]
    pub fn show_face_sets(&self) -> bool {
        self.flags.contains(UpdateFlags::SHOW_FACE_SETS)
    }

    #[inline]
    pub fn show_vcol(&self) -> bool {
        self.flags.contains(UpdateFlags::SHOW_VCOL)
    }
}
