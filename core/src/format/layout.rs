//! Vertex attribute and format types.
//!
//! # Example
//!
//! ```ignore
//! let mut format = VertexFormat::new().with_label("pbvh");
//! let pos = format.add_attribute(
//!     "pos",
//!     VertexAttributeSemantic::Position,
//!     VertexAttributeFormat::Float3,
//! );
//! let nor = format.add_attribute(
//!     "nor",
//!     VertexAttributeSemantic::Normal,
//!     VertexAttributeFormat::Snorm16x3,
//! );
//! assert_eq!(format.attribute(nor).unwrap().offset, 12);
//! assert_eq!(format.stride(), 20);
//! ```

/// Semantic meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeSemantic {
    /// Vertex position.
    Position,
    /// Vertex normal.
    Normal,
    /// Sculpt mask.
    Mask,
    /// Face set overlay color.
    FaceSetColor,
    /// Vertex color slot `n`.
    Color(u8),
    /// Texture coordinates.
    TexCoord,
}

/// Data format of a vertex attribute.
///
/// Normalized formats are fetched as floats in `[0, 1]` (unsigned) or
/// `[-1, 1]` (signed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// One normalized 8-bit unsigned integer.
    Unorm8,
    /// Three normalized 8-bit unsigned integers.
    Unorm8x3,
    /// Three normalized 8-bit signed integers.
    Snorm8x3,
    /// Three normalized 16-bit unsigned integers.
    Unorm16x3,
    /// Four normalized 16-bit unsigned integers.
    Unorm16x4,
    /// Three normalized 16-bit signed integers.
    Snorm16x3,
}

impl VertexAttributeFormat {
    /// Size in bytes of the attribute data.
    pub fn size(&self) -> usize {
        match self {
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Unorm8 => 1,
            Self::Unorm8x3 | Self::Snorm8x3 => 3,
            Self::Unorm16x3 | Self::Snorm16x3 => 6,
            Self::Unorm16x4 => 8,
        }
    }

    /// Size in bytes including padding to the 4-byte attribute alignment.
    pub fn padded_size(&self) -> usize {
        (self.size() + 3) & !3
    }

    /// Number of components.
    pub fn components(&self) -> usize {
        match self {
            Self::Unorm8 => 1,
            Self::Float2 => 2,
            Self::Float3 | Self::Unorm8x3 | Self::Snorm8x3 | Self::Unorm16x3 | Self::Snorm16x3 => {
                3
            }
            Self::Unorm16x4 => 4,
        }
    }

    /// Whether integer data is normalized when fetched.
    pub fn is_normalized(&self) -> bool {
        !matches!(self, Self::Float2 | Self::Float3)
    }
}

/// Handle of an attribute within a [`VertexFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(u32);

impl AttrId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A single vertex attribute description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader-facing name.
    pub name: String,
    /// Semantic meaning of this attribute.
    pub semantic: VertexAttributeSemantic,
    /// Data format of this attribute.
    pub format: VertexAttributeFormat,
    /// Byte offset within one vertex.
    pub offset: u32,
    /// Additional names the attribute can be bound by.
    pub aliases: Vec<String>,
}

impl VertexAttribute {
    /// Check whether the attribute answers to `name`.
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

/// Layout of one interleaved vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    attributes: Vec<VertexAttribute>,
    stride: u32,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl VertexFormat {
    /// Create a new empty format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Append an attribute at the end of the vertex.
    pub fn add_attribute(
        &mut self,
        name: impl Into<String>,
        semantic: VertexAttributeSemantic,
        format: VertexAttributeFormat,
    ) -> AttrId {
        let id = AttrId(self.attributes.len() as u32);
        self.attributes.push(VertexAttribute {
            name: name.into(),
            semantic,
            format,
            offset: self.stride,
            aliases: Vec::new(),
        });
        self.stride += format.padded_size() as u32;
        id
    }

    /// Register an additional name for an attribute.
    pub fn add_alias(&mut self, id: AttrId, alias: impl Into<String>) {
        if let Some(attr) = self.attributes.get_mut(id.index()) {
            attr.aliases.push(alias.into());
        }
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> usize {
        self.stride as usize
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Whether any attribute has been added yet.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attribute(&self, id: AttrId) -> Option<&VertexAttribute> {
        self.attributes.get(id.index())
    }

    /// Find an attribute by name or alias.
    pub fn find(&self, name: &str) -> Option<AttrId> {
        self.attributes
            .iter()
            .position(|attr| attr.has_name(name))
            .map(|i| AttrId(i as u32))
    }

    /// Check if this format has a specific semantic.
    pub fn has_semantic(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attributes.iter().any(|attr| attr.semantic == semantic)
    }

    /// Get an attribute by semantic.
    pub fn get_attribute(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|attr| attr.semantic == semantic)
    }

    /// Validate the format (attributes fit the stride, names are unique).
    pub fn validate(&self) -> Result<(), String> {
        for attr in &self.attributes {
            let end = attr.offset as usize + attr.format.size();
            if end > self.stride() {
                return Err(format!(
                    "Attribute '{}' ends at byte {} but stride is {}",
                    attr.name, end, self.stride
                ));
            }
        }
        let mut names = std::collections::HashSet::new();
        for attr in &self.attributes {
            for name in std::iter::once(&attr.name).chain(&attr.aliases) {
                if !names.insert(name.as_str()) {
                    return Err(format!("Attribute name '{name}' registered twice"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_padded() {
        let mut format = VertexFormat::new();
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

        assert_eq!(format.attribute(pos).unwrap().offset, 0);
        assert_eq!(format.attribute(nor).unwrap().offset, 12);
        assert_eq!(format.attribute(msk).unwrap().offset, 20);
        assert_eq!(format.stride(), 24);
        assert!(format.validate().is_ok());
    }

    #[test]
    fn test_find_by_alias() {
        let mut format = VertexFormat::new();
        format.add_attribute(
            "pos",
            VertexAttributeSemantic::Position,
            VertexAttributeFormat::Float3,
        );
        let col = format.add_attribute(
            "c0",
            VertexAttributeSemantic::Color(0),
            VertexAttributeFormat::Unorm16x4,
        );
        format.add_alias(col, "ac");

        assert_eq!(format.find("ac"), Some(col));
        assert_eq!(format.find("c0"), Some(col));
        assert_eq!(format.find("missing"), None);
        assert!(format.has_semantic(VertexAttributeSemantic::Color(0)));
        assert!(!format.has_semantic(VertexAttributeSemantic::Color(1)));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut format = VertexFormat::new();
        let a = format.add_attribute(
            "c",
            VertexAttributeSemantic::Color(0),
            VertexAttributeFormat::Unorm16x4,
        );
        format.add_attribute(
            "c1",
            VertexAttributeSemantic::Color(1),
            VertexAttributeFormat::Unorm16x4,
        );
        format.add_alias(a, "c1");
        assert!(format.validate().is_err());
    }

    #[test]
    fn test_format_sizes() {
        assert_eq!(VertexAttributeFormat::Unorm8.padded_size(), 4);
        assert_eq!(VertexAttributeFormat::Unorm16x4.padded_size(), 8);
        assert_eq!(VertexAttributeFormat::Snorm8x3.components(), 3);
        assert!(!VertexAttributeFormat::Float2.is_normalized());
    }
}
