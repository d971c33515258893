//! Error types for geometry validation.

/// Inconsistencies found when validating a geometry view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// An element references another element that does not exist.
    IndexOutOfRange {
        /// Kind of the referenced element (e.g. "vertex").
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Number of elements of that kind.
        len: usize,
    },
    /// A custom data layer does not have one entry per element.
    LayerSizeMismatch {
        /// Layer name.
        layer: String,
        /// Number of entries in the layer.
        len: usize,
        /// Number of elements in the domain.
        expected: usize,
    },
    /// A grid does not hold `grid_size²` elements.
    InvalidGrid {
        /// Grid index.
        grid: usize,
        /// Reason the grid was rejected.
        reason: String,
    },
    /// A polygon has fewer than three corners.
    DegeneratePolygon(usize),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { kind, index, len } => {
                write!(f, "{kind} index {index} out of range (len {len})")
            }
            Self::LayerSizeMismatch {
                layer,
                len,
                expected,
            } => write!(
                f,
                "layer '{layer}' has {len} entries, expected {expected}"
            ),
            Self::InvalidGrid { grid, reason } => write!(f, "invalid grid {grid}: {reason}"),
            Self::DegeneratePolygon(poly) => write!(f, "polygon {poly} has fewer than 3 corners"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Check `index < len`.
pub(crate) fn check_index(
    kind: &'static str,
    index: usize,
    len: usize,
) -> Result<(), GeometryError> {
    if index < len {
        Ok(())
    } else {
        Err(GeometryError::IndexOutOfRange { kind, index, len })
    }
}

/// Check every layer of a domain has one entry per element.
pub(crate) fn check_layers(
    data: &crate::custom_data::CustomData,
    expected: usize,
) -> Result<(), GeometryError> {
    for layer in data.layers() {
        if layer.data.len() != expected {
            return Err(GeometryError::LayerSizeMismatch {
                layer: layer.name.clone(),
                len: layer.data.len(),
                expected,
            });
        }
    }
    Ok(())
}
