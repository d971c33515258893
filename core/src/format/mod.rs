//! Interleaved vertex format descriptions.
//!
//! A [`VertexFormat`] lists the attributes stored in one interleaved vertex
//! buffer, their component formats and byte offsets. Shader-facing names are
//! registered per attribute, plus any number of aliases so a layer can be
//! bound either by its own name or by a generic "active"/"render" name.

mod layout;
mod naming;

pub use layout::*;
pub use naming::*;
