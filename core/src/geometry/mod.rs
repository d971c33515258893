//! Read-only geometry views for the three sculpt representations.
//!
//! - [`mesh`] - static meshes tessellated into loop triangles
//! - [`grids`] - multiresolution grids
//! - [`dyntopo`] - dynamic-topology tables and flattened triangle buffers
//!
//! Views borrow caller-owned storage; the owned types next to them
//! ([`Mesh`], [`GridSet`], [`TopologyTable`]) exist for tools and tests.

pub mod dyntopo;
mod error;
pub mod grids;
pub mod mesh;

pub use dyntopo::{
    BmFace, BmVert, DyntopoView, FaceHandle, TopologyTable, TriBufTri, TriBuffer, VertHandle,
};
pub use error::GeometryError;
pub use grids::{GridElem, GridFlagMat, GridKey, GridSet, GridsView};
pub use mesh::{LoopTri, Mesh, MeshEdge, MeshLoop, MeshPoly, MeshVertex, MeshView};
