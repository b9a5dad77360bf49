//! Data module: grids and their attribute arrays

pub mod array;
pub mod grid;

pub use array::{ArrayData, DataArray, ScalarType};
pub use grid::{CombinedMesh, MeshPartition, UnstructuredGrid};
