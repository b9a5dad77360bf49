//! In-memory unstructured grid: points, cells and their attribute arrays.

use crate::data::array::{DataArray, ScalarType};
use crate::mesh_error::VtuError;
use crate::topology::cell_type::CellType;

/// One unstructured grid in the flat VTK layout.
///
/// Cell `i` uses `connectivity[offsets[i-1]..offsets[i]]` (with an implicit
/// leading zero), and every connectivity entry indexes into `points`.
#[derive(Clone, Debug, PartialEq)]
pub struct UnstructuredGrid {
    /// Interleaved `x y z` coordinates, three values per point.
    pub points: Vec<f64>,
    /// Precision the coordinates are written with.
    pub points_type: ScalarType,
    pub connectivity: Vec<i64>,
    /// End offset of every cell inside `connectivity`.
    pub offsets: Vec<i64>,
    /// VTK cell type code per cell.
    pub types: Vec<u8>,
    pub point_data: Vec<DataArray>,
    pub cell_data: Vec<DataArray>,
}

/// A single partition as loaded from disk.
pub type MeshPartition = UnstructuredGrid;

/// The accumulator every partition of a job is folded into.
pub type CombinedMesh = UnstructuredGrid;

impl Default for UnstructuredGrid {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            points_type: ScalarType::Float32,
            connectivity: Vec::new(),
            offsets: Vec::new(),
            types: Vec::new(),
            point_data: Vec::new(),
            cell_data: Vec::new(),
        }
    }
}

impl UnstructuredGrid {
    pub fn num_points(&self) -> usize {
        self.points.len() / 3
    }

    pub fn num_cells(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_points() == 0 && self.num_cells() == 0
    }

    /// Connectivity slice of cell `idx`.
    pub fn cell(&self, idx: usize) -> Option<&[i64]> {
        let end = usize::try_from(*self.offsets.get(idx)?).ok()?;
        let start = match idx {
            0 => 0,
            _ => usize::try_from(self.offsets[idx - 1]).ok()?,
        };
        self.connectivity.get(start..end)
    }

    pub fn cell_type(&self, idx: usize) -> Option<CellType> {
        self.types.get(idx).copied().and_then(CellType::from_vtk_code)
    }

    /// Iterate `(cell type code, connectivity)` pairs.
    pub fn cells(&self) -> impl Iterator<Item = (u8, &[i64])> + '_ {
        (0..self.num_cells()).filter_map(move |idx| Some((self.types[idx], self.cell(idx)?)))
    }

    pub fn point_array(&self, name: &str) -> Option<&DataArray> {
        self.point_data.iter().find(|a| a.name == name)
    }

    pub fn cell_array(&self, name: &str) -> Option<&DataArray> {
        self.cell_data.iter().find(|a| a.name == name)
    }

    /// Check every structural invariant of the grid.
    ///
    /// - coordinates come in triples;
    /// - `offsets` and `types` have one entry per cell;
    /// - offsets are non-decreasing and end at `connectivity.len()`;
    /// - connectivity entries lie in `[0, num_points)`;
    /// - known fixed-size cell types have the right vertex count;
    /// - attribute arrays are uniquely named and have one tuple per point (or cell).
    pub fn validate(&self) -> Result<(), VtuError> {
        if self.points.len() % 3 != 0 {
            return Err(VtuError::InvalidTopology(format!(
                "{} coordinate values are not a multiple of 3",
                self.points.len()
            )));
        }
        if self.offsets.len() != self.types.len() {
            return Err(VtuError::InvalidTopology(format!(
                "{} offsets for {} cell types",
                self.offsets.len(),
                self.types.len()
            )));
        }

        let num_points = self.num_points() as i64;
        let mut start = 0i64;
        for (idx, (&end, &code)) in self.offsets.iter().zip(&self.types).enumerate() {
            if end < start {
                return Err(VtuError::InvalidTopology(format!(
                    "offset of cell {idx} decreases ({end} < {start})"
                )));
            }
            if end as usize > self.connectivity.len() {
                return Err(VtuError::InvalidTopology(format!(
                    "offset of cell {idx} ({end}) exceeds connectivity length {}",
                    self.connectivity.len()
                )));
            }
            let cell_type = CellType::from_vtk_code(code).ok_or_else(|| {
                VtuError::Unsupported(format!("VTK cell type {code} (cell {idx})"))
            })?;
            let count = (end - start) as usize;
            if let Some(expected) = cell_type.vertex_count() {
                if count != expected {
                    return Err(VtuError::InvalidTopology(format!(
                        "cell {idx} of type {cell_type:?} has {count} vertices, expected {expected}"
                    )));
                }
            }
            start = end;
        }
        if start as usize != self.connectivity.len() {
            return Err(VtuError::InvalidTopology(format!(
                "last offset {start} does not match connectivity length {}",
                self.connectivity.len()
            )));
        }
        if let Some(bad) = self
            .connectivity
            .iter()
            .find(|&&p| p < 0 || p >= num_points)
        {
            return Err(VtuError::InvalidTopology(format!(
                "connectivity index {bad} outside point range 0..{num_points}"
            )));
        }

        for (arrays, expected, what) in [
            (&self.point_data, self.num_points(), "points"),
            (&self.cell_data, self.num_cells(), "cells"),
        ] {
            for (pos, array) in arrays.iter().enumerate() {
                if arrays[..pos].iter().any(|a| a.name == array.name) {
                    return Err(VtuError::array(&array.name, format!("duplicate name on {what}")));
                }
                if array.data.len() != expected * array.components.max(1) {
                    return Err(VtuError::array(
                        &array.name,
                        format!(
                            "{} values for {expected} {what} with {} components",
                            array.data.len(),
                            array.components
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::ArrayData;

    fn triangle() -> UnstructuredGrid {
        UnstructuredGrid {
            points: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            connectivity: vec![0, 1, 2],
            offsets: vec![3],
            types: vec![CellType::Triangle.vtk_code()],
            point_data: vec![DataArray::new("t", 1, ArrayData::Float64(vec![1.0, 2.0, 3.0]))],
            ..Default::default()
        }
    }

    #[test]
    fn valid_grid_passes() {
        let grid = triangle();
        grid.validate().unwrap();
        assert_eq!(grid.cell(0), Some(&[0, 1, 2][..]));
        assert_eq!(grid.cell_type(0), Some(CellType::Triangle));
    }

    #[test]
    fn dangling_index_is_rejected() {
        let mut grid = triangle();
        grid.connectivity[2] = 3;
        assert!(matches!(
            grid.validate(),
            Err(VtuError::InvalidTopology(_))
        ));
    }

    #[test]
    fn wrong_vertex_count_is_rejected() {
        let mut grid = triangle();
        grid.types[0] = CellType::Quad.vtk_code();
        assert!(grid.validate().is_err());
    }

    #[test]
    fn short_attribute_is_rejected() {
        let mut grid = triangle();
        grid.point_data[0].data = ArrayData::Float64(vec![1.0]);
        assert!(matches!(
            grid.validate(),
            Err(VtuError::InvalidArray { .. })
        ));
    }
}
