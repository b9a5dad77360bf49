//! Folding partitions into one combined grid.
//!
//! Partitions are assumed disjoint: nothing is deduplicated, points and
//! cells are concatenated in fold order and each partition's connectivity is
//! shifted past the points already accumulated.

use crate::data::array::{ArrayData, DataArray, ScalarType};
use crate::data::grid::{CombinedMesh, MeshPartition};
use std::collections::BTreeMap;
use std::fmt;

/// Name, scalar type and component count of one attribute array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArraySignature {
    pub name: String,
    pub scalar_type: ScalarType,
    pub components: usize,
}

impl fmt::Display for ArraySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} x{})",
            self.name, self.scalar_type, self.components
        )
    }
}

/// Ordered attribute-array layout of the point and cell data of a grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArraySchema {
    pub point: Vec<ArraySignature>,
    pub cell: Vec<ArraySignature>,
}

fn signatures(arrays: &[DataArray]) -> Vec<ArraySignature> {
    arrays
        .iter()
        .map(|a| ArraySignature {
            name: a.name.clone(),
            scalar_type: a.scalar_type(),
            components: a.components,
        })
        .collect()
}

/// Why a partition could not be folded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaMismatch {
    Missing { side: Side, name: String },
    Unexpected { side: Side, name: String },
    Signature {
        side: Side,
        expected: ArraySignature,
        found: ArraySignature,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Point,
    Cell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Point => "point",
            Side::Cell => "cell",
        })
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaMismatch::Missing { side, name } => {
                write!(f, "{side} array `{name}` is missing")
            }
            SchemaMismatch::Unexpected { side, name } => {
                write!(f, "unexpected {side} array `{name}`")
            }
            SchemaMismatch::Signature {
                side,
                expected,
                found,
            } => write!(f, "{side} array expected {expected}, found {found}"),
        }
    }
}

impl ArraySchema {
    pub fn of(grid: &MeshPartition) -> Self {
        Self {
            point: signatures(&grid.point_data),
            cell: signatures(&grid.cell_data),
        }
    }

    /// Compare as name-keyed sets; array order within a partition is free.
    pub fn check(&self, other: &ArraySchema) -> Result<(), SchemaMismatch> {
        for (side, expected, found) in [
            (Side::Point, &self.point, &other.point),
            (Side::Cell, &self.cell, &other.cell),
        ] {
            let found_by_name: BTreeMap<&str, &ArraySignature> =
                found.iter().map(|s| (s.name.as_str(), s)).collect();
            for sig in expected {
                match found_by_name.get(sig.name.as_str()) {
                    None => {
                        return Err(SchemaMismatch::Missing {
                            side,
                            name: sig.name.clone(),
                        });
                    }
                    Some(f) if *f != sig => {
                        return Err(SchemaMismatch::Signature {
                            side,
                            expected: sig.clone(),
                            found: (*f).clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
            if let Some(extra) = found
                .iter()
                .find(|s| !expected.iter().any(|e| e.name == s.name))
            {
                return Err(SchemaMismatch::Unexpected {
                    side,
                    name: extra.name.clone(),
                });
            }
            if found.len() != expected.len() {
                // Duplicate names inside one partition.
                return Err(SchemaMismatch::Unexpected {
                    side,
                    name: found
                        .iter()
                        .find(|s| found.iter().filter(|o| o.name == s.name).count() > 1)
                        .map(|s| s.name.clone())
                        .unwrap_or_default(),
                });
            }
        }
        Ok(())
    }
}

/// Accumulates partitions into a [`CombinedMesh`], one fold at a time.
#[derive(Debug, Default)]
pub struct Appender {
    combined: CombinedMesh,
    schema: Option<ArraySchema>,
    folded: usize,
}

impl Appender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of partitions folded so far.
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Schema established by the first folded partition.
    pub fn schema(&self) -> Option<&ArraySchema> {
        self.schema.as_ref()
    }

    pub fn combined(&self) -> &CombinedMesh {
        &self.combined
    }

    /// Append `partition` to the combined grid.
    ///
    /// On error the combined grid is left untouched. The partition is
    /// consumed so its buffers are released as soon as they are merged.
    pub fn fold(&mut self, partition: MeshPartition) -> Result<(), SchemaMismatch> {
        let incoming = ArraySchema::of(&partition);
        if let Some(schema) = &self.schema {
            schema.check(&incoming)?;
        } else {
            self.combined.point_data = empty_like(&partition.point_data);
            self.combined.cell_data = empty_like(&partition.cell_data);
            self.schema = Some(incoming);
        }

        let MeshPartition {
            points,
            points_type,
            connectivity,
            offsets,
            types,
            point_data,
            cell_data,
        } = partition;
        let combined = &mut self.combined;

        let point_shift = combined.num_points() as i64;
        let offset_shift = combined.connectivity.len() as i64;
        if points_type == ScalarType::Float64 {
            combined.points_type = ScalarType::Float64;
        }
        combined.points.extend(points);
        combined
            .connectivity
            .extend(connectivity.into_iter().map(|p| p + point_shift));
        combined
            .offsets
            .extend(offsets.into_iter().map(|o| o + offset_shift));
        combined.types.extend(types);
        append_by_name(&mut combined.point_data, point_data, Side::Point)?;
        append_by_name(&mut combined.cell_data, cell_data, Side::Cell)?;

        self.folded += 1;
        Ok(())
    }

    /// Finish accumulation and hand out the combined grid.
    pub fn finish(self) -> CombinedMesh {
        self.combined
    }
}

fn empty_like(arrays: &[DataArray]) -> Vec<DataArray> {
    arrays
        .iter()
        .map(|a| DataArray::new(a.name.clone(), a.components, ArrayData::empty(a.scalar_type())))
        .collect()
}

/// Append each incoming array to the target array of the same name.
///
/// The schema check in [`Appender::fold`] makes both errors unreachable there.
fn append_by_name(
    target: &mut [DataArray],
    incoming: Vec<DataArray>,
    side: Side,
) -> Result<(), SchemaMismatch> {
    for array in incoming {
        let DataArray { name, components, data } = array;
        let Some(slot) = target.iter_mut().find(|t| t.name == name) else {
            return Err(SchemaMismatch::Unexpected { side, name });
        };
        let expected = ArraySignature {
            name: slot.name.clone(),
            scalar_type: slot.scalar_type(),
            components: slot.components,
        };
        slot.data.append(data).map_err(|rejected| SchemaMismatch::Signature {
            side,
            expected,
            found: ArraySignature {
                name,
                scalar_type: rejected.scalar_type(),
                components,
            },
        })?;
    }
    Ok(())
}
