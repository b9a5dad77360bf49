//! Typed attribute arrays carried by points and cells.
//!
//! Values are kept in their on-disk scalar type so that a combined grid is
//! written back with exactly the precision its partitions were read with.

use bytemuck::Pod;
use itertools::Itertools;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

/// Scalar types understood by VTK XML `DataArray` elements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl ScalarType {
    /// Parse the `type` attribute of a `DataArray`.
    pub fn from_vtk_name(name: &str) -> Option<Self> {
        let ty = match name {
            "Int8" | "Char" => ScalarType::Int8,
            "UInt8" | "UnsignedChar" => ScalarType::UInt8,
            "Int16" => ScalarType::Int16,
            "UInt16" => ScalarType::UInt16,
            "Int32" => ScalarType::Int32,
            "UInt32" => ScalarType::UInt32,
            "Int64" => ScalarType::Int64,
            "UInt64" => ScalarType::UInt64,
            "Float32" => ScalarType::Float32,
            "Float64" => ScalarType::Float64,
            _ => return None,
        };
        Some(ty)
    }

    pub fn vtk_name(self) -> &'static str {
        match self {
            ScalarType::Int8 => "Int8",
            ScalarType::UInt8 => "UInt8",
            ScalarType::Int16 => "Int16",
            ScalarType::UInt16 => "UInt16",
            ScalarType::Int32 => "Int32",
            ScalarType::UInt32 => "UInt32",
            ScalarType::Int64 => "Int64",
            ScalarType::UInt64 => "UInt64",
            ScalarType::Float32 => "Float32",
            ScalarType::Float64 => "Float64",
        }
    }

    /// Size of one value in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vtk_name())
    }
}

/// Flat value storage for one array, tagged by scalar type.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Run `$body` with `$v` bound to the inner `Vec` of whichever variant `$data` is.
macro_rules! with_values {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ArrayData::Int8($v) => $body,
            ArrayData::UInt8($v) => $body,
            ArrayData::Int16($v) => $body,
            ArrayData::UInt16($v) => $body,
            ArrayData::Int32($v) => $body,
            ArrayData::UInt32($v) => $body,
            ArrayData::Int64($v) => $body,
            ArrayData::UInt64($v) => $body,
            ArrayData::Float32($v) => $body,
            ArrayData::Float64($v) => $body,
        }
    };
}

fn parse_values<T: FromStr>(text: &str) -> Result<Vec<T>, String> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| format!("invalid value `{token}`"))
        })
        .collect()
}

fn cast_values<T: Pod>(bytes: &[u8]) -> Result<Vec<T>, String> {
    let size = std::mem::size_of::<T>();
    if bytes.len() % size != 0 {
        return Err(format!(
            "payload of {} bytes is not a multiple of the {size}-byte value size",
            bytes.len()
        ));
    }
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

impl ArrayData {
    /// Empty storage of the given type.
    pub fn empty(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Int8 => ArrayData::Int8(Vec::new()),
            ScalarType::UInt8 => ArrayData::UInt8(Vec::new()),
            ScalarType::Int16 => ArrayData::Int16(Vec::new()),
            ScalarType::UInt16 => ArrayData::UInt16(Vec::new()),
            ScalarType::Int32 => ArrayData::Int32(Vec::new()),
            ScalarType::UInt32 => ArrayData::UInt32(Vec::new()),
            ScalarType::Int64 => ArrayData::Int64(Vec::new()),
            ScalarType::UInt64 => ArrayData::UInt64(Vec::new()),
            ScalarType::Float32 => ArrayData::Float32(Vec::new()),
            ScalarType::Float64 => ArrayData::Float64(Vec::new()),
        }
    }

    /// Parse whitespace-separated ASCII values.
    pub fn parse_ascii(ty: ScalarType, text: &str) -> Result<Self, String> {
        Ok(match ty {
            ScalarType::Int8 => ArrayData::Int8(parse_values(text)?),
            ScalarType::UInt8 => ArrayData::UInt8(parse_values(text)?),
            ScalarType::Int16 => ArrayData::Int16(parse_values(text)?),
            ScalarType::UInt16 => ArrayData::UInt16(parse_values(text)?),
            ScalarType::Int32 => ArrayData::Int32(parse_values(text)?),
            ScalarType::UInt32 => ArrayData::UInt32(parse_values(text)?),
            ScalarType::Int64 => ArrayData::Int64(parse_values(text)?),
            ScalarType::UInt64 => ArrayData::UInt64(parse_values(text)?),
            ScalarType::Float32 => ArrayData::Float32(parse_values(text)?),
            ScalarType::Float64 => ArrayData::Float64(parse_values(text)?),
        })
    }

    /// Reinterpret a native-endian byte payload.
    pub fn from_bytes(ty: ScalarType, bytes: &[u8]) -> Result<Self, String> {
        Ok(match ty {
            ScalarType::Int8 => ArrayData::Int8(cast_values(bytes)?),
            ScalarType::UInt8 => ArrayData::UInt8(bytes.to_vec()),
            ScalarType::Int16 => ArrayData::Int16(cast_values(bytes)?),
            ScalarType::UInt16 => ArrayData::UInt16(cast_values(bytes)?),
            ScalarType::Int32 => ArrayData::Int32(cast_values(bytes)?),
            ScalarType::UInt32 => ArrayData::UInt32(cast_values(bytes)?),
            ScalarType::Int64 => ArrayData::Int64(cast_values(bytes)?),
            ScalarType::UInt64 => ArrayData::UInt64(cast_values(bytes)?),
            ScalarType::Float32 => ArrayData::Float32(cast_values(bytes)?),
            ScalarType::Float64 => ArrayData::Float64(cast_values(bytes)?),
        })
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ArrayData::Int8(_) => ScalarType::Int8,
            ArrayData::UInt8(_) => ScalarType::UInt8,
            ArrayData::Int16(_) => ScalarType::Int16,
            ArrayData::UInt16(_) => ScalarType::UInt16,
            ArrayData::Int32(_) => ScalarType::Int32,
            ArrayData::UInt32(_) => ScalarType::UInt32,
            ArrayData::Int64(_) => ScalarType::Int64,
            ArrayData::UInt64(_) => ScalarType::UInt64,
            ArrayData::Float32(_) => ScalarType::Float32,
            ArrayData::Float64(_) => ScalarType::Float64,
        }
    }

    /// Number of scalar values (not tuples).
    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native-endian view of the values.
    pub fn as_bytes(&self) -> &[u8] {
        with_values!(self, v => bytemuck::cast_slice(v.as_slice()))
    }

    /// Append `other` in place. Returns `other` back if the types differ.
    pub fn append(&mut self, other: ArrayData) -> Result<(), ArrayData> {
        match (self, other) {
            (ArrayData::Int8(a), ArrayData::Int8(b)) => a.extend(b),
            (ArrayData::UInt8(a), ArrayData::UInt8(b)) => a.extend(b),
            (ArrayData::Int16(a), ArrayData::Int16(b)) => a.extend(b),
            (ArrayData::UInt16(a), ArrayData::UInt16(b)) => a.extend(b),
            (ArrayData::Int32(a), ArrayData::Int32(b)) => a.extend(b),
            (ArrayData::UInt32(a), ArrayData::UInt32(b)) => a.extend(b),
            (ArrayData::Int64(a), ArrayData::Int64(b)) => a.extend(b),
            (ArrayData::UInt64(a), ArrayData::UInt64(b)) => a.extend(b),
            (ArrayData::Float32(a), ArrayData::Float32(b)) => a.extend(b),
            (ArrayData::Float64(a), ArrayData::Float64(b)) => a.extend(b),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// Convert integer storage to `i64`, as used for connectivity and offsets.
    pub fn to_i64(&self) -> Result<Vec<i64>, String> {
        fn widen<T: Copy + TryInto<i64>>(values: &[T]) -> Result<Vec<i64>, String> {
            values
                .iter()
                .map(|v| {
                    (*v).try_into()
                        .map_err(|_| "integer value exceeds the Int64 range".to_string())
                })
                .collect()
        }
        match self {
            ArrayData::Int8(v) => widen(v),
            ArrayData::UInt8(v) => widen(v),
            ArrayData::Int16(v) => widen(v),
            ArrayData::UInt16(v) => widen(v),
            ArrayData::Int32(v) => widen(v),
            ArrayData::UInt32(v) => widen(v),
            ArrayData::Int64(v) => Ok(v.clone()),
            ArrayData::UInt64(v) => widen(v),
            ArrayData::Float32(_) | ArrayData::Float64(_) => {
                Err(format!("expected an integer array, found {}", self.scalar_type()))
            }
        }
    }

    /// Convert floating storage to `f64`, as used for point coordinates.
    pub fn to_f64(&self) -> Result<Vec<f64>, String> {
        match self {
            ArrayData::Float32(v) => Ok(v.iter().map(|x| f64::from(*x)).collect()),
            ArrayData::Float64(v) => Ok(v.clone()),
            other => Err(format!(
                "expected a floating-point array, found {}",
                other.scalar_type()
            )),
        }
    }

    /// Write the values as whitespace-separated text, `per_line` values per line.
    pub fn write_ascii<W: Write>(
        &self,
        writer: &mut W,
        indent: &str,
        per_line: usize,
    ) -> io::Result<()> {
        with_values!(self, v => write_ascii_values(writer, indent, v, per_line))
    }
}

/// Write `values` as whitespace-separated text, `per_line` values per line.
pub(crate) fn write_ascii_values<W: Write, T: fmt::Display>(
    writer: &mut W,
    indent: &str,
    values: &[T],
    per_line: usize,
) -> io::Result<()> {
    for chunk in values.chunks(per_line.max(1)) {
        writeln!(writer, "{indent}{}", chunk.iter().join(" "))?;
    }
    Ok(())
}

/// A named attribute array with a fixed number of components per tuple.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    pub name: String,
    pub components: usize,
    pub data: ArrayData,
}

impl DataArray {
    pub fn new(name: impl Into<String>, components: usize, data: ArrayData) -> Self {
        Self {
            name: name.into(),
            components,
            data,
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.data.scalar_type()
    }
}
