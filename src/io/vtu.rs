//! VTK XML unstructured grid (`.vtu`) reader/writer.
//!
//! # Supported input
//! - `ascii`, inline `binary` (base64) and base64 `appended` data arrays.
//! - `UInt32` and `UInt64` block headers, host byte order only.
//! - Any number of `<Piece>` elements; they are folded into one grid.
//!
//! # Limitations
//! - Compressed files (`compressor="..."`) are rejected.
//! - Raw (non-base64) appended data is rejected.
//! - Polyhedral cells (`faces`/`faceoffsets`) are rejected.
//! - `FieldData` is ignored.

use crate::algs::append::Appender;
use crate::data::array::{ArrayData, DataArray, ScalarType, write_ascii_values};
use crate::data::grid::{CombinedMesh, MeshPartition};
use crate::io::binary::{self, HeaderType};
use crate::io::{DataEncoding, MeshReader, MeshWriter};
use crate::mesh_error::VtuError;
use roxmltree::{Document, Node};
use std::borrow::Cow;
use std::io::{self, Read, Write};

const ARRAY_INDENT: &str = "        ";
const VALUE_INDENT: &str = "          ";

const HOST_BYTE_ORDER: &str = if cfg!(target_endian = "little") {
    "LittleEndian"
} else {
    "BigEndian"
};

/// Reader for `.vtu` partition files.
#[derive(Debug, Default, Clone)]
pub struct VtuReader;

/// Writer for combined `.vtu` files.
#[derive(Debug, Default, Clone)]
pub struct VtuWriter {
    encoding: DataEncoding,
}

/// Document-wide settings needed to decode individual arrays.
struct DecodeContext {
    header: HeaderType,
    /// Base64 appended stream with whitespace and the leading `_` removed.
    appended: Option<Result<String, VtuError>>,
}

fn element<'a, 'input>(parent: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    parent
        .children()
        .find(|n| n.is_element() && n.has_tag_name(tag))
}

fn count_attribute(
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<usize, VtuError> {
    let raw = node
        .attribute(attribute)
        .ok_or(VtuError::MissingAttribute { element, attribute })?;
    raw.trim().parse().map_err(|_| {
        VtuError::InvalidTopology(format!("invalid {attribute} `{raw}` on <{element}>"))
    })
}

impl VtuReader {
    /// Parse a `.vtu` document held in memory.
    pub fn read_str(&self, input: &str) -> Result<MeshPartition, VtuError> {
        let doc = Document::parse(input).map_err(|err| VtuError::Xml(err.to_string()))?;
        let root = doc.root_element();
        if !root.has_tag_name("VTKFile") {
            return Err(VtuError::MissingElement("VTKFile"));
        }
        match root.attribute("type") {
            Some("UnstructuredGrid") => {}
            Some(other) => {
                return Err(VtuError::Unsupported(format!("dataset type `{other}`")));
            }
            None => {
                return Err(VtuError::MissingAttribute {
                    element: "VTKFile",
                    attribute: "type",
                });
            }
        }
        let byte_order = root.attribute("byte_order").unwrap_or("LittleEndian");
        if byte_order != HOST_BYTE_ORDER {
            return Err(VtuError::Unsupported(format!(
                "byte order {byte_order} on a {HOST_BYTE_ORDER} host"
            )));
        }
        if let Some(compressor) = root.attribute("compressor").filter(|c| !c.is_empty()) {
            return Err(VtuError::Unsupported(format!("compressed data ({compressor})")));
        }
        let header = match root.attribute("header_type") {
            None => HeaderType::UInt32,
            Some(name) => HeaderType::from_vtk_name(name)
                .ok_or_else(|| VtuError::Unsupported(format!("header type `{name}`")))?,
        };

        let ctx = DecodeContext {
            header,
            appended: element(root, "AppendedData").map(Self::appended_stream),
        };

        let grid = element(root, "UnstructuredGrid")
            .ok_or(VtuError::MissingElement("UnstructuredGrid"))?;
        let mut appender = Appender::new();
        for piece in grid
            .children()
            .filter(|n| n.is_element() && n.has_tag_name("Piece"))
        {
            let partition = Self::read_piece(piece, &ctx)?;
            appender.fold(partition).map_err(|mismatch| {
                VtuError::Unsupported(format!("pieces with differing arrays: {mismatch}"))
            })?;
        }
        Ok(appender.finish())
    }

    fn appended_stream(node: Node<'_, '_>) -> Result<String, VtuError> {
        match node.attribute("encoding") {
            Some("base64") => {}
            Some(other) => {
                return Err(VtuError::Unsupported(format!("{other} appended data")));
            }
            None => {
                return Err(VtuError::MissingAttribute {
                    element: "AppendedData",
                    attribute: "encoding",
                });
            }
        }
        let text = node.text().unwrap_or("").trim_start();
        let stream = text.strip_prefix('_').ok_or_else(|| {
            VtuError::Unsupported("appended data without leading `_` marker".into())
        })?;
        Ok(binary::compact(stream))
    }

    fn read_piece(piece: Node<'_, '_>, ctx: &DecodeContext) -> Result<MeshPartition, VtuError> {
        let num_points = count_attribute(piece, "Piece", "NumberOfPoints")?;
        let num_cells = count_attribute(piece, "Piece", "NumberOfCells")?;
        let mut grid = MeshPartition::default();

        match element(piece, "Points") {
            Some(points) => {
                let node = points
                    .children()
                    .find(|n| n.is_element() && n.has_tag_name("DataArray"))
                    .ok_or(VtuError::MissingElement("DataArray"))?;
                let array = Self::read_array(node, ctx, "Points")?;
                if !array.scalar_type().is_float() || array.components != 3 {
                    return Err(VtuError::array(
                        &array.name,
                        format!(
                            "points must be 3-component floats, found {} x{}",
                            array.scalar_type(),
                            array.components
                        ),
                    ));
                }
                grid.points_type = array.scalar_type();
                grid.points = array
                    .data
                    .to_f64()
                    .map_err(|reason| VtuError::array(&array.name, reason))?;
            }
            None if num_points == 0 => {}
            None => return Err(VtuError::MissingElement("Points")),
        }
        if grid.points.len() != num_points * 3 {
            return Err(VtuError::InvalidTopology(format!(
                "NumberOfPoints is {num_points} but {} coordinates were read",
                grid.points.len()
            )));
        }

        match element(piece, "Cells") {
            Some(cells) => {
                let mut connectivity = None;
                let mut offsets = None;
                let mut types = None;
                for node in cells
                    .children()
                    .filter(|n| n.is_element() && n.has_tag_name("DataArray"))
                {
                    let array = Self::read_array(node, ctx, "")?;
                    match array.name.as_str() {
                        "connectivity" => connectivity = Some(array),
                        "offsets" => offsets = Some(array),
                        "types" => types = Some(array),
                        "faces" | "faceoffsets" => {
                            return Err(VtuError::Unsupported("polyhedral cells".into()));
                        }
                        _ => {}
                    }
                }
                let as_i64 = |array: Option<DataArray>, name: &str| -> Result<Vec<i64>, VtuError> {
                    let array = array.ok_or_else(|| VtuError::array(name, "missing"))?;
                    array.data.to_i64().map_err(|reason| VtuError::array(name, reason))
                };
                grid.connectivity = as_i64(connectivity, "connectivity")?;
                grid.offsets = as_i64(offsets, "offsets")?;
                grid.types = as_i64(types, "types")?
                    .into_iter()
                    .map(|code| {
                        u8::try_from(code)
                            .map_err(|_| VtuError::Unsupported(format!("VTK cell type {code}")))
                    })
                    .collect::<Result<_, _>>()?;
            }
            None if num_cells == 0 => {}
            None => return Err(VtuError::MissingElement("Cells")),
        }
        if grid.types.len() != num_cells {
            return Err(VtuError::InvalidTopology(format!(
                "NumberOfCells is {num_cells} but {} cell types were read",
                grid.types.len()
            )));
        }

        if let Some(data) = element(piece, "PointData") {
            grid.point_data = Self::read_attributes(data, ctx)?;
        }
        if let Some(data) = element(piece, "CellData") {
            grid.cell_data = Self::read_attributes(data, ctx)?;
        }

        grid.validate()?;
        Ok(grid)
    }

    fn read_attributes(
        node: Node<'_, '_>,
        ctx: &DecodeContext,
    ) -> Result<Vec<DataArray>, VtuError> {
        node.children()
            .filter(|n| n.is_element() && n.has_tag_name("DataArray"))
            .map(|n| {
                if n.attribute("Name").is_none() {
                    return Err(VtuError::MissingAttribute {
                        element: "DataArray",
                        attribute: "Name",
                    });
                }
                Self::read_array(n, ctx, "")
            })
            .collect()
    }

    fn read_array(
        node: Node<'_, '_>,
        ctx: &DecodeContext,
        default_name: &str,
    ) -> Result<DataArray, VtuError> {
        let name = node.attribute("Name").unwrap_or(default_name).to_string();
        let type_name = node.attribute("type").ok_or(VtuError::MissingAttribute {
            element: "DataArray",
            attribute: "type",
        })?;
        let ty = ScalarType::from_vtk_name(type_name)
            .ok_or_else(|| VtuError::array(&name, format!("unsupported type `{type_name}`")))?;
        let components = match node.attribute("NumberOfComponents") {
            None => 1,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&c| c > 0)
                .ok_or_else(|| VtuError::array(&name, format!("invalid component count `{raw}`")))?,
        };

        let data = match node.attribute("format").unwrap_or("ascii") {
            "ascii" => ArrayData::parse_ascii(ty, node.text().unwrap_or("")),
            "binary" => {
                let text = binary::compact(node.text().unwrap_or(""));
                binary::decode_block(&text, 0, ctx.header)
                    .and_then(|bytes| ArrayData::from_bytes(ty, &bytes))
            }
            "appended" => {
                let stream = match &ctx.appended {
                    Some(Ok(stream)) => stream,
                    Some(Err(err)) => return Err(err.clone()),
                    None => return Err(VtuError::MissingElement("AppendedData")),
                };
                let offset = node
                    .attribute("offset")
                    .and_then(|o| o.trim().parse::<usize>().ok())
                    .ok_or_else(|| VtuError::array(&name, "missing or invalid offset"))?;
                binary::decode_block(stream, offset, ctx.header)
                    .and_then(|bytes| ArrayData::from_bytes(ty, &bytes))
            }
            other => Err(format!("unsupported format `{other}`")),
        }
        .map_err(|reason| VtuError::array(&name, reason))?;

        if data.len() % components != 0 {
            return Err(VtuError::array(
                &name,
                format!("{} values do not form {components}-component tuples", data.len()),
            ));
        }
        Ok(DataArray::new(name, components, data))
    }
}

impl MeshReader for VtuReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<MeshPartition, VtuError> {
        let mut input = String::new();
        reader
            .read_to_string(&mut input)
            .map_err(|err| VtuError::Xml(err.to_string()))?;
        self.read_str(&input)
    }
}

fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

impl VtuWriter {
    pub fn new(encoding: DataEncoding) -> Self {
        Self { encoding }
    }

    fn format_name(&self) -> &'static str {
        match self.encoding {
            DataEncoding::Ascii => "ascii",
            DataEncoding::Binary => "binary",
        }
    }

    fn open_array<W: Write>(
        &self,
        writer: &mut W,
        ty: ScalarType,
        name: &str,
        components: Option<usize>,
    ) -> io::Result<()> {
        write!(
            writer,
            "{ARRAY_INDENT}<DataArray type=\"{ty}\" Name=\"{}\"",
            escape_attribute(name)
        )?;
        if let Some(components) = components {
            write!(writer, " NumberOfComponents=\"{components}\"")?;
        }
        writeln!(writer, " format=\"{}\">", self.format_name())
    }

    /// One `DataArray` element holding a plain slice of values.
    fn write_slice<W: Write, T: bytemuck::Pod + std::fmt::Display>(
        &self,
        writer: &mut W,
        name: &str,
        ty: ScalarType,
        components: Option<usize>,
        values: &[T],
        per_line: usize,
    ) -> io::Result<()> {
        self.open_array(writer, ty, name, components)?;
        match self.encoding {
            DataEncoding::Ascii => write_ascii_values(writer, VALUE_INDENT, values, per_line)?,
            DataEncoding::Binary => {
                let block = binary::encode_block(bytemuck::cast_slice(values), HeaderType::UInt64);
                writeln!(writer, "{VALUE_INDENT}{block}")?;
            }
        }
        writeln!(writer, "{ARRAY_INDENT}</DataArray>")
    }

    fn write_attribute<W: Write>(&self, writer: &mut W, array: &DataArray) -> io::Result<()> {
        self.open_array(
            writer,
            array.scalar_type(),
            &array.name,
            Some(array.components),
        )?;
        match self.encoding {
            DataEncoding::Ascii => array.data.write_ascii(writer, VALUE_INDENT, array.components)?,
            DataEncoding::Binary => {
                let block = binary::encode_block(array.data.as_bytes(), HeaderType::UInt64);
                writeln!(writer, "{VALUE_INDENT}{block}")?;
            }
        }
        writeln!(writer, "{ARRAY_INDENT}</DataArray>")
    }
}

impl MeshWriter for VtuWriter {
    fn extension(&self) -> &'static str {
        "vtu"
    }

    fn write<W: Write>(&self, mut writer: W, mesh: &CombinedMesh) -> io::Result<()> {
        writeln!(writer, r#"<?xml version="1.0"?>"#)?;
        writeln!(
            writer,
            r#"<VTKFile type="UnstructuredGrid" version="1.0" byte_order="{HOST_BYTE_ORDER}" header_type="UInt64">"#
        )?;
        writeln!(writer, "  <UnstructuredGrid>")?;
        writeln!(
            writer,
            r#"    <Piece NumberOfPoints="{}" NumberOfCells="{}">"#,
            mesh.num_points(),
            mesh.num_cells()
        )?;

        writeln!(writer, "      <PointData>")?;
        for array in &mesh.point_data {
            self.write_attribute(&mut writer, array)?;
        }
        writeln!(writer, "      </PointData>")?;
        writeln!(writer, "      <CellData>")?;
        for array in &mesh.cell_data {
            self.write_attribute(&mut writer, array)?;
        }
        writeln!(writer, "      </CellData>")?;

        writeln!(writer, "      <Points>")?;
        if mesh.points_type == ScalarType::Float64 {
            self.write_slice(&mut writer, "Points", ScalarType::Float64, Some(3), &mesh.points, 3)?;
        } else {
            let narrowed: Vec<f32> = mesh.points.iter().map(|&x| x as f32).collect();
            self.write_slice(&mut writer, "Points", ScalarType::Float32, Some(3), &narrowed, 3)?;
        }
        writeln!(writer, "      </Points>")?;

        writeln!(writer, "      <Cells>")?;
        self.write_slice(&mut writer, "connectivity", ScalarType::Int64, None, &mesh.connectivity, 8)?;
        self.write_slice(&mut writer, "offsets", ScalarType::Int64, None, &mesh.offsets, 8)?;
        self.write_slice(&mut writer, "types", ScalarType::UInt8, None, &mesh.types, 16)?;
        writeln!(writer, "      </Cells>")?;

        writeln!(writer, "    </Piece>")?;
        writeln!(writer, "  </UnstructuredGrid>")?;
        writeln!(writer, "</VTKFile>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_attribute_only_allocates_when_needed() {
        assert!(matches!(escape_attribute("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_attribute(r#"a<"b">&'c'"#), "a&lt;&quot;b&quot;&gt;&amp;&apos;c&apos;");
    }

    #[test]
    fn compressed_input_is_rejected() {
        let doc = r#"<VTKFile type="UnstructuredGrid" compressor="vtkZLibDataCompressor"><UnstructuredGrid/></VTKFile>"#;
        let err = VtuReader.read_str(doc).unwrap_err();
        assert!(matches!(err, VtuError::Unsupported(_)), "{err:?}");
    }

    #[test]
    fn other_dataset_types_are_rejected() {
        let doc = r#"<VTKFile type="PolyData"><PolyData/></VTKFile>"#;
        assert!(matches!(
            VtuReader.read_str(doc),
            Err(VtuError::Unsupported(_))
        ));
    }

    #[test]
    fn written_byte_order_is_the_one_the_reader_accepts() {
        let mut out = Vec::new();
        VtuWriter::new(DataEncoding::Binary)
            .write(&mut out, &CombinedMesh::default())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!(r#"byte_order="{HOST_BYTE_ORDER}""#)));
        assert!(VtuReader.read_str(&text).is_ok());

        let foreign = if HOST_BYTE_ORDER == "LittleEndian" { "BigEndian" } else { "LittleEndian" };
        let doc = text.replace(HOST_BYTE_ORDER, foreign);
        assert!(matches!(
            VtuReader.read_str(&doc),
            Err(VtuError::Unsupported(_))
        ));
    }

    #[test]
    fn grid_without_pieces_is_empty() {
        let doc = r#"<VTKFile type="UnstructuredGrid"><UnstructuredGrid></UnstructuredGrid></VTKFile>"#;
        let grid = VtuReader.read_str(doc).unwrap();
        assert!(grid.is_empty());
    }
}
