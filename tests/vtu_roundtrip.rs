mod util;

use mesh_combine::data::array::{ArrayData, DataArray, ScalarType};
use mesh_combine::io::binary::{HeaderType, encode_block};
use mesh_combine::io::vtu::{VtuReader, VtuWriter};
use mesh_combine::io::{DataEncoding, MeshReader, MeshWriter};
use mesh_combine::mesh_error::VtuError;
use mesh_combine::topology::cell_type::CellType;

fn to_bytes(writer: &VtuWriter, grid: &mesh_combine::data::grid::UnstructuredGrid) -> Vec<u8> {
    let mut out = Vec::new();
    writer.write(&mut out, grid).expect("write");
    out
}

#[test]
fn ascii_round_trip() {
    let grid = util::strip(4, 1.0);
    let bytes = to_bytes(&VtuWriter::default(), &grid);
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.contains(r#"format="ascii""#));
    let back = VtuReader.read(bytes.as_slice()).expect("read");
    assert_eq!(back, grid);
}

#[test]
fn binary_round_trip() {
    let grid = util::strip(7, -3.0);
    let bytes = to_bytes(&VtuWriter::new(DataEncoding::Binary), &grid);
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.contains(r#"format="binary""#));
    assert!(text.contains(r#"header_type="UInt64""#));
    let back = VtuReader.read(bytes.as_slice()).expect("read");
    assert_eq!(back, grid);
}

#[test]
fn output_is_deterministic_and_ordered() {
    let grid = util::strip(3, 0.0);
    let writer = VtuWriter::default();
    let first = to_bytes(&writer, &grid);
    assert_eq!(first, to_bytes(&writer, &grid));

    let text = String::from_utf8(first).unwrap();
    let at = |needle: &str| text.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
    assert!(at("<PointData>") < at("<CellData>"));
    assert!(at("<CellData>") < at("<Points>"));
    assert!(at("<Points>") < at("<Cells>"));
    assert!(text.contains(r#"<DataArray type="Int64" Name="connectivity" format="ascii">"#));
    assert!(text.contains(r#"<DataArray type="UInt8" Name="types" format="ascii">"#));
}

#[test]
fn float64_points_are_written_as_float64() {
    let mut grid = util::strip(2, 0.0);
    grid.points_type = ScalarType::Float64;
    grid.points[0] = 0.1;
    let bytes = to_bytes(&VtuWriter::default(), &grid);
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.contains(r#"<DataArray type="Float64" Name="Points" NumberOfComponents="3""#));
    let back = VtuReader.read(bytes.as_slice()).unwrap();
    assert_eq!(back.points[0], 0.1);
    assert_eq!(back.points_type, ScalarType::Float64);
}

#[test]
fn attribute_names_are_escaped() {
    let mut grid = util::strip(1, 0.0);
    grid.point_data.push(DataArray::new(
        r#"p<"q">&r"#,
        1,
        ArrayData::UInt16(vec![9]),
    ));
    let bytes = to_bytes(&VtuWriter::default(), &grid);
    let back = VtuReader.read(bytes.as_slice()).unwrap();
    assert_eq!(back.point_array(r#"p<"q">&r"#).unwrap().data, ArrayData::UInt16(vec![9]));
}

#[test]
fn hand_written_ascii_file_with_int32_cells() {
    let doc = r#"<?xml version="1.0"?>
<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian">
  <UnstructuredGrid>
    <Piece NumberOfPoints="4" NumberOfCells="2">
      <PointData Scalars="p">
        <DataArray type="Float32" Name="p" format="ascii">0 1 2 3</DataArray>
      </PointData>
      <Points>
        <DataArray type="Float64" NumberOfComponents="3" format="ascii">
          0 0 0  1 0 0  1 1 0  0 1 0
        </DataArray>
      </Points>
      <Cells>
        <DataArray type="Int32" Name="connectivity" format="ascii">0 1 2 0 2 3</DataArray>
        <DataArray type="Int32" Name="offsets" format="ascii">3 6</DataArray>
        <DataArray type="UInt8" Name="types" format="ascii">5 5</DataArray>
      </Cells>
    </Piece>
  </UnstructuredGrid>
</VTKFile>
"#;
    let grid = VtuReader.read(doc.as_bytes()).expect("read");
    assert_eq!(grid.num_points(), 4);
    assert_eq!(grid.num_cells(), 2);
    assert_eq!(grid.points_type, ScalarType::Float64);
    assert_eq!(grid.cell(1), Some(&[0, 2, 3][..]));
    assert_eq!(grid.cell_type(0), Some(CellType::Triangle));
    assert_eq!(
        grid.point_array("p").unwrap().data,
        ArrayData::Float32(vec![0.0, 1.0, 2.0, 3.0])
    );
}

#[test]
fn appended_base64_with_uint32_headers() {
    let points: Vec<f32> = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let conn: Vec<i32> = vec![0, 1, 2];
    let offs: Vec<i32> = vec![3];
    let types: Vec<u8> = vec![5];
    let temp: Vec<f64> = vec![1.5, 2.5, 3.5];

    let blocks = [
        encode_block(bytemuck::cast_slice(&temp), HeaderType::UInt32),
        encode_block(bytemuck::cast_slice(&points), HeaderType::UInt32),
        encode_block(bytemuck::cast_slice(&conn), HeaderType::UInt32),
        encode_block(bytemuck::cast_slice(&offs), HeaderType::UInt32),
        encode_block(&types, HeaderType::UInt32),
    ];
    let mut offsets = Vec::new();
    let mut stream = String::new();
    for block in &blocks {
        offsets.push(stream.len());
        stream.push_str(block);
    }

    let doc = format!(
        r#"<VTKFile type="UnstructuredGrid" version="1.0" byte_order="LittleEndian" header_type="UInt32">
  <UnstructuredGrid>
    <Piece NumberOfPoints="3" NumberOfCells="1">
      <PointData>
        <DataArray type="Float64" Name="temp" format="appended" offset="{}"/>
      </PointData>
      <Points>
        <DataArray type="Float32" NumberOfComponents="3" format="appended" offset="{}"/>
      </Points>
      <Cells>
        <DataArray type="Int32" Name="connectivity" format="appended" offset="{}"/>
        <DataArray type="Int32" Name="offsets" format="appended" offset="{}"/>
        <DataArray type="UInt8" Name="types" format="appended" offset="{}"/>
      </Cells>
    </Piece>
  </UnstructuredGrid>
  <AppendedData encoding="base64">
   _{}
  </AppendedData>
</VTKFile>"#,
        offsets[0], offsets[1], offsets[2], offsets[3], offsets[4], stream
    );
    if cfg!(target_endian = "big") {
        return;
    }
    let grid = VtuReader.read(doc.as_bytes()).expect("read appended");
    assert_eq!(grid.num_points(), 3);
    assert_eq!(grid.connectivity, vec![0, 1, 2]);
    assert_eq!(grid.offsets, vec![3]);
    assert_eq!(grid.points_type, ScalarType::Float32);
    assert_eq!(grid.point_array("temp").unwrap().data, ArrayData::Float64(temp));
}

#[test]
fn several_pieces_are_folded_in_order() {
    let one = String::from_utf8(to_bytes(&VtuWriter::default(), &util::strip(2, 0.0))).unwrap();
    let two = String::from_utf8(to_bytes(&VtuWriter::default(), &util::strip(3, 10.0))).unwrap();
    let piece = |doc: &str| {
        let start = doc.find("<Piece").unwrap();
        let end = doc.find("</Piece>").unwrap() + "</Piece>".len();
        doc[start..end].to_string()
    };
    let merged = format!(
        "<VTKFile type=\"UnstructuredGrid\"><UnstructuredGrid>{}{}</UnstructuredGrid></VTKFile>",
        piece(&one),
        piece(&two)
    );
    let grid = VtuReader.read(merged.as_bytes()).expect("read");
    assert_eq!(grid.num_points(), 5);
    assert_eq!(grid.num_cells(), 3 + 5);
    assert_eq!(grid.points[3 * 2], 10.0);
    grid.validate().unwrap();
}

#[test]
fn dangling_connectivity_is_rejected() {
    let doc = r#"<VTKFile type="UnstructuredGrid"><UnstructuredGrid>
  <Piece NumberOfPoints="1" NumberOfCells="1">
    <Points><DataArray type="Float32" NumberOfComponents="3" format="ascii">0 0 0</DataArray></Points>
    <Cells>
      <DataArray type="Int64" Name="connectivity" format="ascii">0 1</DataArray>
      <DataArray type="Int64" Name="offsets" format="ascii">2</DataArray>
      <DataArray type="UInt8" Name="types" format="ascii">3</DataArray>
    </Cells>
  </Piece>
</UnstructuredGrid></VTKFile>"#;
    let err = VtuReader.read(doc.as_bytes()).unwrap_err();
    assert!(matches!(err, VtuError::InvalidTopology(_)), "{err:?}");
}

#[test]
fn point_count_must_match_header() {
    let doc = r#"<VTKFile type="UnstructuredGrid"><UnstructuredGrid>
  <Piece NumberOfPoints="2" NumberOfCells="0">
    <Points><DataArray type="Float32" NumberOfComponents="3" format="ascii">0 0 0</DataArray></Points>
  </Piece>
</UnstructuredGrid></VTKFile>"#;
    assert!(matches!(
        VtuReader.read(doc.as_bytes()),
        Err(VtuError::InvalidTopology(_))
    ));
}

#[test]
fn truncated_xml_is_an_xml_error() {
    let bytes = to_bytes(&VtuWriter::default(), &util::strip(3, 0.0));
    let cut = &bytes[..bytes.len() / 2];
    assert!(matches!(VtuReader.read(cut), Err(VtuError::Xml(_))));
}

#[test]
fn oversized_block_length_is_a_read_error() {
    use base64::Engine;
    use mesh_combine::io::read_partition;
    use mesh_combine::mesh_error::ErrorKind;

    let mut raw = u64::MAX.to_ne_bytes().to_vec();
    raw.extend_from_slice(&[0; 12]);
    let block = base64::engine::general_purpose::STANDARD.encode(raw);
    let doc = format!(
        r#"<VTKFile type="UnstructuredGrid" version="1.0" header_type="UInt64">
  <UnstructuredGrid>
    <Piece NumberOfPoints="1" NumberOfCells="0">
      <Points>
        <DataArray type="Float32" NumberOfComponents="3" format="binary">{block}</DataArray>
      </Points>
    </Piece>
  </UnstructuredGrid>
</VTKFile>"#
    );
    if cfg!(target_endian = "big") {
        return;
    }
    let err = VtuReader.read(doc.as_bytes()).unwrap_err();
    assert!(matches!(err, VtuError::InvalidArray { .. }), "{err:?}");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.vtu");
    std::fs::write(&path, &doc).unwrap();
    let err = read_partition(&VtuReader, &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Read);
}
