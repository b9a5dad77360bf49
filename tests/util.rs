#![allow(dead_code)]
use mesh_combine::data::array::{ArrayData, DataArray, ScalarType};
use mesh_combine::data::grid::UnstructuredGrid;
use mesh_combine::io::vtu::VtuWriter;
use mesh_combine::io::{DataEncoding, MeshWriter};
use mesh_combine::topology::cell_type::CellType;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// `n` points along x starting at `x0`, one vertex cell per point and a
/// line between consecutive points, with point and cell attributes.
pub fn strip(n: usize, x0: f64) -> UnstructuredGrid {
    let mut grid = UnstructuredGrid {
        points: (0..n).flat_map(|i| [x0 + i as f64, 0.5, 0.0]).collect(),
        points_type: ScalarType::Float32,
        ..Default::default()
    };
    for i in 0..n {
        grid.connectivity.push(i as i64);
        grid.offsets.push(grid.connectivity.len() as i64);
        grid.types.push(CellType::Vertex.vtk_code());
    }
    for i in 1..n {
        grid.connectivity.extend([i as i64 - 1, i as i64]);
        grid.offsets.push(grid.connectivity.len() as i64);
        grid.types.push(CellType::Line.vtk_code());
    }
    let cells = grid.types.len();
    grid.point_data = vec![
        DataArray::new(
            "temperature",
            1,
            ArrayData::Float64((0..n).map(|i| 280.0 + x0 + i as f64 * 0.25).collect()),
        ),
        DataArray::new(
            "velocity",
            3,
            ArrayData::Float32((0..n * 3).map(|i| i as f32 * 0.5).collect()),
        ),
    ];
    grid.cell_data = vec![DataArray::new(
        "rank",
        1,
        ArrayData::Int32(vec![x0 as i32; cells]),
    )];
    grid
}

pub fn write_vtu(path: &Path, grid: &UnstructuredGrid, encoding: DataEncoding) {
    let file = File::create(path).expect("create vtu");
    VtuWriter::new(encoding)
        .write(BufWriter::new(file), grid)
        .expect("write vtu");
}

/// Index file in the layout parallel VTK writers produce.
pub fn write_pvtu(path: &Path, pieces: &[&str]) {
    let mut text = String::from(
        r#"<?xml version="1.0"?>
<VTKFile type="PUnstructuredGrid" version="0.1" byte_order="LittleEndian">
  <PUnstructuredGrid GhostLevel="0">
    <PPointData>
      <PDataArray type="Float64" Name="temperature"/>
      <PDataArray type="Float32" Name="velocity" NumberOfComponents="3"/>
    </PPointData>
    <PCellData>
      <PDataArray type="Int32" Name="rank"/>
    </PCellData>
    <PPoints>
      <PDataArray type="Float32" NumberOfComponents="3"/>
    </PPoints>
"#,
    );
    for piece in pieces {
        text.push_str(&format!("    <Piece Source=\"{piece}\"/>\n"));
    }
    text.push_str("  </PUnstructuredGrid>\n</VTKFile>\n");
    fs::write(path, text).expect("write pvtu");
}

/// Write `<name>_<i>.vtu` for every size plus `<name>.pvtu` into `dir`.
pub fn dataset(dir: &Path, name: &str, sizes: &[usize]) -> PathBuf {
    let mut pieces = Vec::new();
    let mut x0 = 0.0;
    for (i, &n) in sizes.iter().enumerate() {
        let piece = format!("{name}_{i}.vtu");
        write_vtu(&dir.join(&piece), &strip(n, x0), DataEncoding::Binary);
        pieces.push(piece);
        x0 += n as f64;
    }
    let refs: Vec<&str> = pieces.iter().map(String::as_str).collect();
    let index = dir.join(format!("{name}.pvtu"));
    write_pvtu(&index, &refs);
    index
}

/// Sorted file names directly inside `dir`.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
