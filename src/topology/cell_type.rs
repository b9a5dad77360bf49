//! VTK cell type codes accepted by the partition reader.

/// Cell types that may appear in the `types` array of an unstructured grid.
///
/// Polyhedra (code 42) are not represented; they need the separate
/// `faces`/`faceoffsets` stream, which is not merged.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum CellType {
    /// 0D vertex.
    Vertex,
    /// Set of unconnected vertices.
    PolyVertex,
    /// 1D segment.
    Line,
    /// Chain of segments.
    PolyLine,
    /// 2D simplex.
    Triangle,
    /// Strip of triangles sharing edges.
    TriangleStrip,
    /// Planar polygon with any vertex count.
    Polygon,
    /// Axis-aligned quad.
    Pixel,
    /// 2D tensor-product cell.
    Quad,
    /// 3D simplex.
    Tetra,
    /// Axis-aligned hex.
    Voxel,
    /// 3D tensor-product cell.
    Hexahedron,
    /// 3D wedge/prism.
    Wedge,
    /// 3D pyramid.
    Pyramid,
    PentagonalPrism,
    HexagonalPrism,
    QuadraticEdge,
    QuadraticTriangle,
    QuadraticQuad,
    QuadraticTetra,
    QuadraticHexahedron,
    QuadraticWedge,
    QuadraticPyramid,
    BiquadraticQuad,
    TriquadraticHexahedron,
    /// Arbitrary-order Lagrange cells; vertex count depends on the order.
    Lagrange(u8),
}

impl CellType {
    /// Decode a VTK cell type code.
    pub fn from_vtk_code(code: u8) -> Option<Self> {
        let ty = match code {
            1 => CellType::Vertex,
            2 => CellType::PolyVertex,
            3 => CellType::Line,
            4 => CellType::PolyLine,
            5 => CellType::Triangle,
            6 => CellType::TriangleStrip,
            7 => CellType::Polygon,
            8 => CellType::Pixel,
            9 => CellType::Quad,
            10 => CellType::Tetra,
            11 => CellType::Voxel,
            12 => CellType::Hexahedron,
            13 => CellType::Wedge,
            14 => CellType::Pyramid,
            15 => CellType::PentagonalPrism,
            16 => CellType::HexagonalPrism,
            21 => CellType::QuadraticEdge,
            22 => CellType::QuadraticTriangle,
            23 => CellType::QuadraticQuad,
            24 => CellType::QuadraticTetra,
            25 => CellType::QuadraticHexahedron,
            26 => CellType::QuadraticWedge,
            27 => CellType::QuadraticPyramid,
            28 => CellType::BiquadraticQuad,
            29 => CellType::TriquadraticHexahedron,
            68..=74 => CellType::Lagrange(code),
            _ => return None,
        };
        Some(ty)
    }

    /// The VTK code written to the `types` array.
    pub fn vtk_code(self) -> u8 {
        match self {
            CellType::Vertex => 1,
            CellType::PolyVertex => 2,
            CellType::Line => 3,
            CellType::PolyLine => 4,
            CellType::Triangle => 5,
            CellType::TriangleStrip => 6,
            CellType::Polygon => 7,
            CellType::Pixel => 8,
            CellType::Quad => 9,
            CellType::Tetra => 10,
            CellType::Voxel => 11,
            CellType::Hexahedron => 12,
            CellType::Wedge => 13,
            CellType::Pyramid => 14,
            CellType::PentagonalPrism => 15,
            CellType::HexagonalPrism => 16,
            CellType::QuadraticEdge => 21,
            CellType::QuadraticTriangle => 22,
            CellType::QuadraticQuad => 23,
            CellType::QuadraticTetra => 24,
            CellType::QuadraticHexahedron => 25,
            CellType::QuadraticWedge => 26,
            CellType::QuadraticPyramid => 27,
            CellType::BiquadraticQuad => 28,
            CellType::TriquadraticHexahedron => 29,
            CellType::Lagrange(code) => code,
        }
    }

    /// Number of vertices for fixed-size cells, `None` for variable-size ones.
    pub fn vertex_count(self) -> Option<usize> {
        match self {
            CellType::Vertex => Some(1),
            CellType::Line => Some(2),
            CellType::Triangle | CellType::QuadraticEdge => Some(3),
            CellType::Pixel | CellType::Quad | CellType::Tetra => Some(4),
            CellType::Pyramid => Some(5),
            CellType::Wedge | CellType::QuadraticTriangle => Some(6),
            CellType::Voxel | CellType::Hexahedron | CellType::QuadraticQuad => Some(8),
            CellType::BiquadraticQuad => Some(9),
            CellType::PentagonalPrism | CellType::QuadraticTetra => Some(10),
            CellType::HexagonalPrism => Some(12),
            CellType::QuadraticPyramid => Some(13),
            CellType::QuadraticWedge => Some(15),
            CellType::QuadraticHexahedron => Some(20),
            CellType::TriquadraticHexahedron => Some(27),
            CellType::PolyVertex
            | CellType::PolyLine
            | CellType::TriangleStrip
            | CellType::Polygon
            | CellType::Lagrange(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vtk_codes_round_trip() {
        for code in 0..=u8::MAX {
            if let Some(ty) = CellType::from_vtk_code(code) {
                assert_eq!(ty.vtk_code(), code);
            }
        }
    }

    #[test]
    fn polyhedron_is_rejected() {
        assert_eq!(CellType::from_vtk_code(42), None);
    }

    #[test]
    fn fixed_sizes() {
        assert_eq!(CellType::Tetra.vertex_count(), Some(4));
        assert_eq!(CellType::Polygon.vertex_count(), None);
    }
}
