use crate::MeshIndex;


pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;


/// Two triangles covering a quad whose vertices are given clockwise, with
/// vertex 3 shared as the pivot of both triangles.
pub const QUAD_INDICES: [MeshIndex; INDICES_PER_QUAD] = [
    3, 1, 0,
    3, 2, 1,
];
