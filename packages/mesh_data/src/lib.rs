
#[allow(unused_imports)]
#[macro_use]
extern crate tracing;


mod quad;
mod sink;


pub use crate::{
    quad::{
        QUAD_INDICES,
        VERTICES_PER_QUAD,
        INDICES_PER_QUAD,
    },
    sink::MeshSink,
};


pub type MeshIndex = u32;


/// Vertex and index buffers of a mesh being built on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<MeshIndex>,
}

impl<V> Default for MeshData<V> {
    fn default() -> Self {
        MeshData {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl<V> MeshData<V> {
    pub fn new() -> Self {
        MeshData::default()
    }

    /// Empty mesh with room reserved up front, so that building a large mesh
    /// doesn't reallocate.
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        trace!("reserving mesh buffers for {} vertices, {} indices", vertices, indices);
        MeshData {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Append a submesh, whose indices are relative to its own vertices.
    pub fn extend<I, J>(&mut self, submesh_vertices: I, submesh_indices: J)
    where
        I: IntoIterator<Item=V>,
        J: IntoIterator<Item=MeshIndex>,
    {
        let start_num_vertices = self.vertices.len() as MeshIndex;
        self.vertices.extend(submesh_vertices);
        let num_vertices = self.vertices.len();
        let indices = submesh_indices
            .into_iter()
            .map(|mut vert_idx| {
                vert_idx += start_num_vertices;
                debug_assert!(
                    (vert_idx as usize) < num_vertices,
                    "index extends beyond own submesh",
                );
                vert_idx
            });
        self.indices.extend(indices);
        debug_assert!(
            self.indices.len() % 3 == 0,
            "submesh contains non-multiple of 3 number of indices",
        );
    }

    /// Append a quad given as 4 vertices in clockwise order.
    pub fn add_quad(&mut self, quad: [V; VERTICES_PER_QUAD]) {
        self.extend(quad, QUAD_INDICES);
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn validate_indices(&self) {
        assert!(self.indices.len() % 3 == 0);
        for &index in &self.indices {
            assert!((index as usize) < self.vertices.len());
        }
    }

    pub fn triangles<'s>(&'s self) -> impl Iterator<Item=[MeshIndex; 3]> + 's
    {
        self.indices
            .chunks(3)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
    }

    pub fn upload<S: MeshSink<V>>(&self, sink: &mut S) -> S::Mesh {
        sink.upload(&self.vertices, &self.indices)
    }
}


#[cfg(test)]
struct CountingSink {
    uploads: usize,
}

#[cfg(test)]
impl MeshSink<u8> for CountingSink {
    type Mesh = (usize, usize);

    fn upload(&mut self, vertices: &[u8], indices: &[MeshIndex]) -> Self::Mesh {
        self.uploads += 1;
        (vertices.len(), indices.len())
    }
}

#[test]
fn quads_offset_their_indices() {
    let mut mesh = MeshData::new();
    mesh.add_quad([0u8, 1, 2, 3]);
    mesh.add_quad([4u8, 5, 6, 7]);

    assert_eq!(mesh.vertices.len(), 2 * VERTICES_PER_QUAD);
    assert_eq!(mesh.indices.len(), 2 * INDICES_PER_QUAD);
    assert_eq!(&mesh.indices[6..], &[7, 5, 4, 7, 6, 5]);
    assert_eq!(mesh.num_triangles(), 4);
    mesh.validate_indices();

    let tris: Vec<_> = mesh.triangles().collect();
    assert_eq!(tris[0], [3, 1, 0]);
    assert_eq!(tris[3], [7, 6, 5]);
}

#[test]
fn upload_hands_over_buffers() {
    let mut mesh = MeshData::with_capacity(16, 24);
    assert!(mesh.is_empty());
    mesh.add_quad([1u8; 4]);

    let mut sink = CountingSink { uploads: 0 };
    assert_eq!(mesh.upload(&mut sink), (4, 6));
    assert_eq!(sink.uploads, 1);

    mesh.clear();
    assert!(mesh.is_empty());
}
