//! Handing finished meshes off to a renderer.

use crate::MeshIndex;


/// Something that takes ownership of a mesh's buffers, usually by uploading
/// them to the GPU.
pub trait MeshSink<V> {
    /// Handle to the uploaded mesh.
    type Mesh;

    fn upload(&mut self, vertices: &[V], indices: &[MeshIndex]) -> Self::Mesh;
}
