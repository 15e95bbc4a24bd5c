//! Building renderable geometry from the block grid.

use crate::{
    map::GameMap,
    settings::DEFAULT_MESH_RESERVE,
    style::{BlockTextureLookup, StyleData},
};
use city_data::{
    BlockGrid,
    BlockType,
    Face,
    MapBlockInfo,
    SlopeAxis,
    SlopeRamp,
    FACES,
    MAP_LAYERS_COUNT,
    METERS_PER_MAP_UNIT,
};
use mesh_data::{MeshData, VERTICES_PER_QUAD};
use vek::*;


/// Vertex of the city mesh.
///
/// `tex` is `<u, v, atlas layer>`. `remap` picks the palette remap and is only
/// set on lids, `transparency` is 1 for flat blocks.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct CityVertex {
    pub pos: Vec3<f32>,
    pub tex: Vec3<f32>,
    pub remap: u16,
    pub transparency: u16,
}

pub type CityMesh = MeshData<CityVertex>;


// corners of the unit cube as <x, up, y>, top south edge first, clockwise
const CUBE_POINTS: [[f32; 3]; 8] = [
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0],
];

const QUAD_TEX: [[f32; 2]; VERTICES_PER_QUAD] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [1.0, 1.0],
    [0.0, 1.0],
];

/// Cube corners each face is drawn between.
fn face_corners(face: Face, is_flat: bool) -> [usize; VERTICES_PER_QUAD] {
    match face {
        Face::Lid => [4, 5, 1, 0],
        // flat blocks draw their S face at the N position
        Face::S if is_flat => [4, 5, 6, 7],
        Face::S => [0, 1, 2, 3],
        Face::N => [5, 4, 7, 6],
        Face::W => [4, 0, 3, 7],
        // and their E face at the W position
        Face::E if is_flat => [0, 4, 7, 3],
        Face::E => [1, 5, 6, 2],
    }
}

/// Cube corners in meters with the top corners lowered to the block's slope.
fn block_corners(block: &MapBlockInfo) -> [Vec3<f32>; 8] {
    let mut points = CUBE_POINTS.map(|[x, y, z]| Vec3::new(x, y, z) * METERS_PER_MAP_UNIT);
    if let Some(ramp) = SlopeRamp::of(block.slope_type) {
        let start = ramp.start * METERS_PER_MAP_UNIT;
        let end = ramp.end * METERS_PER_MAP_UNIT;
        let (start_corners, end_corners) = match ramp.axis {
            // north edge to south edge
            SlopeAxis::Y => ([4, 5], [0, 1]),
            // west edge to east edge
            SlopeAxis::X => ([0, 4], [1, 5]),
        };
        for i in start_corners {
            points[i].y = start;
        }
        for i in end_corners {
            points[i].y = end;
        }
    }
    points
}

/// Whether a side face has its texture mirrored horizontally.
fn is_face_mirrored(block: &MapBlockInfo, face: Face) -> bool {
    let flip_lr = (block.is_flat != block.flip_left_right_faces && face == Face::E)
        || (block.flip_left_right_faces && face == Face::W);
    let flip_tb = (block.is_flat != block.flip_top_bottom_faces && face == Face::S)
        || (block.flip_top_bottom_faces && face == Face::N);
    // at most one of the flags applies to any given face
    flip_lr != flip_tb
}


/// Builds meshes of regions of a block grid.
pub struct MapMeshBuilder<'a, T> {
    grid: &'a BlockGrid,
    textures: &'a T,
    vertex_reserve: usize,
    index_reserve: usize,
}

impl<'a, T: BlockTextureLookup> MapMeshBuilder<'a, T> {
    pub fn new(grid: &'a BlockGrid, textures: &'a T) -> Self {
        MapMeshBuilder {
            grid,
            textures,
            vertex_reserve: DEFAULT_MESH_RESERVE,
            index_reserve: DEFAULT_MESH_RESERVE,
        }
    }

    /// Capacity reserved up front in each mesh built.
    pub fn with_reserve(mut self, vertices: usize, indices: usize) -> Self {
        self.vertex_reserve = vertices;
        self.index_reserve = indices;
        self
    }

    fn new_mesh(&self) -> CityMesh {
        MeshData::with_capacity(self.vertex_reserve, self.index_reserve)
    }

    /// Mesh of one layer within `area`, in block coordinates. Cells of the
    /// area outside the map repeat the map edge.
    pub fn build_layer(&self, area: Rect<i32, i32>, layer: i32) -> CityMesh {
        let mut mesh = self.new_mesh();
        if !(0..MAP_LAYERS_COUNT as i32).contains(&layer) {
            warn!("not meshing layer {}, out of range", layer);
            return mesh;
        }
        self.put_layer(&mut mesh, area, layer);
        trace!("built layer {} mesh of {} triangles", layer, mesh.num_triangles());
        mesh
    }

    /// Mesh of every layer within `area`.
    pub fn build_all_layers(&self, area: Rect<i32, i32>) -> CityMesh {
        let mut mesh = self.new_mesh();
        for layer in 0..MAP_LAYERS_COUNT as i32 {
            self.put_layer(&mut mesh, area, layer);
        }
        debug!(
            "built mesh of {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.num_triangles(),
        );
        mesh
    }

    fn put_layer(&self, mesh: &mut CityMesh, area: Rect<i32, i32>, layer: i32) {
        for y in area.y..area.y.saturating_add(area.h) {
            for x in area.x..area.x.saturating_add(area.w) {
                let block = self.grid.get_clamp(x, y, layer);
                for face in FACES {
                    if block.has_face(face) {
                        self.put_block_face(mesh, Vec3::new(x, y, layer), face, block);
                    }
                }
            }
        }
    }

    fn put_block_face(
        &self,
        mesh: &mut CityMesh,
        coord: Vec3<i32>,
        face: Face,
        block: &MapBlockInfo,
    ) {
        let tex_layer = self.textures
            .block_texture_index(BlockType::from(face), block.faces[face]) as f32;
        let points = block_corners(block);
        let offset = Vec3::new(coord.x, coord.z, coord.y).map(|n| n as f32) * METERS_PER_MAP_UNIT;
        let corners = face_corners(face, block.is_flat);

        let (remap, rotation) = match face {
            Face::Lid => (block.remap as u16, block.lid_rotation.quarter_turns()),
            _ => (0, 0),
        };
        let mut quad = corners.map(|corner| CityVertex {
            pos: points[corner] + offset,
            tex: Vec3::zero(),
            remap,
            transparency: block.is_flat as u16,
        });
        for (i, [u, v]) in QUAD_TEX.into_iter().enumerate() {
            quad[(rotation + i) % VERTICES_PER_QUAD].tex = Vec3::new(u, v, tex_layer);
        }
        if face.is_side() && is_face_mirrored(block, face) {
            let [a, b, c, d] = quad.map(|vertex| vertex.tex);
            quad[0].tex = b;
            quad[1].tex = a;
            quad[2].tex = d;
            quad[3].tex = c;
        }
        mesh.add_quad(quad);
    }
}

impl GameMap {
    /// Mesh builder over this map's blocks and style, `None` until a map is
    /// loaded.
    pub fn mesh_builder(&self) -> Option<MapMeshBuilder<'_, StyleData>> {
        self.style().map(|style| MapMeshBuilder::new(self.grid(), style))
    }
}


#[cfg(test)]
use city_data::{GroundType, LidRotation, PerFace, MAP_DIMENSIONS};

#[cfg(test)]
const STYLE: StyleData = StyleData {
    side_blocks_count: 10,
    lid_blocks_count: 10,
    aux_blocks_count: 0,
};

#[cfg(test)]
fn mesh_one(block: MapBlockInfo) -> CityMesh {
    let mut grid = BlockGrid::new();
    *grid.get_mut(2, 3, 1).unwrap() = block;
    MapMeshBuilder::new(&grid, &STYLE)
        .with_reserve(0, 0)
        .build_layer(Rect::new(0, 0, 8, 8), 1)
}

#[cfg(test)]
fn with_faces(faces: [u8; 5]) -> MapBlockInfo {
    MapBlockInfo {
        ground_type: GroundType::Building,
        faces: PerFace(faces),
        ..MapBlockInfo::default()
    }
}

#[cfg(test)]
fn texs(mesh: &CityMesh) -> Vec<[f32; 2]> {
    mesh.vertices.iter().map(|v| [v.tex.x, v.tex.y]).collect()
}

#[test]
fn invisible_faces_are_culled() {
    assert!(mesh_one(with_faces([0; 5])).is_empty());

    let mesh = mesh_one(with_faces([0, 0, 0, 0, 3]));
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices, vec![3, 1, 0, 3, 2, 1]);

    let mesh = mesh_one(with_faces([1, 2, 3, 4, 5]));
    assert_eq!(mesh.vertices.len(), 20);
    assert_eq!(mesh.indices.len(), 30);
    mesh.validate_indices();
}

#[test]
fn lid_geometry_and_texture() {
    let mut block = with_faces([0, 0, 0, 0, 3]);
    block.remap = 2;
    let mesh = mesh_one(block);

    let offset = Vec3::new(8.0, 4.0, 12.0);
    let pos: Vec<_> = mesh.vertices.iter().map(|v| v.pos - offset).collect();
    assert_eq!(pos, vec![
        Vec3::new(0.0, 4.0, 0.0),
        Vec3::new(4.0, 4.0, 0.0),
        Vec3::new(4.0, 4.0, 4.0),
        Vec3::new(0.0, 4.0, 4.0),
    ]);
    // lids come after the side textures in the atlas
    assert!(mesh.vertices.iter().all(|v| v.tex.z == 13.0));
    assert!(mesh.vertices.iter().all(|v| v.remap == 2 && v.transparency == 0));
    assert_eq!(texs(&mesh), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
}

#[test]
fn lid_rotation_shifts_texcoords() {
    let mut block = with_faces([0, 0, 0, 0, 3]);
    block.lid_rotation = LidRotation::Deg90;
    assert_eq!(
        texs(&mesh_one(block)),
        vec![[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
    );

    // rotation only applies to lids
    let mut block = with_faces([0, 0, 0, 4, 0]);
    block.lid_rotation = LidRotation::Deg90;
    let mesh = mesh_one(block);
    assert_eq!(texs(&mesh), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    assert!(mesh.vertices.iter().all(|v| v.tex.z == 4.0 && v.remap == 0));
}

#[test]
fn flip_flags_mirror_side_faces() {
    let plain = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let mirrored = [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

    let mut block = with_faces([0, 5, 0, 0, 0]);
    assert_eq!(texs(&mesh_one(block)), plain);
    block.flip_left_right_faces = true;
    assert_eq!(texs(&mesh_one(block)), mirrored);
    // flatness inverts the E flip
    block.is_flat = true;
    assert_eq!(texs(&mesh_one(block)), plain);

    let mut block = with_faces([5, 0, 0, 0, 0]);
    block.flip_left_right_faces = true;
    assert_eq!(texs(&mesh_one(block)), mirrored);
    // W ignores flatness
    block.is_flat = true;
    assert_eq!(texs(&mesh_one(block)), mirrored);

    let mut block = with_faces([0, 0, 0, 5, 0]);
    block.is_flat = true;
    assert_eq!(texs(&mesh_one(block)), mirrored);
    block.flip_top_bottom_faces = true;
    assert_eq!(texs(&mesh_one(block)), plain);
}

#[test]
fn flat_blocks_collapse_faces() {
    let mut block = with_faces([0, 6, 0, 6, 0]);
    block.is_flat = true;
    let mesh = mesh_one(block);
    assert!(mesh.vertices.iter().all(|v| v.transparency == 1));

    let offset = Vec3::new(8.0, 4.0, 12.0);
    // E face drawn on the west edge
    assert!(mesh.vertices[0..4].iter().all(|v| v.pos.x == offset.x));
    // S face drawn on the north edge
    assert!(mesh.vertices[4..8].iter().all(|v| v.pos.z == offset.z));
}

#[test]
fn slopes_lower_top_corners() {
    // 26 degree N ramp, low half: north edge at half height, south edge at 0
    let mut block = with_faces([0, 0, 0, 0, 1]);
    block.slope_type = 1;
    let heights: Vec<_> = mesh_one(block).vertices.iter().map(|v| v.pos.y - 4.0).collect();
    assert_eq!(heights, vec![2.0, 2.0, 0.0, 0.0]);

    // 45 degree E ramp: only the west corners drop
    block.slope_type = 44;
    let heights: Vec<_> = mesh_one(block).vertices.iter().map(|v| v.pos.y - 4.0).collect();
    assert_eq!(heights, vec![0.0, 4.0, 4.0, 0.0]);
}

#[test]
fn all_layers_and_out_of_range() {
    let mut grid = BlockGrid::new();
    for layer in 0..MAP_LAYERS_COUNT as i32 {
        *grid.get_mut(0, 0, layer).unwrap() = with_faces([0, 0, 0, 0, 1]);
    }
    let builder = MapMeshBuilder::new(&grid, &STYLE).with_reserve(0, 0);
    let area = Rect::new(0, 0, 2, 2);
    assert_eq!(builder.build_all_layers(area).vertices.len(), 4 * MAP_LAYERS_COUNT);
    assert_eq!(builder.build_layer(area, 3).vertices.len(), 4);
    assert!(builder.build_layer(area, MAP_LAYERS_COUNT as i32).is_empty());

    // area hanging off the map repeats the edge block
    let edge = builder.build_layer(Rect::new(-1, 0, 2, 1), 0);
    assert_eq!(edge.vertices.len(), 8);
    assert_eq!(edge.vertices[0].pos.x, -4.0);
}

#[test]
fn area_at_the_end_of_the_coordinate_range() {
    let mut grid = BlockGrid::new();
    let max = MAP_DIMENSIONS as i32 - 1;
    *grid.get_mut(max, max, 0).unwrap() = with_faces([0, 0, 0, 0, 1]);
    let builder = MapMeshBuilder::new(&grid, &STYLE).with_reserve(0, 0);

    // bounds stop at i32::MAX, leaving one cell that repeats the map corner
    let area = Rect::new(i32::MAX - 1, i32::MAX - 1, 1000, 1000);
    assert_eq!(builder.build_layer(area, 0).vertices.len(), 4);
}
