use std::collections::HashMap;

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::model::{self, ModelVertex};

/// Number of side segments used to approximate a cylinder.
pub const CYLINDER_SEGMENTS: u32 = 36;

/// The basic shapes every object in the scene is composed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Square in the XZ plane spanning `[-1, 1]`, facing +Y.
    Plane,
    /// Unit cube spanning `[-0.5, 0.5]` on every axis.
    Box,
    /// Triangular prism: triangle `(-0.5,-0.5) (0.5,-0.5) (0,0.5)` in XY, extruded over z in `[-0.5, 0.5]`.
    Prism,
    /// Capped cylinder of radius 1 standing on the origin, from y = 0 to y = 1.
    Cylinder,
}

impl Primitive {
    pub const ALL: [Primitive; 4] = [
        Primitive::Plane,
        Primitive::Box,
        Primitive::Prism,
        Primitive::Cylinder,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Plane => "plane",
            Primitive::Box => "box",
            Primitive::Prism => "prism",
            Primitive::Cylinder => "cylinder",
        }
    }

    /// Generate the CPU-side geometry of this primitive.
    pub fn mesh_data(&self) -> MeshData {
        match self {
            Primitive::Plane => plane_data(),
            Primitive::Box => box_data(),
            Primitive::Prism => prism_data(),
            Primitive::Cylinder => cylinder_data(CYLINDER_SEGMENTS),
        }
    }
}

/// Vertices and triangle indices before upload.
#[derive(Debug, Default, Clone)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Append a flat convex polygon.
    ///
    /// The polygon is fanned from its first corner. If the corners are listed
    /// clockwise as seen from `outward`, the triangle order is flipped so that
    /// every face is counter-clockwise from outside.
    fn push_polygon(
        &mut self,
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
        uvs: &[[f32; 2]],
        outward: Vector3<f32>,
    ) {
        debug_assert!(positions.len() >= 3);
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(positions.iter().zip(normals).zip(uvs).map(|((p, n), uv)| ModelVertex {
                position: *p,
                tex_coords: *uv,
                normal: *n,
            }));

        let p0 = Vector3::from(positions[0]);
        let p1 = Vector3::from(positions[1]);
        let p2 = Vector3::from(positions[2]);
        let counter_clockwise = (p1 - p0).cross(p2 - p0).dot(outward) >= 0.0;

        for i in 1..positions.len() as u32 - 1 {
            if counter_clockwise {
                self.indices.extend([base, base + i, base + i + 1]);
            } else {
                self.indices.extend([base, base + i + 1, base + i]);
            }
        }
    }

    fn push_flat_polygon(&mut self, positions: &[[f32; 3]], uvs: &[[f32; 2]], normal: [f32; 3]) {
        let normals = vec![normal; positions.len()];
        self.push_polygon(positions, &normals, uvs, normal.into());
    }
}

const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

pub fn plane_data() -> MeshData {
    let mut data = MeshData::default();
    data.push_flat_polygon(
        &[
            [-1.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 0.0, -1.0],
            [-1.0, 0.0, -1.0],
        ],
        &QUAD_UVS,
        [0.0, 1.0, 0.0],
    );
    data
}

pub fn box_data() -> MeshData {
    let mut data = MeshData::default();
    let h = 0.5;
    // Corners of each face listed bottom-left, bottom-right, top-right, top-left seen from outside.
    let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
        // front
        ([[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]], [0.0, 0.0, 1.0]),
        // back
        ([[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]], [0.0, 0.0, -1.0]),
        // right
        ([[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]], [1.0, 0.0, 0.0]),
        // left
        ([[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]], [-1.0, 0.0, 0.0]),
        // top
        ([[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]], [0.0, 1.0, 0.0]),
        // bottom
        ([[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]], [0.0, -1.0, 0.0]),
    ];
    for (corners, normal) in faces {
        data.push_flat_polygon(&corners, &QUAD_UVS, normal);
    }
    data
}

pub fn prism_data() -> MeshData {
    let mut data = MeshData::default();
    let h = 0.5;
    let triangle = [[-h, -h], [h, -h], [0.0, h]];

    // triangular caps
    for z in [h, -h] {
        let corners = triangle.map(|[x, y]| [x, y, z]);
        data.push_flat_polygon(
            &corners,
            &[[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]],
            [0.0, 0.0, z.signum()],
        );
    }

    // rectangular sides, one per triangle edge
    let centroid = Vector3::new(0.0, -h / 3.0, 0.0);
    for i in 0..triangle.len() {
        let [ax, ay] = triangle[i];
        let [bx, by] = triangle[(i + 1) % triangle.len()];
        let corners = [[ax, ay, h], [bx, by, h], [bx, by, -h], [ax, ay, -h]];
        let edge = Vector3::new(bx - ax, by - ay, 0.0);
        let mut normal = Vector3::new(edge.y, -edge.x, 0.0).normalize();
        let midpoint = Vector3::new((ax + bx) / 2.0, (ay + by) / 2.0, 0.0);
        if normal.dot(midpoint - centroid) < 0.0 {
            normal = -normal;
        }
        data.push_flat_polygon(&corners, &QUAD_UVS, normal.into());
    }
    data
}

pub fn cylinder_data(segments: u32) -> MeshData {
    let mut data = MeshData::default();
    let segments = segments.max(3);
    let step = std::f32::consts::TAU / segments as f32;
    let ring = |i: u32| {
        let angle = step * i as f32;
        (angle.cos(), angle.sin())
    };

    // side, smooth-shaded
    for i in 0..segments {
        let (c0, s0) = ring(i);
        let (c1, s1) = ring(i + 1);
        let u0 = i as f32 / segments as f32;
        let u1 = (i + 1) as f32 / segments as f32;
        let (cm, sm) = ((step * (i as f32 + 0.5)).cos(), (step * (i as f32 + 0.5)).sin());
        data.push_polygon(
            &[[c0, 0.0, s0], [c1, 0.0, s1], [c1, 1.0, s1], [c0, 1.0, s0]],
            &[[c0, 0.0, s0], [c1, 0.0, s1], [c1, 0.0, s1], [c0, 0.0, s0]],
            &[[u0, 0.0], [u1, 0.0], [u1, 1.0], [u0, 1.0]],
            Vector3::new(cm, 0.0, sm),
        );
    }

    // caps
    for (y, normal) in [(1.0, [0.0, 1.0, 0.0]), (0.0, [0.0, -1.0, 0.0])] {
        let corners: Vec<[f32; 3]> = (0..segments)
            .map(|i| {
                let (c, s) = ring(i);
                [c, y, s]
            })
            .collect();
        let uvs: Vec<[f32; 2]> = (0..segments)
            .map(|i| {
                let (c, s) = ring(i);
                [0.5 + c * 0.5, 0.5 + s * 0.5]
            })
            .collect();
        data.push_flat_polygon(&corners, &uvs, normal);
    }
    data
}

/// Upload generated geometry into GPU buffers.
pub fn upload_mesh(device: &wgpu::Device, name: &str, data: &MeshData) -> model::Mesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", name)),
        contents: bytemuck::cast_slice(&data.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", name)),
        contents: bytemuck::cast_slice(&data.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: data.indices.len() as u32,
    }
}

/// The primitive meshes in GPU memory.
///
/// Only one instance of a particular mesh is loaded no matter how many times
/// it is drawn.
#[derive(Debug, Default)]
pub struct ShapeMeshes {
    meshes: HashMap<Primitive, model::Mesh>,
}

impl ShapeMeshes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and upload `primitive` unless it is already loaded.
    pub fn load(&mut self, device: &wgpu::Device, primitive: Primitive) {
        if self.meshes.contains_key(&primitive) {
            return;
        }
        let data = primitive.mesh_data();
        log::debug!(
            "Loading {} mesh: {} vertices, {} indices",
            primitive.name(),
            data.vertices.len(),
            data.indices.len()
        );
        self.meshes
            .insert(primitive, upload_mesh(device, primitive.name(), &data));
    }

    pub fn get(&self, primitive: Primitive) -> Option<&model::Mesh> {
        self.meshes.get(&primitive)
    }

    pub fn is_loaded(&self, primitive: Primitive) -> bool {
        self.meshes.contains_key(&primitive)
    }
}

/// Something that can make a primitive mesh available for drawing.
pub trait MeshLoader {
    fn load_mesh(&mut self, primitive: Primitive);
}

/// Uploads requested primitives into a [`ShapeMeshes`] cache.
pub struct GpuMeshLoader<'a> {
    pub device: &'a wgpu::Device,
    pub meshes: &'a mut ShapeMeshes,
}

impl MeshLoader for GpuMeshLoader<'_> {
    fn load_mesh(&mut self, primitive: Primitive) {
        self.meshes.load(self.device, primitive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(data: &MeshData, index: u32) -> Vector3<f32> {
        data.vertices[index as usize].position.into()
    }

    /// Every triangle must be counter-clockwise seen from the side its vertex normals point to.
    fn assert_outward_winding(data: &MeshData) {
        for tri in data.indices.chunks(3) {
            let (a, b, c) = (position(data, tri[0]), position(data, tri[1]), position(data, tri[2]));
            let face = (b - a).cross(c - a);
            let normal: Vector3<f32> = data.vertices[tri[0] as usize].normal.into();
            assert!(face.dot(normal) > 0.0, "triangle {:?} winds inward", tri);
        }
    }

    fn assert_unit_normals(data: &MeshData) {
        for v in &data.vertices {
            let n: Vector3<f32> = v.normal.into();
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
        }
    }

    fn bounds(data: &MeshData) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &data.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v.position[axis]);
                max[axis] = max[axis].max(v.position[axis]);
            }
        }
        (min, max)
    }

    #[test]
    fn every_primitive_is_well_formed() {
        for primitive in Primitive::ALL {
            let data = primitive.mesh_data();
            assert_eq!(data.indices.len() % 3, 0, "{}", primitive.name());
            assert!(data.indices.iter().all(|&i| (i as usize) < data.vertices.len()));
            assert_unit_normals(&data);
            assert_outward_winding(&data);
        }
    }

    #[test]
    fn plane_spans_two_units_and_faces_up() {
        let data = plane_data();
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.indices.len(), 6);
        assert_eq!(bounds(&data), ([-1.0, 0.0, -1.0], [1.0, 0.0, 1.0]));
        assert!(data.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn box_is_a_centered_unit_cube() {
        let data = box_data();
        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
        assert_eq!(bounds(&data), ([-0.5; 3], [0.5; 3]));
    }

    #[test]
    fn prism_has_two_caps_and_three_sides() {
        let data = prism_data();
        assert_eq!(data.vertices.len(), 2 * 3 + 3 * 4);
        assert_eq!(data.indices.len(), 2 * 3 + 3 * 6);
        assert_eq!(bounds(&data), ([-0.5; 3], [0.5; 3]));
    }

    #[test]
    fn cylinder_stands_on_the_origin() {
        let data = cylinder_data(CYLINDER_SEGMENTS);
        let (min, max) = bounds(&data);
        assert!((min[1] - 0.0).abs() < 1e-6 && (max[1] - 1.0).abs() < 1e-6);
        assert!((max[0] - 1.0).abs() < 1e-5 && (min[0] + 1.0).abs() < 1e-5);
        let sides = CYLINDER_SEGMENTS as usize * 6;
        let caps = 2 * (CYLINDER_SEGMENTS as usize - 2) * 3;
        assert_eq!(data.indices.len(), sides + caps);
    }

    #[test]
    fn cylinder_clamps_degenerate_segment_counts() {
        let data = cylinder_data(1);
        assert_eq!(data.vertices.len(), 3 * 4 + 2 * 3);
    }
}
