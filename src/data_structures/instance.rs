//! Per-draw transformation data for GPU rendering.
//!
//! Every primitive drawn in the scene is placed with a [`Transform`]. The
//! resulting matrices, together with the colour/texture/material state of the
//! draw, are packed into an [`InstanceRaw`] and read by the vertex shader
//! through an instance-stepped vertex buffer.

use cgmath::{Deg, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};

use crate::data_structures::model;

/// Scale, rotation (in degrees about X, Y and Z) and position of a primitive.
///
/// `offset` is added to `position`; it lets a group of parts share one
/// anchor and be moved together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: Vector3<f32>,
    pub rotation_degrees: Vector3<f32>,
    pub position: Vector3<f32>,
    pub offset: Vector3<f32>,
}

impl Transform {
    pub fn new(
        scale: Vector3<f32>,
        x_rotation_degrees: f32,
        y_rotation_degrees: f32,
        z_rotation_degrees: f32,
        position: Vector3<f32>,
    ) -> Self {
        Self {
            scale,
            rotation_degrees: Vector3::new(
                x_rotation_degrees,
                y_rotation_degrees,
                z_rotation_degrees,
            ),
            position,
            offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    /// Scale and translate only.
    pub fn placed(scale: Vector3<f32>, position: Vector3<f32>) -> Self {
        Self::new(scale, 0.0, 0.0, 0.0, position)
    }

    pub fn with_offset(mut self, offset: Vector3<f32>) -> Self {
        self.offset = offset;
        self
    }

    /// `translation * rot_z * rot_y * rot_x * scale`
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let rotation_x = Matrix4::from_angle_x(Deg(self.rotation_degrees.x));
        let rotation_y = Matrix4::from_angle_y(Deg(self.rotation_degrees.y));
        let rotation_z = Matrix4::from_angle_z(Deg(self.rotation_degrees.z));
        let scale = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        let translation = Matrix4::from_translation(self.position + self.offset);

        translation * rotation_z * rotation_y * rotation_x * scale
    }

    /// Matrix used to bring normals into world space.
    ///
    /// Non-uniform scaling (which almost every part uses) would skew normals
    /// if the model matrix were applied directly, so this is the
    /// inverse-transpose of its upper 3x3. A degenerate scale falls back to
    /// the identity.
    pub fn normal_matrix(&self) -> Matrix3<f32> {
        let model = self.to_matrix();
        let upper = Matrix3::from_cols(
            model.x.truncate(),
            model.y.truncate(),
            model.z.truncate(),
        );
        upper
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::placed(Vector3::new(1.0, 1.0, 1.0), Vector3::new(0.0, 0.0, 0.0))
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

/**
 * The raw instance is the actual data stored on the GPU, one record per draw call.
 *
 * `surface` packs the UV scale (xy), the use-texture flag (z) and the material
 * shininess (w) to stay within the vertex attribute limit of WebGL2.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub color: [f32; 4],
    pub surface: [f32; 4],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

/**
 * Stride layout here: model matrix as four vec4, normal matrix as three vec3,
 * then the colour, surface and material vectors.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // The shader only advances to the next record when it starts a new instance
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 29]>() as wgpu::BufferAddress,
                    shader_location: 13,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 33]>() as wgpu::BufferAddress,
                    shader_location: 14,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 36]>() as wgpu::BufferAddress,
                    shader_location: 15,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector4};

    use super::*;

    fn apply(transform: &Transform, point: [f32; 3]) -> Vector3<f32> {
        (transform.to_matrix() * Vector4::new(point[0], point[1], point[2], 1.0)).truncate()
    }

    fn assert_close(actual: Vector3<f32>, expected: [f32; 3]) {
        let delta = actual - Vector3::from(expected);
        assert!(
            delta.magnitude() < 1e-4,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn scales_before_rotating_and_translating() {
        // A unit cylinder stretched to 4.85 and laid along -X, like the mouse cable.
        let transform = Transform::new(
            Vector3::new(0.05, 4.85, 0.05),
            0.0,
            0.0,
            90.0,
            Vector3::new(6.05, 0.0, -3.0),
        );
        assert_close(apply(&transform, [0.0, 0.0, 0.0]), [6.05, 0.0, -3.0]);
        assert_close(apply(&transform, [0.0, 1.0, 0.0]), [1.2, 0.0, -3.0]);
    }

    #[test]
    fn applies_x_rotation_before_y_rotation() {
        let transform = Transform::new(
            Vector3::new(1.0, 1.0, 1.0),
            90.0,
            90.0,
            0.0,
            Vector3::new(0.0, 0.0, 0.0),
        );
        // +Y is turned to +Z by X, then +Z to +X by Y.
        assert_close(apply(&transform, [0.0, 1.0, 0.0]), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn offset_is_added_to_position() {
        let transform = Transform::placed(Vector3::new(2.0, 2.0, 2.0), Vector3::new(1.0, 0.0, 0.0))
            .with_offset(Vector3::new(0.0, 3.0, 0.0));
        assert_close(apply(&transform, [0.5, 0.0, 0.0]), [2.0, 3.0, 0.0]);
    }

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_non_uniform_scale() {
        let transform = Transform::new(
            Vector3::new(7.0, 1.0, 1.0),
            0.0,
            0.0,
            45.0,
            Vector3::new(0.0, 0.0, 0.0),
        );
        // The slanted face of a unit square stretched along X.
        let surface_dir = (transform.to_matrix() * Vector4::new(1.0, -1.0, 0.0, 0.0)).truncate();
        let normal = transform.normal_matrix() * Vector3::new(1.0, 1.0, 0.0);
        assert!(surface_dir.dot(normal).abs() < 1e-4);
    }

    #[test]
    fn degenerate_scale_yields_identity_normals() {
        let transform = Transform::placed(Vector3::new(0.0, 1.0, 1.0), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(transform.normal_matrix(), Matrix3::identity());
    }

    #[test]
    fn raw_instance_matches_vertex_layout_stride() {
        use model::Vertex;
        assert_eq!(
            InstanceRaw::desc().array_stride as usize,
            std::mem::size_of::<[f32; 39]>()
        );
    }
}
