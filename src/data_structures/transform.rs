//! Object transforms and their GPU representation.
//!
//! Every drawable keeps a [`Transform`] and uploads its [`TransformRaw`] to a
//! small uniform buffer at bind group 1 whenever it changes.

use cgmath::{InnerSpace, Matrix, Matrix4, One, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

/// Position, rotation (as quaternion) and scale of an object in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    /// T * R * S
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Rotates about `axis` given in the object's own frame.
    ///
    /// Repeated calls compose on the right, so each rotation happens in the
    /// frame left behind by the previous ones.
    pub fn rotate_local<A: Into<Rad<f32>>>(&mut self, axis: Vector3<f32>, angle: A) {
        if axis.magnitude2() <= f32::EPSILON {
            return;
        }
        let delta = Quaternion::from_axis_angle(axis.normalize(), angle);
        self.rotation = (self.rotation * delta).normalize();
    }

    pub fn to_raw(&self) -> TransformRaw {
        let world = self.to_matrix();
        // Non-uniform scale needs the inverse transpose to keep normals
        // perpendicular. A degenerate scale falls back to the rotation.
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(|| Matrix4::from(self.rotation));
        TransformRaw {
            world: world.into(),
            normal: normal.into(),
        }
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

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// The transform as stored on the GPU.
///
/// `normal` is a full 4x4 matrix because mat3x3 columns are padded to 16
/// bytes in WGSL uniform buffers.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    pub world: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

/// A transform together with the uniform buffer and bind group that carry it.
#[derive(Debug)]
pub struct TransformBinding {
    pub transform: Transform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl TransformBinding {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        transform: Transform,
        label: &str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[transform.to_raw()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self {
            transform,
            buffer,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.transform.to_raw()]));
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Point3, Transform as _, Vector4};

    use super::*;

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn matrix_scales_then_rotates_then_translates() {
        let transform = Transform::new()
            .with_position(Vector3::new(100.0, 100.0, 100.0))
            .with_uniform_scale(10.0)
            .with_rotation(Quaternion::from_angle_y(Deg(90.0)));
        let p = transform.to_matrix().transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_close(Vector3::new(p.x, p.y, p.z), Vector3::new(100.0, 100.0, 90.0));
    }

    #[test]
    fn local_rotations_compose_in_the_object_frame() {
        let mut transform = Transform::new();
        transform.rotate_local(Vector3::unit_x(), Deg(90.0));
        // After tipping over, the local z axis points down world -y.
        transform.rotate_local(Vector3::unit_z(), Deg(90.0));
        let x = transform.to_matrix().transform_vector(Vector3::unit_x());
        assert_close(x, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn rotating_about_a_zero_axis_is_ignored() {
        let mut transform = Transform::new();
        transform.rotate_local(Vector3::new(0.0, 0.0, 0.0), Deg(45.0));
        assert_eq!(transform, Transform::new());
    }

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_squash() {
        let mut transform = Transform::new();
        transform.scale = Vector3::new(4.0, 1.0, 1.0);
        let raw = transform.to_raw();
        let normal = Matrix4::from(raw.normal) * Vector4::new(1.0, 1.0, 0.0, 0.0);
        let normal = Vector3::new(normal.x, normal.y, normal.z);
        // Surface tangent of the diagonal plane x + y = 0 after squashing.
        let tangent = transform.to_matrix().transform_vector(Vector3::new(1.0, -1.0, 0.0));
        assert!(normal.dot(tangent).abs() < 1e-4);
    }

    #[test]
    fn raw_transform_is_two_mat4() {
        assert_eq!(std::mem::size_of::<TransformRaw>(), 128);
    }
}
