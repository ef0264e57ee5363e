//! The normal-mapped unit cube used by the rotating box.
//!
//! Every face has its own four corners so that each one can carry its own
//! normal, tangent and texture coordinates.

use wgpu::util::DeviceExt;

use crate::data_structures::model::Vertex;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for CubeVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x3,
            4 => Float32x3,
            5 => Float32x3,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

const fn v(p: [f32; 3], uv: [f32; 2], n: [f32; 3], t: [f32; 3], b: [f32; 3]) -> CubeVertex {
    CubeVertex {
        position: p,
        colour: [1.0, 1.0, 1.0],
        tex_coords: uv,
        normal: n,
        tangent: t,
        bitangent: b,
    }
}

const DOWN: [f32; 3] = [0.0, -1.0, 0.0];
const UP: [f32; 3] = [0.0, 1.0, 0.0];
const LEFT: [f32; 3] = [-1.0, 0.0, 0.0];
const RIGHT: [f32; 3] = [1.0, 0.0, 0.0];
const BACK: [f32; 3] = [0.0, 0.0, -1.0];
const FRONT: [f32; 3] = [0.0, 0.0, 1.0];

#[rustfmt::skip]
pub const CUBE_VERTICES: [CubeVertex; 24] = [
    v([ 0.5, -0.5, -0.5], [1.0, 1.0], DOWN,  LEFT,  FRONT),
    v([ 0.5, -0.5,  0.5], [1.0, 0.0], DOWN,  LEFT,  FRONT),
    v([-0.5, -0.5,  0.5], [0.0, 0.0], DOWN,  LEFT,  FRONT),
    v([-0.5, -0.5, -0.5], [0.0, 1.0], DOWN,  LEFT,  FRONT),

    v([ 0.5,  0.5, -0.5], [1.0, 1.0], RIGHT, DOWN,  FRONT),
    v([ 0.5,  0.5,  0.5], [1.0, 0.0], RIGHT, DOWN,  FRONT),

    v([ 0.5,  0.5,  0.5], [1.0, 0.0], FRONT, RIGHT, DOWN),
    v([-0.5,  0.5,  0.5], [0.0, 0.0], FRONT, RIGHT, DOWN),

    v([-0.5,  0.5,  0.5], [0.0, 0.0], LEFT,  UP,    FRONT),
    v([-0.5,  0.5, -0.5], [0.0, 1.0], LEFT,  UP,    FRONT),

    v([-0.5,  0.5, -0.5], [0.0, 1.0], BACK,  RIGHT, UP),
    v([ 0.5,  0.5, -0.5], [1.0, 1.0], BACK,  RIGHT, UP),

    v([-0.5,  0.5, -0.5], [1.0, 1.0], UP,    RIGHT, FRONT),
    v([-0.5,  0.5,  0.5], [1.0, 0.0], UP,    RIGHT, FRONT),

    v([ 0.5, -0.5,  0.5], [1.0, 1.0], FRONT, RIGHT, DOWN),
    v([-0.5, -0.5,  0.5], [0.0, 1.0], FRONT, RIGHT, DOWN),

    v([-0.5, -0.5,  0.5], [1.0, 0.0], LEFT,  UP,    FRONT),
    v([-0.5, -0.5, -0.5], [1.0, 1.0], LEFT,  UP,    FRONT),

    v([-0.5, -0.5, -0.5], [0.0, 0.0], BACK,  RIGHT, UP),
    v([ 0.5, -0.5, -0.5], [1.0, 0.0], BACK,  RIGHT, UP),

    v([ 0.5, -0.5, -0.5], [0.0, 1.0], RIGHT, DOWN,  FRONT),
    v([ 0.5, -0.5,  0.5], [0.0, 0.0], RIGHT, DOWN,  FRONT),

    v([ 0.5,  0.5, -0.5], [0.0, 1.0], UP,    RIGHT, FRONT),
    v([ 0.5,  0.5,  0.5], [0.0, 0.0], UP,    RIGHT, FRONT),
];

#[rustfmt::skip]
pub const CUBE_INDICES: [u32; 36] = [
    // down
    0, 1, 2,
    0, 2, 3,
    // back
    14, 6, 7,
    14, 7, 15,
    // right
    20, 4, 5,
    20, 5, 21,
    // left
    16, 8, 9,
    16, 9, 17,
    // front
    18, 10, 11,
    18, 11, 19,
    // up
    22, 12, 13,
    22, 13, 23,
];

/// The cube uploaded to vertex and index buffers.
#[derive(Debug)]
pub struct CubeMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl CubeMesh {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Vertex Buffer"),
            contents: bytemuck::cast_slice(&CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Index Buffer"),
            contents: bytemuck::cast_slice(&CUBE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: CUBE_INDICES.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    fn corner(i: u32) -> Vector3<f32> {
        CUBE_VERTICES[i as usize].position.into()
    }

    #[test]
    fn every_vertex_is_used_and_in_range() {
        let mut used = [false; 24];
        for &i in &CUBE_INDICES {
            used[i as usize] = true;
        }
        assert!(used.iter().all(|u| *u));
    }

    #[test]
    fn each_face_spans_a_full_side_of_the_cube() {
        // Two triangles per face, each pair covering one unit square.
        for face in CUBE_INDICES.chunks(6) {
            let area: f32 = face
                .chunks(3)
                .map(|t| (corner(t[1]) - corner(t[0])).cross(corner(t[2]) - corner(t[0])).magnitude() / 2.0)
                .sum();
            assert!((area - 1.0).abs() < 1e-6, "face {face:?} has area {area}");
        }
    }

    #[test]
    fn tangent_frames_are_orthonormal() {
        for vertex in &CUBE_VERTICES {
            let n = Vector3::from(vertex.normal);
            let t = Vector3::from(vertex.tangent);
            let b = Vector3::from(vertex.bitangent);
            assert_eq!(n.magnitude(), 1.0);
            assert_eq!(n.dot(t), 0.0);
            assert_eq!(n.dot(b), 0.0);
            assert_eq!(t.dot(b), 0.0);
        }
    }

    #[test]
    fn layout_stride_is_seventeen_floats() {
        assert_eq!(CubeVertex::desc().array_stride, 17 * 4);
    }
}
