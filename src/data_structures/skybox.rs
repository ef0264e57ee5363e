//! Geometry for the skybox cube.

use wgpu::util::DeviceExt;

use crate::data_structures::model::Vertex;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxVertex {
    pub position: [f32; 3],
}

impl Vertex for SkyboxVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkyboxVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

const fn p(x: f32, y: f32, z: f32) -> SkyboxVertex {
    SkyboxVertex { position: [x, y, z] }
}

/// 36 unindexed vertices, two triangles per side of a cube spanning -1..1.
#[rustfmt::skip]
pub const SKYBOX_VERTICES: [SkyboxVertex; 36] = [
    p(-1.0,  1.0, -1.0), p(-1.0, -1.0, -1.0), p( 1.0, -1.0, -1.0),
    p( 1.0, -1.0, -1.0), p( 1.0,  1.0, -1.0), p(-1.0,  1.0, -1.0),

    p(-1.0, -1.0,  1.0), p(-1.0, -1.0, -1.0), p(-1.0,  1.0, -1.0),
    p(-1.0,  1.0, -1.0), p(-1.0,  1.0,  1.0), p(-1.0, -1.0,  1.0),

    p( 1.0, -1.0, -1.0), p( 1.0, -1.0,  1.0), p( 1.0,  1.0,  1.0),
    p( 1.0,  1.0,  1.0), p( 1.0,  1.0, -1.0), p( 1.0, -1.0, -1.0),

    p(-1.0, -1.0,  1.0), p(-1.0,  1.0,  1.0), p( 1.0,  1.0,  1.0),
    p( 1.0,  1.0,  1.0), p( 1.0, -1.0,  1.0), p(-1.0, -1.0,  1.0),

    p(-1.0,  1.0, -1.0), p( 1.0,  1.0, -1.0), p( 1.0,  1.0,  1.0),
    p( 1.0,  1.0,  1.0), p(-1.0,  1.0,  1.0), p(-1.0,  1.0, -1.0),

    p(-1.0, -1.0, -1.0), p(-1.0, -1.0,  1.0), p( 1.0, -1.0, -1.0),
    p( 1.0, -1.0, -1.0), p(-1.0, -1.0,  1.0), p( 1.0, -1.0,  1.0),
];

/// Skybox faces in cube-map layer order.
pub const SKYBOX_FACES: [&str; 6] = [
    "textures/skybox/right.jpg",
    "textures/skybox/left.jpg",
    "textures/skybox/top.jpg",
    "textures/skybox/bottom.jpg",
    "textures/skybox/front.jpg",
    "textures/skybox/back.jpg",
];

#[derive(Debug)]
pub struct SkyboxMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub num_vertices: u32,
}

impl SkyboxMesh {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Vertex Buffer"),
            contents: bytemuck::cast_slice(&SKYBOX_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            num_vertices: SKYBOX_VERTICES.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_vertex_sits_on_a_cube_corner() {
        for vertex in &SKYBOX_VERTICES {
            assert!(vertex.position.iter().all(|c| c.abs() == 1.0));
        }
    }

    #[test]
    fn each_side_is_covered_by_its_two_triangles() {
        // Every group of six vertices shares one constant coordinate.
        for side in SKYBOX_VERTICES.chunks(6) {
            let shared = (0..3).filter(|&axis| {
                side.iter()
                    .all(|v| v.position[axis] == side[0].position[axis])
            });
            assert_eq!(shared.count(), 1);
        }
    }
}
