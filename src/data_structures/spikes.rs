//! Normal visualisation primitives.
//!
//! Every triangle of a mesh is turned into one "spike": a thin textured
//! triangle standing on the face's centroid and pointing along its normal.
//! The expansion happens once on the CPU, the vertex shader then only has to
//! push each corner out by the current spike parameters.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::model::Vertex;

/// Triangles with a smaller area do not get a spike.
const MIN_AREA: f32 = 1e-12;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpikeVertex {
    /// Centroid of the source triangle.
    pub anchor: [f32; 3],
    pub normal: [f32; 3],
    /// Unit vector along the source triangle's first edge.
    pub tangent: [f32; 3],
    /// x: offset along the tangent, y: offset along the normal.
    pub corner: [f32; 2],
    /// Square root of the source triangle's area.
    pub size: f32,
    pub tex_coords: [f32; 2],
}

impl Vertex for SpikeVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x3,
            3 => Float32x2,
            4 => Float32,
            5 => Float32x2,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpikeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Base left, base right, tip.
const CORNERS: [([f32; 2], [f32; 2]); 3] = [
    ([-1.0, 0.0], [0.0, 1.0]),
    ([1.0, 0.0], [1.0, 1.0]),
    ([0.0, 1.0], [0.5, 0.0]),
];

/// Expands an indexed triangle list into three spike vertices per triangle.
///
/// Degenerate triangles and triangles referencing missing vertices are
/// skipped, a trailing partial triangle is ignored.
pub fn expand(positions: &[[f32; 3]], indices: &[u32]) -> Vec<SpikeVertex> {
    let mut spikes = Vec::with_capacity(indices.len());
    for triangle in indices.chunks_exact(3) {
        let corner = |i: u32| positions.get(i as usize).copied().map(Vector3::from);
        let (Some(a), Some(b), Some(c)) = (corner(triangle[0]), corner(triangle[1]), corner(triangle[2])) else {
            continue;
        };

        let cross = (b - a).cross(c - a);
        let area = cross.magnitude() / 2.0;
        if area <= MIN_AREA {
            continue;
        }
        let anchor = (a + b + c) / 3.0;
        let normal = cross.normalize();
        let tangent = (b - a).normalize();

        for (offset, tex_coords) in CORNERS {
            spikes.push(SpikeVertex {
                anchor: anchor.into(),
                normal: normal.into(),
                tangent: tangent.into(),
                corner: offset,
                size: area.sqrt(),
                tex_coords,
            });
        }
    }
    spikes
}

/// Tunables of the spike pass, uploaded as a uniform.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpikeParams {
    /// Spike height relative to the face size.
    pub length: f32,
    /// Half the spike base relative to the face size.
    pub width: f32,
    _padding: [f32; 2],
}

impl SpikeParams {
    pub const MIN_LENGTH: f32 = 0.125;
    pub const MAX_LENGTH: f32 = 64.0;

    pub fn new(length: f32, width: f32) -> Self {
        Self {
            length: length.clamp(Self::MIN_LENGTH, Self::MAX_LENGTH),
            width,
            _padding: [0.0; 2],
        }
    }

    /// Multiplies the length by `factor`, staying within the allowed range.
    pub fn scale_length(&mut self, factor: f32) {
        self.length = (self.length * factor).clamp(Self::MIN_LENGTH, Self::MAX_LENGTH);
    }
}

impl Default for SpikeParams {
    fn default() -> Self {
        Self::new(2.0, 0.25)
    }
}

/// Position of a spike corner in object space for the given parameters.
///
/// Mirrors what `normals.wgsl` does on the GPU.
pub fn corner_position(vertex: &SpikeVertex, params: &SpikeParams) -> Vector3<f32> {
    let anchor = Vector3::from(vertex.anchor);
    let along = Vector3::from(vertex.tangent) * vertex.corner[0] * params.width * vertex.size;
    let up = Vector3::from(vertex.normal) * vertex.corner[1] * params.length * vertex.size;
    anchor + along + up
}

#[derive(Debug)]
pub struct SpikeBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub num_vertices: u32,
}

impl SpikeBuffer {
    pub fn new(device: &wgpu::Device, spikes: &[SpikeVertex], label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(spikes),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            num_vertices: spikes.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn spike_stands_on_the_centroid_along_the_face_normal() {
        let positions = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let spikes = expand(&positions, &[0, 1, 2]);
        assert_eq!(spikes.len(), 3);

        let centroid = Vector3::new(2.0 / 3.0, 2.0 / 3.0, 0.0);
        for spike in &spikes {
            assert!(close(spike.anchor.into(), centroid));
            assert_eq!(spike.normal, [0.0, 0.0, 1.0]);
            assert_eq!(spike.tangent, [1.0, 0.0, 0.0]);
            // Area 2.
            assert!((spike.size - 2.0f32.sqrt()).abs() < 1e-6);
        }

        let params = SpikeParams::new(1.0, 0.5);
        let size = 2.0f32.sqrt();
        let tip = corner_position(&spikes[2], &params);
        assert!(close(tip, centroid + Vector3::new(0.0, 0.0, size)));
        let left = corner_position(&spikes[0], &params);
        let right = corner_position(&spikes[1], &params);
        assert!(close(right - left, Vector3::new(size, 0.0, 0.0)));
    }

    #[test]
    fn winding_decides_the_direction() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let spikes = expand(&positions, &[0, 2, 1]);
        assert_eq!(spikes[0].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn degenerate_and_broken_triangles_are_skipped() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        // Collinear, out of range, valid, then a dangling pair.
        let spikes = expand(&positions, &[0, 1, 2, 0, 1, 9, 0, 1, 3, 0, 1]);
        assert_eq!(spikes.len(), 3);
        assert!(expand(&positions, &[]).is_empty());
    }

    #[test]
    fn length_scaling_is_clamped() {
        let mut params = SpikeParams::default();
        params.scale_length(1000.0);
        assert_eq!(params.length, SpikeParams::MAX_LENGTH);
        params.scale_length(0.0);
        assert_eq!(params.length, SpikeParams::MIN_LENGTH);
        assert_eq!(std::mem::size_of::<SpikeParams>(), 16);
    }
}
