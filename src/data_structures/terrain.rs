//! Heightmap terrain tessellation.
//!
//! The heightmap is turned into a regular grid with one vertex per pixel. The
//! red channel of each pixel lifts its vertex, `0` being the ground plane and
//! `255` the full height scale.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::{check_buffer_size, model::Vertex};

/// Heights sampled from an image, row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl Heightmap {
    /// Returns `None` when `samples` does not hold exactly `width * height` values.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Option<Self> {
        (samples.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            samples,
        })
    }

    /// Samples the red channel, the image is expanded to RGBA first.
    pub fn from_image(image: &image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let samples = rgba.pixels().map(|p| p.0[0]).collect();
        Self {
            width,
            height,
            samples,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw sample at grid position (x, z).
    pub fn sample(&self, x: u32, z: u32) -> u8 {
        self.samples[(z * self.width + x) as usize]
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for TerrainVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// CPU side terrain geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    /// Tessellates `heightmap` into `width * height` vertices and two
    /// triangles per grid cell.
    ///
    /// Vertex `i` sits at `x = i % width`, `z = i / width`. Its position is
    /// `(x * xz_scale, sample / 255 * height_scale, z * xz_scale)` and its
    /// texture coordinates are `(x / width, z / height)`.
    pub fn generate(heightmap: &Heightmap, height_scale: f32, xz_scale: f32) -> Self {
        let (width, height) = (heightmap.width(), heightmap.height());
        let elevation = |x: u32, z: u32| heightmap.sample(x, z) as f32 / 255.0 * height_scale;

        let mut vertices = Vec::with_capacity(width as usize * height as usize);
        for z in 0..height {
            for x in 0..width {
                vertices.push(TerrainVertex {
                    position: [x as f32 * xz_scale, elevation(x, z), z as f32 * xz_scale],
                    normal: grid_normal(width, height, xz_scale, x, z, &elevation).into(),
                    tex_coords: [x as f32 / width as f32, z as f32 / height as f32],
                });
            }
        }

        let cells = width.saturating_sub(1) as usize * height.saturating_sub(1) as usize;
        let mut indices = Vec::with_capacity(cells * 6);
        for z in 0..height.saturating_sub(1) {
            for x in 0..width.saturating_sub(1) {
                let v = z * width + x;
                indices.extend_from_slice(&[v, v + width, v + width + 1, v, v + width + 1, v + 1]);
            }
        }

        Self { vertices, indices }
    }

    /// Vertex and index buffer sizes in bytes of the mesh for a
    /// `width` x `height` heightmap.
    pub fn buffer_sizes(width: u32, height: u32) -> (u64, u64) {
        let vertices = width as u64 * height as u64;
        let cells = width.saturating_sub(1) as u64 * height.saturating_sub(1) as u64;
        (
            vertices * std::mem::size_of::<TerrainVertex>() as u64,
            cells * 6 * std::mem::size_of::<u32>() as u64,
        )
    }

    /// Fails when the mesh of `heightmap` would not fit into the buffers
    /// `limits` allow. Cheap enough to call before [`TerrainMesh::generate`].
    pub fn check_limits(heightmap: &Heightmap, limits: &wgpu::Limits) -> anyhow::Result<()> {
        let (vertex_bytes, index_bytes) = Self::buffer_sizes(heightmap.width(), heightmap.height());
        check_buffer_size("terrain vertex buffer", vertex_bytes, limits)?;
        check_buffer_size("terrain index buffer", index_bytes, limits)
    }

    pub fn upload(&self, device: &wgpu::Device) -> anyhow::Result<TerrainBuffers> {
        let limits = device.limits();
        check_buffer_size(
            "terrain vertex buffer",
            std::mem::size_of_val(self.vertices.as_slice()) as u64,
            &limits,
        )?;
        check_buffer_size(
            "terrain index buffer",
            std::mem::size_of_val(self.indices.as_slice()) as u64,
            &limits,
        )?;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Ok(TerrainBuffers {
            vertex_buffer,
            index_buffer,
            num_indices: self.indices.len() as u32,
        })
    }
}

/// Surface normal from central differences, one-sided at the borders.
fn grid_normal(
    width: u32,
    height: u32,
    xz_scale: f32,
    x: u32,
    z: u32,
    elevation: &impl Fn(u32, u32) -> f32,
) -> Vector3<f32> {
    let slope = |a: (u32, u32), b: (u32, u32), steps: u32| {
        if steps == 0 || xz_scale == 0.0 {
            0.0
        } else {
            (elevation(b.0, b.1) - elevation(a.0, a.1)) / (steps as f32 * xz_scale)
        }
    };
    let (left, right) = (x.saturating_sub(1), (x + 1).min(width - 1));
    let (back, front) = (z.saturating_sub(1), (z + 1).min(height - 1));
    let dx = slope((left, z), (right, z), right - left);
    let dz = slope((x, back), (x, front), front - back);
    Vector3::new(-dx, 1.0, -dz).normalize()
}

#[derive(Debug)]
pub struct TerrainBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, value: u8) -> Heightmap {
        Heightmap::new(width, height, vec![value; (width * height) as usize]).unwrap()
    }

    #[test]
    fn heightmap_rejects_mismatched_sample_count() {
        assert!(Heightmap::new(2, 2, vec![0; 3]).is_none());
        assert!(Heightmap::new(0, 0, Vec::new()).is_some());
    }

    #[test]
    fn heightmap_reads_the_red_channel() {
        let mut image = image::RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([10, 200, 200, 255]));
        image.put_pixel(1, 0, image::Rgba([250, 0, 0, 0]));
        let heightmap = Heightmap::from_image(&image::DynamicImage::ImageRgba8(image));
        assert_eq!((heightmap.width(), heightmap.height()), (2, 1));
        assert_eq!(heightmap.sample(0, 0), 10);
        assert_eq!(heightmap.sample(1, 0), 250);
    }

    #[test]
    fn vertices_follow_the_grid() {
        let heightmap = Heightmap::new(3, 2, vec![0, 51, 255, 0, 0, 0]).unwrap();
        let mesh = TerrainMesh::generate(&heightmap, 100.0, 5.0);
        assert_eq!(mesh.vertices.len(), 6);

        let v1 = mesh.vertices[1];
        assert_eq!(v1.position, [5.0, 20.0, 0.0]);
        assert_eq!(v1.tex_coords, [1.0 / 3.0, 0.0]);

        let v2 = mesh.vertices[2];
        assert_eq!(v2.position, [10.0, 100.0, 0.0]);

        let v4 = mesh.vertices[4];
        assert_eq!(v4.position, [5.0, 0.0, 5.0]);
        assert_eq!(v4.tex_coords, [1.0 / 3.0, 0.5]);
    }

    #[test]
    fn every_cell_gets_two_triangles() {
        let mesh = TerrainMesh::generate(&flat(3, 3, 0), 100.0, 5.0);
        assert_eq!(mesh.indices.len(), 2 * 2 * 6);
        assert_eq!(&mesh.indices[..6], &[0, 3, 4, 0, 4, 1]);
        // Second cell of the second row.
        assert_eq!(&mesh.indices[18..], &[4, 7, 8, 4, 8, 5]);
        assert!(mesh.indices.iter().all(|&i| i < 9));
    }

    #[test]
    fn triangles_face_upwards() {
        let mesh = TerrainMesh::generate(&flat(4, 4, 30), 100.0, 5.0);
        for t in mesh.indices.chunks(3) {
            let p = |i: u32| Vector3::from(mesh.vertices[i as usize].position);
            let n = (p(t[1]) - p(t[0])).cross(p(t[2]) - p(t[0]));
            assert!(n.y > 0.0, "triangle {t:?} faces down");
        }
    }

    #[test]
    fn flat_ground_points_straight_up() {
        let mesh = TerrainMesh::generate(&flat(4, 3, 128), 100.0, 5.0);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn slopes_tilt_the_normal_downhill() {
        // Rising towards +x.
        let heightmap = Heightmap::new(3, 1, vec![0, 51, 102]).unwrap();
        let mesh = TerrainMesh::generate(&heightmap, 100.0, 5.0);
        let n = Vector3::from(mesh.vertices[1].normal);
        assert!(n.x < 0.0 && n.y > 0.0);
        assert!(n.z.abs() < 1e-6);
        // 20 units up over 5 units along x.
        assert!((n.x / n.y + 4.0).abs() < 1e-4);
    }

    #[test]
    fn buffer_sizes_match_the_generated_mesh() {
        let mesh = TerrainMesh::generate(&flat(4, 3, 0), 100.0, 5.0);
        let (vertex_bytes, index_bytes) = TerrainMesh::buffer_sizes(4, 3);
        assert_eq!(vertex_bytes as usize, std::mem::size_of_val(mesh.vertices.as_slice()));
        assert_eq!(index_bytes as usize, std::mem::size_of_val(mesh.indices.as_slice()));
    }

    #[test]
    fn huge_heightmaps_do_not_fit_the_default_limits() {
        let limits = wgpu::Limits::default();
        assert!(TerrainMesh::check_limits(&flat(64, 64, 0), &limits).is_ok());

        // 8192 x 8192 vertices of 32 bytes are 2 GiB, far above 256 MiB.
        let (vertex_bytes, _) = TerrainMesh::buffer_sizes(8192, 8192);
        assert!(vertex_bytes > limits.max_buffer_size);
        let tight = wgpu::Limits {
            max_buffer_size: 1024,
            ..wgpu::Limits::default()
        };
        let err = TerrainMesh::check_limits(&flat(16, 16, 0), &tight).unwrap_err();
        assert!(err.to_string().contains("terrain vertex buffer"), "{err}");
    }

    #[test]
    fn thin_grids_have_no_cells() {
        assert!(TerrainMesh::generate(&flat(1, 5, 0), 100.0, 5.0).indices.is_empty());
        assert!(TerrainMesh::generate(&flat(5, 1, 0), 100.0, 5.0).indices.is_empty());
        let empty = TerrainMesh::generate(&flat(0, 0, 0), 100.0, 5.0);
        assert!(empty.vertices.is_empty() && empty.indices.is_empty());
    }
}
