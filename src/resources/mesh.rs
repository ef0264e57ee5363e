use cgmath::{Vector2, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    check_buffer_size,
    model::{self, ModelVertex},
    spikes::{self, SpikeVertex},
};

/// UV triangles with a smaller determinant do not contribute to tangents.
const MIN_UV_AREA: f32 = 1e-8;

/// CPU copy of one mesh, kept around for the normal visualisation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl MeshGeometry {
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    pub fn spikes(&self) -> Vec<SpikeVertex> {
        spikes::expand(&self.positions(), &self.indices)
    }
}

/// Builds vertices for a triangulated, single-index mesh.
///
/// Missing texture coordinates and normals default to zero. The V coordinate
/// is flipped because OBJ puts the texture origin at the bottom left.
pub fn mesh_geometry(m: &tobj::Model) -> MeshGeometry {
    let mut vertices = (0..m.mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                m.mesh.positions[i * 3],
                m.mesh.positions[i * 3 + 1],
                m.mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
            // Filled in below
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        })
        .collect::<Vec<_>>();

    let vertex_count = vertices.len() as u32;
    let indices: Vec<u32> = m
        .mesh
        .indices
        .chunks_exact(3)
        .filter(|c| c.iter().all(|&i| i < vertex_count))
        .flatten()
        .copied()
        .collect();
    if indices.len() != m.mesh.indices.len() {
        log::warn!(
            "Mesh {} references missing vertices, {} indices dropped",
            m.name,
            m.mesh.indices.len() - indices.len()
        );
    }

    compute_tangents(&mut vertices, &indices);

    MeshGeometry {
        name: m.name.clone(),
        vertices,
        indices,
        material: m.mesh.material_id,
    }
}

/// OBJ files don't come with tangents and bitangents so they have to be
/// calculated for normal maps to work.
///
/// Each vertex gets the average over the triangles it is part of. Triangles
/// with degenerate texture coordinates are skipped.
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

        let pos0: Vector3<f32> = v0.position.into();
        let pos1: Vector3<f32> = v1.position.into();
        let pos2: Vector3<f32> = v2.position.into();

        let uv0: Vector2<f32> = v0.tex_coords.into();
        let uv1: Vector2<f32> = v1.tex_coords.into();
        let uv2: Vector2<f32> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < MIN_UV_AREA {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // Flipped for right-handed normal maps with wgpu's texture coordinates
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            let v = &mut vertices[i];
            v.tangent = (tangent + Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + Vector3::from(v.bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (Vector3::from(v.tangent) * denom).into();
        v.bitangent = (Vector3::from(v.bitangent) * denom).into();
    }
}

pub fn upload_mesh(
    device: &wgpu::Device,
    geometry: &MeshGeometry,
    material: usize,
) -> anyhow::Result<model::Mesh> {
    let limits = device.limits();
    check_buffer_size(
        &format!("{} vertex buffer", geometry.name),
        std::mem::size_of_val(geometry.vertices.as_slice()) as u64,
        &limits,
    )?;
    check_buffer_size(
        &format!("{} index buffer", geometry.name),
        std::mem::size_of_val(geometry.indices.as_slice()) as u64,
        &limits,
    )?;
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Vertex Buffer", geometry.name)),
        contents: bytemuck::cast_slice(&geometry.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Index Buffer", geometry.name)),
        // The indices are shared by positions, texels and normals because `single_index` is set
        contents: bytemuck::cast_slice(&geometry.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    Ok(model::Mesh {
        name: geometry.name.clone(),
        vertex_buffer,
        index_buffer,
        num_elements: geometry.indices.len() as u32,
        material,
    })
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    fn vertex(position: [f32; 3], tex_coords: [f32; 2]) -> ModelVertex {
        ModelVertex {
            position,
            tex_coords,
            normal: [0.0, 0.0, 1.0],
            ..Default::default()
        }
    }

    #[test]
    fn tangents_follow_the_texture_axes() {
        let mut vertices = vec![
            vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
            vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
            vertex([0.0, 1.0, 0.0], [0.0, 1.0]),
        ];
        compute_tangents(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            assert_eq!(v.tangent, [1.0, 0.0, 0.0]);
            assert_eq!(v.bitangent, [0.0, -1.0, 0.0]);
        }
    }

    #[test]
    fn shared_vertices_average_their_triangles() {
        let mut vertices = vec![
            vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
            vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
            vertex([0.0, 1.0, 0.0], [0.0, 1.0]),
            vertex([0.0, 0.0, 2.0], [0.0, 0.0]),
        ];
        // Second triangle is twice as long along x for the same UV span.
        vertices.push(vertex([2.0, 0.0, 0.0], [1.0, 0.0]));
        compute_tangents(&mut vertices, &[0, 1, 2, 0, 4, 2]);
        assert_eq!(vertices[0].tangent, [1.5, 0.0, 0.0]);
        assert_eq!(vertices[1].tangent, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[4].tangent, [2.0, 0.0, 0.0]);
        // Unreferenced vertices keep an empty frame.
        assert_eq!(Vector3::from(vertices[3].tangent).magnitude(), 0.0);
    }

    #[test]
    fn degenerate_uvs_leave_tangents_untouched() {
        let mut vertices = vec![
            vertex([0.0, 0.0, 0.0], [0.5, 0.5]),
            vertex([1.0, 0.0, 0.0], [0.5, 0.5]),
            vertex([0.0, 1.0, 0.0], [0.5, 0.5]),
        ];
        compute_tangents(&mut vertices, &[0, 1, 2]);
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3] && v.bitangent == [0.0; 3]));
        assert!(vertices.iter().all(|v| v.tangent.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn geometry_flips_v_and_drops_broken_triangles() {
        let model = tobj::Model::new(
            tobj::Mesh {
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                texcoords: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
                indices: vec![0, 1, 2, 0, 1, 7],
                ..Default::default()
            },
            "quad".to_string(),
        );
        let geometry = mesh_geometry(&model);
        assert_eq!(geometry.indices, vec![0, 1, 2]);
        assert_eq!(geometry.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(geometry.vertices[2].tex_coords, [0.0, 0.0]);
        // Normals were not part of the file.
        assert_eq!(geometry.vertices[1].normal, [0.0; 3]);
        assert_eq!(geometry.material, None);
        assert_eq!(geometry.spikes().len(), 3);
    }
}
