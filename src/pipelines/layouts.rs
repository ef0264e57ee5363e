//! Bind group layouts shared by the programs.

use crate::data_structures::texture::Texture;

pub fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// A single uniform buffer at binding 0.
pub fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, visibility)],
        label: Some(label),
    })
}

/// Group 1 of every object drawn with a transform.
pub fn object_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    uniform_layout(device, "object_bind_group_layout", wgpu::ShaderStages::VERTEX)
}

/// `count` filterable float texture and sampler pairs, texture `i` at
/// binding `2 * i` and its sampler at `2 * i + 1`.
pub fn texture_entries(
    count: u32,
    dimension: wgpu::TextureViewDimension,
) -> Vec<wgpu::BindGroupLayoutEntry> {
    (0..count)
        .flat_map(|i| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * i,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: dimension,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2 * i + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect()
}

pub fn textures_layout(
    device: &wgpu::Device,
    label: &str,
    count: u32,
    dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &texture_entries(count, dimension),
        label: Some(label),
    })
}

/// Diffuse texture at bindings 0/1, normal map at 2/3.
pub fn diffuse_normal_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    textures_layout(
        device,
        "diffuse_normal_bind_group_layout",
        2,
        wgpu::TextureViewDimension::D2,
    )
}

/// Binds `textures` in the order laid out by [`texture_entries`].
pub fn textures_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    textures: &[&Texture],
) -> wgpu::BindGroup {
    let entries: Vec<_> = textures
        .iter()
        .enumerate()
        .flat_map(|(i, texture)| {
            [
                wgpu::BindGroupEntry {
                    binding: 2 * i as u32,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2 * i as u32 + 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ]
        })
        .collect();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &entries,
        label: Some(label),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_pairs_are_interleaved() {
        let entries = texture_entries(3, wgpu::TextureViewDimension::D2);
        assert_eq!(entries.len(), 6);
        let bindings: Vec<_> = entries.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3, 4, 5]);
        assert!(matches!(entries[4].ty, wgpu::BindingType::Texture { .. }));
        assert!(matches!(entries[5].ty, wgpu::BindingType::Sampler(_)));
    }

    #[test]
    fn cube_textures_keep_their_dimension() {
        let entries = texture_entries(1, wgpu::TextureViewDimension::Cube);
        assert!(matches!(
            entries[0].ty,
            wgpu::BindingType::Texture {
                view_dimension: wgpu::TextureViewDimension::Cube,
                ..
            }
        ));
    }
}
