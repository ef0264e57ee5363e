//! Textured spikes along the face normals of a model.

use crate::{
    config::AssetDir,
    data_structures::{model::Vertex, spikes::SpikeVertex},
    pipelines::{ProgramDesc, PipelineSettings, build_program, layouts, shader::ShaderError},
};

pub const SHADER: &str = "shaders/normals.wgsl";

#[derive(Debug)]
pub struct NormalsPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub object_layout: wgpu::BindGroupLayout,
    /// Spike texture at bindings 0/1, spike parameters at 2.
    pub spike_layout: wgpu::BindGroupLayout,
}

impl NormalsPipeline {
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
        assets: &AssetDir,
    ) -> Result<Self, ShaderError> {
        let object_layout = layouts::object_layout(device);
        let mut entries = layouts::texture_entries(1, wgpu::TextureViewDimension::D2);
        entries.push(layouts::uniform_entry(2, wgpu::ShaderStages::VERTEX));
        let spike_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &entries,
            label: Some("spike_bind_group_layout"),
        });
        let pipeline = build_program(
            device,
            ProgramDesc {
                label: "Normals Pipeline",
                path: &assets.resolve(SHADER),
                color_format,
                bind_group_layouts: &[scene_layout, &object_layout, &spike_layout],
                vertex_layouts: &[SpikeVertex::desc()],
                settings: PipelineSettings::default().double_sided().alpha_blended(),
            },
        )
        .await?;
        Ok(Self {
            pipeline,
            object_layout,
            spike_layout,
        })
    }
}
