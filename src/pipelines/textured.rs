//! Normal-mapped, point-lit program used for the rotating box.

use crate::{
    config::AssetDir,
    data_structures::{cube::CubeVertex, model::Vertex},
    pipelines::{ProgramDesc, PipelineSettings, build_program, layouts, shader::ShaderError},
};

pub const SHADER: &str = "shaders/textured_box.wgsl";

#[derive(Debug)]
pub struct TexturedBoxPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub object_layout: wgpu::BindGroupLayout,
    /// Main texture at bindings 0/1, normal map at 2/3.
    pub texture_layout: wgpu::BindGroupLayout,
}

impl TexturedBoxPipeline {
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
        assets: &AssetDir,
    ) -> Result<Self, ShaderError> {
        let object_layout = layouts::object_layout(device);
        let texture_layout = layouts::diffuse_normal_layout(device);
        let pipeline = build_program(
            device,
            ProgramDesc {
                label: "Textured Box Pipeline",
                path: &assets.resolve(SHADER),
                color_format,
                bind_group_layouts: &[scene_layout, &object_layout, &texture_layout],
                vertex_layouts: &[CubeVertex::desc()],
                // The cube is seen from every side while it spins.
                settings: PipelineSettings::default().double_sided(),
            },
        )
        .await?;
        Ok(Self {
            pipeline,
            object_layout,
            texture_layout,
        })
    }
}
