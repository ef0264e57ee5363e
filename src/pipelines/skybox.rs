//! Cube-mapped background.

use crate::{
    config::AssetDir,
    data_structures::{model::Vertex, skybox::SkyboxVertex},
    pipelines::{ProgramDesc, PipelineSettings, build_program, layouts, shader::ShaderError},
};

pub const SHADER: &str = "shaders/skybox.wgsl";

#[derive(Debug)]
pub struct SkyboxPipeline {
    pub pipeline: wgpu::RenderPipeline,
    /// Cube texture at binding 0, sampler at 1.
    pub cube_layout: wgpu::BindGroupLayout,
}

impl SkyboxPipeline {
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
        assets: &AssetDir,
    ) -> Result<Self, ShaderError> {
        let cube_layout = layouts::textures_layout(
            device,
            "skybox_bind_group_layout",
            1,
            wgpu::TextureViewDimension::Cube,
        );
        let pipeline = build_program(
            device,
            ProgramDesc {
                label: "Skybox Pipeline",
                path: &assets.resolve(SHADER),
                color_format,
                bind_group_layouts: &[scene_layout, &cube_layout],
                vertex_layouts: &[SkyboxVertex::desc()],
                settings: PipelineSettings::background(),
            },
        )
        .await?;
        Ok(Self {
            pipeline,
            cube_layout,
        })
    }
}
