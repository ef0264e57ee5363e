//! Directionally lit, normal-mapped models.

use crate::{
    config::AssetDir,
    data_structures::model::{ModelVertex, Vertex},
    pipelines::{ProgramDesc, PipelineSettings, build_program, layouts, shader::ShaderError},
};

pub const SHADER: &str = "shaders/model.wgsl";

#[derive(Debug)]
pub struct ModelPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub object_layout: wgpu::BindGroupLayout,
    /// Layout of every [`Material`](crate::data_structures::model::Material).
    pub material_layout: wgpu::BindGroupLayout,
}

impl ModelPipeline {
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
        assets: &AssetDir,
    ) -> Result<Self, ShaderError> {
        let object_layout = layouts::object_layout(device);
        let material_layout = layouts::diffuse_normal_layout(device);
        let pipeline = build_program(
            device,
            ProgramDesc {
                label: "Model Pipeline",
                path: &assets.resolve(SHADER),
                color_format,
                bind_group_layouts: &[scene_layout, &object_layout, &material_layout],
                vertex_layouts: &[ModelVertex::desc()],
                settings: PipelineSettings::default(),
            },
        )
        .await?;
        Ok(Self {
            pipeline,
            object_layout,
            material_layout,
        })
    }
}
