//! Height and slope blended terrain.

use crate::{
    config::AssetDir,
    data_structures::{model::Vertex, terrain::TerrainVertex},
    pipelines::{ProgramDesc, PipelineSettings, build_program, layouts, shader::ShaderError},
};

pub const SHADER: &str = "shaders/terrain.wgsl";

/// Heightmap, height normal map, dirt, sand, grass, rock and snow.
pub const TERRAIN_TEXTURE_COUNT: u32 = 7;

#[derive(Debug)]
pub struct TerrainPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub object_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
}

impl TerrainPipeline {
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        scene_layout: &wgpu::BindGroupLayout,
        assets: &AssetDir,
    ) -> Result<Self, ShaderError> {
        let object_layout = layouts::object_layout(device);
        let texture_layout = layouts::textures_layout(
            device,
            "terrain_bind_group_layout",
            TERRAIN_TEXTURE_COUNT,
            wgpu::TextureViewDimension::D2,
        );
        let pipeline = build_program(
            device,
            ProgramDesc {
                label: "Terrain Pipeline",
                path: &assets.resolve(SHADER),
                color_format,
                bind_group_layouts: &[scene_layout, &object_layout, &texture_layout],
                vertex_layouts: &[TerrainVertex::desc()],
                settings: PipelineSettings::default(),
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
