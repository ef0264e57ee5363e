use std::path::PathBuf;

use crate::{
    context::{Context, InitContext},
    data_structures::skybox::{SKYBOX_FACES, SkyboxMesh},
    flow::{FlowConstructor, GraphicsFlow},
    pipelines::{layouts, skybox::SkyboxPipeline},
    resources::texture::load_cube_texture,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SkyboxSettings {
    /// +X, -X, +Y, -Y, +Z, -Z
    pub faces: [PathBuf; 6],
}

impl Default for SkyboxSettings {
    fn default() -> Self {
        Self {
            faces: SKYBOX_FACES.map(PathBuf::from),
        }
    }
}

/// Cube-mapped background. Register it before any other flow so that it is
/// drawn first.
#[derive(Debug)]
pub struct SkyboxFlow {
    pipeline: SkyboxPipeline,
    mesh: SkyboxMesh,
    cube: wgpu::BindGroup,
}

impl SkyboxFlow {
    pub async fn new(ctx: &InitContext, settings: SkyboxSettings) -> anyhow::Result<Self> {
        let pipeline =
            SkyboxPipeline::new(&ctx.device, ctx.format, &ctx.scene_layout, &ctx.assets).await?;
        let faces = settings.faces.map(|face| ctx.assets.resolve(face));
        let texture = load_cube_texture(&faces, &ctx.device, &ctx.queue).await;
        let cube = layouts::textures_bind_group(
            &ctx.device,
            "skybox_bind_group",
            &pipeline.cube_layout,
            &[&texture],
        );
        Ok(Self {
            mesh: SkyboxMesh::new(&ctx.device),
            pipeline,
            cube,
        })
    }
}

impl GraphicsFlow for SkyboxFlow {
    fn on_render(&self, _ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(1, &self.cube, &[]);
        render_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        render_pass.draw(0..self.mesh.num_vertices, 0..1);
    }
}

pub fn skybox(settings: SkyboxSettings) -> FlowConstructor {
    Box::new(move |ctx: InitContext| {
        Box::pin(async move {
            let flow = SkyboxFlow::new(&ctx, settings).await?;
            anyhow::Ok(Box::new(flow) as Box<dyn GraphicsFlow>)
        })
    })
}
