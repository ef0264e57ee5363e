use std::path::{Path, PathBuf};

use crate::{
    context::{Context, InitContext},
    data_structures::{
        terrain::{Heightmap, TerrainBuffers, TerrainMesh},
        texture::Texture,
        transform::{Transform, TransformBinding},
    },
    flow::{FlowConstructor, GraphicsFlow},
    pipelines::{layouts, terrain::TerrainPipeline},
    resources::texture::{load_image, load_textures},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSettings {
    pub heightmap: PathBuf,
    pub height_normal_map: PathBuf,
    /// Dirt, sand, grass, rock and snow, from the lowest to the highest band.
    pub detail_textures: [PathBuf; 5],
    /// World height of a white heightmap pixel.
    pub height_scale: f32,
    /// World distance between neighbouring heightmap pixels.
    pub xz_scale: f32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            heightmap: "textures/heightMap.png".into(),
            height_normal_map: "textures/heightnormal.png".into(),
            detail_textures: [
                "textures/dirt.jpg".into(),
                "textures/sand.jpg".into(),
                "textures/grass.png".into(),
                "textures/rock.jpg".into(),
                "textures/snow.jpg".into(),
            ],
            height_scale: 100.0,
            xz_scale: 5.0,
        }
    }
}

#[derive(Debug)]
struct TerrainDrawable {
    buffers: TerrainBuffers,
    transform: TransformBinding,
    textures: wgpu::BindGroup,
}

/// Heightmap terrain. Without a readable heightmap there is nothing to draw
/// and the flow stays empty.
#[derive(Debug)]
pub struct TerrainFlow {
    pipeline: TerrainPipeline,
    terrain: Option<TerrainDrawable>,
}

impl TerrainFlow {
    pub async fn new(ctx: &InitContext, settings: TerrainSettings) -> anyhow::Result<Self> {
        let pipeline =
            TerrainPipeline::new(&ctx.device, ctx.format, &ctx.scene_layout, &ctx.assets).await?;

        let heightmap_path = ctx.assets.resolve(&settings.heightmap);
        let (heightmap_texture, buffers) =
            match Self::load_heightmap(ctx, &heightmap_path, &settings).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    log::error!("Error loading heightmap: {}", heightmap_path.display());
                    log::debug!("{e:#}");
                    return Ok(Self {
                        pipeline,
                        terrain: None,
                    });
                }
            };

        let mut sources = vec![(ctx.assets.resolve(&settings.height_normal_map), true)];
        sources.extend(
            settings
                .detail_textures
                .iter()
                .map(|path| (ctx.assets.resolve(path), false)),
        );
        let loaded = load_textures(&sources, &ctx.device, &ctx.queue).await;

        let mut textures = vec![&heightmap_texture];
        textures.extend(loaded.iter());
        let textures = layouts::textures_bind_group(
            &ctx.device,
            "terrain_textures_bind_group",
            &pipeline.texture_layout,
            &textures,
        );
        let transform = TransformBinding::new(
            &ctx.device,
            &pipeline.object_layout,
            Transform::new(),
            "Terrain Transform",
        );

        Ok(Self {
            terrain: Some(TerrainDrawable {
                buffers,
                transform,
                textures,
            }),
            pipeline,
        })
    }
}

impl TerrainFlow {
    /// Decodes the heightmap and uploads both its texture and its mesh.
    async fn load_heightmap(
        ctx: &InitContext,
        path: &Path,
        settings: &TerrainSettings,
    ) -> anyhow::Result<(Texture, TerrainBuffers)> {
        let image = load_image(path).await?;
        let heightmap = Heightmap::from_image(&image);
        TerrainMesh::check_limits(&heightmap, &ctx.device.limits())?;

        // Heights are data, not colour, so the heightmap is sampled linearly.
        let texture = Texture::from_image(&ctx.device, &ctx.queue, &image, Some("heightmap"), true)?;
        let mesh = TerrainMesh::generate(&heightmap, settings.height_scale, settings.xz_scale);
        log::info!(
            "Terrain of {}x{} vertices, {} triangles",
            heightmap.width(),
            heightmap.height(),
            mesh.indices.len() / 3
        );
        Ok((texture, mesh.upload(&ctx.device)?))
    }

    /// Whether a terrain was loaded and will be drawn.
    pub fn has_terrain(&self) -> bool {
        self.terrain.is_some()
    }
}

impl GraphicsFlow for TerrainFlow {
    fn on_render(&self, _ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        let Some(terrain) = &self.terrain else {
            return;
        };
        if terrain.buffers.num_indices == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(1, &terrain.transform.bind_group, &[]);
        render_pass.set_bind_group(2, &terrain.textures, &[]);
        render_pass.set_vertex_buffer(0, terrain.buffers.vertex_buffer.slice(..));
        render_pass.set_index_buffer(terrain.buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..terrain.buffers.num_indices, 0, 0..1);
    }
}

pub fn terrain(settings: TerrainSettings) -> FlowConstructor {
    Box::new(move |ctx: InitContext| {
        Box::pin(async move {
            let flow = TerrainFlow::new(&ctx, settings).await?;
            anyhow::Ok(Box::new(flow) as Box<dyn GraphicsFlow>)
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::pipelines::terrain::TERRAIN_TEXTURE_COUNT;

    use super::*;

    #[test]
    fn every_terrain_binding_has_a_texture() {
        let settings = TerrainSettings::default();
        // heightmap + height normal map + detail textures
        let count = 2 + settings.detail_textures.len() as u32;
        assert_eq!(count, TERRAIN_TEXTURE_COUNT);
        assert_eq!(settings.height_scale, 100.0);
        assert_eq!(settings.xz_scale, 5.0);
    }
}
