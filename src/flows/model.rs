use std::path::PathBuf;

use cgmath::Vector3;
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{
    context::{Context, InitContext},
    data_structures::{
        model::{DrawModel, Model},
        spikes::{SpikeBuffer, SpikeParams},
        transform::{Transform, TransformBinding},
    },
    flow::{FlowConstructor, GraphicsFlow},
    pipelines::{model::ModelPipeline, normals::NormalsPipeline},
    resources::{self, MeshGeometry, texture::load_texture_or_fallback},
};

/// Factor applied to the spike length per `+`/`-` press.
const LENGTH_STEP: f32 = 1.25;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalsSettings {
    pub texture: PathBuf,
    pub params: SpikeParams,
    /// Whether the spikes are visible before `N` is pressed.
    pub visible: bool,
}

impl Default for NormalsSettings {
    fn default() -> Self {
        Self {
            texture: "textures/Spike.png".into(),
            params: SpikeParams::default(),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub path: PathBuf,
    /// Position and scale are used, the model is never rotated.
    pub transform: Transform,
    /// Draws the face normals as spikes on top of the model.
    pub normals: Option<NormalsSettings>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: "models/backpack/backpack.obj".into(),
            transform: Transform::new(),
            normals: None,
        }
    }
}

impl ModelSettings {
    /// The backpack as placed next to the terrain.
    pub fn terrain_scene() -> Self {
        Self {
            transform: Transform::new()
                .with_position(Vector3::new(100.0, 100.0, 100.0))
                .with_uniform_scale(10.0),
            ..Default::default()
        }
    }

    /// The backpack at the origin with its normals drawn.
    pub fn normals_scene() -> Self {
        Self {
            normals: Some(NormalsSettings::default()),
            ..Default::default()
        }
    }
}

/// What a key press does to the normal pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalsCommand {
    Toggle,
    ScaleLength(f32),
}

impl NormalsCommand {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyN => Some(Self::Toggle),
            KeyCode::Equal | KeyCode::NumpadAdd => Some(Self::ScaleLength(LENGTH_STEP)),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(Self::ScaleLength(1.0 / LENGTH_STEP)),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct NormalsPass {
    pipeline: NormalsPipeline,
    spikes: SpikeBuffer,
    transform: TransformBinding,
    params: SpikeParams,
    params_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    visible: bool,
}

impl NormalsPass {
    async fn new(
        ctx: &InitContext,
        settings: NormalsSettings,
        geometry: &[MeshGeometry],
        transform: Transform,
    ) -> anyhow::Result<Self> {
        let pipeline =
            NormalsPipeline::new(&ctx.device, ctx.format, &ctx.scene_layout, &ctx.assets).await?;

        let spikes: Vec<_> = geometry.iter().flat_map(MeshGeometry::spikes).collect();
        log::info!("{} normal spikes", spikes.len());
        let spikes = SpikeBuffer::new(&ctx.device, &spikes, "Spike Vertex Buffer");

        let texture =
            load_texture_or_fallback(&ctx.assets.resolve(&settings.texture), false, &ctx.device, &ctx.queue)
                .await;
        let params_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Spike Params Buffer"),
            contents: bytemuck::cast_slice(&[settings.params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pipeline.spike_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
            label: Some("spike_bind_group"),
        });
        let transform =
            TransformBinding::new(&ctx.device, &pipeline.object_layout, transform, "Spike Transform");

        Ok(Self {
            pipeline,
            spikes,
            transform,
            params: settings.params,
            params_buffer,
            bind_group,
            visible: settings.visible,
        })
    }

    fn apply(&mut self, command: NormalsCommand, queue: &wgpu::Queue) {
        match command {
            NormalsCommand::Toggle => {
                self.visible = !self.visible;
                log::info!("Normals {}", if self.visible { "shown" } else { "hidden" });
            }
            NormalsCommand::ScaleLength(factor) => {
                self.params.scale_length(factor);
                queue.write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[self.params]));
                log::debug!("Spike length {}", self.params.length);
            }
        }
    }

    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if !self.visible || self.spikes.num_vertices == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(1, &self.transform.bind_group, &[]);
        render_pass.set_bind_group(2, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.spikes.vertex_buffer.slice(..));
        render_pass.draw(0..self.spikes.num_vertices, 0..1);
    }
}

#[derive(Debug)]
struct ModelDrawable {
    model: Model,
    transform: TransformBinding,
}

/// A lit OBJ model, optionally followed by the normal visualisation pass.
#[derive(Debug)]
pub struct ModelFlow {
    pipeline: ModelPipeline,
    model: Option<ModelDrawable>,
    normals: Option<NormalsPass>,
}

impl ModelFlow {
    pub async fn new(ctx: &InitContext, settings: ModelSettings) -> anyhow::Result<Self> {
        let pipeline =
            ModelPipeline::new(&ctx.device, ctx.format, &ctx.scene_layout, &ctx.assets).await?;

        let path = ctx.assets.resolve(&settings.path);
        let loaded =
            match resources::load_model_obj(&path, &ctx.device, &ctx.queue, &pipeline.material_layout)
                .await
            {
                Ok(loaded) => loaded,
                Err(e) => {
                    log::error!("Error loading model: {}", path.display());
                    log::debug!("{e:#}");
                    return Ok(Self {
                        pipeline,
                        model: None,
                        normals: None,
                    });
                }
            };

        let normals = match settings.normals {
            Some(normals) => {
                Some(NormalsPass::new(ctx, normals, &loaded.geometry, settings.transform).await?)
            }
            None => None,
        };
        let transform = TransformBinding::new(
            &ctx.device,
            &pipeline.object_layout,
            settings.transform,
            "Model Transform",
        );

        Ok(Self {
            pipeline,
            model: Some(ModelDrawable {
                model: loaded.model,
                transform,
            }),
            normals,
        })
    }

    /// Whether a model was loaded and will be drawn.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}

impl GraphicsFlow for ModelFlow {
    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent) {
        let Some(normals) = self.normals.as_mut() else {
            return;
        };
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        {
            if let Some(command) = NormalsCommand::from_key(*key) {
                normals.apply(command, &ctx.queue);
            }
        }
    }

    fn on_render(&self, _ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        let Some(drawable) = &self.model else {
            return;
        };
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(1, &drawable.transform.bind_group, &[]);
        render_pass.draw_model(&drawable.model);

        if let Some(normals) = &self.normals {
            normals.draw(render_pass);
        }
    }
}

pub fn model(settings: ModelSettings) -> FlowConstructor {
    Box::new(move |ctx: InitContext| {
        Box::pin(async move {
            let flow = ModelFlow::new(&ctx, settings).await?;
            anyhow::Ok(Box::new(flow) as Box<dyn GraphicsFlow>)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_normal_commands() {
        assert_eq!(NormalsCommand::from_key(KeyCode::KeyN), Some(NormalsCommand::Toggle));
        assert_eq!(
            NormalsCommand::from_key(KeyCode::NumpadAdd),
            Some(NormalsCommand::ScaleLength(1.25))
        );
        assert_eq!(
            NormalsCommand::from_key(KeyCode::Minus),
            Some(NormalsCommand::ScaleLength(0.8))
        );
        assert_eq!(NormalsCommand::from_key(KeyCode::KeyW), None);
    }

    #[test]
    fn scenes_place_the_backpack() {
        let terrain = ModelSettings::terrain_scene();
        assert_eq!(terrain.transform.position, Vector3::new(100.0, 100.0, 100.0));
        assert_eq!(terrain.transform.scale, Vector3::new(10.0, 10.0, 10.0));
        assert!(terrain.normals.is_none());

        let normals = ModelSettings::normals_scene();
        assert_eq!(normals.transform, Transform::new());
        let spikes = normals.normals.unwrap();
        assert_eq!(spikes.texture, PathBuf::from("textures/Spike.png"));
        assert!(spikes.visible);
    }
}
