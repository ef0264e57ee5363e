use std::path::PathBuf;

use cgmath::{Deg, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use winit::keyboard::KeyCode;

use crate::{
    context::{Context, InitContext},
    data_structures::{
        cube::CubeMesh,
        transform::{Transform, TransformBinding},
    },
    flow::{FlowConstructor, GraphicsFlow},
    input::Input,
    pipelines::{layouts, textured::TexturedBoxPipeline},
    resources::texture::load_textures,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BoxSettings {
    pub texture: PathBuf,
    pub normal_map: PathBuf,
    /// Radians per second while a rotation key is held.
    pub rotation_speed: f32,
}

impl Default for BoxSettings {
    fn default() -> Self {
        Self {
            texture: "textures/container2.png".into(),
            normal_map: "textures/container2_normal.png".into(),
            // 0.01 rad per frame at 60 frames per second
            rotation_speed: 0.6,
        }
    }
}

/// The box lies on its side to begin with.
pub fn initial_transform() -> Transform {
    Transform::new().with_rotation(Quaternion::from_angle_x(Deg(90.0)))
}

/// A/D spin the box about its own Z axis, W/S about its own X axis.
pub fn apply_rotation(transform: &mut Transform, input: &Input, angle: Rad<f32>) {
    let about_z = input.axis(KeyCode::KeyA, KeyCode::KeyD);
    if about_z != 0.0 {
        transform.rotate_local(Vector3::unit_z(), angle * about_z);
    }
    let about_x = input.axis(KeyCode::KeyW, KeyCode::KeyS);
    if about_x != 0.0 {
        transform.rotate_local(Vector3::unit_x(), angle * about_x);
    }
}

#[derive(Debug)]
pub struct RotatingBoxFlow {
    pipeline: TexturedBoxPipeline,
    mesh: CubeMesh,
    transform: TransformBinding,
    textures: wgpu::BindGroup,
    rotation_speed: f32,
}

impl RotatingBoxFlow {
    pub async fn new(ctx: &InitContext, settings: BoxSettings) -> anyhow::Result<Self> {
        let pipeline =
            TexturedBoxPipeline::new(&ctx.device, ctx.format, &ctx.scene_layout, &ctx.assets).await?;
        let textures = load_textures(
            &[
                (ctx.assets.resolve(&settings.texture), false),
                (ctx.assets.resolve(&settings.normal_map), true),
            ],
            &ctx.device,
            &ctx.queue,
        )
        .await;
        let textures = layouts::textures_bind_group(
            &ctx.device,
            "box_textures_bind_group",
            &pipeline.texture_layout,
            &textures.iter().collect::<Vec<_>>(),
        );
        let transform = TransformBinding::new(
            &ctx.device,
            &pipeline.object_layout,
            initial_transform(),
            "Box Transform",
        );

        Ok(Self {
            mesh: CubeMesh::new(&ctx.device),
            pipeline,
            transform,
            textures,
            rotation_speed: settings.rotation_speed,
        })
    }
}

impl GraphicsFlow for RotatingBoxFlow {
    fn on_update(&mut self, ctx: &Context, input: &Input, dt: Duration) {
        let angle = Rad(self.rotation_speed * dt.as_secs_f32());
        apply_rotation(&mut self.transform.transform, input, angle);
        self.transform.write(&ctx.queue);
    }

    fn on_render(&self, _ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(1, &self.transform.bind_group, &[]);
        render_pass.set_bind_group(2, &self.textures, &[]);
        render_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.mesh.num_indices, 0, 0..1);
    }
}

pub fn rotating_box(settings: BoxSettings) -> FlowConstructor {
    Box::new(move |ctx: InitContext| {
        Box::pin(async move {
            let flow = RotatingBoxFlow::new(&ctx, settings).await?;
            anyhow::Ok(Box::new(flow) as Box<dyn GraphicsFlow>)
        })
    })
}
