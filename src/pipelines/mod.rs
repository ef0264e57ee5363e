//! Render pipelines.
//!
//! Every program is a single WGSL file under `assets/shaders/` with a
//! `vs_main` and an `fs_main` entry point. The bind group convention shared by
//! all of them is:
//!
//! - group 0: the scene uniform (camera and light), owned by the context
//! - group 1: the object's transform, or the cube map for the skybox
//! - group 2: the object's textures

use std::path::Path;

use crate::data_structures::texture::Texture;

pub mod layouts;
pub mod model;
pub mod normals;
pub mod shader;
pub mod skybox;
pub mod terrain;
pub mod textured;

/// Fixed-function state that differs between programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub blend: Option<wgpu::BlendState>,
    pub cull_mode: Option<wgpu::Face>,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            blend: Some(wgpu::BlendState::REPLACE),
            cull_mode: Some(wgpu::Face::Back),
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
        }
    }
}

impl PipelineSettings {
    /// Drawn behind everything: no depth test, no depth write, no culling.
    pub fn background() -> Self {
        Self {
            cull_mode: None,
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
            ..Default::default()
        }
    }

    pub fn double_sided(self) -> Self {
        Self {
            cull_mode: None,
            ..self
        }
    }

    pub fn alpha_blended(self) -> Self {
        Self {
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            ..self
        }
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    settings: PipelineSettings,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: settings.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: settings.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: settings.depth_write,
            depth_compare: settings.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// Everything [`build_program`] needs besides the device.
pub(crate) struct ProgramDesc<'a> {
    pub label: &'a str,
    pub path: &'a Path,
    pub color_format: wgpu::TextureFormat,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub settings: PipelineSettings,
}

/// Compiles the WGSL file at `desc.path` and links it into a pipeline.
pub(crate) async fn build_program(
    device: &wgpu::Device,
    desc: ProgramDesc<'_>,
) -> Result<wgpu::RenderPipeline, shader::ShaderError> {
    let module = shader::load_program(device, desc.path).await?;
    shader::link_program(device, desc.label, |device| {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: desc.bind_group_layouts,
            push_constant_ranges: &[],
        });
        mk_render_pipeline(
            device,
            desc.label,
            &layout,
            desc.color_format,
            desc.settings,
            desc.vertex_layouts,
            &module,
        )
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_pipelines_ignore_depth() {
        let settings = PipelineSettings::background();
        assert!(!settings.depth_write);
        assert_eq!(settings.depth_compare, wgpu::CompareFunction::Always);
        assert_eq!(settings.cull_mode, None);
    }

    #[test]
    fn modifiers_keep_the_remaining_state() {
        let settings = PipelineSettings::default().double_sided().alpha_blended();
        assert_eq!(settings.cull_mode, None);
        assert_eq!(settings.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert!(settings.depth_write);
        assert_eq!(settings.depth_compare, wgpu::CompareFunction::Less);
    }
}
