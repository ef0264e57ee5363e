use std::sync::Arc;

use anyhow::Context as _;
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::window::{CursorGrabMode, Window};

use crate::{
    camera::{self, CameraController, CameraResources, Projection, SceneUniform},
    config::{AppConfig, AssetDir},
    data_structures::texture,
    input::Input,
    pipelines::layouts,
};

/// GPU and window state shared by every flow.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub clear_colour: wgpu::Color,
    pub assets: AssetDir,
}

impl Context {
    pub async fn new(window: Arc<Window>, app: &AppConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter can present to the window")?;
        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("render-assignments device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                ..Default::default()
            })
            .await
            .context("failed to create the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders assume an sRGB surface texture. Using a different one would
        // make all colours come out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera_config = &app.camera;
        let camera = camera::Camera::looking_at(camera_config.position, camera_config.target);
        let projection = Projection::new(
            config.width,
            config.height,
            cgmath::Deg(camera_config.fovy_degrees),
            camera_config.znear,
            camera_config.zfar,
        );
        let controller = camera_config.controller.map(CameraController::from);

        let mut uniform = SceneUniform::new();
        uniform.update_view_proj(&camera, &projection);
        uniform.set_light(app.light);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = layouts::uniform_layout(
            &device,
            "scene_bind_group_layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("scene_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        };

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            clear_colour: app.clear_colour,
            assets: app.assets.clone(),
        })
    }

    /// Reconfigures the surface, projection and depth buffer. Zero sized
    /// windows (minimised) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        true
    }

    /// Moves the camera and uploads the scene uniform for this frame.
    pub fn update_scene(&mut self, input: &Input, dt: Duration) {
        let camera = &mut self.camera;
        if let Some(controller) = camera.controller.as_mut() {
            controller.update(&mut camera.camera, input, dt);
        }
        camera.uniform.update_view_proj(&camera.camera, &self.projection);
        self.queue
            .write_buffer(&camera.buffer, 0, bytemuck::cast_slice(&[camera.uniform]));
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if let Some(controller) = self.camera.controller.as_mut() {
            controller.handle_mouse(dx, dy);
        }
    }

    /// Hides the cursor and keeps it inside the window.
    pub fn capture_cursor(&self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => self.window.set_cursor_visible(false),
            Err(e) => log::warn!("Could not capture the cursor: {e}"),
        }
    }
}

/// What a flow constructor gets to build its GPU resources with.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    /// Layout of bind group 0, needed by every pipeline.
    pub scene_layout: wgpu::BindGroupLayout,
    pub assets: AssetDir,
}

impl From<&Context> for InitContext {
    // Device, queue and layouts are reference counted, so this only clones handles.
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            format: ctx.config.format,
            scene_layout: ctx.camera.bind_group_layout.clone(),
            assets: ctx.assets.clone(),
        }
    }
}
