//! The window event loop and the flows it drives.
//!
//! A "flow" is one drawable part of a program, e.g. the skybox or the terrain.
//! [`run`] creates the window and the [`Context`], builds every flow from its
//! constructor and then drives the frame loop.
//!
//! # Lifecycle Flow
//!
//! Every frame goes through these steps:
//! 1. Collect window/device events and pass them to every flow
//! 2. Move the camera and upload the scene uniform
//! 3. Update flow state via `on_update`
//! 4. Open one render pass and let each flow draw in registration order
//! 5. Present frame

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    config::AppConfig,
    context::{Context, InitContext},
    input::Input,
};

/// A self-contained drawable with its own state and GPU resources.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after every flow has been constructed
/// 2. `on_window_events()` and `on_device_events()` see every winit event
/// 3. `on_update()` is called every frame before rendering
/// 4. `on_render()` is called every frame inside the shared render pass
pub trait GraphicsFlow {
    /// The only place that gets to modify the [`Context`].
    fn on_init(&mut self, _ctx: &mut Context) {}

    fn on_window_events(&mut self, _ctx: &Context, _event: &WindowEvent) {}

    fn on_device_events(&mut self, _ctx: &Context, _event: &DeviceEvent) {}

    /// Called every frame with the time since the last frame.
    fn on_update(&mut self, _ctx: &Context, _input: &Input, _dt: Duration) {}

    /// Records the draw calls of this flow. Group 0 (the scene) is already
    /// bound.
    fn on_render(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>);
}

impl Debug for dyn GraphicsFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// A flow constructor takes an [`InitContext`] and asynchronously returns a
/// boxed [`GraphicsFlow`]. Resource loading happens in here.
pub type FlowConstructor = Box<
    dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow>>>>>,
>;

/// GPU context and surface status.
#[derive(Debug)]
struct AppState {
    ctx: Context,
    is_surface_configured: bool,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self, graphics_flows: &[Box<dyn GraphicsFlow>]) -> Result<(), wgpu::SurfaceError> {
        // Keep the frame loop going
        self.ctx.window.request_redraw();

        // Nothing to draw into before the first resize
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
            for flow in graphics_flows {
                flow.on_render(&self.ctx, &mut render_pass);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

struct App {
    async_runtime: tokio::runtime::Runtime,
    config: AppConfig,
    state: Option<AppState>,
    // Filled once `resumed` has built the flows.
    graphics_flows: Vec<Box<dyn GraphicsFlow>>,
    // Taken on the first `resumed`.
    constructors: Option<Vec<FlowConstructor>>,
    input: Input,
    last_time: Instant,
    // Returned by `run` once the event loop has stopped.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig, constructors: Vec<FlowConstructor>) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            config,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            input: Input::default(),
            last_time: Instant::now(),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let constructors = self.constructors.take().unwrap_or_default();
        let config = self.config.clone();
        let init_future = async move {
            let ctx = Context::new(window, &config).await?;
            let flow_futures: Vec<_> = constructors
                .into_iter()
                // Only handles are cloned, device and queue are shared
                .map(|constructor| constructor((&ctx).into()))
                .collect();
            let flows = futures::future::join_all(flow_futures)
                .await
                .into_iter()
                .collect::<anyhow::Result<Vec<_>>>()?;
            anyhow::Ok((ctx, flows))
        };
        let (ctx, flows) = self.async_runtime.block_on(init_future)?;

        let mut app_state = AppState {
            ctx,
            is_surface_configured: false,
        };
        self.graphics_flows = flows;
        for flow in self.graphics_flows.iter_mut() {
            flow.on_init(&mut app_state.ctx);
        }
        if self.config.capture_cursor {
            app_state.ctx.capture_cursor();
        }
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        app_state.ctx.window.request_redraw();
        log::info!("{} flows ready", self.graphics_flows.len());

        self.state = Some(app_state);
        self.last_time = Instant::now();
        Ok(())
    }
}

fn is_escape(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::KeyboardInput {
            event: KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::Escape),
                state: ElementState::Pressed,
                ..
            },
            ..
        }
    )
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.constructors.is_none() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("failed to create the window"));
                return;
            }
        };

        if let Err(e) = self.init(window) {
            self.fail(event_loop, e.context("initialisation failed"));
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.config.capture_cursor {
                state.ctx.handle_mouse(dx, dy);
            }
        }
        for flow in self.graphics_flows.iter_mut() {
            flow.on_device_events(&state.ctx, &event);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        // general stuff
        self.input.handle_window_event(&event);
        for flow in self.graphics_flows.iter_mut() {
            flow.on_window_events(&state.ctx, &event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            _ if is_escape(&event) => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::Focused(true) if self.config.capture_cursor => state.ctx.capture_cursor(),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.ctx.update_scene(&self.input, dt);
                for flow in self.graphics_flows.iter_mut() {
                    flow.on_update(&state.ctx, &self.input, dt);
                }

                match state.render(&self.graphics_flows) {
                    Ok(()) => {}
                    // Lost or outdated surfaces just need to be configured again
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Opens a window for `config` and runs `constructors`' flows until the
/// window is closed or Escape is pressed.
///
/// Failing to create the window, the graphics context or any flow ends the
/// event loop and is returned as an error.
pub fn run(config: AppConfig, constructors: Vec<FlowConstructor>) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };
    log::info!("Starting {}", config.title);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, constructors)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_events_do_not_quit() {
        assert!(!is_escape(&WindowEvent::CloseRequested));
        assert!(!is_escape(&WindowEvent::Focused(true)));
    }
}
