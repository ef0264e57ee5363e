//! render-assignments
//!
//! Three small real-time rendering programs built on wgpu and winit: a
//! rotating normal-mapped box, a heightmap terrain under a skybox, and a model
//! whose surface normals are drawn as textured spikes.
//!
//! High-level modules
//! - `camera`: camera, projection, fly controller and the scene uniform
//! - `config`: window, camera and asset presets of each program
//! - `context`: window surface, device, queue, depth buffer and camera
//! - `data_structures`: vertices, meshes, textures and transforms
//! - `flow`: the event loop and the [`flow::GraphicsFlow`] trait
//! - `flows`: the drawables of the three programs
//! - `input`: keyboard state
//! - `pipelines`: WGSL programs and their bind group layouts
//! - `resources`: texture and model loading
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod flows;
pub mod input;
pub mod pipelines;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::event::{DeviceEvent, WindowEvent};
