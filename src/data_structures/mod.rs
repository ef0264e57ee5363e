//! Scene data: geometry, textures and transforms.
//!
//! - `cube` is the normal-mapped box
//! - `model` contains mesh and material definitions for loaded 3D models
//! - `skybox` is the cube the sky texture is drawn on
//! - `spikes` turns triangles into normal visualisation spikes
//! - `terrain` tessellates heightmaps
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `transform` holds per-object transformation data

pub mod cube;
pub mod model;
pub mod skybox;
pub mod spikes;
pub mod terrain;
pub mod texture;
pub mod transform;

/// Fails when a buffer of `bytes` bytes is larger than `limits` allow.
pub fn check_buffer_size(label: &str, bytes: u64, limits: &wgpu::Limits) -> anyhow::Result<()> {
    anyhow::ensure!(
        bytes <= limits.max_buffer_size,
        "{label} needs {bytes} bytes, the device allows at most {}",
        limits.max_buffer_size
    );
    Ok(())
}
