use std::path::{Path, PathBuf};

use crate::{data_structures::texture::Texture, resources::load_binary};

/// Opaque black, what an undecodable colour texture samples as.
pub const FALLBACK_COLOUR: [u8; 4] = [0, 0, 0, 255];

pub async fn load_image(path: &Path) -> anyhow::Result<image::DynamicImage> {
    let data = load_binary(path).await?;
    let img = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(image::ImageFormat::from_extension)
    {
        Some(format) => image::load_from_memory_with_format(&data, format)?,
        None => image::load_from_memory(&data)?,
    };
    Ok(img)
}

pub async fn load_texture(
    path: &Path,
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(path).await?;
    let format = path.extension().and_then(|ext| ext.to_str());
    Texture::from_bytes(
        device,
        queue,
        &data,
        &path.display().to_string(),
        format,
        is_normal_map,
    )
}

/// 1x1 stand-in for a texture that could not be loaded.
pub fn fallback_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    is_normal_map: bool,
) -> Texture {
    if is_normal_map {
        Texture::create_default_normal_map(device, queue)
    } else {
        Texture::create_solid(device, queue, FALLBACK_COLOUR, false, "fallback texture")
    }
}

/// Like [`load_texture`] but never fails: errors are logged and a
/// [`fallback_texture`] is returned instead.
pub async fn load_texture_or_fallback(
    path: &Path,
    is_normal_map: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    match load_texture(path, is_normal_map, device, queue).await {
        Ok(texture) => texture,
        Err(e) => {
            log::error!("Error loading texture: {}", path.display());
            log::debug!("{e:#}");
            fallback_texture(device, queue, is_normal_map)
        }
    }
}

/// Loads all `(path, is_normal_map)` pairs concurrently, in order.
pub async fn load_textures(
    textures: &[(PathBuf, bool)],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Vec<Texture> {
    futures::future::join_all(
        textures
            .iter()
            .map(|(path, is_normal_map)| load_texture_or_fallback(path, *is_normal_map, device, queue)),
    )
    .await
}

/// Builds a cube map from six face images ordered +X, -X, +Y, -Y, +Z, -Z
/// (right, left, top, bottom, front, back).
///
/// Faces that fail to load are logged and left black. A cube the device
/// cannot hold is logged and replaced by [`Texture::create_black_cube`].
pub async fn load_cube_texture(
    faces: &[PathBuf],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    let images = futures::future::join_all(faces.iter().map(|path| async move {
        match load_image(path).await {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                log::error!("Failed to load skybox texture: {}", path.display());
                log::debug!("{e:#}");
                None
            }
        }
    }))
    .await;
    match Texture::from_cube_faces(device, queue, images, "skybox texture") {
        Ok(texture) => texture,
        Err(e) => {
            log::error!("Failed to create skybox texture: {e:#}");
            Texture::create_black_cube(device, queue, "skybox texture")
        }
    }
}
