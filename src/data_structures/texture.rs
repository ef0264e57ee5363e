//! [`Texture`] wraps a wgpu texture with its view and sampler. Besides image
//! uploads with a full mip chain it creates depth buffers, 1x1 placeholders
//! and cube maps.

use anyhow::*;
use image::{ImageFormat, RgbaImage, imageops::FilterType, load_from_memory_with_format};

/// A GPU texture with its view and sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment matching a surface of `size` pixels. Zero sizes are
    /// bumped to one.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 texture of a single colour.
    ///
    /// Stands in for textures that failed to load so that bind groups and
    /// pipelines never have to change shape.
    pub fn create_solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        is_normal_map: bool,
        label: &str,
    ) -> Texture {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::upload_rgba(device, queue, &image, Some(label), is_normal_map)
    }

    /// The blue/purple-ish colour that represents "no deformation" in a normal map.
    pub fn create_default_normal_map(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
        Self::create_solid(device, queue, [127, 127, 255, 255], true, "default normal map")
    }

    /// Decodes an encoded image file and uploads it.
    ///
    /// * `format` is an optional file extension hint (e.g. "png"). If `None`, auto-detect.
    /// * `is_normal_map` toggles between sRGB (false) and linear (true) colour space
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        };
        Self::from_image(device, queue, &img, Some(label), is_normal_map)
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        Self::from_rgba(device, queue, &img.to_rgba8(), label, is_normal_map)
    }

    /// Uploads `rgba` together with its full mip chain.
    ///
    /// Fails without touching the device when the image is empty or larger
    /// than the device allows.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let (width, height) = rgba.dimensions();
        check_texture_size(width, height, 1, &device.limits())
            .with_context(|| format!("cannot upload {}", label.unwrap_or("texture")))?;
        Ok(Self::upload_rgba(device, queue, rgba, label, is_normal_map))
    }

    fn upload_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Self {
        let dimensions = rgba.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if is_normal_map {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        let levels = mip_chain(rgba);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            let (width, height) = level.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                level,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(device);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Builds a cube map from six faces ordered +X, -X, +Y, -Y, +Z, -Z.
    ///
    /// Missing faces are filled with black, see [`assemble_cube_faces`].
    pub fn from_cube_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: Vec<Option<RgbaImage>>,
        label: &str,
    ) -> Result<Self> {
        let (face_size, data) = assemble_cube_faces(faces);
        check_texture_size(face_size, face_size, 6, &device.limits())
            .with_context(|| format!("cannot upload {label}"))?;
        Ok(Self::upload_cube(device, queue, face_size, &data, label))
    }

    /// A cube map with one black pixel per face.
    pub fn create_black_cube(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Self {
        let (face_size, data) = assemble_cube_faces(Vec::new());
        Self::upload_cube(device, queue, face_size, &data, label)
    }

    fn upload_cube(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        face_size: u32,
        data: &[u8],
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: face_size,
            height: face_size,
            depth_or_array_layers: 6,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * face_size),
                rows_per_image: Some(face_size),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Fails when a `width` x `height` texture with `layers` array layers cannot
/// be created under `limits`.
pub fn check_texture_size(width: u32, height: u32, layers: u32, limits: &wgpu::Limits) -> Result<()> {
    ensure!(width > 0 && height > 0, "texture of {width}x{height} is empty");
    let max = limits.max_texture_dimension_2d;
    ensure!(
        width <= max && height <= max,
        "texture of {width}x{height} exceeds the device limit of {max}"
    );
    ensure!(
        layers <= limits.max_texture_array_layers,
        "{layers} texture layers exceed the device limit of {}",
        limits.max_texture_array_layers
    );
    Ok(())
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// The image followed by successively halved copies, ending at 1x1.
pub fn mip_chain(base: &RgbaImage) -> Vec<RgbaImage> {
    let (width, height) = base.dimensions();
    let count = mip_level_count(width, height);
    let mut levels = Vec::with_capacity(count as usize);
    levels.push(base.clone());
    for level in 1..count {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        let previous = &levels[level as usize - 1];
        levels.push(image::imageops::resize(previous, w, h, FilterType::Triangle));
    }
    levels
}

/// Packs six cube faces into one tightly packed RGBA buffer.
///
/// The face size is taken from the first face that is present; faces of a
/// different size are resized to it and missing faces are opaque black.
/// Returns the face edge length and the packed bytes.
pub fn assemble_cube_faces(faces: Vec<Option<RgbaImage>>) -> (u32, Vec<u8>) {
    let size = faces
        .iter()
        .flatten()
        .next()
        .map(|face| face.width().max(face.height()))
        .unwrap_or(1);
    let black = RgbaImage::from_pixel(size, size, image::Rgba([0, 0, 0, 255]));

    let mut data = Vec::with_capacity(size as usize * size as usize * 4 * 6);
    for face in faces.into_iter().chain(std::iter::repeat(None)).take(6) {
        let face = match face {
            Some(face) if face.dimensions() == (size, size) => face,
            Some(face) => {
                log::warn!(
                    "Skybox face is {}x{}, resizing to {size}x{size}",
                    face.width(),
                    face.height()
                );
                image::imageops::resize(&face, size, size, FilterType::Triangle)
            }
            None => black.clone(),
        };
        data.extend_from_slice(face.as_raw());
    }
    (size, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_covers_largest_dimension() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 1), 2);
        assert_eq!(mip_level_count(256, 64), 9);
        assert_eq!(mip_level_count(300, 20), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let base = RgbaImage::from_pixel(8, 2, image::Rgba([200, 100, 50, 255]));
        let chain = mip_chain(&base);
        let sizes: Vec<_> = chain.iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        // A flat colour stays flat through filtering.
        assert_eq!(chain[3].get_pixel(0, 0), &image::Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn cube_faces_are_packed_in_order_with_black_gaps() {
        let red = RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let faces = vec![Some(red.clone()), None, Some(red), None, None, None];
        let (size, data) = assemble_cube_faces(faces);
        assert_eq!(size, 2);
        assert_eq!(data.len(), 2 * 2 * 4 * 6);
        let face_bytes = 2 * 2 * 4;
        assert_eq!(&data[0..4], &[255, 0, 0, 255]);
        assert_eq!(&data[face_bytes..face_bytes + 4], &[0, 0, 0, 255]);
        assert_eq!(&data[2 * face_bytes..2 * face_bytes + 4], &[255, 0, 0, 255]);
    }

    #[test]
    fn cube_faces_are_resized_to_the_first_present_face() {
        let small = RgbaImage::from_pixel(4, 4, image::Rgba([0, 255, 0, 255]));
        let large = RgbaImage::from_pixel(16, 16, image::Rgba([0, 0, 255, 255]));
        let (size, data) = assemble_cube_faces(vec![None, Some(small), Some(large)]);
        assert_eq!(size, 4);
        assert_eq!(data.len(), 4 * 4 * 4 * 6);
    }

    #[test]
    fn texture_sizes_are_checked_against_the_limits() {
        let limits = wgpu::Limits::default();
        let max = limits.max_texture_dimension_2d;
        assert!(check_texture_size(1, 1, 1, &limits).is_ok());
        assert!(check_texture_size(max, max, 6, &limits).is_ok());

        let err = check_texture_size(max + 1, 1, 1, &limits).unwrap_err();
        assert!(err.to_string().contains("exceeds the device limit"), "{err}");
        assert!(check_texture_size(1, max + 1, 1, &limits).is_err());
        assert!(check_texture_size(0, 4, 1, &limits).is_err());
        assert!(check_texture_size(4, 4, limits.max_texture_array_layers + 1, &limits).is_err());
    }

    #[test]
    fn cube_without_any_face_is_a_black_pixel_per_side() {
        let (size, data) = assemble_cube_faces(Vec::new());
        assert_eq!(size, 1);
        assert_eq!(data, [0, 0, 0, 255].repeat(6));
    }
}
