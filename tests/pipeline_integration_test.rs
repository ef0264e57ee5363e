//! Builds every program on a headless adapter. Needs a GPU (or a software
//! adapter) and the `integration-tests` feature.
#![cfg(feature = "integration-tests")]

use std::path::PathBuf;

use render_assignments::{
    config::AssetDir,
    context::InitContext,
    data_structures::{skybox::SKYBOX_FACES, texture::Texture},
    flows::{ModelFlow, ModelSettings, TerrainFlow, TerrainSettings},
    pipelines::{
        layouts, model::ModelPipeline, normals::NormalsPipeline, shader, skybox::SkyboxPipeline,
        terrain::TerrainPipeline, textured::TexturedBoxPipeline,
    },
    resources::{
        self,
        texture::{load_cube_texture, load_texture_or_fallback},
    },
};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

async fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = match instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
    {
        Ok(adapter) => adapter,
        Err(e) => {
            eprintln!("skipping, no adapter: {e}");
            return None;
        }
    };
    adapter.request_device(&wgpu::DeviceDescriptor::default()).await.ok()
}

fn assets() -> AssetDir {
    AssetDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
}

fn scene_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    layouts::uniform_layout(
        device,
        "scene_bind_group_layout",
        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
    )
}

fn init_context(device: &wgpu::Device, queue: &wgpu::Queue) -> InitContext {
    InitContext {
        device: device.clone(),
        queue: queue.clone(),
        format: FORMAT,
        scene_layout: scene_layout(device),
        assets: assets(),
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("render-assignments-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Wider than `Limits::default().max_texture_dimension_2d`.
fn write_too_wide_png(path: &std::path::Path) {
    let width = wgpu::Limits::default().max_texture_dimension_2d + 808;
    image::RgbaImage::from_pixel(width, 1, image::Rgba([90, 90, 90, 255]))
        .save(path)
        .unwrap();
}

#[tokio::test]
async fn every_program_compiles_and_links() {
    let Some((device, _queue)) = device().await else {
        return;
    };
    let scene = scene_layout(&device);
    let assets = assets();

    TexturedBoxPipeline::new(&device, FORMAT, &scene, &assets).await.unwrap();
    SkyboxPipeline::new(&device, FORMAT, &scene, &assets).await.unwrap();
    TerrainPipeline::new(&device, FORMAT, &scene, &assets).await.unwrap();
    ModelPipeline::new(&device, FORMAT, &scene, &assets).await.unwrap();
    NormalsPipeline::new(&device, FORMAT, &scene, &assets).await.unwrap();
}

#[tokio::test]
async fn broken_wgsl_is_a_compile_error() {
    let Some((device, _queue)) = device().await else {
        return;
    };
    let err = shader::compile_program(&device, "broken", "@vertex fn vs_main( -> {")
        .await
        .unwrap_err();
    assert!(matches!(err, shader::ShaderError::Compile { .. }));

    let err = shader::load_program(&device, &assets().resolve("shaders/missing.wgsl"))
        .await
        .unwrap_err();
    assert!(matches!(err, shader::ShaderError::Source { .. }));
}

#[tokio::test]
async fn missing_skybox_faces_still_give_a_cube_map() {
    let Some((device, queue)) = device().await else {
        return;
    };
    let faces: Vec<PathBuf> = SKYBOX_FACES
        .iter()
        .map(|face| PathBuf::from("/nonexistent").join(face))
        .collect();
    let cube = load_cube_texture(&faces, &device, &queue).await;
    assert_eq!(cube.texture.depth_or_array_layers(), 6);
    assert_eq!(cube.texture.width(), 1);
}

#[tokio::test]
async fn model_without_textures_gets_placeholder_materials() {
    let Some((device, queue)) = device().await else {
        return;
    };
    let dir = std::env::temp_dir().join(format!("render-assignments-gpu-obj-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("triangle.obj");
    tokio::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").await.unwrap();

    let layout = layouts::diffuse_normal_layout(&device);
    let loaded = resources::load_model_obj(&path, &device, &queue, &layout).await.unwrap();
    assert_eq!(loaded.model.meshes.len(), 1);
    assert_eq!(loaded.model.materials.len(), 1);
    assert_eq!(loaded.model.meshes[0].material, 0);
    assert_eq!(loaded.model.meshes[0].num_elements, 3);
    assert_eq!(loaded.geometry[0].spikes().len(), 3);

    let solid = Texture::create_solid(&device, &queue, [255, 0, 0, 255], false, "red");
    assert_eq!(solid.texture.width(), 1);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn unreadable_textures_fall_back_to_one_pixel() {
    let Some((device, queue)) = device().await else {
        return;
    };
    let dir = temp_dir("fallback-textures");
    let corrupt = dir.join("corrupt.png");
    std::fs::write(&corrupt, b"not a png").unwrap();

    let colour = load_texture_or_fallback(&dir.join("missing.png"), false, &device, &queue).await;
    assert_eq!((colour.texture.width(), colour.texture.height()), (1, 1));
    assert_eq!(colour.texture.format(), wgpu::TextureFormat::Rgba8UnormSrgb);

    let normal = load_texture_or_fallback(&corrupt, true, &device, &queue).await;
    assert_eq!((normal.texture.width(), normal.texture.height()), (1, 1));
    assert_eq!(normal.texture.format(), wgpu::TextureFormat::Rgba8Unorm);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn textures_beyond_the_device_limit_fall_back() {
    let Some((device, queue)) = device().await else {
        return;
    };
    let dir = temp_dir("wide-texture");
    let wide = dir.join("wide.png");
    write_too_wide_png(&wide);

    let texture = load_texture_or_fallback(&wide, false, &device, &queue).await;
    assert_eq!((texture.texture.width(), texture.texture.height()), (1, 1));

    let image = image::open(&wide).unwrap();
    assert!(Texture::from_image(&device, &queue, &image, Some("wide"), false).is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn missing_heightmap_leaves_the_terrain_empty() {
    let Some((device, queue)) = device().await else {
        return;
    };
    let ctx = init_context(&device, &queue);
    let settings = TerrainSettings {
        heightmap: "/nonexistent/heightMap.png".into(),
        ..Default::default()
    };
    let flow = TerrainFlow::new(&ctx, settings).await.unwrap();
    assert!(!flow.has_terrain());
}

#[tokio::test]
async fn oversized_heightmap_leaves_the_terrain_empty() {
    let Some((device, queue)) = device().await else {
        return;
    };
    let dir = temp_dir("wide-heightmap");
    let heightmap = dir.join("heightMap.png");
    write_too_wide_png(&heightmap);

    let ctx = init_context(&device, &queue);
    let settings = TerrainSettings {
        heightmap,
        ..Default::default()
    };
    let flow = TerrainFlow::new(&ctx, settings).await.unwrap();
    assert!(!flow.has_terrain());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn missing_model_leaves_the_flow_empty() {
    let Some((device, queue)) = device().await else {
        return;
    };
    let ctx = init_context(&device, &queue);
    let settings = ModelSettings {
        path: "/nonexistent/backpack.obj".into(),
        ..ModelSettings::normals_scene()
    };
    let flow = ModelFlow::new(&ctx, settings).await.unwrap();
    assert!(!flow.has_model());
}
