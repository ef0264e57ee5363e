//! Loading of textures, models and other files from the asset directory.

use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::data_structures::{
    model::{self, Material},
    texture::Texture,
};

pub mod mesh;
pub mod texture;

pub use mesh::MeshGeometry;

pub async fn load_string(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))
}

pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))
}

/// A model on the GPU together with the CPU geometry it was built from.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: model::Model,
    pub geometry: Vec<MeshGeometry>,
}

/// Parses OBJ source. Material files are looked up relative to `base_dir`.
///
/// A missing or broken material library is logged and results in no
/// materials rather than an error.
pub async fn parse_obj(
    obj_text: &str,
    base_dir: &Path,
) -> anyhow::Result<(Vec<tobj::Model>, Vec<tobj::Material>)> {
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    // Still the only loader that takes an async material callback.
    #[allow(deprecated)]
    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            let mtl_path = base_dir.join(&p);
            match load_string(&mtl_path).await {
                Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                Err(e) => {
                    log::error!("Material library not found: {}", mtl_path.display());
                    log::debug!("{e:#}");
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .await?;

    let materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("Materials could not be loaded ({e}), using placeholders");
        Vec::new()
    });
    Ok((models, materials))
}

/// Normal map path of a material. Exporters disagree on the key, so the
/// common spellings tobj leaves unparsed are checked as well.
pub fn normal_texture_name(material: &tobj::Material) -> Option<&str> {
    material.normal_texture.as_deref().or_else(|| {
        ["map_Bump", "map_bump", "bump", "norm"]
            .iter()
            .find_map(|key| material.unknown_param.get(*key))
            // Options such as `-bm 1.0` precede the file name.
            .and_then(|value| value.split_whitespace().last())
    })
}

/// Grey stand-in for meshes without a usable material.
fn placeholder_colour(material: Option<&tobj::Material>) -> [u8; 4] {
    let [r, g, b] = material.and_then(|m| m.diffuse).unwrap_or([0.8, 0.8, 0.8]);
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [to_byte(r), to_byte(g), to_byte(b), 255]
}

async fn load_material(
    m: &tobj::Material,
    base_dir: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> Material {
    let diffuse_texture = match &m.diffuse_texture {
        Some(file) => texture::load_texture_or_fallback(&base_dir.join(file), false, device, queue).await,
        None => {
            log::warn!("Material {} references no diffuse texture", m.name);
            Texture::create_solid(device, queue, placeholder_colour(Some(m)), false, &m.name)
        }
    };
    // We rather use a default normal map when none is passed instead of changing the pipeline
    let normal_texture = match normal_texture_name(m) {
        Some(file) => texture::load_texture_or_fallback(&base_dir.join(file), true, device, queue).await,
        None => Texture::create_default_normal_map(device, queue),
    };
    Material::new(device, &m.name, diffuse_texture, normal_texture, layout)
}

/// Loads an OBJ model with its materials.
///
/// Material and texture paths are resolved relative to the OBJ file. Meshes
/// without a valid material share one placeholder material.
pub async fn load_model_obj(
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<LoadedModel> {
    let obj_text = load_string(path).await?;
    let base_dir: PathBuf = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let (models, obj_materials) = parse_obj(&obj_text, &base_dir)
        .await
        .with_context(|| format!("could not parse {}", path.display()))?;

    let mut materials: Vec<Material> = futures::future::join_all(
        obj_materials
            .iter()
            .map(|m| load_material(m, &base_dir, device, queue, layout)),
    )
    .await;

    let geometry: Vec<MeshGeometry> = models.iter().map(mesh::mesh_geometry).collect();

    let mut placeholder = None;
    let meshes = geometry
        .iter()
        .map(|g| {
            let material = match g.material {
                Some(id) if id < materials.len() => id,
                _ => *placeholder.get_or_insert_with(|| {
                    log::warn!("Mesh {} has no material, using a placeholder", g.name);
                    let diffuse = Texture::create_solid(
                        device,
                        queue,
                        placeholder_colour(None),
                        false,
                        "placeholder material",
                    );
                    let normal = Texture::create_default_normal_map(device, queue);
                    materials.push(Material::new(device, "placeholder", diffuse, normal, layout));
                    materials.len() - 1
                }),
            };
            mesh::upload_mesh(device, g, material)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    log::info!(
        "Loaded {} with {} meshes and {} materials",
        path.display(),
        geometry.len(),
        materials.len()
    );

    Ok(LoadedModel {
        model: model::Model { meshes, materials },
        geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(name: &str) -> tobj::Material {
        tobj::Material {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn normal_maps_are_found_under_common_keys() {
        let mut m = material("a");
        assert_eq!(normal_texture_name(&m), None);

        m.unknown_param.insert("map_Bump".into(), "-bm 0.5 normal.png".into());
        assert_eq!(normal_texture_name(&m), Some("normal.png"));

        m.normal_texture = Some("explicit.png".into());
        assert_eq!(normal_texture_name(&m), Some("explicit.png"));
    }

    #[test]
    fn placeholder_uses_the_diffuse_colour() {
        let mut m = material("red");
        m.diffuse = Some([1.0, 0.0, 0.5]);
        assert_eq!(placeholder_colour(Some(&m)), [255, 0, 128, 255]);
        assert_eq!(placeholder_colour(None), [204, 204, 204, 255]);
    }

    #[tokio::test]
    async fn obj_without_material_library_still_parses() {
        let obj = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";
        let (models, materials) = parse_obj(obj, Path::new(".")).await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].mesh.indices, vec![0, 1, 2]);
        assert!(materials.is_empty());
    }

    #[tokio::test]
    async fn missing_material_library_is_not_fatal() {
        let obj = "mtllib nowhere.mtl\no tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl gone\nf 1 2 3\n";
        let dir = std::env::temp_dir().join("render-assignments-no-mtl");
        let (models, materials) = parse_obj(obj, &dir).await.unwrap();
        assert_eq!(models.len(), 1);
        assert!(materials.is_empty());
    }

    #[tokio::test]
    async fn quads_are_triangulated() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let (models, _) = parse_obj(obj, Path::new(".")).await.unwrap();
        assert_eq!(models[0].mesh.indices.len(), 6);
    }
}
