//! Application configuration.
//!
//! Every executable starts from one of the [`AppConfig`] presets. They carry the
//! window setup, the initial camera, the light and the clear colour, i.e. all
//! the values the render loop needs before any flow has been built.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Environment variable that overrides the asset root.
pub const ASSET_DIR_ENV: &str = "RENDER_ASSETS_DIR";

const DEFAULT_ASSET_DIR: &str = "assets";

/// Root directory that shaders, textures and models are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDir {
    root: PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reads [`ASSET_DIR_ENV`], falling back to `./assets`.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(ASSET_DIR_ENV))
    }

    pub fn from_env_value(value: Option<OsString>) -> Self {
        match value {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(Path::new(".").join(DEFAULT_ASSET_DIR)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `relative` onto the asset root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

impl Default for AssetDir {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Fly-camera tuning. `speed` is in world units per second, `sensitivity`
/// in degrees per pixel of mouse motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub speed: f32,
    pub sensitivity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// `None` keeps the camera fixed.
    pub controller: Option<ControllerConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_colour: wgpu::Color,
    pub camera: CameraConfig,
    /// Light position for point-lit scenes, light direction for the others.
    pub light: [f32; 3],
    pub capture_cursor: bool,
    pub assets: AssetDir,
}

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

// 0.8 and 0.2 units per frame at 60 frames per second.
const TERRAIN_MOVE_SPEED: f32 = 48.0;
const MODEL_MOVE_SPEED: f32 = 12.0;
const MOUSE_SENSITIVITY: f32 = 0.1;

fn directional_light() -> [f32; 3] {
    let l = 1.0 / 3.0f32.sqrt();
    [-l, -l, -l]
}

impl AppConfig {
    pub fn rotating_box() -> Self {
        Self {
            title: "Rotating Box".to_string(),
            width: WIDTH,
            height: HEIGHT,
            clear_colour: wgpu::Color::BLACK,
            camera: CameraConfig {
                position: [0.0, 2.5, -5.0],
                target: [0.0, 0.0, 0.0],
                fovy_degrees: 15.0,
                znear: 0.1,
                zfar: 100.0,
                controller: None,
            },
            light: [-6.0, 10.5, 0.0],
            capture_cursor: false,
            assets: AssetDir::from_env(),
        }
    }

    pub fn terrain() -> Self {
        Self {
            title: "Terrain".to_string(),
            width: WIDTH,
            height: HEIGHT,
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.2,
                a: 1.0,
            },
            camera: CameraConfig {
                position: [60.0, 60.0, 60.0],
                // yaw -90°, pitch 0°
                target: [60.0, 60.0, 59.0],
                fovy_degrees: 45.0,
                znear: 0.1,
                zfar: 5000.0,
                controller: Some(ControllerConfig {
                    speed: TERRAIN_MOVE_SPEED,
                    sensitivity: MOUSE_SENSITIVITY,
                }),
            },
            light: directional_light(),
            capture_cursor: true,
            assets: AssetDir::from_env(),
        }
    }

    pub fn model_normals() -> Self {
        Self {
            title: "Model Normals".to_string(),
            clear_colour: wgpu::Color::BLACK,
            camera: CameraConfig {
                position: [0.0, 0.0, 15.0],
                target: [0.0, 0.0, 14.0],
                controller: Some(ControllerConfig {
                    speed: MODEL_MOVE_SPEED,
                    sensitivity: MOUSE_SENSITIVITY,
                }),
                ..Self::terrain().camera
            },
            ..Self::terrain()
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
