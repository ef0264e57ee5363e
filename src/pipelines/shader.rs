//! Shader program compilation.
//!
//! WGSL is compiled and pipelines are created inside wgpu validation error
//! scopes so that a broken shader surfaces as a [`ShaderError`] instead of an
//! uncaptured device error.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("could not read shader {path}: {source}")]
    Source {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("shader {label} failed to compile:\n{message}")]
    Compile { label: String, message: String },

    #[error("program {label} failed to link:\n{message}")]
    Link { label: String, message: String },
}

/// Reads and compiles the WGSL file at `path`.
pub async fn load_program(
    device: &wgpu::Device,
    path: &Path,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ShaderError::Source {
            path: path.to_path_buf(),
            source,
        })?;
    compile_program(device, &path.display().to_string(), &source).await
}

/// Compiles WGSL `source`, labelling the module with `label`.
pub async fn compile_program(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match device.pop_error_scope().await {
        None => Ok(module),
        Some(error) => {
            log::error!("ERROR COMPILING SHADER {label}\n{error}");
            Err(ShaderError::Compile {
                label: label.to_string(),
                message: error.to_string(),
            })
        }
    }
}

/// Runs `build` and reports any validation error it raised as a link failure.
pub async fn link_program<F>(
    device: &wgpu::Device,
    label: &str,
    build: F,
) -> Result<wgpu::RenderPipeline, ShaderError>
where
    F: FnOnce(&wgpu::Device) -> wgpu::RenderPipeline,
{
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = build(device);
    match device.pop_error_scope().await {
        None => Ok(pipeline),
        Some(error) => {
            log::error!("ERROR LINKING PROGRAM {label}\n{error}");
            Err(ShaderError::Link {
                label: label.to_string(),
                message: error.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_failing_program() {
        let err = ShaderError::Compile {
            label: "terrain".into(),
            message: "unknown identifier".into(),
        };
        assert_eq!(err.to_string(), "shader terrain failed to compile:\nunknown identifier");

        let err = ShaderError::Source {
            path: PathBuf::from("shaders/missing.wgsl"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("could not read shader shaders/missing.wgsl"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
