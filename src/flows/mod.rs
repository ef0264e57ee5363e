//! The drawables the programs are assembled from.
//!
//! Each submodule has a flow type, a settings struct whose `Default` carries
//! the assignment's constants and a function turning those settings into a
//! [`FlowConstructor`](crate::flow::FlowConstructor).

pub mod model;
pub mod rotating_box;
pub mod skybox;
pub mod terrain;

pub use model::{ModelFlow, ModelSettings, NormalsSettings};
pub use rotating_box::{BoxSettings, RotatingBoxFlow};
pub use skybox::{SkyboxFlow, SkyboxSettings};
pub use terrain::{TerrainFlow, TerrainSettings};
