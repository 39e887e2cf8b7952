//! Asset loading for Wavefront OBJ models.
//! OBJ geometry + MTL materials + textures, assembled into a sorted, bounded,
//! batch-ready `Model` and cached per rendering context.

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod mtl;
pub mod obj;
pub mod resource;
pub mod texture;

pub use cache::{ContextId, ModelCache, ModelKey};
pub use config::LoadOptions;
pub use error::{AssetError, AssetResult};
pub use loader::{Loader, load_model};
pub use model::Model;
pub use resource::ResourceLocator;
