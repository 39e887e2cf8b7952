//! Loader session: options, resource lookup and the model cache in one place.

use std::sync::Arc;

use crate::{
    cache::{ContextId, ModelCache, ModelKey},
    config::LoadOptions,
    error::{AssetError, AssetResult},
    model::Model,
    mtl::MaterialLibrary,
    obj::parse_obj,
    resource::{ResourceLocator, normalize_source, split_source},
    texture::TextureCache,
};

/// Owns everything a load needs. Share it (`&Loader`) between threads; the
/// model cache does its own locking.
#[derive(Debug, Default)]
pub struct Loader {
    options: LoadOptions,
    locator: ResourceLocator,
    models: ModelCache,
}

impl Loader {
    pub fn new(options: LoadOptions, locator: ResourceLocator) -> Self {
        Self {
            options,
            locator,
            models: ModelCache::new(),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    /// Run the full pipeline without touching the cache.
    pub fn load(&self, source: &str) -> AssetResult<Model> {
        load_model(&self.locator, source, &self.options)
    }

    /// Cached load for one rendering context.
    pub fn get_or_load(&self, source: &str, context: ContextId) -> AssetResult<Arc<Model>> {
        let source = normalize_source(source);
        let key = ModelKey::new(source.clone(), context);
        self.models.get_or_load_with(key, || self.load(&source))
    }
}

/// Parse `source`, load its material libraries, then assemble, sort, bound and
/// batch the result.
pub fn load_model(
    locator: &ResourceLocator,
    source: &str,
    options: &LoadOptions,
) -> AssetResult<Model> {
    let (base, name) = split_source(source);
    log::info!("Loading model {}", source);

    let obj = {
        let reader = locator.open(&base, &name)?;
        parse_obj(reader, source)?
    };

    let mut library = MaterialLibrary::new();
    for lib in &obj.libraries {
        let reader = match locator.open(&base, &lib.name) {
            Ok(reader) => reader,
            Err(AssetError::Io { path, source: e }) => {
                log::warn!(
                    "{}:{}: could not open material library {} ({}); its materials are undefined",
                    source,
                    lib.line,
                    path,
                    e
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        library.merge(MaterialLibrary::load_from(reader, locator, &base, &lib.name)?);
    }

    let textures = TextureCache::new(locator, &base);
    let model = Model::build(source, obj, &library, textures, options)?;
    log::info!(
        "Loaded {}: {} vertices, {} polygons, {} textures, size {:.3}x{:.3}x{:.3}",
        source,
        model.vertices().len(),
        model.polygon_count(),
        model.textures().len(),
        model.width(),
        model.height(),
        model.depth()
    );
    Ok(model)
}
