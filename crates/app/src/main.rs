//! Entry point: load OBJ models and report what a renderer would receive.
//! Usage: app [--centered] [--flip-v] [--context=N] <model.obj[.gz]>...

use anyhow::{Context, Result};
use asset::{ContextId, LoadOptions, Loader, Model, ResourceLocator};

fn has_flag(name: &str) -> bool {
    // --name[=on|off]
    for arg in std::env::args().skip(1) {
        if arg == name {
            return true;
        }
        if let Some(val) = arg.strip_prefix(name).and_then(|v| v.strip_prefix('=')) {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_context_arg() -> ContextId {
    for arg in std::env::args() {
        if let Some(v) = arg.strip_prefix("--context=") {
            match v.parse::<u64>() {
                Ok(id) => return ContextId(id),
                Err(_) => log::warn!("Invalid context id '{}', using 0.", v),
            }
        }
    }
    ContextId(0)
}

fn model_args() -> Vec<String> {
    std::env::args()
        .skip(1)
        .filter(|a| !a.starts_with("--"))
        .collect()
}

fn report(model: &Model) {
    let e = model.extents();
    log::info!(
        "{}: {} polygons, {} vertices, {} normals, {} texcoords",
        model.source(),
        model.polygon_count(),
        model.vertices().len(),
        model.normals().len(),
        model.texcoords().len()
    );
    log::info!(
        "  extents min={:?} max={:?} size={:.3}x{:.3}x{:.3} ground={:.3} max_dim={:.3}",
        e.min,
        e.max,
        model.width(),
        model.height(),
        model.depth(),
        model.ground(),
        model.max_dimension()
    );

    let batch = model.batch();
    log::info!(
        "  batch: {} vertices ({} bytes), {} indices, {} draw commands",
        batch.vertices.len(),
        batch.vertex_bytes().len(),
        batch.indices.len(),
        batch.commands.len()
    );
    for cmd in &batch.commands {
        log::debug!(
            "    {:?} first={} count={} material={} textured={} color={:?}",
            cmd.primitive,
            cmd.first_index,
            cmd.index_count,
            cmd.material.name,
            cmd.is_textured(),
            cmd.color
        );
    }
    let bbox = model.bounding_box();
    log::debug!("  proxy cube center={:?} size={:?}", bbox.center, bbox.size);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = LoadOptions::default()
        .with_centered(has_flag("--centered"))
        .with_flip_texture_vertically(has_flag("--flip-v"));
    let context = parse_context_arg();
    let sources = model_args();
    if sources.is_empty() {
        anyhow::bail!("usage: app [--centered] [--flip-v] [--context=N] <model.obj[.gz]>...");
    }
    log::info!("Options: {:?}, context={}", options, context.0);

    let loader = Loader::new(options, ResourceLocator::new());
    for source in &sources {
        let model = loader
            .get_or_load(source, context)
            .with_context(|| format!("Failed to load {}", source))?;
        report(&model);
    }

    log::info!("Loaded {} models. Bye!", loader.models().len());
    Ok(())
}
