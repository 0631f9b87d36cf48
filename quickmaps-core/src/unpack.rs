//! Embedded texture extraction.
//!
//! Writes every embedded image of the chosen materials to
//! `{dir}/{Material}/{Material}_{MapType}.{ext}`, numbering the file when
//! the name is already taken.

use crate::classify::classify;
use crate::config::{fallback_dirs, resolve_dir, UnpackConfig, UNPACK_FALLBACK_DIR};
use crate::export::prepare_export_dir;
use crate::material::Material;
use crate::naming::{ensure_unique_path, sanitize_filename};
use crate::report::{ExportReport, ExportedFile};
use crate::scene::{Scene, Selection};
use crate::sink::ImageSink;
use crate::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Materials to extract from: every scene material for [`Selection::All`],
/// otherwise the slot materials of the named objects.
fn materials_for<'a>(scene: &'a Scene, selection: &'a Selection) -> Result<Vec<&'a Material>> {
    match selection {
        Selection::All => Ok(scene.materials.iter().collect()),
        Selection::Objects(_) => {
            let (objects, missing) = scene.select_objects(selection);
            for name in missing {
                warn!(object = name, "object not found in scene");
            }
            let materials = scene.slot_materials(&objects);
            if materials.is_empty() {
                return Err(Error::Config(
                    "Selected objects have no valid material".to_string(),
                ));
            }
            Ok(materials)
        }
    }
}

/// Extract embedded textures. Configuration problems (no directory, nothing
/// selected, no usable folder) fail the call before anything is written;
/// everything after that is recorded in the report.
pub fn extract_embedded(
    scene: &Scene,
    selection: &Selection,
    config: &UnpackConfig,
    sink: &mut dyn ImageSink,
) -> Result<ExportReport> {
    if config.directory.trim().is_empty() {
        return Err(Error::Config("No export directory set".to_string()));
    }
    let materials = materials_for(scene, selection)?;

    let project_dir = scene.project_dir.as_deref();
    let requested = resolve_dir(&config.directory, project_dir);
    let fallbacks = fallback_dirs(project_dir, UNPACK_FALLBACK_DIR);
    let (export_dir, fallback_from) = prepare_export_dir(sink, &requested, &fallbacks)?;

    let mut report = ExportReport::new(export_dir.clone());
    report.fallback_from = fallback_from;

    // (material, map type, image) triples already written
    let mut exported_keys: HashSet<(String, String, String)> = HashSet::new();

    for material in materials {
        if !material.use_nodes {
            continue;
        }
        report.materials_processed += 1;

        let mat_clean = sanitize_filename(&material.name);
        let mat_dir = export_dir.join(&mat_clean);
        if let Err(e) = sink.create_dir_all(&mat_dir) {
            report.record_failure(&material.name, &e);
            continue;
        }

        for texture in material.embedded_textures() {
            let map = classify(texture);
            let map_clean = sanitize_filename(map.label());
            let key = (
                mat_clean.clone(),
                map_clean.clone(),
                texture.image_name().to_string(),
            );
            if exported_keys.contains(&key) {
                debug!(image = texture.image_name(), "already extracted");
                continue;
            }

            let filename = format!("{}_{}.{}", mat_clean, map_clean, config.format.extension());
            let path = ensure_unique_path(&mat_dir.join(filename), |p| sink.exists(p));

            match sink.write(&path, texture.pixels(), config.format) {
                Ok(()) => {
                    info!(image = texture.image_name(), path = %path.display(), "extracted");
                    exported_keys.insert(key);
                    report.exported.push(ExportedFile {
                        material: material.name.clone(),
                        map_type: Some(map),
                        images: vec![texture.image_name().to_string()],
                        path,
                    });
                }
                Err(e) => report.record_failure(texture.image_name(), &e),
            }
        }
    }

    if report.exported.is_empty() {
        report.warn("No embedded textures found to export");
    }
    info!("{}", report.summary());
    Ok(report)
}
