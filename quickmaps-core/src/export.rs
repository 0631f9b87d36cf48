//! Map export: every material of the selected objects gets its own folder
//! with one file per classified texture, or one packed MRAO image when the
//! config asks for packing.

use crate::classify::{classify, MapType};
use crate::config::{fallback_dirs, resolve_dir, ExportConfig, EXPORT_FALLBACK_DIR};
use crate::material::Material;
use crate::naming::{map_filename, material_dir_name, packed_filename};
use crate::packing::MraoSources;
use crate::report::{ExportReport, ExportedFile};
use crate::scene::{Scene, Selection};
use crate::sink::ImageSink;
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Create the top-level export folder, falling back to the given
/// alternatives in order. Returns the folder used and, when a fallback was
/// taken, the one that was requested.
///
/// Fails with the first error only when every alternative fails too.
pub fn prepare_export_dir(
    sink: &mut dyn ImageSink,
    requested: &Path,
    fallbacks: &[PathBuf],
) -> Result<(PathBuf, Option<PathBuf>)> {
    let err = match sink.create_dir_all(requested) {
        Ok(()) => return Ok((requested.to_path_buf(), None)),
        Err(e) => e,
    };
    tracing::warn!(path = %requested.display(), error = %err, "cannot create export folder");

    for fallback in fallbacks {
        match sink.create_dir_all(fallback) {
            Ok(()) => {
                tracing::warn!(path = %fallback.display(), "exporting to fallback folder");
                return Ok((fallback.clone(), Some(requested.to_path_buf())));
            }
            Err(e) => {
                tracing::warn!(path = %fallback.display(), error = %e, "fallback folder failed");
            }
        }
    }
    Err(err)
}

/// Export the texture maps of every material on the selected objects.
///
/// Returns `Err` only when no export folder at all could be created; every
/// other failure is recorded in the report and the run continues.
pub fn export_maps(
    scene: &Scene,
    selection: &Selection,
    config: &ExportConfig,
    sink: &mut dyn ImageSink,
) -> Result<ExportReport> {
    let project_dir = scene.project_dir.as_deref();
    let requested = resolve_dir(&config.directory, project_dir);
    let fallbacks = fallback_dirs(project_dir, EXPORT_FALLBACK_DIR);
    let (export_dir, fallback_from) = prepare_export_dir(sink, &requested, &fallbacks)?;

    let mut report = ExportReport::new(export_dir.clone());
    report.fallback_from = fallback_from;

    let (objects, missing) = scene.select_objects(selection);
    for name in missing {
        report.warn(format!("Object \"{}\" not found in scene", name));
    }

    let mut exported_materials: HashSet<&str> = HashSet::new();
    for obj in &objects {
        for slot in &obj.material_slots {
            let Some(material) = scene.material(slot) else {
                report.warn(format!(
                    "Object \"{}\" has an empty or unknown material slot \"{}\"",
                    obj.name, slot
                ));
                continue;
            };
            if !material.use_nodes {
                debug!(material = %material.name, "skipping material without nodes");
                continue;
            }
            if !exported_materials.insert(material.name.as_str()) {
                continue;
            }
            report.materials_processed += 1;
            export_material(material, &export_dir, config, sink, &mut report);
        }
    }

    info!("{}", report.summary());
    Ok(report)
}

fn export_material(
    material: &Material,
    export_dir: &Path,
    config: &ExportConfig,
    sink: &mut dyn ImageSink,
    report: &mut ExportReport,
) {
    let mat_dir = export_dir.join(material_dir_name(&material.name));
    if let Err(e) = sink.create_dir_all(&mat_dir) {
        report.record_failure(&material.name, &e);
        return;
    }

    if config.packed {
        export_packed(material, &mat_dir, config, sink, report);
        return;
    }

    let mut seen_images: HashSet<&str> = HashSet::new();
    for texture in &material.textures {
        if !seen_images.insert(texture.image_name()) {
            debug!(image = texture.image_name(), "image already exported for this material");
            continue;
        }
        let map = classify(texture);
        let filename = map_filename(
            &config.prefix,
            &material.name,
            map,
            texture.image_name(),
            &config.suffix,
            config.format,
        );
        let path = mat_dir.join(filename);
        match sink.write(&path, texture.pixels(), config.format) {
            Ok(()) => {
                info!(map = %map, path = %path.display(), "exported");
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

fn export_packed(
    material: &Material,
    mat_dir: &Path,
    config: &ExportConfig,
    sink: &mut dyn ImageSink,
    report: &mut ExportReport,
) {
    let sources = MraoSources::select(&material.textures);
    let packed = match sources.pack() {
        Ok(buffer) => buffer,
        Err(e) => {
            report.record_failure(&material.name, &Error::from(e));
            return;
        }
    };

    let filename = packed_filename(&config.prefix, &material.name, &config.suffix, config.format);
    let path = mat_dir.join(filename);
    match sink.write(&path, &packed, config.format) {
        Ok(()) => {
            info!(path = %path.display(), "exported packed MRAO");
            let images = [sources.metallic, sources.roughness, sources.ao]
                .into_iter()
                .flatten()
                .map(|t| t.image_name().to_string())
                .collect();
            report.exported.push(ExportedFile {
                material: material.name.clone(),
                map_type: None,
                images,
                path,
            });
        }
        Err(e) => report.record_failure(&material.name, &e),
    }
}

/// Map types that would be exported for `material`, in node order, without
/// writing anything.
pub fn classify_material(material: &Material) -> Vec<(&str, MapType)> {
    material
        .textures
        .iter()
        .map(|t| (t.image_name(), classify(t)))
        .collect()
}
