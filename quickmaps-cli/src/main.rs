//! QuickMaps CLI: export, unpack and pack material texture maps

use clap::{Parser, Subcommand};
use quickmaps_core::sink::{DryRunSink, FsSink, ImageSink};
use quickmaps_core::{
    classify_material, export_maps, extract_embedded, pack_mrao, ConfigFile, ExportConfig,
    ExportPreset, ExportReport, ImageFormat, ImageLoader, MapType, Scene, Selection, TextureRef,
    UnpackConfig,
};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "quickmaps")]
#[command(about = "Export, unpack and channel-pack material texture maps.")]
#[command(version = concat!("v", env!("CARGO_PKG_VERSION")))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML). Defaults to ./quickmaps.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every texture map of the selected objects' materials
    Export {
        /// Scene manifest (.json or .toml)
        scene: PathBuf,
        /// default, unreal, unity or packed
        #[arg(long)]
        preset: Option<String>,
        /// Output directory; `//` is relative to the scene
        #[arg(long)]
        dir: Option<String>,
        /// png, jpeg, targa, bmp or tiff
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        suffix: Option<String>,
        /// Limit to these objects (repeatable)
        #[arg(long = "object", value_name = "NAME")]
        objects: Vec<String>,
        /// Print what would be written without touching the disk
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract embedded (packed) images into per-material folders
    Unpack {
        /// Scene manifest (.json or .toml)
        scene: PathBuf,
        #[arg(long)]
        dir: Option<String>,
        #[arg(long)]
        format: Option<String>,
        #[arg(long = "object", value_name = "NAME")]
        objects: Vec<String>,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the map type detected for every texture
    Classify {
        scene: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Pack metallic, roughness and AO images into one MRAO image
    Pack {
        #[arg(long)]
        metallic: Option<PathBuf>,
        #[arg(long)]
        roughness: Option<PathBuf>,
        #[arg(long)]
        ao: Option<PathBuf>,
        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
        /// Defaults to the output file's extension, else png
        #[arg(long)]
        format: Option<String>,
    },
    /// List export presets
    Presets {
        #[arg(long)]
        json: bool,
    },
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let file = ConfigFile::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            scene,
            preset,
            dir,
            format,
            prefix,
            suffix,
            objects,
            dry_run,
            json,
        } => {
            let overrides = ExportOverrides {
                preset,
                dir,
                format,
                prefix,
                suffix,
            };
            let config = export_config(&file, &overrides)?;
            let report = cmd_export(&scene, &config, selection(objects), dry_run)?;
            print_report(&report, json)?;
            exit_on_failures(&report);
            Ok(())
        }
        Commands::Unpack {
            scene,
            dir,
            format,
            objects,
            dry_run,
            json,
        } => {
            let config = unpack_config(&file, dir, format)?;
            let report = cmd_unpack(&scene, &config, selection(objects), dry_run)?;
            print_report(&report, json)?;
            exit_on_failures(&report);
            Ok(())
        }
        Commands::Classify { scene, json } => cmd_classify(&scene, json),
        Commands::Pack {
            metallic,
            roughness,
            ao,
            output,
            format,
        } => {
            let format = match format {
                Some(f) => f.parse()?,
                None => format_from_extension(&output),
            };
            let written = cmd_pack(
                metallic.as_deref(),
                roughness.as_deref(),
                ao.as_deref(),
                &output,
                format,
            )?;
            println!("✓ Packed MRAO written to {}", written.display());
            Ok(())
        }
        Commands::Presets { json } => cmd_presets(json),
    }
}

/// Export settings given on the command line
#[derive(Debug, Default)]
struct ExportOverrides {
    preset: Option<String>,
    dir: Option<String>,
    format: Option<String>,
    prefix: Option<String>,
    suffix: Option<String>,
}

/// Defaults, then the config file, then CLI flags. A CLI preset replaces
/// format/prefix/suffix from the file before the explicit flags apply.
fn export_config(file: &ConfigFile, overrides: &ExportOverrides) -> Result<ExportConfig, Box<dyn Error>> {
    let mut config = ExportConfig::default().merge_file(&file.export);
    if let Some(ref preset) = overrides.preset {
        config = config.with_preset(preset.parse()?);
    }
    if let Some(ref dir) = overrides.dir {
        config = config.with_directory(dir.as_str());
    }
    if let Some(ref format) = overrides.format {
        config = config.with_format(format.parse()?);
    }
    if let Some(ref prefix) = overrides.prefix {
        config = config.with_prefix(prefix.as_str());
    }
    if let Some(ref suffix) = overrides.suffix {
        config = config.with_suffix(suffix.as_str());
    }
    Ok(config)
}

fn unpack_config(
    file: &ConfigFile,
    dir: Option<String>,
    format: Option<String>,
) -> Result<UnpackConfig, Box<dyn Error>> {
    let mut config = UnpackConfig::default().merge_file(&file.unpack);
    if let Some(dir) = dir {
        config = config.with_directory(dir);
    }
    if let Some(format) = format {
        config = config.with_format(format.parse()?);
    }
    Ok(config)
}

fn selection(objects: Vec<String>) -> Selection {
    if objects.is_empty() {
        Selection::All
    } else {
        Selection::Objects(objects)
    }
}

fn format_from_extension(path: &Path) -> ImageFormat {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse().ok())
        .unwrap_or_default()
}

fn cmd_export(
    scene_path: &Path,
    config: &ExportConfig,
    selection: Selection,
    dry_run: bool,
) -> Result<ExportReport, Box<dyn Error>> {
    let scene = Scene::load(scene_path)?;
    run_driver(dry_run, |sink| export_maps(&scene, &selection, config, sink))
}

fn cmd_unpack(
    scene_path: &Path,
    config: &UnpackConfig,
    selection: Selection,
    dry_run: bool,
) -> Result<ExportReport, Box<dyn Error>> {
    let scene = Scene::load(scene_path)?;
    run_driver(dry_run, |sink| extract_embedded(&scene, &selection, config, sink))
}

/// Run a driver against the real filesystem, or a dry-run sink whose
/// planned writes are listed afterwards.
fn run_driver<F>(dry_run: bool, driver: F) -> Result<ExportReport, Box<dyn Error>>
where
    F: FnOnce(&mut dyn ImageSink) -> quickmaps_core::Result<ExportReport>,
{
    if dry_run {
        let mut dry = DryRunSink::new();
        let sink: &mut dyn ImageSink = &mut dry;
        let report = driver(sink)?;
        for write in &dry.writes {
            println!(
                "would write {} ({}x{} {})",
                write.path.display(),
                write.width,
                write.height,
                write.format
            );
        }
        Ok(report)
    } else {
        let mut fs = FsSink::new();
        let sink: &mut dyn ImageSink = &mut fs;
        Ok(driver(sink)?)
    }
}

fn print_report(report: &ExportReport, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.to_text());
    }
    Ok(())
}

fn exit_on_failures(report: &ExportReport) {
    if report.has_failures() {
        std::process::exit(1);
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRow {
    material: String,
    image: String,
    map_type: MapType,
}

fn classify_rows(scene: &Scene) -> Vec<ClassifyRow> {
    scene
        .materials
        .iter()
        .flat_map(|m| {
            classify_material(m)
                .into_iter()
                .map(move |(image, map_type)| ClassifyRow {
                    material: m.name.clone(),
                    image: image.to_string(),
                    map_type,
                })
        })
        .collect()
}

fn cmd_classify(scene_path: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let scene = Scene::load(scene_path)?;
    let rows = classify_rows(&scene);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in &rows {
        println!("{:<24} {:<32} {}", row.material, row.image, row.map_type);
    }
    Ok(())
}

/// Load the given map files and write the packed image. Missing inputs
/// pack as zero.
fn cmd_pack(
    metallic: Option<&Path>,
    roughness: Option<&Path>,
    ao: Option<&Path>,
    output: &Path,
    format: ImageFormat,
) -> Result<PathBuf, Box<dyn Error>> {
    let load = |path: Option<&Path>| -> Result<Option<TextureRef>, Box<dyn Error>> {
        match path {
            Some(p) => {
                let name = p
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Some(TextureRef::new(name, ImageLoader::load_pixels(p)?)))
            }
            None => Ok(None),
        }
    };
    let metallic = load(metallic)?;
    let roughness = load(roughness)?;
    let ao = load(ao)?;

    let packed = pack_mrao(metallic.as_ref(), roughness.as_ref(), ao.as_ref())?;

    let mut sink = FsSink::new();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        sink.create_dir_all(parent)?;
    }
    sink.write(output, &packed, format)?;
    Ok(output.to_path_buf())
}

#[derive(Debug, Serialize)]
struct PresetRow {
    id: &'static str,
    label: &'static str,
    format: ImageFormat,
    prefix: String,
    suffix: String,
    packed: bool,
}

fn preset_rows() -> Vec<PresetRow> {
    ExportPreset::ALL
        .iter()
        .map(|p| {
            let settings = p.settings();
            PresetRow {
                id: p.id(),
                label: p.label(),
                format: settings.format,
                prefix: settings.prefix,
                suffix: settings.suffix,
                packed: settings.packed,
            }
        })
        .collect()
}

fn cmd_presets(json: bool) -> Result<(), Box<dyn Error>> {
    let rows = preset_rows();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in &rows {
        println!(
            "{:<8} {:<12} {:<6} prefix={:?} suffix={:?}{}",
            row.id,
            row.label,
            row.format,
            row.prefix,
            row.suffix,
            if row.packed { " packed" } else { "" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
[[objects]]
name = "Crate"
materials = ["Crate.001"]

[[objects]]
name = "Lamp"
materials = ["Lamp"]

[[materials]]
name = "Crate.001"

[[materials.textures]]
image = "crate_col"
path = "crate_col.png"
socket = "Base Color"
node_kind = "BSDF_PRINCIPLED"
embedded = true

[[materials.textures]]
image = "crate_metal"
solid = { width = 4, height = 4, rgba = [1.0, 1.0, 1.0, 1.0] }

[[materials.textures]]
image = "crate_rough"
solid = { width = 4, height = 4, rgba = [0.2, 0.2, 0.2, 1.0] }

[[materials]]
name = "Lamp"

[[materials.textures]]
image = "lamp_emit"
solid = { width = 2, height = 2, rgba = [1.0, 0.8, 0.2, 1.0] }
"#;

    fn write_scene(dir: &Path) -> PathBuf {
        let img = image::RgbaImage::from_raw(4, 4, vec![128u8; 4 * 4 * 4]).unwrap();
        img.save(dir.join("crate_col.png")).unwrap();
        let path = dir.join("scene.toml");
        std::fs::write(&path, SCENE).unwrap();
        path
    }

    #[test]
    fn export_writes_under_scene_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = write_scene(tmp.path());
        let config = export_config(&ConfigFile::default(), &ExportOverrides::default()).unwrap();

        let report = cmd_export(&scene, &config, Selection::All, false).unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.success_count(), 4);
        let crate_dir = tmp.path().join("exported_maps").join("Crate_001");
        assert!(crate_dir.join("Crate_001_BaseColor.png").is_file());
        assert!(crate_dir.join("Crate_001_Metallic.png").is_file());
        assert!(tmp
            .path()
            .join("exported_maps/Lamp/Lamp_Emissive.png")
            .is_file());
    }

    #[test]
    fn export_packed_preset_for_one_object() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = write_scene(tmp.path());
        let overrides = ExportOverrides {
            preset: Some("packed".into()),
            dir: Some("//out".into()),
            ..Default::default()
        };
        let config = export_config(&ConfigFile::default(), &overrides).unwrap();

        let report = cmd_export(&scene, &config, selection(vec!["Crate".into()]), false).unwrap();

        assert_eq!(report.success_count(), 1);
        let packed = tmp.path().join("out/Crate_001/packed_Crate_001_packedMRAO.tga");
        assert!(packed.is_file());
        let img = image::open(&packed).unwrap().to_rgba8();
        // R = metallic, G = roughness, B = AO (absent, zero)
        assert_eq!(img.get_pixel(0, 0).0, [255, 51, 0, 255]);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = write_scene(tmp.path());
        let config = export_config(&ConfigFile::default(), &ExportOverrides::default()).unwrap();

        let report = cmd_export(&scene, &config, Selection::All, true).unwrap();

        assert_eq!(report.success_count(), 4);
        assert!(!tmp.path().join("exported_maps").exists());
    }

    #[test]
    fn cli_flags_override_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
[export]
preset = "unity_hdrp"
suffix = "_file"
directory = "/from/file"
"#,
        )
        .unwrap();

        let from_file = export_config(&file, &ExportOverrides::default()).unwrap();
        assert_eq!(from_file.suffix, "_file");
        assert_eq!(from_file.directory, "/from/file");

        let overrides = ExportOverrides {
            preset: Some("unreal".into()),
            format: Some("jpg".into()),
            ..Default::default()
        };
        let config = export_config(&file, &overrides).unwrap();
        assert_eq!(config.preset, ExportPreset::UnrealPbr);
        assert_eq!(config.format, ImageFormat::Jpeg);
        assert_eq!(config.suffix, "");
        assert_eq!(config.directory, "/from/file");

        let bad = ExportOverrides {
            preset: Some("blender".into()),
            ..Default::default()
        };
        assert!(export_config(&file, &bad).is_err());
    }

    #[test]
    fn unpack_extracts_embedded_only() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = write_scene(tmp.path());
        let config = unpack_config(&ConfigFile::default(), None, Some("jpeg".into())).unwrap();

        let report = cmd_unpack(&scene, &config, Selection::All, false).unwrap();

        assert_eq!(report.success_count(), 1);
        assert!(tmp
            .path()
            .join("qup_export/Crate_001/Crate_001_BaseColor.jpg")
            .is_file());
    }

    #[test]
    fn classify_lists_every_texture() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = Scene::load(write_scene(tmp.path())).unwrap();
        let rows = classify_rows(&scene);
        let maps: Vec<_> = rows.iter().map(|r| (r.image.as_str(), r.map_type)).collect();
        assert_eq!(
            maps,
            vec![
                ("crate_col", MapType::BaseColor),
                ("crate_metal", MapType::Metallic),
                ("crate_rough", MapType::Roughness),
                ("lamp_emit", MapType::Emissive),
            ]
        );
    }

    #[test]
    fn pack_image_files() {
        let tmp = tempfile::tempdir().unwrap();
        let rough = tmp.path().join("rough.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([51, 51, 51, 255]))
            .save(&rough)
            .unwrap();
        let out = tmp.path().join("packed/mrao.png");

        let written = cmd_pack(None, Some(&rough), None, &out, format_from_extension(&out)).unwrap();

        assert_eq!(written, out);
        let img = image::open(&out).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 1).0, [0, 51, 0, 255]);
    }

    #[test]
    fn pack_without_inputs_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("mrao.png");
        let err = cmd_pack(None, None, None, &out, ImageFormat::Png).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("no metallic"));
        assert!(!out.exists());
    }

    #[test]
    fn preset_table() {
        let rows = preset_rows();
        assert_eq!(rows.len(), 4);
        let packed = rows.iter().find(|r| r.id == "packed").unwrap();
        assert_eq!(packed.format, ImageFormat::Targa);
        assert_eq!(packed.prefix, "packed_");
        assert!(packed.packed);
        assert_eq!(format_from_extension(Path::new("x.tga")), ImageFormat::Targa);
        assert_eq!(format_from_extension(Path::new("x")), ImageFormat::Png);
    }
}
