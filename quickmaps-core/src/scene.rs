//! Scene description: objects, their material slots, and materials.
//!
//! Scenes are read from a manifest (`.json` or `.toml`) written by whatever
//! tool inspected the source scene. Texture pixels come from image files
//! next to the manifest, or from a solid fill for generated maps.
//!
//! ```toml
//! [[objects]]
//! name = "Cube"
//! materials = ["Brick.001"]
//!
//! [[materials]]
//! name = "Brick.001"
//!
//! [[materials.textures]]
//! image = "brick_basecolor"
//! path = "textures/brick_basecolor.png"
//! socket = "Base Color"
//! node_kind = "BSDF_PRINCIPLED"
//! embedded = true
//! ```

use crate::image_loading::ImageLoader;
use crate::material::{Material, PixelBuffer, TextureRef};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Manifest root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    /// Material slot names, in slot order
    #[serde(default)]
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    #[serde(default = "default_use_nodes")]
    pub use_nodes: bool,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
}

fn default_use_nodes() -> bool {
    true
}

/// One image texture node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureEntry {
    /// Image datablock name
    pub image: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub node_label: String,
    /// Name of the socket the color output is linked to
    #[serde(default)]
    pub socket: Option<String>,
    /// Kind of the node the color output is linked to
    #[serde(default)]
    pub node_kind: Option<String>,
    #[serde(default)]
    pub embedded: bool,
    /// Image file, relative to the manifest
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Generated pixels when there is no file
    #[serde(default)]
    pub solid: Option<SolidFill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidFill {
    pub width: u32,
    pub height: u32,
    pub rgba: [f32; 4],
}

impl SceneManifest {
    /// Parse a manifest file; format chosen by extension (`.toml`, else JSON).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str(&text)?)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }
}

impl TextureEntry {
    fn resolve(&self, base_dir: &Path) -> Result<TextureRef> {
        let pixels = match (&self.path, &self.solid) {
            (Some(path), _) => ImageLoader::load_pixels(base_dir.join(path))?,
            (None, Some(fill)) => PixelBuffer::filled(fill.width, fill.height, fill.rgba),
            (None, None) => {
                return Err(crate::Error::Config(format!(
                    "texture \"{}\" needs a path or a solid fill",
                    self.image
                )))
            }
        };
        Ok(TextureRef::new(&self.image, pixels)
            .with_node(&self.node_name, &self.node_label)
            .with_connection(self.socket.clone(), self.node_kind.clone())
            .with_embedded(self.embedded))
    }
}

/// An object and the material names in its slots.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub material_slots: Vec<String>,
}

/// Which objects a driver works on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    /// Only these objects, by name
    Objects(Vec<String>),
}

/// A loaded scene with decoded texture pixels.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub materials: Vec<Material>,
    /// Directory `//`-relative paths resolve against
    pub project_dir: Option<PathBuf>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, name: impl Into<String>, slots: &[&str]) -> Self {
        self.objects.push(SceneObject {
            name: name.into(),
            material_slots: slots.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    /// Read a manifest and decode every texture it references.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let manifest = SceneManifest::load(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut scene = Self::from_manifest(manifest, &base_dir)?;
        scene.project_dir = Some(base_dir);
        Ok(scene)
    }

    pub fn from_manifest(manifest: SceneManifest, base_dir: &Path) -> Result<Self> {
        let mut materials = Vec::with_capacity(manifest.materials.len());
        for entry in manifest.materials {
            let textures = entry
                .textures
                .iter()
                .map(|t| t.resolve(base_dir))
                .collect::<Result<Vec<_>>>()?;
            materials.push(Material {
                name: entry.name,
                use_nodes: entry.use_nodes,
                textures,
            });
        }
        let objects = manifest
            .objects
            .into_iter()
            .map(|o| SceneObject {
                name: o.name,
                material_slots: o.materials,
            })
            .collect();
        Ok(Self {
            objects,
            materials,
            project_dir: None,
        })
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Objects picked by `selection`, plus the names that matched nothing.
    pub fn select_objects<'a>(&'a self, selection: &'a Selection) -> (Vec<&'a SceneObject>, Vec<&'a str>) {
        match selection {
            Selection::All => (self.objects.iter().collect(), Vec::new()),
            Selection::Objects(names) => {
                let mut found = Vec::new();
                let mut missing = Vec::new();
                for name in names {
                    match self.object(name) {
                        Some(obj) => found.push(obj),
                        None => missing.push(name.as_str()),
                    }
                }
                (found, missing)
            }
        }
    }

    /// Materials in the slots of `objects`, slot order, without repeats.
    /// Slots naming unknown materials are skipped.
    pub fn slot_materials<'a>(&'a self, objects: &[&'a SceneObject]) -> Vec<&'a Material> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for obj in objects {
            for slot in &obj.material_slots {
                let Some(material) = self.material(slot) else {
                    tracing::warn!(object = %obj.name, slot = %slot, "empty or unknown material slot");
                    continue;
                };
                if seen.insert(material.name.as_str()) {
                    out.push(material);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_SCENE: &str = r#"
[[objects]]
name = "Cube"
materials = ["Brick.001", "Missing"]

[[objects]]
name = "Plane"
materials = ["Brick.001", "Glass"]

[[materials]]
name = "Brick.001"

[[materials.textures]]
image = "brick_col"
path = "brick_col.png"
socket = "Base Color"
node_kind = "BSDF_PRINCIPLED"
embedded = true

[[materials.textures]]
image = "brick_rough"
solid = { width = 4, height = 4, rgba = [0.5, 0.5, 0.5, 1.0] }

[[materials]]
name = "Glass"
use_nodes = false
"#;

    fn write_scene(dir: &Path) -> PathBuf {
        let img = image::RgbaImage::from_raw(4, 4, vec![200u8; 4 * 4 * 4]).unwrap();
        img.save(dir.join("brick_col.png")).unwrap();
        let path = dir.join("scene.toml");
        std::fs::write(&path, TOML_SCENE).unwrap();
        path
    }

    #[test]
    fn load_toml_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = Scene::load(write_scene(tmp.path())).unwrap();

        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.project_dir.as_deref(), Some(tmp.path()));

        let brick = scene.material("Brick.001").unwrap();
        assert_eq!(brick.textures.len(), 2);
        let col = &brick.textures[0];
        assert_eq!(col.connected_socket_name(), Some("Base Color"));
        assert!(col.is_embedded());
        assert_eq!((col.width(), col.height()), (4, 4));
        assert_eq!(brick.textures[1].pixels().pixel(3, 3), Some([0.5, 0.5, 0.5, 1.0]));

        assert!(!scene.material("Glass").unwrap().use_nodes);
    }

    #[test]
    fn load_json_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let json = r#"{
            "objects": [{ "name": "Sphere", "materials": ["Chrome"] }],
            "materials": [{
                "name": "Chrome",
                "textures": [{ "image": "chrome_metal", "solid": { "width": 2, "height": 2, "rgba": [1.0, 1.0, 1.0, 1.0] } }]
            }]
        }"#;
        let path = tmp.path().join("scene.json");
        std::fs::write(&path, json).unwrap();

        let scene = Scene::load(&path).unwrap();
        assert_eq!(scene.materials[0].textures[0].image_name(), "chrome_metal");
        assert!(scene.materials[0].use_nodes);
    }

    #[test]
    fn texture_without_source_is_rejected() {
        let manifest: SceneManifest = toml::from_str(
            r#"
[[materials]]
name = "M"
[[materials.textures]]
image = "orphan"
"#,
        )
        .unwrap();
        let err = Scene::from_manifest(manifest, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("orphan"));
    }

    #[test]
    fn slot_materials_dedup_and_skip_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        let scene = Scene::load(write_scene(tmp.path())).unwrap();

        let (objects, missing) = scene.select_objects(&Selection::All);
        assert!(missing.is_empty());
        let names: Vec<_> = scene
            .slot_materials(&objects)
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["Brick.001", "Glass"]);
    }

    #[test]
    fn select_objects_reports_missing_names() {
        let scene = Scene::new().with_object("Cube", &[]);
        let selection = Selection::Objects(vec!["Cube".into(), "Ghost".into()]);
        let (found, missing) = scene.select_objects(&selection);
        assert_eq!(found.len(), 1);
        assert_eq!(missing, vec!["Ghost"]);
    }
}
