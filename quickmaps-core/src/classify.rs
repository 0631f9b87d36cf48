//! Map type detection for texture nodes.
//!
//! A texture's role is inferred first from where its output is linked
//! (socket name / target node kind), then from keywords in the image name,
//! node name and node label. Matching is plain substring search on lowercase
//! text, so "ao" also hits inside longer words.

use crate::material::TextureRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic role of a texture in a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapType {
    BaseColor,
    Normal,
    Roughness,
    Metallic,
    AO,
    Emissive,
    Height,
    Opacity,
    Specular,
    Alpha,
    /// Nothing matched; exported under the image's own name.
    Misc,
}

impl MapType {
    /// Filename token for this map type.
    pub fn label(&self) -> &'static str {
        match self {
            MapType::BaseColor => "BaseColor",
            MapType::Normal => "Normal",
            MapType::Roughness => "Roughness",
            MapType::Metallic => "Metallic",
            MapType::AO => "AO",
            MapType::Emissive => "Emissive",
            MapType::Height => "Height",
            MapType::Opacity => "Opacity",
            MapType::Specular => "Specular",
            MapType::Alpha => "Alpha",
            MapType::Misc => "Misc",
        }
    }

    /// Keywords searched in image/node names, in priority order.
    pub fn name_keywords(&self) -> &[&'static str] {
        match self {
            MapType::BaseColor => &["base", "albedo", "diffuse"],
            MapType::Normal => &["normal"],
            MapType::Roughness => &["rough"],
            MapType::Metallic => &["metal"],
            MapType::AO => &["ao", "occlusion", "ambient"],
            MapType::Emissive => &["emis", "emit"],
            MapType::Height => &["height", "disp", "displacement"],
            MapType::Opacity => &["alpha", "opacity", "trans"],
            MapType::Specular => &["spec"],
            MapType::Alpha | MapType::Misc => &[],
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order in which name keywords are tried.
const NAME_PRIORITY: &[MapType] = &[
    MapType::BaseColor,
    MapType::Normal,
    MapType::Roughness,
    MapType::Metallic,
    MapType::AO,
    MapType::Emissive,
    MapType::Height,
    MapType::Opacity,
    MapType::Specular,
];

/// Classify a texture node. Link rules outrank name keywords; never fails.
pub fn classify(texture: &TextureRef) -> MapType {
    if let Some(map) = classify_from_link(
        texture.connected_socket_name(),
        texture.connected_node_kind(),
    ) {
        return map;
    }
    let haystack = format!(
        "{}{}{}",
        texture.image_name(),
        texture.node_name(),
        texture.node_label()
    );
    classify_from_name(&haystack).unwrap_or(MapType::Misc)
}

/// Link-based rules. `None` when the link says nothing useful.
pub fn classify_from_link(socket_name: Option<&str>, node_kind: Option<&str>) -> Option<MapType> {
    let socket = socket_name.unwrap_or("").to_lowercase();
    let kind = node_kind.unwrap_or("").to_lowercase();

    if socket.contains("normal") || kind.contains("normal") {
        return Some(MapType::Normal);
    }
    if socket.contains("base") || socket.contains("color") {
        return Some(MapType::BaseColor);
    }
    if socket.contains("rough") {
        return Some(MapType::Roughness);
    }
    if socket.contains("metal") {
        return Some(MapType::Metallic);
    }
    if socket.contains("alpha") || socket.contains("opacity") {
        return Some(MapType::Alpha);
    }
    None
}

/// Keyword rules on a free-form name.
pub fn classify_from_name(name: &str) -> Option<MapType> {
    let lower = name.to_lowercase();
    NAME_PRIORITY
        .iter()
        .copied()
        .find(|map| map.name_keywords().iter().any(|k| lower.contains(k)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PixelBuffer;
    use proptest::prelude::*;

    fn tex(image: &str) -> TextureRef {
        TextureRef::new(image, PixelBuffer::filled(1, 1, [0.0, 0.0, 0.0, 1.0]))
    }

    #[test]
    fn metal_image_name_is_metallic() {
        assert_eq!(classify(&tex("Metal_02")), MapType::Metallic);
    }

    #[test]
    fn link_outranks_name() {
        let t = tex("Brick_BaseColor").with_connection(Some("Normal".into()), None);
        assert_eq!(classify(&t), MapType::Normal);
    }

    #[test]
    fn normal_map_node_kind_is_normal() {
        let t = tex("bricks_4k").with_connection(Some("Color".into()), Some("NORMAL_MAP".into()));
        assert_eq!(classify(&t), MapType::Normal);
    }

    #[test]
    fn link_socket_rules_in_order() {
        let cases = [
            ("Base Color", MapType::BaseColor),
            ("Emission Color", MapType::BaseColor),
            ("Roughness", MapType::Roughness),
            ("Metallic", MapType::Metallic),
            ("Alpha", MapType::Alpha),
        ];
        for (socket, expected) in cases {
            let t = tex("x").with_connection(Some(socket.into()), Some("BSDF_PRINCIPLED".into()));
            assert_eq!(classify(&t), expected, "socket {}", socket);
        }
    }

    #[test]
    fn unmatched_link_falls_back_to_names() {
        let t = tex("Rock_Height").with_connection(Some("Fac".into()), Some("MIX".into()));
        assert_eq!(classify(&t), MapType::Height);
    }

    #[test]
    fn node_label_is_searched() {
        let t = tex("T_0042").with_node("Image Texture", "Emission");
        assert_eq!(classify(&t), MapType::Emissive);
    }

    #[test]
    fn name_keywords_respect_priority() {
        assert_eq!(classify(&tex("wall_diffuse")), MapType::BaseColor);
        assert_eq!(classify(&tex("wall_nrm_normal")), MapType::Normal);
        assert_eq!(classify(&tex("ambient")), MapType::AO);
        assert_eq!(classify(&tex("disp_map")), MapType::Height);
        assert_eq!(classify(&tex("glass_trans")), MapType::Opacity);
        assert_eq!(classify(&tex("Specular")), MapType::Specular);
        // "base" wins over "metal" because BaseColor is tried first
        assert_eq!(classify(&tex("metal_base")), MapType::BaseColor);
    }

    #[test]
    fn substring_matching_is_literal() {
        // "ao" inside an unrelated word still counts
        assert_eq!(classify(&tex("chaos")), MapType::AO);
    }

    #[test]
    fn nothing_matches_gives_misc() {
        assert_eq!(classify(&tex("T_0042")), MapType::Misc);
        assert_eq!(classify(&tex("")), MapType::Misc);
    }

    #[test]
    fn labels_match_variant_names() {
        assert_eq!(MapType::BaseColor.label(), "BaseColor");
        assert_eq!(MapType::AO.to_string(), "AO");
        assert_eq!(MapType::Misc.label(), "Misc");
    }

    fn any_texture() -> impl Strategy<Value = TextureRef> {
        (
            any::<String>(),
            any::<String>(),
            any::<String>(),
            proptest::option::of(any::<String>()),
            proptest::option::of(any::<String>()),
        )
            .prop_map(|(image, node, label, socket, kind)| {
                tex(&image).with_node(node, label).with_connection(socket, kind)
            })
    }

    proptest! {
        #[test]
        fn any_texture_gets_exactly_one_tag(t in any_texture()) {
            let haystack = format!("{}{}{}", t.image_name(), t.node_name(), t.node_label());
            let expected = classify_from_link(t.connected_socket_name(), t.connected_node_kind())
                .or_else(|| classify_from_name(&haystack))
                .unwrap_or(MapType::Misc);
            prop_assert_eq!(classify(&t), expected);
        }

        #[test]
        fn keyword_in_unlinked_name_wins(
            index in 0..NAME_PRIORITY.len(),
            prefix in "[xyz0-9_]{0,6}",
            suffix in "[xyz0-9_]{0,6}",
        ) {
            let map = NAME_PRIORITY[index];
            for keyword in map.name_keywords() {
                let name = format!("{}{}{}", prefix, keyword.to_uppercase(), suffix);
                prop_assert_eq!(classify(&tex(&name)), map);
            }
        }
    }
}
