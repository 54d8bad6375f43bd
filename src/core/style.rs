pub const DEFAULT_STYLE_DESCRIPTION: &str = "high-quality children's book illustration";

/// Illustration styles offered by the storybook generator.
pub const STYLE_CATALOG: &[(&str, &str)] = &[
    (
        "watercolor",
        "soft watercolor painting, gentle brush strokes, pastel colors",
    ),
    (
        "pixel art",
        "8-bit pixel art style, retro gaming aesthetic, vibrant colors",
    ),
    (
        "comics",
        "comic book illustration, bold lines, dynamic action poses",
    ),
    (
        "claymation",
        "claymation style, clay figures, tactile textures",
    ),
    ("crochet", "crochet/yarn art style, soft textile textures"),
    (
        "coloring book",
        "black and white line art, coloring book style",
    ),
];

pub fn style_names() -> Vec<&'static str> {
    STYLE_CATALOG.iter().map(|(name, _)| *name).collect()
}

/// Case-insensitive lookup, falling back to a generic illustration style.
pub fn resolve_style(name: &str) -> &'static str {
    let wanted = name.trim().to_lowercase();
    STYLE_CATALOG
        .iter()
        .find(|(key, _)| *key == wanted)
        .map(|(_, desc)| *desc)
        .unwrap_or(DEFAULT_STYLE_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_style_is_case_insensitive() {
        let expected = "8-bit pixel art style, retro gaming aesthetic, vibrant colors";
        assert_eq!(resolve_style("pixel art"), expected);
        assert_eq!(resolve_style("Pixel Art"), expected);
        assert_eq!(resolve_style("PIXEL ART"), expected);
    }

    #[test]
    fn test_unknown_style_falls_back() {
        assert_eq!(resolve_style("origami"), DEFAULT_STYLE_DESCRIPTION);
        assert_eq!(resolve_style(""), DEFAULT_STYLE_DESCRIPTION);
    }

    #[test]
    fn test_every_catalog_entry_resolves_to_itself() {
        for (name, desc) in STYLE_CATALOG {
            assert_eq!(resolve_style(name), *desc);
        }
        assert_eq!(style_names().len(), 6);
    }
}
