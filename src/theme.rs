use crate::color::Color;
use crate::error::{PosterError, PosterResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const EMBEDDED_THEMES: [(&str, &str); 12] = [
    ("autumn", include_str!("../themes/autumn.json")),
    ("blueprint", include_str!("../themes/blueprint.json")),
    ("feature_based", include_str!("../themes/feature_based.json")),
    ("forest", include_str!("../themes/forest.json")),
    ("japanese_ink", include_str!("../themes/japanese_ink.json")),
    ("midnight_blue", include_str!("../themes/midnight_blue.json")),
    ("noir", include_str!("../themes/noir.json")),
    ("ocean", include_str!("../themes/ocean.json")),
    ("pastel_dream", include_str!("../themes/pastel_dream.json")),
    ("sunset", include_str!("../themes/sunset.json")),
    ("terracotta", include_str!("../themes/terracotta.json")),
    ("warm_beige", include_str!("../themes/warm_beige.json")),
];

pub const DEFAULT_THEME: &str = "feature_based";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Theme {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub bg: String,
    pub water: String,
    pub parks: String,
    pub text: String,
    pub gradient_color: String,
    #[serde(flatten)]
    pub roads: RoadPalette,
    #[serde(default)]
    pub fonts: FontSet,
}

/// Stroke colors per road class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoadPalette {
    pub road_motorway: String,
    pub road_primary: String,
    pub road_secondary: String,
    pub road_tertiary: String,
    pub road_residential: String,
    pub road_default: String,
}

impl Default for RoadPalette {
    fn default() -> Self {
        Self {
            road_motorway: "#0A0A0A".to_string(),
            road_primary: "#1A1A1A".to_string(),
            road_secondary: "#2A2A2A".to_string(),
            road_tertiary: "#3A3A3A".to_string(),
            road_residential: "#4A4A4A".to_string(),
            road_default: "#3A3A3A".to_string(),
        }
    }
}

/// Font files for the three typographic weights. A missing entry falls back
/// to the generic family from the render config.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FontSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular: Option<PathBuf>,
}

impl FontSet {
    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.bold, &mut self.light, &mut self.regular]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl Theme {
    /// Parses a theme document, accepting JSON5 as a fallback.
    pub fn from_json(name: &str, contents: &str) -> PosterResult<Self> {
        let mut theme: Theme = match serde_json::from_str(contents) {
            Ok(theme) => theme,
            Err(err) => json5::from_str(contents).map_err(|_| err)?,
        };
        if theme.name.is_empty() {
            theme.name = name.to_string();
        }
        theme.validate()?;
        Ok(theme)
    }

    /// Every color field must parse; the first bad one is reported.
    pub fn validate(&self) -> PosterResult<()> {
        for (field, value) in self.color_fields() {
            Color::parse(field, value)?;
        }
        Ok(())
    }

    pub fn color(&self, field: &str) -> PosterResult<Color> {
        let value = self
            .color_fields()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
            .ok_or_else(|| PosterError::InvalidColor {
                field: field.to_string(),
                value: String::new(),
            })?;
        Color::parse(field, value)
    }

    fn color_fields(&self) -> [(&'static str, &str); 11] {
        [
            ("bg", self.bg.as_str()),
            ("water", self.water.as_str()),
            ("parks", self.parks.as_str()),
            ("text", self.text.as_str()),
            ("gradient_color", self.gradient_color.as_str()),
            ("road_motorway", self.roads.road_motorway.as_str()),
            ("road_primary", self.roads.road_primary.as_str()),
            ("road_secondary", self.roads.road_secondary.as_str()),
            ("road_tertiary", self.roads.road_tertiary.as_str()),
            ("road_residential", self.roads.road_residential.as_str()),
            ("road_default", self.roads.road_default.as_str()),
        ]
    }
}

#[derive(Debug, Clone)]
enum ThemeSource {
    Embedded,
    Directory(PathBuf),
}

/// Read-only catalogue of named themes.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    source: ThemeSource,
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::embedded()
    }
}

impl ThemeStore {
    pub fn embedded() -> Self {
        Self {
            source: ThemeSource::Embedded,
        }
    }

    /// Themes are `<dir>/<name>.json`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: ThemeSource::Directory(dir.into()),
        }
    }

    /// Theme names sorted alphabetically.
    pub fn list_themes(&self) -> PosterResult<Vec<String>> {
        let mut names: Vec<String> = match &self.source {
            ThemeSource::Embedded => EMBEDDED_THEMES
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
            ThemeSource::Directory(dir) => {
                let mut names = Vec::new();
                for entry in std::fs::read_dir(dir)? {
                    let path = entry?.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
                names
            }
        };
        names.sort();
        Ok(names)
    }

    pub fn load_theme(&self, name: &str) -> PosterResult<Theme> {
        if !is_valid_theme_name(name) {
            return Err(PosterError::not_found(name));
        }
        match &self.source {
            ThemeSource::Embedded => {
                let (_, contents) = EMBEDDED_THEMES
                    .iter()
                    .find(|(candidate, _)| *candidate == name)
                    .ok_or_else(|| PosterError::not_found(name))?;
                Theme::from_json(name, contents)
            }
            ThemeSource::Directory(dir) => {
                let path = dir.join(format!("{name}.json"));
                if !path.is_file() {
                    return Err(PosterError::not_found(name));
                }
                debug!(theme = name, path = %path.display(), "loading theme");
                let contents = std::fs::read_to_string(&path)?;
                let mut theme = Theme::from_json(name, &contents)?;
                theme.fonts.resolve_relative_to(dir);
                Ok(theme)
            }
        }
    }
}

fn is_valid_theme_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
