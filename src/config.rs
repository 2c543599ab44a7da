use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Points per inch of the poster canvas; font sizes and stroke widths are in points.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Vertical positions are fractions of the canvas height measured from the
/// bottom edge (text baselines), horizontal ones fractions of the width.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypographyConfig {
    pub city_y: f32,
    pub country_y: f32,
    pub coords_y: f32,
    pub divider_y: f32,
    pub divider_half_width: f32,
    pub divider_width: f32,
    pub city_size: f32,
    pub country_size: f32,
    pub coords_size: f32,
    pub coords_opacity: f32,
    /// Widest the spaced city line may get, as a share of the canvas width.
    pub max_city_width: f32,
    /// Lower bound for long-name shrinking, as a share of `city_size`.
    pub min_city_scale: f32,
    pub letter_gap: String,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            city_y: 0.14,
            country_y: 0.10,
            coords_y: 0.07,
            divider_y: 0.125,
            divider_half_width: 0.1,
            divider_width: 1.0,
            city_size: 60.0,
            country_size: 22.0,
            coords_size: 14.0,
            coords_opacity: 0.7,
            max_city_width: 0.9,
            min_city_scale: 0.4,
            letter_gap: "  ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Canvas size in inches.
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub gradient_fraction: f32,
    /// Framing radius in metres for graphs without usable nodes.
    pub default_radius: f64,
    pub typography: TypographyConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 12.0,
            canvas_height: 16.0,
            gradient_fraction: 0.25,
            default_radius: 2000.0,
            typography: TypographyConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn canvas_points(&self) -> (f32, f32) {
        (
            self.canvas_width * POINTS_PER_INCH,
            self.canvas_height * POINTS_PER_INCH,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    pub dpi: f32,
    /// Generic family used for any weight without a theme font file.
    pub fallback_font_family: String,
    /// Longest edge of cached theme previews, in pixels.
    pub thumbnail_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 300.0,
            fallback_font_family: "monospace".to_string(),
            thumbnail_size: 300,
        }
    }
}

impl RenderConfig {
    pub fn pixel_size(&self, layout: &LayoutConfig) -> (u32, u32) {
        let dpi = self.dpi.max(1.0);
        (
            (layout.canvas_width * dpi).round().max(1.0) as u32,
            (layout.canvas_height * dpi).round().max(1.0) as u32,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub themes_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TypographyConfigFile {
    city_y: Option<f32>,
    country_y: Option<f32>,
    coords_y: Option<f32>,
    divider_y: Option<f32>,
    divider_half_width: Option<f32>,
    divider_width: Option<f32>,
    city_size: Option<f32>,
    country_size: Option<f32>,
    coords_size: Option<f32>,
    coords_opacity: Option<f32>,
    max_city_width: Option<f32>,
    min_city_scale: Option<f32>,
    letter_gap: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    dpi: Option<f32>,
    canvas_width: Option<f32>,
    canvas_height: Option<f32>,
    gradient_fraction: Option<f32>,
    default_radius: Option<f64>,
    themes_dir: Option<PathBuf>,
    thumbnail_size: Option<u32>,
    fallback_font_family: Option<String>,
    typography: Option<TypographyConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(err) => json5::from_str(&contents).map_err(|_| err)?,
    };

    if let Some(v) = parsed.dpi {
        config.render.dpi = v;
    }
    if let Some(v) = parsed.canvas_width {
        config.layout.canvas_width = v;
    }
    if let Some(v) = parsed.canvas_height {
        config.layout.canvas_height = v;
    }
    if let Some(v) = parsed.gradient_fraction {
        config.layout.gradient_fraction = v;
    }
    if let Some(v) = parsed.default_radius {
        config.layout.default_radius = v;
    }
    if let Some(v) = parsed.thumbnail_size {
        config.render.thumbnail_size = v;
    }
    if let Some(v) = parsed.fallback_font_family {
        config.render.fallback_font_family = v;
    }
    if let Some(dir) = parsed.themes_dir {
        // Relative theme directories are anchored at the config file.
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.themes_dir = Some(if dir.is_relative() { base.join(dir) } else { dir });
    }

    if let Some(typo) = parsed.typography {
        let target = &mut config.layout.typography;
        if let Some(v) = typo.city_y {
            target.city_y = v;
        }
        if let Some(v) = typo.country_y {
            target.country_y = v;
        }
        if let Some(v) = typo.coords_y {
            target.coords_y = v;
        }
        if let Some(v) = typo.divider_y {
            target.divider_y = v;
        }
        if let Some(v) = typo.divider_half_width {
            target.divider_half_width = v;
        }
        if let Some(v) = typo.divider_width {
            target.divider_width = v;
        }
        if let Some(v) = typo.city_size {
            target.city_size = v;
        }
        if let Some(v) = typo.country_size {
            target.country_size = v;
        }
        if let Some(v) = typo.coords_size {
            target.coords_size = v;
        }
        if let Some(v) = typo.coords_opacity {
            target.coords_opacity = v;
        }
        if let Some(v) = typo.max_city_width {
            target.max_city_width = v;
        }
        if let Some(v) = typo.min_city_scale {
            target.min_city_scale = v;
        }
        if let Some(v) = typo.letter_gap {
            target.letter_gap = v;
        }
    }

    Ok(config)
}
