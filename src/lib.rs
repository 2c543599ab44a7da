pub mod assets;
pub mod canvas;
pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod fonts;
pub mod gradient;
pub mod ir;
pub mod projection;
pub mod render;
pub mod text_metrics;
pub mod theme;

pub use assets::{ThumbnailCache, find_thumbnail, generate_output_filename, get_or_create_thumbnail};
pub use classify::{RoadClass, edge_colors, edge_widths};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::{PosterError, PosterResult};
pub use gradient::{GradientLocation, draw_gradient};
pub use ir::{FeatureCollection, Geometry, LayerData, Point, RoadGraph};
pub use render::{PosterRequest, compose, rasterize_png, render_svg};
pub use theme::{Theme, ThemeStore};
