use crate::assets::{THUMBS_DIR, ThumbnailCache, find_thumbnail, timestamped_filename};
use crate::config::{Config, load_config};
use crate::error::PosterError;
use crate::fonts::resolve_fonts;
use crate::ir::{LayerData, Point, RoadGraph};
use crate::render::{PosterRequest, compose, render_svg};
use crate::theme::{DEFAULT_THEME, ThemeStore};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cityposter", version, about = "Render a city map poster from road and area geometry")]
pub struct Args {
    /// City name printed on the poster
    #[arg(long)]
    pub city: Option<String>,

    /// Country name printed below the city
    #[arg(long)]
    pub country: Option<String>,

    /// Theme name (see --list-themes)
    #[arg(short = 't', long, default_value = DEFAULT_THEME)]
    pub theme: String,

    /// Map center as "LAT,LON"
    #[arg(long, allow_hyphen_values = true)]
    pub coords: Option<String>,

    /// Road network JSON (nodes and edges)
    #[arg(short = 'g', long)]
    pub graph: Option<PathBuf>,

    /// Water features (GeoJSON FeatureCollection)
    #[arg(long)]
    pub water: Option<PathBuf>,

    /// Park and green-space features (GeoJSON FeatureCollection)
    #[arg(long)]
    pub parks: Option<PathBuf>,

    /// Frame ±radius metres around the center instead of the whole network
    #[arg(short = 'r', long)]
    pub radius: Option<f64>,

    /// Output resolution
    #[arg(long)]
    pub dpi: Option<f32>,

    /// Output file. PNG defaults to `<city>_<theme>_<timestamp>.png`, SVG to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "png")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Directory of `<name>.json` theme files (built-in themes otherwise)
    #[arg(long)]
    pub themes_dir: Option<PathBuf>,

    /// Print the available themes and exit
    #[arg(long)]
    pub list_themes: bool,

    /// Create missing thumbnails for every PNG poster in DIR
    #[arg(long, value_name = "DIR")]
    pub thumbnails: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    execute(&args)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn execute(args: &Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    let store = match &config.themes_dir {
        Some(dir) => ThemeStore::from_dir(dir),
        None => ThemeStore::embedded(),
    };

    if let Some(dir) = &args.thumbnails {
        let mut cache = ThumbnailCache::new(config.render.thumbnail_size);
        let thumbs = cache
            .fill_directory(dir)
            .with_context(|| format!("creating thumbnails in {}", dir.display()))?;
        info!(count = thumbs.len(), created = cache.generated(), "thumbnails ready");
    }

    if args.list_themes {
        let previews = args.thumbnails.as_ref().map(|dir| dir.join(THUMBS_DIR));
        let mut stdout = std::io::stdout().lock();
        for line in theme_listing(&store, previews.as_deref())? {
            writeln!(stdout, "{line}")?;
        }
        return Ok(());
    }
    if args.thumbnails.is_some() {
        return Ok(());
    }

    render_poster(args, &config, &store)
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(dpi) = args.dpi {
        config.render.dpi = dpi;
    }
    if let Some(dir) = &args.themes_dir {
        config.themes_dir = Some(dir.clone());
    }
}

fn theme_listing(store: &ThemeStore, previews: Option<&Path>) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for name in store.list_themes()? {
        let theme = store.load_theme(&name)?;
        let mut line = name.clone();
        if let Some(description) = theme.description.as_deref().filter(|d| !d.is_empty()) {
            line.push_str(&format!(" - {description}"));
        }
        if let Some(preview) = previews.and_then(|dir| find_thumbnail(dir, &name)) {
            line.push_str(&format!(" [{}]", preview.display()));
        }
        lines.push(line);
    }
    Ok(lines)
}

fn render_poster(args: &Args, config: &Config, store: &ThemeStore) -> Result<()> {
    let city = args
        .city
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("--city is required"))?;
    let country = args
        .country
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("--country is required"))?;
    let point = match args.coords.as_deref() {
        Some(coords) => Point::parse(coords)?,
        None => {
            return Err(PosterError::geocoding(format!(
                "no coordinates for {city}, {country}; pass --coords LAT,LON"
            ))
            .into());
        }
    };

    let graph_path = args
        .graph
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--graph is required"))?;
    let graph = RoadGraph::from_json_file(graph_path)
        .with_context(|| format!("reading road network {}", graph_path.display()))?;
    let water = args
        .water
        .as_deref()
        .map_or(LayerData::Absent, LayerData::from_geojson_file);
    let parks = args
        .parks
        .as_deref()
        .map_or(LayerData::Absent, LayerData::from_geojson_file);

    let theme = store.load_theme(&args.theme)?;
    let mut request = PosterRequest::new(&graph, city, country, point)
        .with_water(&water)
        .with_parks(&parks);
    if let Some(radius) = args.radius {
        request = request.with_radius(radius);
    }

    match args.output_format {
        OutputFormat::Svg => {
            let fonts = resolve_fonts(&theme.fonts, &config.render.fallback_font_family)?;
            let svg = render_svg(&request, &theme, &fonts, &config.layout)?;
            match &args.output {
                Some(path) => std::fs::write(path, svg)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => print!("{svg}"),
            }
        }
        OutputFormat::Png => {
            let png = compose(&request, &theme, config)?;
            let output = match &args.output {
                Some(path) => path.clone(),
                None => PathBuf::from(timestamped_filename(city, &args.theme, unix_now())),
            };
            std::fs::write(&output, png).with_context(|| format!("writing {}", output.display()))?;
            eprintln!("poster saved to {}", output.display());
        }
    }
    Ok(())
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
