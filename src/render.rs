use crate::canvas::{SvgCanvas, escape_xml};
use crate::classify::{RoadClass, classify_edge};
use crate::color::Color;
use crate::config::{Config, LayoutConfig, RenderConfig};
use crate::error::{PosterError, PosterResult};
use crate::fonts::{PosterFonts, ResolvedFont, resolve_fonts};
use crate::gradient::{GradientLocation, draw_gradient_span};
use crate::ir::{LayerData, Point, RoadGraph};
use crate::projection::Frame;
use crate::text_metrics::measure_text_width;
use crate::theme::Theme;
use std::collections::HashMap;
use tracing::{debug, info};

const Z_WATER: i32 = 1;
const Z_PARKS: i32 = 2;
const Z_ROADS: i32 = 3;
const Z_GRADIENT: i32 = 10;
const Z_TEXT: i32 = 11;

static ABSENT: LayerData = LayerData::Absent;

/// Everything one poster is drawn from, apart from theme and config.
#[derive(Debug, Clone, Copy)]
pub struct PosterRequest<'a> {
    pub graph: &'a RoadGraph,
    pub water: &'a LayerData,
    pub parks: &'a LayerData,
    pub city: &'a str,
    pub country: &'a str,
    pub point: Point,
    /// Show ±radius metres around the point instead of the whole graph.
    pub radius: Option<f64>,
}

impl<'a> PosterRequest<'a> {
    pub fn new(graph: &'a RoadGraph, city: &'a str, country: &'a str, point: Point) -> Self {
        Self {
            graph,
            water: &ABSENT,
            parks: &ABSENT,
            city,
            country,
            point,
            radius: None,
        }
    }

    pub fn with_water(mut self, water: &'a LayerData) -> Self {
        self.water = water;
        self
    }

    pub fn with_parks(mut self, parks: &'a LayerData) -> Self {
        self.parks = parks;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// Composes the poster and returns it as PNG bytes. Nothing is written to disk.
#[tracing::instrument(skip_all, fields(city = request.city, theme = %theme.name))]
pub fn compose(request: &PosterRequest<'_>, theme: &Theme, config: &Config) -> PosterResult<Vec<u8>> {
    let fonts = resolve_fonts(&theme.fonts, &config.render.fallback_font_family)?;
    let svg = render_svg(request, theme, &fonts, &config.layout)?;
    let png = rasterize_png(&svg, &fonts, &config.layout, &config.render)?;
    info!(bytes = png.len(), "poster composed");
    Ok(png)
}

/// Builds the poster scene as SVG, in points.
pub fn render_svg(
    request: &PosterRequest<'_>,
    theme: &Theme,
    fonts: &PosterFonts,
    layout: &LayoutConfig,
) -> PosterResult<String> {
    request.point.validate()?;
    let (width, height) = layout.canvas_points();
    let mut canvas = SvgCanvas::new(width, height, theme.color("bg")?);

    let frame = match request.radius {
        Some(radius) => Frame::around(request.point, radius, width, height),
        None => Frame::for_graph(
            request.graph,
            request.point,
            layout.default_radius,
            width,
            height,
        ),
    };

    draw_area_layer(&mut canvas, &frame, "water", request.water, theme.color("water")?, Z_WATER);
    draw_area_layer(&mut canvas, &frame, "parks", request.parks, theme.color("parks")?, Z_PARKS);
    draw_roads(&mut canvas, &frame, request.graph, theme)?;

    let gradient_color = theme.color("gradient_color")?;
    draw_gradient_span(
        &mut canvas,
        gradient_color,
        GradientLocation::Bottom,
        Z_GRADIENT,
        layout.gradient_fraction,
    );
    draw_gradient_span(
        &mut canvas,
        gradient_color,
        GradientLocation::Top,
        Z_GRADIENT,
        layout.gradient_fraction,
    );

    draw_typography(&mut canvas, request, theme.color("text")?, fonts, layout);

    Ok(canvas.finish())
}

fn draw_area_layer(
    canvas: &mut SvgCanvas,
    frame: &Frame,
    name: &str,
    layer: &LayerData,
    fill: Color,
    z_order: i32,
) {
    let collection = match layer {
        LayerData::Loaded(collection) if !collection.is_empty() => collection,
        LayerData::Loaded(_) => {
            debug!(layer = name, "no features in area; layer skipped");
            return;
        }
        LayerData::Absent => {
            debug!(layer = name, "layer not provided; skipped");
            return;
        }
        LayerData::Unavailable(reason) => {
            debug!(layer = name, %reason, "layer unavailable; skipped");
            return;
        }
    };
    // One path per polygon: evenodd only cuts holes out of a polygon's own
    // rings, overlapping features still fill.
    let hex = fill.to_hex();
    let opacity = fill.opacity();
    let mut drawn = 0usize;
    for polygon in collection.polygons() {
        let d = polygon_path(frame, polygon);
        if d.is_empty() {
            continue;
        }
        canvas.push(
            z_order,
            &format!(
                "<path d=\"{d}\" fill=\"{hex}\" fill-opacity=\"{opacity}\" fill-rule=\"evenodd\" stroke=\"none\"/>"
            ),
        );
        drawn += 1;
    }
    if drawn == 0 {
        debug!(layer = name, "layer has no polygonal geometry");
    }
}

fn polygon_path(frame: &Frame, rings: &[Vec<[f64; 2]>]) -> String {
    let mut d = String::new();
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        push_subpath(&mut d, frame, ring);
        d.push_str(" Z");
    }
    d
}

fn push_subpath(d: &mut String, frame: &Frame, coords: &[[f64; 2]]) {
    for (idx, lon_lat) in coords.iter().enumerate() {
        let (x, y) = frame.project(*lon_lat);
        if !d.is_empty() {
            d.push(' ');
        }
        d.push_str(&format!("{} {x:.2} {y:.2}", if idx == 0 { "M" } else { "L" }));
    }
}

fn draw_roads(canvas: &mut SvgCanvas, frame: &Frame, graph: &RoadGraph, theme: &Theme) -> PosterResult<()> {
    let index = graph.node_index();
    let mut paths: HashMap<RoadClass, String> = HashMap::new();
    let mut skipped = 0usize;
    for edge in &graph.edges {
        let Some(coords) = graph.edge_coords(edge, &index) else {
            skipped += 1;
            continue;
        };
        push_subpath(paths.entry(classify_edge(edge)).or_default(), frame, &coords);
    }
    if skipped > 0 {
        debug!(skipped, "edges without known endpoints were not drawn");
    }

    for class in RoadClass::DRAW_ORDER {
        let Some(d) = paths.get(&class) else {
            continue;
        };
        let stroke = Color::parse(class.color_field(), class.color(theme))?;
        canvas.push(
            Z_ROADS,
            &format!(
                "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
                stroke.to_hex(),
                stroke.opacity(),
                class.width()
            ),
        );
    }
    Ok(())
}

fn draw_typography(
    canvas: &mut SvgCanvas,
    request: &PosterRequest<'_>,
    text_color: Color,
    fonts: &PosterFonts,
    layout: &LayoutConfig,
) {
    let typo = &layout.typography;
    let width = canvas.width();
    let height = canvas.height();
    let center_x = width / 2.0;
    let baseline = |fraction: f32| height * (1.0 - fraction);

    let spaced_city = letter_space(request.city, &typo.letter_gap);
    let city_size = fit_font_size(
        &fonts.bold,
        &spaced_city,
        typo.city_size,
        width * typo.max_city_width,
        typo.min_city_scale,
    );
    let lines = [
        (spaced_city, &fonts.bold, city_size, typo.city_y, 1.0),
        (request.country.to_uppercase(), &fonts.light, typo.country_size, typo.country_y, 1.0),
        (request.point.caption(), &fonts.regular, typo.coords_size, typo.coords_y, typo.coords_opacity),
    ];
    for (content, font, size, y, opacity) in lines {
        canvas.push(
            Z_TEXT,
            &format!(
                "<text x=\"{center_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-weight=\"{}\" font-size=\"{size:.2}\" fill=\"{}\" fill-opacity=\"{}\" xml:space=\"preserve\">{}</text>",
                baseline(y),
                escape_xml(&font.family),
                font.weight,
                text_color.to_hex(),
                text_color.opacity() * opacity,
                escape_xml(&content)
            ),
        );
    }

    let divider_y = baseline(typo.divider_y);
    canvas.push(
        Z_TEXT,
        &format!(
            "<line x1=\"{:.2}\" y1=\"{divider_y:.2}\" x2=\"{:.2}\" y2=\"{divider_y:.2}\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\"/>",
            width * (0.5 - typo.divider_half_width),
            width * (0.5 + typo.divider_half_width),
            text_color.to_hex(),
            text_color.opacity(),
            typo.divider_width
        ),
    );
}

/// `"Köln"` → `"K  Ö  L  N"` with the default two-space gap.
pub fn letter_space(city: &str, gap: &str) -> String {
    city.to_uppercase()
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(gap)
}

/// Shrinks `base_size` so `text` fits `max_width`, but not below `min_scale`.
fn fit_font_size(font: &ResolvedFont, text: &str, base_size: f32, max_width: f32, min_scale: f32) -> f32 {
    let measured = measure_text_width(font.face.as_ref(), text, base_size);
    if measured <= max_width || measured <= 0.0 {
        return base_size;
    }
    let scale = (max_width / measured).max(min_scale.clamp(0.0, 1.0));
    debug!(measured, max_width, scale, "shrinking city line");
    base_size * scale
}

/// Rasterizes a poster SVG at the configured DPI and encodes it as PNG.
pub fn rasterize_png(
    svg: &str,
    fonts: &PosterFonts,
    layout: &LayoutConfig,
    render: &RenderConfig,
) -> PosterResult<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.font_family = render.fallback_font_family.clone();
    opt.fontdb = fonts.db.clone();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| PosterError::render(err.to_string()))?;
    let (pixel_width, pixel_height) = render.pixel_size(layout);
    let mut pixmap = resvg::tiny_skia::Pixmap::new(pixel_width, pixel_height)
        .ok_or_else(|| PosterError::render("failed to allocate pixmap"))?;

    let size = tree.size();
    let transform = resvg::tiny_skia::Transform::from_scale(
        pixel_width as f32 / size.width(),
        pixel_height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    debug!(pixel_width, pixel_height, dpi = render.dpi, "rasterized poster");
    pixmap
        .encode_png()
        .map_err(|err| PosterError::render(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FeatureCollection, Geometry};
    use crate::theme::ThemeStore;

    fn sample_graph() -> RoadGraph {
        let mut graph = RoadGraph::new();
        graph.add_node(1, 48.130, 11.570);
        graph.add_node(2, 48.140, 11.590);
        graph.add_node(3, 48.135, 11.600);
        graph.add_edge(1, 2, Some("motorway"));
        graph.add_edge(2, 3, Some("residential"));
        graph.add_edge(3, 99, Some("primary"));
        graph
    }

    fn lake() -> LayerData {
        LayerData::Loaded(FeatureCollection::from_geometries([Geometry::Polygon(vec![vec![
            [11.575, 48.132],
            [11.580, 48.132],
            [11.580, 48.136],
            [11.575, 48.132],
        ]])]))
    }

    fn svg_for(request: &PosterRequest<'_>) -> String {
        let theme = ThemeStore::embedded().load_theme("feature_based").unwrap();
        let fonts = resolve_fonts(&theme.fonts, "monospace").unwrap();
        render_svg(request, &theme, &fonts, &LayoutConfig::default()).unwrap()
    }

    #[test]
    fn layers_are_stacked_in_fixed_order() {
        let graph = sample_graph();
        let water = lake();
        let parks = lake();
        let request = PosterRequest::new(&graph, "München", "Germany", Point::new(48.1351, 11.582))
            .with_water(&water)
            .with_parks(&parks);
        let svg = svg_for(&request);
        let water_at = svg.find("fill=\"#c0c0c0\"").unwrap();
        let parks_at = svg.find("fill=\"#f0f0f0\"").unwrap();
        let roads_at = svg.find("stroke=\"#4a4a4a\"").unwrap();
        let fade_at = svg.find("url(#fade-").unwrap();
        let text_at = svg.find("<text").unwrap();
        assert!(water_at < parks_at && parks_at < roads_at && roads_at < fade_at && fade_at < text_at);
        assert!(svg.contains("M  Ü  N  C  H  E  N"));
        assert!(svg.contains(">GERMANY<"));
        assert!(svg.contains("48.1351° N / 11.5820° E"));
        assert!(svg.contains("<line"));
    }

    #[test]
    fn motorways_are_painted_last() {
        let graph = sample_graph();
        let request = PosterRequest::new(&graph, "X", "Y", Point::new(48.1351, 11.582));
        let svg = svg_for(&request);
        let residential = svg.find("stroke-width=\"0.4\"").unwrap();
        let motorway = svg.find("stroke-width=\"1.2\"").unwrap();
        assert!(residential < motorway);
        // Edge 3 -> 99 has an unknown endpoint and is not drawn.
        assert!(!svg.contains("stroke-width=\"1\" "));
    }

    #[test]
    fn missing_and_empty_water_render_identically() {
        let graph = sample_graph();
        let point = Point::new(48.1351, 11.582);
        let empty = LayerData::Loaded(FeatureCollection::default());
        let failed = LayerData::Unavailable("timeout".to_string());
        let absent = svg_for(&PosterRequest::new(&graph, "A", "B", point));
        let with_empty = svg_for(&PosterRequest::new(&graph, "A", "B", point).with_water(&empty));
        let with_failed = svg_for(&PosterRequest::new(&graph, "A", "B", point).with_water(&failed));
        assert_eq!(absent, with_empty);
        assert_eq!(absent, with_failed);
        assert!(!absent.contains("fill-rule"));
    }

    fn square(min_lon: f64, min_lat: f64, side: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            [min_lon, min_lat],
            [min_lon + side, min_lat],
            [min_lon + side, min_lat + side],
            [min_lon, min_lat + side],
            [min_lon, min_lat],
        ]])
    }

    #[test]
    fn overlapping_water_features_both_fill() {
        let graph = RoadGraph::new();
        let water = LayerData::Loaded(FeatureCollection::from_geometries([
            square(-0.004, -0.004, 0.006),
            square(-0.002, -0.002, 0.006),
        ]));
        let theme = ThemeStore::embedded().load_theme("blueprint").unwrap();
        let mut config = Config::default();
        config.render.dpi = 24.0;
        let request = PosterRequest::new(&graph, "A", "B", Point::new(0.0, 0.0))
            .with_water(&water)
            .with_radius(1000.0);

        let fonts = resolve_fonts(&theme.fonts, "monospace").unwrap();
        let svg = render_svg(&request, &theme, &fonts, &config.layout).unwrap();
        assert_eq!(svg.matches("fill-rule=\"evenodd\"").count(), 2);

        let png = compose(&request, &theme, &config).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        let water_color = theme.color("water").unwrap();
        let expected = image::Rgba([water_color.r, water_color.g, water_color.b, 255]);
        // 24 dpi is a third of a pixel per point; the canvas center sits in both squares.
        assert_eq!(*image.get_pixel(144, 192), expected);
        // lon/lat -0.003 lies in the first square only.
        assert_eq!(*image.get_pixel(80, 255), expected);
    }

    #[test]
    fn polygon_holes_stay_within_their_polygon() {
        let frame = Frame::around(Point::new(0.0, 0.0), 1000.0, 864.0, 1152.0);
        let outer = vec![[-0.004, -0.004], [0.004, -0.004], [0.004, 0.004], [-0.004, -0.004]];
        let hole = vec![[-0.001, -0.001], [0.001, -0.001], [0.001, 0.001], [-0.001, -0.001]];
        let d = polygon_path(&frame, &[outer, hole, vec![[0.0, 0.0]]]);
        assert_eq!(d.matches('M').count(), 2);
        assert_eq!(d.matches('Z').count(), 2);
    }

    #[test]
    fn text_is_escaped() {
        let graph = RoadGraph::new();
        let request = PosterRequest::new(&graph, "A&B", "<Nowhere>", Point::new(0.0, 0.0));
        let svg = svg_for(&request);
        assert!(svg.contains("A  &amp;  B"));
        assert!(svg.contains("&lt;NOWHERE&gt;"));
    }

    #[test]
    fn invalid_point_is_rejected() {
        let graph = RoadGraph::new();
        let theme = ThemeStore::embedded().load_theme("noir").unwrap();
        let fonts = resolve_fonts(&theme.fonts, "monospace").unwrap();
        let request = PosterRequest::new(&graph, "A", "B", Point::new(123.0, 0.0));
        assert!(matches!(
            render_svg(&request, &theme, &fonts, &LayoutConfig::default()),
            Err(PosterError::Geocoding(_))
        ));
    }

    #[test]
    fn long_names_shrink_within_bounds() {
        let font = ResolvedFont {
            family: "monospace".to_string(),
            weight: 700,
            generic: true,
            face: None,
        };
        assert_eq!(fit_font_size(&font, "ABC", 60.0, 864.0 * 0.9, 0.4), 60.0);
        let long = letter_space("Llanfairpwllgwyngyll", "  ");
        let size = fit_font_size(&font, &long, 60.0, 864.0 * 0.9, 0.4);
        assert!(size < 60.0 && size >= 24.0);
    }
}
