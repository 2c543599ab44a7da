use std::path::{Path, PathBuf};

use city_poster::{
    Config, FeatureCollection, LayerData, Point, PosterError, PosterRequest, RoadGraph, ThemeStore, compose,
    edge_colors, edge_widths, load_config,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn munich() -> Point {
    Point::new(48.1351, 11.5820)
}

/// Low resolution keeps rasterization fast.
fn small_config() -> Config {
    let mut config = load_config(None).unwrap();
    config.render.dpi = 12.0;
    config
}

fn png_dimensions(png: &[u8]) -> (u32, u32) {
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n", "not a PNG");
    let width = u32::from_be_bytes(png[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(png[20..24].try_into().unwrap());
    (width, height)
}

#[test]
fn fixtures_render_to_png_at_configured_dpi() {
    let graph = RoadGraph::from_json_file(&fixture("graph.json")).unwrap();
    let water = LayerData::from_geojson_file(&fixture("water.geojson"));
    let parks = LayerData::from_geojson_file(&fixture("parks.geojson"));
    // The riverbank feature carries altitudes and still loads.
    match &water {
        LayerData::Loaded(collection) => assert_eq!(collection.polygons().count(), 2),
        other => panic!("water not loaded: {other:?}"),
    }

    let theme = ThemeStore::embedded().load_theme("midnight_blue").unwrap();
    let request = PosterRequest::new(&graph, "Munich", "Germany", munich())
        .with_water(&water)
        .with_parks(&parks);
    let png = compose(&request, &theme, &small_config()).unwrap();
    assert_eq!(png_dimensions(&png), (144, 192));
}

#[test]
fn compose_is_deterministic() {
    let graph = RoadGraph::from_json_file(&fixture("graph.json")).unwrap();
    let water = LayerData::from_geojson_file(&fixture("water.geojson"));
    let theme = ThemeStore::embedded().load_theme("noir").unwrap();
    let config = small_config();
    let request = PosterRequest::new(&graph, "Munich", "Germany", munich()).with_water(&water);

    let first = compose(&request, &theme, &config).unwrap();
    let second = compose(&request, &theme, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn absent_and_empty_water_are_pixel_identical() {
    let graph = RoadGraph::from_json_file(&fixture("graph.json")).unwrap();
    let theme = ThemeStore::embedded().load_theme("ocean").unwrap();
    let config = small_config();
    let empty = LayerData::Loaded(FeatureCollection::default());

    let without = compose(&PosterRequest::new(&graph, "Munich", "Germany", munich()), &theme, &config).unwrap();
    let with_empty = compose(
        &PosterRequest::new(&graph, "Munich", "Germany", munich()).with_water(&empty),
        &theme,
        &config,
    )
    .unwrap();
    assert_eq!(without, with_empty);
}

#[test]
fn water_layer_changes_the_output() {
    let graph = RoadGraph::from_json_file(&fixture("graph.json")).unwrap();
    let water = LayerData::from_geojson_file(&fixture("water.geojson"));
    let theme = ThemeStore::embedded().load_theme("blueprint").unwrap();
    let config = small_config();

    let without = compose(&PosterRequest::new(&graph, "Munich", "Germany", munich()), &theme, &config).unwrap();
    let with_water = compose(
        &PosterRequest::new(&graph, "Munich", "Germany", munich()).with_water(&water),
        &theme,
        &config,
    )
    .unwrap();
    assert_ne!(without, with_water);
}

#[test]
fn fixture_edges_are_classified() {
    let graph = RoadGraph::from_json_file(&fixture("graph.json")).unwrap();
    let theme = ThemeStore::embedded().load_theme("feature_based").unwrap();
    let colors = edge_colors(&graph, &theme);
    let widths = edge_widths(&graph);
    assert_eq!(colors.len(), graph.edges.len());

    let motorway = graph.edges[0].edge_key();
    assert_eq!(colors[&motorway], theme.roads.road_motorway);
    assert_eq!(widths[&motorway], 1.2);

    // ["primary", "secondary"] classifies by its first entry.
    assert_eq!(widths[&graph.edges[1].edge_key()], 1.0);

    for idx in [4, 5, 7] {
        let key = graph.edges[idx].edge_key();
        assert_eq!(colors[&key], theme.roads.road_default);
        assert_eq!(widths[&key], 0.4);
    }
}

#[test]
fn broken_theme_font_aborts_the_render() {
    let graph = RoadGraph::new();
    let mut theme = ThemeStore::embedded().load_theme("noir").unwrap();
    theme.fonts.bold = Some(PathBuf::from("/nonexistent/fonts/Bold.ttf"));
    let err = compose(&PosterRequest::new(&graph, "A", "B", munich()), &theme, &small_config()).unwrap_err();
    assert!(matches!(err, PosterError::Font { .. }));
}

#[test]
fn invalid_theme_color_aborts_the_render() {
    let graph = RoadGraph::new();
    let mut theme = ThemeStore::embedded().load_theme("noir").unwrap();
    theme.gradient_color = "transparent-ish".to_string();
    let err = compose(&PosterRequest::new(&graph, "A", "B", munich()), &theme, &small_config()).unwrap_err();
    assert!(matches!(err, PosterError::InvalidColor { ref field, .. } if field == "gradient_color"));
}
