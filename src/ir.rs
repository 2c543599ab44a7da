use crate::error::{PosterError, PosterResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

static COORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(-?\d+(?:\.\d+)?)\s*°?\s*([NSns])?\s*[,/ ]\s*(-?\d+(?:\.\d+)?)\s*°?\s*([EWew])?\s*$",
    )
    .unwrap()
});

/// Map center in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Accepts `48.1351,11.5820`, `48.1351 11.5820` and the caption form
    /// `33.8688° S / 151.2093° E`.
    pub fn parse(input: &str) -> PosterResult<Self> {
        let caps = COORDS_RE
            .captures(input)
            .ok_or_else(|| PosterError::geocoding(format!("cannot read coordinates from {input:?}")))?;
        let number = |idx: usize| -> PosterResult<f64> {
            caps[idx]
                .parse::<f64>()
                .map_err(|_| PosterError::geocoding(format!("cannot read coordinates from {input:?}")))
        };
        let mut lat = number(1)?;
        let mut lon = number(3)?;
        if caps.get(2).is_some_and(|m| m.as_str().eq_ignore_ascii_case("s")) {
            lat = -lat.abs();
        }
        if caps.get(4).is_some_and(|m| m.as_str().eq_ignore_ascii_case("w")) {
            lon = -lon.abs();
        }
        let point = Self::new(lat, lon);
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> PosterResult<()> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(PosterError::geocoding(format!(
                "coordinates out of range: {}, {}",
                self.lat, self.lon
            )));
        }
        Ok(())
    }

    /// `48.1351° N / 11.5820° E`; hemisphere letters follow the signs.
    pub fn caption(&self) -> String {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0.0 { 'E' } else { 'W' };
        format!(
            "{:.4}° {ns} / {:.4}° {ew}",
            self.lat.abs(),
            self.lon.abs()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// OSM `highway` value; downloaders emit a list when a merged segment
/// carried several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HighwayTag {
    One(String),
    Many(Vec<String>),
}

impl HighwayTag {
    pub fn primary(&self) -> Option<&str> {
        match self {
            HighwayTag::One(value) => Some(value.as_str()),
            HighwayTag::Many(values) => values.first().map(|v| v.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub u: i64,
    pub v: i64,
    pub key: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadEdge {
    pub u: i64,
    pub v: i64,
    #[serde(default)]
    pub key: u32,
    #[serde(default)]
    pub highway: Option<HighwayTag>,
    /// `[lon, lat]` vertices; a straight segment between the endpoints when absent.
    #[serde(default)]
    pub geometry: Option<Vec<[f64; 2]>>,
}

impl RoadEdge {
    pub fn edge_key(&self) -> EdgeKey {
        EdgeKey {
            u: self.u,
            v: self.v,
            key: self.key,
        }
    }

    pub fn highway(&self) -> Option<&str> {
        self.highway.as_ref().and_then(HighwayTag::primary)
    }
}

/// Directed road multigraph as handed over by the network downloader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<RoadEdge>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: &Path) -> PosterResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn add_node(&mut self, id: i64, lat: f64, lon: f64) {
        self.nodes.push(Node { id, lat, lon });
    }

    pub fn add_edge(&mut self, u: i64, v: i64, highway: Option<&str>) {
        let key = self
            .edges
            .iter()
            .filter(|edge| edge.u == u && edge.v == v)
            .count() as u32;
        self.edges.push(RoadEdge {
            u,
            v,
            key,
            highway: highway.map(|h| HighwayTag::One(h.to_string())),
            geometry: None,
        });
    }

    pub fn node_index(&self) -> HashMap<i64, &Node> {
        self.nodes.iter().map(|node| (node.id, node)).collect()
    }

    /// Vertices of an edge as `[lon, lat]`, or `None` when an endpoint is unknown.
    pub fn edge_coords(&self, edge: &RoadEdge, index: &HashMap<i64, &Node>) -> Option<Vec<[f64; 2]>> {
        if let Some(geometry) = &edge.geometry
            && geometry.len() >= 2
        {
            return Some(geometry.clone());
        }
        let from = index.get(&edge.u)?;
        let to = index.get(&edge.v)?;
        Some(vec![[from.lon, from.lat], [to.lon, to.lat]])
    }
}

/// GeoJSON geometry, coordinates as `[lon, lat]`. Positions carrying an
/// altitude (or more) are read with the extra values dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", from = "RawGeometry")]
pub enum Geometry {
    Point([f64; 2]),
    MultiPoint(Vec<[f64; 2]>),
    LineString(Vec<[f64; 2]>),
    MultiLineString(Vec<Vec<[f64; 2]>>),
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

/// A GeoJSON position: `[lon, lat, ...]`.
struct Position([f64; 2]);

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        match values.as_slice() {
            [lon, lat, ..] => Ok(Position([*lon, *lat])),
            _ => Err(serde::de::Error::invalid_length(values.len(), &"at least 2 coordinates")),
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum RawGeometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

fn positions(line: Vec<Position>) -> Vec<[f64; 2]> {
    line.into_iter().map(|position| position.0).collect()
}

fn rings(rings: Vec<Vec<Position>>) -> Vec<Vec<[f64; 2]>> {
    rings.into_iter().map(positions).collect()
}

impl From<RawGeometry> for Geometry {
    fn from(raw: RawGeometry) -> Self {
        match raw {
            RawGeometry::Point(position) => Geometry::Point(position.0),
            RawGeometry::MultiPoint(points) => Geometry::MultiPoint(positions(points)),
            RawGeometry::LineString(line) => Geometry::LineString(positions(line)),
            RawGeometry::MultiLineString(lines) => Geometry::MultiLineString(rings(lines)),
            RawGeometry::Polygon(polygon) => Geometry::Polygon(rings(polygon)),
            RawGeometry::MultiPolygon(polygons) => {
                Geometry::MultiPolygon(polygons.into_iter().map(rings).collect())
            }
        }
    }
}

impl Geometry {
    /// Polygons as lists of rings; non-areal geometry yields nothing.
    pub fn polygons(&self) -> Vec<&[Vec<[f64; 2]>]> {
        match self {
            Geometry::Polygon(rings) => vec![rings.as_slice()],
            Geometry::MultiPolygon(polygons) => polygons.iter().map(|p| p.as_slice()).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_geometries(geometries: impl IntoIterator<Item = Geometry>) -> Self {
        Self {
            features: geometries
                .into_iter()
                .map(|geometry| Feature {
                    geometry: Some(geometry),
                    properties: serde_json::Value::Null,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn polygons(&self) -> impl Iterator<Item = &[Vec<[f64; 2]>]> {
        self.features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .flat_map(Geometry::polygons)
    }
}

/// An optional map layer. Keeps "not requested", "fetch failed" and
/// "fetched" apart; only a loaded, non-empty collection is drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LayerData {
    #[default]
    Absent,
    Unavailable(String),
    Loaded(FeatureCollection),
}

impl LayerData {
    /// Best-effort read of a GeoJSON file; failures become `Unavailable`.
    pub fn from_geojson_file(path: &Path) -> Self {
        let loaded = std::fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|contents| {
                serde_json::from_str::<FeatureCollection>(&contents).map_err(|err| err.to_string())
            });
        match loaded {
            Ok(collection) => LayerData::Loaded(collection),
            Err(reason) => {
                warn!(path = %path.display(), %reason, "layer unavailable");
                LayerData::Unavailable(reason)
            }
        }
    }

    pub fn features(&self) -> Option<&FeatureCollection> {
        match self {
            LayerData::Loaded(collection) if !collection.is_empty() => Some(collection),
            _ => None,
        }
    }
}

impl From<Option<FeatureCollection>> for LayerData {
    fn from(value: Option<FeatureCollection>) -> Self {
        value.map_or(LayerData::Absent, LayerData::Loaded)
    }
}
