//! Local equirectangular framing of geographic coordinates onto the poster canvas.

use crate::ir::{Point, RoadGraph};

const METERS_PER_DEG_LAT: f64 = 110_540.0;
const METERS_PER_DEG_LON: f64 = 111_320.0;
const BBOX_MARGIN: f64 = 0.02;

/// Maps `[lon, lat]` to canvas coordinates (points, y down). The map is
/// scaled to cover the whole canvas and centered on the poster point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    center: Point,
    cos_lat: f64,
    scale: f64,
    canvas_width: f64,
    canvas_height: f64,
}

impl Frame {
    /// Frame showing ±`radius_m` around `center`.
    pub fn around(center: Point, radius_m: f64, canvas_width: f32, canvas_height: f32) -> Self {
        let canvas_width = canvas_width as f64;
        let canvas_height = canvas_height as f64;
        let span = 2.0 * radius_m.max(1.0);
        Self {
            center,
            cos_lat: center.lat.to_radians().cos().max(1e-6),
            scale: (canvas_width / span).max(canvas_height / span),
            canvas_width,
            canvas_height,
        }
    }

    /// Square frame enclosing every node, falling back to `default_radius_m`
    /// when the graph has no usable nodes.
    pub fn for_graph(
        graph: &RoadGraph,
        center: Point,
        default_radius_m: f64,
        canvas_width: f32,
        canvas_height: f32,
    ) -> Self {
        let cos_lat = center.lat.to_radians().cos().max(1e-6);
        let mut half_x = 0.0f64;
        let mut half_y = 0.0f64;
        for node in &graph.nodes {
            half_x = half_x.max(((node.lon - center.lon) * METERS_PER_DEG_LON * cos_lat).abs());
            half_y = half_y.max(((node.lat - center.lat) * METERS_PER_DEG_LAT).abs());
        }
        if half_x <= 0.0 && half_y <= 0.0 {
            return Self::around(center, default_radius_m, canvas_width, canvas_height);
        }
        let half = half_x.max(half_y).max(1.0) * (1.0 + BBOX_MARGIN);
        Self::around(center, half, canvas_width, canvas_height)
    }

    /// Canvas points per metre.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn project(&self, lon_lat: [f64; 2]) -> (f64, f64) {
        let x_m = (lon_lat[0] - self.center.lon) * METERS_PER_DEG_LON * self.cos_lat;
        let y_m = (lon_lat[1] - self.center.lat) * METERS_PER_DEG_LAT;
        (
            self.canvas_width / 2.0 + x_m * self.scale,
            self.canvas_height / 2.0 - y_m * self.scale,
        )
    }
}
