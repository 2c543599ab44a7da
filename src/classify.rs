use crate::ir::{EdgeKey, RoadEdge, RoadGraph};
use crate::theme::Theme;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadClass {
    Motorway,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Default,
}

impl RoadClass {
    /// Paint order, minor roads first so major roads stay on top.
    pub const DRAW_ORDER: [RoadClass; 6] = [
        RoadClass::Default,
        RoadClass::Residential,
        RoadClass::Tertiary,
        RoadClass::Secondary,
        RoadClass::Primary,
        RoadClass::Motorway,
    ];

    pub fn from_highway(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("motorway" | "motorway_link") => RoadClass::Motorway,
            Some("trunk" | "trunk_link" | "primary" | "primary_link") => RoadClass::Primary,
            Some("secondary" | "secondary_link") => RoadClass::Secondary,
            Some("tertiary" | "tertiary_link") => RoadClass::Tertiary,
            Some("residential" | "living_street") => RoadClass::Residential,
            _ => RoadClass::Default,
        }
    }

    /// Stroke width in points.
    pub fn width(self) -> f32 {
        match self {
            RoadClass::Motorway => 1.2,
            RoadClass::Primary => 1.0,
            RoadClass::Secondary => 0.8,
            RoadClass::Tertiary => 0.6,
            RoadClass::Residential | RoadClass::Default => 0.4,
        }
    }

    pub fn color(self, theme: &Theme) -> &str {
        let roads = &theme.roads;
        match self {
            RoadClass::Motorway => &roads.road_motorway,
            RoadClass::Primary => &roads.road_primary,
            RoadClass::Secondary => &roads.road_secondary,
            RoadClass::Tertiary => &roads.road_tertiary,
            RoadClass::Residential => &roads.road_residential,
            RoadClass::Default => &roads.road_default,
        }
    }

    /// Theme field holding this class's color.
    pub fn color_field(self) -> &'static str {
        match self {
            RoadClass::Motorway => "road_motorway",
            RoadClass::Primary => "road_primary",
            RoadClass::Secondary => "road_secondary",
            RoadClass::Tertiary => "road_tertiary",
            RoadClass::Residential => "road_residential",
            RoadClass::Default => "road_default",
        }
    }
}

pub fn classify_edge(edge: &RoadEdge) -> RoadClass {
    RoadClass::from_highway(edge.highway())
}

pub fn edge_colors(graph: &RoadGraph, theme: &Theme) -> BTreeMap<EdgeKey, String> {
    graph
        .edges
        .iter()
        .map(|edge| (edge.edge_key(), classify_edge(edge).color(theme).to_string()))
        .collect()
}

pub fn edge_widths(graph: &RoadGraph) -> BTreeMap<EdgeKey, f32> {
    graph
        .edges
        .iter()
        .map(|edge| (edge.edge_key(), classify_edge(edge).width()))
        .collect()
}
