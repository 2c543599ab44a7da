use crate::color::Color;
use std::collections::BTreeMap;

/// SVG document under construction. Elements are grouped by z-order; equal
/// z keeps insertion order.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: f32,
    height: f32,
    background: Color,
    defs: String,
    layers: BTreeMap<i32, String>,
    next_id: usize,
}

impl SvgCanvas {
    pub fn new(width: f32, height: f32, background: Color) -> Self {
        Self {
            width,
            height,
            background,
            defs: String::new(),
            layers: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn push(&mut self, z_order: i32, element: &str) {
        self.layers.entry(z_order).or_default().push_str(element);
    }

    pub fn add_def(&mut self, def: &str) {
        self.defs.push_str(def);
    }

    /// Document-unique id for defs (`{prefix}-{n}`).
    pub fn unique_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    pub fn finish(self) -> String {
        let width = self.width;
        let height = self.height;
        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        if !self.defs.is_empty() {
            svg.push_str("<defs>");
            svg.push_str(&self.defs);
            svg.push_str("</defs>");
        }
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\" fill-opacity=\"{}\"/>",
            self.background.to_hex(),
            self.background.opacity()
        ));
        for elements in self.layers.values() {
            svg.push_str(elements);
        }
        svg.push_str("</svg>");
        svg
    }
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_come_out_in_z_order() {
        let mut canvas = SvgCanvas::new(10.0, 20.0, Color::rgb(255, 255, 255));
        canvas.push(11, "<text/>");
        canvas.push(1, "<path id=\"water\"/>");
        canvas.push(1, "<path id=\"lake\"/>");
        canvas.push(-5, "<g/>");
        let svg = canvas.finish();
        let g = svg.find("<g/>").unwrap();
        let water = svg.find("water").unwrap();
        let lake = svg.find("lake").unwrap();
        let text = svg.find("<text/>").unwrap();
        assert!(g < water && water < lake && lake < text);
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn ids_are_unique() {
        let mut canvas = SvgCanvas::new(1.0, 1.0, Color::rgb(0, 0, 0));
        assert_ne!(canvas.unique_id("fade"), canvas.unique_id("fade"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml("A&B <C>"), "A&amp;B &lt;C&gt;");
    }
}
