use crate::canvas::SvgCanvas;
use crate::color::Color;

/// Share of the canvas height covered by each fade.
pub const DEFAULT_GRADIENT_FRACTION: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientLocation {
    Top,
    Bottom,
}

pub fn draw_gradient(canvas: &mut SvgCanvas, color: Color, location: GradientLocation, z_order: i32) {
    draw_gradient_span(canvas, color, location, z_order, DEFAULT_GRADIENT_FRACTION);
}

/// Vertical fade, opaque at the canvas edge and transparent towards the
/// middle, over `fraction` of the height.
pub fn draw_gradient_span(
    canvas: &mut SvgCanvas,
    color: Color,
    location: GradientLocation,
    z_order: i32,
    fraction: f32,
) {
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction <= 0.0 {
        return;
    }
    let width = canvas.width();
    let band = canvas.height() * fraction;
    let opacity = color.opacity();
    let (y, start_opacity, end_opacity) = match location {
        GradientLocation::Top => (0.0, opacity, 0.0),
        GradientLocation::Bottom => (canvas.height() - band, 0.0, opacity),
    };

    let id = canvas.unique_id("fade");
    let hex = color.to_hex();
    canvas.add_def(&format!(
        "<linearGradient id=\"{id}\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\"><stop offset=\"0\" stop-color=\"{hex}\" stop-opacity=\"{start_opacity}\"/><stop offset=\"1\" stop-color=\"{hex}\" stop-opacity=\"{end_opacity}\"/></linearGradient>",
    ));
    canvas.push(
        z_order,
        &format!("<rect x=\"0\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{band:.2}\" fill=\"url(#{id})\"/>"),
    );
}
