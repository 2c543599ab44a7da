use std::collections::HashMap;
use std::sync::Arc;
use ttf_parser::Face;

/// Advance used per character when no face is available, as a share of the font size.
const FALLBACK_ADVANCE: f32 = 0.6;

/// Raw font face kept for horizontal advance lookups.
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: u16,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl FontFace {
    /// `None` when the bytes do not hold a parsable face at `index`.
    pub fn parse(data: Arc<Vec<u8>>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
        })
    }

    pub fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = Face::parse(&self.data, self.index) else {
            return estimate_width(text, font_size);
        };
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_ADVANCE;
        let mut advances: HashMap<char, f32> = HashMap::new();
        let mut width = 0.0f32;
        for ch in text.chars().filter(|c| *c != '\n') {
            width += *advances.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| advance as f32 * scale)
                    .unwrap_or(fallback)
            });
        }
        width.max(0.0)
    }
}

/// Width of `text` with `face`, or a per-character estimate without one.
pub fn measure_text_width(face: Option<&FontFace>, text: &str, font_size: f32) -> f32 {
    if text.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    match face {
        Some(face) => face.measure_width(text, font_size),
        None => estimate_width(text, font_size),
    }
}

fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().filter(|c| *c != '\n').count() as f32 * font_size * FALLBACK_ADVANCE
}
