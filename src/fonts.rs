use crate::error::{PosterError, PosterResult};
use crate::text_metrics::FontFace;
use crate::theme::FontSet;
use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A typographic weight resolved to something usvg can select.
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    /// Value for the SVG `font-family` attribute.
    pub family: String,
    pub weight: u16,
    /// Whether this falls back to a generic family.
    pub generic: bool,
    pub face: Option<FontFace>,
}

/// Fonts for one render, plus the database handed to usvg.
#[derive(Debug, Clone)]
pub struct PosterFonts {
    pub db: Arc<Database>,
    pub bold: ResolvedFont,
    pub light: ResolvedFont,
    pub regular: ResolvedFont,
}

/// Loads the theme's font files; any weight without a file uses
/// `fallback_family`. An unreadable or unparsable file is an error.
pub fn resolve_fonts(set: &FontSet, fallback_family: &str) -> PosterResult<PosterFonts> {
    let mut db = Database::new();
    if set.bold.is_none() || set.light.is_none() || set.regular.is_none() {
        db.load_system_fonts();
    }

    let bold = resolve_slot(&mut db, set.bold.as_deref(), fallback_family, 700)?;
    let light = resolve_slot(&mut db, set.light.as_deref(), fallback_family, 400)?;
    let regular = resolve_slot(&mut db, set.regular.as_deref(), fallback_family, 400)?;

    Ok(PosterFonts {
        db: Arc::new(db),
        bold,
        light,
        regular,
    })
}

fn resolve_slot(
    db: &mut Database,
    path: Option<&Path>,
    fallback_family: &str,
    fallback_weight: u16,
) -> PosterResult<ResolvedFont> {
    match path {
        Some(path) => load_font_file(db, path),
        None => Ok(generic_font(db, fallback_family, fallback_weight)),
    }
}

fn load_font_file(db: &mut Database, path: &Path) -> PosterResult<ResolvedFont> {
    let font_error = |reason: String| PosterError::Font {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = Arc::new(std::fs::read(path).map_err(|err| font_error(err.to_string()))?);
    let ids = db.load_font_source(Source::Binary(bytes.clone()));
    let info = ids
        .first()
        .and_then(|id| db.face(*id))
        .ok_or_else(|| font_error("no font faces found".to_string()))?;
    let family = info
        .families
        .first()
        .map(|(name, _)| name.clone())
        .ok_or_else(|| font_error("font has no family name".to_string()))?;
    debug!(path = %path.display(), %family, weight = info.weight.0, "loaded theme font");
    Ok(ResolvedFont {
        family: format!("'{family}'"),
        weight: info.weight.0,
        generic: false,
        face: FontFace::parse(bytes, info.index),
    })
}

fn generic_font(db: &Database, family: &str, weight: u16) -> ResolvedFont {
    let families = [family_for(family)];
    let query = Query {
        families: &families,
        weight: Weight(weight),
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let face = db.query(&query).and_then(|id| {
        db.with_face_data(id, |data, index| FontFace::parse(Arc::new(data.to_vec()), index))
            .flatten()
    });
    if face.is_none() {
        debug!(%family, "no system face for fallback family; text widths are estimated");
    }
    ResolvedFont {
        family: family.to_string(),
        weight,
        generic: true,
        face,
    }
}

fn family_for(name: &str) -> Family<'_> {
    match name.trim().to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "system-ui" => Family::SansSerif,
        "monospace" | "ui-monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_paths_fall_back_to_generic_family() {
        let fonts = resolve_fonts(&FontSet::default(), "monospace").unwrap();
        assert!(fonts.bold.generic && fonts.light.generic && fonts.regular.generic);
        assert_eq!(fonts.bold.family, "monospace");
        assert_eq!(fonts.bold.weight, 700);
        assert_eq!(fonts.regular.weight, 400);
    }

    #[test]
    fn unreadable_font_file_is_an_error() {
        let set = FontSet {
            bold: Some(PathBuf::from("/nonexistent/Roboto-Bold.ttf")),
            ..FontSet::default()
        };
        let err = resolve_fonts(&set, "monospace").unwrap_err();
        assert!(matches!(err, PosterError::Font { .. }));
    }

    #[test]
    fn non_font_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("city_poster_not_a_font_{}.ttf", std::process::id()));
        std::fs::write(&path, b"definitely not a font").unwrap();
        let set = FontSet {
            regular: Some(path.clone()),
            ..FontSet::default()
        };
        assert!(matches!(
            resolve_fonts(&set, "monospace"),
            Err(PosterError::Font { .. })
        ));
        std::fs::remove_file(&path).ok();
    }
}
