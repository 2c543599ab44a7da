use crate::error::PosterResult;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const THUMBS_DIR: &str = "thumbs";
pub const THUMB_PREFIX: &str = "thumb_";
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 300;

/// `"New York"`, `"noir"` → `"new_york_noir.png"`.
pub fn generate_output_filename(city: &str, theme: &str) -> String {
    format!("{}_{}.png", slug(city), slug(theme))
}

/// Download name carrying a caller-supplied timestamp, e.g. `Berlin_noir_1760000000.png`.
pub fn timestamped_filename(city: &str, theme: &str, unix_secs: u64) -> String {
    let city: String = city
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{city}_{theme}_{unix_secs}.png")
}

fn slug(input: &str) -> String {
    let mut out = String::new();
    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "poster".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Downsampled previews cached in a `thumbs/` directory beside each source
/// image. Entries are keyed by source file name and never refreshed on their
/// own; call [`ThumbnailCache::invalidate`] after replacing a source.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    max_edge: u32,
    generated: usize,
}

impl Default for ThumbnailCache {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_SIZE)
    }
}

impl ThumbnailCache {
    pub fn new(max_edge: u32) -> Self {
        Self {
            max_edge: max_edge.max(1),
            generated: 0,
        }
    }

    /// Thumbnails written by this cache so far.
    pub fn generated(&self) -> usize {
        self.generated
    }

    pub fn thumbnail_path(source: &Path) -> PathBuf {
        let folder = source.parent().unwrap_or_else(|| Path::new("."));
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        folder.join(THUMBS_DIR).join(format!("{THUMB_PREFIX}{name}"))
    }

    pub fn get_or_create(&mut self, source: &Path) -> PosterResult<PathBuf> {
        let thumb_path = Self::thumbnail_path(source);
        if thumb_path.is_file() {
            debug!(path = %thumb_path.display(), "thumbnail cache hit");
            return Ok(thumb_path);
        }
        if let Some(dir) = thumb_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let image = image::open(source)?;
        // Only ever shrink; small sources are stored as they are.
        let image = if image.width() > self.max_edge || image.height() > self.max_edge {
            image.thumbnail(self.max_edge, self.max_edge)
        } else {
            image
        };
        image.save_with_format(&thumb_path, image::ImageFormat::Png)?;
        self.generated += 1;
        info!(source = %source.display(), path = %thumb_path.display(), "thumbnail created");
        Ok(thumb_path)
    }

    /// Drops the cached thumbnail for `source`; returns whether one existed.
    pub fn invalidate(&self, source: &Path) -> PosterResult<bool> {
        let thumb_path = Self::thumbnail_path(source);
        match std::fs::remove_file(&thumb_path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Ensures a thumbnail for every PNG directly inside `dir`.
    pub fn fill_directory(&mut self, dir: &Path) -> PosterResult<Vec<PathBuf>> {
        let mut sources: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        sources.sort();
        sources
            .iter()
            .map(|source| self.get_or_create(source))
            .collect()
    }
}

pub fn get_or_create_thumbnail(source: &Path) -> PosterResult<PathBuf> {
    ThumbnailCache::default().get_or_create(source)
}

/// First file (by name) in `thumb_dir` whose name contains `theme`, ignoring case.
pub fn find_thumbnail(thumb_dir: &Path, theme: &str) -> Option<PathBuf> {
    let needle = theme.to_lowercase();
    let mut files: Vec<PathBuf> = std::fs::read_dir(thumb_dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files.into_iter().find(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}
