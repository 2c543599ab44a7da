use std::path::PathBuf;

pub type PosterResult<T> = Result<T, PosterError>;

#[derive(thiserror::Error, Debug)]
pub enum PosterError {
    #[error("theme not found: {theme}")]
    NotFound { theme: String },

    #[error("geocoding error: {0}")]
    Geocoding(String),

    #[error("invalid color for `{field}`: {value:?}")]
    InvalidColor { field: String, value: String },

    #[error("font error ({}): {reason}", .path.display())]
    Font { path: PathBuf, reason: String },

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl PosterError {
    pub fn not_found(theme: impl Into<String>) -> Self {
        Self::NotFound {
            theme: theme.into(),
        }
    }

    pub fn geocoding(msg: impl Into<String>) -> Self {
        Self::Geocoding(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_missing_theme() {
        let err = PosterError::not_found("nonexistent");
        assert_eq!(err.to_string(), "theme not found: nonexistent");
    }

    #[test]
    fn io_errors_convert() {
        let err: PosterError = std::io::Error::other("boom").into();
        assert!(matches!(err, PosterError::Io(_)));
        assert!(err.to_string().contains("boom"));
    }
}
