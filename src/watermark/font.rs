//! Font resolution for text watermarks.

use ab_glyph::FontArc;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::OnceLock;

use crate::error::AppError;

/// Display name of the default font asset.
pub const DEFAULT_FONT_NAME: &str = "DejaVu Sans";

/// Well-known install locations of the default font, tried in order.
const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/local/share/fonts/DejaVuSans.ttf",
    "/Library/Fonts/DejaVuSans.ttf",
];

static DEFAULT_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

/// Which font a text watermark asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSelector {
    /// The default asset
    Default,
    /// A font file on disk
    File(PathBuf),
    /// A family name other than the default; cannot be resolved
    Named(String),
}

impl FontSelector {
    /// Pick a selector from the `--font-file` and `--font` values.
    ///
    /// Order: explicit file, a name that looks like a path, the default's
    /// display name, any other name, and finally the default.
    pub fn resolve(font_file: &str, font_name: &str) -> Self {
        let font_file = font_file.trim();
        let font_name = font_name.trim();

        if !font_file.is_empty() {
            return Self::File(PathBuf::from(font_file));
        }
        if font_name.is_empty() {
            return Self::Default;
        }
        if looks_like_path(font_name) {
            return Self::File(PathBuf::from(font_name));
        }
        if font_name.eq_ignore_ascii_case(DEFAULT_FONT_NAME) {
            return Self::Default;
        }
        Self::Named(font_name.to_string())
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Load the selected font.
    pub fn load(&self) -> Result<FontArc, AppError> {
        match self {
            Self::Default => default_font(),
            Self::File(path) => load_font_file(path),
            Self::Named(name) => Err(AppError::config(format!(
                "cannot resolve font name '{}', use --font-file",
                name
            ))),
        }
    }
}

fn looks_like_path(name: &str) -> bool {
    if name.contains(MAIN_SEPARATOR) || name.contains('/') {
        return true;
    }
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "ttf" || ext == "otf" || ext == "ttc"
        })
        .unwrap_or(false)
}

pub fn load_font_file(path: &Path) -> Result<FontArc, AppError> {
    let data = std::fs::read(path).map_err(|e| {
        AppError::config(format!("cannot read font file {}", path.display())).with_source(e)
    })?;
    FontArc::try_from_vec(data).map_err(|e| {
        AppError::config(format!("cannot parse font file {}", path.display())).with_source(e)
    })
}

/// The default font, loaded once per process.
pub fn default_font() -> Result<FontArc, AppError> {
    DEFAULT_FONT
        .get_or_init(|| {
            DEFAULT_FONT_PATHS
                .iter()
                .find_map(|path| load_font_file(Path::new(path)).ok())
        })
        .clone()
        .ok_or_else(|| AppError::config("default font unavailable"))
}

pub fn default_font_available() -> bool {
    default_font().is_ok()
}
