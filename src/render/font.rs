use std::path::Path;

use rusttype::Font;
use tracing::warn;

// DejaVu Sans ships with the binary so a missing primary font never
// blocks certificate generation, only changes the glyph metrics.
static FALLBACK_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Which face a resolution attempt actually produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontSource {
    Primary,
    Fallback,
}

/// Two-step font resolution: the configured TTF first, then the
/// embedded fallback. Primary failure is a warning, never an error.
pub fn resolve_font(path: impl AsRef<Path>) -> (Font<'static>, FontSource) {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(data) => match Font::try_from_vec(data) {
            Some(font) => return (font, FontSource::Primary),
            None => warn!("font file {} is not a valid TTF, using fallback", path.display()),
        },
        Err(e) => warn!("font file {} unreadable ({}), using fallback", path.display(), e),
    }

    let font = Font::try_from_bytes(FALLBACK_FONT).expect("embedded fallback font is valid");
    (font, FontSource::Fallback)
}
