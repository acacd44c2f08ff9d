// Certificate rendering core: template decoding, per-name text overlay,
// PNG encoding and zip bundling. Pure with respect to the web layer.
pub mod font;

use std::io::{Cursor, Write};

use image::{ImageBuffer, ImageFormat, Rgba};
use rusttype::{point, Font, Scale};
use thiserror::Error;

pub use font::{resolve_font, FontSource};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Certificate template unavailable: {0}")]
    TemplateUnavailable(String),

    #[error("Certificate rendering failed: {0}")]
    Render(String),
}

/// The base certificate image. Immutable once loaded; every render
/// works on a private copy.
#[derive(Clone, Debug)]
pub struct Template {
    image: RgbaImage,
}

impl Template {
    /// Decode an uploaded payload (PNG or JPEG) into an RGBA bitmap.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RenderError> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| RenderError::TemplateUnavailable(e.to_string()))?;
        Ok(Self {
            image: decoded.to_rgba8(),
        })
    }

    /// Fetch the fixed remote template. A non-success status and a
    /// transport error are treated the same as a decode failure.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, RenderError> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| RenderError::TemplateUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RenderError::TemplateUnavailable(format!(
                "remote template returned HTTP {}",
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| RenderError::TemplateUnavailable(e.to_string()))?;
        Self::from_bytes(&data)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Placement parameters for one batch, independent of the names.
#[derive(Clone, Debug)]
pub struct Layout {
    /// Top edge of the drawn text. Not clamped: values at or past the
    /// image height render partially or fully off-canvas.
    pub y_position: u32,
    pub font_size: u32,
    pub color: Rgba<u8>,
}

pub const MIN_FONT_SIZE: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 150;
pub const DEFAULT_FONT_SIZE: u32 = 90;
pub const DEFAULT_COLOR: &str = "#FFA500";
pub const DEFAULT_Y: u32 = 630;
pub const REMOTE_DEFAULT_Y: u32 = 640;

impl Layout {
    pub fn new(y_position: u32, font_size: u32, color: Rgba<u8>) -> Self {
        Self {
            y_position,
            font_size: font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            color,
        }
    }
}

/// One rendered output image for a single name.
#[derive(Clone)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Split a comma-separated input into trimmed, non-empty names.
pub fn parse_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"Jay Shah"` -> `"Jay_Shah_certificate.png"`.
pub fn artifact_filename(name: &str) -> String {
    format!("{}_certificate.png", name.replace(' ', "_"))
}

/// Names that normalize to the same filename get a numeric suffix so
/// the bundle never carries colliding entries:
/// `Jay_Shah_certificate.png`, `Jay_Shah_certificate_2.png`, ...
fn disambiguate(filename: String, seen: &mut std::collections::HashMap<String, u32>) -> String {
    let count = seen.entry(filename.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        filename
    } else {
        match filename.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}_{count}.{ext}"),
            None => format!("{filename}_{count}"),
        }
    }
}

/// Parse a `#RRGGBB` hex value or one of a few named colors.
pub fn parse_color(input: &str) -> Option<Rgba<u8>> {
    let trimmed = input.trim();
    if let Some(hexpart) = trimmed.strip_prefix('#') {
        if hexpart.len() != 6 {
            return None;
        }
        let b = hex::decode(hexpart).ok()?;
        return Some(Rgba([b[0], b[1], b[2], 255]));
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "black" => Some(Rgba([0, 0, 0, 255])),
        "white" => Some(Rgba([255, 255, 255, 255])),
        "red" => Some(Rgba([255, 0, 0, 255])),
        "green" => Some(Rgba([0, 128, 0, 255])),
        "blue" => Some(Rgba([0, 0, 255, 255])),
        "orange" => Some(Rgba([255, 165, 0, 255])),
        "gold" => Some(Rgba([255, 215, 0, 255])),
        _ => None,
    }
}

/// Pixel width of `text` at the given font and size, from the glyph
/// bounding boxes. Whitespace-only text has zero measured width.
pub fn text_width(font: &Font<'static>, px: f32, text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let mut min_x = i32::MAX;
    let mut max_x = i32::MIN;
    for glyph in font.layout(text, scale, point(0.0, v_metrics.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            min_x = min_x.min(bb.min.x);
            max_x = max_x.max(bb.max.x);
        }
    }
    if max_x < min_x {
        return 0;
    }
    (max_x - min_x) as u32
}

/// Horizontally centered x offset for a text of the given width.
/// Floor division, so text wider than the image rounds toward the
/// left rather than toward zero.
pub fn centered_x(image_width: u32, text_width: u32) -> i32 {
    (image_width as i32 - text_width as i32).div_euclid(2)
}

fn draw_text(img: &mut RgbaImage, font: &Font<'static>, px: f32, x: i32, y: i32, color: Rgba<u8>, text: &str) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let baseline = y as f32 + v_metrics.ascent;

    for glyph in font.layout(text, scale, point(x as f32, baseline)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= img.width() || py >= img.height() {
                    return;
                }
                let a = (v * color.0[3] as f32 / 255.0).clamp(0.0, 1.0);
                if a <= 0.0 {
                    return;
                }
                let dst = img.get_pixel_mut(px, py);
                let inv = 1.0 - a;
                dst.0[0] = (color.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
                dst.0[1] = (color.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
                dst.0[2] = (color.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
                dst.0[3] = dst.0[3].max((a * 255.0) as u8);
            });
        }
    }
}

/// Render one certificate per name, in input order. Fail-fast: an
/// encode failure for any name aborts the whole batch with no partial
/// output.
pub fn render_batch(
    template: &Template,
    names: &[String],
    layout: &Layout,
    font: &Font<'static>,
) -> Result<Vec<Artifact>, RenderError> {
    let px = layout.font_size as f32;
    let mut artifacts = Vec::with_capacity(names.len());
    let mut seen = std::collections::HashMap::new();

    for name in names {
        let mut cert = template.image.clone();
        let width = text_width(font, px, name);
        let x = centered_x(cert.width(), width);
        draw_text(&mut cert, font, px, x, layout.y_position as i32, layout.color, name);

        let mut bytes = Vec::new();
        cert.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RenderError::Render(e.to_string()))?;

        artifacts.push(Artifact {
            filename: disambiguate(artifact_filename(name), &mut seen),
            bytes,
        });
    }

    Ok(artifacts)
}

/// Pack every artifact into a single zip payload, in input order.
pub fn bundle(artifacts: &[Artifact]) -> Result<Vec<u8>, RenderError> {
    let mut zip_data = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut zip_data));
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);

        for artifact in artifacts {
            zip.start_file(artifact.filename.as_str(), options)
                .map_err(|e| RenderError::Render(e.to_string()))?;
            zip.write_all(&artifact.bytes)
                .map_err(|e| RenderError::Render(e.to_string()))?;
        }
        zip.finish().map_err(|e| RenderError::Render(e.to_string()))?;
    }
    Ok(zip_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn test_template(width: u32, height: u32) -> Template {
        let img: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        Template::from_bytes(&bytes).unwrap()
    }

    fn test_font() -> Font<'static> {
        let (font, source) = resolve_font("definitely/missing.ttf");
        assert_eq!(source, FontSource::Fallback);
        font
    }

    fn test_layout() -> Layout {
        Layout::new(630, DEFAULT_FONT_SIZE, parse_color(DEFAULT_COLOR).unwrap())
    }

    #[test]
    fn parse_names_drops_empty_entries() {
        assert_eq!(parse_names("Alice, , Bob"), vec!["Alice", "Bob"]);
        assert_eq!(parse_names("  "), Vec::<String>::new());
        assert_eq!(parse_names("Jay Shah,Surani Sujal"), vec!["Jay Shah", "Surani Sujal"]);
    }

    #[test]
    fn artifact_filename_replaces_spaces() {
        assert_eq!(artifact_filename("Jay Shah"), "Jay_Shah_certificate.png");
        assert_eq!(artifact_filename("Bob"), "Bob_certificate.png");
    }

    #[test]
    fn parse_color_hex_and_named() {
        assert_eq!(parse_color("#FFA500"), Some(Rgba([255, 165, 0, 255])));
        assert_eq!(parse_color("orange"), Some(Rgba([255, 165, 0, 255])));
        assert_eq!(parse_color("#fff"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn corrupt_template_is_unavailable() {
        let err = Template::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, RenderError::TemplateUnavailable(_)));
    }

    #[test]
    fn one_artifact_per_name_in_order() {
        let template = test_template(800, 600);
        let names = parse_names("Alice, Bob, Carol");
        let artifacts = render_batch(&template, &names, &test_layout(), &test_font()).unwrap();

        assert_eq!(artifacts.len(), 3);
        assert_eq!(artifacts[0].filename, "Alice_certificate.png");
        assert_eq!(artifacts[1].filename, "Bob_certificate.png");
        assert_eq!(artifacts[2].filename, "Carol_certificate.png");
    }

    #[test]
    fn artifacts_decode_as_png_with_template_dimensions() {
        let template = test_template(640, 480);
        let names = vec!["Alice".to_string()];
        let artifacts = render_batch(&template, &names, &test_layout(), &test_font()).unwrap();

        let decoded = image::load_from_memory(&artifacts[0].bytes).unwrap();
        assert_eq!(decoded.width(), 640);
        assert_eq!(decoded.height(), 480);
    }

    #[test]
    fn centering_matches_measured_width() {
        let font = test_font();
        let width = text_width(&font, 90.0, "Alice");
        assert!(width > 0);
        assert_eq!(centered_x(800, width), (800 - width as i32).div_euclid(2));
        // Text wider than the image centers to a negative offset.
        assert!(centered_x(10, width) < 0);
    }

    #[test]
    fn centering_uses_floor_division() {
        assert_eq!(centered_x(100, 40), 30);
        assert_eq!(centered_x(100, 41), 29);
        // Odd negative difference floors toward the left: (10 - 15) / 2 = -3.
        assert_eq!(centered_x(10, 15), -3);
        assert_eq!(centered_x(10, 11), -1);
    }

    #[test]
    fn rendering_is_idempotent() {
        let template = test_template(400, 300);
        let names = vec!["Alice".to_string()];
        let layout = test_layout();
        let font = test_font();

        let first = render_batch(&template, &names, &layout, &font).unwrap();
        let second = render_batch(&template, &names, &layout, &font).unwrap();
        assert_eq!(first[0].bytes, second[0].bytes);
    }

    #[test]
    fn render_does_not_mutate_template() {
        let template = test_template(400, 300);
        let names = vec!["Alice".to_string()];
        let layout = Layout::new(100, 90, parse_color("black").unwrap());
        let font = test_font();

        render_batch(&template, &names, &layout, &font).unwrap();
        // A second batch against the same template starts from a clean copy.
        let again = render_batch(&template, &names, &layout, &font).unwrap();
        let reference = render_batch(&test_template(400, 300), &names, &layout, &font).unwrap();
        assert_eq!(again[0].bytes, reference[0].bytes);
    }

    #[test]
    fn off_canvas_y_still_produces_artifacts() {
        let template = test_template(400, 300);
        let names = vec!["Alice".to_string()];
        let layout = Layout::new(5000, 90, parse_color("black").unwrap());
        let artifacts = render_batch(&template, &names, &layout, &test_font()).unwrap();
        assert_eq!(artifacts.len(), 1);
    }

    #[test]
    fn bundle_round_trips_artifacts() {
        let template = test_template(400, 300);
        let names = parse_names("Alice, Bob");
        let artifacts = render_batch(&template, &names, &test_layout(), &test_font()).unwrap();
        let zip_bytes = bundle(&artifacts).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        for artifact in &artifacts {
            let mut entry = archive.by_name(&artifact.filename).unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            assert_eq!(content, artifact.bytes);
        }
    }

    #[test]
    fn duplicate_names_get_distinct_filenames() {
        let template = test_template(400, 300);
        let names = vec![
            "Jay Shah".to_string(),
            "Jay_Shah".to_string(),
            "Jay Shah".to_string(),
        ];
        let artifacts = render_batch(&template, &names, &test_layout(), &test_font()).unwrap();
        assert_eq!(artifacts[0].filename, "Jay_Shah_certificate.png");
        assert_eq!(artifacts[1].filename, "Jay_Shah_certificate_2.png");
        assert_eq!(artifacts[2].filename, "Jay_Shah_certificate_3.png");

        let zip_bytes = bundle(&artifacts).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 3);
    }
}
