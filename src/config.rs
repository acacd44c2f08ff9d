use std::path::PathBuf;

use crate::render;

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Primary font for name overlays. If the file is missing or
    /// invalid the embedded fallback face is used instead.
    pub font_file: PathBuf,
    /// Fixed template URL for the remote variant of the form.
    pub remote_template_url: String,
    /// Default y position when the remote template is used.
    pub remote_y_position: u32,
    /// Bound on how many finished batches stay downloadable at once.
    pub max_batches: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse()
            .unwrap_or(5001);

        let font_file = PathBuf::from(
            std::env::var("FONT_FILE")
                .unwrap_or_else(|_| "assets/fonts/OpenSans-Regular.ttf".to_string()),
        );

        let remote_template_url = std::env::var("REMOTE_TEMPLATE_URL").unwrap_or_else(|_| {
            "https://raw.githubusercontent.com/certificado/templates/main/certificate.png"
                .to_string()
        });

        let remote_y_position = std::env::var("REMOTE_Y_POSITION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(render::REMOTE_DEFAULT_Y);

        let max_batches = std::env::var("MAX_BATCHES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(32);

        Ok(Self {
            host,
            port,
            font_file,
            remote_template_url,
            remote_y_position,
            max_batches,
        })
    }
}
