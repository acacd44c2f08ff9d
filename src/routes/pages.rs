use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
};
use image::Rgba;
use std::sync::Arc;
use tera::Context;

use crate::render::{self, Layout, Template};
use crate::state::AppState;

pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    render_form(&state, None)
}

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: axum::extract::Multipart,
) -> axum::response::Response {
    let mut template_data: Option<Vec<u8>> = None;
    let mut source = String::from("upload");
    let mut names_input = String::new();
    let mut y_position: Option<u32> = None;
    let mut font_size: Option<u32> = None;
    let mut font_color = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "template" => {
                if let Ok(data) = field.bytes().await {
                    if !data.is_empty() {
                        template_data = Some(data.to_vec());
                    }
                }
            }
            "source" => {
                if let Ok(text) = field.text().await {
                    source = text;
                }
            }
            "names" => {
                if let Ok(text) = field.text().await {
                    names_input = text;
                }
            }
            "y_position" => {
                if let Ok(text) = field.text().await {
                    y_position = text.trim().parse().ok();
                }
            }
            "font_size" => {
                if let Ok(text) = field.text().await {
                    font_size = text.trim().parse().ok();
                }
            }
            "font_color" => {
                if let Ok(text) = field.text().await {
                    font_color = text;
                }
            }
            _ => {}
        }
    }

    let names = render::parse_names(&names_input);
    if names.is_empty() {
        return render_form(&state, Some("Enter at least one name to generate certificates."))
            .into_response();
    }

    // The remote variant pins the font size and uses its own default
    // y position; the upload variant takes both from the form.
    let remote = source == "remote";
    let template = if remote {
        Template::fetch(&state.http, &state.config.remote_template_url).await
    } else {
        match template_data {
            Some(data) => Template::from_bytes(&data),
            None => {
                return render_form(&state, Some("Upload a certificate template to continue."))
                    .into_response()
            }
        }
    };

    let template = match template {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("template load failed: {}", e);
            return render_form(&state, Some(&e.to_string())).into_response();
        }
    };
    tracing::info!("template decoded: {}x{}", template.width(), template.height());

    let y = y_position.unwrap_or(if remote {
        state.config.remote_y_position
    } else {
        render::DEFAULT_Y
    });
    let size = if remote {
        render::DEFAULT_FONT_SIZE
    } else {
        font_size.unwrap_or(render::DEFAULT_FONT_SIZE)
    };
    // Falls back to the default orange on an unparseable color value.
    let color = render::parse_color(&font_color).unwrap_or(Rgba([255, 165, 0, 255]));

    let layout = Layout::new(y, size, color);
    let (font, font_source) = render::resolve_font(&state.config.font_file);
    tracing::info!(
        "rendering {} certificate(s), font source {:?}",
        names.len(),
        font_source
    );

    let artifacts = match render::render_batch(&template, &names, &layout, &font) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("batch render failed: {}", e);
            return render_form(&state, Some(&e.to_string())).into_response();
        }
    };

    let bundle = match render::bundle(&artifacts) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("bundle build failed: {}", e);
            return render_form(&state, Some(&e.to_string())).into_response();
        }
    };

    let batch_id = state.batches.insert(artifacts, bundle);
    Redirect::to(&format!("/results/{}", batch_id)).into_response()
}

pub async fn view_results(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<String>,
) -> axum::response::Response {
    let filenames = match state.batches.filenames(&batch_id) {
        Some(f) => f,
        None => return Redirect::to("/").into_response(),
    };
    let created_at = state
        .batches
        .created_at(&batch_id)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default();

    let mut ctx = Context::new();
    ctx.insert("batch_id", &batch_id);
    ctx.insert("filenames", &filenames);
    ctx.insert("count", &filenames.len());
    ctx.insert("created_at", &created_at);
    render_page("results.html", ctx).into_response()
}

fn render_form(state: &AppState, error: Option<&str>) -> Html<String> {
    let mut ctx = Context::new();
    ctx.insert("default_y", &render::DEFAULT_Y);
    ctx.insert("default_font_size", &render::DEFAULT_FONT_SIZE);
    ctx.insert("default_color", render::DEFAULT_COLOR);
    ctx.insert("remote_template_url", &state.config.remote_template_url);
    if let Some(error) = error {
        ctx.insert("error", error);
    }
    render_page("index.html", ctx)
}

fn render_page(name: &str, ctx: Context) -> Html<String> {
    let tera = crate::templates::get_tera();
    let rendered = tera
        .render(name, &ctx)
        .unwrap_or_else(|_| format!("Template error: {}", name));
    Html(rendered)
}
