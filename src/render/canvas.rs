//! Bitmap canvas, font registration and PNG/base64 encoding

use crate::error::{AnalyticsError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Drawing area over an in-memory RGB buffer
pub(crate) type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub(crate) const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static TEXT_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Whether chart text can be drawn. The first call registers a font from
/// `FONT_PATH` or a known system location.
pub fn text_available() -> bool {
    *TEXT_AVAILABLE.get_or_init(register_chart_font)
}

fn register_chart_font() -> bool {
    let configured = std::env::var("FONT_PATH").ok().map(PathBuf::from);
    let candidates = configured
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for path in candidates {
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        // The font registry keeps its data for the rest of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!(path = %path.display(), "Registered chart font");
                return true;
            }
            Err(_) => warn!(path = %path.display(), "Unreadable font file, skipping"),
        }
    }

    warn!("No chart font found; charts are rendered without text");
    false
}

pub(crate) fn font(size: u32) -> FontDesc<'static> {
    (FONT_FAMILY, size).into_font()
}

pub(crate) fn render_err<E: std::fmt::Display>(err: E) -> AnalyticsError {
    AnalyticsError::RenderError(err.to_string())
}

/// Draw onto a white `width x height` canvas and return the base64 PNG
pub(crate) fn render_png<F>(width: u32, height: u32, draw: F) -> Result<String>
where
    F: FnOnce(&Area<'_>) -> Result<()>,
{
    let mut buffer = vec![255u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw(&root)?;
        root.present().map_err(render_err)?;
    }
    encode_png(width, height, buffer)
}

/// PNG-encode a raw RGB buffer and wrap it in standard base64
pub(crate) fn encode_png(width: u32, height: u32, rgb: Vec<u8>) -> Result<String> {
    let image = RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        AnalyticsError::RenderError(format!("pixel buffer does not match {width}x{height}"))
    })?;

    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    let bytes = bytes.into_inner();
    debug!(width, height, png_bytes = bytes.len(), "Encoded chart");

    Ok(STANDARD.encode(bytes))
}

/// Plain border around a plotting area, used in place of a labelled mesh
pub(crate) fn draw_frame<CT: CoordTranslate>(area: &DrawingArea<BitMapBackend<'_>, CT>) -> Result<()> {
    let plain = area.strip_coord_spec();
    let (w, h) = plain.dim_in_pixel();
    plain
        .draw(&Rectangle::new(
            [(0, 0), (w as i32 - 1, h as i32 - 1)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)
}

/// Linear blend from white to a dark blue, `t` in `[0, 1]`
pub(crate) fn blues(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |dark: u8| (255.0 - (255.0 - dark as f64) * t).round() as u8;
    RGBColor(mix(8), mix(48), mix(107))
}

/// Series color `i` of a fixed palette
pub(crate) fn series_color(i: usize) -> RGBColor {
    const COLORS: [RGBColor; 8] = [
        RGBColor(31, 119, 180),
        RGBColor(255, 127, 14),
        RGBColor(44, 160, 44),
        RGBColor(214, 39, 40),
        RGBColor(148, 103, 189),
        RGBColor(140, 86, 75),
        RGBColor(227, 119, 194),
        RGBColor(127, 127, 127),
    ];
    COLORS[i % COLORS.len()]
}

/// Image shown in place of charts that could not be produced
pub fn placeholder_image(message: &str) -> Result<String> {
    let text = format!("Error generating charts: {message}");
    render_png(1000, 600, |root| {
        root.fill(&RGBColor(245, 245, 245)).map_err(render_err)?;
        draw_frame(root)?;
        if text_available() {
            let (w, h) = root.dim_in_pixel();
            let clipped: String = text.chars().take(110).collect();
            let style = font(18)
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw(&Text::new(clipped, (w as i32 / 2, h as i32 / 2), style))
                .map_err(render_err)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_signature() {
        let encoded = encode_png(2, 2, vec![0u8; 12]).unwrap();
        let raw = STANDARD.decode(encoded).unwrap();
        assert_eq!(&raw[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_encode_png_size_mismatch() {
        assert!(encode_png(3, 3, vec![0u8; 12]).is_err());
    }

    #[test]
    fn test_placeholder_renders() {
        let image = placeholder_image("something broke").unwrap();
        assert!(!image.is_empty());
    }

    #[test]
    fn test_blues_endpoints() {
        let light = blues(0.0);
        let dark = blues(1.0);
        assert_eq!((light.0, light.1, light.2), (255, 255, 255));
        assert_eq!((dark.0, dark.1, dark.2), (8, 48, 107));
    }
}
