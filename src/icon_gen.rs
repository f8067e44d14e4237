use crate::font::{self, FontResolution};
use anyhow::{ensure, Context, Result};
use image::{GrayImage, ImageOutputFormat, Luma, Rgba, RgbaImage};
use std::{fs::File, io::BufWriter, path::Path};

/// Icon variants the extension manifest expects, smallest first.
pub const ICON_SIZES: [u32; 3] = [16, 48, 128];

/// Gradient endpoints: top row renders exactly `GRADIENT_TOP`, bottom row
/// exactly `GRADIENT_BOTTOM`.
pub const GRADIENT_TOP: [u8; 3] = [102, 126, 234];
pub const GRADIENT_BOTTOM: [u8; 3] = [118, 75, 162];

/// Fill of the circular badge drawn on the 48px and 128px variants.
pub const BADGE_COLOR: Rgba<u8> = Rgba([76, 175, 80, 255]);

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GLYPH_TEXT: &str = "M";
const BADGE_TEXT: &str = "33";

/// Render and save every icon size into `out_dir`.
///
/// The output directory check is the only fatal failure: each size after
/// that renders and saves independently, and a failure is reported and
/// skipped rather than aborting the batch.
pub fn generate_icons(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).with_context(|| {
        format!(
            "Can't create output directory {} (pass --output to choose a writable location)",
            out_dir.display()
        )
    })?;

    let font = font::resolve_font();
    if !font.is_preferred() {
        println!("No system font found, falling back to built-in glyphs");
    }

    let mut generated = 0usize;
    for size in ICON_SIZES {
        let filename = format!("icon-{size}.png");
        match render_and_save(size, &font, &out_dir.join(&filename)) {
            Ok(()) => {
                println!("✓ Generated {filename}");
                generated += 1;
            }
            Err(err) => println!("✗ Failed to generate {filename}: {err:#}"),
        }
    }

    println!(
        "Generated {generated}/{} icons in {}",
        ICON_SIZES.len(),
        out_dir.display()
    );
    Ok(())
}

fn render_and_save(size: u32, font: &FontResolution, path: &Path) -> Result<()> {
    let icon = render_icon(size, font)?;
    save_png(&icon, path)
}

/// Render one icon variant: vertical gradient, rounded-rectangle alpha mask,
/// centered "M", and (at 48px and above) the numbered badge.
pub fn render_icon(size: u32, font: &FontResolution) -> Result<RgbaImage> {
    ensure!(size > 0, "icon size must be positive");

    let mut canvas = RgbaImage::new(size, size);
    fill_vertical_gradient(&mut canvas, GRADIENT_TOP, GRADIENT_BOTTOM);

    let corner_radius = (size as f32 * 0.2).round();
    let mask = rounded_rect_mask(size, corner_radius);
    apply_alpha_mask(&mut canvas, &mask);

    let center = (size as i32 / 2, size as i32 / 2);
    font::draw_text_centered(&mut canvas, font, GLYPH_TEXT, center, size as f32 * 0.6, WHITE);

    if size >= 48 {
        draw_badge(&mut canvas, size, font);
    }

    Ok(canvas)
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

fn fill_vertical_gradient(canvas: &mut RgbaImage, top: [u8; 3], bottom: [u8; 3]) {
    let (width, height) = canvas.dimensions();
    // Interpolate over the last row index so both endpoints land exactly.
    let span = height.saturating_sub(1).max(1) as f32;
    for y in 0..height {
        let t = y as f32 / span;
        let row_color = Rgba([
            lerp(top[0], bottom[0], t),
            lerp(top[1], bottom[1], t),
            lerp(top[2], bottom[2], t),
            255,
        ]);
        for x in 0..width {
            canvas.put_pixel(x, y, row_color);
        }
    }
}

/// Coverage map for a rounded rectangle spanning the whole canvas: 255
/// inside, 0 outside, with a 1px anti-aliased ramp along the boundary.
fn rounded_rect_mask(size: u32, radius: f32) -> GrayImage {
    let mut mask = GrayImage::new(size, size);
    let lo = radius;
    let hi = size as f32 - radius;
    for y in 0..size {
        for x in 0..size {
            // Distance from the pixel center to the inset rectangle; the
            // rounded boundary sits `radius` away from it.
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let dx = px - px.clamp(lo, hi);
            let dy = py - py.clamp(lo, hi);
            let distance = (dx * dx + dy * dy).sqrt();

            // 1px ramp centered on the boundary, so pixel centers half a
            // pixel inside a flat edge stay fully opaque.
            let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
            mask.put_pixel(x, y, Luma([(coverage * 255.0).round() as u8]));
        }
    }
    mask
}

fn apply_alpha_mask(canvas: &mut RgbaImage, mask: &GrayImage) {
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let m = mask.get_pixel(x, y)[0] as u32;
        pixel[3] = ((pixel[3] as u32 * m + 127) / 255) as u8;
    }
}

fn draw_badge(canvas: &mut RgbaImage, size: u32, font: &FontResolution) {
    let cx = size as f32 * 0.75;
    let cy = size as f32 * 0.25;
    let radius = size as f32 * 0.3 / 2.0;

    let (width, height) = canvas.dimensions();
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let distance = (dx * dx + dy * dy).sqrt();

            if distance > radius {
                continue;
            }
            let coverage = if distance > radius - 1.0 {
                radius - distance
            } else {
                1.0
            };
            font::blend_pixel(canvas.get_pixel_mut(x, y), BADGE_COLOR, coverage);
        }
    }

    font::draw_text_centered(
        canvas,
        font,
        BADGE_TEXT,
        (cx as i32, cy as i32),
        size as f32 * 0.12,
        WHITE,
    );
}

fn save_png(icon: &RgbaImage, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    icon.write_to(&mut writer, ImageOutputFormat::Png)
        .context("Failed to write PNG")?;
    Ok(())
}
