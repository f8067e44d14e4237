use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::fs;

/// Well-known bold TrueType fonts, probed in order. The first file that
/// reads and parses wins.
const PREFERRED_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Which font tier the renderer ended up with.
///
/// Font lookup failure is not an error: when no system font can be loaded
/// the renderer degrades to the built-in pixel glyphs.
pub enum FontResolution {
    /// A bold TrueType font found on the system.
    Preferred(Font<'static>),
    /// Built-in 5×7 pixel glyphs.
    Builtin,
}

impl FontResolution {
    pub fn is_preferred(&self) -> bool {
        matches!(self, FontResolution::Preferred(_))
    }
}

/// Probe the system for a usable bold font.
pub fn resolve_font() -> FontResolution {
    for path in PREFERRED_FONTS {
        if let Ok(data) = fs::read(path) {
            // Index 0 also handles .ttc collections.
            if let Some(font) = Font::try_from_vec_and_index(data, 0) {
                return FontResolution::Preferred(font);
            }
        }
    }
    FontResolution::Builtin
}

/// Draw `text` onto the canvas so that its rendered bounding box is centered
/// on `center`. `px` is the target glyph height in pixels.
pub fn draw_text_centered(
    canvas: &mut RgbaImage,
    font: &FontResolution,
    text: &str,
    center: (i32, i32),
    px: f32,
    color: Rgba<u8>,
) {
    match font {
        FontResolution::Preferred(font) => {
            draw_truetype_centered(canvas, font, text, center, px, color)
        }
        FontResolution::Builtin => draw_builtin_centered(canvas, text, center, px, color),
    }
}

fn draw_truetype_centered(
    canvas: &mut RgbaImage,
    font: &Font<'_>,
    text: &str,
    (cx, cy): (i32, i32),
    px: f32,
    color: Rgba<u8>,
) {
    let scale = Scale::uniform(px);
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, 0.0)).collect();

    // Combined pixel bounds of the laid-out run, so centering tracks what is
    // actually inked rather than the em box.
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            min_x = min_x.min(bb.min.x);
            min_y = min_y.min(bb.min.y);
            max_x = max_x.max(bb.max.x);
            max_y = max_y.max(bb.max.y);
        }
    }
    if min_x > max_x {
        return; // nothing inked (empty or whitespace-only text)
    }

    let dx = cx - (min_x + max_x) / 2;
    let dy = cy - (min_y + max_y) / 2;

    let (width, height) = canvas.dimensions();
    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let x = gx as i32 + bb.min.x + dx;
                let y = gy as i32 + bb.min.y + dy;
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color, coverage);
                }
            });
        }
    }
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// Built-in pixel glyphs, one bit per pixel, row-major. Only the glyphs the
/// icons actually draw are defined; unknown characters are skipped.
fn builtin_glyph(c: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    match c {
        'M' => Some([
            0b10001, //
            0b11011, //
            0b10101, //
            0b10101, //
            0b10001, //
            0b10001, //
            0b10001, //
        ]),
        '3' => Some([
            0b01110, //
            0b10001, //
            0b00001, //
            0b00110, //
            0b00001, //
            0b10001, //
            0b01110, //
        ]),
        _ => None,
    }
}

fn draw_builtin_centered(
    canvas: &mut RgbaImage,
    text: &str,
    (cx, cy): (i32, i32),
    px: f32,
    color: Rgba<u8>,
) {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return;
    }

    // Nearest integer upscale of the 5×7 bitmaps toward the requested height.
    let scale = ((px / GLYPH_HEIGHT as f32).round() as i32).max(1);
    let advance = (GLYPH_WIDTH as i32 + 1) * scale;
    let total_width = advance * chars.len() as i32 - scale;
    let total_height = GLYPH_HEIGHT as i32 * scale;

    let x0 = cx - total_width / 2;
    let y0 = cy - total_height / 2;

    let (width, height) = canvas.dimensions();
    for (i, c) in chars.iter().enumerate() {
        let Some(rows) = builtin_glyph(*c) else {
            continue;
        };
        let glyph_x = x0 + advance * i as i32;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let x = glyph_x + col as i32 * scale + sx;
                        let y = y0 + row as i32 * scale + sy;
                        if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                            blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color, 1.0);
                        }
                    }
                }
            }
        }
    }
}

/// Composite `src` over `dst` at the given coverage, keeping the destination
/// at least as opaque as it already was.
pub(crate) fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0);
    for i in 0..3 {
        dst[i] = (src[i] as f32 * a + dst[i] as f32 * (1.0 - a)).round() as u8;
    }
    let src_alpha = (src[3] as f32 * a).round() as u8;
    dst[3] = dst[3].max(src_alpha);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_glyphs_cover_icon_text() {
        for c in "M33".chars() {
            assert!(builtin_glyph(c).is_some(), "missing builtin glyph for {c:?}");
        }
    }

    #[test]
    fn builtin_text_is_drawn_centered() {
        let mut canvas = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 255]));
        let white = Rgba([255, 255, 255, 255]);
        draw_builtin_centered(&mut canvas, "M", (16, 16), 14.0, white);

        // Center pixel of the 'M' bitmap is inked.
        assert_eq!(*canvas.get_pixel(16, 16), white);

        // Nothing lands outside the expected glyph extent.
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if *pixel == white {
                assert!((6..=26).contains(&x), "stray pixel at ({x}, {y})");
                assert!((6..=26).contains(&y), "stray pixel at ({x}, {y})");
            }
        }
    }

    #[test]
    fn builtin_drawing_clips_to_canvas() {
        // Centering near the edge must not panic or wrap.
        let mut canvas = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        draw_builtin_centered(&mut canvas, "33", (0, 0), 20.0, Rgba([255, 255, 255, 255]));
        draw_builtin_centered(&mut canvas, "33", (7, 7), 20.0, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn blend_full_coverage_replaces_color() {
        let mut dst = Rgba([10, 20, 30, 255]);
        blend_pixel(&mut dst, Rgba([255, 255, 255, 255]), 1.0);
        assert_eq!(dst, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn blend_zero_coverage_is_a_no_op() {
        let mut dst = Rgba([10, 20, 30, 40]);
        blend_pixel(&mut dst, Rgba([255, 255, 255, 255]), 0.0);
        assert_eq!(dst, Rgba([10, 20, 30, 40]));
    }
}
