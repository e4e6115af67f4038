//! Bitmap digits for tile labels.

use image::{Rgb, RgbImage};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// 5x7 digits, one row per byte, most significant of the low five bits leftmost.
const DIGITS: [[u8; 7]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
];

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Label box size in pixels for `label` at `scale`.
pub fn label_box_size(label: u32, scale: u32) -> (u32, u32) {
    let digits = u32::try_from(label.to_string().len()).unwrap_or(1);
    let pad = 2 * scale;
    let width = pad * 2 + digits * GLYPH_WIDTH * scale + digits.saturating_sub(1) * scale;
    let height = pad * 2 + GLYPH_HEIGHT * scale;
    (width, height)
}

/// Draw `label` in white on a black box with its top-left corner at (x, y).
///
/// Pixels falling outside the canvas are skipped.
pub fn draw_label(canvas: &mut RgbImage, x: u32, y: u32, label: u32, scale: u32) {
    let scale = scale.max(1);
    let (box_width, box_height) = label_box_size(label, scale);
    fill_rect(canvas, x, y, box_width, box_height, BLACK);

    let pad = 2 * scale;
    let mut pen_x = x + pad;
    for digit in label.to_string().bytes().map(|b| usize::from(b - b'0')) {
        for (row, bits) in DIGITS[digit].iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    let row = u32::try_from(row).unwrap_or(0);
                    fill_rect(
                        canvas,
                        pen_x + col * scale,
                        y + pad + row * scale,
                        scale,
                        scale,
                        WHITE,
                    );
                }
            }
        }
        pen_x += (GLYPH_WIDTH + 1) * scale;
    }
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(width).min(canvas.width());
    let y_end = y.saturating_add(height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_grows_with_digits() {
        assert_eq!(label_box_size(7, 1), (9, 11));
        assert_eq!(label_box_size(12, 1), (15, 11));
        assert_eq!(label_box_size(12, 2), (30, 22));
    }

    #[test]
    fn test_draw_label_one() {
        let mut canvas = RgbImage::from_pixel(20, 20, Rgb([128, 128, 128]));
        draw_label(&mut canvas, 0, 0, 1, 1);

        // Box corner is black, outside the box is untouched.
        assert_eq!(*canvas.get_pixel(0, 0), BLACK);
        assert_eq!(*canvas.get_pixel(15, 15), Rgb([128, 128, 128]));
        // Top row of "1" is a single pixel in the middle column.
        assert_eq!(*canvas.get_pixel(2 + 2, 2), WHITE);
        assert_eq!(*canvas.get_pixel(2, 2), BLACK);
    }

    #[test]
    fn test_label_is_clipped_at_canvas_edge() {
        let mut canvas = RgbImage::new(6, 6);
        draw_label(&mut canvas, 2, 2, 88, 3);
        assert_eq!(canvas.dimensions(), (6, 6));
    }
}
