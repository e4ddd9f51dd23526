//! Deterministic conversion from a finalized bin (plus residue and the
//! non-routable mask) into an RGB pixel grid.

use crate::bin::TimeBin;
use crate::decay::ResidueMap;
use crate::mask::NonRoutableMask;

pub const TIMESTAMP_STRIP_HEIGHT: u32 = 30;

pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major, R,G,B interleaved.
    pub pixels: Vec<u8>,
}

impl Frame {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![0; (width as usize) * (height as usize) * 3] }
    }

    fn set(&mut self, x: u32, y: u32, color: (u8, u8, u8)) {
        let idx = ((y * self.width + x) * 3) as usize;
        self.pixels[idx] = color.0;
        self.pixels[idx + 1] = color.1;
        self.pixels[idx + 2] = color.2;
    }
}

/// Two-segment white -> yellow -> red gradient with a 50% brightness floor
/// on any nonzero intensity, so a single hit is never invisible against black.
pub fn gradient(intensity: u32, peak: u32) -> (u8, u8, u8) {
    if intensity == 0 {
        return (0, 0, 0);
    }
    let r = intensity as f64 / (peak.max(1) as f64);
    let e = (0.5 + 0.5 * r).clamp(0.5, 1.0);
    let t = (e - 0.5) / 0.5;
    if t < 0.5 {
        let b = (255.0 * (1.0 - 2.0 * t)).floor().clamp(0.0, 255.0) as u8;
        (255, 255, b)
    } else {
        let g = (255.0 * (2.0 - 2.0 * t)).floor().clamp(0.0, 255.0) as u8;
        (255, g, 0)
    }
}

fn blend(a: (u8, u8, u8), b: (u8, u8, u8), a_weight: f64) -> (u8, u8, u8) {
    let w = (1.0 - a_weight).max(0.0);
    let mix = |x: u8, y: u8| ((x as f64 * a_weight) + (y as f64 * w)).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

pub fn compose(
    bin: &TimeBin,
    residue: &ResidueMap,
    mask: &NonRoutableMask,
    width: u32,
    height: u32,
    timestamp_label: Option<&str>,
) -> Frame {
    let n = bin.dimension;
    let s = (width.min(height) as f64) / (n as f64);
    let scaled_n = ((n as f64) * s).floor() as u32;
    let offset_x = (width - scaled_n) / 2;
    let offset_y = (height - scaled_n) / 2;

    let total_height = height + if timestamp_label.is_some() { TIMESTAMP_STRIP_HEIGHT } else { 0 };
    let mut frame = Frame::new(width, total_height);

    for py in 0..height {
        for px in 0..width {
            if px < offset_x || px >= offset_x + scaled_n || py < offset_y || py >= offset_y + scaled_n {
                continue; // already black
            }
            let src_x = (((px - offset_x) as f64) / s).floor() as u32;
            let src_y = (((py - offset_y) as f64) / s).floor() as u32;
            let src_x = src_x.min(n - 1);
            let src_y = src_y.min(n - 1);
            let i = (src_y * n + src_x) as usize;

            let intensity = bin.heatmap[i];
            let peak = bin.max_intensity;
            let has_residue = intensity == 0 && residue.grid()[i] > 0;

            let mut color = if has_residue {
                (54u8, 54u8, 54u8)
            } else {
                gradient(intensity, peak)
            };

            if mask.is_set(src_x, src_y) && !has_residue {
                color = if intensity == 0 {
                    (0, 0, 30)
                } else {
                    blend(color, (0, 0, 30), 0.6)
                };
            }

            frame.set(px, py, color);
        }
    }

    if let Some(label) = timestamp_label {
        draw_timestamp_strip(&mut frame, height, label);
    }

    frame
}

const FONT_SCALE: u32 = 2;
const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;

fn glyph_rows(c: char) -> [u8; 7] {
    match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        ':' => [0, 0b00100, 0b00100, 0, 0b00100, 0b00100, 0],
        _ => [0; 7],
    }
}

fn draw_timestamp_strip(frame: &mut Frame, image_height: u32, label: &str) {
    let glyph_pitch = (GLYPH_W + 1) * FONT_SCALE;
    let mut cursor_x = 4u32;
    let origin_y = image_height + (TIMESTAMP_STRIP_HEIGHT - GLYPH_H * FONT_SCALE) / 2;

    for c in label.chars() {
        let rows = glyph_rows(c);
        for (row_idx, row) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                let bit = (row >> (GLYPH_W - 1 - col)) & 1;
                if bit == 0 {
                    continue;
                }
                for dy in 0..FONT_SCALE {
                    for dx in 0..FONT_SCALE {
                        let px = cursor_x + col * FONT_SCALE + dx;
                        let py = origin_y + row_idx as u32 * FONT_SCALE + dy;
                        if px < frame.width && py < frame.height {
                            frame.set(px, py, (255, 255, 255));
                        }
                    }
                }
            }
        }
        cursor_x += glyph_pitch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_boundaries() {
        // Zero intensity is black, peak intensity is pure red, half peak is
        // already saturated on the red channel.
        assert_eq!(gradient(0, 100), (0, 0, 0));
        assert_eq!(gradient(100, 100), (255, 0, 0));
        let (r, _, _) = gradient(50, 100);
        assert_eq!(r, 255);
    }

    #[test]
    fn residue_wins_over_gradient_and_overlay() {
        // A quiet cell with residue and a non-routable mask hit still
        // renders as dark gray, not the gradient or overlay color.
        let mut bin = TimeBin::new(0, 60, 4);
        bin.max_intensity = 10;
        let mut residue = ResidueMap::new(4);
        for _ in 0..5 {
            residue.mark(0, 0);
        }
        let mut mask_grid = vec![0u8; 16];
        mask_grid[0] = 1;
        let mask = crate::mask::NonRoutableMask::from_grid(mask_grid, 4);

        let frame = compose(&bin, &residue, &mask, 4, 4, None);
        assert_eq!((frame.pixels[0], frame.pixels[1], frame.pixels[2]), (54, 54, 54));
    }

    #[test]
    fn nonroutable_blend_over_hot_cell() {
        // A hot cell under the non-routable mask blends 60% of its gradient
        // color with 40% of the dim-blue baseline.
        let color = gradient(100, 100);
        assert_eq!(color, (255, 0, 0));
        let blended = blend(color, (0, 0, 30), 0.6);
        assert_eq!(blended, (153, 0, 12));
    }
}
