use crate::particle::Rgb;
use crate::sim::Surface;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

// A canvas pixel counts as a braille dot once it stands this far above the sky.
const INK_THRESHOLD: u8 = 24;
const GLOW_STRENGTH: f32 = 0.35;

/* -----------------------------
   Pixel canvas: 2×4 pixels per terminal cell
------------------------------ */

pub(crate) struct PixelCanvas {
    w: u32,
    h: u32,
    px: Vec<Rgb>,
    bg: Rgb,
}

impl PixelCanvas {
    pub(crate) fn for_cells(cols: u16, rows: u16) -> Self {
        let (w, h) = (cols as u32 * 2, rows as u32 * 4);
        Self {
            w,
            h,
            px: vec![Rgb::NIGHT; (w as usize) * (h as usize)],
            bg: Rgb::NIGHT,
        }
    }

    /// Reallocates for a new terminal size. Returns true when it changed.
    pub(crate) fn fit_cells(&mut self, cols: u16, rows: u16) -> bool {
        let (w, h) = (cols as u32 * 2, rows as u32 * 4);
        if w == self.w && h == self.h {
            return false;
        }
        *self = Self::for_cells(cols, rows);
        true
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> Rgb {
        self.px[self.idx(x, y)]
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Rgb, alpha: f32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];
        let mix = |s: u8, d: u8| -> u8 {
            (s as f32 * a + d as f32 * (1.0 - a) + 0.5).clamp(0.0, 255.0) as u8
        };
        self.px[i] = Rgb {
            r: mix(src.r, dst.r),
            g: mix(src.g, dst.g),
            b: mix(src.b, dst.b),
        };
    }

    fn is_ink(&self, p: Rgb) -> bool {
        let lift = |c: u8, b: u8| c.saturating_sub(b);
        lift(p.r, self.bg.r)
            .max(lift(p.g, self.bg.g))
            .max(lift(p.b, self.bg.b))
            >= INK_THRESHOLD
    }

    /// Braille dot mask for one terminal cell plus the mean ink color.
    pub(crate) fn braille_cell(&self, cx: u32, cy: u32) -> (u8, Option<Rgb>) {
        let (px0, py0) = (cx * 2, cy * 4);
        let mut mask = 0u8;
        let (mut sr, mut sg, mut sb, mut n) = (0u32, 0u32, 0u32, 0u32);

        for dy in 0..4 {
            for dx in 0..2 {
                let (x, y) = (px0 + dx, py0 + dy);
                if x >= self.w || y >= self.h {
                    continue;
                }
                let p = self.px[self.idx(x, y)];
                if self.is_ink(p) {
                    mask |= braille_bit(dx, dy);
                    sr += p.r as u32;
                    sg += p.g as u32;
                    sb += p.b as u32;
                    n += 1;
                }
            }
        }

        let ink = (n > 0).then(|| Rgb {
            r: (sr / n) as u8,
            g: (sg / n) as u8,
            b: (sb / n) as u8,
        });
        (mask, ink)
    }
}

impl Surface for PixelCanvas {
    fn size(&self) -> (f32, f32) {
        (self.w as f32, self.h as f32)
    }

    fn clear(&mut self, color: Rgb) {
        self.bg = color;
        self.px.fill(color);
    }

    fn fill_circle(&mut self, x: f32, y: f32, r: f32, color: Rgb, alpha: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        // sub-pixel dots still land on the pixel under their center
        if r < 0.75 {
            self.blend_over(x.floor() as i32, y.floor() as i32, color, alpha);
            return;
        }
        let r2 = r * r;
        let (x0, x1) = ((x - r).floor() as i32, (x + r).ceil() as i32);
        let (y0, y1) = ((y - r).floor() as i32, (y + r).ceil() as i32);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - x;
                let dy = py as f32 + 0.5 - y;
                if dx * dx + dy * dy <= r2 {
                    self.blend_over(px, py, color, alpha);
                }
            }
        }
    }

    fn glow(&mut self, x: f32, y: f32, r: f32, color: Rgb, alpha: f32) {
        if !x.is_finite() || !y.is_finite() || r < 1.0 {
            return;
        }
        let (x0, x1) = ((x - r).floor() as i32, (x + r).ceil() as i32);
        let (y0, y1) = ((y - r).floor() as i32, (y + r).ceil() as i32);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - x;
                let dy = py as f32 + 0.5 - y;
                let d = (dx * dx + dy * dy).sqrt();
                if d >= r {
                    continue;
                }
                let falloff = 1.0 - d / r;
                self.blend_over(px, py, color, alpha * GLOW_STRENGTH * falloff * falloff);
            }
        }
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub(crate) fn color(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// The particle layer as a ratatui widget; overlays render on top of it.
pub(crate) struct BrailleLayer<'a> {
    pub(crate) canvas: &'a PixelCanvas,
    pub(crate) mono: bool,
}

impl Widget for BrailleLayer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = color(self.canvas.bg);
        for cy in 0..area.height {
            for cx in 0..area.width {
                let (mask, ink) = self.canvas.braille_cell(cx as u32, cy as u32);
                let ch = if mask == 0 {
                    ' '
                } else {
                    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
                };
                let fg = match ink {
                    Some(c) if !self.mono => color(c),
                    _ => Color::White,
                };
                buf.get_mut(area.x + cx, area.y + cy)
                    .set_char(ch)
                    .set_fg(fg)
                    .set_bg(bg);
            }
        }
    }
}
