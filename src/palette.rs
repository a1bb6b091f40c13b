// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, ColorToken};

pub type Rgb = (u8, u8, u8);

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(
        r,
        g,
        b,
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = match avg {
        0..=7 => 16,
        239..=255 => 231,
        _ => 232 + ((avg - 8) / 10),
    };
    let gray_level = match gray_idx {
        16 => 0,
        231 => 255,
        _ => 8 + 10 * (gray_idx - 232),
    };
    let gray_dist = dist2(r, g, b, gray_level, gray_level, gray_level);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, Rgb); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (c, (cr, cg, cb)) in TABLE {
        let d = dist2(r, g, b, cr, cg, cb);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

pub fn mix_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    (lerp_u8(a.0, b.0, t), lerp_u8(a.1, b.1, t), lerp_u8(a.2, b.2, t))
}

/// Darkens towards black; the cell grid has no alpha, so layer opacity is
/// expressed as brightness.
pub fn scale_rgb(c: Rgb, k: f32) -> Rgb {
    mix_rgb((0, 0, 0), c, k)
}

fn token_rgb(token: ColorToken) -> Rgb {
    match token {
        ColorToken::Normal => (51, 255, 102),
        ColorToken::White => (235, 235, 235),
        ColorToken::Dim => (96, 128, 104),
        ColorToken::Red => (255, 64, 64),
        ColorToken::Yellow => (255, 204, 64),
        ColorToken::Cyan => (80, 220, 235),
        ColorToken::Magenta => (214, 96, 255),
    }
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub mode: ColorMode,
    pub bg: Option<Color>,
}

impl Theme {
    pub fn new(mode: ColorMode) -> Self {
        let bg = match mode {
            ColorMode::Mono => None,
            ColorMode::Color16 => Some(Color::Black),
            ColorMode::Color256 => Some(Color::AnsiValue(16)),
            ColorMode::TrueColor => Some(Color::Rgb { r: 0, g: 0, b: 0 }),
        };
        Self { mode, bg }
    }

    pub fn rgb(&self, (r, g, b): Rgb) -> Option<Color> {
        match self.mode {
            ColorMode::Mono => None,
            ColorMode::TrueColor => Some(Color::Rgb { r, g, b }),
            ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(r, g, b))),
            ColorMode::Color16 => Some(rgb_to_color16(r, g, b)),
        }
    }

    pub fn token(&self, token: ColorToken) -> Option<Color> {
        self.rgb(token_rgb(token))
    }

    /// Like `rgb`, but near-black layer colours on a 16-colour terminal
    /// collapse to `None` instead of all turning into `DarkGrey` smears.
    pub fn layer_rgb(&self, c: Rgb) -> Option<Color> {
        if self.mode == ColorMode::Color16 {
            let peak = c.0.max(c.1).max(c.2);
            if peak < 48 {
                return None;
            }
        }
        self.rgb(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi256_maps_pure_black_and_white_to_cube_corners() {
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
        assert_eq!(rgb_to_ansi256(255, 255, 255), 231);
    }

    #[test]
    fn mono_theme_has_no_colours() {
        let t = Theme::new(ColorMode::Mono);
        assert_eq!(t.token(ColorToken::Red), None);
        assert_eq!(t.bg, None);
    }

    #[test]
    fn color16_red_token_is_red() {
        let t = Theme::new(ColorMode::Color16);
        assert_eq!(t.token(ColorToken::Red), Some(Color::Red));
    }

    #[test]
    fn scale_rgb_zero_is_black() {
        assert_eq!(scale_rgb((200, 100, 50), 0.0), (0, 0, 0));
        assert_eq!(scale_rgb((200, 100, 50), 1.0), (200, 100, 50));
    }
}
