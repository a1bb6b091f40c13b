// Copyright (c) 2026 rezky_nightky

//! Decorative surfaces drawn beneath the text. They only ever read the
//! intensity they are handed; nothing flows back into the terminal core.

use std::time::{Duration, Instant};

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    seq::IndexedRandom,
    Rng, SeedableRng,
};
use unicode_width::UnicodeWidthChar;

use crate::cell::Cell;
use crate::frame::Frame;
use crate::glyphs::{build_glyphs, GlyphSet};
use crate::palette::{mix_rgb, scale_rgb, Rgb, Theme};

pub trait Layer {
    fn resize(&mut self, width: u16, height: u16);
    fn tick(&mut self, now: Instant, intensity: f32);
    fn composite(&self, frame: &mut Frame, theme: &Theme);
}

const CALM: Rgb = (0, 70, 30);
const ANGRY: Rgb = (120, 0, 16);

fn accent(intensity: f32) -> Rgb {
    mix_rgb(CALM, ANGRY, intensity)
}

/// Quantized so slow drifts do not repaint the whole screen every frame.
fn quantize((r, g, b): Rgb) -> Rgb {
    (r & !3, g & !3, b & !3)
}

/// Plasma field painted as background colour, with a sprinkle of glyphs on
/// its brightest ridges.
pub struct ShaderLayer {
    width: u16,
    height: u16,
    phase: f32,
    intensity: f32,
    last: Option<Instant>,
    ascii: bool,
}

const SHADER_STEP: Duration = Duration::from_millis(66);

impl ShaderLayer {
    pub fn new(ascii: bool) -> Self {
        Self {
            width: 0,
            height: 0,
            phase: 0.0,
            intensity: 0.0,
            last: None,
            ascii,
        }
    }

    fn field(&self, x: u16, y: u16) -> f32 {
        let (x, y, t) = (x as f32, y as f32 * 2.0, self.phase);
        let cx = self.width as f32 * 0.5;
        let cy = self.height as f32;
        let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
        let v = (x * 0.11 + t).sin()
            + (y * 0.17 - t * 0.7).sin()
            + ((x + y) * 0.06 + t * 0.45).sin()
            + (d * 0.14 - t * 1.3).sin();
        (v + 4.0) / 8.0
    }
}

impl Layer for ShaderLayer {
    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    fn tick(&mut self, now: Instant, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
        let last = *self.last.get_or_insert(now);
        let dt = now.saturating_duration_since(last);
        if dt < SHADER_STEP {
            return;
        }
        self.last = Some(now);
        let speed = 0.6 + self.intensity * 2.4;
        self.phase = (self.phase + dt.as_secs_f32() * speed) % (std::f32::consts::TAU * 64.0);
    }

    fn composite(&self, frame: &mut Frame, theme: &Theme) {
        let strength = 0.12 + self.intensity * 0.28;
        let tint = accent(self.intensity);
        let ridge = if self.ascii { '.' } else { '·' };
        for y in 0..frame.height.min(self.height) {
            for x in 0..frame.width.min(self.width) {
                let v = self.field(x, y);
                let bg = theme.layer_rgb(quantize(scale_rgb(tint, v * strength)));
                let mut cell = Cell::blank_with_bg(bg.or(theme.bg));
                if v > 0.9 {
                    cell.ch = ridge;
                    cell.fg = theme.layer_rgb(scale_rgb(tint, 0.5 + self.intensity * 0.5));
                }
                frame.set(x, y, cell);
            }
        }
    }
}

/// A HUD of pulsing nodes on a fixed lattice.
pub struct GridLayer {
    nodes: Vec<(u16, u16, f32)>,
    rng: StdRng,
    t: f32,
    intensity: f32,
    start: Option<Instant>,
    ascii: bool,
}

const GRID_DX: u16 = 12;
const GRID_DY: u16 = 6;
const GRID_OPACITY: f32 = 0.35;

impl GridLayer {
    pub fn new(seed: u64, ascii: bool) -> Self {
        Self {
            nodes: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            t: 0.0,
            intensity: 0.0,
            start: None,
            ascii,
        }
    }

    fn pulse(&self, phase: f32) -> f32 {
        0.5 + 0.5 * (self.t * (1.2 + self.intensity * 3.0) + phase).sin()
    }
}

impl Layer for GridLayer {
    fn resize(&mut self, width: u16, height: u16) {
        self.nodes.clear();
        let mut y = GRID_DY / 2;
        while y < height {
            let mut x = GRID_DX / 2;
            while x < width {
                let phase = self.rng.random_range(0.0..std::f32::consts::TAU);
                self.nodes.push((x, y, phase));
                x += GRID_DX;
            }
            y += GRID_DY;
        }
    }

    fn tick(&mut self, now: Instant, intensity: f32) {
        let start = *self.start.get_or_insert(now);
        self.t = now.saturating_duration_since(start).as_secs_f32();
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    fn composite(&self, frame: &mut Frame, theme: &Theme) {
        let glyph = if self.ascii { '+' } else { '┼' };
        let base = accent(self.intensity);
        let hot = mix_rgb(base, (255, 255, 255), 0.3);
        for &(x, y, phase) in &self.nodes {
            let p = self.pulse(phase);
            let fg = theme.layer_rgb(scale_rgb(hot, GRID_OPACITY * (0.3 + 0.7 * p)));
            if let Some(under) = frame.get(x, y) {
                frame.set(x, y, Cell::glyph(glyph, fg).over(under));
            }
        }
    }
}

/// Sparse static, regenerated on a fixed cadence.
pub struct NoiseLayer {
    rng: StdRng,
    glyphs: Vec<char>,
    specks: Vec<(u16, u16, char)>,
    width: u16,
    height: u16,
    next_at: Option<Instant>,
}

const NOISE_EVERY: Duration = Duration::from_millis(80);
const NOISE_OPACITY: f32 = 0.3;

impl NoiseLayer {
    pub fn new(seed: u64, ascii: bool) -> Self {
        let glyphs: Vec<char> = build_glyphs(GlyphSet::NOISE, ascii)
            .into_iter()
            .filter(|c| c.width() == Some(1))
            .collect();
        Self {
            rng: StdRng::seed_from_u64(seed),
            glyphs,
            specks: Vec::new(),
            width: 0,
            height: 0,
            next_at: None,
        }
    }

    fn regenerate(&mut self, intensity: f32) {
        self.specks.clear();
        if self.width == 0 || self.height == 0 {
            return;
        }
        let area = self.width as f32 * self.height as f32;
        let n = (area * (0.004 + intensity * 0.05)) as usize;
        let (Ok(xs), Ok(ys)) = (
            Uniform::new(0, self.width),
            Uniform::new(0, self.height),
        ) else {
            return;
        };
        for _ in 0..n {
            let x = xs.sample(&mut self.rng);
            let y = ys.sample(&mut self.rng);
            if let Some(&ch) = self.glyphs.choose(&mut self.rng) {
                self.specks.push((x, y, ch));
            }
        }
    }
}

impl Layer for NoiseLayer {
    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.specks.clear();
        self.next_at = None;
    }

    fn tick(&mut self, now: Instant, intensity: f32) {
        if self.next_at.is_some_and(|at| now < at) {
            return;
        }
        self.next_at = Some(now + NOISE_EVERY);
        self.regenerate(intensity.clamp(0.0, 1.0));
    }

    fn composite(&self, frame: &mut Frame, theme: &Theme) {
        let fg = theme.layer_rgb(scale_rgb((200, 210, 200), NOISE_OPACITY));
        for &(x, y, ch) in &self.specks {
            if let Some(under) = frame.get(x, y) {
                frame.set(x, y, Cell::glyph(ch, fg).over(under));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ColorMode;

    #[test]
    fn noise_density_grows_with_intensity() {
        let t0 = Instant::now();
        let mut n = NoiseLayer::new(3, false);
        n.resize(100, 40);
        n.tick(t0, 0.0);
        let calm = n.specks.len();
        n.tick(t0 + NOISE_EVERY, 1.0);
        assert!(n.specks.len() > calm * 5);
    }

    #[test]
    fn noise_holds_still_between_regenerations() {
        let t0 = Instant::now();
        let mut n = NoiseLayer::new(3, true);
        n.resize(50, 20);
        n.tick(t0, 0.5);
        let before = n.specks.clone();
        n.tick(t0 + Duration::from_millis(10), 0.5);
        assert_eq!(n.specks, before);
    }

    #[test]
    fn grid_places_nodes_on_the_lattice() {
        let mut g = GridLayer::new(1, true);
        g.resize(48, 18);
        assert_eq!(g.nodes.len(), 4 * 3);
        let mut f = Frame::new(48, 18, None);
        g.tick(Instant::now(), 0.0);
        g.composite(&mut f, &Theme::new(ColorMode::Mono));
        assert_eq!(f.get(GRID_DX / 2, GRID_DY / 2).unwrap().ch, '+');
    }

    #[test]
    fn shader_fills_every_cell_with_background() {
        let mut s = ShaderLayer::new(false);
        s.resize(10, 4);
        s.tick(Instant::now(), 0.5);
        let mut f = Frame::new(10, 4, None);
        s.composite(&mut f, &Theme::new(ColorMode::TrueColor));
        for y in 0..4 {
            for x in 0..10 {
                assert!(f.get(x, y).unwrap().bg.is_some());
            }
        }
    }
}
