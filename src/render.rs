// Copyright (c) 2026 rezky_nightky

use std::ops::Range;
use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthStr;

use crate::buffer::{Line, LineBuffer, LineKind};
use crate::cell::Cell;
use crate::degradation::Band;
use crate::frame::Frame;
use crate::glyphs::{build_glyphs, GlyphSet};
use crate::layers::{GridLayer, Layer, NoiseLayer, ShaderLayer};
use crate::palette::Theme;
use crate::runtime::ColorToken;
use crate::wrap::wrap;

pub const PAD_X: u16 = 2;
pub const PAD_Y: u16 = 1;
const CARET_BLINK: Duration = Duration::from_millis(530);
const GLITCH_SLOT: Duration = Duration::from_millis(120);
const FLASH_EVERY: Duration = Duration::from_millis(250);

/// Everything the renderer needs to know about the session for one frame.
pub struct View<'a> {
    pub buffer: &'a LineBuffer,
    pub band: Band,
    pub percent: u8,
    pub frozen: bool,
    pub caret: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub text: String,
    pub color: ColorToken,
    pub kind: LineKind,
    /// Index of the source line in the buffer.
    pub line: usize,
}

pub fn visible_lines(height: u16) -> usize {
    height.saturating_sub(2 * PAD_Y) as usize
}

pub fn content_width(width: u16) -> usize {
    width.saturating_sub(2 * PAD_X) as usize
}

/// Buffer lines shown for a given scroll offset.
pub fn window(total: usize, visible: usize, scroll: usize) -> Range<usize> {
    let end = total.saturating_sub(scroll);
    let start = end.saturating_sub(visible);
    start..end
}

/// Wraps the windowed lines and keeps the newest `visible` rows.
pub fn layout(buffer: &LineBuffer, width: usize, visible: usize) -> Vec<Row> {
    if buffer.is_empty() || visible == 0 {
        return Vec::new();
    }
    let range = window(buffer.len(), visible, buffer.scroll());
    let mut rows: Vec<Row> = buffer
        .lines()
        .enumerate()
        .skip(range.start)
        .take(range.len())
        .flat_map(|(i, l): (usize, &Line)| {
            wrap(&l.text, width).into_iter().map(move |text| Row {
                text,
                color: l.color,
                kind: l.kind,
                line: i,
            })
        })
        .collect();
    if rows.len() > visible {
        rows.drain(..rows.len() - visible);
    }
    rows
}

fn glitch_chance(band: Band) -> f32 {
    match band {
        Band::Normal | Band::Elevated => 0.0,
        Band::Unstable => 0.02,
        Band::Critical => 0.05,
        Band::Failing => 0.09,
        Band::Collapse => 0.15,
    }
}

fn splitmix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Same slot, line and column always glitch the same way, so corrupted
/// text holds still for a moment instead of boiling every frame.
fn glitch_text(text: &str, line: usize, slot: u64, chance: f32, glyphs: &[char]) -> String {
    if chance <= 0.0 || glyphs.is_empty() {
        return text.to_string();
    }
    let threshold = (chance.clamp(0.0, 1.0) as f64 * u32::MAX as f64) as u64;
    text.chars()
        .enumerate()
        .map(|(col, ch)| {
            if ch == ' ' {
                return ch;
            }
            let h = splitmix(slot ^ ((line as u64) << 20) ^ col as u64);
            if (h & 0xFFFF_FFFF) < threshold {
                glyphs[(h >> 32) as usize % glyphs.len()]
            } else {
                ch
            }
        })
        .collect()
}

pub struct Renderer {
    theme: Theme,
    layers: Vec<Box<dyn Layer>>,
    scratch: Frame,
    glitch_glyphs: Vec<char>,
    glitch: bool,
    ascii: bool,
    start: Instant,
}

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub seed: u64,
    pub ascii: bool,
    pub effects: bool,
    pub glitch: bool,
}

impl Renderer {
    pub fn new(theme: Theme, opts: RenderOptions, now: Instant) -> Self {
        let layers: Vec<Box<dyn Layer>> = if opts.effects {
            vec![
                Box::new(ShaderLayer::new(opts.ascii)),
                Box::new(GridLayer::new(opts.seed ^ 0x6121d, opts.ascii)),
                Box::new(NoiseLayer::new(opts.seed ^ 0x4015e, opts.ascii)),
            ]
        } else {
            Vec::new()
        };
        let glitch_glyphs: Vec<char> = build_glyphs(GlyphSet::GLITCH, opts.ascii)
            .into_iter()
            .filter(|c| unicode_width::UnicodeWidthChar::width(*c) == Some(1))
            .collect();
        let bg = theme.bg;
        Self {
            theme,
            layers,
            scratch: Frame::new(0, 0, bg),
            glitch_glyphs,
            glitch: opts.glitch,
            ascii: opts.ascii,
            start: now,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.scratch = Frame::new(width, height, self.theme.bg);
        for l in &mut self.layers {
            l.resize(width, height);
        }
    }

    /// Composes a full picture off-screen, then copies it into `frame` so
    /// only cells that really changed are marked dirty.
    pub fn render(&mut self, frame: &mut Frame, view: &View<'_>, now: Instant) {
        if self.scratch.width != frame.width || self.scratch.height != frame.height {
            self.resize(frame.width, frame.height);
        }
        self.scratch.clear_with_bg(self.theme.bg);

        for l in &mut self.layers {
            l.tick(now, view.band.intensity());
        }
        for l in &self.layers {
            l.composite(&mut self.scratch, &self.theme);
        }

        self.draw_text(view, now);
        self.draw_indicator(view);
        if view.frozen {
            self.draw_freeze(now);
        }

        for y in 0..frame.height {
            for x in 0..frame.width {
                if let Some(c) = self.scratch.get(x, y) {
                    frame.set(x, y, c);
                }
            }
        }
    }

    fn draw_text(&mut self, view: &View<'_>, now: Instant) {
        let width = content_width(self.scratch.width);
        let visible = visible_lines(self.scratch.height);
        if width == 0 || visible == 0 {
            return;
        }
        let rows = layout(view.buffer, width, visible);
        let elapsed = now.saturating_duration_since(self.start);
        let slot = (elapsed.as_millis() / GLITCH_SLOT.as_millis()) as u64;
        let chance = if self.glitch {
            glitch_chance(view.band)
        } else {
            0.0
        };
        let caret_on = (elapsed.as_millis() / CARET_BLINK.as_millis()) % 2 == 0;
        let last_row = rows.len().saturating_sub(1);

        for (i, row) in rows.iter().enumerate() {
            let y = PAD_Y + i as u16;
            let fg = self.theme.token(row.color);
            let bold = matches!(row.color, ColorToken::White | ColorToken::Red);
            let end = if row.kind == LineKind::Output {
                let text = glitch_text(&row.text, row.line, slot, chance, &self.glitch_glyphs);
                self.scratch.print(PAD_X, y, &text, fg, bold)
            } else {
                self.scratch.print(PAD_X, y, &row.text, fg, bold)
            };

            if view.caret && caret_on && i == last_row && row.kind == LineKind::Prompt {
                if let Some(under) = self.scratch.get(end, y) {
                    self.scratch
                        .set(end, y, Cell::glyph(' ', fg).reversed().over(under));
                }
            }
        }
    }

    fn draw_indicator(&mut self, view: &View<'_>) {
        let w = self.scratch.width;
        let label = format!(" DEG {:>3}% {} ", view.percent, view.band.label());
        let fg = self.theme.token(view.band.color());
        let lw = label.width() as u16;
        if lw + 1 < w {
            self.scratch.print(w - lw - 1, 0, &label, fg, true);
        }

        let scroll = view.buffer.scroll();
        let h = self.scratch.height;
        if scroll > 0 && h > 0 {
            let arrow = if self.ascii { '^' } else { '↑' };
            let s = format!(" {arrow} {scroll} ");
            let sw = s.width() as u16;
            if sw + 1 < w {
                let dim = self.theme.token(ColorToken::Dim);
                self.scratch.print(w - sw - 1, h - 1, &s, dim, false);
            }
        }
    }

    fn draw_freeze(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.start);
        let flash = (elapsed.as_millis() / FLASH_EVERY.as_millis()) % 2 == 0;
        let red = self.theme.token(ColorToken::Red);
        if flash {
            for y in 0..self.scratch.height {
                for x in 0..self.scratch.width {
                    if let Some(mut c) = self.scratch.get(x, y) {
                        c.reverse = true;
                        c.fg = red;
                        self.scratch.set(x, y, c);
                    }
                }
            }
        }
        draw_message_box(
            &mut self.scratch,
            "СИСТЕМНЫЙ КОЛЛАПС\nПЕРЕЗАПУСК ЯДРА...",
            red,
            self.ascii,
        );
    }
}

/// Centered, bordered box of text. Lines wider than the screen are cut.
pub fn draw_message_box(
    frame: &mut Frame,
    text: &str,
    fg: Option<crossterm::style::Color>,
    ascii: bool,
) {
    let (pad_x, pad_y) = (2u16, 1u16);
    let lines: Vec<&str> = text.split('\n').collect();
    let max_w = frame.width.saturating_sub(2 + 2 * pad_x);
    let content_w = lines
        .iter()
        .map(|l| l.width() as u16)
        .max()
        .unwrap_or(0)
        .min(max_w);
    let content_h = (lines.len() as u16).min(frame.height.saturating_sub(2 + 2 * pad_y));
    if content_w == 0 || content_h == 0 {
        return;
    }
    let box_w = content_w + 2 + 2 * pad_x;
    let box_h = content_h + 2 + 2 * pad_y;
    let x0 = frame.width / 2 - box_w / 2;
    let y0 = frame.height / 2 - box_h / 2;
    let (corner, horiz, vert) = if ascii { ('+', '-', '|') } else { ('█', '▀', '█') };

    for dy in 0..box_h {
        for dx in 0..box_w {
            let (top, bottom) = (dy == 0, dy + 1 == box_h);
            let (left, right) = (dx == 0, dx + 1 == box_w);
            let ch = match (top || bottom, left || right) {
                (true, true) => corner,
                (true, false) => horiz,
                (false, true) => vert,
                (false, false) => ' ',
            };
            frame.set(x0 + dx, y0 + dy, Cell::glyph(ch, fg).bold(true));
        }
    }
    for (i, line) in lines.iter().take(content_h as usize).enumerate() {
        let lw = (line.width() as u16).min(content_w);
        let x = x0 + 1 + pad_x + (content_w - lw) / 2;
        let y = y0 + 1 + pad_y + i as u16;
        frame.print(x, y, line, fg, true);
    }
}
