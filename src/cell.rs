// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

/// Placeholder for the second column of a double-width glyph.
pub const WIDE_TAIL: char = '\0';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    /// Swapped fg/bg, used for the input caret and the freeze flash.
    pub reverse: bool,
}

impl Cell {
    pub fn blank_with_bg(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
            reverse: false,
        }
    }

    pub fn glyph(ch: char, fg: Option<Color>) -> Self {
        Self {
            ch,
            fg,
            bg: None,
            bold: false,
            reverse: false,
        }
    }

    pub fn bold(mut self, on: bool) -> Self {
        self.bold = on;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Text drawn over a layer keeps whatever background the layer left.
    pub fn over(mut self, under: Cell) -> Self {
        if self.bg.is_none() {
            self.bg = under.bg;
        }
        self
    }
}
