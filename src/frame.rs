// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;
use unicode_width::UnicodeWidthChar;

use crate::cell::{Cell, WIDE_TAIL};

/// Off-screen cell grid that every layer and the text pass draw into.
///
/// Clearing is O(1): each cell carries the generation it was written in, and
/// cells from an older generation read back as the blank cell. Writes that
/// change a cell are recorded so `Terminal::draw` only repaints what moved.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    gen: u32,
    cell_gen: Vec<u32>,
    blank: Cell,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        let blank = Cell::blank_with_bg(bg);
        Self {
            width,
            height,
            cells: vec![blank; len],
            gen: 1,
            cell_gen: vec![1; len],
            blank,
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    /// Starts a new generation. Everything reads as blank until redrawn.
    pub fn clear_with_bg(&mut self, bg: Option<Color>) {
        self.blank = Cell::blank_with_bg(bg);
        self.gen = self.gen.wrapping_add(1);
        if self.gen == 0 {
            self.cell_gen.fill(0);
            self.gen = 1;
        }
        self.dirty_all = true;
        self.dirty.clear();
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
        } else {
            for &i in &self.dirty {
                if let Some(v) = self.dirty_map.get_mut(i) {
                    *v = false;
                }
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        if self.cell_gen.get(i).copied() == Some(self.gen) {
            self.cells[i]
        } else {
            self.blank
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.index(x, y).map(|i| self.cell_at_index(i))
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cell_at_index(i) == cell {
            return;
        }
        self.cells[i] = cell;
        self.cell_gen[i] = self.gen;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    /// Writes `text` starting at column `x`, clipped to the frame width.
    /// Text keeps the background of whatever is already underneath.
    /// Returns the column after the last written glyph.
    pub fn print(&mut self, x: u16, y: u16, text: &str, fg: Option<Color>, bold: bool) -> u16 {
        let mut col = x;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0) as u16;
            if w == 0 {
                continue;
            }
            if col.saturating_add(w) > self.width {
                break;
            }
            let under = self.get(col, y).unwrap_or(self.blank);
            self.set(col, y, Cell::glyph(ch, fg).bold(bold).over(under));
            // A wide glyph owns the next column too; the terminal skips it.
            for pad in 1..w {
                let under = self.get(col + pad, y).unwrap_or(self.blank);
                self.set(col + pad, y, Cell::glyph(WIDE_TAIL, fg).over(under));
            }
            col += w;
        }
        col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_with_bg_makes_cells_effectively_blank() {
        let mut f = Frame::new(2, 2, None);
        f.set(0, 0, Cell::glyph('x', None));
        assert_eq!(f.get(0, 0).unwrap().ch, 'x');
        f.clear_with_bg(None);
        assert_eq!(f.get(0, 0).unwrap().ch, ' ');
    }

    #[test]
    fn print_clips_at_right_edge_and_keeps_background() {
        let bg = Some(Color::DarkBlue);
        let mut f = Frame::new(4, 1, None);
        f.set(1, 0, Cell::blank_with_bg(bg));
        let end = f.print(0, 0, "abcdef", Some(Color::Green), false);
        assert_eq!(end, 4);
        assert_eq!(f.get(3, 0).unwrap().ch, 'd');
        assert_eq!(f.get(1, 0).unwrap().bg, bg);
    }

    #[test]
    fn wide_glyph_marks_its_tail_column() {
        let mut f = Frame::new(5, 1, None);
        let end = f.print(0, 0, "ア!", None, false);
        assert_eq!(end, 3);
        assert_eq!(f.get(1, 0).unwrap().ch, WIDE_TAIL);
        assert_eq!(f.get(2, 0).unwrap().ch, '!');
    }

    #[test]
    fn set_records_each_changed_cell_once() {
        let mut f = Frame::new(3, 1, None);
        f.clear_dirty();
        f.set(0, 0, Cell::glyph('a', None));
        f.set(0, 0, Cell::glyph('b', None));
        f.set(2, 0, Cell::glyph('c', None));
        assert_eq!(f.dirty_indices(), &[0, 2]);
    }
}
