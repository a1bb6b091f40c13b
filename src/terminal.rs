// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor,
    event::{self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::{Cell, WIDE_TAIL};
use crate::frame::Frame;

/// What the real terminal currently shows, so unchanged cells are skipped.
struct Shown {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Shown {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(None); width as usize * height as usize],
        }
    }
}

/// Current SGR state of the output stream.
#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
    reverse: bool,
}

impl Pen {
    fn matches(&self, c: &Cell) -> bool {
        self.fg == c.fg && self.bg == c.bg && self.bold == c.bold && self.reverse == c.reverse
    }

    fn apply(&mut self, out: &mut Stdout, c: &Cell) -> Result<()> {
        if c.fg != self.fg {
            out.queue(SetForegroundColor(c.fg.unwrap_or(Color::Reset)))?;
            self.fg = c.fg;
        }
        if c.bg != self.bg {
            out.queue(SetBackgroundColor(c.bg.unwrap_or(Color::Reset)))?;
            self.bg = c.bg;
        }
        if c.bold != self.bold {
            out.queue(SetAttribute(if c.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = c.bold;
        }
        if c.reverse != self.reverse {
            out.queue(SetAttribute(if c.reverse {
                Attribute::Reverse
            } else {
                Attribute::NoReverse
            }))?;
            self.reverse = c.reverse;
        }
        Ok(())
    }
}

pub struct Terminal {
    stdout: Stdout,
    shown: Option<Shown>,
    run_buf: String,
    row_dirty: Vec<Vec<usize>>,
    touched_rows: Vec<u16>,
}

fn leave(out: &mut Stdout) {
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(DisableFocusChange);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            // Wheel scrolling and focus tracking are nice to have.
            let _ = out.execute(EnableMouseCapture);
            let _ = out.execute(EnableFocusChange);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            leave(&mut out);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            shown: None,
            run_buf: String::with_capacity(64),
            row_dirty: Vec::new(),
            touched_rows: Vec::new(),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let resized = self
            .shown
            .as_ref()
            .map(|s| s.width != frame.width || s.height != frame.height)
            .unwrap_or(true);
        if resized {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.shown = Some(Shown::new(frame.width, frame.height));
        }

        let total = frame.width as usize * frame.height as usize;
        let dirty_is_large = total > 0 && frame.dirty_indices().len() >= total / 3;
        if resized || frame.is_dirty_all() || dirty_is_large {
            self.draw_full(frame)?;
        } else {
            self.draw_dirty(frame)?;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    fn draw_full(&mut self, frame: &Frame) -> Result<()> {
        let Some(shown) = self.shown.as_mut() else {
            return Ok(());
        };
        let mut pen = Pen::default();
        for y in 0..frame.height {
            self.stdout.queue(cursor::MoveTo(0, y))?;
            for x in 0..frame.width {
                let idx = y as usize * frame.width as usize + x as usize;
                let cell = frame.cell_at_index(idx);
                shown.cells[idx] = cell;
                if cell.ch == WIDE_TAIL {
                    continue;
                }
                pen.apply(&mut self.stdout, &cell)?;
                self.stdout.queue(Print(cell.ch))?;
            }
        }
        Ok(())
    }

    /// Repaints only dirty cells that differ from what is on screen, batching
    /// horizontal runs that share a style into one `Print`.
    fn draw_dirty(&mut self, frame: &Frame) -> Result<()> {
        let Some(shown) = self.shown.as_mut() else {
            return Ok(());
        };
        let width = frame.width as usize;
        // Every draw ends with a full reset, so the stream starts plain.
        let mut pen = Pen::default();
        let mut cur_pos: Option<(u16, u16)> = None;

        if self.row_dirty.len() != frame.height as usize {
            self.row_dirty = vec![Vec::new(); frame.height as usize];
        }
        for r in &mut self.row_dirty {
            r.clear();
        }
        self.touched_rows.clear();

        for &idx in frame.dirty_indices() {
            let y = (idx / width) as u16;
            if y >= frame.height {
                continue;
            }
            let row = &mut self.row_dirty[y as usize];
            if row.is_empty() {
                self.touched_rows.push(y);
            }
            row.push(idx);
        }
        self.touched_rows.sort_unstable();

        for y0 in self.touched_rows.iter().copied() {
            let row = &mut self.row_dirty[y0 as usize];
            row.sort_unstable();
            row.dedup();

            // A changed tail means its head glyph must be rewritten too.
            let heads: Vec<usize> = row
                .iter()
                .filter(|&&i| i % width > 0 && frame.cell_at_index(i).ch == WIDE_TAIL)
                .map(|&i| i - 1)
                .collect();
            if !heads.is_empty() {
                row.extend(heads);
                row.sort_unstable();
                row.dedup();
            }

            let mut i = 0usize;
            while i < row.len() {
                let idx0 = row[i];
                let cell0 = frame.cell_at_index(idx0);
                if shown.cells[idx0] == cell0 || cell0.ch == WIDE_TAIL {
                    shown.cells[idx0] = cell0;
                    i += 1;
                    continue;
                }
                shown.cells[idx0] = cell0;

                self.run_buf.clear();
                self.run_buf.push(cell0.ch);
                let x0 = (idx0 % width) as u16;
                let mut run_cols: u16 = 1;
                let mut last_idx = idx0;
                let mut j = i + 1;

                while j < row.len() {
                    let idx1 = row[j];
                    if idx1 != last_idx + 1 {
                        break;
                    }
                    let cell1 = frame.cell_at_index(idx1);
                    if cell1.ch != WIDE_TAIL && (shown.cells[idx1] == cell1 || !pen_eq(&cell0, &cell1))
                    {
                        break;
                    }
                    if cell1.ch != WIDE_TAIL {
                        self.run_buf.push(cell1.ch);
                    }
                    shown.cells[idx1] = cell1;
                    run_cols = run_cols.saturating_add(1);
                    last_idx = idx1;
                    j += 1;
                }

                if cur_pos != Some((x0, y0)) {
                    self.stdout.queue(cursor::MoveTo(x0, y0))?;
                }
                if !pen.matches(&cell0) {
                    pen.apply(&mut self.stdout, &cell0)?;
                }
                self.stdout.queue(Print(self.run_buf.as_str()))?;
                let next_x = x0.saturating_add(run_cols);
                cur_pos = (next_x < frame.width).then_some((next_x, y0));
                i = j;
            }
            row.clear();
        }
        Ok(())
    }
}

fn pen_eq(a: &Cell, b: &Cell) -> bool {
    a.fg == b.fg && a.bg == b.bg && a.bold == b.bold && a.reverse == b.reverse
}

impl Drop for Terminal {
    fn drop(&mut self) {
        leave(&mut self.stdout);
    }
}

pub fn restore_terminal_best_effort() {
    leave(&mut stdout());
}
