// Copyright (c) 2026 rezky_nightky

use std::collections::VecDeque;

use crate::runtime::ColorToken;

pub const MAX_LINES: usize = 500;
pub const PROMPT_PREFIX: &str = "adam@secure:~$ ";
pub const CONFIRM_PREFIX: &str = "confirm>> ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Output,
    /// A submitted command. Never recoloured or glitched.
    Echo,
    Prompt,
    Confirm,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub color: ColorToken,
    pub ephemeral: bool,
    pub kind: LineKind,
}

impl Line {
    fn output(text: impl Into<String>, color: ColorToken) -> Self {
        Self {
            text: text.into(),
            color,
            ephemeral: false,
            kind: LineKind::Output,
        }
    }
}

/// Append-only, FIFO-capped list of displayed lines plus the scroll offset.
#[derive(Debug)]
pub struct LineBuffer {
    lines: VecDeque<Line>,
    capacity: usize,
    scroll: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_LINES)
    }
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            scroll: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &Line> + ExactSizeIterator {
        self.lines.iter()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Line> {
        self.lines.back()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    fn push(&mut self, line: Line) {
        self.lines.push_back(line);
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
        self.scroll = 0;
    }

    pub fn append(&mut self, text: impl Into<String>, color: ColorToken) {
        self.push(Line::output(text, color));
    }

    pub fn append_or_update_ephemeral(&mut self, text: &str, color: ColorToken) {
        if let Some(last) = self.lines.back_mut() {
            if last.ephemeral {
                last.text.clear();
                last.text.push_str(text);
                last.color = color;
                return;
            }
        }
        let mut line = Line::output(text, color);
        line.ephemeral = true;
        self.push(line);
    }

    pub fn finalize_ephemeral(&mut self) {
        if let Some(last) = self.lines.back_mut() {
            last.ephemeral = false;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll = 0;
    }

    fn prompt_index(&self) -> Option<usize> {
        self.lines.iter().rposition(|l| l.kind == LineKind::Prompt)
    }

    pub fn has_prompt(&self) -> bool {
        self.prompt_index().is_some()
    }

    /// Appends the live prompt, replacing any stale one so that at most one
    /// prompt line exists.
    pub fn show_prompt(&mut self, input: &str) {
        if let Some(i) = self.prompt_index() {
            self.lines.remove(i);
        }
        self.finalize_ephemeral();
        self.push(Line {
            text: format!("{PROMPT_PREFIX}{input}"),
            color: ColorToken::Normal,
            ephemeral: false,
            kind: LineKind::Prompt,
        });
    }

    /// Rewrites the prompt text in place. Does not move the scroll position.
    pub fn update_prompt(&mut self, input: &str) {
        match self.prompt_index() {
            Some(i) => {
                let line = &mut self.lines[i];
                line.text.clear();
                line.text.push_str(PROMPT_PREFIX);
                line.text.push_str(input);
            }
            None => self.show_prompt(input),
        }
    }

    /// Turns the live prompt into a finalized white echo of what was typed.
    pub fn commit_prompt(&mut self) -> Option<String> {
        let i = self.prompt_index()?;
        let line = &mut self.lines[i];
        line.kind = LineKind::Echo;
        line.color = ColorToken::White;
        line.ephemeral = false;
        Some(line.text.clone())
    }

    pub fn remove_prompt(&mut self) {
        if let Some(i) = self.prompt_index() {
            self.lines.remove(i);
        }
    }

    pub fn push_confirm(&mut self, question: &str) {
        self.finalize_ephemeral();
        self.push(Line {
            text: format!("{CONFIRM_PREFIX}{question}"),
            color: ColorToken::Yellow,
            ephemeral: false,
            kind: LineKind::Confirm,
        });
    }

    /// Appends the pressed key to the most recent confirm line.
    pub fn answer_confirm(&mut self, answer: char) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .rev()
            .find(|l| l.kind == LineKind::Confirm)
        {
            line.text.push(' ');
            line.text.push(answer);
        }
    }

    pub fn max_scroll(&self, visible: usize) -> usize {
        self.lines.len().saturating_sub(visible)
    }

    pub fn scroll_up(&mut self, n: usize, visible: usize) {
        self.scroll = (self.scroll + n).min(self.max_scroll(visible));
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ephemeral_line_is_updated_in_place_then_finalized() {
        let mut b = LineBuffer::default();
        b.append_or_update_ephemeral("a", ColorToken::Normal);
        b.append_or_update_ephemeral("ab", ColorToken::Red);
        assert_eq!(b.len(), 1);
        assert_eq!(b.last().unwrap().text, "ab");
        assert_eq!(b.last().unwrap().color, ColorToken::Red);

        b.finalize_ephemeral();
        b.append_or_update_ephemeral("c", ColorToken::Normal);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn prompt_is_single_and_last_after_keystrokes() {
        let mut b = LineBuffer::default();
        b.append("boot", ColorToken::Normal);
        b.show_prompt("");
        for input in ["h", "he", "hel", "help"] {
            b.update_prompt(input);
        }
        b.show_prompt("help");
        let prompts = b.lines().filter(|l| l.kind == LineKind::Prompt).count();
        assert_eq!(prompts, 1);
        let last = b.last().unwrap();
        assert_eq!(last.kind, LineKind::Prompt);
        assert_eq!(last.text, format!("{PROMPT_PREFIX}help"));
    }

    #[test]
    fn commit_prompt_converts_in_place() {
        let mut b = LineBuffer::default();
        b.show_prompt("subj");
        let before = b.len();
        let echoed = b.commit_prompt().unwrap();
        assert_eq!(b.len(), before);
        assert_eq!(echoed, format!("{PROMPT_PREFIX}subj"));
        assert_eq!(b.last().unwrap().kind, LineKind::Echo);
        assert_eq!(b.last().unwrap().color, ColorToken::White);
        assert!(!b.has_prompt());
    }

    #[test]
    fn scroll_is_capped_and_reset_by_append() {
        let mut b = LineBuffer::default();
        for i in 0..30 {
            b.append(format!("{i}"), ColorToken::Normal);
        }
        b.scroll_up(100, 10);
        assert_eq!(b.scroll(), 20);
        b.scroll_down(5);
        assert_eq!(b.scroll(), 15);
        b.update_prompt("x");
        assert_eq!(b.scroll(), 0, "a new prompt line snaps to the bottom");
        b.scroll_up(3, 10);
        b.update_prompt("xy");
        assert_eq!(b.scroll(), 3);
        b.append("new", ColorToken::Normal);
        assert_eq!(b.scroll(), 0);
    }

    proptest! {
        #[test]
        fn capacity_holds_and_oldest_lines_go_first(n in 0usize..200, cap in 1usize..40) {
            let mut b = LineBuffer::with_capacity(cap);
            for i in 0..n {
                b.append(i.to_string(), ColorToken::Normal);
                prop_assert!(b.len() <= cap);
            }
            let kept: Vec<usize> = b.lines().map(|l| l.text.parse().unwrap()).collect();
            let expected: Vec<usize> = (n.saturating_sub(cap)..n).collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
